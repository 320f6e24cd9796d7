use std::collections::BTreeSet;

use crate::{
    foundation::core::TimeMs,
    foundation::error::{PlayforgeError, PlayforgeResult},
    model::{BackgroundMusic, ClickAction, ModificationKind, Project},
};

/// Two-sided window around a break's `time_ms` within which a tick
/// triggers it.
pub const BREAK_TOLERANCE_MS: u64 = 50;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    PlayingVideo,
    PausedAtBreak { modification: String },
    Previewing,
}

/// Declarative output of the state machine, consumed in order by a
/// renderer/audio adapter. The session never touches the scene directly.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    PauseVideo,
    ResumeVideo,
    SeekVideo { to: TimeMs },
    ShowModification { id: String },
    ClearModification { id: String },
    StartAudio { id: String, music: BackgroundMusic },
    StopAudio { id: String },
    OpenStoreUrl,
    AdCompleted,
}

/// All per-playthrough state of one playable-ad run.
///
/// Constructed from a validated [`Project`], driven by `tick` and the
/// explicit user actions, torn down (or reset via `start_preview`) per
/// playthrough. Holding every tracker here keeps replay/reset a matter of
/// rebuilding one value.
#[derive(Debug)]
pub struct PlaybackSession {
    project: Project,
    state: PlaybackState,
    preview: bool,
    /// Break ids stable-sorted by trigger time; scan order defines the
    /// effective trigger order.
    breaks_by_time: Vec<(TimeMs, String)>,
    triggered_breaks: BTreeSet<String>,
    active_overlay: Option<String>,
    active_end_screen: Option<String>,
    dismissed_end_screens: BTreeSet<String>,
    /// Modification ids currently owning a started audio element. Starting
    /// audio for an id already present is a no-op until it is released.
    playing_audio: BTreeSet<String>,
    /// Audio waiting for the first user gesture (autoplay policy).
    pending_audio: BTreeSet<String>,
    gesture_observed: bool,
    completed: bool,
}

impl PlaybackSession {
    pub fn new(project: &Project) -> PlayforgeResult<Self> {
        project.validate()?;

        let mut breaks_by_time: Vec<(TimeMs, String)> = project
            .modifications
            .iter()
            .filter(|m| matches!(m.kind, ModificationKind::Break { .. }))
            .map(|m| (m.trigger_time(), m.id.clone()))
            .collect();
        breaks_by_time.sort_by_key(|(t, _)| *t); // stable: list order breaks ties

        Ok(Self {
            project: project.clone(),
            state: PlaybackState::Idle,
            preview: false,
            breaks_by_time,
            triggered_breaks: BTreeSet::new(),
            active_overlay: None,
            active_end_screen: None,
            dismissed_end_screens: BTreeSet::new(),
            playing_audio: BTreeSet::new(),
            pending_audio: BTreeSet::new(),
            gesture_observed: false,
            completed: false,
        })
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn active_overlay(&self) -> Option<&str> {
        self.active_overlay.as_deref()
    }

    pub fn active_end_screen(&self) -> Option<&str> {
        self.active_end_screen.as_deref()
    }

    /// External start signal (the bundle's `gameStart`).
    pub fn begin_playback(&mut self) {
        if self.state == PlaybackState::Idle {
            self.state = PlaybackState::PlayingVideo;
        }
    }

    /// Restart from time zero with a clean playthrough: clears every
    /// rendered modification, releases all audio, forgets triggered breaks.
    pub fn start_preview(&mut self) -> Vec<Command> {
        let mut out = Vec::new();

        let mounted: Vec<String> = self.mounted_modifications();
        for id in &mounted {
            self.release_audio(id, &mut out);
            out.push(Command::ClearModification { id: id.clone() });
        }
        for id in self.playing_audio.clone() {
            self.release_audio(&id, &mut out);
        }

        self.triggered_breaks.clear();
        self.active_overlay = None;
        self.active_end_screen = None;
        self.dismissed_end_screens.clear();
        self.pending_audio.clear();
        self.completed = false;
        self.preview = true;
        self.state = PlaybackState::Previewing;

        out.push(Command::SeekVideo { to: TimeMs::ZERO });
        out
    }

    /// Per-frame evaluation at video time `t`. State transitions are
    /// resolved here, before any rendering happens for the same tick.
    #[tracing::instrument(skip(self), level = "debug")]
    pub fn tick(&mut self, t: TimeMs) -> Vec<Command> {
        match self.state {
            PlaybackState::PlayingVideo | PlaybackState::Previewing => {}
            _ => return Vec::new(),
        }

        let mut out = Vec::new();

        // Breaks first: at most one per tick, scanned in ascending time
        // order so triggers replay in timeline order.
        let candidate = self
            .breaks_by_time
            .iter()
            .find(|(time, id)| {
                !self.triggered_breaks.contains(id) && time.abs_diff(t) <= BREAK_TOLERANCE_MS
            })
            .map(|(_, id)| id.clone());
        if let Some(id) = candidate {
            tracing::debug!(break_id = %id, at_ms = t.0, "break triggered");
            self.triggered_breaks.insert(id.clone());
            self.state = PlaybackState::PausedAtBreak {
                modification: id.clone(),
            };
            out.push(Command::PauseVideo);
            out.push(Command::ShowModification { id: id.clone() });
            self.request_audio(&id, &mut out);
            return out;
        }

        // Overlays: first match in list order wins when several overlap.
        let current = self
            .project
            .modifications
            .iter()
            .find(|m| m.overlay_range().is_some_and(|r| r.contains(t)))
            .map(|m| m.id.clone());
        if current != self.active_overlay {
            if let Some(old) = self.active_overlay.take() {
                self.release_audio(&old, &mut out);
                out.push(Command::ClearModification { id: old });
            }
            if let Some(new) = current {
                out.push(Command::ShowModification { id: new.clone() });
                self.request_audio(&new, &mut out);
                self.active_overlay = Some(new);
            }
        }

        // End screen: additive, persists until dismissed.
        if self.active_end_screen.is_none() {
            let due = self
                .project
                .modifications
                .iter()
                .find(|m| {
                    matches!(m.kind, ModificationKind::EndScreen { time } if time.0 <= t.0)
                        && !self.dismissed_end_screens.contains(&m.id)
                })
                .map(|m| m.id.clone());
            if let Some(id) = due {
                self.activate_end_screen(id, &mut out);
            }
        }

        out
    }

    /// The video element reached its end.
    pub fn video_ended(&mut self) -> Vec<Command> {
        let mut out = Vec::new();
        if self.active_end_screen.is_none() {
            let first = self
                .project
                .modifications
                .iter()
                .find(|m| {
                    matches!(m.kind, ModificationKind::EndScreen { .. })
                        && !self.dismissed_end_screens.contains(&m.id)
                })
                .map(|m| m.id.clone());
            if let Some(id) = first {
                self.activate_end_screen(id, &mut out);
            }
        }
        if !self.completed {
            self.completed = true;
            out.push(Command::AdCompleted);
        }
        self.state = PlaybackState::Idle;
        out
    }

    /// A click on a sprite, as resolved by the scene's hit-test. Every
    /// click counts as a user gesture for the autoplay policy.
    pub fn click(
        &mut self,
        modification_id: &str,
        sprite_id: &str,
    ) -> PlayforgeResult<Vec<Command>> {
        let mut out = self.observe_gesture();

        let action = {
            let m = self.project.modification(modification_id).ok_or_else(|| {
                PlayforgeError::playback(format!("unknown modification '{modification_id}'"))
            })?;
            let s = m.sprite(sprite_id).ok_or_else(|| {
                PlayforgeError::playback(format!(
                    "unknown sprite '{sprite_id}' in modification '{modification_id}'"
                ))
            })?;
            s.on_click
        };

        match action {
            ClickAction::None => {}
            ClickAction::OpenStoreUrl => out.push(Command::OpenStoreUrl),
            ClickAction::ResumeVideo => {
                let paused_here = matches!(
                    &self.state,
                    PlaybackState::PausedAtBreak { modification } if modification == modification_id
                );
                if paused_here {
                    let stop_audio = matches!(
                        self.project.modification(modification_id).map(|m| &m.kind),
                        Some(ModificationKind::Break {
                            stop_music_on_resume: true,
                            ..
                        })
                    );
                    if stop_audio {
                        self.release_audio(modification_id, &mut out);
                    }
                    out.push(Command::ClearModification {
                        id: modification_id.to_string(),
                    });
                    out.push(Command::ResumeVideo);
                    self.state = if self.preview {
                        PlaybackState::Previewing
                    } else {
                        PlaybackState::PlayingVideo
                    };
                }
            }
        }

        Ok(out)
    }

    /// First user gesture unlocks deferred audio for modifications that are
    /// still active.
    pub fn observe_gesture(&mut self) -> Vec<Command> {
        let mut out = Vec::new();
        if self.gesture_observed {
            return out;
        }
        self.gesture_observed = true;

        let active: BTreeSet<String> = self.mounted_modifications().into_iter().collect();
        for id in std::mem::take(&mut self.pending_audio) {
            if !active.contains(&id) {
                continue;
            }
            if let Some(music) = self.music_for(&id) {
                self.playing_audio.insert(id.clone());
                out.push(Command::StartAudio { id, music });
            }
        }
        out
    }

    pub fn dismiss_end_screen(&mut self) -> Vec<Command> {
        let mut out = Vec::new();
        if let Some(id) = self.active_end_screen.take() {
            self.release_audio(&id, &mut out);
            out.push(Command::ClearModification { id: id.clone() });
            self.dismissed_end_screens.insert(id);
        }
        out
    }

    fn activate_end_screen(&mut self, id: String, out: &mut Vec<Command>) {
        tracing::debug!(end_screen = %id, "end screen activated");
        out.push(Command::ShowModification { id: id.clone() });
        self.request_audio(&id, out);
        self.active_end_screen = Some(id);
        if !self.completed {
            self.completed = true;
            out.push(Command::AdCompleted);
        }
    }

    /// Modifications currently mounted in the scene, in mount order.
    fn mounted_modifications(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let PlaybackState::PausedAtBreak { modification } = &self.state {
            out.push(modification.clone());
        }
        if let Some(id) = &self.active_overlay {
            out.push(id.clone());
        }
        if let Some(id) = &self.active_end_screen {
            out.push(id.clone());
        }
        out
    }

    fn music_for(&self, id: &str) -> Option<BackgroundMusic> {
        self.project
            .modification(id)
            .and_then(|m| m.background_music.clone())
    }

    fn request_audio(&mut self, id: &str, out: &mut Vec<Command>) {
        let Some(music) = self.music_for(id) else {
            return;
        };
        if self.playing_audio.contains(id) {
            return; // already owned for this id
        }
        if !self.gesture_observed {
            self.pending_audio.insert(id.to_string());
            return;
        }
        self.playing_audio.insert(id.to_string());
        out.push(Command::StartAudio {
            id: id.to_string(),
            music,
        });
    }

    fn release_audio(&mut self, id: &str, out: &mut Vec<Command>) {
        self.pending_audio.remove(id);
        if self.playing_audio.remove(id) {
            out.push(Command::StopAudio { id: id.to_string() });
        }
    }
}
