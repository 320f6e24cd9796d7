use std::collections::BTreeSet;

use crate::{
    anim::SpriteAnimations,
    foundation::core::{Rgb8, TimeMs, TimeRange, Vec2},
    foundation::error::{PlayforgeError, PlayforgeResult},
};

/// Reference to a binary asset.
///
/// `Bundled` sources are paths relative to the project document and are
/// embedded into the exported bundle. `Remote` references are never
/// embedded; the runtime loads them from the network.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssetRef {
    Bundled { source: String },
    Remote { url: String },
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ClickAction {
    #[default]
    None,
    ResumeVideo,
    OpenStoreUrl,
}

fn default_anchor() -> Vec2 {
    Vec2::new(0.5, 0.5)
}

fn default_scale() -> f64 {
    1.0
}

fn default_alpha() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Sprite {
    pub id: String,
    pub asset: AssetRef,
    /// Normalized [0,1] fractions of the active coordinate basis.
    pub position: Vec2,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub rotation_deg: f64,
    #[serde(default = "default_anchor")]
    pub anchor: Vec2,
    /// Alpha in [0,1]; 1 is fully visible.
    #[serde(default = "default_alpha")]
    pub transparency: f64,
    #[serde(default)]
    pub on_click: ClickAction,
    /// Overrides the owning modification's coordinate basis when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_to_screen: Option<bool>,
    #[serde(default, skip_serializing_if = "SpriteAnimations::is_empty")]
    pub animations: SpriteAnimations,
}

impl Sprite {
    fn validate(&self) -> PlayforgeResult<()> {
        if self.id.trim().is_empty() {
            return Err(PlayforgeError::validation("sprite id must be non-empty"));
        }
        match &self.asset {
            AssetRef::Bundled { source } if source.trim().is_empty() => {
                return Err(PlayforgeError::validation(format!(
                    "sprite '{}' has an empty asset source",
                    self.id
                )));
            }
            AssetRef::Remote { url } if url.trim().is_empty() => {
                return Err(PlayforgeError::validation(format!(
                    "sprite '{}' has an empty asset url",
                    self.id
                )));
            }
            _ => {}
        }
        if !(self.scale.is_finite() && self.scale >= 0.0) {
            return Err(PlayforgeError::validation(format!(
                "sprite '{}' scale must be finite and >= 0",
                self.id
            )));
        }
        if !(0.0..=1.0).contains(&self.transparency) {
            return Err(PlayforgeError::validation(format!(
                "sprite '{}' transparency must be in [0,1]",
                self.id
            )));
        }
        if !(self.position.x.is_finite() && self.position.y.is_finite()) {
            return Err(PlayforgeError::validation(format!(
                "sprite '{}' position must be finite",
                self.id
            )));
        }
        self.animations.validate()?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BackgroundMusic {
    pub asset: AssetRef,
    /// Playback volume in [0,1].
    pub volume: f64,
    /// Loop the track while the modification is active.
    #[serde(default)]
    pub repeat: bool,
}

/// Timeline placement of a modification, tagged by `type` on the wire.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ModificationKind {
    #[serde(rename = "BREAK")]
    Break {
        #[serde(rename = "time_ms")]
        time: TimeMs,
        /// Stop background audio when the viewer resumes the video.
        #[serde(default)]
        stop_music_on_resume: bool,
    },
    #[serde(rename = "OVERLAY")]
    Overlay {
        #[serde(rename = "start_ms")]
        start: TimeMs,
        #[serde(rename = "end_ms")]
        end: TimeMs,
    },
    #[serde(rename = "END_SCREEN")]
    EndScreen {
        #[serde(rename = "time_ms")]
        time: TimeMs,
    },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Modification {
    pub id: String,
    #[serde(flatten)]
    pub kind: ModificationKind,
    #[serde(default)]
    pub background: bool,
    #[serde(default = "default_background_color")]
    pub background_color: Rgb8,
    /// Alpha of the background fill, in [0,1].
    #[serde(default = "default_alpha")]
    pub background_transparency: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_music: Option<BackgroundMusic>,
    /// Default coordinate basis for this modification's sprites:
    /// true = full canvas, false = rendered video bounds.
    #[serde(default)]
    pub relative_to_screen: bool,
    /// Insertion order is z-order; later sprites draw on top.
    #[serde(default)]
    pub sprites: Vec<Sprite>,
}

fn default_background_color() -> Rgb8 {
    Rgb8::BLACK
}

impl Modification {
    /// Time at which this modification first becomes relevant on the timeline.
    pub fn trigger_time(&self) -> TimeMs {
        match self.kind {
            ModificationKind::Break { time, .. } | ModificationKind::EndScreen { time } => time,
            ModificationKind::Overlay { start, .. } => start,
        }
    }

    pub fn overlay_range(&self) -> Option<TimeRange> {
        match self.kind {
            ModificationKind::Overlay { start, end } => Some(TimeRange { start, end }),
            _ => None,
        }
    }

    /// Resolved coordinate basis for one of this modification's sprites.
    pub fn sprite_relative_to_screen(&self, sprite: &Sprite) -> bool {
        sprite.relative_to_screen.unwrap_or(self.relative_to_screen)
    }

    pub fn sprite(&self, sprite_id: &str) -> Option<&Sprite> {
        self.sprites.iter().find(|s| s.id == sprite_id)
    }

    fn validate(&self) -> PlayforgeResult<()> {
        if self.id.trim().is_empty() {
            return Err(PlayforgeError::validation(
                "modification id must be non-empty",
            ));
        }
        if let ModificationKind::Overlay { start, end } = self.kind {
            TimeRange::new(start, end).map_err(|_| {
                PlayforgeError::validation(format!(
                    "overlay '{}' has start_ms > end_ms",
                    self.id
                ))
            })?;
        }
        if !(0.0..=1.0).contains(&self.background_transparency) {
            return Err(PlayforgeError::validation(format!(
                "modification '{}' background transparency must be in [0,1]",
                self.id
            )));
        }
        if let Some(music) = &self.background_music {
            if !(0.0..=1.0).contains(&music.volume) {
                return Err(PlayforgeError::validation(format!(
                    "modification '{}' music volume must be in [0,1]",
                    self.id
                )));
            }
        }
        for sprite in &self.sprites {
            sprite.validate()?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeneralSettings {
    pub ad_name: String,
    pub video: AssetRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ios_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playstore_url: Option<String>,
}

/// The full authoring state: general settings plus the ordered list of
/// timeline modifications. Produced by the authoring UI, consumed
/// read-only by the playback runtime and the export pipeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Project {
    pub general: GeneralSettings,
    #[serde(default)]
    pub modifications: Vec<Modification>,
}

impl Project {
    pub fn new(general: GeneralSettings) -> Self {
        Self {
            general,
            modifications: Vec::new(),
        }
    }

    pub fn modification(&self, id: &str) -> Option<&Modification> {
        self.modifications.iter().find(|m| m.id == id)
    }

    pub fn from_json_str(s: &str) -> PlayforgeResult<Self> {
        serde_json::from_str(s).map_err(|e| PlayforgeError::serde(format!("parse project: {e}")))
    }

    pub fn to_json_string(&self) -> PlayforgeResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PlayforgeError::serde(format!("serialize project: {e}")))
    }

    /// Authoring/export-time validation. The playback state machine and the
    /// export pipeline assume a project that has passed this check.
    pub fn validate(&self) -> PlayforgeResult<()> {
        if self.general.ad_name.trim().is_empty() {
            return Err(PlayforgeError::validation("ad name must be non-empty"));
        }
        match &self.general.video {
            AssetRef::Bundled { source } if source.trim().is_empty() => {
                return Err(PlayforgeError::validation(
                    "project has no video source set",
                ));
            }
            AssetRef::Remote { url } if url.trim().is_empty() => {
                return Err(PlayforgeError::validation(
                    "project has no video source set",
                ));
            }
            _ => {}
        }

        let mut mod_ids = BTreeSet::new();
        let mut sprite_ids = BTreeSet::new();
        for m in &self.modifications {
            m.validate()?;
            if !mod_ids.insert(m.id.as_str()) {
                return Err(PlayforgeError::validation(format!(
                    "duplicate modification id '{}'",
                    m.id
                )));
            }
            for s in &m.sprites {
                if !sprite_ids.insert(s.id.as_str()) {
                    return Err(PlayforgeError::validation(format!(
                        "duplicate sprite id '{}'",
                        s.id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::{AnimationSpec, Repeat};
    use crate::foundation::core::DurationMs;

    pub(crate) fn sprite(id: &str) -> Sprite {
        Sprite {
            id: id.to_string(),
            asset: AssetRef::Bundled {
                source: format!("{id}.png"),
            },
            position: Vec2::new(0.5, 0.5),
            scale: 1.0,
            rotation_deg: 0.0,
            anchor: Vec2::new(0.5, 0.5),
            transparency: 1.0,
            on_click: ClickAction::None,
            relative_to_screen: None,
            animations: SpriteAnimations::default(),
        }
    }

    pub(crate) fn break_mod(id: &str, time: u64) -> Modification {
        Modification {
            id: id.to_string(),
            kind: ModificationKind::Break {
                time: TimeMs(time),
                stop_music_on_resume: false,
            },
            background: true,
            background_color: Rgb8 { r: 16, g: 16, b: 24 },
            background_transparency: 0.8,
            background_music: None,
            relative_to_screen: false,
            sprites: vec![sprite(&format!("{id}_s0"))],
        }
    }

    pub(crate) fn basic_project() -> Project {
        Project {
            general: GeneralSettings {
                ad_name: "demo".to_string(),
                video: AssetRef::Bundled {
                    source: "ad.mp4".to_string(),
                },
                ios_url: Some("https://apps.apple.com/app/id1".to_string()),
                playstore_url: Some("https://play.google.com/store/apps/details?id=x".to_string()),
            },
            modifications: vec![break_mod("b0", 5000)],
        }
    }

    #[test]
    fn json_round_trip_preserves_project() {
        let p = basic_project();
        let s = p.to_json_string().unwrap();
        let de = Project::from_json_str(&s).unwrap();
        assert_eq!(de, p);
    }

    #[test]
    fn kind_is_tagged_by_type_on_the_wire() {
        let p = basic_project();
        let v: serde_json::Value = serde_json::from_str(&p.to_json_string().unwrap()).unwrap();
        assert_eq!(v["modifications"][0]["type"], "BREAK");
        assert_eq!(v["modifications"][0]["time_ms"], 5000);
    }

    #[test]
    fn validate_rejects_inverted_overlay() {
        let mut p = basic_project();
        p.modifications.push(Modification {
            id: "o0".to_string(),
            kind: ModificationKind::Overlay {
                start: TimeMs(2000),
                end: TimeMs(1000),
            },
            background: false,
            background_color: Rgb8::BLACK,
            background_transparency: 1.0,
            background_music: None,
            relative_to_screen: true,
            sprites: vec![],
        });
        let err = p.validate().unwrap_err().to_string();
        assert!(err.contains("start_ms > end_ms"), "{err}");
    }

    #[test]
    fn validate_rejects_missing_video() {
        let mut p = basic_project();
        p.general.video = AssetRef::Bundled {
            source: "  ".to_string(),
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let mut p = basic_project();
        p.modifications.push(break_mod("b0", 9000));
        assert!(p.validate().is_err());

        let mut p = basic_project();
        let mut dup = break_mod("b1", 9000);
        dup.sprites[0].id = "b0_s0".to_string();
        p.modifications.push(dup);
        assert!(p.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_animation_duration() {
        let mut p = basic_project();
        p.modifications[0].sprites[0].animations.scale = Some(AnimationSpec {
            active: true,
            destination: 2.0,
            duration: DurationMs(0),
            repeat: Repeat::Infinite,
            ease: Default::default(),
            yoyo: false,
        });
        assert!(p.validate().is_err());
    }

    #[test]
    fn sprite_basis_override_beats_modification_default() {
        let mut m = break_mod("b0", 0);
        assert!(!m.sprite_relative_to_screen(&m.sprites[0].clone()));
        m.sprites[0].relative_to_screen = Some(true);
        let s = m.sprites[0].clone();
        assert!(m.sprite_relative_to_screen(&s));
    }

    #[test]
    fn sprite_defaults_fill_in_from_minimal_json() {
        let s: Sprite = serde_json::from_str(
            r#"{
                "id": "s1",
                "asset": { "kind": "remote", "url": "https://cdn.example/x.png" },
                "position": { "x": 0.25, "y": 0.75 }
            }"#,
        )
        .unwrap();
        assert_eq!(s.scale, 1.0);
        assert_eq!(s.anchor, Vec2::new(0.5, 0.5));
        assert_eq!(s.transparency, 1.0);
        assert_eq!(s.on_click, ClickAction::None);
        assert!(s.animations.is_empty());
    }
}
