//! Session + scene wiring, driven the way a host embeds the engine:
//! tick the state machine, apply the commands, then draw or hit-test.

use std::sync::Arc;

use playforge::assets::PreparedImage;
use playforge::{
    AssetStore, Canvas, ClickAction, Command, PlaybackSession, PlaybackState, Point, Project,
    SceneRenderer, TimeMs,
};

fn fixture_project() -> Project {
    Project::from_json_str(include_str!("data/sample_project.json")).unwrap()
}

fn store_for(sprite_ids: &[&str]) -> AssetStore {
    let mut store = AssetStore::default();
    for id in sprite_ids {
        store.images.insert(
            (*id).to_string(),
            PreparedImage {
                mime: "image/png",
                bytes: Arc::new(vec![0u8; 4]),
                width: 200,
                height: 100,
            },
        );
    }
    store
}

struct Harness {
    project: Project,
    session: PlaybackSession,
    scene: SceneRenderer,
    store: AssetStore,
}

impl Harness {
    fn new(project: Project, store: AssetStore) -> Self {
        let mut session = PlaybackSession::new(&project).unwrap();
        session.begin_playback();
        let scene = SceneRenderer::new(
            Canvas {
                width: 1000,
                height: 1000,
            },
            1920,
            1080,
        );
        Self {
            project,
            session,
            scene,
            store,
        }
    }

    fn tick(&mut self, t: u64) -> Vec<Command> {
        let commands = self.session.tick(TimeMs(t));
        self.scene.apply(&commands, &self.project, TimeMs(t));
        commands
    }
}

#[test]
fn break_pause_click_resume_flow() {
    let project = fixture_project();
    let store = store_for(&["resume_btn", "cta_btn", "store_badge"]);
    let mut h = Harness::new(project, store);

    // Scenario A: reaching t=5010 within the 50ms window pauses exactly once.
    h.tick(4000);
    let commands = h.tick(5010);
    assert!(commands.contains(&Command::PauseVideo));
    assert!(h.scene.is_mounted("mid_break"));
    assert!(matches!(
        h.session.state(),
        PlaybackState::PausedAtBreak { .. }
    ));

    // The viewer taps the resume button; the scene resolves the hit.
    let hit = h
        .scene
        .hit_test(&h.project, &h.store, Point::new(500.0, 500.0), TimeMs(5010))
        .unwrap();
    assert_eq!(hit.modification_id, "mid_break");
    assert_eq!(hit.sprite_id, "resume_btn");
    assert_eq!(hit.action, ClickAction::ResumeVideo);

    let commands = h
        .session
        .click(&hit.modification_id, &hit.sprite_id)
        .unwrap();
    h.scene.apply(&commands, &h.project, TimeMs(5010));
    assert!(commands.contains(&Command::ResumeVideo));
    assert!(!h.scene.is_mounted("mid_break"));
    assert_eq!(*h.session.state(), PlaybackState::PlayingVideo);

    // The same break never fires again this playthrough.
    assert_eq!(h.tick(5020), vec![]);
}

#[test]
fn overlay_mounts_for_its_window_only() {
    let project = fixture_project();
    let store = store_for(&["logo"]);
    let mut h = Harness::new(project, store);

    h.tick(100);
    assert!(h.scene.is_mounted("intro_overlay"));
    let ops = h
        .scene
        .draw_ops(&h.project, &h.store, TimeMs(100));
    assert!(!ops.is_empty());

    h.tick(3001);
    assert!(!h.scene.is_mounted("intro_overlay"));
    assert!(
        h.scene
            .draw_ops(&h.project, &h.store, TimeMs(3001))
            .is_empty()
    );
}

#[test]
fn end_screen_survives_until_dismissed() {
    let project = fixture_project();
    let store = store_for(&["store_badge"]);
    let mut h = Harness::new(project, store);

    let commands = h.tick(9200);
    assert!(commands.contains(&Command::AdCompleted));
    assert!(h.scene.is_mounted("outro"));

    // Store badge on the end screen resolves to a store click.
    let hit = h
        .scene
        .hit_test(&h.project, &h.store, Point::new(500.0, 600.0), TimeMs(9200))
        .unwrap();
    assert_eq!(hit.sprite_id, "store_badge");
    let commands = h.session.click("outro", "store_badge").unwrap();
    assert!(commands.contains(&Command::OpenStoreUrl));

    let commands = h.session.dismiss_end_screen();
    h.scene.apply(&commands, &h.project, TimeMs(9300));
    assert!(!h.scene.is_mounted("outro"));
}

#[test]
fn preview_restart_replays_the_break() {
    let project = fixture_project();
    let store = store_for(&["resume_btn", "cta_btn"]);
    let mut h = Harness::new(project, store);

    h.tick(5000);
    let commands = h.session.click("mid_break", "resume_btn").unwrap();
    h.scene.apply(&commands, &h.project, TimeMs(5000));

    let commands = h.session.start_preview();
    h.scene.apply(&commands, &h.project, TimeMs(0));
    assert_eq!(*h.session.state(), PlaybackState::Previewing);
    assert!(commands.contains(&Command::SeekVideo { to: TimeMs(0) }));

    // Fresh playthrough: the break is armed again.
    let commands = h.tick(5000);
    assert!(commands.contains(&Command::PauseVideo));
    assert!(h.scene.is_mounted("mid_break"));
}

#[test]
fn break_triggers_follow_timeline_order_across_a_playthrough() {
    let mut project = fixture_project();
    // Duplicate the break earlier in the timeline but later in the list.
    let mut early = project.modification("mid_break").unwrap().clone();
    early.id = "early_break".to_string();
    early.kind = playforge::ModificationKind::Break {
        time: TimeMs(1000),
        stop_music_on_resume: false,
    };
    for s in &mut early.sprites {
        s.id = format!("early_{}", s.id);
    }
    project.modifications.push(early);

    let mut session = PlaybackSession::new(&project).unwrap();
    session.begin_playback();

    let mut order = Vec::new();
    for t in (0..10_000).step_by(25) {
        let commands = session.tick(TimeMs(t));
        for c in &commands {
            if let Command::ShowModification { id } = c {
                if id.contains("break") {
                    order.push(id.clone());
                }
            }
        }
        if matches!(session.state(), PlaybackState::PausedAtBreak { .. }) {
            let resume = if order.last().unwrap() == "early_break" {
                ("early_break", "early_resume_btn")
            } else {
                ("mid_break", "resume_btn")
            };
            session.click(resume.0, resume.1).unwrap();
        }
    }
    assert_eq!(order, vec!["early_break", "mid_break"]);
}
