//! Playforge is a playable-ad authoring and export engine.
//!
//! A project overlays timeline-driven interactive content (pause-the-video
//! breaks, timed overlays, a persistent end screen) onto a source video and
//! compiles everything into a self-contained bundle that runs standalone
//! inside an ad network's rendering sandbox.
//!
//! The flow is session-oriented:
//!
//! - Author or load a [`Project`] and [`Project::validate`] it
//! - Drive a [`PlaybackSession`] per playthrough; it emits declarative
//!   [`Command`]s consumed by a [`SceneRenderer`] and the host's
//!   video/audio adapters
//! - [`export_bundle`] packages the project and its binary assets into a
//!   network-specific archive
//!
//! Within a tick, state evaluation always happens before rendering: call
//! [`PlaybackSession::tick`], apply the commands to the scene, then draw.
#![forbid(unsafe_code)]

pub mod adapters;
pub mod anim;
pub mod anim_ease;
pub mod assets;
pub mod export;
pub mod fingerprint;
pub mod foundation;
pub mod model;
pub mod playback;
pub mod scene;

pub use crate::adapters::{HOOKS_BEGIN, HOOKS_END, Network, adapt};
pub use crate::anim::{AnimationSpec, Lerp, Repeat, SpriteAnimations, SpriteFrame};
pub use crate::anim_ease::Ease;
pub use crate::assets::AssetStore;
pub use crate::export::{Bundle, BundleFile, Manifest, RUNTIME_JS, export_bundle};
pub use crate::fingerprint::BundleFingerprint;
pub use crate::foundation::core::{
    Affine, Canvas, DurationMs, Point, Rect, Rgb8, TimeMs, TimeRange, Transform2D, Vec2,
    fit_video_rect,
};
pub use crate::foundation::error::{PlayforgeError, PlayforgeResult};
pub use crate::model::{
    AssetRef, BackgroundMusic, ClickAction, GeneralSettings, Modification, ModificationKind,
    Project, Sprite,
};
pub use crate::playback::{BREAK_TOLERANCE_MS, Command, PlaybackSession, PlaybackState};
pub use crate::scene::{DrawOp, SceneRenderer, SpriteHit};
