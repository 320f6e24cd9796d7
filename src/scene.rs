use crate::{
    assets::AssetStore,
    foundation::core::{Affine, Canvas, Point, Rect, Rgb8, TimeMs, Transform2D, Vec2, fit_video_rect},
    model::{AssetRef, ClickAction, Modification, ModificationKind, Project},
    playback::Command,
};

/// One drawing instruction for the host's 2D surface. Ops are emitted in
/// paint order; the host draws the current video frame beneath all of them.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    FillRect {
        rect: Rect,
        color: Rgb8,
        alpha: f64,
    },
    Image {
        modification_id: String,
        sprite_id: String,
        transform: Affine,
        alpha: f64,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpriteHit {
    pub modification_id: String,
    pub sprite_id: String,
    pub action: ClickAction,
}

#[derive(Clone, Debug)]
struct Mounted {
    id: String,
    mounted_at: TimeMs,
    end_screen: bool,
}

#[derive(Clone, Debug)]
struct Placement {
    modification_id: String,
    sprite_id: String,
    action: ClickAction,
    transform: Affine,
    natural_width: f64,
    natural_height: f64,
    alpha: f64,
}

/// Retained scene: an arena of mounted modification subtrees indexed by
/// modification id. Clearing a modification releases its whole subtree;
/// nothing is tagged or scanned.
///
/// The renderer is driven by [`Command`]s after state evaluation, so a
/// transition and its visual effect always land within the same tick.
#[derive(Debug)]
pub struct SceneRenderer {
    canvas: Canvas,
    video_width: u32,
    video_height: u32,
    mounted: Vec<Mounted>,
    skipped_sprites: u64,
}

impl SceneRenderer {
    pub fn new(canvas: Canvas, video_width: u32, video_height: u32) -> Self {
        Self {
            canvas,
            video_width,
            video_height,
            mounted: Vec::new(),
            skipped_sprites: 0,
        }
    }

    /// Update the canvas size. Coordinate bases are derived per frame, so
    /// already-mounted content follows the new layout on the next draw.
    pub fn resize(&mut self, canvas: Canvas) {
        self.canvas = canvas;
    }

    /// Sprites skipped so far because their asset could not be resolved.
    pub fn skipped_sprites(&self) -> u64 {
        self.skipped_sprites
    }

    pub fn is_mounted(&self, modification_id: &str) -> bool {
        self.mounted.iter().any(|m| m.id == modification_id)
    }

    /// Apply the renderer-relevant subset of a command batch, in order.
    /// Video/audio commands are the host adapter's business and pass through.
    pub fn apply(&mut self, commands: &[Command], project: &Project, now: TimeMs) {
        for command in commands {
            match command {
                Command::ShowModification { id } => {
                    if self.is_mounted(id) {
                        continue;
                    }
                    let end_screen = project
                        .modification(id)
                        .is_some_and(|m| matches!(m.kind, ModificationKind::EndScreen { .. }));
                    self.mounted.push(Mounted {
                        id: id.clone(),
                        mounted_at: now,
                        end_screen,
                    });
                }
                Command::ClearModification { id } => {
                    self.mounted.retain(|m| &m.id != id);
                }
                _ => {}
            }
        }
    }

    /// Paint-ordered draw list for the current instant: per modification,
    /// background fill then sprites in list order; any end screen's content
    /// goes on top of everything else.
    pub fn draw_ops(&mut self, project: &Project, assets: &AssetStore, now: TimeMs) -> Vec<DrawOp> {
        let mut ops = Vec::new();
        for mounted in self.draw_order() {
            let Some(modification) = project.modification(&mounted.id) else {
                continue;
            };
            if modification.background {
                ops.push(DrawOp::FillRect {
                    rect: self.canvas.rect(),
                    color: modification.background_color,
                    alpha: modification.background_transparency,
                });
            }
            let elapsed = now.saturating_sub(mounted.mounted_at);
            let (placements, skipped) = self.place_sprites(modification, assets, elapsed);
            self.skipped_sprites += skipped;
            for p in placements {
                ops.push(DrawOp::Image {
                    modification_id: p.modification_id,
                    sprite_id: p.sprite_id,
                    transform: p.transform,
                    alpha: p.alpha,
                });
            }
        }
        ops
    }

    /// Topmost sprite whose transformed bounds contain `point`.
    pub fn hit_test(
        &self,
        project: &Project,
        assets: &AssetStore,
        point: Point,
        now: TimeMs,
    ) -> Option<SpriteHit> {
        let mut all = Vec::new();
        for mounted in self.draw_order() {
            let Some(modification) = project.modification(&mounted.id) else {
                continue;
            };
            let elapsed = now.saturating_sub(mounted.mounted_at);
            let (placements, _) = self.place_sprites(modification, assets, elapsed);
            all.extend(placements);
        }

        for p in all.iter().rev() {
            let inverse = p.transform.inverse();
            let local = inverse * point;
            let bounds = Rect::new(0.0, 0.0, p.natural_width, p.natural_height);
            if bounds.contains(local) {
                return Some(SpriteHit {
                    modification_id: p.modification_id.clone(),
                    sprite_id: p.sprite_id.clone(),
                    action: p.action,
                });
            }
        }
        None
    }

    fn draw_order(&self) -> Vec<Mounted> {
        let mut order: Vec<Mounted> = self.mounted.iter().filter(|m| !m.end_screen).cloned().collect();
        order.extend(self.mounted.iter().filter(|m| m.end_screen).cloned());
        order
    }

    fn place_sprites(
        &self,
        modification: &Modification,
        assets: &AssetStore,
        elapsed_ms: u64,
    ) -> (Vec<Placement>, u64) {
        let mut placements = Vec::with_capacity(modification.sprites.len());
        let mut skipped = 0;

        for sprite in &modification.sprites {
            let Some((natural_w, natural_h)) = assets.image_size(&sprite.id) else {
                skipped += 1;
                let source = match &sprite.asset {
                    AssetRef::Bundled { source } => source.as_str(),
                    AssetRef::Remote { url } => url.as_str(),
                };
                tracing::warn!(
                    sprite = %sprite.id,
                    modification = %modification.id,
                    %source,
                    "sprite asset unavailable, skipping"
                );
                continue;
            };

            let basis = if modification.sprite_relative_to_screen(sprite) {
                self.canvas.rect()
            } else {
                fit_video_rect(self.canvas, self.video_width, self.video_height)
            };
            if basis.is_zero_area() {
                skipped += 1;
                continue;
            }

            let frame =
                sprite
                    .animations
                    .sample(sprite.position, sprite.scale, sprite.transparency, elapsed_ms);
            let alpha = frame.transparency.clamp(0.0, 1.0);
            if alpha <= 0.0 || frame.scale <= 0.0 {
                continue;
            }

            let natural_w = f64::from(natural_w);
            let natural_h = f64::from(natural_h);
            // Sprites shrink with their basis relative to the full canvas,
            // so video-relative content tracks the letterboxed rectangle.
            let size_factor = basis.width() / self.canvas.rect().width().max(1.0);
            let px_scale = frame.scale * size_factor;
            let center = Vec2::new(
                basis.x0 + frame.position.x * basis.width(),
                basis.y0 + frame.position.y * basis.height(),
            );
            let anchor_px = Vec2::new(sprite.anchor.x * natural_w, sprite.anchor.y * natural_h);
            let transform = Transform2D {
                translate: center,
                rotation_rad: sprite.rotation_deg.to_radians(),
                scale: Vec2::new(px_scale, px_scale),
                anchor: anchor_px,
            }
            .to_affine();

            placements.push(Placement {
                modification_id: modification.id.clone(),
                sprite_id: sprite.id.clone(),
                action: sprite.on_click,
                transform,
                natural_width: natural_w,
                natural_height: natural_h,
                alpha,
            });
        }

        (placements, skipped)
    }
}
