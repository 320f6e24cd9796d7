use crate::foundation::error::{PlayforgeError, PlayforgeResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// A position on the video timeline, in milliseconds.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TimeMs(pub u64);

impl TimeMs {
    pub const ZERO: Self = Self(0);

    pub fn saturating_sub(self, other: Self) -> u64 {
        self.0.saturating_sub(other.0)
    }

    pub fn abs_diff(self, other: Self) -> u64 {
        self.0.abs_diff(other.0)
    }
}

/// Length of one animation cycle, in milliseconds. Must be > 0 to be valid.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct DurationMs(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeRange {
    pub start: TimeMs,
    pub end: TimeMs, // inclusive
}

impl TimeRange {
    pub fn new(start: TimeMs, end: TimeMs) -> PlayforgeResult<Self> {
        if start.0 > end.0 {
            return Err(PlayforgeError::validation("TimeRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    /// Both boundaries are inclusive: a range with start == end covers
    /// exactly that one instant.
    pub fn contains(self, t: TimeMs) -> bool {
        self.start.0 <= t.0 && t.0 <= self.end.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };
}

/// Contain-fit rectangle of the rendered video inside the canvas.
///
/// The video keeps its aspect ratio and is centered; the remainder is
/// letterbox. Callers recompute this on every resize so sprites placed
/// relative to the video bounds track the rendered rectangle.
pub fn fit_video_rect(canvas: Canvas, video_width: u32, video_height: u32) -> Rect {
    if video_width == 0 || video_height == 0 || canvas.width == 0 || canvas.height == 0 {
        return Rect::ZERO;
    }
    let cw = f64::from(canvas.width);
    let ch = f64::from(canvas.height);
    let vw = f64::from(video_width);
    let vh = f64::from(video_height);

    let scale = (cw / vw).min(ch / vh);
    let w = vw * scale;
    let h = vh * scale;
    let x = (cw - w) / 2.0;
    let y = (ch - h) / 2.0;
    Rect::new(x, y, x + w, y + h)
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform2D {
    pub translate: Vec2,
    pub rotation_rad: f64,
    pub scale: Vec2,  // default (1,1)
    pub anchor: Vec2, // pivot in local space
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            rotation_rad: 0.0,
            scale: Vec2::new(1.0, 1.0),
            anchor: Vec2::ZERO,
        }
    }
}

impl Transform2D {
    /// Canonical order: T(translate) * R(rot) * S(scale) * T(-anchor),
    /// so the anchor point in local space lands on `translate`.
    pub fn to_affine(self) -> Affine {
        Affine::translate(self.translate)
            * Affine::rotate(self.rotation_rad)
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
            * Affine::translate(-self.anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_range_is_inclusive_on_both_ends() {
        let r = TimeRange::new(TimeMs(500), TimeMs(1500)).unwrap();
        assert!(!r.contains(TimeMs(499)));
        assert!(r.contains(TimeMs(500)));
        assert!(r.contains(TimeMs(1500)));
        assert!(!r.contains(TimeMs(1501)));
    }

    #[test]
    fn zero_length_range_covers_one_instant() {
        let r = TimeRange::new(TimeMs(700), TimeMs(700)).unwrap();
        assert!(r.contains(TimeMs(700)));
        assert!(!r.contains(TimeMs(699)));
        assert!(!r.contains(TimeMs(701)));
    }

    #[test]
    fn time_range_rejects_inverted_bounds() {
        assert!(TimeRange::new(TimeMs(10), TimeMs(5)).is_err());
    }

    #[test]
    fn fit_video_rect_letterboxes_wide_video() {
        let canvas = Canvas {
            width: 1000,
            height: 1000,
        };
        let r = fit_video_rect(canvas, 1920, 1080);
        assert_eq!(r.width(), 1000.0);
        assert!(r.height() < 1000.0);
        assert_eq!(r.x0, 0.0);
        assert!(r.y0 > 0.0);
        // Centered vertically.
        assert_eq!(r.y0, 1000.0 - r.y1);
    }

    #[test]
    fn fit_video_rect_degenerate_inputs_are_empty() {
        let canvas = Canvas {
            width: 100,
            height: 100,
        };
        assert_eq!(fit_video_rect(canvas, 0, 1080), Rect::ZERO);
    }

    #[test]
    fn transform_to_affine_maps_anchor_to_translate() {
        let t = Transform2D {
            translate: Vec2::new(50.0, 60.0),
            rotation_rad: std::f64::consts::FRAC_PI_2,
            scale: Vec2::new(2.0, 2.0),
            anchor: Vec2::new(8.0, 8.0),
        };
        let p = t.to_affine() * Point::new(8.0, 8.0);
        assert!((p.x - 50.0).abs() < 1e-9);
        assert!((p.y - 60.0).abs() < 1e-9);
    }
}
