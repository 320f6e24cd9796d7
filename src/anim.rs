use crate::{
    anim_ease::Ease,
    foundation::core::{DurationMs, Vec2},
    foundation::error::{PlayforgeError, PlayforgeResult},
};

pub trait Lerp: Sized {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

/// Cycle count for an animation. Serialized as `-1` (infinite) or the
/// number of extra cycles after the first, matching the runtime wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Repeat {
    Infinite,
    Count(u32),
}

impl TryFrom<i64> for Repeat {
    type Error = String;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        match v {
            -1 => Ok(Self::Infinite),
            n if n >= 0 => u32::try_from(n)
                .map(Self::Count)
                .map_err(|_| format!("repeat count {n} out of range")),
            n => Err(format!("repeat must be -1 or >= 0, got {n}")),
        }
    }
}

impl From<Repeat> for i64 {
    fn from(r: Repeat) -> Self {
        match r {
            Repeat::Infinite => -1,
            Repeat::Count(n) => i64::from(n),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnimationSpec<T> {
    pub active: bool,
    pub destination: T,
    pub duration: DurationMs,
    pub repeat: Repeat,
    #[serde(default)]
    pub ease: Ease,
    #[serde(default)]
    pub yoyo: bool,
}

impl<T> AnimationSpec<T>
where
    T: Lerp + Clone,
{
    pub fn validate(&self) -> PlayforgeResult<()> {
        if self.duration.0 == 0 {
            return Err(PlayforgeError::animation(
                "animation duration must be > 0 ms",
            ));
        }
        Ok(())
    }

    /// Value of the animated property at `elapsed_ms` since the animation
    /// began. Pure: identical inputs always yield identical output.
    ///
    /// Inactive specs hold the base value. A finished finite repeat holds
    /// the exact destination for all later times.
    pub fn sample(&self, base: &T, elapsed_ms: u64) -> T {
        if !self.active {
            return base.clone();
        }
        let duration = self.duration.0;
        if duration == 0 {
            return self.destination.clone();
        }

        let cycle = elapsed_ms / duration;
        if let Repeat::Count(n) = self.repeat {
            if cycle > u64::from(n) {
                return self.destination.clone();
            }
        }

        let mut progress = (elapsed_ms % duration) as f64 / duration as f64;
        if self.yoyo && cycle % 2 == 1 {
            progress = 1.0 - progress;
        }
        let t = self.ease.apply(progress);
        T::lerp(base, &self.destination, t)
    }
}

/// Per-property animations a sprite may carry.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpriteAnimations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<AnimationSpec<Vec2>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<AnimationSpec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparency: Option<AnimationSpec<f64>>,
}

/// Fully resolved animated state of a sprite at one instant, in the
/// sprite's normalized coordinate basis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteFrame {
    pub position: Vec2,
    pub scale: f64,
    pub transparency: f64,
}

impl SpriteAnimations {
    pub fn validate(&self) -> PlayforgeResult<()> {
        if let Some(a) = &self.position {
            a.validate()?;
        }
        if let Some(a) = &self.scale {
            a.validate()?;
        }
        if let Some(a) = &self.transparency {
            a.validate()?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.scale.is_none() && self.transparency.is_none()
    }

    pub fn sample(
        &self,
        base_position: Vec2,
        base_scale: f64,
        base_transparency: f64,
        elapsed_ms: u64,
    ) -> SpriteFrame {
        let position = match &self.position {
            Some(a) => a.sample(&base_position, elapsed_ms),
            None => base_position,
        };
        let scale = match &self.scale {
            Some(a) => a.sample(&base_scale, elapsed_ms),
            None => base_scale,
        };
        let transparency = match &self.transparency {
            Some(a) => a.sample(&base_transparency, elapsed_ms).clamp(0.0, 1.0),
            None => base_transparency,
        };
        SpriteFrame {
            position,
            scale,
            transparency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(destination: f64, duration: u64, repeat: Repeat, yoyo: bool) -> AnimationSpec<f64> {
        AnimationSpec {
            active: true,
            destination,
            duration: DurationMs(duration),
            repeat,
            ease: Ease::Linear,
            yoyo,
        }
    }

    #[test]
    fn inactive_spec_holds_base() {
        let mut s = spec(10.0, 1000, Repeat::Infinite, false);
        s.active = false;
        assert_eq!(s.sample(&3.0, 0), 3.0);
        assert_eq!(s.sample(&3.0, 12_345), 3.0);
    }

    #[test]
    fn linear_progress_within_cycle() {
        let s = spec(10.0, 1000, Repeat::Infinite, false);
        assert_eq!(s.sample(&0.0, 0), 0.0);
        assert_eq!(s.sample(&0.0, 250), 2.5);
        assert_eq!(s.sample(&0.0, 500), 5.0);
        // Next cycle wraps back toward base.
        assert_eq!(s.sample(&0.0, 1250), 2.5);
    }

    #[test]
    fn sample_is_idempotent() {
        let s = spec(8.0, 700, Repeat::Count(3), true);
        for elapsed in [0, 99, 700, 1399, 3000, 50_000] {
            assert_eq!(s.sample(&1.0, elapsed), s.sample(&1.0, elapsed));
        }
    }

    #[test]
    fn yoyo_reflects_odd_cycles() {
        let s = spec(10.0, 1000, Repeat::Infinite, true);
        // First cycle runs forward, second runs backward.
        assert_eq!(s.sample(&0.0, 250), 2.5);
        assert_eq!(s.sample(&0.0, 1250), 7.5);
        assert_eq!(s.sample(&0.0, 2250), 2.5);
    }

    #[test]
    fn finite_repeat_snaps_to_destination_and_stays() {
        let s = spec(10.0, 1000, Repeat::Count(2), false);
        // Cycles 0..=2 animate; anything past the third cycle boundary holds.
        assert_eq!(s.sample(&0.0, 2500), 5.0);
        assert_eq!(s.sample(&0.0, 3000), 10.0);
        assert_eq!(s.sample(&0.0, 3001), 10.0);
        assert_eq!(s.sample(&0.0, 1_000_000), 10.0);
    }

    #[test]
    fn finite_yoyo_also_terminates_on_destination() {
        let s = spec(10.0, 1000, Repeat::Count(1), true);
        assert_eq!(s.sample(&0.0, 2500), 10.0);
        assert_eq!(s.sample(&0.0, 9999), 10.0);
    }

    #[test]
    fn position_animation_lerps_vec2() {
        let s = AnimationSpec {
            active: true,
            destination: Vec2::new(1.0, 0.0),
            duration: DurationMs(100),
            repeat: Repeat::Infinite,
            ease: Ease::Linear,
            yoyo: false,
        };
        let v = s.sample(&Vec2::new(0.0, 1.0), 50);
        assert_eq!(v, Vec2::new(0.5, 0.5));
    }

    #[test]
    fn repeat_wire_format_round_trips() {
        assert_eq!(serde_json::to_string(&Repeat::Infinite).unwrap(), "-1");
        assert_eq!(serde_json::to_string(&Repeat::Count(4)).unwrap(), "4");
        let r: Repeat = serde_json::from_str("-1").unwrap();
        assert_eq!(r, Repeat::Infinite);
        assert!(serde_json::from_str::<Repeat>("-2").is_err());
    }

    #[test]
    fn validate_rejects_zero_duration() {
        let s = spec(1.0, 0, Repeat::Infinite, false);
        assert!(s.validate().is_err());
    }

    #[test]
    fn sprite_animations_sample_merges_properties() {
        let anims = SpriteAnimations {
            position: None,
            scale: Some(spec(2.0, 1000, Repeat::Infinite, false)),
            transparency: Some(spec(0.0, 1000, Repeat::Infinite, false)),
        };
        let frame = anims.sample(Vec2::new(0.5, 0.5), 1.0, 1.0, 500);
        assert_eq!(frame.position, Vec2::new(0.5, 0.5));
        assert_eq!(frame.scale, 1.5);
        assert_eq!(frame.transparency, 0.5);
    }
}
