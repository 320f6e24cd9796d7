/// Easing curve applied to a cycle's progress before interpolation.
///
/// Serialized names are the wire format shared with the exported runtime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ease {
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
}

impl Ease {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InQuad => t * t,
            Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
        }
    }

    pub const ALL: [Self; 7] = [
        Self::Linear,
        Self::InQuad,
        Self::OutQuad,
        Self::InOutQuad,
        Self::InCubic,
        Self::OutCubic,
        Self::InOutCubic,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_stable() {
        for ease in Ease::ALL {
            assert_eq!(ease.apply(0.0), 0.0);
            assert_eq!(ease.apply(1.0), 1.0);
        }
    }

    #[test]
    fn input_is_clamped_to_unit_interval() {
        for ease in Ease::ALL {
            assert_eq!(ease.apply(-3.0), 0.0);
            assert_eq!(ease.apply(7.5), 1.0);
        }
    }

    #[test]
    fn in_and_out_pairs_mirror() {
        for (ease_in, ease_out) in [
            (Ease::InQuad, Ease::OutQuad),
            (Ease::InCubic, Ease::OutCubic),
        ] {
            for t in [0.1, 0.25, 0.4, 0.8] {
                let a = ease_in.apply(t);
                let b = 1.0 - ease_out.apply(1.0 - t);
                assert!((a - b).abs() < 1e-12, "{ease_in:?}/{ease_out:?} at {t}");
            }
        }
    }

    #[test]
    fn in_out_curves_hit_midpoint() {
        assert_eq!(Ease::InOutQuad.apply(0.5), 0.5);
        assert_eq!(Ease::InOutCubic.apply(0.5), 0.5);
    }

    #[test]
    fn wire_names_are_kebab_case() {
        assert_eq!(
            serde_json::to_string(&Ease::InOutCubic).unwrap(),
            "\"in-out-cubic\""
        );
        let e: Ease = serde_json::from_str("\"out-quad\"").unwrap();
        assert_eq!(e, Ease::OutQuad);
    }
}
