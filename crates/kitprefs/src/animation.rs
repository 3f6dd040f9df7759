use serde::{Deserialize, Serialize};

pub use interpolation::InterpolateFn;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AnimationPreferences {
    /// Duration in seconds of the animation that moves a newly revealed piece
    /// into place.
    pub piece_entry_duration: f32,
    pub piece_entry_interpolation: InterpolateFn,
}
impl Default for AnimationPreferences {
    fn default() -> Self {
        Self {
            piece_entry_duration: 0.6,
            piece_entry_interpolation: InterpolateFn::EaseOutCubic,
        }
    }
}
impl AnimationPreferences {
    /// Returns the eased progress of a piece entry animation that has been
    /// running for `elapsed_secs`, in the range [0, 1].
    pub fn piece_entry_progress(&self, elapsed_secs: f32) -> f32 {
        if self.piece_entry_duration <= 0.0 {
            return 1.0;
        }
        let t = (elapsed_secs / self.piece_entry_duration).clamp(0.0, 1.0);
        self.piece_entry_interpolation.interpolate(t)
    }
}

pub mod interpolation {
    //! Interpolation functions.

    use std::f32::consts::PI;

    use serde::{Deserialize, Serialize};

    /// Function that maps a float from the range 0.0 to 1.0 to another float
    /// from 0.0 to 1.0.
    #[derive(
        Serialize,
        Deserialize,
        Debug,
        Default,
        Copy,
        Clone,
        PartialEq,
        Eq,
        Hash,
        Display,
        EnumString,
        VariantArray,
    )]
    #[serde(rename_all = "snake_case")]
    #[strum(serialize_all = "snake_case")]
    pub enum InterpolateFn {
        Lerp,
        Cosine,
        Cubic,
        EaseOutQuad,
        #[default]
        EaseOutCubic,
        EaseOutQuart,
        Circular,
        Bounce,
        Overshoot,
        Underdamped,
    }

    impl InterpolateFn {
        /// Returns the interpolation value in the range [0, 1] for `t` in the
        /// range [0, 1].
        pub fn interpolate(self, mut t: f32) -> f32 {
            match self {
                Self::Lerp => t,

                Self::Cosine => (1.0 - (t * PI).cos()) / 2.0,

                Self::Cubic => (3.0 - 2.0 * t) * t * t,

                Self::EaseOutQuad => 1.0 - (1.0 - t).powi(2),
                Self::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
                Self::EaseOutQuart => 1.0 - (1.0 - t).powi(4),

                Self::Circular => {
                    if t < 0.5 {
                        (1.0 - (1.0 - (2.0 * t).powf(2.0)).sqrt()) * 0.5
                    } else {
                        (1.0 + (1.0 - (-2.0 * t + 2.0).powf(2.0)).sqrt()) * 0.5
                    }
                }

                Self::Bounce => {
                    // https://easings.net/#easeOutBounce
                    let n1 = 7.5625;
                    let d1 = 2.75;

                    if t < 1.0 / d1 {
                        n1 * t * t
                    } else if t < 2.0 / d1 {
                        t -= 1.5 / d1;
                        n1 * t * t + 0.75
                    } else if t < 2.5 / d1 {
                        t -= 2.25 / d1;
                        n1 * t * t + 0.9375
                    } else {
                        t -= 2.625 / d1;
                        n1 * t * t + 0.984375
                    }
                }
                Self::Overshoot => {
                    // https://easings.net/#easeOutBack
                    let c1 = 1.70158;
                    let c3 = c1 + 1.0;
                    1.0 + c3 * (t - 1.0).powf(3.0) + c1 * (t - 1.0).powf(2.0)
                }
                Self::Underdamped => {
                    // https://easings.net/#easeOutElastic
                    if t <= 0.0 {
                        return 0.0;
                    }
                    if t >= 1.0 {
                        return 1.0;
                    }
                    let c4 = (2.0 * PI) / 3.0;
                    2.0_f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
                }
            }
        }
    }
}
