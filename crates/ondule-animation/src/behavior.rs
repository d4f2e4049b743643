//! Timing and curve configuration for a spreading effect.

use std::time::Duration;

use crate::easing::Easing;

/// Immutable timing/curve parameters for one effect's phases.
///
/// Percent fields are fractions of the effect's full extent and live in
/// `[0, 1]`. `lower_percent <= upper_percent` and
/// `fade_lower_percent <= fade_upper_percent` must hold; construct through
/// [`EffectBehavior::validated`] when the values come from outside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectBehavior {
    /// Spread fraction the effect starts from.
    pub lower_percent: f32,
    /// Spread fraction the effect grows toward.
    pub upper_percent: f32,
    /// Alpha the fade-in starts from.
    pub fade_lower_percent: f32,
    /// Alpha the fade-in ramps to.
    pub fade_upper_percent: f32,
    /// Minimum spread fraction before an accepted effect may fire its
    /// completion callback; acceptance below this defers the firing.
    pub event_callbackable_min_percent: f32,
    pub spread_duration: Duration,
    pub fade_in_duration: Duration,
    pub fade_out_duration: Duration,
    /// Duration of the reject/cancel fade. Zero means immediate removal.
    pub cancel_duration: Duration,
    pub spread_curve: Easing,
    pub fade_in_curve: Easing,
    pub fade_out_curve: Easing,
    pub cancel_curve: Easing,
}

impl Default for EffectBehavior {
    fn default() -> Self {
        Self {
            lower_percent: 0.0,
            upper_percent: 1.0,
            fade_lower_percent: 0.0,
            fade_upper_percent: 1.0,
            event_callbackable_min_percent: 0.3,
            spread_duration: Duration::from_millis(300),
            fade_in_duration: Duration::from_millis(75),
            fade_out_duration: Duration::from_millis(150),
            cancel_duration: Duration::from_millis(75),
            spread_curve: Easing::FastOutSlowInEasing,
            fade_in_curve: Easing::LinearEasing,
            fade_out_curve: Easing::EaseOut,
            cancel_curve: Easing::LinearEasing,
        }
    }
}

impl EffectBehavior {
    pub fn with_spread(mut self, duration: Duration, curve: Easing) -> Self {
        self.spread_duration = duration;
        self.spread_curve = curve;
        self
    }

    pub fn with_fade_in(mut self, duration: Duration, curve: Easing) -> Self {
        self.fade_in_duration = duration;
        self.fade_in_curve = curve;
        self
    }

    pub fn with_fade_out(mut self, duration: Duration, curve: Easing) -> Self {
        self.fade_out_duration = duration;
        self.fade_out_curve = curve;
        self
    }

    pub fn with_cancel(mut self, duration: Duration, curve: Easing) -> Self {
        self.cancel_duration = duration;
        self.cancel_curve = curve;
        self
    }

    pub fn with_percent_range(mut self, lower: f32, upper: f32) -> Self {
        self.lower_percent = lower;
        self.upper_percent = upper;
        self
    }

    pub fn with_fade_percent_range(mut self, lower: f32, upper: f32) -> Self {
        self.fade_lower_percent = lower;
        self.fade_upper_percent = upper;
        self
    }

    pub fn with_event_callbackable_min_percent(mut self, percent: f32) -> Self {
        self.event_callbackable_min_percent = percent;
        self
    }

    /// Check the percent-range invariants, returning the behavior unchanged
    /// when they hold.
    pub fn validated(self) -> Result<Self, BehaviorError> {
        let percents = [
            ("lower_percent", self.lower_percent),
            ("upper_percent", self.upper_percent),
            ("fade_lower_percent", self.fade_lower_percent),
            ("fade_upper_percent", self.fade_upper_percent),
            (
                "event_callbackable_min_percent",
                self.event_callbackable_min_percent,
            ),
        ];
        for (field, value) in percents {
            if !(0.0..=1.0).contains(&value) || value.is_nan() {
                return Err(BehaviorError::PercentOutOfRange { field, value });
            }
        }
        if self.lower_percent > self.upper_percent {
            return Err(BehaviorError::InvertedRange {
                lower_field: "lower_percent",
                lower: self.lower_percent,
                upper_field: "upper_percent",
                upper: self.upper_percent,
            });
        }
        if self.fade_lower_percent > self.fade_upper_percent {
            return Err(BehaviorError::InvertedRange {
                lower_field: "fade_lower_percent",
                lower: self.fade_lower_percent,
                upper_field: "fade_upper_percent",
                upper: self.fade_upper_percent,
            });
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BehaviorError {
    PercentOutOfRange {
        field: &'static str,
        value: f32,
    },
    InvertedRange {
        lower_field: &'static str,
        lower: f32,
        upper_field: &'static str,
        upper: f32,
    },
}

impl std::fmt::Display for BehaviorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BehaviorError::PercentOutOfRange { field, value } => {
                write!(f, "{field} must be within [0, 1], got {value}")
            }
            BehaviorError::InvertedRange {
                lower_field,
                lower,
                upper_field,
                upper,
            } => {
                write!(
                    f,
                    "{lower_field} ({lower}) must not exceed {upper_field} ({upper})"
                )
            }
        }
    }
}

impl std::error::Error for BehaviorError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_behavior_is_valid() {
        assert!(EffectBehavior::default().validated().is_ok());
    }

    #[test]
    fn percent_out_of_range_is_rejected() {
        let behavior = EffectBehavior::default().with_event_callbackable_min_percent(1.5);
        assert_eq!(
            behavior.validated(),
            Err(BehaviorError::PercentOutOfRange {
                field: "event_callbackable_min_percent",
                value: 1.5,
            })
        );
    }

    #[test]
    fn inverted_spread_range_is_rejected() {
        let behavior = EffectBehavior::default().with_percent_range(0.8, 0.2);
        assert!(matches!(
            behavior.validated(),
            Err(BehaviorError::InvertedRange {
                lower_field: "lower_percent",
                ..
            })
        ));
    }

    #[test]
    fn inverted_fade_range_is_rejected() {
        let behavior = EffectBehavior::default().with_fade_percent_range(0.9, 0.1);
        assert!(matches!(
            behavior.validated(),
            Err(BehaviorError::InvertedRange {
                lower_field: "fade_lower_percent",
                ..
            })
        ));
    }

    #[test]
    fn error_display_names_the_field() {
        let err = EffectBehavior::default()
            .with_percent_range(-0.1, 1.0)
            .validated()
            .unwrap_err();
        assert!(err.to_string().contains("lower_percent"));
    }
}
