//! Shared gesture thresholds for consistent touch/pointer handling.
//!
//! Values are in logical pixels and wall-clock durations. For very
//! high-density touch screens, consider scaling the slop by the device's DPI
//! factor; the defaults here work well for typical desktop/mobile displays.

use std::time::Duration;

/// Movement tolerance in logical pixels.
///
/// If the pointer moves more than this distance from the initial press
/// position, the tap is rejected. Matches common platform conventions
/// (Android uses ~8dp for `ViewConfiguration.TOUCH_SLOP`): large enough to
/// ignore finger jitter, small enough to feel responsive.
pub const TOUCH_SLOP: f32 = 8.0;

/// Time the pointer must stay down before a rejectable tap starts its
/// speculative spreading effect.
pub const PREVIEW_MIN_DURATION: Duration = Duration::from_millis(150);

/// Maximum press duration for a tap; longer contacts resolve as rejected.
pub const ACCEPTABLE_DURATION: Duration = Duration::from_millis(800);

/// Window after a first tap's release in which a second press counts as a
/// double-tap.
pub const DOUBLE_TAP_WINDOW: Duration = Duration::from_millis(300);

/// Press duration past which a long-press fires.
pub const LONG_PRESS_THRESHOLD: Duration = Duration::from_millis(500);

/// Per-coordinator gesture thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSettings {
    pub touch_slop: f32,
    pub preview_min_duration: Duration,
    pub acceptable_duration: Duration,
    pub double_tap_window: Duration,
    pub long_press_threshold: Duration,
    /// Whether plain taps take the speculative (rejectable) effect path.
    /// When false, taps commit immediately on release with a decorative
    /// effect only.
    pub tap_rejectable: bool,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            touch_slop: TOUCH_SLOP,
            preview_min_duration: PREVIEW_MIN_DURATION,
            acceptable_duration: ACCEPTABLE_DURATION,
            double_tap_window: DOUBLE_TAP_WINDOW,
            long_press_threshold: LONG_PRESS_THRESHOLD,
            tap_rejectable: true,
        }
    }
}

impl GestureSettings {
    pub fn with_touch_slop(mut self, slop: f32) -> Self {
        self.touch_slop = slop;
        self
    }

    pub fn with_preview_min_duration(mut self, duration: Duration) -> Self {
        self.preview_min_duration = duration;
        self
    }

    pub fn with_acceptable_duration(mut self, duration: Duration) -> Self {
        self.acceptable_duration = duration;
        self
    }

    pub fn with_double_tap_window(mut self, duration: Duration) -> Self {
        self.double_tap_window = duration;
        self
    }

    pub fn with_long_press_threshold(mut self, duration: Duration) -> Self {
        self.long_press_threshold = duration;
        self
    }

    pub fn with_tap_rejectable(mut self, rejectable: bool) -> Self {
        self.tap_rejectable = rejectable;
        self
    }
}
