//! Gesture recognition and dispatch for Ondule.
//!
//! The [`GestureCoordinator`] receives a raw pointer-event stream and fans
//! each event out to the active recognizer set. Recognizers decide which
//! semantic gesture occurred (tap, double-tap, long-press) and drive a
//! [`ondule_animation::SpreadingEffect`] through acceptance or rejection;
//! user callbacks fire at the moment the gesture contract specifies:
//! immediately for non-rejectable gestures, on acceptance for rejectable
//! ones.
//!
//! Recognizer instances live for one input lifecycle: they are built on
//! demand from the builder set when a pointer goes down with no outstanding
//! lifecycle, and swept from the active set once resolved. A permanent
//! Holding recognizer marks "a lifecycle has started" so the coordinator can
//! tell a fully resolved lifecycle apart from one that never began.

mod builder;
mod callbacks;
mod coordinator;
mod observer;
mod recognizer;
mod settings;
mod types;

pub use ondule_core::Point;

pub use callbacks::{ContinuableCallback, GestureCallbacks, TapCallback};
pub use coordinator::GestureCoordinator;
pub use observer::{GestureEvents, GestureOutcome, RecognizerKind};
pub use recognizer::GestureContinuation;
pub use settings::{
    GestureSettings, ACCEPTABLE_DURATION, DOUBLE_TAP_WINDOW, LONG_PRESS_THRESHOLD,
    PREVIEW_MIN_DURATION, TOUCH_SLOP,
};
pub use types::{PointerEvent, PointerEventKind, PointerId};
