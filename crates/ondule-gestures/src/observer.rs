//! Optional observability hooks for gesture lifecycle transitions.
//!
//! The coordinator and recognizers call an installed [`GestureEvents`] sink
//! on state transitions instead of writing to standard output; hosts that
//! want diagnostics implement the trait, everyone else pays nothing.

use ondule_core::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognizerKind {
    Tap,
    Continuable,
    Holding,
}

/// How a recognizer left the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    Accepted,
    Rejected,
    Cancelled,
    TimedOut,
}

/// Sink for coordinator/recognizer transitions. All methods default to
/// no-ops so implementors override only what they observe.
pub trait GestureEvents {
    fn lifecycle_started(&self, _position: Point) {}
    fn builders_rebuilt(&self, _builder_count: usize) {}
    fn recognizer_resolved(&self, _kind: RecognizerKind, _outcome: GestureOutcome) {}
}
