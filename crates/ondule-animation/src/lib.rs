//! Ripple animation core: the [`SpreadingEffect`] state machine, its timing
//! and curve configuration, and the easing functions that drive both.
//!
//! One `SpreadingEffect` represents one visual ripple instance. A gesture
//! recognizer creates it, hands ownership to the host via
//! [`EffectController::attach`], and keeps only a weak handle through which
//! it later delivers the accept/reject decision. The effect advances its own
//! animation tracks on the scheduler's frame clock and guarantees exactly one
//! terminal transition.

mod behavior;
mod easing;
mod effect;

pub use behavior::{BehaviorError, EffectBehavior};
pub use easing::Easing;
pub use effect::{
    EffectController, EffectEvents, EffectPhase, SpreadingEffect, WeakSpreadingEffect,
};
