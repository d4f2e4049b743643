//! Spreading-effect state machine.
//!
//! Phases: `Spreading → Fading → {Accepted | Rejected | Cancelled} → Disposed`.
//! The effect owns two animation tracks: the spread track (growth fraction
//! between the behavior's lower and upper percent) and the fade track (alpha).
//! Both advance on the scheduler's frame clock; the effect re-registers a
//! frame callback while anything is still moving and idles otherwise.
//!
//! A rejectable effect starts speculatively and fires its completion callback
//! only on acceptance; a non-rejectable effect fires it at `start()` and the
//! animation is purely decorative. Terminal transitions are idempotent: once
//! a decision is made, later transition calls log and do nothing.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use log::{debug, warn};
use ondule_core::{FrameRegistration, Point, Scheduler};

use crate::behavior::EffectBehavior;
use crate::easing::Easing;

/// Animation phase of one spreading effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectPhase {
    /// Growing from `lower_percent` toward `upper_percent`.
    Spreading,
    /// Spread complete; fade-in settling or idling until a decision arrives.
    Fading,
    /// Accepted; fading out. The completion callback has fired or will fire
    /// once the spread crosses the callbackable threshold.
    Accepted,
    /// Rejected; quick fade. The completion callback will never fire.
    Rejected,
    /// Torn down by the host; quick fade, no callback.
    Cancelled,
    /// Final state; every call is a no-op.
    Disposed,
}

impl EffectPhase {
    /// Whether the accept/reject/cancel decision has been made.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EffectPhase::Accepted
                | EffectPhase::Rejected
                | EffectPhase::Cancelled
                | EffectPhase::Disposed
        )
    }
}

/// Host-side owner of spreading effects.
///
/// Recognizers hand each newly created effect to the controller, which takes
/// rendering/animation ownership; the recognizer keeps only a weak handle.
pub trait EffectController {
    fn attach(&self, effect: SpreadingEffect);
}

/// Optional sink for effect state transitions.
pub trait EffectEvents {
    fn phase_changed(&self, _from: EffectPhase, _to: EffectPhase) {}
    fn callback_fired(&self) {}
}

/// One tween track: `from → to` over `duration` through `curve`.
///
/// The track clock starts at the first sample, matching frame-driven
/// animation where elapsed time is measured from the first frame.
#[derive(Debug, Clone, Copy)]
struct Track {
    from: f32,
    to: f32,
    duration: Duration,
    curve: Easing,
    start_nanos: Option<u64>,
}

impl Track {
    fn new(from: f32, to: f32, duration: Duration, curve: Easing) -> Self {
        Self {
            from,
            to,
            duration,
            curve,
            start_nanos: None,
        }
    }

    fn value_at(&mut self, now: u64) -> f32 {
        if self.duration.is_zero() {
            return self.to;
        }
        let start = *self.start_nanos.get_or_insert(now);
        let elapsed = now.saturating_sub(start);
        let duration = self.duration.as_nanos() as u64;
        let linear = (elapsed as f32 / duration as f32).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * self.curve.transform(linear)
    }

    fn finished(&self, now: u64) -> bool {
        if self.duration.is_zero() {
            return true;
        }
        match self.start_nanos {
            Some(start) => now.saturating_sub(start) >= self.duration.as_nanos() as u64,
            None => false,
        }
    }
}

struct EffectInner {
    scheduler: Scheduler,
    behavior: EffectBehavior,
    base_offset: Point,
    rejectable: bool,
    started: bool,
    phase: EffectPhase,
    spread: Track,
    fade: Track,
    progress: f32,
    alpha: f32,
    callback: Option<Rc<dyn Fn()>>,
    callback_deferred: bool,
    events: Option<Rc<dyn EffectEvents>>,
    registration: Option<FrameRegistration>,
}

/// Handle to one ripple instance. Cloning shares the same effect.
#[derive(Clone)]
pub struct SpreadingEffect {
    inner: Rc<RefCell<EffectInner>>,
}

/// Weak handle kept by the creating recognizer; the host controls lifetime.
#[derive(Clone, Default)]
pub struct WeakSpreadingEffect {
    inner: Weak<RefCell<EffectInner>>,
}

impl WeakSpreadingEffect {
    pub fn upgrade(&self) -> Option<SpreadingEffect> {
        self.inner.upgrade().map(|inner| SpreadingEffect { inner })
    }
}

impl std::fmt::Debug for SpreadingEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("SpreadingEffect")
            .field("phase", &inner.phase)
            .field("rejectable", &inner.rejectable)
            .field("progress", &inner.progress)
            .field("alpha", &inner.alpha)
            .finish_non_exhaustive()
    }
}

impl SpreadingEffect {
    /// Create an effect originating at `base_offset`.
    ///
    /// `callback` is the zero-argument action fired on effective completion:
    /// at `start()` for a non-rejectable effect, at (or after, see the
    /// callbackable threshold) acceptance for a rejectable one.
    pub fn new(
        scheduler: Scheduler,
        base_offset: Point,
        rejectable: bool,
        behavior: EffectBehavior,
        callback: impl Fn() + 'static,
    ) -> Self {
        debug_assert!(behavior.validated().is_ok(), "invalid effect behavior");
        let spread = Track::new(
            behavior.lower_percent,
            behavior.upper_percent,
            behavior.spread_duration,
            behavior.spread_curve,
        );
        let fade = Track::new(
            behavior.fade_lower_percent,
            behavior.fade_upper_percent,
            behavior.fade_in_duration,
            behavior.fade_in_curve,
        );
        Self {
            inner: Rc::new(RefCell::new(EffectInner {
                scheduler,
                progress: behavior.lower_percent,
                alpha: behavior.fade_lower_percent,
                behavior,
                base_offset,
                rejectable,
                started: false,
                phase: EffectPhase::Spreading,
                spread,
                fade,
                callback: Some(Rc::new(callback)),
                callback_deferred: false,
                events: None,
                registration: None,
            })),
        }
    }

    /// Install an optional transition sink.
    pub fn set_events(&self, events: Rc<dyn EffectEvents>) {
        self.inner.borrow_mut().events = Some(events);
    }

    pub fn phase(&self) -> EffectPhase {
        self.inner.borrow().phase
    }

    /// Current spread fraction within `[lower_percent, upper_percent]`.
    pub fn progress(&self) -> f32 {
        self.inner.borrow().progress
    }

    /// Current fade alpha.
    pub fn alpha(&self) -> f32 {
        self.inner.borrow().alpha
    }

    pub fn base_offset(&self) -> Point {
        self.inner.borrow().base_offset
    }

    pub fn is_rejectable(&self) -> bool {
        self.inner.borrow().rejectable
    }

    pub fn downgrade(&self) -> WeakSpreadingEffect {
        WeakSpreadingEffect {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Entry action: begin the spread and fade-in tracks.
    ///
    /// A non-rejectable effect fires its completion callback here,
    /// fire-and-forget; the animation cannot veto the committed action.
    pub fn start(&self) {
        let fire = {
            let mut inner = self.inner.borrow_mut();
            if inner.started {
                debug_assert!(false, "SpreadingEffect::start called twice");
                warn!("spreading effect already started; ignoring start()");
                return;
            }
            inner.started = true;
            debug!(
                "effect start at ({}, {}), rejectable={}",
                inner.base_offset.x, inner.base_offset.y, inner.rejectable
            );
            if inner.rejectable {
                None
            } else {
                inner.callback.take()
            }
        };
        if let Some(callback) = fire {
            callback();
            if let Some(events) = self.events() {
                events.callback_fired();
            }
        }
        Self::schedule_frame(&self.inner);
    }

    /// Accept the gesture this effect previews.
    ///
    /// Valid while a rejectable effect is in `Spreading` or `Fading`. Fires
    /// the completion callback if the spread has reached the callbackable
    /// threshold, otherwise defers the firing until it does.
    pub fn on_accepted(&self) {
        let (from, fire) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.rejectable {
                debug_assert!(false, "on_accepted on a non-rejectable effect");
                warn!("on_accepted ignored: effect is not rejectable");
                return;
            }
            if !inner.started {
                warn!("on_accepted ignored: effect never started");
                return;
            }
            if inner.phase.is_terminal() {
                warn!("on_accepted ignored in phase {:?}", inner.phase);
                return;
            }
            let from = inner.phase;
            inner.phase = EffectPhase::Accepted;
            inner.fade = Track::new(
                inner.alpha,
                inner.behavior.fade_lower_percent,
                inner.behavior.fade_out_duration,
                inner.behavior.fade_out_curve,
            );
            let fire = if inner.progress >= inner.behavior.event_callbackable_min_percent {
                inner.callback.take()
            } else {
                inner.callback_deferred = true;
                None
            };
            (from, fire)
        };
        self.notify_phase(from, EffectPhase::Accepted);
        if let Some(callback) = fire {
            callback();
            if let Some(events) = self.events() {
                events.callback_fired();
            }
        }
        if self.instant_fade() {
            Self::dispose(&self.inner);
        } else {
            Self::schedule_frame(&self.inner);
        }
    }

    /// Reject the gesture: the completion callback will never fire.
    pub fn on_rejected(&self) {
        let from = {
            let mut inner = self.inner.borrow_mut();
            if !inner.rejectable {
                debug_assert!(false, "on_rejected on a non-rejectable effect");
                warn!("on_rejected ignored: effect is not rejectable");
                return;
            }
            if !inner.started {
                warn!("on_rejected ignored: effect never started");
                return;
            }
            if inner.phase.is_terminal() {
                warn!("on_rejected ignored in phase {:?}", inner.phase);
                return;
            }
            let from = inner.phase;
            inner.phase = EffectPhase::Rejected;
            inner.callback = None;
            inner.callback_deferred = false;
            inner.fade = Track::new(
                inner.alpha,
                0.0,
                inner.behavior.cancel_duration,
                inner.behavior.cancel_curve,
            );
            from
        };
        self.notify_phase(from, EffectPhase::Rejected);
        if self.instant_fade() {
            Self::dispose(&self.inner);
        } else {
            Self::schedule_frame(&self.inner);
        }
    }

    /// Host-driven teardown: discard the effect regardless of its decision.
    ///
    /// A no-op once the effect has reached a terminal phase.
    pub fn cancel(&self) {
        let from = {
            let mut inner = self.inner.borrow_mut();
            if inner.phase.is_terminal() {
                return;
            }
            if !inner.started {
                // Never animated; nothing to fade.
                drop(inner);
                Self::dispose(&self.inner);
                return;
            }
            let from = inner.phase;
            inner.phase = EffectPhase::Cancelled;
            inner.callback = None;
            inner.callback_deferred = false;
            inner.fade = Track::new(
                inner.alpha,
                0.0,
                inner.behavior.cancel_duration,
                inner.behavior.cancel_curve,
            );
            from
        };
        self.notify_phase(from, EffectPhase::Cancelled);
        if self.instant_fade() {
            Self::dispose(&self.inner);
        } else {
            Self::schedule_frame(&self.inner);
        }
    }

    fn events(&self) -> Option<Rc<dyn EffectEvents>> {
        self.inner.borrow().events.clone()
    }

    fn instant_fade(&self) -> bool {
        self.inner.borrow().fade.duration.is_zero()
    }

    fn notify_phase(&self, from: EffectPhase, to: EffectPhase) {
        debug!("effect phase {from:?} -> {to:?}");
        if let Some(events) = self.events() {
            events.phase_changed(from, to);
        }
    }

    fn schedule_frame(this: &Rc<RefCell<EffectInner>>) {
        let scheduler = {
            let inner = this.borrow();
            if inner.registration.is_some() || !inner.started || inner.phase == EffectPhase::Disposed
            {
                return;
            }
            inner.scheduler.clone()
        };
        let weak = Rc::downgrade(this);
        let registration = scheduler.with_frame_nanos(move |time| {
            if let Some(strong) = weak.upgrade() {
                Self::on_frame(&strong, time);
            }
        });
        this.borrow_mut().registration = Some(registration);
    }

    fn on_frame(this: &Rc<RefCell<EffectInner>>, frame_time_nanos: u64) {
        let mut changes: Vec<(EffectPhase, EffectPhase)> = Vec::new();
        let mut fire: Option<Rc<dyn Fn()>> = None;
        let mut dispose_now = false;
        let mut schedule_next = false;
        let events = {
            let mut inner = this.borrow_mut();
            inner.registration = None;
            let now = frame_time_nanos;
            match inner.phase {
                EffectPhase::Spreading => {
                    inner.progress = inner.spread.value_at(now);
                    inner.alpha = inner.fade.value_at(now);
                    if inner.spread.finished(now) {
                        inner.phase = EffectPhase::Fading;
                        changes.push((EffectPhase::Spreading, EffectPhase::Fading));
                        if !inner.rejectable {
                            // Decorative effect: nothing can veto it, settle
                            // as accepted and fade out.
                            inner.phase = EffectPhase::Accepted;
                            changes.push((EffectPhase::Fading, EffectPhase::Accepted));
                            inner.fade = Track::new(
                                inner.alpha,
                                inner.behavior.fade_lower_percent,
                                inner.behavior.fade_out_duration,
                                inner.behavior.fade_out_curve,
                            );
                            if inner.fade.duration.is_zero() {
                                dispose_now = true;
                            } else {
                                schedule_next = true;
                            }
                        } else if !inner.fade.finished(now) {
                            schedule_next = true;
                        }
                        // Otherwise idle in Fading until a decision arrives.
                    } else {
                        schedule_next = true;
                    }
                }
                EffectPhase::Fading => {
                    inner.alpha = inner.fade.value_at(now);
                    if !inner.fade.finished(now) {
                        schedule_next = true;
                    }
                }
                EffectPhase::Accepted => {
                    // The spread keeps growing underneath the fade-out so a
                    // deferred callback can still cross its threshold.
                    inner.progress = inner.spread.value_at(now);
                    inner.alpha = inner.fade.value_at(now);
                    if inner.callback_deferred
                        && inner.progress >= inner.behavior.event_callbackable_min_percent
                    {
                        inner.callback_deferred = false;
                        fire = inner.callback.take();
                    }
                    if inner.fade.finished(now) {
                        dispose_now = true;
                    } else {
                        schedule_next = true;
                    }
                }
                EffectPhase::Rejected | EffectPhase::Cancelled => {
                    inner.alpha = inner.fade.value_at(now);
                    if inner.fade.finished(now) {
                        dispose_now = true;
                    } else {
                        schedule_next = true;
                    }
                }
                EffectPhase::Disposed => {}
            }
            inner.events.clone()
        };

        if let Some(events) = &events {
            for (from, to) in &changes {
                events.phase_changed(*from, *to);
            }
        }
        if let Some(callback) = fire {
            callback();
            if let Some(events) = &events {
                events.callback_fired();
            }
        }
        if dispose_now {
            Self::dispose(this);
        } else if schedule_next {
            Self::schedule_frame(this);
        }
    }

    fn dispose(this: &Rc<RefCell<EffectInner>>) {
        let (from, fire, events) = {
            let mut inner = this.borrow_mut();
            if inner.phase == EffectPhase::Disposed {
                return;
            }
            let from = inner.phase;
            inner.phase = EffectPhase::Disposed;
            inner.registration = None;
            if from.is_terminal() {
                // The terminal fade may be skipped entirely (zero duration);
                // land on its target alpha either way.
                inner.alpha = inner.fade.to;
            }
            // Acceptance guarantees exactly one firing: a deferred callback
            // whose threshold was never crossed fires here.
            let fire = if inner.callback_deferred {
                inner.callback_deferred = false;
                inner.callback.take()
            } else {
                None
            };
            inner.callback = None;
            (from, fire, inner.events.clone())
        };
        debug!("effect disposed from {from:?}");
        if let Some(events) = &events {
            events.phase_changed(from, EffectPhase::Disposed);
        }
        if let Some(callback) = fire {
            callback();
            if let Some(events) = &events {
                events.callback_fired();
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/effect_tests.rs"]
mod tests;
