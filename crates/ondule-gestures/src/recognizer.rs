//! Gesture recognizer family.
//!
//! Recognizers consume one input lifecycle's pointer events and drive a
//! [`SpreadingEffect`] through acceptance or rejection. The family is a
//! closed set dispatched by exhaustive matching: [`TapRecognizer`] for plain
//! taps, [`ContinuableRecognizer`] for the double-tap / long-press variants,
//! and [`HoldingRecognizer`] as the permanent lifecycle sentinel.
//!
//! A recognizer keeps only a weak handle to the effect it created; the host
//! controller owns the effect. All timing goes through scheduler timers, so
//! a recognizer can never hang in `Tracking`: the acceptable-duration (or
//! double-tap window) timeout always resolves it.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::debug;
use ondule_animation::{EffectBehavior, EffectController, SpreadingEffect, WeakSpreadingEffect};
use ondule_core::{Point, Scheduler, TimerRegistration};

use crate::callbacks::{ContinuableCallback, TapCallback};
use crate::observer::{GestureEvents, GestureOutcome, RecognizerKind};
use crate::settings::GestureSettings;
use crate::types::{PointerEvent, PointerEventKind, PointerId};

/// Shared, immutable context handed to every recognizer of a lifecycle.
pub(crate) struct RecognizerContext {
    pub(crate) scheduler: Scheduler,
    pub(crate) controller: Rc<dyn EffectController>,
    pub(crate) behavior: EffectBehavior,
    pub(crate) settings: GestureSettings,
    pub(crate) events: Option<Rc<dyn GestureEvents>>,
}

impl RecognizerContext {
    fn notify_resolved(&self, kind: RecognizerKind, outcome: GestureOutcome) {
        debug!("recognizer {kind:?} resolved: {outcome:?}");
        if let Some(events) = &self.events {
            events.recognizer_resolved(kind, outcome);
        }
    }

    /// Build, attach, and start a spreading effect anchored at `position`.
    fn spawn_effect(
        &self,
        position: Point,
        rejectable: bool,
        callback: impl Fn() + 'static,
    ) -> SpreadingEffect {
        let effect = SpreadingEffect::new(
            self.scheduler.clone(),
            position,
            rejectable,
            self.behavior,
            callback,
        );
        self.controller.attach(effect.clone());
        effect.start();
        effect
    }
}

/// Closed recognizer family.
pub(crate) enum Recognizer {
    Tap(TapRecognizer),
    Continuable(ContinuableRecognizer),
    Holding(HoldingRecognizer),
}

impl Recognizer {
    pub(crate) fn kind(&self) -> RecognizerKind {
        match self {
            Recognizer::Tap(_) => RecognizerKind::Tap,
            Recognizer::Continuable(_) => RecognizerKind::Continuable,
            Recognizer::Holding(_) => RecognizerKind::Holding,
        }
    }

    pub(crate) fn handle_event(&self, event: &PointerEvent) {
        match self {
            Recognizer::Tap(recognizer) => recognizer.handle_event(event),
            Recognizer::Continuable(recognizer) => recognizer.handle_event(event),
            Recognizer::Holding(recognizer) => recognizer.handle_event(event),
        }
    }

    pub(crate) fn is_resolved(&self) -> bool {
        match self {
            Recognizer::Tap(recognizer) => recognizer.is_resolved(),
            Recognizer::Continuable(recognizer) => recognizer.is_resolved(),
            // The sentinel never resolves; it marks "lifecycle started".
            Recognizer::Holding(_) => false,
        }
    }

    /// Force an in-flight recognizer into its cancel path (used when the
    /// builder set is rebuilt underneath an active lifecycle).
    pub(crate) fn cancel_tracking(&self) {
        match self {
            Recognizer::Tap(recognizer) => recognizer.cancel_tracking(),
            Recognizer::Continuable(recognizer) => recognizer.cancel_tracking(),
            Recognizer::Holding(_) => {}
        }
    }
}

// ============================================================================
// Tap
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TapState {
    Idle,
    Tracking,
    Resolved,
}

struct TapInner {
    ctx: Rc<RecognizerContext>,
    on_tap: TapCallback,
    rejectable: bool,
    state: TapState,
    contact: Option<PointerId>,
    down_position: Point,
    preview_taken: bool,
    effect: WeakSpreadingEffect,
    preview_timer: Option<TimerRegistration>,
    timeout_timer: Option<TimerRegistration>,
}

/// Single-contact tap protocol.
///
/// Rejectable path: after `preview_min_duration` with the contact still down
/// and within slop, a rejectable effect starts speculatively; release within
/// `acceptable_duration` and slop accepts it (firing the user callback),
/// anything else rejects it. Non-rejectable path (or a release before the
/// preview): the callback commits immediately on a qualifying release with a
/// decorative effect.
pub(crate) struct TapRecognizer {
    inner: Rc<RefCell<TapInner>>,
}

impl TapRecognizer {
    pub(crate) fn new(ctx: Rc<RecognizerContext>, on_tap: TapCallback, rejectable: bool) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TapInner {
                ctx,
                on_tap,
                rejectable,
                state: TapState::Idle,
                contact: None,
                down_position: Point::ZERO,
                preview_taken: false,
                effect: WeakSpreadingEffect::default(),
                preview_timer: None,
                timeout_timer: None,
            })),
        }
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.inner.borrow().state == TapState::Resolved
    }

    pub(crate) fn handle_event(&self, event: &PointerEvent) {
        match event.kind {
            PointerEventKind::Down => Self::on_down(&self.inner, event),
            PointerEventKind::Move => Self::on_move(&self.inner, event),
            PointerEventKind::Up => Self::on_up(&self.inner, event),
            PointerEventKind::Cancel => Self::on_cancel(&self.inner, event),
        }
    }

    pub(crate) fn cancel_tracking(&self) {
        Self::reject_and_resolve(&self.inner, GestureOutcome::Cancelled);
    }

    fn on_down(this: &Rc<RefCell<TapInner>>, event: &PointerEvent) {
        let (scheduler, settings, rejectable) = {
            let mut inner = this.borrow_mut();
            if inner.state != TapState::Idle {
                return;
            }
            inner.state = TapState::Tracking;
            inner.contact = Some(event.id);
            inner.down_position = event.position;
            (
                inner.ctx.scheduler.clone(),
                inner.ctx.settings,
                inner.rejectable,
            )
        };
        if rejectable {
            let weak = Rc::downgrade(this);
            let registration = scheduler.after(settings.preview_min_duration, move |_| {
                if let Some(strong) = weak.upgrade() {
                    TapRecognizer::on_preview_deadline(&strong);
                }
            });
            this.borrow_mut().preview_timer = Some(registration);
        }
        let weak = Rc::downgrade(this);
        let registration = scheduler.after(settings.acceptable_duration, move |_| {
            if let Some(strong) = weak.upgrade() {
                TapRecognizer::reject_and_resolve(&strong, GestureOutcome::TimedOut);
            }
        });
        this.borrow_mut().timeout_timer = Some(registration);
    }

    /// Contact held past `preview_min_duration`: start the speculative
    /// rejectable effect, bound to the user tap callback.
    fn on_preview_deadline(this: &Rc<RefCell<TapInner>>) {
        let (ctx, position, on_tap) = {
            let inner = this.borrow();
            if inner.state != TapState::Tracking {
                return;
            }
            (inner.ctx.clone(), inner.down_position, inner.on_tap.clone())
        };
        debug!("tap preview at ({}, {})", position.x, position.y);
        let effect = ctx.spawn_effect(position, true, move || on_tap(position));
        let mut inner = this.borrow_mut();
        inner.preview_taken = true;
        inner.effect = effect.downgrade();
        inner.preview_timer = None;
    }

    fn on_move(this: &Rc<RefCell<TapInner>>, event: &PointerEvent) {
        let beyond_slop = {
            let inner = this.borrow();
            if inner.state != TapState::Tracking || inner.contact != Some(event.id) {
                return;
            }
            event.position.distance_to(inner.down_position) > inner.ctx.settings.touch_slop
        };
        if beyond_slop {
            Self::reject_and_resolve(this, GestureOutcome::Rejected);
        }
    }

    fn on_up(this: &Rc<RefCell<TapInner>>, event: &PointerEvent) {
        let (ctx, effect, preview_taken, within_slop, commit) = {
            let mut inner = this.borrow_mut();
            if inner.state != TapState::Tracking || inner.contact != Some(event.id) {
                return;
            }
            inner.state = TapState::Resolved;
            inner.preview_timer = None;
            inner.timeout_timer = None;
            let within_slop =
                event.position.distance_to(inner.down_position) <= inner.ctx.settings.touch_slop;
            let commit = if within_slop && !inner.preview_taken {
                Some((inner.down_position, inner.on_tap.clone()))
            } else {
                None
            };
            (
                inner.ctx.clone(),
                inner.effect.clone(),
                inner.preview_taken,
                within_slop,
                commit,
            )
        };
        if within_slop {
            if preview_taken {
                if let Some(effect) = effect.upgrade() {
                    effect.on_accepted();
                }
            } else if let Some((position, on_tap)) = commit {
                // Too short for the speculative path (or configured
                // non-rejectable): immediate commit with a decorative effect.
                ctx.spawn_effect(position, false, move || on_tap(position));
            }
            ctx.notify_resolved(RecognizerKind::Tap, GestureOutcome::Accepted);
        } else {
            if let Some(effect) = effect.upgrade() {
                effect.on_rejected();
            }
            ctx.notify_resolved(RecognizerKind::Tap, GestureOutcome::Rejected);
        }
    }

    fn on_cancel(this: &Rc<RefCell<TapInner>>, event: &PointerEvent) {
        {
            let inner = this.borrow();
            if inner.state != TapState::Tracking || inner.contact != Some(event.id) {
                return;
            }
        }
        Self::reject_and_resolve(this, GestureOutcome::Cancelled);
    }

    fn reject_and_resolve(this: &Rc<RefCell<TapInner>>, outcome: GestureOutcome) {
        let (ctx, effect, was_tracking) = {
            let mut inner = this.borrow_mut();
            if inner.state == TapState::Resolved {
                return;
            }
            let was_tracking = inner.state == TapState::Tracking;
            inner.state = TapState::Resolved;
            inner.preview_timer = None;
            inner.timeout_timer = None;
            (inner.ctx.clone(), inner.effect.clone(), was_tracking)
        };
        if let Some(effect) = effect.upgrade() {
            effect.on_rejected();
        }
        if was_tracking {
            ctx.notify_resolved(RecognizerKind::Tap, outcome);
        }
    }
}

// ============================================================================
// Continuable (double-tap / long-press)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContinuableMode {
    DoubleTap,
    LongPress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContinuableState {
    Idle,
    /// First contact down.
    FirstPress,
    /// First tap released; the double-tap window is open.
    AwaitingSecond,
    /// Second contact down within the window.
    SecondPress,
    /// Long-press fired; contact still down.
    Held,
    Resolved,
}

struct ContinuableInner {
    ctx: Rc<RecognizerContext>,
    mode: ContinuableMode,
    callback: ContinuableCallback,
    state: ContinuableState,
    contact: Option<PointerId>,
    /// Where the first press landed; the effect anchors here.
    anchor: Point,
    down_position: Point,
    preview_taken: bool,
    effect: WeakSpreadingEffect,
    preview_timer: Option<TimerRegistration>,
    timeout_timer: Option<TimerRegistration>,
    window_timer: Option<TimerRegistration>,
    long_press_timer: Option<TimerRegistration>,
}

impl ContinuableInner {
    fn clear_timers(&mut self) {
        self.preview_timer = None;
        self.timeout_timer = None;
        self.window_timer = None;
        self.long_press_timer = None;
    }
}

/// Double-tap / long-press recognizer.
///
/// Shares the tap per-contact protocol but re-arms across down/up cycles:
/// in [`ContinuableMode::DoubleTap`] a second press within the window and a
/// qualifying release recognize the gesture; in
/// [`ContinuableMode::LongPress`] holding past the threshold does. The user
/// callback receives a [`GestureContinuation`] so the caller can chain into
/// a further held gesture; a held recognizer stays tracking until the
/// continuation ends or the contact is cancelled.
pub(crate) struct ContinuableRecognizer {
    inner: Rc<RefCell<ContinuableInner>>,
}

impl ContinuableRecognizer {
    pub(crate) fn new(
        ctx: Rc<RecognizerContext>,
        mode: ContinuableMode,
        callback: ContinuableCallback,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ContinuableInner {
                ctx,
                mode,
                callback,
                state: ContinuableState::Idle,
                contact: None,
                anchor: Point::ZERO,
                down_position: Point::ZERO,
                preview_taken: false,
                effect: WeakSpreadingEffect::default(),
                preview_timer: None,
                timeout_timer: None,
                window_timer: None,
                long_press_timer: None,
            })),
        }
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.inner.borrow().state == ContinuableState::Resolved
    }

    pub(crate) fn handle_event(&self, event: &PointerEvent) {
        match event.kind {
            PointerEventKind::Down => Self::on_down(&self.inner, event),
            PointerEventKind::Move => Self::on_move(&self.inner, event),
            PointerEventKind::Up => Self::on_up(&self.inner, event),
            PointerEventKind::Cancel => Self::on_cancel(&self.inner, event),
        }
    }

    pub(crate) fn cancel_tracking(&self) {
        let held = self.inner.borrow().state == ContinuableState::Held;
        if held {
            // Already fired and accepted; just finish the lifecycle.
            Self::resolve(&self.inner, GestureOutcome::Cancelled);
        } else {
            Self::reject_and_resolve(&self.inner, GestureOutcome::Cancelled);
        }
    }

    fn on_down(this: &Rc<RefCell<ContinuableInner>>, event: &PointerEvent) {
        let (scheduler, settings, mode, second_press, want_preview) = {
            let mut inner = this.borrow_mut();
            match inner.state {
                ContinuableState::Idle => {
                    inner.state = ContinuableState::FirstPress;
                    inner.contact = Some(event.id);
                    inner.anchor = event.position;
                    inner.down_position = event.position;
                }
                ContinuableState::AwaitingSecond => {
                    inner.state = ContinuableState::SecondPress;
                    inner.contact = Some(event.id);
                    inner.down_position = event.position;
                    inner.window_timer = None;
                }
                _ => return,
            }
            (
                inner.ctx.scheduler.clone(),
                inner.ctx.settings,
                inner.mode,
                inner.state == ContinuableState::SecondPress,
                !inner.preview_taken,
            )
        };

        if want_preview {
            let weak = Rc::downgrade(this);
            let registration = scheduler.after(settings.preview_min_duration, move |_| {
                if let Some(strong) = weak.upgrade() {
                    ContinuableRecognizer::on_preview_deadline(&strong);
                }
            });
            this.borrow_mut().preview_timer = Some(registration);
        }

        match mode {
            ContinuableMode::DoubleTap => {
                // Bound each press; an over-long hold is not a tap cycle.
                let weak = Rc::downgrade(this);
                let registration = scheduler.after(settings.acceptable_duration, move |_| {
                    if let Some(strong) = weak.upgrade() {
                        ContinuableRecognizer::reject_and_resolve(
                            &strong,
                            GestureOutcome::TimedOut,
                        );
                    }
                });
                this.borrow_mut().timeout_timer = Some(registration);
            }
            ContinuableMode::LongPress => {
                debug_assert!(!second_press, "long-press never re-arms a second press");
                let weak = Rc::downgrade(this);
                let registration = scheduler.after(settings.long_press_threshold, move |_| {
                    if let Some(strong) = weak.upgrade() {
                        ContinuableRecognizer::on_long_press_deadline(&strong);
                    }
                });
                this.borrow_mut().long_press_timer = Some(registration);
            }
        }
    }

    fn on_preview_deadline(this: &Rc<RefCell<ContinuableInner>>) {
        let (ctx, anchor) = {
            let inner = this.borrow();
            if !matches!(
                inner.state,
                ContinuableState::FirstPress | ContinuableState::SecondPress
            ) {
                return;
            }
            (inner.ctx.clone(), inner.anchor)
        };
        debug!("continuable preview at ({}, {})", anchor.x, anchor.y);
        let effect = ctx.spawn_effect(anchor, true, Self::gesture_firer(this, anchor));
        let mut inner = this.borrow_mut();
        inner.preview_taken = true;
        inner.effect = effect.downgrade();
        inner.preview_timer = None;
    }

    /// The zero-argument action bound into the effect: invokes the user
    /// callback with the anchor offset and a continuation handle.
    fn gesture_firer(this: &Rc<RefCell<ContinuableInner>>, anchor: Point) -> impl Fn() + 'static {
        let weak = Rc::downgrade(this);
        move || {
            let callback = match weak.upgrade() {
                Some(strong) => strong.borrow().callback.clone(),
                None => return,
            };
            callback(anchor, GestureContinuation { inner: weak.clone() });
        }
    }

    fn on_long_press_deadline(this: &Rc<RefCell<ContinuableInner>>) {
        let (ctx, anchor, effect, preview_taken) = {
            let mut inner = this.borrow_mut();
            if inner.state != ContinuableState::FirstPress {
                return;
            }
            inner.state = ContinuableState::Held;
            inner.long_press_timer = None;
            inner.preview_timer = None;
            (
                inner.ctx.clone(),
                inner.anchor,
                inner.effect.clone(),
                inner.preview_taken,
            )
        };
        debug!("long-press at ({}, {})", anchor.x, anchor.y);
        if preview_taken {
            if let Some(effect) = effect.upgrade() {
                effect.on_accepted();
            }
        } else {
            // Threshold shorter than the preview delay: the effect starts
            // and is accepted in one step.
            let effect = ctx.spawn_effect(anchor, true, Self::gesture_firer(this, anchor));
            this.borrow_mut().effect = effect.downgrade();
            this.borrow_mut().preview_taken = true;
            effect.on_accepted();
        }
    }

    fn on_move(this: &Rc<RefCell<ContinuableInner>>, event: &PointerEvent) {
        let beyond_slop = {
            let inner = this.borrow();
            if !matches!(
                inner.state,
                ContinuableState::FirstPress | ContinuableState::SecondPress
            ) || inner.contact != Some(event.id)
            {
                return;
            }
            event.position.distance_to(inner.down_position) > inner.ctx.settings.touch_slop
        };
        if beyond_slop {
            Self::reject_and_resolve(this, GestureOutcome::Rejected);
        }
    }

    fn on_up(this: &Rc<RefCell<ContinuableInner>>, event: &PointerEvent) {
        enum UpAction {
            None,
            ArmWindow,
            Recognized,
            Reject,
        }
        let (action, scheduler, settings) = {
            let mut inner = this.borrow_mut();
            if inner.contact != Some(event.id) {
                return;
            }
            let within_slop =
                event.position.distance_to(inner.down_position) <= inner.ctx.settings.touch_slop;
            let action = match (inner.state, inner.mode) {
                (ContinuableState::FirstPress, ContinuableMode::DoubleTap) if within_slop => {
                    inner.state = ContinuableState::AwaitingSecond;
                    inner.contact = None;
                    inner.timeout_timer = None;
                    inner.preview_timer = None;
                    UpAction::ArmWindow
                }
                (ContinuableState::SecondPress, ContinuableMode::DoubleTap) if within_slop => {
                    UpAction::Recognized
                }
                (ContinuableState::FirstPress | ContinuableState::SecondPress, _) => {
                    UpAction::Reject
                }
                (ContinuableState::Held, _) => {
                    // Release does not end a held gesture; the continuation
                    // (or a cancel) does.
                    inner.contact = None;
                    UpAction::None
                }
                _ => UpAction::None,
            };
            (
                action,
                inner.ctx.scheduler.clone(),
                inner.ctx.settings,
            )
        };
        match action {
            UpAction::None => {}
            UpAction::ArmWindow => {
                let weak = Rc::downgrade(this);
                let registration = scheduler.after(settings.double_tap_window, move |_| {
                    if let Some(strong) = weak.upgrade() {
                        ContinuableRecognizer::reject_and_resolve(
                            &strong,
                            GestureOutcome::TimedOut,
                        );
                    }
                });
                this.borrow_mut().window_timer = Some(registration);
            }
            UpAction::Recognized => Self::recognize(this),
            UpAction::Reject => Self::reject_and_resolve(this, GestureOutcome::Rejected),
        }
    }

    /// Second qualifying release within the window: the double-tap fires
    /// once, through the effect, never as two single-tap firings.
    fn recognize(this: &Rc<RefCell<ContinuableInner>>) {
        let (ctx, anchor, effect, preview_taken) = {
            let mut inner = this.borrow_mut();
            inner.state = ContinuableState::Resolved;
            inner.clear_timers();
            (
                inner.ctx.clone(),
                inner.anchor,
                inner.effect.clone(),
                inner.preview_taken,
            )
        };
        if preview_taken {
            if let Some(effect) = effect.upgrade() {
                effect.on_accepted();
            }
        } else {
            ctx.spawn_effect(anchor, false, Self::gesture_firer(this, anchor));
        }
        ctx.notify_resolved(RecognizerKind::Continuable, GestureOutcome::Accepted);
    }

    fn on_cancel(this: &Rc<RefCell<ContinuableInner>>, event: &PointerEvent) {
        let held = {
            let inner = this.borrow();
            if inner.contact != Some(event.id) {
                return;
            }
            match inner.state {
                ContinuableState::FirstPress | ContinuableState::SecondPress => false,
                ContinuableState::Held => true,
                _ => return,
            }
        };
        if held {
            Self::resolve(this, GestureOutcome::Cancelled);
        } else {
            Self::reject_and_resolve(this, GestureOutcome::Cancelled);
        }
    }

    fn on_continuation_end(this: &Rc<RefCell<ContinuableInner>>) {
        let held = this.borrow().state == ContinuableState::Held;
        if held {
            Self::resolve(this, GestureOutcome::Accepted);
        }
    }

    /// Resolve without touching the effect (it already settled).
    fn resolve(this: &Rc<RefCell<ContinuableInner>>, outcome: GestureOutcome) {
        let ctx = {
            let mut inner = this.borrow_mut();
            if inner.state == ContinuableState::Resolved {
                return;
            }
            inner.state = ContinuableState::Resolved;
            inner.clear_timers();
            inner.ctx.clone()
        };
        ctx.notify_resolved(RecognizerKind::Continuable, outcome);
    }

    fn reject_and_resolve(this: &Rc<RefCell<ContinuableInner>>, outcome: GestureOutcome) {
        let (ctx, effect, was_active) = {
            let mut inner = this.borrow_mut();
            if inner.state == ContinuableState::Resolved {
                return;
            }
            let was_active = inner.state != ContinuableState::Idle;
            inner.state = ContinuableState::Resolved;
            inner.clear_timers();
            (inner.ctx.clone(), inner.effect.clone(), was_active)
        };
        if let Some(effect) = effect.upgrade() {
            effect.on_rejected();
        }
        if was_active {
            ctx.notify_resolved(RecognizerKind::Continuable, outcome);
        }
    }
}

/// Handle passed to continuable gesture callbacks.
///
/// A held gesture keeps its recognizer tracking until the caller ends the
/// continuation (or the contact is cancelled); the handle holds only a weak
/// reference, so ending after the recognizer is gone is a no-op.
#[derive(Clone)]
pub struct GestureContinuation {
    inner: Weak<RefCell<ContinuableInner>>,
}

impl GestureContinuation {
    pub fn end(&self) {
        if let Some(strong) = self.inner.upgrade() {
            ContinuableRecognizer::on_continuation_end(&strong);
        }
    }
}

impl std::fmt::Debug for GestureContinuation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureContinuation").finish_non_exhaustive()
    }
}

// ============================================================================
// Holding sentinel
// ============================================================================

/// Permanent sentinel recognizer.
///
/// Performs no recognition and no visual effect. Its presence keeps the
/// active set non-empty once a lifecycle has started, so the dispatch loop
/// can tell "fully resolved" apart from "never started".
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct HoldingRecognizer;

impl HoldingRecognizer {
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) fn handle_event(&self, _event: &PointerEvent) {}
}
