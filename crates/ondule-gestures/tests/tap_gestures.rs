//! End-to-end tap lifecycles driven by a deterministic scheduler.

use std::cell::RefCell;
use std::rc::Rc;

use ondule_animation::{EffectController, EffectPhase, SpreadingEffect};
use ondule_core::{Point, Scheduler};
use ondule_gestures::{GestureCallbacks, GestureCoordinator, GestureSettings, PointerEvent};

const MS: u64 = 1_000_000;
const FRAME: u64 = 16_666_667;

/// Keeps attached effects alive the way a rendering host would.
#[derive(Default)]
struct RecordingController {
    effects: RefCell<Vec<SpreadingEffect>>,
}

impl RecordingController {
    fn effect(&self, index: usize) -> SpreadingEffect {
        self.effects.borrow()[index].clone()
    }

    fn count(&self) -> usize {
        self.effects.borrow().len()
    }
}

impl EffectController for RecordingController {
    fn attach(&self, effect: SpreadingEffect) {
        self.effects.borrow_mut().push(effect);
    }
}

struct Harness {
    scheduler: Scheduler,
    controller: Rc<RecordingController>,
    coordinator: GestureCoordinator,
    taps: Rc<RefCell<Vec<Point>>>,
}

fn tap_harness() -> Harness {
    let scheduler = Scheduler::new();
    let controller = Rc::new(RecordingController::default());
    let mut coordinator = GestureCoordinator::new(scheduler.clone(), controller.clone());
    let taps = Rc::new(RefCell::new(Vec::new()));
    let sink = taps.clone();
    coordinator.set_callbacks(GestureCallbacks::new().with_on_tap(move |offset| {
        sink.borrow_mut().push(offset);
    }));
    Harness {
        scheduler,
        controller,
        coordinator,
        taps,
    }
}

/// Step the clock in frame increments so effect tracks keep sampling.
fn pump_frames(scheduler: &Scheduler, from_nanos: u64, until_nanos: u64) {
    let mut now = from_nanos;
    while now < until_nanos {
        now += FRAME;
        scheduler.advance_to(now.min(until_nanos));
    }
}

fn pump_until_idle(scheduler: &Scheduler) {
    let mut now = scheduler.now_nanos();
    while scheduler.has_pending() {
        now += FRAME;
        scheduler.advance_to(now);
    }
}

#[test]
fn held_tap_runs_the_full_speculative_path() {
    let mut h = tap_harness();
    let origin = Point::new(20.0, 30.0);

    h.coordinator.handle_pointer_event(&PointerEvent::down(origin));
    assert_eq!(h.controller.count(), 0);

    // Preview delay elapses with the contact still down: the rejectable
    // effect starts spreading.
    h.scheduler.advance_to(150 * MS);
    assert_eq!(h.controller.count(), 1);
    let effect = h.controller.effect(0);
    assert!(effect.is_rejectable());
    assert_eq!(effect.phase(), EffectPhase::Spreading);
    assert_eq!(effect.base_offset(), origin);
    assert!(h.taps.borrow().is_empty());

    // Held well past the spread duration, released within slop and within
    // the acceptable window: the tap is accepted and the callback fires.
    pump_frames(&h.scheduler, 150 * MS, 600 * MS);
    h.coordinator.handle_pointer_event(&PointerEvent::up(origin));
    assert_eq!(h.taps.borrow().as_slice(), &[origin]);

    // The accepted effect fades out and disposes on its own.
    pump_until_idle(&h.scheduler);
    assert_eq!(effect.phase(), EffectPhase::Disposed);
    assert_eq!(h.coordinator.active_recognizer_count(), 1);
}

#[test]
fn quick_release_commits_without_a_speculative_effect() {
    let mut h = tap_harness();
    let origin = Point::new(4.0, 4.0);

    h.coordinator.handle_pointer_event(&PointerEvent::down(origin));
    h.scheduler.advance_to(40 * MS);
    h.coordinator.handle_pointer_event(&PointerEvent::up(origin));

    // Fired immediately, with a decorative non-rejectable effect.
    assert_eq!(h.taps.borrow().as_slice(), &[origin]);
    assert_eq!(h.controller.count(), 1);
    assert!(!h.controller.effect(0).is_rejectable());
}

#[test]
fn drag_beyond_slop_rejects() {
    let mut h = tap_harness();
    let origin = Point::new(10.0, 10.0);

    h.coordinator.handle_pointer_event(&PointerEvent::down(origin));
    h.scheduler.advance_to(200 * MS);
    let effect = h.controller.effect(0);

    // Default slop is 8 logical px; 20 px away is a drag, not a tap.
    h.coordinator
        .handle_pointer_event(&PointerEvent::moved(Point::new(30.0, 10.0)));
    pump_until_idle(&h.scheduler);

    assert!(h.taps.borrow().is_empty());
    assert_eq!(effect.phase(), EffectPhase::Disposed);
    assert_eq!(h.coordinator.active_recognizer_count(), 1);

    // The release of the already-rejected contact changes nothing.
    h.coordinator.handle_pointer_event(&PointerEvent::up(origin));
    assert!(h.taps.borrow().is_empty());
}

#[test]
fn small_movement_within_slop_still_accepts() {
    let mut h = tap_harness();
    let origin = Point::new(10.0, 10.0);

    h.coordinator.handle_pointer_event(&PointerEvent::down(origin));
    h.scheduler.advance_to(200 * MS);
    h.coordinator
        .handle_pointer_event(&PointerEvent::moved(Point::new(13.0, 10.0)));
    pump_frames(&h.scheduler, 200 * MS, 400 * MS);
    h.coordinator
        .handle_pointer_event(&PointerEvent::up(Point::new(13.0, 10.0)));

    assert_eq!(h.taps.borrow().len(), 1);
}

#[test]
fn overlong_hold_times_out() {
    let mut h = tap_harness();
    let origin = Point::new(10.0, 10.0);

    h.coordinator.handle_pointer_event(&PointerEvent::down(origin));
    // Acceptable duration (800ms) passes with the contact still down.
    pump_frames(&h.scheduler, 0, 900 * MS);

    let effect = h.controller.effect(0);
    assert!(effect.phase().is_terminal());
    h.coordinator.handle_pointer_event(&PointerEvent::up(origin));
    assert!(h.taps.borrow().is_empty());
    assert_eq!(h.coordinator.active_recognizer_count(), 1);
}

#[test]
fn pointer_cancel_rejects_the_tap() {
    let mut h = tap_harness();
    let origin = Point::new(10.0, 10.0);

    h.coordinator.handle_pointer_event(&PointerEvent::down(origin));
    h.scheduler.advance_to(200 * MS);
    h.coordinator.handle_pointer_event(&PointerEvent::cancel(origin));
    pump_until_idle(&h.scheduler);

    assert!(h.taps.borrow().is_empty());
    assert_eq!(h.controller.effect(0).phase(), EffectPhase::Disposed);
    assert_eq!(h.coordinator.active_recognizer_count(), 1);
}

#[test]
fn non_rejectable_configuration_skips_the_preview() {
    let scheduler = Scheduler::new();
    let controller = Rc::new(RecordingController::default());
    let mut coordinator = GestureCoordinator::new(scheduler.clone(), controller.clone());
    let taps = Rc::new(RefCell::new(0_u32));
    let counter = taps.clone();
    coordinator.set_settings(GestureSettings::default().with_tap_rejectable(false));
    coordinator.set_callbacks(GestureCallbacks::new().with_on_tap(move |_| {
        *counter.borrow_mut() += 1;
    }));

    let origin = Point::new(2.0, 2.0);
    coordinator.handle_pointer_event(&PointerEvent::down(origin));
    // Long past the preview delay: no speculative effect appears.
    scheduler.advance_to(400 * MS);
    assert_eq!(controller.count(), 0);

    coordinator.handle_pointer_event(&PointerEvent::up(origin));
    assert_eq!(*taps.borrow(), 1);
    assert_eq!(controller.count(), 1);
    assert!(!controller.effect(0).is_rejectable());
}
