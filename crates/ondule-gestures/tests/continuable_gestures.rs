//! Double-tap and long-press lifecycles driven by a deterministic scheduler.

use std::cell::RefCell;
use std::rc::Rc;

use ondule_animation::{EffectController, EffectPhase, SpreadingEffect};
use ondule_core::{Point, Scheduler};
use ondule_gestures::{
    GestureCallbacks, GestureContinuation, GestureCoordinator, PointerEvent,
};

const MS: u64 = 1_000_000;
const FRAME: u64 = 16_666_667;

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

fn pump_frames(scheduler: &Scheduler, from_nanos: u64, until_nanos: u64) {
    let mut now = from_nanos;
    while now < until_nanos {
        now += FRAME;
        scheduler.advance_to(now.min(until_nanos));
    }
}

struct Fired {
    offsets: RefCell<Vec<Point>>,
    continuation: RefCell<Option<GestureContinuation>>,
}

impl Fired {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            offsets: RefCell::new(Vec::new()),
            continuation: RefCell::new(None),
        })
    }

    fn record(self: &Rc<Self>) -> impl Fn(Point, GestureContinuation) + 'static {
        let this = self.clone();
        move |offset, continuation| {
            this.offsets.borrow_mut().push(offset);
            *this.continuation.borrow_mut() = Some(continuation);
        }
    }

    fn count(&self) -> usize {
        self.offsets.borrow().len()
    }
}

#[test]
fn double_tap_fires_once() {
    let scheduler = Scheduler::new();
    let controller = Rc::new(RecordingController::default());
    let mut coordinator = GestureCoordinator::new(scheduler.clone(), controller.clone());
    let fired = Fired::new();
    coordinator.set_callbacks(GestureCallbacks::new().with_on_double_tap(fired.record()));

    let origin = Point::new(8.0, 8.0);
    coordinator.handle_pointer_event(&PointerEvent::down(origin));
    scheduler.advance_to(40 * MS);
    coordinator.handle_pointer_event(&PointerEvent::up(origin));
    // First tap alone never fires a double-tap.
    assert_eq!(fired.count(), 0);

    // Second tap inside the 300ms window recognizes the gesture, exactly
    // once, through a single effect.
    scheduler.advance_to(140 * MS);
    coordinator.handle_pointer_event(&PointerEvent::down(origin));
    scheduler.advance_to(180 * MS);
    coordinator.handle_pointer_event(&PointerEvent::up(origin));
    assert_eq!(fired.count(), 1);
    assert_eq!(fired.offsets.borrow()[0], origin);
    assert_eq!(controller.count(), 1);
    assert_eq!(coordinator.active_recognizer_count(), 1);
}

#[test]
fn double_tap_window_expiry_rejects() {
    let scheduler = Scheduler::new();
    let controller = Rc::new(RecordingController::default());
    let mut coordinator = GestureCoordinator::new(scheduler.clone(), controller.clone());
    let fired = Fired::new();
    coordinator.set_callbacks(GestureCallbacks::new().with_on_double_tap(fired.record()));

    let origin = Point::new(8.0, 8.0);
    coordinator.handle_pointer_event(&PointerEvent::down(origin));
    coordinator.handle_pointer_event(&PointerEvent::up(origin));
    // Window expires before the second press.
    scheduler.advance_to(400 * MS);
    coordinator.handle_pointer_event(&PointerEvent::down(origin));
    coordinator.handle_pointer_event(&PointerEvent::up(origin));
    assert_eq!(fired.count(), 0);

    // The late press opened a new lifecycle and a new first-tap window.
    scheduler.advance_to(500 * MS);
    coordinator.handle_pointer_event(&PointerEvent::down(origin));
    scheduler.advance_to(540 * MS);
    coordinator.handle_pointer_event(&PointerEvent::up(origin));
    assert_eq!(fired.count(), 1);
}

#[test]
fn long_press_fires_while_held_and_resolves_on_continuation_end() {
    let scheduler = Scheduler::new();
    let controller = Rc::new(RecordingController::default());
    let mut coordinator = GestureCoordinator::new(scheduler.clone(), controller.clone());
    let fired = Fired::new();
    coordinator.set_callbacks(GestureCallbacks::new().with_on_long_tap(fired.record()));

    let origin = Point::new(12.0, 16.0);
    coordinator.handle_pointer_event(&PointerEvent::down(origin));

    // The preview effect appears at 150ms, the long-press at 500ms.
    pump_frames(&scheduler, 0, 450 * MS);
    assert_eq!(controller.count(), 1);
    assert_eq!(fired.count(), 0);
    pump_frames(&scheduler, 450 * MS, 520 * MS);
    assert_eq!(fired.count(), 1);
    assert_eq!(fired.offsets.borrow()[0], origin);

    // Release does not end the held gesture; the recognizer keeps tracking
    // until the caller ends the continuation.
    coordinator.handle_pointer_event(&PointerEvent::up(origin));
    assert_eq!(coordinator.active_recognizer_count(), 2);

    fired.continuation.borrow().as_ref().unwrap().end();
    coordinator.handle_pointer_event(&PointerEvent::down(Point::new(50.0, 50.0)));
    // The old recognizer was swept and a fresh lifecycle began.
    assert_eq!(coordinator.active_recognizer_count(), 2);
}

#[test]
fn long_press_released_early_rejects() {
    let scheduler = Scheduler::new();
    let controller = Rc::new(RecordingController::default());
    let mut coordinator = GestureCoordinator::new(scheduler.clone(), controller.clone());
    let fired = Fired::new();
    coordinator.set_callbacks(GestureCallbacks::new().with_on_long_tap(fired.record()));

    let origin = Point::new(12.0, 16.0);
    coordinator.handle_pointer_event(&PointerEvent::down(origin));
    pump_frames(&scheduler, 0, 300 * MS);
    let effect = controller.effect(0);
    assert_eq!(effect.phase(), EffectPhase::Spreading);

    // Released before the 500ms threshold.
    coordinator.handle_pointer_event(&PointerEvent::up(origin));
    assert_eq!(fired.count(), 0);
    assert!(effect.phase().is_terminal());
    assert_eq!(coordinator.active_recognizer_count(), 1);
}

#[test]
fn cancel_during_hold_resolves_without_unfiring() {
    let scheduler = Scheduler::new();
    let controller = Rc::new(RecordingController::default());
    let mut coordinator = GestureCoordinator::new(scheduler.clone(), controller.clone());
    let fired = Fired::new();
    coordinator.set_callbacks(GestureCallbacks::new().with_on_long_tap(fired.record()));

    let origin = Point::new(12.0, 16.0);
    coordinator.handle_pointer_event(&PointerEvent::down(origin));
    pump_frames(&scheduler, 0, 520 * MS);
    assert_eq!(fired.count(), 1);

    coordinator.handle_pointer_event(&PointerEvent::cancel(origin));
    // The gesture already fired; the cancel just finishes the lifecycle.
    assert_eq!(fired.count(), 1);
    assert_eq!(coordinator.active_recognizer_count(), 1);
}

#[test]
fn drag_beyond_slop_rejects_the_first_press() {
    let scheduler = Scheduler::new();
    let controller = Rc::new(RecordingController::default());
    let mut coordinator = GestureCoordinator::new(scheduler.clone(), controller.clone());
    let fired = Fired::new();
    coordinator.set_callbacks(GestureCallbacks::new().with_on_long_tap(fired.record()));

    coordinator.handle_pointer_event(&PointerEvent::down(Point::new(10.0, 10.0)));
    pump_frames(&scheduler, 0, 200 * MS);
    coordinator.handle_pointer_event(&PointerEvent::moved(Point::new(40.0, 10.0)));
    pump_frames(&scheduler, 200 * MS, 600 * MS);

    // Neither the threshold timer nor anything else fires after rejection.
    assert_eq!(fired.count(), 0);
    assert!(controller.effect(0).phase().is_terminal());
}
