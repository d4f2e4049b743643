//! Pointer-event dispatch.

use std::rc::Rc;

use log::{debug, trace};
use ondule_animation::{EffectBehavior, EffectController};
use ondule_core::Scheduler;
use smallvec::SmallVec;

use crate::builder::BuilderSet;
use crate::callbacks::GestureCallbacks;
use crate::observer::GestureEvents;
use crate::recognizer::{Recognizer, RecognizerContext};
use crate::settings::GestureSettings;
use crate::types::{PointerEvent, PointerEventKind};

/// Entry point of the subsystem: owns the builder set and the active
/// recognizer set, and fans pointer events out to it.
///
/// A new lifecycle begins on pointer-down only when nothing but the
/// permanent Holding sentinel remains active; every event then reaches every
/// active recognizer in insertion order, with no short-circuiting, and
/// resolved recognizers are swept out after dispatch rather than removed
/// mid-iteration.
pub struct GestureCoordinator {
    ctx: Rc<RecognizerContext>,
    callbacks: GestureCallbacks,
    builders: BuilderSet,
    active: SmallVec<[Recognizer; 4]>,
}

impl GestureCoordinator {
    pub fn new(scheduler: Scheduler, controller: Rc<dyn EffectController>) -> Self {
        Self {
            ctx: Rc::new(RecognizerContext {
                scheduler,
                controller,
                behavior: EffectBehavior::default(),
                settings: GestureSettings::default(),
                events: None,
            }),
            callbacks: GestureCallbacks::new(),
            builders: BuilderSet::new(),
            active: SmallVec::new(),
        }
    }

    /// Register the caller's gesture callbacks.
    ///
    /// Re-registering the same `Rc` closures is a no-op; a change of any
    /// callback identity rebuilds the builder set and force-cancels whatever
    /// the previous configuration still had in flight, so a stale callback
    /// can never fire after its replacement is installed.
    pub fn set_callbacks(&mut self, callbacks: GestureCallbacks) {
        self.callbacks = callbacks;
        let rebuilt = self
            .builders
            .update(&self.callbacks, self.ctx.settings.tap_rejectable);
        if rebuilt {
            for recognizer in &self.active {
                recognizer.cancel_tracking();
            }
            self.sweep_resolved();
            if let Some(events) = &self.ctx.events {
                events.builders_rebuilt(self.builders.len());
            }
        }
    }

    /// Replace the effect behavior. Applies from the next lifecycle;
    /// in-flight effects keep the behavior they started with.
    pub fn set_behavior(&mut self, behavior: EffectBehavior) {
        self.ctx = Rc::new(RecognizerContext {
            scheduler: self.ctx.scheduler.clone(),
            controller: self.ctx.controller.clone(),
            behavior,
            settings: self.ctx.settings,
            events: self.ctx.events.clone(),
        });
    }

    /// Replace the gesture settings. Applies from the next lifecycle.
    pub fn set_settings(&mut self, settings: GestureSettings) {
        self.ctx = Rc::new(RecognizerContext {
            scheduler: self.ctx.scheduler.clone(),
            controller: self.ctx.controller.clone(),
            behavior: self.ctx.behavior,
            settings,
            events: self.ctx.events.clone(),
        });
    }

    /// Install an observability sink for lifecycle and resolution events.
    pub fn set_events(&mut self, events: Rc<dyn GestureEvents>) {
        self.ctx = Rc::new(RecognizerContext {
            scheduler: self.ctx.scheduler.clone(),
            controller: self.ctx.controller.clone(),
            behavior: self.ctx.behavior,
            settings: self.ctx.settings,
            events: Some(events),
        });
    }

    /// Feed one pointer event through the active recognizer set.
    pub fn handle_pointer_event(&mut self, event: &PointerEvent) {
        trace!("pointer event: {event:?}");
        self.sweep_resolved();
        if event.kind == PointerEventKind::Down && self.active.len() <= 1 {
            self.begin_lifecycle(event);
        }
        for recognizer in &self.active {
            recognizer.handle_event(event);
        }
        self.sweep_resolved();
    }

    /// Number of recognizers currently active (sentinel included).
    pub fn active_recognizer_count(&self) -> usize {
        self.active.len()
    }

    fn begin_lifecycle(&mut self, event: &PointerEvent) {
        // First lifecycle may arrive before set_callbacks was ever called;
        // with matching identities this is a no-op.
        let rebuilt = self
            .builders
            .update(&self.callbacks, self.ctx.settings.tap_rejectable);
        if rebuilt {
            if let Some(events) = &self.ctx.events {
                events.builders_rebuilt(self.builders.len());
            }
        }
        debug!(
            "lifecycle started at ({}, {}), {} recognizers",
            event.position.x,
            event.position.y,
            self.builders.len()
        );
        self.active = self.builders.build_all(&self.ctx);
        if let Some(events) = &self.ctx.events {
            events.lifecycle_started(event.position);
        }
    }

    fn sweep_resolved(&mut self) {
        self.active.retain(|recognizer| !recognizer.is_resolved());
    }
}

#[cfg(test)]
#[path = "tests/coordinator_tests.rs"]
mod tests;
