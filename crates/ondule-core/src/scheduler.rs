//! Host-driven scheduler: one-shot frame callbacks and deadline timers.
//!
//! The host owns time. It feeds nanosecond timestamps into
//! [`Scheduler::advance_to`] (typically once per rendered frame) and the
//! scheduler runs every timer whose deadline has passed, then drains the
//! frame-callback queue. Callbacks registered while draining run on the
//! next advancement, never re-entrantly.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use log::trace;
use rustc_hash::FxHashMap;
use web_time::Instant;

pub type FrameCallbackId = u64;
pub type TimerId = u64;

struct FrameCallbackEntry {
    id: FrameCallbackId,
    callback: Option<Box<dyn FnOnce(u64)>>,
}

struct TimerEntry {
    deadline_nanos: u64,
    callback: Option<Box<dyn FnOnce(u64)>>,
}

struct SchedulerInner {
    now_nanos: u64,
    epoch: Instant,
    next_frame_callback_id: FrameCallbackId,
    next_timer_id: TimerId,
    frame_callbacks: VecDeque<FrameCallbackEntry>,
    timers: FxHashMap<TimerId, TimerEntry>,
}

impl SchedulerInner {
    fn new() -> Self {
        Self {
            now_nanos: 0,
            epoch: Instant::now(),
            next_frame_callback_id: 0,
            next_timer_id: 0,
            frame_callbacks: VecDeque::new(),
            timers: FxHashMap::default(),
        }
    }
}

/// Single-threaded cooperative scheduler.
///
/// Cloning produces another handle to the same scheduler.
#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner::new())),
        }
    }

    /// The timestamp of the most recent advancement.
    pub fn now_nanos(&self) -> u64 {
        self.inner.borrow().now_nanos
    }

    /// Register a one-shot callback for the next frame advancement.
    ///
    /// Dropping the returned registration cancels the callback.
    pub fn with_frame_nanos(
        &self,
        callback: impl FnOnce(u64) + 'static,
    ) -> FrameRegistration {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_frame_callback_id;
        inner.next_frame_callback_id += 1;
        inner.frame_callbacks.push_back(FrameCallbackEntry {
            id,
            callback: Some(Box::new(callback)),
        });
        FrameRegistration {
            scheduler: self.clone(),
            id: Some(id),
        }
    }

    /// Schedule a one-shot timer that fires once `delay` has elapsed.
    ///
    /// A zero delay fires on the next advancement, not synchronously.
    /// Dropping the returned registration cancels the timer.
    pub fn after(&self, delay: Duration, callback: impl FnOnce(u64) + 'static) -> TimerRegistration {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_timer_id;
        inner.next_timer_id += 1;
        let deadline_nanos = inner.now_nanos.saturating_add(delay.as_nanos() as u64);
        inner.timers.insert(
            id,
            TimerEntry {
                deadline_nanos,
                callback: Some(Box::new(callback)),
            },
        );
        TimerRegistration {
            scheduler: self.clone(),
            id: Some(id),
        }
    }

    /// Whether any frame callbacks or timers are outstanding.
    pub fn has_pending(&self) -> bool {
        let inner = self.inner.borrow();
        !inner.frame_callbacks.is_empty() || !inner.timers.is_empty()
    }

    /// Advance by `delta` from the current timestamp.
    pub fn advance_by(&self, delta: Duration) {
        let now = self.now_nanos().saturating_add(delta.as_nanos() as u64);
        self.advance_to(now);
    }

    /// Advance using wall-clock time elapsed since the scheduler was created.
    ///
    /// Convenience for hosts without a frame timestamp source.
    pub fn advance_now(&self) {
        let elapsed = {
            let inner = self.inner.borrow();
            inner.epoch.elapsed().as_nanos() as u64
        };
        self.advance_to(elapsed);
    }

    /// Advance the clock to `frame_time_nanos`, firing due timers in deadline
    /// order and then draining the frame-callback queue.
    ///
    /// Time is monotonic: a timestamp earlier than the current one is clamped
    /// to it, still draining whatever is already due.
    pub fn advance_to(&self, frame_time_nanos: u64) {
        let now = {
            let mut inner = self.inner.borrow_mut();
            inner.now_nanos = inner.now_nanos.max(frame_time_nanos);
            inner.now_nanos
        };

        // Timers fired by this advancement may arm new timers that are
        // already due (e.g. zero-delay re-arming); keep sweeping until the
        // due set is empty.
        loop {
            let mut due: Vec<(u64, TimerId, Box<dyn FnOnce(u64)>)> = {
                let mut inner = self.inner.borrow_mut();
                let due_ids: Vec<TimerId> = inner
                    .timers
                    .iter()
                    .filter(|(_, entry)| entry.deadline_nanos <= now)
                    .map(|(&id, _)| id)
                    .collect();
                due_ids
                    .into_iter()
                    .filter_map(|id| {
                        inner.timers.remove(&id).and_then(|mut entry| {
                            entry
                                .callback
                                .take()
                                .map(|cb| (entry.deadline_nanos, id, cb))
                        })
                    })
                    .collect()
            };
            if due.is_empty() {
                break;
            }
            due.sort_by_key(|(deadline, id, _)| (*deadline, *id));
            trace!("scheduler: firing {} timer(s) at {}ns", due.len(), now);
            for (_, _, callback) in due {
                callback(now);
            }
        }

        let pending: Vec<Box<dyn FnOnce(u64)>> = {
            let mut inner = self.inner.borrow_mut();
            let mut pending = Vec::with_capacity(inner.frame_callbacks.len());
            while let Some(mut entry) = inner.frame_callbacks.pop_front() {
                if let Some(callback) = entry.callback.take() {
                    pending.push(callback);
                }
            }
            pending
        };
        for callback in pending {
            callback(now);
        }
    }

    fn cancel_frame_callback(&self, id: FrameCallbackId) {
        let mut inner = self.inner.borrow_mut();
        if let Some(index) = inner.frame_callbacks.iter().position(|entry| entry.id == id) {
            inner.frame_callbacks.remove(index);
        }
    }

    fn cancel_timer(&self, id: TimerId) {
        self.inner.borrow_mut().timers.remove(&id);
    }
}

/// RAII handle for a registered frame callback.
pub struct FrameRegistration {
    scheduler: Scheduler,
    id: Option<FrameCallbackId>,
}

impl FrameRegistration {
    pub fn cancel(mut self) {
        if let Some(id) = self.id.take() {
            self.scheduler.cancel_frame_callback(id);
        }
    }
}

impl Drop for FrameRegistration {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.scheduler.cancel_frame_callback(id);
        }
    }
}

/// RAII handle for a scheduled timer.
pub struct TimerRegistration {
    scheduler: Scheduler,
    id: Option<TimerId>,
}

impl TimerRegistration {
    pub fn cancel(mut self) {
        if let Some(id) = self.id.take() {
            self.scheduler.cancel_timer(id);
        }
    }
}

impl Drop for TimerRegistration {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.scheduler.cancel_timer(id);
        }
    }
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
