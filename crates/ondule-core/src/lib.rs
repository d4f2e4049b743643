//! Core runtime services for Ondule: a single-threaded scheduler driving
//! frame callbacks and deadline timers, plus the geometry primitives the
//! input path needs.
//!
//! Everything here is cooperative and host-driven: the embedding application
//! calls [`Scheduler::advance_to`] (or [`Scheduler::advance_now`]) whenever it
//! has a frame timestamp, and the scheduler runs whatever became due. Nothing
//! blocks and nothing spawns threads.

mod geometry;
mod scheduler;

pub use geometry::Point;
pub use scheduler::{
    FrameCallbackId, FrameRegistration, Scheduler, TimerId, TimerRegistration,
};
