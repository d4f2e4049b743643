//! Declarative recognizer construction.
//!
//! Callers describe which gestures they want through [`GestureCallbacks`];
//! the builder set turns that description into fresh recognizer instances at
//! each lifecycle start. The set itself is rebuilt only when the callback
//! identities actually change, so re-registering the same `Rc` closures is
//! free and never disturbs an in-flight lifecycle.

use std::rc::Rc;

use log::debug;
use smallvec::SmallVec;

use crate::callbacks::{ContinuableCallback, GestureCallbacks, TapCallback};
use crate::recognizer::{
    ContinuableMode, ContinuableRecognizer, HoldingRecognizer, Recognizer, RecognizerContext,
    TapRecognizer,
};

pub(crate) enum RecognizerBuilder {
    Tap {
        callback: TapCallback,
        rejectable: bool,
    },
    Continuable {
        mode: ContinuableMode,
        callback: ContinuableCallback,
    },
    Holding,
}

impl RecognizerBuilder {
    pub(crate) fn build(&self, ctx: Rc<RecognizerContext>) -> Recognizer {
        match self {
            RecognizerBuilder::Tap {
                callback,
                rejectable,
            } => Recognizer::Tap(TapRecognizer::new(ctx, callback.clone(), *rejectable)),
            RecognizerBuilder::Continuable { mode, callback } => Recognizer::Continuable(
                ContinuableRecognizer::new(ctx, *mode, callback.clone()),
            ),
            RecognizerBuilder::Holding => Recognizer::Holding(HoldingRecognizer::new()),
        }
    }
}

/// The current recognizer recipe plus the callback snapshot it was derived
/// from.
pub(crate) struct BuilderSet {
    builders: SmallVec<[RecognizerBuilder; 4]>,
    snapshot: Option<GestureCallbacks>,
    snapshot_rejectable: bool,
}

impl BuilderSet {
    pub(crate) fn new() -> Self {
        Self {
            builders: SmallVec::new(),
            snapshot: None,
            snapshot_rejectable: true,
        }
    }

    /// Reconcile against the caller's current callbacks. Returns `true` when
    /// the set was actually rebuilt, `false` when the identities (compared
    /// by `Rc` pointer, never by value) already match.
    pub(crate) fn update(&mut self, callbacks: &GestureCallbacks, tap_rejectable: bool) -> bool {
        if self.snapshot_rejectable == tap_rejectable {
            if let Some(snapshot) = &self.snapshot {
                if snapshot.same_identities(callbacks) {
                    return false;
                }
            }
        }

        self.builders.clear();
        // The sentinel always comes first so a started lifecycle is visible
        // even when every real recognizer has resolved.
        self.builders.push(RecognizerBuilder::Holding);
        if let Some(on_tap) = &callbacks.on_tap {
            self.builders.push(RecognizerBuilder::Tap {
                callback: on_tap.clone(),
                rejectable: tap_rejectable,
            });
        }
        if let Some(on_double_tap) = &callbacks.on_double_tap {
            self.builders.push(RecognizerBuilder::Continuable {
                mode: ContinuableMode::DoubleTap,
                callback: on_double_tap.clone(),
            });
        }
        if let Some(on_long_tap) = &callbacks.on_long_tap {
            self.builders.push(RecognizerBuilder::Continuable {
                mode: ContinuableMode::LongPress,
                callback: on_long_tap.clone(),
            });
        }
        self.snapshot = Some(callbacks.clone());
        self.snapshot_rejectable = tap_rejectable;
        debug!("builder set rebuilt: {} builders", self.builders.len());
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.builders.len()
    }

    /// Instantiate a fresh recognizer per builder for a new lifecycle, in
    /// registration order.
    pub(crate) fn build_all(&self, ctx: &Rc<RecognizerContext>) -> SmallVec<[Recognizer; 4]> {
        self.builders
            .iter()
            .map(|builder| builder.build(ctx.clone()))
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }
}

#[cfg(test)]
#[path = "tests/builder_tests.rs"]
mod tests;
