//! User gesture callbacks and identity comparison.

use std::rc::Rc;

use ondule_core::Point;

use crate::recognizer::GestureContinuation;

/// Plain tap callback: receives the press offset.
pub type TapCallback = Rc<dyn Fn(Point)>;

/// Continuable gesture callback (double-tap / long-press): receives the
/// press offset and a [`GestureContinuation`] through which the caller ends
/// a held gesture.
pub type ContinuableCallback = Rc<dyn Fn(Point, GestureContinuation)>;

/// The set of user callbacks a coordinator serves.
///
/// `None` suppresses the corresponding recognizer entirely — not an error.
/// Identity matters: replacing a callback with a different closure object
/// triggers a builder-set rebuild even if the behavior is equivalent.
#[derive(Clone, Default)]
pub struct GestureCallbacks {
    pub on_tap: Option<TapCallback>,
    pub on_double_tap: Option<ContinuableCallback>,
    pub on_long_tap: Option<ContinuableCallback>,
}

impl GestureCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_on_tap(mut self, callback: impl Fn(Point) + 'static) -> Self {
        self.on_tap = Some(Rc::new(callback));
        self
    }

    pub fn with_on_double_tap(
        mut self,
        callback: impl Fn(Point, GestureContinuation) + 'static,
    ) -> Self {
        self.on_double_tap = Some(Rc::new(callback));
        self
    }

    pub fn with_on_long_tap(
        mut self,
        callback: impl Fn(Point, GestureContinuation) + 'static,
    ) -> Self {
        self.on_long_tap = Some(Rc::new(callback));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.on_tap.is_none() && self.on_double_tap.is_none() && self.on_long_tap.is_none()
    }

    /// Compare by callback identity (`Rc::ptr_eq`), not by presence alone.
    pub(crate) fn same_identities(&self, other: &Self) -> bool {
        fn same<T: ?Sized>(a: &Option<Rc<T>>, b: &Option<Rc<T>>) -> bool {
            match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                _ => false,
            }
        }
        same(&self.on_tap, &other.on_tap)
            && same(&self.on_double_tap, &other.on_double_tap)
            && same(&self.on_long_tap, &other.on_long_tap)
    }
}

impl std::fmt::Debug for GestureCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureCallbacks")
            .field("on_tap", &self.on_tap.is_some())
            .field("on_double_tap", &self.on_double_tap.is_some())
            .field("on_long_tap", &self.on_long_tap.is_some())
            .finish()
    }
}
