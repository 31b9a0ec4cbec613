#![forbid(unsafe_code)]

//! Explicit, idempotent unsubscribe handles.
//!
//! Every registration in treecast (listener sets, subscription nodes, data
//! sources) hands back an [`Unsubscribe`]. Calling it detaches the
//! registration; calling it again is a no-op. Dropping the handle does
//! **not** detach; use [`Unsubscribe::into_guard`] when scope-bound
//! teardown is wanted.

use std::cell::RefCell;
use std::fmt;

type DetachFn = Box<dyn FnOnce()>;

/// Handle that removes one registration when invoked.
///
/// # Invariants
///
/// 1. The detach closure runs at most once, no matter how many times
///    [`unsubscribe`](Self::unsubscribe) is called.
/// 2. The internal borrow is released before the closure runs, so the
///    closure may itself re-enter the registry it detaches from.
#[must_use = "an Unsubscribe does nothing unless called; use `into_guard()` for drop-based teardown"]
pub struct Unsubscribe {
    detach: RefCell<Option<DetachFn>>,
}

impl Unsubscribe {
    /// Wrap a detach closure.
    pub fn new(detach: impl FnOnce() + 'static) -> Self {
        Self {
            detach: RefCell::new(Some(Box::new(detach))),
        }
    }

    /// A handle with nothing to detach.
    ///
    /// Returned for registrations that were absorbed (for example, against
    /// a cleared listener set).
    pub fn noop() -> Self {
        Self {
            detach: RefCell::new(None),
        }
    }

    /// Detach the registration. Idempotent.
    pub fn unsubscribe(&self) {
        let detach = self.detach.borrow_mut().take();
        if let Some(detach) = detach {
            detach();
        }
    }

    /// Whether the detach closure has not run yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.detach.borrow().is_some()
    }

    /// Convert into a guard that unsubscribes on drop.
    pub fn into_guard(self) -> SubscriptionGuard {
        SubscriptionGuard { handle: self }
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// RAII guard around an [`Unsubscribe`].
///
/// Dropping the guard detaches the registration.
pub struct SubscriptionGuard {
    handle: Unsubscribe,
}

impl SubscriptionGuard {
    /// Detach now instead of at drop.
    pub fn unsubscribe(&self) {
        self.handle.unsubscribe();
    }

    /// Give up drop-based teardown and return the plain handle.
    pub fn into_inner(self) -> Unsubscribe {
        // Dropping the emptied guard is a no-op.
        let detach = self.handle.detach.borrow_mut().take();
        Unsubscribe {
            detach: RefCell::new(detach),
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.handle.unsubscribe();
    }
}

impl fmt::Debug for SubscriptionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionGuard")
            .field("pending", &self.handle.is_pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting() -> (Rc<Cell<u32>>, Unsubscribe) {
        let calls = Rc::new(Cell::new(0u32));
        let calls_clone = Rc::clone(&calls);
        let handle = Unsubscribe::new(move || calls_clone.set(calls_clone.get() + 1));
        (calls, handle)
    }

    #[test]
    fn runs_once() {
        let (calls, handle) = counting();
        assert!(handle.is_pending());
        handle.unsubscribe();
        handle.unsubscribe();
        assert_eq!(calls.get(), 1);
        assert!(!handle.is_pending());
    }

    #[test]
    fn drop_without_call_does_not_detach() {
        let (calls, handle) = counting();
        drop(handle);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn noop_handle() {
        let handle = Unsubscribe::noop();
        assert!(!handle.is_pending());
        handle.unsubscribe();
    }

    #[test]
    fn guard_detaches_on_drop() {
        let (calls, handle) = counting();
        {
            let _guard = handle.into_guard();
            assert_eq!(calls.get(), 0);
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn guard_explicit_then_drop() {
        let (calls, handle) = counting();
        let guard = handle.into_guard();
        guard.unsubscribe();
        drop(guard);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn guard_into_inner_disarms() {
        let (calls, handle) = counting();
        let plain = handle.into_guard().into_inner();
        assert_eq!(calls.get(), 0);
        plain.unsubscribe();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn reentrant_detach_is_allowed() {
        let slot: Rc<RefCell<Option<Rc<Unsubscribe>>>> = Rc::new(RefCell::new(None));
        let slot_clone = Rc::clone(&slot);
        let handle = Rc::new(Unsubscribe::new(move || {
            if let Some(me) = slot_clone.borrow().as_ref() {
                // Second call from inside the closure must be a no-op.
                me.unsubscribe();
            }
        }));
        *slot.borrow_mut() = Some(Rc::clone(&handle));
        handle.unsubscribe();
        assert!(!handle.is_pending());
        slot.borrow_mut().take();
    }
}
