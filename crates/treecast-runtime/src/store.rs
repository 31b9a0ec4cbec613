#![forbid(unsafe_code)]

//! Reducer-driven data source.
//!
//! # Design
//!
//! [`Store<S, A>`] holds the current state as an `Rc<S>` snapshot and a pure
//! reducer `(&S, &A) -> S`. Each successful [`dispatch`](Store::dispatch)
//! replaces the snapshot and runs one notification pass over the store's
//! subscribers. Subscribers are kept in a [`ListenerSet`], so subscribing or
//! unsubscribing from inside a subscriber has the same frozen-snapshot
//! semantics as anywhere else in the tree.
//!
//! Passes never overlap. A dispatch made by a subscriber while a pass is
//! running applies the reducer at once but queues its notification; the
//! outer dispatch runs one more pass after the current one finishes.
//! Several dispatches queued during one pass share that follow-up pass.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Dispatch from reducer | Reducer captured the store | `DispatchError::Reentrant` |
//! | Subscribe from reducer | Reducer captured the store | `SubscribeError::Rejected` |
//! | Use after close | `close()` was called | `Closed` errors |
//! | Reducer panic | Bug in reducer | Propagates; state unchanged |

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};
use treecast_core::{
    Batch, ChangeFeed, DataSource, Listener, ListenerCollection, ListenerSet, PanicPolicy,
    SubscribeError, Unsubscribe,
};

use crate::error::DispatchError;

type Reducer<S, A> = Box<dyn Fn(&S, &A) -> S>;

/// Holds a flag set for a scope, resetting it even on unwind.
struct FlagGuard<'a>(&'a Cell<bool>);

impl<'a> FlagGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Shared state plus reducer, notifying subscribers after every dispatch.
pub struct Store<S, A> {
    state: RefCell<Rc<S>>,
    reducer: Reducer<S, A>,
    listeners: ListenerSet,
    dispatching: Cell<bool>,
    notifying: Cell<bool>,
    pass_queued: Cell<bool>,
    closed: Cell<bool>,
    version: Cell<u64>,
}

impl<S: fmt::Debug, A> fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state.borrow())
            .field("version", &self.version.get())
            .field("subscribers", &self.listeners.len())
            .field("closed", &self.closed.get())
            .finish()
    }
}

impl<S: 'static, A: 'static> Store<S, A> {
    /// Create a store that notifies subscribers directly.
    pub fn new(initial: S, reducer: impl Fn(&S, &A) -> S + 'static) -> Self {
        Self::with_options(initial, reducer, Batch::immediate(), PanicPolicy::default())
    }

    /// Create a store with an explicit executor and subscriber panic policy.
    pub fn with_options(
        initial: S,
        reducer: impl Fn(&S, &A) -> S + 'static,
        batch: Batch,
        policy: PanicPolicy,
    ) -> Self {
        Self {
            state: RefCell::new(Rc::new(initial)),
            reducer: Box::new(reducer),
            listeners: ListenerSet::with_policy(batch, policy),
            dispatching: Cell::new(false),
            notifying: Cell::new(false),
            pass_queued: Cell::new(false),
            closed: Cell::new(false),
            version: Cell::new(0),
        }
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> Rc<S> {
        Rc::clone(&self.state.borrow())
    }

    /// Number of successful dispatches.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.get()
    }

    /// Registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Run the reducer and notify subscribers.
    ///
    /// Called from a subscriber, the state changes immediately and the
    /// notification runs after the current pass.
    ///
    /// # Errors
    ///
    /// [`DispatchError::Reentrant`] when called from the reducer,
    /// [`DispatchError::Closed`] after [`close`](Self::close).
    pub fn dispatch(&self, action: A) -> Result<(), DispatchError> {
        if self.closed.get() {
            return Err(DispatchError::Closed);
        }
        if self.dispatching.get() {
            return Err(DispatchError::Reentrant);
        }

        let next = {
            let _guard = FlagGuard::enter(&self.dispatching);
            let current = self.state();
            (self.reducer)(&current, &action)
        };
        *self.state.borrow_mut() = Rc::new(next);
        self.version.set(self.version.get() + 1);
        debug!(
            version = self.version.get(),
            subscribers = self.listeners.len(),
            "store dispatched"
        );

        if self.notifying.get() {
            self.pass_queued.set(true);
            trace!(version = self.version.get(), "dispatch during pass; notification queued");
            return Ok(());
        }
        let _pass = FlagGuard::enter(&self.notifying);
        loop {
            self.pass_queued.set(false);
            self.listeners.notify();
            if !self.pass_queued.get() {
                break;
            }
        }
        Ok(())
    }

    /// Drop every subscriber and refuse further dispatches and subscriptions.
    pub fn close(&self) {
        if self.closed.replace(true) {
            return;
        }
        self.listeners.clear();
        debug!(version = self.version.get(), "store closed");
    }
}

impl<S: 'static, A: 'static> ChangeFeed for Store<S, A> {
    fn subscribe(&self, listener: Listener) -> Result<Unsubscribe, SubscribeError> {
        if self.closed.get() {
            return Err(SubscribeError::Closed);
        }
        if self.dispatching.get() {
            return Err(SubscribeError::rejected(
                "cannot subscribe while the reducer is running",
            ));
        }
        Ok(self.listeners.subscribe_listener(listener))
    }
}

impl<S: 'static, A: 'static> DataSource for Store<S, A> {
    type State = Rc<S>;
    type Action = A;
    type DispatchError = DispatchError;

    fn state(&self) -> Rc<S> {
        Store::state(self)
    }

    fn dispatch(&self, action: A) -> Result<(), DispatchError> {
        Store::dispatch(self, action)
    }
}
