#![forbid(unsafe_code)]

//! A change feed driven by hand.
//!
//! [`ManualFeed`] is the smallest useful [`ChangeFeed`]: it keeps its
//! subscribers in a [`ListenerSet`] and notifies them when
//! [`fire`](ManualFeed::fire) is called. It counts subscribe calls and can
//! be switched into a rejecting or closed mode, which makes it the usual
//! upstream for tests and for trees whose changes are signalled by the
//! embedding application rather than by a store.

use std::cell::Cell;

use crate::batch::Batch;
use crate::error::SubscribeError;
use crate::listener_set::{Listener, ListenerCollection, ListenerSet, PanicPolicy};
use crate::source::ChangeFeed;
use crate::unsubscribe::Unsubscribe;

/// Hand-fired change feed.
#[derive(Debug)]
pub struct ManualFeed {
    listeners: ListenerSet,
    subscribe_calls: Cell<u64>,
    fired: Cell<u64>,
    reject: Cell<bool>,
    closed: Cell<bool>,
}

impl Default for ManualFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualFeed {
    /// A feed that notifies subscribers directly.
    #[must_use]
    pub fn new() -> Self {
        Self::with_listeners(ListenerSet::with_policy(
            Batch::immediate(),
            PanicPolicy::Propagate,
        ))
    }

    fn with_listeners(listeners: ListenerSet) -> Self {
        Self {
            listeners,
            subscribe_calls: Cell::new(0),
            fired: Cell::new(0),
            reject: Cell::new(false),
            closed: Cell::new(false),
        }
    }

    /// Notify every current subscriber once.
    pub fn fire(&self) {
        self.fired.set(self.fired.get() + 1);
        self.listeners.notify();
    }

    /// Refuse subsequent subscriptions with [`SubscribeError::Rejected`].
    pub fn set_rejecting(&self, reject: bool) {
        self.reject.set(reject);
    }

    /// Drop all subscribers and refuse new ones with [`SubscribeError::Closed`].
    pub fn close(&self) {
        self.closed.set(true);
        self.listeners.clear();
    }

    /// Successful subscribe calls so far.
    #[must_use]
    pub fn subscribe_calls(&self) -> u64 {
        self.subscribe_calls.get()
    }

    /// Number of times [`fire`](Self::fire) ran.
    #[must_use]
    pub fn fired(&self) -> u64 {
        self.fired.get()
    }

    /// Currently registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl ChangeFeed for ManualFeed {
    fn subscribe(&self, listener: Listener) -> Result<Unsubscribe, SubscribeError> {
        if self.closed.get() {
            return Err(SubscribeError::Closed);
        }
        if self.reject.get() {
            return Err(SubscribeError::rejected("manual feed is rejecting"));
        }
        self.subscribe_calls.set(self.subscribe_calls.get() + 1);
        Ok(self.listeners.subscribe_listener(listener))
    }
}
