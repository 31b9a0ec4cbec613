#![forbid(unsafe_code)]

//! Upstream contracts consumed by the subscription tree.
//!
//! The root of a tree only needs a [`ChangeFeed`]: something that accepts a
//! zero-argument callback and hands back an [`Unsubscribe`]. Full data
//! sources additionally expose their state and accept actions; that part of
//! the contract is used by root bootstrap code, not by the nodes themselves.

use crate::error::SubscribeError;
use crate::listener_set::Listener;
use crate::unsubscribe::Unsubscribe;

/// A source of change notifications.
pub trait ChangeFeed {
    /// Register `listener` to run after every change.
    ///
    /// # Errors
    ///
    /// Returns [`SubscribeError`] if the feed refuses the registration.
    fn subscribe(&self, listener: Listener) -> Result<Unsubscribe, SubscribeError>;
}

/// Shared mutable state that emits change notifications.
pub trait DataSource: ChangeFeed {
    /// Snapshot type returned by [`state`](Self::state).
    type State;
    /// Input accepted by [`dispatch`](Self::dispatch).
    type Action;
    /// Failure reported by [`dispatch`](Self::dispatch).
    type DispatchError: std::error::Error;

    /// Current state snapshot.
    fn state(&self) -> Self::State;

    /// Apply an action, notifying subscribers on success.
    ///
    /// # Errors
    ///
    /// Implementation-defined; see [`Self::DispatchError`].
    fn dispatch(&self, action: Self::Action) -> Result<(), Self::DispatchError>;
}
