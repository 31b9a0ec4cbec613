#![forbid(unsafe_code)]

//! Core: nested subscription tree with depth-ordered change notification.
//!
//! # Role in treecast
//! `treecast-core` owns the two cooperating data structures that carry a
//! change from one shared data source to a tree of listeners:
//!
//! - [`ListenerSet`]: copy-on-write listener registry whose notification
//!   passes run over a frozen snapshot, so listeners may subscribe and
//!   unsubscribe re-entrantly.
//! - [`SubscriptionNode`]: one tree node that multiplexes its upstream
//!   (parent node or data source) into its own listener set, activating its
//!   ancestors lazily.
//!
//! # How it fits in the system
//! The runtime crate (`treecast-runtime`) provides a reducer store, a root
//! bootstrap (`Provider`), and selector-driven nodes on top of these types.
//! The core itself only needs a [`ChangeFeed`] and a [`Batch`] executor.
//!
//! # Invariants
//!
//! 1. For one upstream change, every ancestor's hook runs before any
//!    descendant's listeners.
//! 2. A notification pass runs the listener snapshot taken when it began.
//! 3. Teardown operations (`deactivate`, unsubscribe handles) are idempotent.
//!
//! # Threading
//! Everything here is `Rc`/`RefCell` based and therefore `!Send`: the tree
//! lives on one thread and is driven synchronously.

pub mod batch;
pub mod error;
pub mod listener_set;
pub mod manual;
pub mod node;
pub mod source;
pub mod unsubscribe;

pub use batch::{Batch, get_batch, set_batch};
pub use error::SubscribeError;
pub use listener_set::{
    Listener, ListenerCollection, ListenerSet, NULL_LISTENERS, NullListeners, PanicPolicy,
};
pub use manual::ManualFeed;
pub use node::{NodeId, NodeOptions, SubscriptionNode, WeakSubscriptionNode};
pub use source::{ChangeFeed, DataSource};
pub use unsubscribe::{SubscriptionGuard, Unsubscribe};
