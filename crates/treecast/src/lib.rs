#![forbid(unsafe_code)]

//! treecast: nested subscription trees with ancestors-first notification.
//!
//! One shared data source, many nested subscribers. Each subscriber hangs
//! off a [`SubscriptionNode`]; a node subscribes to its parent rather than to
//! the source, so one change walks the tree parents first and every
//! descendant sees its ancestors' updates before its own.
//!
//! This crate re-exports [`treecast_core`] (listener sets and nodes) and
//! [`treecast_runtime`] (store, provider, selectors, config). Most programs
//! only need the [`prelude`].
//!
//! ```
//! use std::rc::Rc;
//! use treecast::prelude::*;
//!
//! let store = Rc::new(Store::new(0, |n: &i32, d: &i32| n + d));
//! let mut provider = Provider::new(Rc::clone(&store));
//! provider.mount().unwrap();
//!
//! let child = provider.child();
//! child.broadcast_on_upstream_fired();
//! let hits = Rc::new(std::cell::Cell::new(0));
//! let h = Rc::clone(&hits);
//! let _sub = child.add_listener(move || h.set(h.get() + 1)).unwrap();
//!
//! store.dispatch(1).unwrap();
//! assert_eq!(hits.get(), 1);
//! ```

pub use treecast_core as core;
pub use treecast_runtime as runtime;

pub use treecast_core::{
    Batch, ChangeFeed, DataSource, Listener, ListenerCollection, ListenerSet, ManualFeed,
    NULL_LISTENERS, NodeId, NodeOptions, NullListeners, PanicPolicy, SubscribeError,
    SubscriptionGuard, SubscriptionNode, Unsubscribe, WeakSubscriptionNode, get_batch, set_batch,
};
pub use treecast_runtime::{
    ConfigError, DeferredBatch, DispatchError, LoggingConfig, Provider, ProviderConfig,
    ProviderContext, SelectorNode, Store,
};

#[cfg(feature = "tracing-json")]
pub use treecast_runtime::logging::init_tracing;

/// Common imports.
pub mod prelude {
    pub use crate::{
        Batch, ChangeFeed, DataSource, DeferredBatch, PanicPolicy, Provider, ProviderConfig,
        SelectorNode, Store, SubscribeError, SubscriptionNode, Unsubscribe,
    };
}
