#![forbid(unsafe_code)]

//! Runtime layer for treecast.
//!
//! Builds the pieces an application wires around a subscription tree:
//!
//! - [`Store`]: reducer-driven data source.
//! - [`Provider`]: owns the root node for one data source and catches
//!   descendants up on changes made before it mounted.
//! - [`SelectorNode`]: child node that recomputes a derived value and reports
//!   when it changes.
//! - [`DeferredBatch`]: batching executor that coalesces side effects until
//!   the outermost notification pass returns.
//! - [`ProviderConfig`] / [`LoggingConfig`]: code, environment, and (with
//!   `policy-config`) TOML configuration.
//!
//! With the `tracing-json` feature, `logging::init_tracing` installs a
//! `tracing-subscriber` backend.

pub mod config;
pub mod deferred;
pub mod error;
#[cfg(feature = "tracing-json")]
pub mod logging;
pub mod provider;
pub mod selector;
pub mod store;

pub use config::{LoggingConfig, ProviderConfig};
pub use deferred::DeferredBatch;
pub use error::{ConfigError, DispatchError};
pub use provider::{Provider, ProviderContext};
pub use selector::SelectorNode;
pub use store::Store;
