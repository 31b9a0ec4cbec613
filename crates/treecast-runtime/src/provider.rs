#![forbid(unsafe_code)]

//! Root bootstrap: binds a data source to the root of a subscription tree.
//!
//! A [`Provider`] owns the root [`SubscriptionNode`] for one data source.
//! The root's hook is its own broadcast, so a source change flows straight
//! into the tree. Descendants obtain the root (and the source) through
//! [`Provider::context`] or create children with [`Provider::child`].
//!
//! # Lifecycle
//!
//! 1. [`Provider::new`] records the source state and builds an inactive root.
//! 2. Descendants may register listeners before the provider mounts; that
//!    activates the root lazily.
//! 3. [`Provider::mount`] activates the root and, if the source state differs
//!    from the last state the tree was told about, broadcasts once so
//!    descendants that subscribed late do not miss that change. Mounting a
//!    mounted provider does nothing.
//! 4. [`Provider::unmount`] (or drop) deactivates the root and removes its
//!    hook.
//!
//! The root hook records the source state before every broadcast it runs,
//! so only changes made while the hook was absent trigger the mount
//! broadcast.
//!
//! [`Provider::replace_source`] runs steps 4 → 1 → 3 for a new source.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, debug_span};
use treecast_core::{
    Batch, ChangeFeed, DataSource, NodeOptions, SubscribeError, SubscriptionNode, get_batch,
};

use crate::config::ProviderConfig;

/// What descendants receive from a provider.
pub struct ProviderContext<D> {
    /// The data source.
    pub source: Rc<D>,
    /// The root subscription node.
    pub subscription: SubscriptionNode,
}

impl<D> Clone for ProviderContext<D> {
    fn clone(&self) -> Self {
        Self {
            source: Rc::clone(&self.source),
            subscription: self.subscription.clone(),
        }
    }
}

impl<D> fmt::Debug for ProviderContext<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderContext")
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}

/// Owner of the root subscription node for one data source.
pub struct Provider<D: DataSource + 'static> {
    source: Rc<D>,
    root: SubscriptionNode,
    /// Last state broadcast to the tree.
    delivered: Rc<RefCell<D::State>>,
    config: ProviderConfig,
    batch: Batch,
    mounted: bool,
}

impl<D: DataSource + 'static> fmt::Debug for Provider<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("batch", &self.batch)
            .field("mounted", &self.mounted)
            .finish_non_exhaustive()
    }
}

fn install_root_hook<D: DataSource + 'static>(
    root: &SubscriptionNode,
    source: &Rc<D>,
    delivered: &Rc<RefCell<D::State>>,
    trace_notifications: bool,
) {
    let weak = root.downgrade();
    let source = Rc::clone(source);
    let delivered = Rc::clone(delivered);
    root.set_on_upstream_fired(move || {
        let Some(node) = weak.upgrade() else {
            return;
        };
        *delivered.borrow_mut() = source.state();
        if trace_notifications {
            let _span = debug_span!("root_broadcast", node = %node.id()).entered();
            node.broadcast();
        } else {
            node.broadcast();
        }
    });
}

fn build_root<D: DataSource + 'static>(
    source: &Rc<D>,
    delivered: &Rc<RefCell<D::State>>,
    config: &ProviderConfig,
    batch: &Batch,
) -> SubscriptionNode {
    let feed: Rc<dyn ChangeFeed> = Rc::clone(source) as Rc<dyn ChangeFeed>;
    let options = NodeOptions::new()
        .with_batch(batch.clone())
        .with_panic_policy(config.panic_policy);
    let root = SubscriptionNode::with_options(feed, None, options);
    install_root_hook(&root, source, delivered, config.trace_notifications);
    root
}

impl<D: DataSource + 'static> Provider<D> {
    /// Provider with default config and the thread's default batch.
    pub fn new(source: Rc<D>) -> Self {
        Self::with_config(source, ProviderConfig::default())
    }

    /// Provider with explicit config and the thread's default batch.
    pub fn with_config(source: Rc<D>, config: ProviderConfig) -> Self {
        Self::with_batch(source, config, get_batch())
    }

    /// Provider with explicit config and batching executor.
    pub fn with_batch(source: Rc<D>, config: ProviderConfig, batch: Batch) -> Self {
        let delivered = Rc::new(RefCell::new(source.state()));
        let root = build_root(&source, &delivered, &config, &batch);
        debug!(node = %root.id(), "provider created");
        Self {
            source,
            root,
            delivered,
            config,
            batch,
            mounted: false,
        }
    }

    /// The root subscription node.
    #[must_use]
    pub fn root(&self) -> &SubscriptionNode {
        &self.root
    }

    /// The bound data source.
    #[must_use]
    pub fn source(&self) -> &Rc<D> {
        &self.source
    }

    /// Source and root, as handed to descendants.
    #[must_use]
    pub fn context(&self) -> ProviderContext<D> {
        ProviderContext {
            source: Rc::clone(&self.source),
            subscription: self.root.clone(),
        }
    }

    /// New inactive child of the root.
    #[must_use]
    pub fn child(&self) -> SubscriptionNode {
        self.root.child()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Whether [`mount`](Self::mount) ran more recently than
    /// [`unmount`](Self::unmount).
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Deactivate the root and remove its hook. Idempotent.
    pub fn unmount(&mut self) {
        self.root.deactivate();
        self.root.clear_on_upstream_fired();
        if self.mounted {
            debug!(node = %self.root.id(), "provider unmounted");
        }
        self.mounted = false;
    }
}

impl<D> Provider<D>
where
    D: DataSource + 'static,
    D::State: PartialEq,
{
    /// Activate the root and catch descendants up on missed changes.
    ///
    /// No-op while mounted.
    ///
    /// # Errors
    ///
    /// Propagates the source's [`SubscribeError`]; the provider stays
    /// unmounted.
    pub fn mount(&mut self) -> Result<(), SubscribeError> {
        if self.mounted {
            return Ok(());
        }
        if !self.root.has_on_upstream_fired() {
            install_root_hook(
                &self.root,
                &self.source,
                &self.delivered,
                self.config.trace_notifications,
            );
        }
        self.root.activate()?;
        self.mounted = true;
        debug!(node = %self.root.id(), "provider mounted");

        let current = self.source.state();
        let missed = *self.delivered.borrow() != current;
        if missed {
            *self.delivered.borrow_mut() = current;
            if self.config.notify_on_mount {
                debug!(node = %self.root.id(), "state changed while unmounted; broadcasting");
                self.root.broadcast();
            }
        }
        Ok(())
    }

    /// Tear down the current root and bind a new source.
    ///
    /// Nodes derived from the old root keep pointing at it and stop
    /// receiving changes. The provider is remounted if it was mounted.
    ///
    /// # Errors
    ///
    /// Propagates the new source's [`SubscribeError`] on remount.
    pub fn replace_source(&mut self, source: Rc<D>) -> Result<(), SubscribeError> {
        let was_mounted = self.mounted;
        self.unmount();
        self.delivered = Rc::new(RefCell::new(source.state()));
        self.root = build_root(&source, &self.delivered, &self.config, &self.batch);
        self.source = source;
        debug!(node = %self.root.id(), "provider source replaced");
        if was_mounted {
            self.mount()?;
        }
        Ok(())
    }
}

impl<D: DataSource + 'static> Drop for Provider<D> {
    fn drop(&mut self) {
        self.unmount();
    }
}
