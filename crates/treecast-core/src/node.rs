#![forbid(unsafe_code)]

//! Subscription tree nodes.
//!
//! A [`SubscriptionNode`] multiplexes one upstream change feed into its own
//! [`ListenerSet`]. The upstream is the parent node when there is one and the
//! data source otherwise. A child activates by registering its upstream
//! callback as an ordinary listener of its parent, so a parent's
//! [`broadcast`](SubscriptionNode::broadcast) reaches the child's hook in
//! registration order, and the child's own broadcast finishes before the
//! parent moves on to its next listener. One upstream change therefore walks
//! the active tree depth-first, ancestors first.
//!
//! # State machine
//!
//! ```text
//!            activate() / add_listener()
//!  Inactive ────────────────────────────▶ Active
//!     ▲                                     │
//!     └──────────── deactivate() ───────────┘
//! ```
//!
//! Inactive nodes hold the shared [`NULL_LISTENERS`] stand-in. Activation
//! allocates a fresh [`ListenerSet`]; no listener survives a full
//! deactivate/activate cycle.
//!
//! # Ownership
//!
//! Children keep their parent alive (strong reference upward). Upstream
//! callbacks hold only a weak reference to their node, so a parent's listener
//! set never keeps a child alive. Dropping the last handle to an active node
//! detaches it from its upstream.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use crate::batch::{Batch, get_batch};
use crate::error::SubscribeError;
use crate::listener_set::{
    Listener, ListenerCollection, ListenerSet, NULL_LISTENERS, NullListeners, PanicPolicy,
};
use crate::source::ChangeFeed;
use crate::unsubscribe::Unsubscribe;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique node identifier, used in trace output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Construction options for a node.
///
/// Children created through [`SubscriptionNode::child`] or
/// [`SubscriptionNode::new`] inherit their parent's options.
#[derive(Debug, Clone, Default)]
pub struct NodeOptions {
    /// Executor for notification passes. `None` reads the thread default
    /// ([`get_batch`]) at construction.
    pub batch: Option<Batch>,
    /// Listener panic policy for this node's passes.
    pub panic_policy: PanicPolicy,
}

impl NodeOptions {
    /// Default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batching executor.
    #[must_use]
    pub fn with_batch(mut self, batch: Batch) -> Self {
        self.batch = Some(batch);
        self
    }

    /// Set the listener panic policy.
    #[must_use]
    pub fn with_panic_policy(mut self, policy: PanicPolicy) -> Self {
        self.panic_policy = policy;
        self
    }
}

type Hook = Rc<dyn Fn()>;

#[derive(Clone)]
enum ListenerSlot {
    Null(&'static NullListeners),
    Live(ListenerSet),
}

impl ListenerSlot {
    fn collection(&self) -> &dyn ListenerCollection {
        match self {
            Self::Null(null) => *null,
            Self::Live(set) => set,
        }
    }
}

struct NodeInner {
    id: NodeId,
    depth: usize,
    source: Rc<dyn ChangeFeed>,
    parent: Option<SubscriptionNode>,
    batch: Batch,
    policy: PanicPolicy,
    /// Present exactly while active.
    detach: RefCell<Option<Unsubscribe>>,
    listeners: RefCell<ListenerSlot>,
    hook: RefCell<Option<Hook>>,
}

impl Drop for NodeInner {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.get_mut().take() {
            detach.unsubscribe();
            self.listeners.get_mut().collection().clear();
        }
    }
}

/// One node of the nested subscription tree.
///
/// Cloning a `SubscriptionNode` creates a new handle to the **same** node.
///
/// # Invariants
///
/// 1. An active node is subscribed to exactly one upstream: its parent if it
///    has one, the source otherwise.
/// 2. A node cannot be active while its parent is inactive at the moment of
///    activation; [`activate`](Self::activate) brings the parent chain up
///    first.
/// 3. [`activate`](Self::activate) and [`deactivate`](Self::deactivate) are
///    idempotent.
/// 4. The hook of a node runs before any of that node's listeners for the
///    same upstream change when the hook is what triggers the broadcast.
#[derive(Clone)]
pub struct SubscriptionNode {
    inner: Rc<NodeInner>,
}

/// Non-owning handle to a [`SubscriptionNode`].
#[derive(Clone)]
pub struct WeakSubscriptionNode {
    inner: Weak<NodeInner>,
}

impl WeakSubscriptionNode {
    /// Recover a strong handle if the node is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<SubscriptionNode> {
        self.inner.upgrade().map(|inner| SubscriptionNode { inner })
    }
}

impl fmt::Debug for WeakSubscriptionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakSubscriptionNode")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl fmt::Debug for SubscriptionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionNode")
            .field("id", &self.inner.id)
            .field("depth", &self.inner.depth)
            .field("active", &self.is_active())
            .field("listeners", &self.listener_count())
            .field("has_hook", &self.has_on_upstream_fired())
            .field("parent", &self.inner.parent.as_ref().map(|p| p.id()))
            .finish()
    }
}

impl SubscriptionNode {
    /// Create an inactive node.
    ///
    /// With a `parent`, the node inherits the parent's options and will
    /// subscribe through the parent; `source` is kept for reference only.
    /// Without a parent it becomes a root subscribing to `source` directly.
    #[must_use]
    pub fn new(source: Rc<dyn ChangeFeed>, parent: Option<&SubscriptionNode>) -> Self {
        let options = parent.map_or_else(NodeOptions::default, SubscriptionNode::options);
        Self::with_options(source, parent, options)
    }

    /// Create an inactive root bound to `source`.
    #[must_use]
    pub fn root(source: Rc<dyn ChangeFeed>) -> Self {
        Self::new(source, None)
    }

    /// Create an inactive node with explicit options.
    #[must_use]
    pub fn with_options(
        source: Rc<dyn ChangeFeed>,
        parent: Option<&SubscriptionNode>,
        options: NodeOptions,
    ) -> Self {
        let depth = parent.map_or(0, |p| p.depth() + 1);
        Self {
            inner: Rc::new(NodeInner {
                id: NodeId::next(),
                depth,
                source,
                parent: parent.cloned(),
                batch: options.batch.unwrap_or_else(get_batch),
                policy: options.panic_policy,
                detach: RefCell::new(None),
                listeners: RefCell::new(ListenerSlot::Null(&NULL_LISTENERS)),
                hook: RefCell::new(None),
            }),
        }
    }

    /// Create an inactive child of this node with the same source and options.
    #[must_use]
    pub fn child(&self) -> Self {
        Self::new(Rc::clone(&self.inner.source), Some(self))
    }

    /// Options this node was built with (batch resolved).
    #[must_use]
    pub fn options(&self) -> NodeOptions {
        NodeOptions {
            batch: Some(self.inner.batch.clone()),
            panic_policy: self.inner.policy,
        }
    }

    /// Node identifier.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Distance from the root (root is 0).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    /// Parent node, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&SubscriptionNode> {
        self.inner.parent.as_ref()
    }

    /// The data source this node (or its root) is bound to.
    #[must_use]
    pub fn source(&self) -> &Rc<dyn ChangeFeed> {
        &self.inner.source
    }

    /// Non-owning handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakSubscriptionNode {
        WeakSubscriptionNode {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether two handles refer to the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether the node currently holds an upstream subscription.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.detach.borrow().is_some()
    }

    /// Subscribe upstream if not already subscribed.
    ///
    /// With a parent, the parent chain is activated first and this node's
    /// upstream callback becomes one of the parent's listeners. Without a
    /// parent, the callback is subscribed to the source. A fresh listener set
    /// is allocated afterwards.
    ///
    /// # Errors
    ///
    /// Returns the [`SubscribeError`] of the first upstream that refused. The
    /// node stays inactive in that case; ancestors activated on the way up
    /// stay active.
    pub fn activate(&self) -> Result<(), SubscribeError> {
        if self.is_active() {
            return Ok(());
        }

        let callback = self.upstream_callback();
        let detach = match &self.inner.parent {
            Some(parent) => parent.add_shared_listener(callback)?,
            None => self.inner.source.subscribe(callback)?,
        };

        if self.is_active() {
            // The upstream activated us re-entrantly; keep the first subscription.
            detach.unsubscribe();
            return Ok(());
        }

        *self.inner.detach.borrow_mut() = Some(detach);
        *self.inner.listeners.borrow_mut() = ListenerSlot::Live(ListenerSet::with_policy(
            self.inner.batch.clone(),
            self.inner.policy,
        ));
        let upstream = if self.inner.parent.is_some() {
            "parent"
        } else {
            "source"
        };
        trace!(
            node = %self.inner.id,
            depth = self.inner.depth,
            upstream,
            "node activated"
        );
        Ok(())
    }

    /// Drop the upstream subscription and every listener of this node.
    ///
    /// Idempotent. Descendants that were active keep their own state but no
    /// longer receive changes; deactivating them is the caller's job.
    pub fn deactivate(&self) {
        let detach = self.inner.detach.borrow_mut().take();
        let Some(detach) = detach else {
            return;
        };
        detach.unsubscribe();

        let previous = std::mem::replace(
            &mut *self.inner.listeners.borrow_mut(),
            ListenerSlot::Null(&NULL_LISTENERS),
        );
        previous.collection().clear();
        trace!(node = %self.inner.id, depth = self.inner.depth, "node deactivated");
    }

    /// Activate, then register `listener` on this node.
    ///
    /// # Errors
    ///
    /// Propagates any [`SubscribeError`] from activation.
    pub fn add_listener(&self, listener: impl Fn() + 'static) -> Result<Unsubscribe, SubscribeError> {
        self.add_shared_listener(Rc::new(listener))
    }

    /// [`add_listener`](Self::add_listener) for an already shared callback.
    ///
    /// # Errors
    ///
    /// Propagates any [`SubscribeError`] from activation.
    pub fn add_shared_listener(&self, listener: Listener) -> Result<Unsubscribe, SubscribeError> {
        self.activate()?;
        let slot = self.inner.listeners.borrow().clone();
        Ok(slot.collection().subscribe_listener(listener))
    }

    /// Notify this node's own listeners.
    ///
    /// On an inactive node this reaches the null stand-in and does nothing.
    pub fn broadcast(&self) {
        let slot = self.inner.listeners.borrow().clone();
        trace!(
            node = %self.inner.id,
            depth = self.inner.depth,
            listeners = slot.collection().len(),
            "broadcast"
        );
        slot.collection().notify();
    }

    /// Entry point invoked by the upstream subscription.
    ///
    /// Runs the hook if one is set; otherwise does nothing.
    pub fn on_upstream_fired(&self) {
        let hook = self.inner.hook.borrow().clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Set the hook run by [`on_upstream_fired`](Self::on_upstream_fired).
    pub fn set_on_upstream_fired(&self, hook: impl Fn() + 'static) {
        *self.inner.hook.borrow_mut() = Some(Rc::new(hook));
    }

    /// Remove the hook, returning it.
    pub fn clear_on_upstream_fired(&self) -> Option<Rc<dyn Fn()>> {
        self.inner.hook.borrow_mut().take()
    }

    /// Whether a hook is set.
    #[must_use]
    pub fn has_on_upstream_fired(&self) -> bool {
        self.inner.hook.borrow().is_some()
    }

    /// Set the hook to this node's own [`broadcast`](Self::broadcast).
    ///
    /// This is the root convention: a source change flows straight into the
    /// node's listener fan-out.
    pub fn broadcast_on_upstream_fired(&self) {
        let weak = self.downgrade();
        self.set_on_upstream_fired(move || {
            if let Some(node) = weak.upgrade() {
                node.broadcast();
            }
        });
    }

    /// Listeners the next broadcast would reach.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().collection().len()
    }

    /// Listener panic policy for this node's passes.
    #[must_use]
    pub fn panic_policy(&self) -> PanicPolicy {
        self.inner.policy
    }

    /// Listener panics caught by the current listener set.
    #[must_use]
    pub fn panic_count(&self) -> u64 {
        match &*self.inner.listeners.borrow() {
            ListenerSlot::Live(set) => set.panic_count(),
            ListenerSlot::Null(_) => 0,
        }
    }

    fn upstream_callback(&self) -> Listener {
        let weak = Rc::downgrade(&self.inner);
        Rc::new(move || {
            if let Some(inner) = weak.upgrade() {
                SubscriptionNode { inner }.on_upstream_fired();
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manual::ManualFeed;
    use std::cell::Cell;

    type Log = Rc<RefCell<Vec<String>>>;

    fn push(log: &Log, entry: impl Into<String>) {
        log.borrow_mut().push(entry.into());
    }

    fn feed() -> (Rc<ManualFeed>, Rc<dyn ChangeFeed>) {
        let feed = Rc::new(ManualFeed::new());
        let dyn_feed: Rc<dyn ChangeFeed> = feed.clone();
        (feed, dyn_feed)
    }

    fn forwarding(node: &SubscriptionNode, log: &Log, name: &'static str) {
        let weak = node.downgrade();
        let log = Rc::clone(log);
        node.set_on_upstream_fired(move || {
            push(&log, format!("{name}.hook"));
            if let Some(node) = weak.upgrade() {
                node.broadcast();
            }
        });
    }

    #[test]
    fn starts_inactive() {
        let (_feed, source) = feed();
        let root = SubscriptionNode::root(source);
        assert!(!root.is_active());
        assert_eq!(root.listener_count(), 0);
        assert_eq!(root.depth(), 0);
        assert!(root.parent().is_none());
    }

    #[test]
    fn add_listener_activates_whole_chain() {
        let (feed, source) = feed();
        let root = SubscriptionNode::root(source);
        let mid = root.child();
        let leaf = mid.child();
        assert_eq!(leaf.depth(), 2);

        let _h = leaf.add_listener(|| {}).expect("activate");
        assert!(root.is_active());
        assert!(mid.is_active());
        assert!(leaf.is_active());
        assert_eq!(feed.subscribe_calls(), 1);
        assert_eq!(root.listener_count(), 1);
        assert_eq!(mid.listener_count(), 1);
        assert_eq!(leaf.listener_count(), 1);
    }

    #[test]
    fn root_subscribes_once_for_many_descendants() {
        let (feed, source) = feed();
        let root = SubscriptionNode::root(source);
        let children: Vec<_> = (0..5).map(|_| root.child()).collect();
        let grandchildren: Vec<_> = children.iter().map(SubscriptionNode::child).collect();
        for node in &grandchildren {
            node.activate().expect("activate");
        }
        assert_eq!(feed.subscribe_calls(), 1);
        assert_eq!(root.listener_count(), 5);
    }

    #[test]
    fn activate_is_idempotent() {
        let (feed, source) = feed();
        let root = SubscriptionNode::root(source);
        let child = root.child();
        child.activate().expect("first");
        child.activate().expect("second");
        assert_eq!(feed.subscribe_calls(), 1);
        assert_eq!(root.listener_count(), 1);
    }

    #[test]
    fn deactivate_is_idempotent() {
        let (feed, source) = feed();
        let root = SubscriptionNode::root(source);
        root.activate().expect("activate");
        root.deactivate();
        root.deactivate();
        assert!(!root.is_active());
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn end_to_end_trace() {
        let (feed, source) = feed();
        let log: Log = Rc::new(RefCell::new(Vec::new()));

        let r = SubscriptionNode::root(source);
        forwarding(&r, &log, "R");
        let c1 = r.child();
        forwarding(&c1, &log, "C1");
        let c2 = r.child();
        forwarding(&c2, &log, "C2");

        c1.activate().expect("c1");
        c2.activate().expect("c2");
        let log_l = Rc::clone(&log);
        let _l = c1.add_listener(move || push(&log_l, "L")).expect("L");

        feed.fire();
        assert_eq!(*log.borrow(), vec!["R.hook", "C1.hook", "L", "C2.hook"]);
    }

    #[test]
    fn broadcast_on_inactive_node_is_silent() {
        let (_feed, source) = feed();
        let node = SubscriptionNode::root(source);
        node.broadcast();
        assert!(!node.is_active());
    }

    #[test]
    fn missing_hook_is_noop() {
        let (feed, source) = feed();
        let root = SubscriptionNode::root(source);
        let hits = Rc::new(Cell::new(0));
        let hits_clone = Rc::clone(&hits);
        let _h = root
            .add_listener(move || hits_clone.set(hits_clone.get() + 1))
            .expect("listen");
        feed.fire();
        assert_eq!(hits.get(), 0);

        root.broadcast_on_upstream_fired();
        feed.fire();
        assert_eq!(hits.get(), 1);

        assert!(root.clear_on_upstream_fired().is_some());
        feed.fire();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn deactivate_isolates_node() {
        let (feed, source) = feed();
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let root = SubscriptionNode::root(source);
        root.broadcast_on_upstream_fired();
        let a = root.child();
        a.broadcast_on_upstream_fired();
        let b = root.child();
        b.broadcast_on_upstream_fired();
        let a_child = a.child();
        a_child.broadcast_on_upstream_fired();

        for (node, tag) in [(&root, "root"), (&a, "a"), (&b, "b"), (&a_child, "a_child")] {
            let log = Rc::clone(&log);
            let _ = node.add_listener(move || push(&log, tag)).expect("listen");
        }

        a.deactivate();
        assert_eq!(a.listener_count(), 0);
        // a_child still believes it is active, but its upstream was cleared.
        assert!(a_child.is_active());

        feed.fire();
        assert_eq!(*log.borrow(), vec!["root", "b"]);
    }

    #[test]
    fn unsubscribe_after_deactivate_is_noop() {
        let (feed, source) = feed();
        let root = SubscriptionNode::root(source);
        root.broadcast_on_upstream_fired();
        let hits = Rc::new(Cell::new(0));
        let hits_clone = Rc::clone(&hits);
        let handle = root
            .add_listener(move || hits_clone.set(hits_clone.get() + 1))
            .expect("listen");

        root.deactivate();
        handle.unsubscribe();
        handle.unsubscribe();

        root.activate().expect("reactivate");
        feed.fire();
        // The old listener did not survive the cycle.
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn reactivation_starts_fresh() {
        let (feed, source) = feed();
        let root = SubscriptionNode::root(source);
        root.broadcast_on_upstream_fired();
        let _h = root.add_listener(|| {}).expect("listen");
        root.deactivate();
        root.activate().expect("again");
        assert_eq!(root.listener_count(), 0);
        assert_eq!(feed.subscribe_calls(), 2);
        assert_eq!(feed.subscriber_count(), 1);
    }

    #[test]
    fn rejected_subscribe_surfaces_and_leaves_chain_inactive() {
        let (feed, source) = feed();
        feed.set_rejecting(true);
        let root = SubscriptionNode::root(source);
        let child = root.child();
        let err = child.add_listener(|| {}).unwrap_err();
        assert!(matches!(err, SubscribeError::Rejected { .. }));
        assert!(!root.is_active());
        assert!(!child.is_active());

        feed.set_rejecting(false);
        child.activate().expect("retry by caller");
        assert!(root.is_active());
    }

    #[test]
    fn deactivate_from_inside_listener_affects_next_pass_only() {
        let (feed, source) = feed();
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let root = SubscriptionNode::root(source);
        root.broadcast_on_upstream_fired();

        let root_weak = root.downgrade();
        let log_a = Rc::clone(&log);
        let _a = root
            .add_listener(move || {
                push(&log_a, "a");
                if let Some(root) = root_weak.upgrade() {
                    root.deactivate();
                }
            })
            .expect("a");
        let log_b = Rc::clone(&log);
        let _b = root.add_listener(move || push(&log_b, "b")).expect("b");

        feed.fire();
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        assert!(!root.is_active());

        feed.fire();
        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn dropping_active_node_detaches_upstream() {
        let (feed, source) = feed();
        let root = SubscriptionNode::root(source);
        root.broadcast_on_upstream_fired();
        {
            let child = root.child();
            child.activate().expect("child");
            assert_eq!(root.listener_count(), 1);
        }
        assert_eq!(root.listener_count(), 0);
        drop(root);
        assert_eq!(feed.subscriber_count(), 0);
    }

    #[test]
    fn children_inherit_options() {
        let (_feed, source) = feed();
        let options = NodeOptions::new()
            .with_batch(Batch::new("custom", |work| work()))
            .with_panic_policy(PanicPolicy::Isolate);
        let root = SubscriptionNode::with_options(source, None, options);
        let child = root.child();
        assert_eq!(child.panic_policy(), PanicPolicy::Isolate);
        assert_eq!(child.options().batch.map(|b| b.name()), Some("custom"));
    }

    #[test]
    fn isolate_policy_keeps_descendants_notified() {
        let (feed, source) = feed();
        let options = NodeOptions::new().with_panic_policy(PanicPolicy::Isolate);
        let root = SubscriptionNode::with_options(source, None, options);
        root.broadcast_on_upstream_fired();
        let _boom = root.add_listener(|| panic!("boom")).expect("boom");
        let child = root.child();
        child.broadcast_on_upstream_fired();
        let hits = Rc::new(Cell::new(0));
        let hits_clone = Rc::clone(&hits);
        let _h = child
            .add_listener(move || hits_clone.set(hits_clone.get() + 1))
            .expect("child");

        feed.fire();
        assert_eq!(hits.get(), 1);
        assert_eq!(root.panic_count(), 1);
    }

    #[test]
    fn leaf_panic_is_counted_by_the_leaf_only() {
        let (feed, source) = feed();
        let root = SubscriptionNode::root(source);
        root.broadcast_on_upstream_fired();
        let mid = root.child();
        mid.broadcast_on_upstream_fired();
        let leaf = mid.child();
        leaf.broadcast_on_upstream_fired();
        let _boom = leaf.add_listener(|| panic!("leaf")).expect("leaf");

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| feed.fire()));
        assert!(result.is_err());
        assert_eq!(
            (root.panic_count(), mid.panic_count(), leaf.panic_count()),
            (0, 0, 1)
        );
    }

    #[test]
    fn debug_format() {
        let (_feed, source) = feed();
        let root = SubscriptionNode::root(source);
        let dbg = format!("{root:?}");
        assert!(dbg.contains("SubscriptionNode"));
        assert!(dbg.contains("active: false"));
        assert!(root.id().to_string().starts_with("node#"));
    }
}
