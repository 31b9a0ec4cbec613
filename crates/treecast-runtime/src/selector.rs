#![forbid(unsafe_code)]

//! Derived-value nodes.
//!
//! A [`SelectorNode`] is a child subscription node whose hook recomputes a
//! value from the source state. When the value differs from the previous
//! one, `on_change` runs with the new value. The node then broadcasts to its
//! own listeners either way, so descendants registered below a selector are
//! still reached on every change and keep the ancestors-first order.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::trace;
use treecast_core::{DataSource, SubscribeError, SubscriptionNode};

struct Selected<T> {
    value: RefCell<Rc<T>>,
    recomputes: Cell<u64>,
    changes: Cell<u64>,
}

/// Child node tracking `selector(state)`.
pub struct SelectorNode<T> {
    node: SubscriptionNode,
    selected: Rc<Selected<T>>,
}

impl<T: fmt::Debug> fmt::Debug for SelectorNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectorNode")
            .field("node", &self.node)
            .field("value", &self.selected.value.borrow())
            .field("recomputes", &self.selected.recomputes.get())
            .field("changes", &self.selected.changes.get())
            .finish()
    }
}

impl<T: PartialEq + 'static> SelectorNode<T> {
    /// Create and activate a selector below `parent`.
    ///
    /// The initial value is computed immediately and does not trigger
    /// `on_change`.
    ///
    /// # Errors
    ///
    /// Propagates the [`SubscribeError`] from activating the parent chain.
    pub fn new<D, F, C>(
        parent: &SubscriptionNode,
        source: Rc<D>,
        selector: F,
        on_change: C,
    ) -> Result<Self, SubscribeError>
    where
        D: DataSource + 'static,
        F: Fn(&D::State) -> T + 'static,
        C: Fn(&T) + 'static,
    {
        let node = parent.child();
        let selected = Rc::new(Selected {
            value: RefCell::new(Rc::new(selector(&source.state()))),
            recomputes: Cell::new(0),
            changes: Cell::new(0),
        });

        let weak = node.downgrade();
        let hook_selected = Rc::clone(&selected);
        node.set_on_upstream_fired(move || {
            let Some(node) = weak.upgrade() else {
                return;
            };
            let next = selector(&source.state());
            hook_selected
                .recomputes
                .set(hook_selected.recomputes.get() + 1);
            let changed = **hook_selected.value.borrow() != next;
            if changed {
                let next = Rc::new(next);
                *hook_selected.value.borrow_mut() = Rc::clone(&next);
                hook_selected.changes.set(hook_selected.changes.get() + 1);
                trace!(node = %node.id(), "selected value changed");
                on_change(&next);
            }
            node.broadcast();
        });

        node.activate()?;
        Ok(Self { node, selected })
    }

    /// Latest selected value.
    #[must_use]
    pub fn get(&self) -> Rc<T> {
        Rc::clone(&self.selected.value.borrow())
    }

    /// Borrow the latest selected value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.get();
        f(&value)
    }

    /// The underlying subscription node.
    #[must_use]
    pub fn node(&self) -> &SubscriptionNode {
        &self.node
    }

    /// New inactive child of this selector's node.
    #[must_use]
    pub fn child(&self) -> SubscriptionNode {
        self.node.child()
    }

    /// Times the selector ran after construction.
    #[must_use]
    pub fn recompute_count(&self) -> u64 {
        self.selected.recomputes.get()
    }

    /// Times `on_change` ran.
    #[must_use]
    pub fn change_count(&self) -> u64 {
        self.selected.changes.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Provider;
    use crate::store::Store;

    #[derive(Debug, Clone, PartialEq)]
    struct App {
        count: i32,
        label: &'static str,
    }

    #[derive(Debug)]
    enum Action {
        Inc,
        Label(&'static str),
    }

    fn store() -> Rc<Store<App, Action>> {
        Rc::new(Store::new(
            App {
                count: 0,
                label: "a",
            },
            |state: &App, action: &Action| match action {
                Action::Inc => App {
                    count: state.count + 1,
                    ..state.clone()
                },
                Action::Label(label) => App {
                    label,
                    ..state.clone()
                },
            },
        ))
    }

    #[test]
    fn on_change_runs_only_when_value_changes() {
        let store = store();
        let mut provider = Provider::new(Rc::clone(&store));
        provider.mount().expect("mount");

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let count = SelectorNode::new(
            provider.root(),
            Rc::clone(&store),
            |state: &Rc<App>| state.count,
            move |count: &i32| seen_clone.borrow_mut().push(*count),
        )
        .expect("selector");
        assert_eq!(*count.get(), 0);

        store.dispatch(Action::Inc).expect("dispatch");
        store.dispatch(Action::Label("b")).expect("dispatch");
        store.dispatch(Action::Inc).expect("dispatch");

        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(count.recompute_count(), 3);
        assert_eq!(count.change_count(), 2);
        assert_eq!(count.with(|c| *c), 2);
    }

    #[test]
    fn descendants_are_reached_even_without_change() {
        let store = store();
        let mut provider = Provider::new(Rc::clone(&store));
        provider.mount().expect("mount");

        let log = Rc::new(RefCell::new(Vec::new()));
        let log_change = Rc::clone(&log);
        let label = SelectorNode::new(
            provider.root(),
            Rc::clone(&store),
            |state: &Rc<App>| state.label,
            move |_: &&'static str| log_change.borrow_mut().push("changed"),
        )
        .expect("selector");

        let grandchild = label.child();
        let log_leaf = Rc::clone(&log);
        grandchild.set_on_upstream_fired(move || log_leaf.borrow_mut().push("grandchild"));
        grandchild.activate().expect("activate");

        store.dispatch(Action::Inc).expect("dispatch");
        store.dispatch(Action::Label("z")).expect("dispatch");
        assert_eq!(*log.borrow(), vec!["grandchild", "changed", "grandchild"]);
    }

    #[test]
    fn on_change_may_dispatch() {
        let store = store();
        let mut provider = Provider::new(Rc::clone(&store));
        provider.mount().expect("mount");

        let weak = Rc::downgrade(&store);
        let count = SelectorNode::new(
            provider.root(),
            Rc::clone(&store),
            |state: &Rc<App>| state.count,
            move |count: &i32| {
                if *count == 1
                    && let Some(store) = weak.upgrade()
                {
                    store.dispatch(Action::Inc).expect("nested dispatch");
                }
            },
        )
        .expect("selector");

        store.dispatch(Action::Inc).expect("dispatch");
        assert_eq!(*count.get(), 2);
        assert_eq!(count.change_count(), 2);
    }

    #[test]
    fn dropping_selector_detaches_it() {
        let store = store();
        let mut provider = Provider::new(Rc::clone(&store));
        provider.mount().expect("mount");
        let selector = SelectorNode::new(
            provider.root(),
            Rc::clone(&store),
            |state: &Rc<App>| state.count,
            |_: &i32| {},
        )
        .expect("selector");
        assert_eq!(provider.root().listener_count(), 1);
        drop(selector);
        assert_eq!(provider.root().listener_count(), 0);
    }

    #[test]
    fn closed_source_fails_construction() {
        let store = store();
        let provider = Provider::new(Rc::clone(&store));
        store.close();
        let result = SelectorNode::new(
            provider.root(),
            Rc::clone(&store),
            |state: &Rc<App>| state.count,
            |_: &i32| {},
        );
        assert_eq!(result.unwrap_err(), SubscribeError::Closed);
    }
}
