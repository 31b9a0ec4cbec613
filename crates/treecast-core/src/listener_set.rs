#![forbid(unsafe_code)]

//! Copy-on-write listener registry with frozen notification snapshots.
//!
//! # Design
//!
//! [`ListenerSet`] keeps two references to listener arrays:
//!
//! - `current`: the snapshot most recently handed to [`notify`](ListenerSet::notify).
//! - `next`: the array that subscribe/unsubscribe mutate.
//!
//! After a notify both point at the same `Rc<Vec<_>>`. The first mutation
//! afterwards sees `Rc::ptr_eq(current, next)` and clones into a fresh
//! `next` before editing, so an in-flight pass keeps iterating its own
//! untouched array. Further mutations before the next notify edit `next` in
//! place.
//!
//! # Performance
//!
//! | Operation        | Complexity                          |
//! |------------------|-------------------------------------|
//! | `subscribe()`    | O(1) amortized, O(L) after a notify |
//! | `unsubscribe`    | O(L)                                |
//! | `notify()`       | O(L) listener calls                 |
//! | `get()`          | O(L)                                |
//!
//! # Failure Modes
//!
//! - **Listener panic**: governed by [`PanicPolicy`]. With the default
//!   [`PanicPolicy::ResumeAfterPass`], siblings still run and the first
//!   panic is resumed once the pass finishes. An enclosing pass that catches
//!   a resumed panic neither logs nor counts it again, so each panic is
//!   reported once, by the set whose listener raised it.
//! - **Registration after clear**: absorbed. The listener is never called
//!   and the returned handle is inert.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};
use std::rc::Rc;

use tracing::{trace, warn};

use crate::batch::Batch;
use crate::unsubscribe::Unsubscribe;

thread_local! {
    /// Payload address of a panic being resumed by an inner pass.
    static RESUMED_PANIC: Cell<Option<usize>> = const { Cell::new(None) };
    /// Notification passes currently on this thread's stack.
    static PASS_DEPTH: Cell<usize> = const { Cell::new(0) };
}

fn payload_addr(payload: &(dyn Any + Send)) -> Option<usize> {
    if std::mem::size_of_val(payload) == 0 {
        return None;
    }
    Some((payload as *const (dyn Any + Send)).cast::<()>() as usize)
}

/// Tracks pass nesting; the resumed-panic marker dies with the outermost pass.
struct PassDepth;

impl PassDepth {
    fn enter() -> Self {
        PASS_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self
    }
}

impl Drop for PassDepth {
    fn drop(&mut self) {
        let outermost = PASS_DEPTH.with(|depth| {
            let next = depth.get().saturating_sub(1);
            depth.set(next);
            next == 0
        });
        if outermost {
            RESUMED_PANIC.with(|marker| marker.set(None));
        }
    }
}

/// A zero-argument change callback.
pub type Listener = Rc<dyn Fn()>;

/// What a notification pass does when a listener panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanicPolicy {
    /// Let the panic unwind immediately. Remaining listeners in the
    /// snapshot do not run.
    Propagate,
    /// Catch the panic, log it, and continue with the next listener.
    Isolate,
    /// Catch every panic, finish the snapshot, then resume the first one.
    #[default]
    ResumeAfterPass,
}

impl PanicPolicy {
    /// Parse a policy name (`propagate`, `isolate`, `resume`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "propagate" | "abort" => Some(Self::Propagate),
            "isolate" | "ignore" => Some(Self::Isolate),
            "resume" | "resume-after-pass" | "resume_after_pass" => Some(Self::ResumeAfterPass),
            _ => None,
        }
    }

    /// Canonical name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Propagate => "propagate",
            Self::Isolate => "isolate",
            Self::ResumeAfterPass => "resume",
        }
    }
}

impl fmt::Display for PanicPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common surface of [`ListenerSet`] and its null stand-in.
pub trait ListenerCollection {
    /// Run every listener in a frozen snapshot.
    fn notify(&self);
    /// Register a listener.
    fn subscribe_listener(&self, listener: Listener) -> Unsubscribe;
    /// Drop every listener without calling it.
    fn clear(&self);
    /// Listeners that the next [`notify`](Self::notify) would run.
    fn get(&self) -> Vec<Listener>;
    /// Number of listeners the next notify would run.
    fn len(&self) -> usize;
    /// Whether the next notify would run nothing.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The shared no-op collection used by inactive nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullListeners;

/// Single shared instance of [`NullListeners`].
pub static NULL_LISTENERS: NullListeners = NullListeners;

impl ListenerCollection for NullListeners {
    fn notify(&self) {}

    fn subscribe_listener(&self, _listener: Listener) -> Unsubscribe {
        Unsubscribe::noop()
    }

    fn clear(&self) {}

    fn get(&self) -> Vec<Listener> {
        Vec::new()
    }

    fn len(&self) -> usize {
        0
    }
}

#[derive(Clone)]
struct Entry {
    id: u64,
    listener: Listener,
}

type Snapshot = Rc<Vec<Entry>>;

struct ListenerSetState {
    /// `None` once cleared.
    current: Option<Snapshot>,
    /// `None` once cleared.
    next: Option<Snapshot>,
    next_id: u64,
    panics: u64,
}

impl ListenerSetState {
    fn new() -> Self {
        let empty: Snapshot = Rc::new(Vec::new());
        Self {
            current: Some(Rc::clone(&empty)),
            next: Some(empty),
            next_id: 0,
            panics: 0,
        }
    }

    /// `next` as a mutable array that no in-flight snapshot references.
    fn next_mut(&mut self) -> Option<&mut Vec<Entry>> {
        let shared = match (&self.current, &self.next) {
            (Some(current), Some(next)) => Rc::ptr_eq(current, next),
            (_, None) => return None,
            (None, Some(_)) => false,
        };
        let next = self.next.as_mut()?;
        if shared {
            let detached: Vec<Entry> = next.iter().cloned().collect();
            *next = Rc::new(detached);
        }
        Some(Rc::make_mut(next))
    }

    fn is_cleared(&self) -> bool {
        self.next.is_none()
    }
}

/// Listeners registered at one subscription node.
///
/// Cloning a `ListenerSet` creates a new handle to the **same** registry.
///
/// # Invariants
///
/// 1. `current` and `next` are either the same array or independent arrays.
/// 2. An array referenced by `current` is never mutated.
/// 3. Membership of a pass is fixed when [`notify`](Self::notify) begins:
///    listeners added during the pass wait for the next one, listeners
///    removed during the pass still run in it.
/// 4. Listeners run in registration order.
pub struct ListenerSet {
    inner: Rc<RefCell<ListenerSetState>>,
    batch: Batch,
    policy: PanicPolicy,
}

impl Clone for ListenerSet {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            batch: self.batch.clone(),
            policy: self.policy,
        }
    }
}

impl fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        let shared = match (&state.current, &state.next) {
            (Some(current), Some(next)) => Rc::ptr_eq(current, next),
            _ => false,
        };
        f.debug_struct("ListenerSet")
            .field("len", &state.next.as_ref().map_or(0, |next| next.len()))
            .field("cleared", &state.is_cleared())
            .field("shared_snapshot", &shared)
            .field("policy", &self.policy)
            .field("batch", &self.batch)
            .finish()
    }
}

impl Default for ListenerSet {
    fn default() -> Self {
        Self::new(Batch::immediate())
    }
}

impl ListenerSet {
    /// Create an empty set that notifies through `batch`.
    #[must_use]
    pub fn new(batch: Batch) -> Self {
        Self::with_policy(batch, PanicPolicy::default())
    }

    /// Create an empty set with an explicit panic policy.
    #[must_use]
    pub fn with_policy(batch: Batch, policy: PanicPolicy) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ListenerSetState::new())),
            batch,
            policy,
        }
    }

    /// Register a closure. See [`subscribe_listener`](ListenerCollection::subscribe_listener).
    pub fn subscribe(&self, listener: impl Fn() + 'static) -> Unsubscribe {
        self.subscribe_listener(Rc::new(listener))
    }

    /// Whether [`clear`](ListenerCollection::clear) has been called.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.inner.borrow().is_cleared()
    }

    /// Panic policy applied during notify.
    #[must_use]
    pub fn policy(&self) -> PanicPolicy {
        self.policy
    }

    /// Number of panics raised by this set's own listeners.
    ///
    /// Panics resumed out of a nested pass (a descendant node's listeners)
    /// are counted by the set that caught them first, not here.
    #[must_use]
    pub fn panic_count(&self) -> u64 {
        self.inner.borrow().panics
    }

    fn run_entry(&self, entry: &Entry, first_panic: &mut Option<Box<dyn Any + Send>>) {
        if self.policy == PanicPolicy::Propagate {
            (entry.listener)();
            return;
        }
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| (entry.listener)())) {
            let marker = RESUMED_PANIC.with(Cell::take);
            let resumed = marker.is_some() && marker == payload_addr(&*payload);
            if resumed {
                trace!(listener = entry.id, "nested pass resumed a reported panic");
            } else {
                warn!(
                    listener = entry.id,
                    policy = %self.policy,
                    message = %panic_message(&*payload),
                    "listener panicked during notify"
                );
                self.inner.borrow_mut().panics += 1;
            }
            if self.policy == PanicPolicy::ResumeAfterPass && first_panic.is_none() {
                *first_panic = Some(payload);
            }
        }
    }
}

impl ListenerCollection for ListenerSet {
    fn notify(&self) {
        let snapshot = {
            let mut state = self.inner.borrow_mut();
            state.current = state.next.clone();
            match &state.current {
                Some(snapshot) => Rc::clone(snapshot),
                None => return,
            }
        };
        trace!(listeners = snapshot.len(), batch = self.batch.name(), "notify");

        let _depth = PassDepth::enter();
        let mut first_panic = None;
        self.batch.run(&mut || {
            for entry in snapshot.iter() {
                self.run_entry(entry, &mut first_panic);
            }
        });
        if let Some(payload) = first_panic {
            RESUMED_PANIC.with(|marker| marker.set(payload_addr(&*payload)));
            resume_unwind(payload);
        }
    }

    fn subscribe_listener(&self, listener: Listener) -> Unsubscribe {
        let id = {
            let mut state = self.inner.borrow_mut();
            let id = state.next_id;
            let Some(next) = state.next_mut() else {
                trace!("subscribe on cleared listener set absorbed");
                return Unsubscribe::noop();
            };
            next.push(Entry { id, listener });
            state.next_id += 1;
            id
        };

        let weak = Rc::downgrade(&self.inner);
        Unsubscribe::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let mut state = inner.borrow_mut();
            if state.current.is_none() {
                return;
            }
            if let Some(next) = state.next_mut()
                && let Some(pos) = next.iter().position(|entry| entry.id == id)
            {
                next.remove(pos);
            }
        })
    }

    fn clear(&self) {
        let mut state = self.inner.borrow_mut();
        state.current = None;
        state.next = None;
    }

    fn get(&self) -> Vec<Listener> {
        self.inner.borrow().next.as_ref().map_or_else(Vec::new, |next| {
            next.iter().map(|entry| Rc::clone(&entry.listener)).collect()
        })
    }

    fn len(&self) -> usize {
        self.inner.borrow().next.as_ref().map_or(0, |next| next.len())
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
