#![forbid(unsafe_code)]

//! Batching executor that defers side effects to the outermost batch exit.
//!
//! [`DeferredBatch`] produces a [`Batch`] executor. Work run through it
//! executes immediately, but effects queued with
//! [`DeferredBatch::defer`] while any batch is open are held back and run
//! once, in queue order, when the outermost batch returns. Effects queued
//! while no batch is open run immediately.
//!
//! This is the coalescing behaviour a UI layer wants from a notification
//! pass: every listener in the pass (and every nested pass it triggers)
//! records what it needs to do, and the effects land together afterwards.
//!
//! # Invariants
//!
//! 1. Work passed to the executor runs exactly once, synchronously.
//! 2. Nested batches flush only when the outermost one exits.
//! 3. Effects run in the order they were queued. The flush runs at depth
//!    zero, so an effect deferring another effect runs it inline.
//! 4. If work unwinds, the depth is still restored; queued effects are kept
//!    for the next outermost exit rather than run during unwinding.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use tracing::trace;
use treecast_core::Batch;

type Effect = Box<dyn FnOnce()>;

#[derive(Default)]
struct DeferredState {
    depth: Cell<usize>,
    queue: RefCell<VecDeque<Effect>>,
    flushes: Cell<u64>,
}

impl DeferredState {
    fn flush(&self) {
        let mut ran = 0usize;
        loop {
            let effect = self.queue.borrow_mut().pop_front();
            let Some(effect) = effect else { break };
            effect();
            ran += 1;
        }
        if ran > 0 {
            self.flushes.set(self.flushes.get() + 1);
            trace!(effects = ran, "deferred batch flushed");
        }
    }
}

struct DepthGuard<'a> {
    state: &'a DeferredState,
}

impl<'a> DepthGuard<'a> {
    fn enter(state: &'a DeferredState) -> Self {
        state.depth.set(state.depth.get() + 1);
        Self { state }
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        let depth = self.state.depth.get() - 1;
        self.state.depth.set(depth);
        if depth == 0 && !std::thread::panicking() {
            self.state.flush();
        }
    }
}

/// Effect-deferring batch executor.
///
/// Cloning shares the same queue.
#[derive(Clone, Default)]
pub struct DeferredBatch {
    state: Rc<DeferredState>,
}

impl fmt::Debug for DeferredBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredBatch")
            .field("depth", &self.state.depth.get())
            .field("pending", &self.pending())
            .field("flushes", &self.state.flushes.get())
            .finish()
    }
}

impl DeferredBatch {
    /// Create an executor with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The [`Batch`] handle to install on nodes or listener sets.
    #[must_use]
    pub fn executor(&self) -> Batch {
        let state = Rc::clone(&self.state);
        Batch::new("deferred", move |work| {
            let _guard = DepthGuard::enter(&state);
            work();
        })
    }

    /// Queue `effect` until the outermost batch exits, or run it now when
    /// no batch is open.
    pub fn defer(&self, effect: impl FnOnce() + 'static) {
        if self.state.depth.get() == 0 {
            effect();
        } else {
            self.state.queue.borrow_mut().push_back(Box::new(effect));
        }
    }

    /// Run `work` inside a batch without going through a listener set.
    pub fn batch(&self, work: impl FnOnce()) {
        let mut work = Some(work);
        self.executor().run(&mut || {
            if let Some(work) = work.take() {
                work();
            }
        });
    }

    /// Whether a batch is currently open.
    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.state.depth.get() > 0
    }

    /// Effects waiting for the outermost batch to exit.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.queue.borrow().len()
    }

    /// Number of flushes that ran at least one effect.
    #[must_use]
    pub fn flush_count(&self) -> u64 {
        self.state.flushes.get()
    }
}
