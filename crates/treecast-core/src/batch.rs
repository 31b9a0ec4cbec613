#![forbid(unsafe_code)]

//! Batching executor handle.
//!
//! A [`Batch`] wraps a function `batch(work)` that must run `work`
//! synchronously and exactly once, but may coalesce externally visible side
//! effects produced inside `work` until it returns. Listener sets run each
//! notification pass inside one call to their batch.
//!
//! A thread-local default executor ([`set_batch`] / [`get_batch`]) is read
//! when a root node is constructed without an explicit executor.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type BatchFn = dyn Fn(&mut dyn FnMut());

/// Shared handle to a batching executor.
///
/// Cloning shares the same executor.
#[derive(Clone)]
pub struct Batch {
    run: Rc<BatchFn>,
    name: &'static str,
}

impl Batch {
    /// Executor that simply runs the work.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            run: Rc::new(|work: &mut dyn FnMut()| work()),
            name: "immediate",
        }
    }

    /// Wrap a custom executor.
    ///
    /// The executor must call the work closure exactly once before
    /// returning. Debug builds assert this.
    pub fn new(name: &'static str, run: impl Fn(&mut dyn FnMut()) + 'static) -> Self {
        Self {
            run: Rc::new(run),
            name,
        }
    }

    /// Executor name, for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run `work` through the executor.
    pub fn run(&self, work: &mut dyn FnMut()) {
        let mut calls = 0u32;
        (self.run)(&mut || {
            calls += 1;
            if calls == 1 {
                work();
            }
        });
        debug_assert_eq!(
            calls, 1,
            "batch executor `{}` must run work exactly once",
            self.name
        );
    }
}

impl Default for Batch {
    fn default() -> Self {
        Self::immediate()
    }
}

impl fmt::Debug for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch").field("name", &self.name).finish()
    }
}

thread_local! {
    static DEFAULT_BATCH: RefCell<Batch> = RefCell::new(Batch::immediate());
}

/// Install the default executor for this thread.
pub fn set_batch(batch: Batch) {
    DEFAULT_BATCH.with(|slot| *slot.borrow_mut() = batch);
}

/// Current default executor for this thread.
#[must_use]
pub fn get_batch() -> Batch {
    DEFAULT_BATCH.with(|slot| slot.borrow().clone())
}
