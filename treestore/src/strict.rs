//! Strict-mode guard: reports state writes made outside `commit`.
//!
//! The guard is a deep, synchronous watcher over the whole state document.
//! Each observed change checks the store's committing flag; a change seen
//! while the flag is down bypassed the mutation path. The guard only reports,
//! it never rolls the write back.
//!
//! The flag is a plain `Cell<bool>`: correct only because the store is
//! single-threaded and mutations cannot suspend. A multi-threaded store would
//! need a per-execution-context marker instead.

use std::cell::Cell;
use std::rc::Rc;

use serde_json::Value;
use tracing::error;

use crate::core::types::{StrictMode, WatchOptions};
use crate::reactive::{Reactivity, WatchId};

pub const VIOLATION_MESSAGE: &str = "do not mutate store state outside mutation handlers";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuardState {
    Inactive,
    Active(WatchId),
}

/// Tracks whether the guard is attached and how many violations it saw.
#[derive(Debug)]
pub struct StrictGuard {
    state: GuardState,
    violations: Rc<Cell<u64>>,
}

impl Default for StrictGuard {
    fn default() -> Self {
        Self {
            state: GuardState::Inactive,
            violations: Rc::new(Cell::new(0)),
        }
    }
}

impl StrictGuard {
    /// Attach the guard's watcher to `state`.
    ///
    /// Activation happens at most once; returns false if the guard was already
    /// active or `mode` is [`StrictMode::Off`].
    pub fn activate<R: Reactivity>(
        &mut self,
        state: &R,
        committing: Rc<Cell<bool>>,
        mode: StrictMode,
    ) -> bool {
        if !mode.is_enabled() || self.is_active() {
            return false;
        }
        let violations = Rc::clone(&self.violations);
        let id = state.watch(
            Rc::new(|root: &Value| root.clone()),
            Rc::new(move |_: &Value, _: &Value| {
                if committing.get() {
                    return;
                }
                violations.set(violations.get() + 1);
                error!(violations = violations.get(), "{VIOLATION_MESSAGE}");
                if mode == StrictMode::Panic {
                    panic!("{VIOLATION_MESSAGE}");
                }
            }),
            WatchOptions::deep_sync(),
        );
        self.state = GuardState::Active(id);
        true
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, GuardState::Active(_))
    }

    /// Number of writes observed outside a committing window.
    pub fn violations(&self) -> u64 {
        self.violations.get()
    }
}
