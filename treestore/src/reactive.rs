//! The reactive primitive the store is written against.
//!
//! The store needs three capabilities from its reactivity layer, captured by
//! [`Reactivity`]: make a document the reactive root, add a new *tracked* key
//! under an existing node, and watch a selected value for changes.
//! [`ReactiveTree`] implements them over a `serde_json::Value` document.
//!
//! # Tracking
//!
//! Every node present when the document is wrapped is tracked, as is every
//! node added through [`Reactivity::set_tracked`]. A key added by plain
//! assignment ([`ReactiveTree::set`] on a key that did not exist) is stored but
//! stays untracked: writes to it, or below it, do not notify watchers.
//! Tracking is keyed by path, so removing and re-adding a tracked key keeps
//! it tracked.
//!
//! The tree is single-threaded (`Rc`); clones share the same document.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::core::path::{collect_paths, display_path, split_last, to_path, walk, walk_mut};
use crate::core::types::WatchOptions;
use crate::error::{StoreError, StoreResult};

/// Derives the watched value from the whole document.
pub type Selector = Rc<dyn Fn(&Value) -> Value>;

/// Receives `(new, old)` selected values.
pub type WatchCallback = Rc<dyn Fn(&Value, &Value)>;

/// Handle returned by [`Reactivity::watch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

/// The capability set the store requires from a reactive document.
pub trait Reactivity {
    /// Make `value` the reactive root, tracking every node it contains.
    fn wrap(&self, value: Value);

    /// Attach `value` at `parent.key` as a tracked node and notify watchers.
    ///
    /// `parent` must already exist and be an object.
    fn set_tracked(&self, parent: &[String], key: &str, value: Value) -> StoreResult<()>;

    /// Observe `selector(document)`, calling `callback(new, old)` when it changes.
    fn watch(&self, selector: Selector, callback: WatchCallback, options: WatchOptions) -> WatchId;
}

struct Watcher {
    id: WatchId,
    selector: Selector,
    callback: WatchCallback,
    options: WatchOptions,
    last: RefCell<Value>,
}

#[derive(Default)]
struct TreeInner {
    root: RefCell<Value>,
    tracked: RefCell<HashSet<Vec<String>>>,
    watchers: RefCell<Vec<Rc<Watcher>>>,
    pending: RefCell<Vec<WatchId>>,
    next_id: Cell<u64>,
}

/// A reactive JSON document.
#[derive(Clone, Default)]
pub struct ReactiveTree {
    inner: Rc<TreeInner>,
}

impl ReactiveTree {
    /// Create a tree whose root is `value`, fully tracked.
    pub fn new(value: Value) -> Self {
        let tree = Self::default();
        tree.wrap(value);
        tree
    }

    /// Clone the whole document.
    pub fn snapshot(&self) -> Value {
        self.inner.root.borrow().clone()
    }

    /// Clone the node at `path`, if present.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<Value> {
        walk(&self.inner.root.borrow(), path).cloned()
    }

    /// Read the node at `path` without cloning it.
    pub fn read<S: AsRef<str>, R>(&self, path: &[S], f: impl FnOnce(&Value) -> R) -> Option<R> {
        let root = self.inner.root.borrow();
        walk(&root, path).map(f)
    }

    /// Whether writes at `path` notify watchers.
    pub fn is_tracked<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.inner.tracked.borrow().contains(&to_path(path))
    }

    /// Plain assignment of `value` at `path`.
    ///
    /// Replacing an existing tracked node tracks the whole new value and
    /// notifies watchers. Adding a key that did not exist stores it untracked
    /// and notifies nobody; use [`Reactivity::set_tracked`] to add observable
    /// keys.
    pub fn set<S: AsRef<str>>(&self, path: &[S], value: Value) -> StoreResult<()> {
        let (parent, key) = split_last(path).ok_or(StoreError::RootAssignment)?;
        let path = to_path(path);
        let tracked = self.is_tracked(&path);
        let existed = {
            let mut root = self.inner.root.borrow_mut();
            let node = walk_mut(&mut root, parent)
                .ok_or_else(|| StoreError::state_path_not_found(display_path(parent)))?;
            let map = node
                .as_object_mut()
                .ok_or_else(|| StoreError::not_an_object(display_path(parent)))?;
            let existed = map.contains_key(key);
            if existed && tracked {
                self.track_subtree(&path, &value);
            }
            map.insert(key.to_string(), value);
            existed
        };
        if existed && tracked {
            self.notify();
        }
        Ok(())
    }

    /// Mutate the node at `path` in place.
    ///
    /// When the node is tracked, everything below it after `f` returns is
    /// tracked too, and watchers are notified. Writes under an untracked node
    /// stay unobserved.
    pub fn update<S: AsRef<str>, R>(
        &self,
        path: &[S],
        f: impl FnOnce(&mut Value) -> R,
    ) -> StoreResult<R> {
        let path = to_path(path);
        let tracked = self.is_tracked(&path);
        let result = {
            let mut root = self.inner.root.borrow_mut();
            let node = walk_mut(&mut root, &path)
                .ok_or_else(|| StoreError::state_path_not_found(display_path(&path)))?;
            let result = f(node);
            if tracked {
                self.track_subtree(&path, node);
            }
            result
        };
        if tracked {
            self.notify();
        }
        Ok(result)
    }

    /// Stop a watcher. Returns false if it was not registered.
    pub fn unwatch(&self, id: WatchId) -> bool {
        let mut watchers = self.inner.watchers.borrow_mut();
        let before = watchers.len();
        watchers.retain(|w| w.id != id);
        self.inner.pending.borrow_mut().retain(|pending| *pending != id);
        watchers.len() != before
    }

    /// Run every queued non-sync watcher once.
    pub fn flush(&self) {
        let pending: Vec<WatchId> = self.inner.pending.borrow_mut().drain(..).collect();
        for id in pending {
            let watcher = self
                .inner
                .watchers
                .borrow()
                .iter()
                .find(|w| w.id == id)
                .cloned();
            if let Some(watcher) = watcher {
                self.run_watcher(&watcher);
            }
        }
    }

    fn track_subtree(&self, base: &[String], value: &Value) {
        let mut paths = Vec::new();
        collect_paths(base, value, &mut paths);
        self.inner.tracked.borrow_mut().extend(paths);
    }

    fn notify(&self) {
        let watchers: Vec<Rc<Watcher>> = self.inner.watchers.borrow().clone();
        for watcher in watchers {
            if watcher.options.sync {
                self.run_watcher(&watcher);
            } else {
                let mut pending = self.inner.pending.borrow_mut();
                if !pending.contains(&watcher.id) {
                    pending.push(watcher.id);
                }
            }
        }
    }

    fn run_watcher(&self, watcher: &Watcher) {
        let next = (watcher.selector)(&self.inner.root.borrow());
        let changed = {
            let last = watcher.last.borrow();
            if watcher.options.deep {
                *last != next
            } else {
                !shallow_eq(&last, &next)
            }
        };
        if !changed {
            return;
        }
        let previous = watcher.last.replace(next.clone());
        (watcher.callback)(&next, &previous);
    }
}

impl Reactivity for ReactiveTree {
    fn wrap(&self, value: Value) {
        let mut tracked = HashSet::new();
        let mut paths = Vec::new();
        collect_paths(&[], &value, &mut paths);
        tracked.extend(paths);
        *self.inner.tracked.borrow_mut() = tracked;
        *self.inner.root.borrow_mut() = value;
    }

    fn set_tracked(&self, parent: &[String], key: &str, value: Value) -> StoreResult<()> {
        let mut child_path = parent.to_vec();
        child_path.push(key.to_string());
        let tracked_parent = self.is_tracked(parent);
        {
            let mut root = self.inner.root.borrow_mut();
            let node = walk_mut(&mut root, parent)
                .ok_or_else(|| StoreError::state_path_not_found(display_path(parent)))?;
            let map = node
                .as_object_mut()
                .ok_or_else(|| StoreError::not_an_object(display_path(parent)))?;
            if tracked_parent {
                self.track_subtree(&child_path, &value);
            }
            map.insert(key.to_string(), value);
        }
        // Adding to an untracked parent degrades to plain assignment.
        if tracked_parent {
            self.notify();
        }
        Ok(())
    }

    fn watch(&self, selector: Selector, callback: WatchCallback, options: WatchOptions) -> WatchId {
        let id = WatchId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        let initial = selector(&self.inner.root.borrow());
        self.inner.watchers.borrow_mut().push(Rc::new(Watcher {
            id,
            selector,
            callback,
            options,
            last: RefCell::new(initial),
        }));
        id
    }
}

impl fmt::Debug for ReactiveTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveTree")
            .field("root", &self.inner.root.borrow())
            .field("watchers", &self.inner.watchers.borrow().len())
            .finish()
    }
}

/// Top-level equality: scalars by value, containers by kind and keys/length
/// (plus equality of any scalar members).
fn shallow_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left.iter().all(|(key, lv)| {
                    right
                        .get(key)
                        .is_some_and(|rv| same_kind_or_scalar_eq(lv, rv))
                })
        }
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right)
                    .all(|(lv, rv)| same_kind_or_scalar_eq(lv, rv))
        }
        _ => a == b,
    }
}

fn same_kind_or_scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(_), Value::Object(_)) | (Value::Array(_), Value::Array(_)) => true,
        _ => a == b,
    }
}
