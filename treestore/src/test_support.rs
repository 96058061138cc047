//! Test-only helpers for constructing module trees and observing stores.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::anyhow;
use serde_json::{Value, json};

use crate::core::types::MutationDescriptor;
use crate::module::Module;
use crate::store::Store;

/// Delay used by the counter module's `asyncAdd` action.
pub const ASYNC_ADD_DELAY: Duration = Duration::from_millis(2000);

/// Add a numeric payload to `state.age`.
pub fn add_age(state: &mut Value, payload: &Value) -> anyhow::Result<()> {
    let age = state["age"]
        .as_i64()
        .ok_or_else(|| anyhow!("age must be an integer"))?;
    let delta = payload
        .as_i64()
        .ok_or_else(|| anyhow!("payload must be an integer"))?;
    state["age"] = json!(age + delta);
    Ok(())
}

/// State `{age: 10}` with mutation `add`, getter `doubled`, and action
/// `asyncAdd` committing `add` after [`ASYNC_ADD_DELAY`].
///
/// `asyncAdd` commits the unqualified `add`, so it is only meaningful on a
/// non-namespaced module.
pub fn counter_module() -> Module {
    Module::new()
        .state_fn(|| json!({"age": 10}))
        .mutation("add", add_age)
        .getter("doubled", |state| json!(state["age"].as_i64().unwrap_or(0) * 2))
        .async_action("asyncAdd", |store, payload| async move {
            tokio::time::sleep(ASYNC_ADD_DELAY).await;
            store.commit("add", payload)?;
            Ok::<(), anyhow::Error>(())
        })
}

/// A module contributing only `state.name = "name-<key>"`.
pub fn named(key: &str) -> Module {
    Module::new().state(json!({ "name": format!("name-{key}") }))
}

/// Root with the chain `a -> a1 -> a11`, each contributing only a name.
pub fn nested_modules() -> Module {
    named("root").module("a", named("a").module("a1", named("a1").module("a11", named("a11"))))
}

/// Records every mutation delivered to a store's subscriber slot.
#[derive(Clone, Default)]
pub struct SubscriberLog {
    entries: Rc<RefCell<Vec<(MutationDescriptor, Value)>>>,
}

impl SubscriberLog {
    /// Subscribe a fresh log to `store`, replacing any previous subscriber.
    pub fn attach(store: &Store) -> Self {
        let log = Self::default();
        let sink = Rc::clone(&log.entries);
        store.subscribe(move |mutation, state| {
            sink.borrow_mut().push((mutation.clone(), state.snapshot()));
        });
        log
    }

    /// Mutation types in delivery order.
    pub fn kinds(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .map(|(mutation, _)| mutation.kind.clone())
            .collect()
    }

    /// `(mutation, state after the handler)` pairs in delivery order.
    pub fn entries(&self) -> Vec<(MutationDescriptor, Value)> {
        self.entries.borrow().clone()
    }
}

/// Write `contents` to `treestore.toml` in a fresh temp dir.
///
/// Keep the returned `TempDir` alive for as long as the path is used.
pub fn write_config_file(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("treestore.toml");
    std::fs::write(&path, contents).expect("write config");
    (dir, path)
}
