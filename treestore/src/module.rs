//! Declarative module specifications.
//!
//! A [`Module`] is a passive record: state (or a state factory), local
//! mutation/action/getter handlers, and child modules. It is consumed once by
//! the installer; nothing in the store keeps a reference to it afterwards.

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::store::Store;

/// Mutation handler: receives its module's state slice and the payload.
pub type MutationHandler = Rc<dyn Fn(&mut Value, &Value) -> anyhow::Result<()>>;

/// Action handler: receives the whole store so it can commit or dispatch
/// anywhere.
pub type ActionHandler = Rc<dyn Fn(&Store, &Value) -> anyhow::Result<()>>;

/// Getter handler: derives a value from its module's state slice.
pub type GetterHandler = Rc<dyn Fn(&Value) -> Value>;

/// Where a module's initial state comes from.
#[derive(Clone)]
pub enum StateSource {
    /// A fixed value, cloned each time the module is installed.
    Value(Value),
    /// A factory producing a fresh state object per installation.
    Factory(Rc<dyn Fn() -> Value>),
}

impl StateSource {
    pub fn produce(&self) -> Value {
        match self {
            StateSource::Value(value) => value.clone(),
            StateSource::Factory(factory) => factory(),
        }
    }
}

impl Default for StateSource {
    fn default() -> Self {
        StateSource::Value(Value::Object(Map::new()))
    }
}

/// One node of the composition tree.
#[derive(Clone, Default)]
pub struct Module {
    pub(crate) state: StateSource,
    pub(crate) namespaced: bool,
    pub(crate) mutations: Vec<(String, MutationHandler)>,
    pub(crate) actions: Vec<(String, ActionHandler)>,
    pub(crate) getters: Vec<(String, GetterHandler)>,
    pub(crate) modules: Vec<(String, Module)>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `state` as this module's initial state.
    pub fn state(mut self, state: Value) -> Self {
        self.state = StateSource::Value(state);
        self
    }

    /// Produce this module's initial state from a factory on every install.
    pub fn state_fn(mut self, factory: impl Fn() -> Value + 'static) -> Self {
        self.state = StateSource::Factory(Rc::new(factory));
        self
    }

    /// Qualify this module's handler names with its key.
    pub fn namespaced(mut self, namespaced: bool) -> Self {
        self.namespaced = namespaced;
        self
    }

    /// Add a mutation. A repeated name replaces the earlier handler.
    pub fn mutation(
        mut self,
        name: impl Into<String>,
        handler: impl Fn(&mut Value, &Value) -> anyhow::Result<()> + 'static,
    ) -> Self {
        upsert(&mut self.mutations, name.into(), Rc::new(handler));
        self
    }

    /// Add an action. A repeated name replaces the earlier handler.
    pub fn action(
        mut self,
        name: impl Into<String>,
        handler: impl Fn(&Store, &Value) -> anyhow::Result<()> + 'static,
    ) -> Self {
        upsert(&mut self.actions, name.into(), Rc::new(handler));
        self
    }

    /// Add an action whose body runs as a task on the current
    /// [`tokio::task::LocalSet`].
    ///
    /// Dispatch only spawns the task; it does not wait for it. Errors from the
    /// task are logged. Dispatching with no tokio runtime on the current
    /// thread fails with [`crate::StoreError::Action`]; dispatching inside a
    /// runtime but outside a `LocalSet` panics.
    pub fn async_action<F, Fut>(self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Store, Value) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        let name = name.into();
        let kind = name.clone();
        self.action(name, move |store, payload| {
            if tokio::runtime::Handle::try_current().is_err() {
                anyhow::bail!("async action needs a tokio runtime with a LocalSet");
            }
            let task = handler(store.clone(), payload.clone());
            let kind = kind.clone();
            tokio::task::spawn_local(async move {
                if let Err(err) = task.await {
                    tracing::error!(action = %kind, error = %format!("{err:#}"), "async action failed");
                }
            });
            Ok(())
        })
    }

    /// Add a getter. A repeated name replaces the earlier handler.
    pub fn getter(mut self, name: impl Into<String>, handler: impl Fn(&Value) -> Value + 'static) -> Self {
        upsert(&mut self.getters, name.into(), Rc::new(handler));
        self
    }

    /// Add a child module under `key`. A repeated key replaces the earlier child.
    pub fn module(mut self, key: impl Into<String>, child: Module) -> Self {
        upsert(&mut self.modules, key.into(), child);
        self
    }

    pub fn is_namespaced(&self) -> bool {
        self.namespaced
    }

    /// Child keys in declaration order.
    pub fn child_keys(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|(key, _)| key.as_str())
    }
}

fn upsert<T>(entries: &mut Vec<(String, T)>, name: String, value: T) {
    match entries.iter_mut().find(|(existing, _)| *existing == name) {
        Some(slot) => slot.1 = value,
        None => entries.push((name, value)),
    }
}

fn names<T>(entries: &[(String, T)]) -> Vec<&str> {
    entries.iter().map(|(name, _)| name.as_str()).collect()
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("namespaced", &self.namespaced)
            .field("mutations", &names(&self.mutations))
            .field("actions", &names(&self.actions))
            .field("getters", &names(&self.getters))
            .field("modules", &names(&self.modules))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_state_defaults_to_empty_object() {
        assert_eq!(Module::new().state.produce(), json!({}));
    }

    #[test]
    fn state_factory_produces_fresh_values() {
        let module = Module::new().state_fn(|| json!({"items": []}));
        let mut first = module.state.produce();
        first["items"] = json!([1]);
        assert_eq!(module.state.produce(), json!({"items": []}));
    }

    #[test]
    fn repeated_local_names_replace_in_place() {
        let module = Module::new()
            .mutation("a", |_, _| Ok(()))
            .mutation("b", |_, _| Ok(()))
            .mutation("a", |_, _| Ok(()));
        assert_eq!(names(&module.mutations), vec!["a", "b"]);
    }

    #[test]
    fn async_action_without_runtime_is_an_error() {
        use crate::{Store, StoreError, StoreOptions};

        let root =
            Module::new().async_action("later", |_, _| async { Ok::<(), anyhow::Error>(()) });
        let store = Store::new(StoreOptions::new(root)).expect("store");

        let err = store.dispatch("later", json!(null)).expect_err("no runtime");
        assert!(matches!(err, StoreError::Action { ref kind, .. } if kind == "later"));
    }

    #[test]
    fn children_keep_declaration_order() {
        let module = Module::new()
            .module("z", Module::new())
            .module("a", Module::new());
        assert_eq!(module.child_keys().collect::<Vec<_>>(), vec!["z", "a"]);
    }
}
