//! Flattened handler registries.
//!
//! Each entry records which state slice it is bound to (`owner`, a module
//! path) next to the handler itself, so the slice a mutation may touch is data
//! rather than something captured inside a closure.

use std::collections::{BTreeMap, HashMap};

use crate::module::{ActionHandler, GetterHandler, MutationHandler};

#[derive(Clone)]
pub struct MutationEntry {
    /// Path of the module whose state the handler receives.
    pub owner: Vec<String>,
    pub handler: MutationHandler,
}

#[derive(Clone)]
pub struct ActionEntry {
    /// Path of the module that declared the action.
    pub owner: Vec<String>,
    pub handler: ActionHandler,
}

#[derive(Clone)]
pub struct GetterEntry {
    /// Path of the module whose state the getter reads.
    pub owner: Vec<String>,
    pub handler: GetterHandler,
}

/// The three qualified-key registries of a store.
#[derive(Default)]
pub struct Registry {
    mutations: HashMap<String, Vec<MutationEntry>>,
    actions: HashMap<String, Vec<ActionEntry>>,
    getters: BTreeMap<String, GetterEntry>,
}

impl Registry {
    pub fn add_mutation(&mut self, kind: String, entry: MutationEntry) {
        self.mutations.entry(kind).or_default().push(entry);
    }

    pub fn add_action(&mut self, kind: String, entry: ActionEntry) {
        self.actions.entry(kind).or_default().push(entry);
    }

    /// Insert a getter, returning the entry it replaced (if any).
    pub fn set_getter(&mut self, key: String, entry: GetterEntry) -> Option<GetterEntry> {
        self.getters.insert(key, entry)
    }

    /// Handlers registered for `kind`, in registration order.
    pub fn mutations(&self, kind: &str) -> Vec<MutationEntry> {
        self.mutations.get(kind).cloned().unwrap_or_default()
    }

    /// Handlers registered for `kind`, in registration order.
    pub fn actions(&self, kind: &str) -> Vec<ActionEntry> {
        self.actions.get(kind).cloned().unwrap_or_default()
    }

    pub fn getter(&self, key: &str) -> Option<GetterEntry> {
        self.getters.get(key).cloned()
    }

    /// Sorted mutation types.
    pub fn mutation_types(&self) -> Vec<String> {
        sorted_keys(self.mutations.keys())
    }

    /// Sorted action types.
    pub fn action_types(&self) -> Vec<String> {
        sorted_keys(self.actions.keys())
    }

    /// Sorted getter keys.
    pub fn getter_keys(&self) -> Vec<String> {
        self.getters.keys().cloned().collect()
    }
}

fn sorted_keys<'a>(keys: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut keys: Vec<String> = keys.cloned().collect();
    keys.sort();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::rc::Rc;

    fn getter(value: Value) -> GetterEntry {
        GetterEntry {
            owner: Vec::new(),
            handler: Rc::new(move |_: &Value| value.clone()),
        }
    }

    #[test]
    fn mutations_accumulate_in_registration_order() {
        let mut registry = Registry::default();
        for owner in ["first", "second"] {
            registry.add_mutation(
                "touch".to_string(),
                MutationEntry {
                    owner: vec![owner.to_string()],
                    handler: Rc::new(|_: &mut Value, _: &Value| -> anyhow::Result<()> { Ok(()) }),
                },
            );
        }

        let owners: Vec<Vec<String>> = registry
            .mutations("touch")
            .into_iter()
            .map(|entry| entry.owner)
            .collect();
        assert_eq!(owners, vec![vec!["first".to_string()], vec!["second".to_string()]]);
        assert!(registry.mutations("other").is_empty());
    }

    #[test]
    fn later_getter_overwrites_earlier() {
        let mut registry = Registry::default();
        assert!(registry.set_getter("total".to_string(), getter(json!(1))).is_none());
        assert!(registry.set_getter("total".to_string(), getter(json!(2))).is_some());

        let entry = registry.getter("total").expect("getter");
        assert_eq!((entry.handler)(&Value::Null), json!(2));
        assert_eq!(registry.getter_keys(), vec!["total".to_string()]);
    }
}
