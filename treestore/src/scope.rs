//! Store propagation down a host's component tree.
//!
//! A host creating a dependent unit (a component, a request handler, a
//! sub-task) asks its scope which store applies. A store given explicitly to
//! the unit wins; otherwise the nearest ancestor's store is inherited.

use crate::store::Store;

#[derive(Clone, Debug, Default)]
pub struct StoreScope {
    store: Option<Store>,
}

impl StoreScope {
    /// A top-level scope holding `store`.
    pub fn root(store: Store) -> Self {
        Self { store: Some(store) }
    }

    /// A top-level scope with no store.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Scope for a child unit: `explicit` if given, else this scope's store.
    pub fn child(&self, explicit: Option<Store>) -> Self {
        Self {
            store: explicit.or_else(|| self.store.clone()),
        }
    }

    pub fn store(&self) -> Option<&Store> {
        self.store.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreOptions;
    use crate::module::Module;
    use serde_json::json;

    fn store_with(name: &str) -> Store {
        Store::new(StoreOptions::new(Module::new().state(json!({"name": name})))).expect("store")
    }

    fn name(scope: &StoreScope) -> Option<serde_json::Value> {
        scope.store().and_then(|store| store.state().get(&["name"]))
    }

    #[test]
    fn children_inherit_the_nearest_store() {
        let root = StoreScope::root(store_with("app"));
        let grandchild = root.child(None).child(None);
        assert_eq!(name(&grandchild), Some(json!("app")));
    }

    #[test]
    fn explicit_store_wins_and_propagates() {
        let root = StoreScope::root(store_with("app"));
        let widget = root.child(Some(store_with("widget")));
        assert_eq!(name(&widget), Some(json!("widget")));
        assert_eq!(name(&widget.child(None)), Some(json!("widget")));
        assert_eq!(name(&root.child(None)), Some(json!("app")));
    }

    #[test]
    fn empty_scope_resolves_nothing() {
        assert!(StoreScope::empty().child(None).store().is_none());
    }
}
