//! Named accessors bound to a live store.
//!
//! Hosts that expose store values under their own names (view models,
//! template contexts) can build the accessors once and call them whenever they
//! need the current value.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::error::StoreResult;
use crate::store::Store;

/// Reads one value from the live store.
pub type Accessor = Box<dyn Fn() -> Option<Value>>;

/// Commits one mutation with the given payload.
pub type Committer = Box<dyn Fn(Value) -> StoreResult<()>>;

/// One accessor per root state key, re-reading `state[key]` on every call.
pub fn map_state(store: &Store, keys: &[&str]) -> BTreeMap<String, Accessor> {
    keys.iter()
        .map(|key| {
            let store = store.clone();
            let field = key.to_string();
            let accessor: Accessor = Box::new(move || store.state().get(&[field.as_str()]));
            (key.to_string(), accessor)
        })
        .collect()
}

/// One accessor per qualified getter key.
///
/// Accessors are named by the part after the last `/`, so `a/total` is
/// exposed as `total`. When two keys share a local name the later key wins
/// and the collision is logged.
pub fn map_getters(store: &Store, keys: &[&str]) -> BTreeMap<String, Accessor> {
    let mut mapped = BTreeMap::new();
    for key in keys {
        let store = store.clone();
        let qualified = key.to_string();
        let accessor: Accessor = Box::new(move || store.getters().get(&qualified));
        insert_local(&mut mapped, key, accessor);
    }
    mapped
}

/// One committer per qualified mutation type, named like [`map_getters`].
pub fn map_mutations(store: &Store, kinds: &[&str]) -> BTreeMap<String, Committer> {
    let mut mapped = BTreeMap::new();
    for kind in kinds {
        let store = store.clone();
        let qualified = kind.to_string();
        let committer: Committer = Box::new(move |payload| store.commit(&qualified, payload));
        insert_local(&mut mapped, kind, committer);
    }
    mapped
}

fn insert_local<T>(mapped: &mut BTreeMap<String, T>, qualified: &str, value: T) {
    let name = local_name(qualified);
    if mapped.insert(name.to_string(), value).is_some() {
        warn!(local = name, qualified, "mapped name already taken; later key wins");
    }
}

fn local_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreOptions;
    use crate::module::Module;
    use crate::test_support::counter_module;
    use serde_json::json;

    #[test]
    fn state_accessors_track_later_commits() {
        let store = Store::new(StoreOptions::new(counter_module())).expect("store");
        let mapped = map_state(&store, &["age", "missing"]);

        store.commit("add", json!(5)).expect("commit");

        assert_eq!(mapped["age"](), Some(json!(15)));
        assert_eq!(mapped["missing"](), None);
    }

    #[test]
    fn colliding_local_names_keep_the_later_key() {
        let root = Module::new()
            .module("a", counter_module().namespaced(true))
            .module("b", counter_module().namespaced(true));
        let store = Store::new(StoreOptions::new(root)).expect("store");
        let mutations = map_mutations(&store, &["a/add", "b/add"]);

        assert_eq!(mutations.len(), 1);
        mutations["add"](json!(1)).expect("commit");

        assert_eq!(store.state().get(&["a", "age"]), Some(json!(10)));
        assert_eq!(store.state().get(&["b", "age"]), Some(json!(11)));
    }

    #[test]
    fn namespaced_helpers_use_local_names() {
        let root = Module::new().module("a", counter_module().namespaced(true));
        let store = Store::new(StoreOptions::new(root)).expect("store");
        let getters = map_getters(&store, &["a/doubled"]);
        let mutations = map_mutations(&store, &["a/add"]);

        mutations["add"](json!(1)).expect("commit");

        assert_eq!(getters["doubled"](), Some(json!(22)));
    }
}
