//! Recursive module installation.
//!
//! Installing a module at `path` grafts its state into the store's document
//! at the same path and flattens its handlers into the store's registries
//! under namespace-qualified keys, then does the same for each child.

use serde_json::Value;
use tracing::{debug, warn};

use crate::core::namespace::{NamespaceNode, namespace_prefix, qualify};
use crate::core::path::{display_path, split_last};
use crate::error::{StoreError, StoreResult};
use crate::module::{ActionHandler, GetterHandler, Module, MutationHandler};
use crate::reactive::Reactivity;
use crate::registry::{ActionEntry, GetterEntry, MutationEntry};
use crate::store::Store;

/// A module whose state has been produced and whose subtree has been
/// checked, ready to be applied without structural failures.
struct Prepared {
    state: Value,
    namespaced: bool,
    mutations: Vec<(String, MutationHandler)>,
    actions: Vec<(String, ActionHandler)>,
    getters: Vec<(String, GetterHandler)>,
    children: Vec<(String, Prepared)>,
}

/// Install `module` (and its subtree) into `store` at `path`.
///
/// The empty path installs the root: its state becomes the document root.
/// For any other path the parent module must already be installed and its
/// state must be an object; nothing is created on the way. The whole subtree
/// is checked before the store is touched, so a rejected module leaves no
/// trace.
pub(crate) fn install(store: &Store, module: Module, path: &[String]) -> StoreResult<()> {
    check_target(store, path)?;
    let prepared = prepare(module, path)?;
    apply(store, prepared, path)
}

/// Produce every module's state and reject subtrees whose children would
/// land under non-object state.
fn prepare(module: Module, path: &[String]) -> StoreResult<Prepared> {
    let Module {
        state,
        namespaced,
        mutations,
        actions,
        getters,
        modules,
    } = module;
    let state = state.produce();

    let mut children = Vec::with_capacity(modules.len());
    for (key, child) in modules {
        let mut child_path = path.to_vec();
        child_path.push(key.clone());
        if !state.is_object() {
            return Err(StoreError::invalid_registration(
                display_path(&child_path),
                display_path(path),
            ));
        }
        children.push((key, prepare(child, &child_path)?));
    }

    Ok(Prepared {
        state,
        namespaced,
        mutations,
        actions,
        getters,
        children,
    })
}

fn apply(store: &Store, module: Prepared, path: &[String]) -> StoreResult<()> {
    let Prepared {
        state,
        namespaced,
        mutations,
        actions,
        getters,
        children,
    } = module;

    let prefix = {
        let mut namespaces = store.inner().namespaces.borrow_mut();
        match split_last(path) {
            None => *namespaces = NamespaceNode::new(namespaced),
            Some((parent, key)) => {
                let parent_node = namespaces.find_mut(parent).ok_or_else(|| {
                    StoreError::invalid_registration(display_path(path), display_path(parent))
                })?;
                parent_node
                    .children
                    .insert(key.to_string(), NamespaceNode::new(namespaced));
            }
        }
        namespace_prefix(&namespaces, path).ok_or_else(|| {
            StoreError::invalid_registration(display_path(path), display_path(path))
        })?
    };

    graft_state(store, path, state)?;

    let module_label = display_path(path);
    {
        let mut registry = store.inner().registry.borrow_mut();
        for (name, handler) in mutations {
            let kind = qualify(&prefix, &name);
            debug!(mutation = %kind, module = %module_label, "registered mutation");
            registry.add_mutation(
                kind,
                MutationEntry {
                    owner: path.to_vec(),
                    handler,
                },
            );
        }
        for (name, handler) in actions {
            let kind = qualify(&prefix, &name);
            debug!(action = %kind, module = %module_label, "registered action");
            registry.add_action(
                kind,
                ActionEntry {
                    owner: path.to_vec(),
                    handler,
                },
            );
        }
        for (name, handler) in getters {
            let key = qualify(&prefix, &name);
            let replaced = registry.set_getter(
                key.clone(),
                GetterEntry {
                    owner: path.to_vec(),
                    handler,
                },
            );
            if replaced.is_some() {
                debug!(getter = %key, module = %module_label, "getter overwritten by later module");
            }
        }
    }

    for (key, child) in children {
        let mut child_path = path.to_vec();
        child_path.push(key);
        apply(store, child, &child_path)?;
    }
    Ok(())
}

/// Reject a target whose parent is missing or whose path is already claimed.
fn check_target(store: &Store, path: &[String]) -> StoreResult<()> {
    let Some((parent, key)) = split_last(path) else {
        return Ok(());
    };
    let module_path = display_path(path);
    let parent_path = display_path(parent);

    {
        let namespaces = store.inner().namespaces.borrow();
        let parent_node = namespaces
            .find(parent)
            .ok_or_else(|| StoreError::invalid_registration(&module_path, &parent_path))?;
        if parent_node.children.contains_key(key) {
            return Err(StoreError::ModuleAlreadyInstalled { path: module_path });
        }
    }

    let parent_is_object = store.state().read(parent, Value::is_object);
    if parent_is_object == Some(true) {
        Ok(())
    } else {
        Err(StoreError::invalid_registration(module_path, parent_path))
    }
}

fn graft_state(store: &Store, path: &[String], state: Value) -> StoreResult<()> {
    match split_last(path) {
        None => {
            store.state().wrap(state);
            Ok(())
        }
        Some((parent, key)) => {
            let shadowed = store
                .state()
                .read(parent, |node| node.get(key).is_some())
                .unwrap_or(false);
            if shadowed {
                warn!(module = %display_path(path), "state field overridden by module with the same name");
            }
            store.with_commit(|| store.state().set_tracked(parent, key, state))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::StoreOptions;
    use crate::error::StoreError;
    use crate::module::Module;
    use crate::store::Store;
    use serde_json::json;

    fn touch() -> Module {
        Module::new().mutation("touch", |state, _| {
            state["touched"] = json!(true);
            Ok(())
        })
    }

    #[test]
    fn nested_state_mirrors_module_tree() {
        let root = Module::new().state(json!({"name": "root"})).module(
            "a",
            Module::new().state(json!({"name": "a"})).module(
                "a1",
                Module::new()
                    .state(json!({"name": "a1"}))
                    .module("a11", Module::new().state(json!({"name": "name-a11"}))),
            ),
        );
        let store = Store::new(StoreOptions::new(root)).expect("store");
        assert_eq!(
            store.state().snapshot(),
            json!({
                "name": "root",
                "a": {"name": "a", "a1": {"name": "a1", "a11": {"name": "name-a11"}}}
            })
        );
    }

    #[test]
    fn prefixes_follow_namespaced_ancestors_only() {
        let root = Module::new().module(
            "a",
            touch().namespaced(true).module(
                "plain",
                touch().module("b", touch().namespaced(true)),
            ),
        );
        let store = Store::new(StoreOptions::new(root)).expect("store");
        assert_eq!(
            store.mutation_types(),
            vec!["a/b/touch".to_string(), "a/touch".to_string()]
        );
        // "a/touch" is claimed by both `a` and the plain child.
        store.commit("a/touch", json!(null)).expect("commit");
        assert_eq!(store.state().get(&["a", "touched"]), Some(json!(true)));
        assert_eq!(store.state().get(&["a", "plain", "touched"]), Some(json!(true)));
    }

    #[test]
    fn child_of_scalar_state_is_rejected() {
        let root = Module::new()
            .state(json!({}))
            .module("a", Module::new().state(json!(5)).module("b", Module::new()));
        let err = Store::new(StoreOptions::new(root)).expect_err("scalar parent");
        assert!(matches!(err, StoreError::InvalidRegistrationPath { .. }));
    }

    #[test]
    fn rejected_subtree_leaves_store_untouched() {
        let store = Store::new(StoreOptions::new(Module::new())).expect("store");
        let before = store.state().snapshot();
        let broken = || {
            touch()
                .state(json!({"ok": 1}))
                .module("d", Module::new().state(json!(5)).module("e", Module::new()))
        };

        let err = store.register_module(&["c"], broken()).expect_err("scalar parent");

        assert!(matches!(err, StoreError::InvalidRegistrationPath { ref path, .. } if path == "c/d/e"));
        assert_eq!(store.state().snapshot(), before);
        assert!(store.mutation_types().is_empty());
        assert!(!store.has_module(&["c"]));

        store
            .register_module(&["c"], touch().state(json!({"ok": 1})))
            .expect("retry at the same path");
        assert_eq!(store.state().get(&["c", "ok"]), Some(json!(1)));
    }

    #[test]
    fn module_overrides_plain_state_field() {
        let root = Module::new()
            .state(json!({"a": "plain"}))
            .module("a", Module::new().state(json!({"n": 1})));
        let store = Store::new(StoreOptions::new(root)).expect("store");
        assert_eq!(store.state().get(&["a"]), Some(json!({"n": 1})));
    }
}
