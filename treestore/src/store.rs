//! The public store aggregate.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use crate::core::namespace::{NamespaceNode, namespace_prefix, qualify};
use crate::core::path::{display_path, to_path};
use crate::core::types::{MutationDescriptor, StrictMode, WatchOptions};
use crate::error::{StoreError, StoreResult};
use crate::installer;
use crate::io::config::StoreConfig;
use crate::module::Module;
use crate::plugins;
use crate::reactive::{ReactiveTree, Reactivity, WatchId};
use crate::registry::Registry;
use crate::strict::StrictGuard;

/// Called once after every executed mutation handler.
pub type Subscriber = Rc<dyn Fn(&MutationDescriptor, &ReactiveTree)>;

/// Called once with the fully constructed store.
pub type Plugin = Box<dyn FnOnce(&Store)>;

/// Construction options for [`Store::new`].
pub struct StoreOptions {
    root: Module,
    strict: StrictMode,
    plugins: Vec<Plugin>,
}

impl StoreOptions {
    pub fn new(root: Module) -> Self {
        Self {
            root,
            strict: StrictMode::Off,
            plugins: Vec::new(),
        }
    }

    /// Apply a loaded [`StoreConfig`]: strict mode, plus the mutation logger
    /// when `log_mutations` is set.
    pub fn from_config(root: Module, config: &StoreConfig) -> Self {
        let options = Self::new(root).strict(config.strict);
        if config.log_mutations {
            options.plugin(plugins::mutation_logger())
        } else {
            options
        }
    }

    pub fn strict(mut self, mode: StrictMode) -> Self {
        self.strict = mode;
        self
    }

    /// Register a plugin. Plugins run in registration order.
    pub fn plugin(mut self, plugin: impl FnOnce(&Store) + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }
}

pub(crate) struct StoreInner {
    pub(crate) state: ReactiveTree,
    pub(crate) registry: RefCell<Registry>,
    pub(crate) namespaces: RefCell<NamespaceNode>,
    committing: Rc<Cell<bool>>,
    subscriber: RefCell<Option<Subscriber>>,
    guard: RefCell<StrictGuard>,
    strict: StrictMode,
}

/// A reactive state container. Clones share the same store.
#[derive(Clone)]
pub struct Store {
    inner: Rc<StoreInner>,
}

/// Raises the committing flag for its lifetime, restoring the previous value
/// on drop (including on unwind).
struct CommitWindow<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> CommitWindow<'a> {
    fn open(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        Self { flag, previous }
    }
}

impl Drop for CommitWindow<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

impl Store {
    /// Build a store: install the root module tree, attach the strict-mode
    /// guard if requested, then run plugins.
    pub fn new(options: StoreOptions) -> StoreResult<Self> {
        let StoreOptions {
            root,
            strict,
            plugins,
        } = options;
        let store = Store {
            inner: Rc::new(StoreInner {
                state: ReactiveTree::default(),
                registry: RefCell::new(Registry::default()),
                namespaces: RefCell::new(NamespaceNode::default()),
                committing: Rc::new(Cell::new(false)),
                subscriber: RefCell::new(None),
                guard: RefCell::new(StrictGuard::default()),
                strict,
            }),
        };

        installer::install(&store, root, &[])?;

        // Installation must not trip the guard, so it attaches afterwards.
        if strict.is_enabled() {
            store.inner.guard.borrow_mut().activate(
                &store.inner.state,
                Rc::clone(&store.inner.committing),
                strict,
            );
        }

        for plugin in plugins {
            plugin(&store);
        }
        debug!(
            mutations = store.mutation_types().len(),
            actions = store.action_types().len(),
            getters = store.getter_keys().len(),
            strict = ?strict,
            "store constructed"
        );
        Ok(store)
    }

    pub(crate) fn inner(&self) -> &StoreInner {
        &self.inner
    }

    /// The live reactive state document.
    ///
    /// Reads are always current. Writes through this handle bypass `commit`
    /// and are reported in strict mode.
    pub fn state(&self) -> &ReactiveTree {
        &self.inner.state
    }

    /// Derived values, recomputed on every read.
    pub fn getters(&self) -> Getters<'_> {
        Getters { store: self }
    }

    /// Run every mutation registered under `kind`, in registration order.
    ///
    /// An unknown `kind` is ignored. Each handler runs in its own committing
    /// window and receives only its module's state slice; the subscriber, if
    /// any, is notified after each handler. The first failing handler aborts
    /// the rest.
    pub fn commit(&self, kind: &str, payload: Value) -> StoreResult<()> {
        let entries = self.inner.registry.borrow().mutations(kind);
        if entries.is_empty() {
            debug!(mutation = %kind, "unknown mutation type ignored");
            return Ok(());
        }
        for entry in entries {
            let _window = CommitWindow::open(&self.inner.committing);
            self.inner
                .state
                .update(&entry.owner, |slice| (entry.handler)(slice, &payload))?
                .map_err(|source| StoreError::Mutation {
                    kind: kind.to_string(),
                    source,
                })?;
            let subscriber = self.inner.subscriber.borrow().clone();
            if let Some(subscriber) = subscriber {
                let descriptor = MutationDescriptor {
                    kind: kind.to_string(),
                    payload: payload.clone(),
                };
                subscriber(&descriptor, &self.inner.state);
            }
        }
        Ok(())
    }

    /// Run every action registered under `kind`, in registration order.
    ///
    /// An unknown `kind` is ignored. Returns once every handler has been
    /// started; work an action spawns is not awaited.
    pub fn dispatch(&self, kind: &str, payload: Value) -> StoreResult<()> {
        let entries = self.inner.registry.borrow().actions(kind);
        if entries.is_empty() {
            debug!(action = %kind, "unknown action type ignored");
            return Ok(());
        }
        for entry in entries {
            (entry.handler)(self, &payload).map_err(|source| StoreError::Action {
                kind: kind.to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Install `module` at `path` after construction.
    ///
    /// The parent module must already be installed; intermediate modules are
    /// never created.
    pub fn register_module<S: AsRef<str>>(&self, path: &[S], module: Module) -> StoreResult<()> {
        if path.is_empty() {
            return Err(StoreError::RootRegistration);
        }
        let path = to_path(path);
        installer::install(self, module, &path)?;
        debug!(module = %display_path(&path), "registered module");
        Ok(())
    }

    /// Set the single mutation subscriber, replacing any previous one.
    pub fn subscribe(&self, subscriber: impl Fn(&MutationDescriptor, &ReactiveTree) + 'static) {
        let previous = self.inner.subscriber.replace(Some(Rc::new(subscriber)));
        if previous.is_some() {
            debug!("mutation subscriber replaced");
        }
    }

    /// Watch a value derived from the state.
    pub fn watch(
        &self,
        selector: impl Fn(&Value) -> Value + 'static,
        callback: impl Fn(&Value, &Value) + 'static,
        options: WatchOptions,
    ) -> WatchId {
        self.inner
            .state
            .watch(Rc::new(selector), Rc::new(callback), options)
    }

    pub fn unwatch(&self, id: WatchId) -> bool {
        self.inner.state.unwatch(id)
    }

    /// A view addressing handlers by local name relative to the module at
    /// `path`.
    pub fn scoped<S: AsRef<str>>(&self, path: &[S]) -> StoreResult<ScopedStore<'_>> {
        let path = to_path(path);
        let prefix = namespace_prefix(&self.inner.namespaces.borrow(), &path).ok_or_else(|| {
            let parent = path.split_last().map(|(_, parent)| parent).unwrap_or(&[]);
            StoreError::invalid_registration(display_path(&path), display_path(parent))
        })?;
        Ok(ScopedStore {
            store: self,
            path,
            prefix,
        })
    }

    /// True only while a mutation handler is running.
    pub fn is_committing(&self) -> bool {
        self.inner.committing.get()
    }

    pub fn strict_mode(&self) -> StrictMode {
        self.inner.strict
    }

    /// Writes the strict-mode guard has seen outside a committing window.
    pub fn strict_violations(&self) -> u64 {
        self.inner.guard.borrow().violations()
    }

    pub fn mutation_types(&self) -> Vec<String> {
        self.inner.registry.borrow().mutation_types()
    }

    pub fn action_types(&self) -> Vec<String> {
        self.inner.registry.borrow().action_types()
    }

    pub fn getter_keys(&self) -> Vec<String> {
        self.inner.registry.borrow().getter_keys()
    }

    /// Whether a module is installed at `path` (the empty path is the root).
    pub fn has_module<S: AsRef<str>>(&self, path: &[S]) -> bool {
        self.inner.namespaces.borrow().find(path).is_some()
    }

    /// Run `f` inside a committing window.
    pub(crate) fn with_commit<R>(&self, f: impl FnOnce() -> R) -> R {
        let _window = CommitWindow::open(&self.inner.committing);
        f()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.inner.state.snapshot())
            .field("strict", &self.inner.strict)
            .finish()
    }
}

/// Read-only view over the getter registry.
pub struct Getters<'a> {
    store: &'a Store,
}

impl Getters<'_> {
    /// Evaluate the getter registered under `key` against current state.
    pub fn get(&self, key: &str) -> Option<Value> {
        let entry = self.store.inner.registry.borrow().getter(key)?;
        self.store
            .inner
            .state
            .read(&entry.owner, |slice| (entry.handler)(slice))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.store.inner.registry.borrow().getter(key).is_some()
    }

    pub fn keys(&self) -> Vec<String> {
        self.store.getter_keys()
    }
}

/// Module-local view of a store: names are qualified with the module's
/// namespace prefix before they reach the store.
pub struct ScopedStore<'a> {
    store: &'a Store,
    path: Vec<String>,
    prefix: String,
}

impl ScopedStore<'_> {
    /// The prefix local names are qualified with (`""` outside namespaces).
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Current value of this module's state slice.
    pub fn state(&self) -> Option<Value> {
        self.store.state().get(&self.path)
    }

    pub fn commit(&self, name: &str, payload: Value) -> StoreResult<()> {
        self.store.commit(&qualify(&self.prefix, name), payload)
    }

    pub fn dispatch(&self, name: &str, payload: Value) -> StoreResult<()> {
        self.store.dispatch(&qualify(&self.prefix, name), payload)
    }

    pub fn getter(&self, name: &str) -> Option<Value> {
        self.store.getters().get(&qualify(&self.prefix, name))
    }
}
