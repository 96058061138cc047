//! Hierarchical, reactive state container.
//!
//! A [`Store`] owns one reactive state document, composed from a tree of
//! [`Module`]s. State is only written through registered mutations, which are
//! reached via [`Store::commit`]; actions ([`Store::dispatch`]) orchestrate
//! (possibly asynchronous) work and commit mutations in turn. The crate is
//! split the same way the data flows:
//!
//! - **[`core`]**: Pure path and namespace bookkeeping. No reactivity, no I/O.
//! - **[`reactive`]**: The reactive primitive the store is written against
//!   ([`Reactivity`]) and the JSON-document implementation ([`ReactiveTree`]).
//! - **[`installer`]**: Walks a module tree into the state document and the
//!   flattened handler registries.
//! - **[`store`]** and **[`strict`]**: The public aggregate and the
//!   mutation-discipline guard.
//! - **[`io`]**: Configuration files.

pub mod core;
pub mod error;
pub mod helpers;
pub mod installer;
pub mod io;
pub mod logging;
pub mod module;
pub mod plugins;
pub mod reactive;
pub mod registry;
pub mod scope;
pub mod store;
pub mod strict;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use crate::core::types::{MutationDescriptor, StrictMode, WatchOptions};
pub use crate::error::{StoreError, StoreResult};
pub use crate::module::Module;
pub use crate::reactive::{ReactiveTree, Reactivity, WatchId};
pub use crate::scope::StoreScope;
pub use crate::store::{Getters, ScopedStore, Store, StoreOptions};
