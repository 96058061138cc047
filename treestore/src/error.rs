//! Error types for store operations.

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the store, its installer, and the reactive document.
///
/// Unknown `commit`/`dispatch` targets have no variant here:
/// they are ignored, not failed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A module was registered under a parent that was never installed.
    #[error("cannot register module at '{path}': parent '{parent}' is not installed")]
    InvalidRegistrationPath {
        /// The requested module path.
        path: String,
        /// The missing (or non-object) parent path.
        parent: String,
    },

    /// A module already occupies the requested path.
    #[error("a module is already installed at '{path}'")]
    ModuleAlreadyInstalled {
        /// The contested module path.
        path: String,
    },

    /// The root module is installed by `Store::new`, never by registration.
    #[error("the root module cannot be registered dynamically")]
    RootRegistration,

    /// A state path does not exist in the document.
    #[error("state path not found: {path}")]
    StatePathNotFound {
        /// The path that was not found.
        path: String,
    },

    /// A key was added under a node that is not an object.
    #[error("state node at '{path}' is not an object")]
    NotAnObject {
        /// The path of the offending node.
        path: String,
    },

    /// The root of the state document cannot be assigned.
    #[error("the root state cannot be replaced; commit a mutation instead")]
    RootAssignment,

    /// A mutation handler returned an error.
    #[error("mutation '{kind}' failed")]
    Mutation {
        /// Qualified mutation type.
        kind: String,
        #[source]
        source: anyhow::Error,
    },

    /// An action handler returned an error.
    #[error("action '{kind}' failed")]
    Action {
        /// Qualified action type.
        kind: String,
        #[source]
        source: anyhow::Error,
    },
}

impl StoreError {
    #[inline]
    pub fn state_path_not_found(path: impl Into<String>) -> Self {
        StoreError::StatePathNotFound { path: path.into() }
    }

    #[inline]
    pub fn not_an_object(path: impl Into<String>) -> Self {
        StoreError::NotAnObject { path: path.into() }
    }

    /// Create an invalid registration error for `path` whose parent is missing.
    #[inline]
    pub fn invalid_registration(path: impl Into<String>, parent: impl Into<String>) -> Self {
        StoreError::InvalidRegistrationPath {
            path: path.into(),
            parent: parent.into(),
        }
    }
}
