//! Error types for the PluginForge runtime.

use thiserror::Error;

/// Errors that can occur while constructing or mutating a [`Dependency`](crate::dependency::Dependency).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DependencyError {
    /// `name` was empty when constructing a [`Dependency`](crate::dependency::Dependency).
    #[error("dependency name must not be empty")]
    BadDependency,

    /// [`DependencyManager::add`](crate::dependency_manager::DependencyManager::add) was
    /// called with a name that is already bound.
    #[error("a dependency named '{0}' is already registered")]
    DuplicateDependency(String),
}

/// Errors that can occur while resolving a single handler parameter.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// A `#[dep_name("...")]` parameter could not be found in either the scoped
    /// or the global [`DependencyManager`](crate::dependency_manager::DependencyManager).
    #[error("no dependency named '{0}' is registered")]
    DepNameNotFound(String),

    /// An unnamed parameter could not be resolved by its declared value class.
    #[error("no dependency assignable to '{0}' is registered")]
    DepClassNotFound(&'static str),

    /// A named lookup found an entry, but its value class does not match the
    /// declared parameter type.
    #[error("dependency '{name}' has class '{actual}', expected '{expected}'")]
    DepUnexpectedClass {
        /// The name that was looked up.
        name: String,
        /// The parameter's declared type name.
        expected: &'static str,
        /// The actual registered value's type name.
        actual: &'static str,
    },
}

/// Errors surfaced from the plugin lifecycle and dispatch machinery.
#[derive(Debug, Error)]
pub enum PluginError {
    /// A candidate type was instantiated but does not carry plugin metadata
    /// (i.e. it was never registered via `#[plugin]`).
    #[error("'{0}' is not a known plugin type")]
    UnknownPluginType(String),

    /// `register`/`register_named` was called on a plugin whose back-reference
    /// to its owning [`PluginManager`](crate::manager::PluginManager) has not
    /// been set yet (i.e. the plugin has not finished `loadPlugin`).
    #[error("plugin '{0}' is not attached to a manager")]
    PluginNotAttached(String),

    /// The owning manager has already been assigned once; a plugin's
    /// back-reference is a once-cell.
    #[error("plugin '{0}' is already attached to a manager")]
    AlreadyAttached(String),

    /// Zero-argument construction of a plugin type failed, or a handler
    /// invocation returned an error.
    #[error("plugin '{plugin}' failed: {cause}")]
    LoadFailure {
        /// Name of the plugin type involved.
        plugin: String,
        /// Underlying cause, as reported by the constructor/handler.
        #[source]
        cause: anyhow::Error,
    },

    /// Parameter resolution failed for a handler bundle.
    #[error("dependency resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// A [`Dependency`](crate::dependency::Dependency) could not be constructed
    /// or registered.
    #[error(transparent)]
    Dependency(#[from] DependencyError),
}

/// Result of invoking a single `(plugin, handler)` bundle.
pub type InvokeResult = Result<(), PluginError>;
