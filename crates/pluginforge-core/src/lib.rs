//! Core engine for the PluginForge plugin runtime.
//!
//! See the crate-level modules for the pieces described in the design
//! spec: a typed [`dependency`] registry ([`dependency_manager`]), the
//! [`plugin`] model and its compile-time registry, a graph-walking
//! [`searcher`], classpath bookkeeping in [`class_loader`], and the
//! [`manager`] that ties loading, lifecycle, and event dispatch together
//! through the fixed-point [`invoker`].

pub mod class_info;
pub mod class_loader;
pub mod dependency;
pub mod dependency_manager;
pub mod error;
pub mod handler;
pub mod invoker;
pub mod manager;
pub mod plugin;
pub mod searcher;

/// Re-exported so `pluginforge-macros`-generated code can reach the
/// `distributed_slice` attribute through this crate without requiring
/// every plugin-defining crate to add a direct `linkme` dependency.
pub use linkme;

pub use class_info::{ClassCatalog, ClassInfo};
pub use class_loader::PluginClassLoader;
pub use dependency::Dependency;
pub use dependency_manager::{DependencyManager, EmptyDependencyManager};
pub use error::{DependencyError, InvokeResult, PluginError, ResolveError};
pub use handler::{HandlerDescriptor, HandlerKind, ParamSpec};
pub use invoker::{invoke_fixed_point, Bundle};
pub use manager::PluginManager;
pub use plugin::{find_registration, ActivePlugin, PluginHandle, PluginRegistration, PLUGIN_REGISTRY};
pub use searcher::PluginSearcher;
