//! # PluginForge
//!
//! A plugin runtime: discover plugin types, manage their load/init/destroy
//! lifecycle, and dispatch named events to handler methods with
//! parameter-level dependency injection.
//!
//! ## Overview
//!
//! A plugin is a `Default`-constructible struct annotated `#[plugin]` whose
//! handler methods are marked `#[init]`, `#[destroy]`, `#[event("name")]`,
//! or `#[events("a", "b")]` inside a `#[plugin_handlers]` impl block. The
//! [`PluginManager`] discovers every such type compiled into the binary,
//! instantiates it on demand, and resolves each handler's parameters
//! against a per-batch scope and a process-wide [`DependencyManager`],
//! retrying handlers whose dependencies are published by other handlers in
//! the same batch until a fixed point is reached.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use pluginforge::prelude::*;
//!
//! #[plugin]
//! #[derive(Default)]
//! struct Greeter;
//!
//! #[plugin_handlers]
//! impl Greeter {
//!     #[init]
//!     async fn announce(&self, handle: &PluginHandle) -> anyhow::Result<()> {
//!         handle.register_named("greeting", "hello".to_string())?;
//!         Ok(())
//!     }
//!
//!     #[event("greet")]
//!     async fn greet(&self, #[dep_name("greeting")] greeting: &String) -> anyhow::Result<()> {
//!         println!("{greeting}, world!");
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let manager = PluginManager::new();
//!     manager.initialize().await;
//!     manager.fire_event("greet", &DependencyManager::empty()).await;
//! }
//! ```
//!
//! ## Ambient stack
//!
//! - [`logging`] wires up a `tracing-subscriber` registry the way embedders
//!   of this runtime are expected to initialize it.
//! - [`config`] reads an optional [`config::RuntimeConfig`] (search paths,
//!   fail-fast policy) from a TOML file or string.

pub use pluginforge_core::*;
pub use pluginforge_macros::{plugin, plugin_handlers};

pub mod config;
pub mod logging;

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::config::RuntimeConfig;
    pub use crate::logging;
    pub use pluginforge_core::{
        ActivePlugin, ClassCatalog, ClassInfo, Dependency, DependencyError, DependencyManager,
        EmptyDependencyManager, PluginClassLoader, PluginError, PluginHandle, PluginManager,
        PluginSearcher, ResolveError,
    };
    pub use pluginforge_macros::{plugin, plugin_handlers};
}
