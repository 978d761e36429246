//! [`PluginManager`]: loading, lifecycle orchestration, and event dispatch
//! (spec §4.5). This is where the [`searcher`](crate::searcher), the
//! compile-time [`plugin registry`](crate::plugin::PLUGIN_REGISTRY), and
//! the [fixed-point invoker](crate::invoker) meet.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::class_info::ClassCatalog;
use crate::class_loader::PluginClassLoader;
use crate::dependency_manager::DependencyManager;
use crate::error::{InvokeResult, PluginError};
use crate::handler::HandlerDescriptor;
use crate::invoker::{invoke_fixed_point, Bundle};
use crate::plugin::{catalog_from_registry, find_registration, ActivePlugin, PLUGIN_MARKER};
use crate::searcher::PluginSearcher;

/// Orchestrates plugin discovery, lifecycle, and event dispatch.
///
/// Three disjoint-by-purpose maps are kept, all keyed by plugin type name
/// (spec §3): `internal_types` (lazily computed from the compiled-in
/// [`PLUGIN_REGISTRY`](crate::plugin::PLUGIN_REGISTRY) on first
/// [`initialize`](Self::initialize)), `external_types` (admitted via
/// [`load_plugins`](Self::load_plugins)), and `active_plugins`
/// (instantiated plugins, at most one per type name).
pub struct PluginManager {
    class_loader: PluginClassLoader<()>,
    internal_types: OnceLock<Vec<String>>,
    external_types: RwLock<HashSet<String>>,
    active_plugins: RwLock<HashMap<Arc<str>, Arc<ActivePlugin>>>,
    global: Arc<DependencyManager>,
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginManager {
    /// A fresh manager with no active plugins and an empty global
    /// dependency registry.
    pub fn new() -> Self {
        Self {
            class_loader: PluginClassLoader::new(Arc::new(())),
            internal_types: OnceLock::new(),
            external_types: RwLock::new(HashSet::new()),
            active_plugins: RwLock::new(HashMap::new()),
            global: Arc::new(DependencyManager::new()),
        }
    }

    /// The global [`DependencyManager`] every batch falls back to once its
    /// scope has been exhausted.
    pub fn global_dependencies(&self) -> &DependencyManager {
        &self.global
    }

    /// The classpath roots registered so far via
    /// [`load_plugins`](Self::load_plugins), in insertion order.
    pub fn class_loader(&self) -> &PluginClassLoader<()> {
        &self.class_loader
    }

    /// The currently active plugin instances, snapshotted by name.
    pub fn active_plugin_names(&self) -> Vec<Arc<str>> {
        self.active_plugins.read().keys().cloned().collect()
    }

    /// An active plugin by type name, if loaded.
    pub fn active_plugin(&self, type_name: &str) -> Option<Arc<ActivePlugin>> {
        self.active_plugins.read().get(type_name).cloned()
    }

    /// Loads `type_name` if it is not already active.
    ///
    /// Idempotent (spec testable property 1): a second call for the same
    /// name returns the exact same [`Arc<ActivePlugin>`] rather than
    /// re-instantiating. Fails with [`PluginError::UnknownPluginType`] if
    /// no `#[plugin]` registration exists for `type_name`, or with
    /// [`PluginError::LoadFailure`] if the zero-argument constructor
    /// itself returns an error.
    pub fn load_plugin(&self, type_name: &str) -> Result<Arc<ActivePlugin>, PluginError> {
        if let Some(existing) = self.active_plugins.read().get(type_name) {
            return Ok(Arc::clone(existing));
        }

        let registration = find_registration(type_name)
            .ok_or_else(|| PluginError::UnknownPluginType(type_name.to_string()))?;

        let instance = (registration.construct)().map_err(|cause| PluginError::LoadFailure {
            plugin: type_name.to_string(),
            cause,
        })?;

        let plugin = Arc::new(ActivePlugin::new(
            Arc::from(type_name),
            instance,
            (registration.handlers)(),
        ));
        plugin.attach_manager(Arc::clone(&self.global))?;

        self.active_plugins
            .write()
            .insert(Arc::from(type_name), Arc::clone(&plugin));
        info!(plugin = type_name, "plugin loaded");
        Ok(plugin)
    }

    /// Lazily discovers and loads every compiled-in plugin, then runs
    /// their `#[init]` handlers with an Empty scope.
    ///
    /// The internal type set is computed once, from a [`ClassCatalog`]
    /// synthesized from [`PLUGIN_REGISTRY`](crate::plugin::PLUGIN_REGISTRY)
    /// (spec §4.5: "sourced from Searcher.internal").
    pub async fn initialize(&self) -> HashMap<String, Vec<InvokeResult>> {
        let names = self
            .internal_types
            .get_or_init(|| {
                let catalog = catalog_from_registry();
                PluginSearcher::new(&catalog, PLUGIN_MARKER).search()
            })
            .clone();

        let mut newly_loaded = Vec::with_capacity(names.len());
        for name in &names {
            match self.load_plugin(name) {
                Ok(plugin) => newly_loaded.push(plugin),
                Err(err) => warn!(plugin = %name, error = %err, "failed to load internal plugin"),
            }
        }

        self.initialize_plugins(&newly_loaded, &DependencyManager::empty())
            .await
    }

    /// Extends the classpath with `paths` and loads every concrete type in
    /// `discovered` (the host's scan results for those paths) that
    /// transitively implements the plugin marker.
    ///
    /// Does **not** auto-initialize the newly-loaded plugins; the caller
    /// decides when to call [`initialize_plugins`](Self::initialize_plugins)
    /// (spec §9, the "explicit" variant).
    pub fn load_plugins(
        &self,
        paths: impl IntoIterator<Item = impl Into<String>>,
        discovered: &ClassCatalog,
    ) -> Vec<Arc<ActivePlugin>> {
        let paths: Vec<String> = paths.into_iter().map(Into::into).collect();
        for path in &paths {
            self.class_loader.add_url(path.clone());
        }
        let names = PluginSearcher::new(discovered, PLUGIN_MARKER).search();

        {
            let mut external = self.external_types.write();
            external.extend(names.iter().cloned());
        }

        let mut loaded = Vec::with_capacity(names.len());
        for name in &names {
            match self.load_plugin(name) {
                Ok(plugin) => loaded.push(plugin),
                Err(err) => {
                    warn!(plugin = %name, paths = ?paths, error = %err, "failed to load external plugin")
                }
            }
        }
        loaded
    }

    /// Runs every `#[init]` handler across `plugins`, resolving parameters
    /// against `scope` then the global manager via the fixed-point
    /// invoker, and returns one result sequence per plugin (keyed by
    /// plugin name, preserving each plugin's own handler order).
    pub async fn initialize_plugins(
        &self,
        plugins: &[Arc<ActivePlugin>],
        scope: &DependencyManager,
    ) -> HashMap<String, Vec<InvokeResult>> {
        self.run_batch(plugins, scope, |p| p.init_handlers().cloned().collect(), "init")
            .await
    }

    /// Runs every `#[destroy]` handler across `plugins`. A plugin is
    /// removed from the active set iff all of its destroy handlers
    /// succeeded, or `destroy_on_failure` is `true`.
    pub async fn destroy_plugins(
        &self,
        plugins: &[Arc<ActivePlugin>],
        scope: &DependencyManager,
        destroy_on_failure: bool,
    ) -> HashMap<String, Vec<InvokeResult>> {
        let grouped = self
            .run_batch(plugins, scope, |p| p.destroy_handlers().cloned().collect(), "destroy")
            .await;

        let mut active = self.active_plugins.write();
        for plugin in plugins {
            let all_ok = grouped
                .get(plugin.name())
                .map(|results| results.iter().all(Result::is_ok))
                .unwrap_or(true);
            if all_ok || destroy_on_failure {
                active.remove(plugin.name());
            }
        }
        grouped
    }

    /// Fires `event_name` against every active plugin's handlers bound to
    /// that name, returning the flat result sequence in the order bundles
    /// were collected. Iteration order over active plugins is not a
    /// stable contract (spec §4.5).
    pub async fn fire_event(&self, event_name: &str, scope: &DependencyManager) -> Vec<InvokeResult> {
        let bundles: Vec<Bundle> = {
            let active = self.active_plugins.read();
            active
                .values()
                .flat_map(|plugin| {
                    plugin
                        .handlers_for_event(event_name)
                        .iter()
                        .map(move |handler| Bundle {
                            plugin: Arc::clone(plugin),
                            handler: handler.clone(),
                        })
                })
                .collect()
        };
        invoke_fixed_point(bundles, scope, &self.global).await
    }

    /// Convenience wrapper: builds a fresh scoped manager from
    /// `dependencies` and delegates to [`fire_event`](Self::fire_event).
    pub async fn fire_event_with(
        &self,
        event_name: &str,
        dependencies: impl IntoIterator<Item = crate::dependency::Dependency>,
    ) -> Result<Vec<InvokeResult>, crate::error::DependencyError> {
        let scope = DependencyManager::new();
        for dependency in dependencies {
            scope.add(dependency)?;
        }
        Ok(self.fire_event(event_name, &scope).await)
    }

    async fn run_batch(
        &self,
        plugins: &[Arc<ActivePlugin>],
        scope: &DependencyManager,
        collect: impl Fn(&ActivePlugin) -> Vec<HandlerDescriptor>,
        phase: &'static str,
    ) -> HashMap<String, Vec<InvokeResult>> {
        let mut bundles = Vec::new();
        let mut owners = Vec::new();
        for plugin in plugins {
            for handler in collect(plugin) {
                owners.push(plugin.name().to_string());
                bundles.push(Bundle {
                    plugin: Arc::clone(plugin),
                    handler,
                });
            }
        }

        let results = invoke_fixed_point(bundles, scope, &self.global).await;

        let mut grouped: HashMap<String, Vec<InvokeResult>> = HashMap::new();
        for (owner, result) in owners.into_iter().zip(results.into_iter()) {
            if let Err(err) = &result {
                warn!(plugin = owner, phase, error = %err, "handler failed");
            } else {
                info!(plugin = owner, phase, "handler succeeded");
            }
            grouped.entry(owner).or_default().push(result);
        }
        grouped
    }
}

#[cfg(test)]
impl PluginManager {
    /// Builds a bare manager for invoker/plugin unit tests that need a
    /// `PluginManager` without going through the compile-time registry.
    pub(crate) fn for_test() -> Self {
        Self::new()
    }

    /// Attaches `plugin`'s handle to this manager's global dependency
    /// registry and inserts it into the active set, bypassing
    /// [`load_plugin`](Self::load_plugin)'s registry lookup.
    pub(crate) fn attach_for_test(&self, plugin: &Arc<ActivePlugin>) {
        plugin
            .attach_manager(Arc::clone(&self.global))
            .expect("test plugin attaches exactly once");
        self.active_plugins
            .write()
            .insert(Arc::from(plugin.name()), Arc::clone(plugin));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::Dependency;

    #[tokio::test]
    async fn load_plugin_is_idempotent_for_unknown_type() {
        let manager = PluginManager::new();
        let err1 = manager.load_plugin("NoSuchPlugin").unwrap_err();
        assert!(matches!(err1, PluginError::UnknownPluginType(ref n) if n == "NoSuchPlugin"));
    }

    #[tokio::test]
    async fn fire_event_on_empty_manager_returns_no_results() {
        let manager = PluginManager::new();
        let results = manager.fire_event("anything", &DependencyManager::empty()).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn fire_event_with_builds_scope_from_dependencies() {
        let manager = PluginManager::new();
        let results = manager
            .fire_event_with("e", vec![Dependency::new("x", 1i32).unwrap()])
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn active_plugin_names_empty_by_default() {
        let manager = PluginManager::new();
        assert!(manager.active_plugin_names().is_empty());
    }

    #[test]
    fn load_plugins_records_classpath_roots_even_without_matches() {
        let manager = PluginManager::new();
        let catalog = ClassCatalog::new();
        let loaded = manager.load_plugins(["path/a", "path/b"], &catalog);
        assert!(loaded.is_empty());
        assert_eq!(manager.class_loader().roots(), vec!["path/a".to_string(), "path/b".to_string()]);
    }
}
