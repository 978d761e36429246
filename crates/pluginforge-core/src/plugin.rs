//! The plugin model: registration, the active-plugin wrapper, and the
//! handle injected into handler bodies for publishing new dependencies.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::class_info::{ClassCatalog, ClassInfo};
use crate::dependency::Dependency;
use crate::dependency_manager::DependencyManager;
use crate::error::PluginError;
use crate::handler::{HandlerDescriptor, HandlerKind};

/// The package-stable name of the plugin type marker (spec §6).
pub const PLUGIN_MARKER: &str = "Plugin";

/// Static registration data for one plugin type, emitted by the `#[plugin]`
/// attribute macro and collected into [`PLUGIN_REGISTRY`] — the in-process
/// analog of the external metadata scanner's per-type record, but carrying
/// an actual constructor and handler table instead of just names.
pub struct PluginRegistration {
    /// Fully-qualified type name, as reported to [`PluginSearcher`](crate::searcher::PluginSearcher).
    pub type_name: &'static str,
    /// Zero-argument construction, mirroring spec §4.5 step 2.
    pub construct: fn() -> Result<Arc<dyn Any + Send + Sync>, anyhow::Error>,
    /// The type's flattened, marker-derived handler set (init/destroy/event),
    /// computed once and cached behind a `OnceLock` by the generated code.
    pub handlers: fn() -> &'static [HandlerDescriptor],
}

/// Process-wide registry of known plugin types, populated at link time.
///
/// Grounded directly in the capability-registry pattern used for transport
/// providers elsewhere in this codebase: a `distributed_slice` populated by
/// an attribute macro that leaves the annotated item otherwise untouched.
#[linkme::distributed_slice]
pub static PLUGIN_REGISTRY: [PluginRegistration] = [..];

/// Looks up a registration by type name, as yielded by the searcher.
pub fn find_registration(type_name: &str) -> Option<&'static PluginRegistration> {
    PLUGIN_REGISTRY.iter().find(|r| r.type_name == type_name)
}

/// Synthesizes a [`ClassCatalog`] from every compiled-in `#[plugin]`
/// registration, each marked concrete and directly implementing
/// [`PLUGIN_MARKER`].
///
/// This is [`PluginManager`](crate::manager::PluginManager)'s stand-in for
/// "internal" metadata: since there is no runtime reflection, the set of
/// types transitively implementing the plugin marker is exactly the set
/// the `#[plugin]` macro already registered at link time.
pub fn catalog_from_registry() -> ClassCatalog {
    ClassCatalog::from_entries(
        PLUGIN_REGISTRY
            .iter()
            .map(|r| ClassInfo::concrete(r.type_name).implements(PLUGIN_MARKER)),
    )
}

/// Handed to handler bodies that declare a [`PluginHandle`] parameter; the
/// Rust-idiomatic substitute for a back-reference field embedded in the
/// user's own struct (spec §4.2's `register`/`register(name, value)`
/// surface). A handler need not be a method on the plugin struct at all —
/// declaring this parameter is what grants publishing capability.
pub struct PluginHandle {
    plugin_name: Arc<str>,
    global: OnceLock<Arc<DependencyManager>>,
}

impl PluginHandle {
    pub(crate) fn new(plugin_name: impl Into<Arc<str>>) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            global: OnceLock::new(),
        }
    }

    /// Attaches the global dependency manager this handle publishes into.
    /// Succeeds exactly once; any later call fails with
    /// [`PluginError::AlreadyAttached`] (spec §3, §5: "a classic one-shot
    /// cell" around the plugin's back-reference to its owning manager).
    pub(crate) fn attach(&self, global: Arc<DependencyManager>) -> Result<(), PluginError> {
        self.global
            .set(global)
            .map_err(|_| PluginError::AlreadyAttached(self.plugin_name.to_string()))
    }

    fn global(&self) -> Result<&Arc<DependencyManager>, PluginError> {
        self.global
            .get()
            .ok_or_else(|| PluginError::PluginNotAttached(self.plugin_name.to_string()))
    }

    /// Publishes `value` into the global dependency manager under a fresh
    /// generated name.
    pub fn register<V: Any + Send + Sync + 'static>(&self, value: V) -> Result<(), PluginError> {
        self.global()?.add_anonymous(value).map(|_| ())?;
        Ok(())
    }

    /// Publishes `value` into the global dependency manager under `name`.
    pub fn register_named<V: Any + Send + Sync + 'static>(
        &self,
        name: impl Into<Arc<str>>,
        value: V,
    ) -> Result<(), PluginError> {
        let dependency = Dependency::new(name, value)?;
        self.global()?.add(dependency)?;
        Ok(())
    }

    /// The owning plugin's type name, for diagnostics.
    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }
}

/// An instantiated, cached plugin known to a [`PluginManager`] by its type
/// name. Handler sequences and the event-name map are derived once from the
/// type's [`PluginRegistration`] and memoized for the instance's lifetime.
pub struct ActivePlugin {
    name: Arc<str>,
    instance: Arc<dyn Any + Send + Sync>,
    handle: Arc<PluginHandle>,
    handlers: &'static [HandlerDescriptor],
    event_method_map: HashMap<String, Vec<HandlerDescriptor>>,
}

impl ActivePlugin {
    pub(crate) fn new(
        name: Arc<str>,
        instance: Arc<dyn Any + Send + Sync>,
        handlers: &'static [HandlerDescriptor],
    ) -> Self {
        let event_method_map = build_event_method_map(handlers);
        Self {
            handle: Arc::new(PluginHandle::new(Arc::clone(&name))),
            name,
            instance,
            handlers,
            event_method_map,
        }
    }

    /// Attaches the owning manager's global [`DependencyManager`], giving
    /// this plugin's [`PluginHandle`] publishing capability. Succeeds
    /// exactly once (spec §3's "assignable exactly once" back-reference).
    pub(crate) fn attach_manager(&self, global: Arc<DependencyManager>) -> Result<(), PluginError> {
        self.handle.attach(global)
    }

    /// The plugin type's fully-qualified name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type-erased instance, for downcasting by generated invoke closures.
    pub fn instance(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.instance
    }

    /// The handle injected into any handler declaring a [`PluginHandle`] parameter.
    pub fn handle(&self) -> &Arc<PluginHandle> {
        &self.handle
    }

    /// Every `#[init]`-marked handler, in declared order.
    pub fn init_handlers(&self) -> impl Iterator<Item = &HandlerDescriptor> {
        self.handlers.iter().filter(|h| h.kind == HandlerKind::Init)
    }

    /// Every `#[destroy]`-marked handler, in declared order.
    pub fn destroy_handlers(&self) -> impl Iterator<Item = &HandlerDescriptor> {
        self.handlers.iter().filter(|h| h.kind == HandlerKind::Destroy)
    }

    /// Handlers bound to `event_name`, in declared order; empty if none.
    pub fn handlers_for_event(&self, event_name: &str) -> &[HandlerDescriptor] {
        self.event_method_map
            .get(event_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn build_event_method_map(
    handlers: &'static [HandlerDescriptor],
) -> HashMap<String, Vec<HandlerDescriptor>> {
    let mut map: HashMap<String, Vec<HandlerDescriptor>> = HashMap::new();
    for handler in handlers {
        if let HandlerKind::Event(names) = &handler.kind {
            for name in names {
                map.entry(name.clone()).or_default().push(handler.clone());
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{HandlerFuture, InvokeFn, ParamSpec};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop_invoke() -> InvokeFn {
        Arc::new(|_plugin, _args| -> HandlerFuture { Box::pin(async { Ok(()) }) })
    }

    fn handler(kind: HandlerKind) -> HandlerDescriptor {
        HandlerDescriptor {
            owner_plugin: "TestPlugin",
            method_name: "m",
            kind,
            params: vec![ParamSpec::handle()],
            invoke: noop_invoke(),
        }
    }

    #[test]
    fn event_fanout_collapses_duplicate_names() {
        let handlers: &'static [HandlerDescriptor] = Box::leak(Box::new(vec![
            handler(HandlerKind::Event(vec!["e1".into(), "e2".into()])),
            handler(HandlerKind::Event(vec!["e2".into()])),
        ]));
        let plugin = ActivePlugin::new(Arc::from("TestPlugin"), Arc::new(()), handlers);
        assert_eq!(plugin.handlers_for_event("e1").len(), 1);
        assert_eq!(plugin.handlers_for_event("e2").len(), 2);
        assert_eq!(plugin.handlers_for_event("e3").len(), 0);
    }

    #[test]
    fn handle_attach_is_once() {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let _ = COUNTER.fetch_add(1, Ordering::SeqCst);
        let handle = PluginHandle::new("p");
        assert!(handle.global().is_err());
        let global = Arc::new(DependencyManager::new());
        handle.attach(Arc::clone(&global)).unwrap();
        assert!(handle.attach(global).is_err());
    }
}
