//! Handler descriptors and parameter resolution.
//!
//! A plugin type's `#[init]`/`#[destroy]`/`#[event(...)]`/`#[events(...)]`
//! methods are not invoked reflectively (Rust has no runtime method
//! dispatch by name). Instead, `#[plugin_handlers]` generates, for each
//! marked method, a [`HandlerDescriptor`] carrying a **closed capability
//! vtable** entry per spec §9: a typed-argument builder plus a boxed
//! invocation closure that downcasts resolved [`Arc<dyn Any>`] values once
//! at the call site.

use std::any::{Any, TypeId};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::dependency_manager::DependencyManager;
use crate::error::ResolveError;

/// The declared shape of a single handler parameter: its Rust type and,
/// when the handler parameter carried `#[dep_name("...")]`, the forced
/// lookup name.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    /// `TypeId` of the parameter's declared value type (the `T` in `Arc<T>`).
    pub type_id: TypeId,
    /// The declared type's name, for diagnostics.
    pub type_name: &'static str,
    /// Present when the parameter carries `#[dep_name("...")]`; forces named
    /// resolution instead of class-based search.
    pub dep_name: Option<&'static str>,
    /// `true` for a parameter typed [`PluginHandle`](crate::plugin::PluginHandle),
    /// which is always injectable and never consults the [`DependencyManager`] —
    /// it is the Rust stand-in for calling `register`/`register_named` on the
    /// plugin's own back-reference instead of requiring the user's struct to
    /// carry one.
    pub is_handle: bool,
}

impl ParamSpec {
    /// Describes an unnamed parameter of type `T`, resolved by value class.
    pub fn of<T: Any + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            dep_name: None,
            is_handle: false,
        }
    }

    /// Describes a parameter forced to resolve by name via `#[dep_name]`.
    pub fn named<T: Any + 'static>(name: &'static str) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            dep_name: Some(name),
            is_handle: false,
        }
    }

    /// Describes the always-injectable plugin handle parameter.
    pub fn handle() -> Self {
        Self {
            type_id: TypeId::of::<crate::plugin::PluginHandle>(),
            type_name: std::any::type_name::<crate::plugin::PluginHandle>(),
            dep_name: None,
            is_handle: true,
        }
    }
}

/// The type-erased argument bag resolved for one handler invocation, passed
/// to the generated invocation closure for downcasting.
pub type ResolvedArgs = Vec<Arc<dyn Any + Send + Sync>>;

/// Future type returned by a handler invocation closure.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>>;

/// A boxed closure generated by `#[plugin_handlers]`: given the owning
/// plugin instance (type-erased) and its resolved arguments, invokes the
/// real method and returns its outcome.
pub type InvokeFn = Arc<dyn Fn(Arc<dyn Any + Send + Sync>, ResolvedArgs) -> HandlerFuture + Send + Sync>;

/// The lifecycle phase(s) or event name(s) under which a handler runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerKind {
    /// Runs once per `initializePlugins` batch including this plugin.
    Init,
    /// Runs once per `destroyPlugins` batch including this plugin.
    Destroy,
    /// Runs whenever any of the listed event names fire. A method carrying
    /// both `#[event]` and `#[events]`, or repeated `#[event]` markers,
    /// collapses to a single entry listing every distinct name (spec §3).
    Event(Vec<String>),
}

/// A single marker-annotated method on a plugin type, generated by
/// `#[plugin_handlers]`.
#[derive(Clone)]
pub struct HandlerDescriptor {
    /// Fully-qualified owning type name.
    pub owner_plugin: &'static str,
    /// The method's Rust name, for diagnostics.
    pub method_name: &'static str,
    /// The lifecycle phase or event bindings this handler is registered under.
    pub kind: HandlerKind,
    /// Declared parameter shapes, in declaration order.
    pub params: Vec<ParamSpec>,
    /// The generated invocation closure.
    pub invoke: InvokeFn,
}

impl std::fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("owner_plugin", &self.owner_plugin)
            .field("method_name", &self.method_name)
            .field("kind", &self.kind)
            .field("params", &self.params.len())
            .finish()
    }
}

/// Resolves every parameter of a handler against `scope` first, then
/// `global`, per spec §4.6.
///
/// - A named parameter (`#[dep_name]`) looks up `scope.find(name)` then
///   `global.find(name)`; absence is [`ResolveError::DepNameNotFound`], a
///   class mismatch is [`ResolveError::DepUnexpectedClass`] and is **not**
///   a fall-through to class-based search (spec testable property 6).
/// - An unnamed parameter searches `scope.find_by_value_class` then
///   `global.find_by_value_class`; absence is
///   [`ResolveError::DepClassNotFound`]. Multiple candidates: the *last* one
///   wins (insertion order).
pub fn resolve_params(
    scope: &DependencyManager,
    global: &DependencyManager,
    params: &[ParamSpec],
    handle: &Arc<crate::plugin::PluginHandle>,
) -> Result<ResolvedArgs, ResolveError> {
    params
        .iter()
        .map(|p| {
            if p.is_handle {
                Ok(Arc::clone(handle) as Arc<dyn Any + Send + Sync>)
            } else {
                resolve_one(scope, global, p)
            }
        })
        .collect()
}

fn resolve_one(
    scope: &DependencyManager,
    global: &DependencyManager,
    param: &ParamSpec,
) -> Result<Arc<dyn Any + Send + Sync>, ResolveError> {
    if let Some(name) = param.dep_name {
        let dep = scope
            .find(name)
            .or_else(|| global.find(name))
            .ok_or_else(|| ResolveError::DepNameNotFound(name.to_string()))?;
        if !dep.is_assignable_to(param.type_id) {
            return Err(ResolveError::DepUnexpectedClass {
                name: name.to_string(),
                expected: param.type_name,
                actual: dep.value_type_name(),
            });
        }
        return Ok(Arc::clone(dep.raw_value()));
    }

    let mut candidates = scope.find_by_value_class(param.type_id);
    if candidates.is_empty() {
        candidates = global.find_by_value_class(param.type_id);
    }
    let chosen = candidates
        .pop()
        .ok_or(ResolveError::DepClassNotFound(param.type_name))?;
    Ok(Arc::clone(chosen.raw_value()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::Dependency;
    use crate::plugin::PluginHandle;

    fn handle() -> Arc<PluginHandle> {
        Arc::new(PluginHandle::new("TestPlugin"))
    }

    #[test]
    fn unnamed_resolution_picks_last_insertion() {
        let global = DependencyManager::new();
        global.add(Dependency::new("a", 1i32).unwrap()).unwrap();
        global.add(Dependency::new("b", 2i32).unwrap()).unwrap();
        let scope = DependencyManager::new();
        let resolved =
            resolve_params(&scope, &global, &[ParamSpec::of::<i32>()], &handle()).unwrap();
        let value = resolved[0].clone().downcast::<i32>().unwrap();
        assert_eq!(*value, 2);
    }

    #[test]
    fn scope_overrides_global_for_named_lookup() {
        let global = DependencyManager::new();
        global.add(Dependency::new("x", "global".to_string()).unwrap()).unwrap();
        let scope = DependencyManager::new();
        scope.add(Dependency::new("x", "scoped".to_string()).unwrap()).unwrap();
        let resolved = resolve_params(
            &scope,
            &global,
            &[ParamSpec::named::<String>("x")],
            &handle(),
        )
        .unwrap();
        let value = resolved[0].clone().downcast::<String>().unwrap();
        assert_eq!(*value, "scoped");
    }

    #[test]
    fn named_class_mismatch_does_not_fall_through() {
        let global = DependencyManager::new();
        global.add(Dependency::new("x", 3i32).unwrap()).unwrap();
        let scope = DependencyManager::new();
        let err = resolve_params(
            &scope,
            &global,
            &[ParamSpec::named::<bool>("x")],
            &handle(),
        )
        .unwrap_err();
        match err {
            ResolveError::DepUnexpectedClass { name, .. } => assert_eq!(name, "x"),
            other => panic!("expected DepUnexpectedClass, got {other:?}"),
        }
    }

    #[test]
    fn missing_named_dependency_is_reported() {
        let global = DependencyManager::new();
        let scope = DependencyManager::new();
        let err = resolve_params(
            &scope,
            &global,
            &[ParamSpec::named::<i32>("missing")],
            &handle(),
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::DepNameNotFound(n) if n == "missing"));
    }

    #[test]
    fn missing_class_dependency_is_reported() {
        let global = DependencyManager::new();
        let scope = DependencyManager::new();
        let err =
            resolve_params(&scope, &global, &[ParamSpec::of::<i32>()], &handle()).unwrap_err();
        assert!(matches!(err, ResolveError::DepClassNotFound(_)));
    }
}
