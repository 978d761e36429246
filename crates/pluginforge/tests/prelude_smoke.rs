//! End-to-end smoke test exercising the facade crate's public surface: a
//! plugin defined purely through `pluginforge::prelude` items, loaded,
//! initialized, and dispatched an event.

use pluginforge::prelude::*;

struct Seeded;

#[plugin]
#[derive(Default)]
struct Seeder;

#[plugin_handlers]
impl Seeder {
    #[init]
    async fn seed(&self, handle: &PluginHandle) -> anyhow::Result<()> {
        handle.register(Seeded)?;
        Ok(())
    }
}

#[plugin]
#[derive(Default)]
struct Listener;

#[plugin_handlers]
impl Listener {
    #[event("ping")]
    async fn on_ping(&self, _seeded: &Seeded) -> anyhow::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn initialize_then_fire_event_through_prelude() {
    let manager = PluginManager::new();
    let init_results = manager.initialize().await;
    for results in init_results.values() {
        assert!(results.iter().all(Result::is_ok));
    }

    let results = manager.fire_event("ping", &DependencyManager::empty()).await;
    assert!(!results.is_empty());
    assert!(results.iter().all(Result::is_ok));
}
