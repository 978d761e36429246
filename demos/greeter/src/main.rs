//! A small demo harness wiring a handful of interdependent plugins through
//! PluginForge: one seeds a counter, another publishes a greeting string,
//! and a third consumes both across two fired events.
//!
//! # Running
//!
//! ```bash
//! cargo run --package greeter
//! ```

use pluginforge::prelude::*;
use tracing::{info, warn};

/// A dependency published by [`Counter`], consumed by [`Greeter`] by class.
struct VisitorCount(u32);

#[plugin]
#[derive(Default)]
struct Counter;

#[plugin_handlers]
impl Counter {
    #[init]
    async fn seed(&self, handle: &PluginHandle) -> anyhow::Result<()> {
        handle.register(VisitorCount(1))?;
        Ok(())
    }
}

#[plugin]
#[derive(Default)]
struct Announcer;

#[plugin_handlers]
impl Announcer {
    #[init]
    async fn announce(&self, handle: &PluginHandle) -> anyhow::Result<()> {
        handle.register_named("greeting", "Welcome".to_string())?;
        Ok(())
    }
}

#[plugin]
#[derive(Default)]
struct Greeter;

#[plugin_handlers]
impl Greeter {
    /// Fires on both "morning" and "evening"; resolves `greeting` by name
    /// and `VisitorCount` by class, both published by peer plugins'
    /// `#[init]` handlers during the same `initialize()` call.
    #[events("morning", "evening")]
    async fn greet(
        &self,
        #[dep_name("greeting")] greeting: &String,
        count: &VisitorCount,
    ) -> anyhow::Result<()> {
        println!("{greeting}! Visitor #{}", count.0);
        Ok(())
    }

    /// Fires on "farewell". Unlike `greet`, the caller supplies `greeting`
    /// through a per-call scope, which takes precedence over the global
    /// value `Announcer` published.
    #[event("farewell")]
    async fn farewell(&self, #[dep_name("greeting")] greeting: &String) -> anyhow::Result<()> {
        println!("{greeting}, visitor.");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_with_filter("greeter=info,pluginforge_core=info");

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "greeter.toml".to_string());
    let config = RuntimeConfig::load_from_file(&config_path)?;
    if !config.search_paths.is_empty() {
        info!(paths = ?config.search_paths, "external plugin search paths configured (not scanned by this demo)");
    }

    let manager = PluginManager::new();

    let init_results = manager.initialize().await;
    for (plugin, results) in &init_results {
        for result in results {
            if let Err(err) = result {
                warn!(plugin, %err, "init handler failed");
            }
        }
    }

    manager.fire_event("morning", &DependencyManager::empty()).await;
    manager.fire_event("evening", &DependencyManager::empty()).await;

    manager
        .fire_event_with(
            "farewell",
            vec![Dependency::new("greeting", "Farewell".to_string())?],
        )
        .await?;

    Ok(())
}
