//! Logging setup for embedders of the plugin runtime.
//!
//! The core crate only emits `tracing` events (load/init/destroy/dispatch
//! decisions, fixed-point round progress); it never installs a subscriber
//! itself. This module is the one place that does, mirroring how the
//! teacher's runtime crate separates "emit spans" from "wire up a
//! subscriber".

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes a default subscriber: `RUST_LOG`-driven filtering, falling
/// back to `info` when unset.
///
/// # Panics
///
/// Panics if a global subscriber has already been installed. Use
/// [`try_init`] in contexts (tests, embedding libraries) where that may
/// already be the case.
pub fn init() {
    init_with_filter("info");
}

/// Like [`init`], but with an explicit filter directive (e.g.
/// `"pluginforge_core=debug"`).
pub fn init_with_filter(filter: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(env_filter)
        .init();
}

/// Like [`init`], but reports failure instead of panicking.
pub fn try_init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(env_filter)
        .try_init()
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
}
