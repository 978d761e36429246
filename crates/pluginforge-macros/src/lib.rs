//! Procedural macros for declaring PluginForge plugin types.
//!
//! - [`plugin`] registers a struct as a plugin type.
//! - [`plugin_handlers`] scans an `impl` block for `#[init]`, `#[destroy]`,
//!   `#[event("name")]`, `#[events("a", "b")]`, and `#[dep_name("name")]`
//!   markers and builds the handler descriptors the owning plugin registers.
//!
//! Both rely on `linkme::distributed_slice` for cross-item registration, the
//! same mechanism this codebase uses to wire transport capabilities into
//! their registries: the annotated item is left in place and a handful of
//! sibling items are appended alongside it.

mod handlers_attr;
mod plugin_attr;

use proc_macro::TokenStream;

/// Registers a struct as a plugin type.
///
/// Requires the struct to implement `Default` (the zero-argument
/// constructor spec §4.5 calls for). Emits a compile-time
/// `PLUGIN_REGISTRY` entry plus a per-type handler-fragment slice that any
/// `#[plugin_handlers]` blocks in the same module contribute into.
#[proc_macro_attribute]
pub fn plugin(_attr: TokenStream, item: TokenStream) -> TokenStream {
    match plugin_attr::expand(item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Scans an `impl` block (inherent or trait) for marker-annotated methods
/// and contributes the resulting handler descriptors to the block's `Self`
/// type. Requires a `#[plugin]` struct of the same name in the same module.
///
/// Multiple blocks may target the same struct; contributions are unioned,
/// keyed by (phase, method name), with later registrations overriding
/// earlier ones of the same key — declare shared defaults in one block
/// (e.g. a trait's handler impl) and overrides in another.
#[proc_macro_attribute]
pub fn plugin_handlers(_attr: TokenStream, item: TokenStream) -> TokenStream {
    match handlers_attr::expand(item.into()) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
