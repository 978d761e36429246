//! [`PluginClassLoader`]: deduplicated classpath roots with parent-first
//! delegation.

use std::sync::Arc;
use parking_lot::RwLock;

/// A set-like collection of search roots (archive paths, directories, crate
/// names — whatever the embedder's classpath provider contract defines)
/// that delegates actual type resolution to a parent loader.
///
/// Mirrors the spec's `PluginClassLoader`: the interesting behavior is
/// idempotent root registration, not resolution itself, which this core
/// does not implement (it is an external collaborator per spec §1).
#[derive(Debug)]
pub struct PluginClassLoader<P> {
    roots: RwLock<Vec<String>>,
    parent: Arc<P>,
}

impl<P> PluginClassLoader<P> {
    /// Builds a class loader with no roots yet, delegating to `parent`.
    pub fn new(parent: Arc<P>) -> Self {
        Self {
            roots: RwLock::new(Vec::new()),
            parent,
        }
    }

    /// Adds a root to the classpath. Idempotent: a root already present is
    /// silently discarded rather than duplicated.
    pub fn add_url(&self, root: impl Into<String>) {
        let root = root.into();
        let mut roots = self.roots.write();
        if !roots.iter().any(|existing| existing == &root) {
            roots.push(root);
        }
    }

    /// A snapshot of the currently registered roots, in insertion order.
    pub fn roots(&self) -> Vec<String> {
        self.roots.read().clone()
    }

    /// The parent loader that actual resolution is delegated to.
    pub fn parent(&self) -> &Arc<P> {
        &self.parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_url_is_idempotent() {
        let loader = PluginClassLoader::new(Arc::new(()));
        loader.add_url("path/a");
        loader.add_url("path/b");
        loader.add_url("path/a");
        assert_eq!(loader.roots(), vec!["path/a".to_string(), "path/b".to_string()]);
    }
}
