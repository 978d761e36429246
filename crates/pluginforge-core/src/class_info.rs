//! Abstract class/metadata graph consumed by the [`searcher`](crate::searcher).
//!
//! This models the host's "metadata scanner" contract (spec §6): a flat
//! table of declared types together with their supertype and interface
//! edges. The runtime never populates this itself; it is handed a
//! [`ClassCatalog`] built from whatever external scanning mechanism the
//! embedder uses (reflection, a build-time registry, `linkme`, …).

use std::collections::HashMap;

/// One declared type's shape, as reported by the external metadata scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    /// Fully-qualified type name.
    pub name: String,
    /// `true` if the type can be instantiated (not an interface, not abstract).
    pub is_concrete: bool,
    /// The type's direct supertype, if any.
    pub super_class_name: Option<String>,
    /// Interfaces the type directly declares.
    pub interfaces: Vec<String>,
    /// Opaque origin (archive path, crate name, …), carried for diagnostics only.
    pub location: Option<String>,
}

impl ClassInfo {
    /// Convenience constructor for a concrete type with no supertype or interfaces.
    pub fn concrete(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_concrete: true,
            super_class_name: None,
            interfaces: Vec::new(),
            location: None,
        }
    }

    /// Builder: set the direct supertype.
    pub fn extends(mut self, super_name: impl Into<String>) -> Self {
        self.super_class_name = Some(super_name.into());
        self
    }

    /// Builder: declare an implemented interface.
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Builder: mark the type abstract/interface (not instantiable).
    pub fn abstract_type(mut self) -> Self {
        self.is_concrete = false;
        self
    }
}

/// A flat table of [`ClassInfo`] keyed by type name, as produced by the
/// external metadata scanner.
///
/// Mirrors the spec's "mapping `name -> ClassInfo`" helper: this is the
/// in-memory representation [`PluginSearcher`](crate::searcher::PluginSearcher)
/// walks.
#[derive(Debug, Clone, Default)]
pub struct ClassCatalog {
    by_name: HashMap<String, ClassInfo>,
}

impl ClassCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from an iterator of scanned [`ClassInfo`] entries.
    pub fn from_entries(entries: impl IntoIterator<Item = ClassInfo>) -> Self {
        let mut by_name = HashMap::new();
        for info in entries {
            by_name.insert(info.name.clone(), info);
        }
        Self { by_name }
    }

    /// Inserts or replaces an entry.
    pub fn insert(&mut self, info: ClassInfo) {
        self.by_name.insert(info.name.clone(), info);
    }

    /// Looks up a type's metadata by name.
    pub fn get(&self, name: &str) -> Option<&ClassInfo> {
        self.by_name.get(name)
    }

    /// Iterates over every declared type in the catalog.
    pub fn iter(&self) -> impl Iterator<Item = &ClassInfo> {
        self.by_name.values()
    }

    /// Number of declared types in the catalog.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// `true` if the catalog holds no entries.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
