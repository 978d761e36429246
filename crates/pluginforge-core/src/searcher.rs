//! [`PluginSearcher`]: breadth-first closure over a [`ClassCatalog`] to find
//! concrete descendants of the plugin marker.

use std::collections::{HashSet, VecDeque};

use crate::class_info::ClassCatalog;

/// Walks a [`ClassCatalog`] to find concrete types that transitively
/// implement a given marker type, through superclass and/or interface edges.
///
/// This is the pure, catalog-driven half of what the spec calls the plugin
/// searcher: it has no notion of archives or classpaths (see
/// [`PluginClassLoader`](crate::class_loader::PluginClassLoader) for that),
/// only of the metadata graph itself.
#[derive(Debug, Clone, Copy)]
pub struct PluginSearcher<'a> {
    catalog: &'a ClassCatalog,
    marker: &'a str,
}

impl<'a> PluginSearcher<'a> {
    /// Builds a searcher over `catalog`, matching descendants of `marker`.
    pub fn new(catalog: &'a ClassCatalog, marker: &'a str) -> Self {
        Self { catalog, marker }
    }

    /// Returns every concrete type in the catalog that transitively extends
    /// or implements the marker.
    ///
    /// Ordering is not a stable contract (spec §4.3): callers must not
    /// depend on iteration order across invocations. Internally this
    /// iterates the catalog's own order, which is a [`HashMap`](std::collections::HashMap)
    /// and therefore already unordered.
    pub fn search(&self) -> Vec<String> {
        self.catalog
            .iter()
            .filter(|info| info.is_concrete && self.matches(&info.name))
            .map(|info| info.name.clone())
            .collect()
    }

    /// `true` if `candidate` is a descendant of the marker via any sequence
    /// of superclass or interface edges, regardless of whether `candidate`
    /// itself is concrete.
    fn matches(&self, candidate: &str) -> bool {
        let mut frontier: VecDeque<String> = VecDeque::new();
        let mut visited: HashSet<String> = HashSet::new();
        frontier.push_back(candidate.to_string());

        while let Some(name) = frontier.pop_front() {
            if !visited.insert(name.clone()) {
                continue;
            }
            if name == self.marker {
                return true;
            }
            let Some(info) = self.catalog.get(&name) else {
                continue;
            };
            if info.super_class_name.as_deref() == Some(self.marker) {
                return true;
            }
            if info.interfaces.iter().any(|i| i == self.marker) {
                return true;
            }
            if let Some(super_name) = &info.super_class_name {
                frontier.push_back(super_name.clone());
            }
            for iface in &info.interfaces {
                frontier.push_back(iface.clone());
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_info::ClassInfo;

    fn catalog() -> ClassCatalog {
        ClassCatalog::from_entries([
            ClassInfo::concrete("GreeterPlugin").implements("Plugin"),
            ClassInfo::concrete("BasePlugin").implements("Plugin").abstract_type(),
            ClassInfo::concrete("ChildPlugin").extends("BasePlugin"),
            ClassInfo::concrete("Unrelated"),
            ClassInfo::concrete("IndirectPlugin").extends("MiddleLayer"),
            ClassInfo::concrete("MiddleLayer").implements("Plugin").abstract_type(),
        ])
    }

    #[test]
    fn direct_interface_match() {
        let cat = catalog();
        let out = PluginSearcher::new(&cat, "Plugin").search();
        assert!(out.contains(&"GreeterPlugin".to_string()));
    }

    #[test]
    fn transitive_through_superclass_and_interface() {
        let cat = catalog();
        let out = PluginSearcher::new(&cat, "Plugin").search();
        assert!(out.contains(&"ChildPlugin".to_string()));
        assert!(out.contains(&"IndirectPlugin".to_string()));
    }

    #[test]
    fn abstract_ancestor_itself_excluded() {
        let cat = catalog();
        let out = PluginSearcher::new(&cat, "Plugin").search();
        assert!(!out.contains(&"BasePlugin".to_string()));
        assert!(!out.contains(&"MiddleLayer".to_string()));
    }

    #[test]
    fn unrelated_type_excluded() {
        let cat = catalog();
        let out = PluginSearcher::new(&cat, "Plugin").search();
        assert!(!out.contains(&"Unrelated".to_string()));
    }
}
