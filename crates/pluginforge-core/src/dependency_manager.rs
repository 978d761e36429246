//! [`DependencyManager`]: a named registry of [`Dependency`] values,
//! queryable by name, by value class, or by abstract (declared) type.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::dependency::Dependency;
use crate::error::DependencyError;

/// A named, typed registry of [`Dependency`] values.
///
/// Backed by a [`parking_lot::RwLock`] over an insertion-ordered map, since
/// §5 of the contract requires the registry to be a "concurrency-safe map"
/// with `findByValueClass` honoring insertion order and the unnamed
/// resolver picking the *last* matching entry.
pub struct DependencyManager {
    inner: RwLock<Inner>,
}

struct Inner {
    /// Insertion-ordered; a `HashMap` alone cannot give the ordering
    /// guarantee the spec's "unnamed resolver picks the last entry" rule
    /// depends on, so entries are kept in parallel as an ordered `Vec` of
    /// names alongside the lookup map.
    order: Vec<Arc<str>>,
    by_name: HashMap<Arc<str>, Dependency>,
}

impl Default for DependencyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyManager {
    /// An empty, mutable manager.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                order: Vec::new(),
                by_name: HashMap::new(),
            }),
        }
    }

    /// Builds the designated **Empty** sentinel: every [`add`](Self::add)
    /// call silently no-ops and reports success, per spec §4.1. Used as the
    /// default scoped manager where none was supplied.
    pub fn empty() -> Self {
        Self {
            inner: RwLock::new(Inner {
                order: Vec::new(),
                by_name: HashMap::new(),
            }),
        }
    }

    /// Registers a dependency under a freshly generated unique name.
    pub fn add_anonymous(&self, dep: impl Into<AnonymousValue>) -> Result<Arc<str>, DependencyError> {
        let AnonymousValue { value, abstract_type, abstract_type_name, value_type, value_type_name } = dep.into();
        let name: Arc<str> = Arc::from(uuid::Uuid::new_v4().to_string());
        let dependency = Dependency::from_parts(
            name.clone(),
            abstract_type,
            abstract_type_name,
            value,
            value_type,
            value_type_name,
        );
        self.insert(dependency)?;
        Ok(name)
    }

    /// Registers `dependency`, failing if its name is already bound.
    pub fn add(&self, dependency: Dependency) -> Result<(), DependencyError> {
        self.insert(dependency)
    }

    fn insert(&self, dependency: Dependency) -> Result<(), DependencyError> {
        let mut inner = self.inner.write();
        let name = Arc::from(dependency.name());
        if inner.by_name.contains_key(&name) {
            return Err(DependencyError::DuplicateDependency(dependency.name().to_string()));
        }
        inner.order.push(Arc::clone(&name));
        inner.by_name.insert(name, dependency);
        Ok(())
    }

    /// Looks up a dependency by its exact name.
    pub fn find(&self, name: &str) -> Option<Dependency> {
        self.inner.read().by_name.get(name).cloned()
    }

    /// All entries whose abstract (declared) type matches `type_id`.
    pub fn find_by_type(&self, type_id: TypeId) -> Vec<Dependency> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|name| inner.by_name.get(name))
            .filter(|dep| dep.abstract_type() == type_id)
            .cloned()
            .collect()
    }

    /// All entries whose value (or any tag) is assignable to `type_id`, in
    /// insertion order.
    pub fn find_by_value_class(&self, type_id: TypeId) -> Vec<Dependency> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|name| inner.by_name.get(name))
            .filter(|dep| dep.is_assignable_to(type_id))
            .cloned()
            .collect()
    }

    /// Removes and returns the entry named `name`, if present.
    pub fn remove(&self, name: &str) -> Option<Dependency> {
        let mut inner = self.inner.write();
        let removed = inner.by_name.remove(name);
        if removed.is_some() {
            inner.order.retain(|n| n.as_ref() != name);
        }
        removed
    }

    /// Removes and returns every entry whose abstract type matches `type_id`.
    pub fn remove_by_type(&self, type_id: TypeId) -> Vec<Dependency> {
        self.remove_where(|dep| dep.abstract_type() == type_id)
    }

    /// Removes and returns every entry assignable to `type_id` by value class.
    pub fn remove_by_value_class(&self, type_id: TypeId) -> Vec<Dependency> {
        self.remove_where(|dep| dep.is_assignable_to(type_id))
    }

    fn remove_where(&self, pred: impl Fn(&Dependency) -> bool) -> Vec<Dependency> {
        let mut inner = self.inner.write();
        let (removed_names, kept): (Vec<_>, Vec<_>) = inner
            .order
            .iter()
            .cloned()
            .partition(|name| inner.by_name.get(name).map(&pred).unwrap_or(false));
        let mut removed = Vec::with_capacity(removed_names.len());
        for name in &removed_names {
            if let Some(dep) = inner.by_name.remove(name) {
                removed.push(dep);
            }
        }
        inner.order = kept;
        removed
    }

    /// A name-keyed snapshot of every entry.
    pub fn to_map(&self) -> HashMap<Arc<str>, Dependency> {
        let inner = self.inner.read();
        inner.by_name.clone()
    }

    /// A snapshot of every entry, in insertion order.
    pub fn to_seq(&self) -> Vec<Dependency> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|name| inner.by_name.get(name))
            .cloned()
            .collect()
    }

    /// Number of bound entries.
    pub fn len(&self) -> usize {
        self.inner.read().by_name.len()
    }

    /// `true` if no dependency is bound.
    pub fn is_empty(&self) -> bool {
        self.inner.read().by_name.is_empty()
    }
}

/// A type-erased payload for [`DependencyManager::add_anonymous`], built via
/// [`Dependency`]'s own constructors and then stripped of its generated name.
pub struct AnonymousValue {
    value: Arc<dyn std::any::Any + Send + Sync>,
    abstract_type: TypeId,
    abstract_type_name: &'static str,
    value_type: TypeId,
    value_type_name: &'static str,
}

impl<V: std::any::Any + Send + Sync + 'static> From<V> for AnonymousValue {
    fn from(value: V) -> Self {
        Self {
            value: Arc::new(value),
            abstract_type: TypeId::of::<V>(),
            abstract_type_name: std::any::type_name::<V>(),
            value_type: TypeId::of::<V>(),
            value_type_name: std::any::type_name::<V>(),
        }
    }
}

/// A sentinel manager whose [`add`](Self::add) silently no-ops, matching the
/// spec's `Empty` dependency manager used as a default scope.
pub struct EmptyDependencyManager;

impl EmptyDependencyManager {
    /// Always succeeds without storing anything.
    pub fn add(&self, _dependency: Dependency) -> Result<(), DependencyError> {
        Ok(())
    }

    /// Always reports no match.
    pub fn find(&self, _name: &str) -> Option<Dependency> {
        None
    }

    /// Always reports no matches.
    pub fn find_by_value_class(&self, _type_id: TypeId) -> Vec<Dependency> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_name_is_rejected() {
        let mgr = DependencyManager::new();
        mgr.add(Dependency::new("x", 1i32).unwrap()).unwrap();
        let err = mgr.add(Dependency::new("x", 2i32).unwrap()).unwrap_err();
        assert_eq!(err, DependencyError::DuplicateDependency("x".to_string()));
    }

    #[test]
    fn find_by_value_class_preserves_insertion_order() {
        let mgr = DependencyManager::new();
        mgr.add(Dependency::new("a", 1i32).unwrap()).unwrap();
        mgr.add(Dependency::new("b", 2i32).unwrap()).unwrap();
        mgr.add(Dependency::new("c", 3i32).unwrap()).unwrap();
        let found = mgr.find_by_value_class(TypeId::of::<i32>());
        let names: Vec<_> = found.iter().map(|d| d.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn remove_by_name_updates_order() {
        let mgr = DependencyManager::new();
        mgr.add(Dependency::new("a", 1i32).unwrap()).unwrap();
        mgr.add(Dependency::new("b", 2i32).unwrap()).unwrap();
        assert!(mgr.remove("a").is_some());
        assert_eq!(mgr.to_seq().len(), 1);
        assert_eq!(mgr.to_seq()[0].name(), "b");
    }

    #[test]
    fn anonymous_add_generates_unique_names() {
        let mgr = DependencyManager::new();
        let n1 = mgr.add_anonymous(1i32).unwrap();
        let n2 = mgr.add_anonymous(2i32).unwrap();
        assert_ne!(n1, n2);
        assert_eq!(mgr.len(), 2);
    }

    #[test]
    fn empty_sentinel_absorbs_adds() {
        let empty = EmptyDependencyManager;
        empty.add(Dependency::new("x", 1i32).unwrap()).unwrap();
        assert!(empty.find("x").is_none());
    }
}
