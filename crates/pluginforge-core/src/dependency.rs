//! The [`Dependency`] value object.

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::error::DependencyError;

/// An immutable, named, typed value held by a [`DependencyManager`](crate::dependency_manager::DependencyManager).
///
/// A dependency carries two type tags that may differ:
///
/// - [`abstract_type`](Self::abstract_type) — the *declared* type of the
///   binding, used by name- and type-based queries. Set at registration time
///   via [`Dependency::tagged`]; defaults to the value's own type.
/// - [`value_type`](Self::value_type) — the concrete runtime type of
///   [`value`](Self::value). Always the type actually stored.
///
/// Additional marker types can be attached with [`Dependency::with_tag`] to
/// model "this value also satisfies interface `X`" without Rust trait-object
/// polymorphism; [`DependencyManager::find_by_value_class`] treats any tagged
/// type as assignable.
#[derive(Clone)]
pub struct Dependency {
    name: Arc<str>,
    abstract_type: TypeId,
    abstract_type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
    value_type: TypeId,
    value_type_name: &'static str,
    tags: Arc<[(TypeId, &'static str)]>,
}

impl std::fmt::Debug for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependency")
            .field("name", &self.name)
            .field("abstract_type", &self.abstract_type_name)
            .field("value_type", &self.value_type_name)
            .finish()
    }
}

impl Dependency {
    /// Builds a dependency whose `abstract_type` is the value's own type.
    ///
    /// Fails with [`DependencyError::BadDependency`] if `name` is empty.
    pub fn new<V: Any + Send + Sync + 'static>(
        name: impl Into<Arc<str>>,
        value: V,
    ) -> Result<Self, DependencyError> {
        Self::tagged::<V, V>(name, value)
    }

    /// Builds a dependency whose declared `abstract_type` is `A`, distinct
    /// from the concrete stored type `V`.
    ///
    /// This is the Rust-idiomatic stand-in for registering a value "as" a
    /// supertype or interface: `A` is typically a zero-sized marker type or
    /// a trait's companion tag, not the value's own type.
    pub fn tagged<A: 'static, V: Any + Send + Sync + 'static>(
        name: impl Into<Arc<str>>,
        value: V,
    ) -> Result<Self, DependencyError> {
        let name = name.into();
        if name.is_empty() {
            return Err(DependencyError::BadDependency);
        }
        Ok(Self {
            name,
            abstract_type: TypeId::of::<A>(),
            abstract_type_name: std::any::type_name::<A>(),
            value: Arc::new(value),
            value_type: TypeId::of::<V>(),
            value_type_name: std::any::type_name::<V>(),
            tags: Arc::new([]),
        })
    }

    /// Assembles a dependency from already type-erased parts. Used by
    /// [`DependencyManager::add_anonymous`](crate::dependency_manager::DependencyManager::add_anonymous)
    /// once it has minted a fresh name.
    pub(crate) fn from_parts(
        name: Arc<str>,
        abstract_type: TypeId,
        abstract_type_name: &'static str,
        value: Arc<dyn Any + Send + Sync>,
        value_type: TypeId,
        value_type_name: &'static str,
    ) -> Self {
        Self {
            name,
            abstract_type,
            abstract_type_name,
            value,
            value_type,
            value_type_name,
            tags: Arc::new([]),
        }
    }

    /// Declares that this dependency's value also satisfies marker type `T`,
    /// widening what [`DependencyManager::find_by_value_class`] will match it
    /// against.
    pub fn with_tag<T: 'static>(mut self) -> Self {
        let mut tags: Vec<_> = self.tags.iter().copied().collect();
        tags.push((TypeId::of::<T>(), std::any::type_name::<T>()));
        self.tags = tags.into();
        self
    }

    /// The dependency's unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared ("abstract") type of this binding.
    pub fn abstract_type(&self) -> TypeId {
        self.abstract_type
    }

    /// The name of the declared ("abstract") type, for diagnostics.
    pub fn abstract_type_name(&self) -> &'static str {
        self.abstract_type_name
    }

    /// The concrete runtime type of [`value`](Self::value).
    pub fn value_type(&self) -> TypeId {
        self.value_type
    }

    /// The name of the concrete value type, for diagnostics.
    pub fn value_type_name(&self) -> &'static str {
        self.value_type_name
    }

    /// Returns `true` if this dependency may be resolved for a parameter
    /// declared as `target` — an exact match on the value type, the abstract
    /// type, or any tag attached via [`with_tag`](Self::with_tag).
    pub fn is_assignable_to(&self, target: TypeId) -> bool {
        self.value_type == target
            || self.abstract_type == target
            || self.tags.iter().any(|(t, _)| *t == target)
    }

    /// Attempts to downcast the stored value to `T`, cloning the shared
    /// reference on success.
    pub fn value<T: Any + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    /// The raw, type-erased value.
    pub fn raw_value(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_is_rejected() {
        let err = Dependency::new("", 1i32).unwrap_err();
        assert_eq!(err, DependencyError::BadDependency);
    }

    #[test]
    fn value_class_differs_from_declared_type() {
        struct AsGreeting;
        let dep = Dependency::tagged::<AsGreeting, String>("greeting", "hi".to_string()).unwrap();
        assert_eq!(dep.value_type(), TypeId::of::<String>());
        assert_eq!(dep.abstract_type(), TypeId::of::<AsGreeting>());
        assert!(dep.is_assignable_to(TypeId::of::<String>()));
        assert!(dep.is_assignable_to(TypeId::of::<AsGreeting>()));
        assert!(!dep.is_assignable_to(TypeId::of::<i32>()));
    }

    #[test]
    fn tags_widen_assignability() {
        struct Interface;
        let dep = Dependency::new("svc", 7u8).unwrap().with_tag::<Interface>();
        assert!(dep.is_assignable_to(TypeId::of::<u8>()));
        assert!(dep.is_assignable_to(TypeId::of::<Interface>()));
    }

    #[test]
    fn downcast_roundtrips() {
        let dep = Dependency::new("n", 42i64).unwrap();
        assert_eq!(*dep.value::<i64>().unwrap(), 42);
        assert!(dep.value::<i32>().is_none());
    }
}
