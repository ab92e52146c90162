//! Bounded, named, typed resource dictionary.
//!
//! Loaders construct materials, geometries, light sets, and physics worlds
//! and hand them to item lists by name through a [`ResourceRegistry`]. The
//! registry is consulted by, but not part of, the traversal protocol: item
//! lists resolve names during setup, never per frame.
//!
//! Capacity is fixed at creation; insertion fails with
//! [`SceneError::ResourceExhausted`] once full.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::config::RegistryConfig;
use crate::scene::error::SceneError;

/// Type tag of a registered resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    /// A material handed to draw lists.
    Material,
    /// Geometry shared between model nodes.
    Geometry,
    /// A set of lights consumed by light preparers.
    LightSet,
    /// A physics world consumed by physics steppers.
    PhysicsWorld,
    /// A scene node definition, typically a template to instantiate.
    SceneNode,
    /// An application-defined resource kind.
    Custom(&'static str),
}

/// Shared handle to a registered resource.
pub type ResourceHandle = Arc<dyn Any + Send + Sync>;

struct ResourceEntry {
    resource_type: ResourceType,
    resource: ResourceHandle,
    owned: bool,
}

/// Fixed-capacity name-to-resource table.
pub struct ResourceRegistry {
    capacity: usize,
    entries: HashMap<String, ResourceEntry>,
}

impl ResourceRegistry {
    /// Create a registry holding at most `capacity` named resources.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// Create a registry from configuration.
    pub fn with_config(config: &RegistryConfig) -> Self {
        Self::new(config.capacity)
    }

    /// Register a resource under a unique name.
    ///
    /// `owned` records whether the registry is the resource's nominal owner;
    /// loaders use it to decide who is responsible for teardown side effects
    /// beyond dropping the shared handle.
    ///
    /// Fails with [`SceneError::InvalidArgument`] if the name is taken and
    /// [`SceneError::ResourceExhausted`] if the registry is full.
    pub fn add(
        &mut self,
        name: &str,
        resource_type: ResourceType,
        resource: ResourceHandle,
        owned: bool,
    ) -> Result<(), SceneError> {
        if self.entries.contains_key(name) {
            return Err(SceneError::InvalidArgument(format!(
                "Resource '{name}' is already registered"
            )));
        }
        if self.entries.len() >= self.capacity {
            return Err(SceneError::ResourceExhausted(format!(
                "Resource registry is full ({} entries)",
                self.capacity
            )));
        }

        log::debug!("Registering {resource_type:?} resource '{name}'");
        self.entries.insert(name.to_string(), ResourceEntry {
            resource_type,
            resource,
            owned,
        });
        Ok(())
    }

    /// Look up a resource by name.
    pub fn find(&self, name: &str) -> Result<(ResourceType, ResourceHandle), SceneError> {
        self.entries
            .get(name)
            .map(|entry| (entry.resource_type, entry.resource.clone()))
            .ok_or_else(|| SceneError::NotFound(format!("No resource named '{name}'")))
    }

    /// Look up a resource by name, downcast to a concrete type.
    ///
    /// [`SceneError::NotFound`] on a name miss,
    /// [`SceneError::InvalidArgument`] when the stored resource isn't a `T`.
    pub fn find_as<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, SceneError> {
        let (_, resource) = self.find(name)?;
        resource.downcast::<T>().map_err(|_| {
            SceneError::InvalidArgument(format!(
                "Resource '{name}' has a different type than requested"
            ))
        })
    }

    /// Unregister a resource.
    ///
    /// With `relinquish` the handle is returned so the caller takes over the
    /// reference; otherwise the registry's reference is simply dropped.
    /// Fails with [`SceneError::NotFound`] on a name miss.
    pub fn remove(
        &mut self,
        name: &str,
        relinquish: bool,
    ) -> Result<Option<ResourceHandle>, SceneError> {
        let entry = self
            .entries
            .remove(name)
            .ok_or_else(|| SceneError::NotFound(format!("No resource named '{name}'")))?;
        Ok(relinquish.then_some(entry.resource))
    }

    /// Whether the registry nominally owns the named resource.
    pub fn is_owned(&self, name: &str) -> Option<bool> {
        self.entries.get(name).map(|entry| entry.owned)
    }

    /// True if a resource is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of registered resources.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no resources are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The fixed capacity set at creation.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(name: &str) -> ResourceHandle {
        Arc::new(name.to_string())
    }

    #[test]
    fn test_add_and_find() {
        let mut registry = ResourceRegistry::new(4);
        registry
            .add("gold", ResourceType::Material, material("gold"), true)
            .unwrap();

        let (resource_type, _) = registry.find("gold").unwrap();
        assert_eq!(resource_type, ResourceType::Material);
        assert_eq!(*registry.find_as::<String>("gold").unwrap(), "gold");
        assert!(matches!(
            registry.find("silver"),
            Err(SceneError::NotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = ResourceRegistry::new(4);
        registry
            .add("gold", ResourceType::Material, material("gold"), true)
            .unwrap();
        let result = registry.add("gold", ResourceType::Geometry, material("other"), true);

        assert!(matches!(result, Err(SceneError::InvalidArgument(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_capacity_is_fixed() {
        let mut registry = ResourceRegistry::new(2);
        registry
            .add("x", ResourceType::Material, material("x"), true)
            .unwrap();
        registry
            .add("y", ResourceType::Material, material("y"), true)
            .unwrap();

        let overflow = registry.add("z", ResourceType::Material, material("z"), true);
        assert!(matches!(overflow, Err(SceneError::ResourceExhausted(_))));

        registry.remove("x", false).unwrap();
        registry
            .add("z", ResourceType::Material, material("z"), true)
            .unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_remove_relinquish_returns_handle() {
        let mut registry = ResourceRegistry::new(2);
        registry
            .add("gold", ResourceType::Material, material("gold"), false)
            .unwrap();

        let taken = registry.remove("gold", true).unwrap();
        assert!(taken.is_some());
        assert!(matches!(
            registry.remove("gold", true),
            Err(SceneError::NotFound(_))
        ));
    }

    #[test]
    fn test_wrong_type_downcast() {
        let mut registry = ResourceRegistry::new(2);
        registry
            .add("gold", ResourceType::Material, material("gold"), true)
            .unwrap();

        assert!(matches!(
            registry.find_as::<u32>("gold"),
            Err(SceneError::InvalidArgument(_))
        ));
    }
}
