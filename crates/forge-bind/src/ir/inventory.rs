//! Compile-time interface inventory
//!
//! Front ends that run as part of the compiled program can register
//! descriptors through the `linkme` distributed slice instead of writing
//! JSON files.

use crate::ir::InterfaceDescriptor;

/// Distributed slice for collecting interface descriptors at compile time
#[linkme::distributed_slice]
pub static BIND_INTERFACES: [fn() -> InterfaceDescriptor];

/// Collect all registered descriptors from the distributed slice
pub fn collect_interfaces() -> Vec<InterfaceDescriptor> {
    BIND_INTERFACES.iter().map(|f| f()).collect()
}

/// Registry for manually collecting descriptors (alternative to linkme)
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    interfaces: Vec<InterfaceDescriptor>,
}

impl DescriptorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from the distributed slice
    pub fn from_inventory() -> Self {
        Self {
            interfaces: collect_interfaces(),
        }
    }

    /// Register a descriptor, replacing an earlier one with the same name
    pub fn register(&mut self, descriptor: InterfaceDescriptor) {
        match self
            .interfaces
            .iter_mut()
            .find(|existing| existing.name == descriptor.name)
        {
            Some(existing) => *existing = descriptor,
            None => self.interfaces.push(descriptor),
        }
    }

    /// Look up a descriptor by interface name
    pub fn get(&self, name: &str) -> Option<&InterfaceDescriptor> {
        self.interfaces.iter().find(|d| d.name == name)
    }

    /// Get all registered descriptors
    pub fn interfaces(&self) -> &[InterfaceDescriptor] {
        &self.interfaces
    }

    /// Take ownership of the descriptors
    pub fn into_interfaces(self) -> Vec<InterfaceDescriptor> {
        self.interfaces
    }
}

/// Macro to register an interface descriptor in the distributed slice
#[macro_export]
macro_rules! register_interface {
    ($descriptor:expr) => {
        #[$crate::linkme::distributed_slice($crate::ir::BIND_INTERFACES)]
        #[linkme(crate = $crate::linkme)]
        static _BIND_INTERFACE: fn() -> $crate::ir::InterfaceDescriptor = || $descriptor;
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{IdlType, Operation, Signature};

    #[test]
    fn test_registry_replaces_same_name() {
        let mut registry = DescriptorRegistry::new();
        registry.register(InterfaceDescriptor::callback_interface("EventListener"));
        registry.register(
            InterfaceDescriptor::callback_interface("EventListener").operation(Operation::new(
                "handleEvent",
                Signature::new(IdlType::Void, vec![]),
            )),
        );

        assert_eq!(registry.interfaces().len(), 1);
        let listener = registry.get("EventListener").unwrap();
        assert_eq!(listener.regular_operations().count(), 1);
    }

    #[test]
    fn test_registry_from_inventory() {
        let registry = DescriptorRegistry::from_inventory();
        assert!(registry.get("NoSuchInterface").is_none());
    }
}
