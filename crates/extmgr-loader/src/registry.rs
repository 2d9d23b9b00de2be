//! Extension registry: configured extensions in insertion order.
//!
//! Insertion order is load order and is never changed. Lookups used by the
//! dependency validator only ever see the entries strictly before a given
//! position.

use std::path::Path;

use tracing::debug;

use extmgr_core::config::extension::ShutdownOrder;
use extmgr_core::error::ExtensionError;
use extmgr_core::result::ExtResult;

use crate::descriptor::{ExtensionDescriptor, ExtensionStatus};

/// Ordered, append-only collection of extension descriptors.
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    descriptors: Vec<ExtensionDescriptor>,
}

impl ExtensionRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
        }
    }

    /// Appends a descriptor for `(module_path, config_path)`.
    ///
    /// Duplicates are not detected; registering the same module twice is
    /// a caller error that surfaces when the second copy initializes.
    pub fn add(&mut self, module_path: &Path, config_path: &Path) -> ExtResult<()> {
        let descriptor = ExtensionDescriptor::new(module_path, config_path)?;
        self.descriptors
            .try_reserve(1)
            .map_err(|e| ExtensionError::allocation(format!("extension registry: {e}")))?;

        debug!(
            module = %module_path.display(),
            position = self.descriptors.len(),
            "Extension added to the list"
        );

        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Number of registered extensions.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Iterates descriptors in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, ExtensionDescriptor> {
        self.descriptors.iter()
    }

    /// Descriptor at `index`.
    pub fn get(&self, index: usize) -> Option<&ExtensionDescriptor> {
        self.descriptors.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut ExtensionDescriptor> {
        self.descriptors.get_mut(index)
    }

    /// Every descriptor strictly before `index`.
    pub fn earlier_than(&self, index: usize) -> &[ExtensionDescriptor] {
        &self.descriptors[..index.min(self.descriptors.len())]
    }

    /// Status snapshot of every descriptor, in order.
    pub fn statuses(&self) -> Vec<ExtensionStatus> {
        self.descriptors.iter().map(|d| d.status()).collect()
    }

    /// Removes every descriptor, returning them in teardown order.
    pub(crate) fn drain(&mut self, order: ShutdownOrder) -> Vec<ExtensionDescriptor> {
        let mut drained = std::mem::take(&mut self.descriptors);
        if order == ShutdownOrder::Reverse {
            drained.reverse();
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(paths: &[&str]) -> ExtensionRegistry {
        let mut registry = ExtensionRegistry::new();
        for path in paths {
            registry
                .add(Path::new(path), Path::new(""))
                .expect("add");
        }
        registry
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let registry = registry_with(&["c.fdx", "a.fdx", "b.fdx"]);
        let paths: Vec<_> = registry
            .iter()
            .map(|d| d.module_path().to_string_lossy().into_owned())
            .collect();
        assert_eq!(paths, vec!["c.fdx", "a.fdx", "b.fdx"]);
    }

    #[test]
    fn test_add_does_not_deduplicate() {
        let registry = registry_with(&["a.fdx", "a.fdx"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_add_rejects_empty_module_path() {
        let mut registry = ExtensionRegistry::new();
        assert!(registry.add(Path::new(""), Path::new("x.cfg")).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_earlier_than_excludes_self() {
        let registry = registry_with(&["a.fdx", "b.fdx", "c.fdx"]);
        assert!(registry.earlier_than(0).is_empty());
        assert_eq!(registry.earlier_than(2).len(), 2);
        assert_eq!(registry.earlier_than(10).len(), 3);
    }

    #[test]
    fn test_drain_orders() {
        let mut registry = registry_with(&["a.fdx", "b.fdx"]);
        let fifo: Vec<_> = registry
            .drain(ShutdownOrder::Fifo)
            .iter()
            .map(|d| d.module_path().to_path_buf())
            .collect();
        assert_eq!(fifo, vec![Path::new("a.fdx"), Path::new("b.fdx")]);
        assert!(registry.is_empty());

        let mut registry = registry_with(&["a.fdx", "b.fdx"]);
        let reverse: Vec<_> = registry
            .drain(ShutdownOrder::Reverse)
            .iter()
            .map(|d| d.module_path().to_path_buf())
            .collect();
        assert_eq!(reverse, vec![Path::new("b.fdx"), Path::new("a.fdx")]);
    }
}
