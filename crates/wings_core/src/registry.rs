//! Process-wide registry of metadata adapters.
//!
//! # Responsibility
//! - Resolve adapters by symbolic name for components that need lookup.
//!
//! # Invariants
//! - At most one adapter per name.
//! - Names are non-empty lowercase ascii, digits, `_` or `-`.
//! - Adapters are registered at startup; `replace` is the test harness path
//!   for swapping one in place, and `clear` is teardown.

use crate::adapter::MetadataAdapter;
use log::info;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("adapter name is invalid: {0}")]
    InvalidAdapterName(String),
    #[error("adapter already registered: {0}")]
    DuplicateAdapter(String),
    #[error("adapter not found: {0}")]
    AdapterNotFound(String),
}

/// Explicit registry object; construct once and pass by reference.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: BTreeMap<String, Arc<MetadataAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `adapter` under its own name.
    pub fn register(&mut self, adapter: Arc<MetadataAdapter>) -> Result<(), RegistryError> {
        let name = validated_name(&adapter)?;
        if self.adapters.contains_key(name.as_str()) {
            return Err(RegistryError::DuplicateAdapter(name));
        }

        info!("event=adapter_register module=registry status=ok adapter={name}");
        self.adapters.insert(name, adapter);
        Ok(())
    }

    /// Registers `adapter`, swapping out any adapter of the same name.
    ///
    /// Returns the previous adapter. Intended for test harnesses.
    pub fn replace(
        &mut self,
        adapter: Arc<MetadataAdapter>,
    ) -> Result<Option<Arc<MetadataAdapter>>, RegistryError> {
        let name = validated_name(&adapter)?;
        info!("event=adapter_register module=registry status=ok adapter={name} mode=replace");
        Ok(self.adapters.insert(name, adapter))
    }

    pub fn find(&self, name: &str) -> Result<Arc<MetadataAdapter>, RegistryError> {
        let normalized = name.trim();
        self.adapters
            .get(normalized)
            .cloned()
            .ok_or_else(|| RegistryError::AdapterNotFound(normalized.to_string()))
    }

    pub fn unregister(&mut self, name: &str) -> Option<Arc<MetadataAdapter>> {
        self.adapters.remove(name.trim())
    }

    /// Drops every registration.
    pub fn clear(&mut self) {
        self.adapters.clear();
    }

    /// Returns sorted adapter names.
    pub fn names(&self) -> Vec<String> {
        self.adapters.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

pub fn is_valid_adapter_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

fn validated_name(adapter: &MetadataAdapter) -> Result<String, RegistryError> {
    let name = adapter.name().trim().to_string();
    if !is_valid_adapter_name(&name) {
        return Err(RegistryError::InvalidAdapterName(name));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::{is_valid_adapter_name, AdapterRegistry, RegistryError};
    use crate::adapter::{MetadataAdapter, ResourceFactory};
    use crate::db::open_db_in_memory;
    use std::sync::Arc;

    fn adapter(name: &str) -> Arc<MetadataAdapter> {
        MetadataAdapter::new(name, open_db_in_memory().unwrap(), ResourceFactory::new())
    }

    #[test]
    fn registers_and_finds_by_trimmed_name() {
        let mut registry = AdapterRegistry::new();
        registry.register(adapter("wings")).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.find("  wings ").unwrap().name(), "wings");
        assert!(matches!(
            registry.find("postgres"),
            Err(RegistryError::AdapterNotFound(name)) if name == "postgres"
        ));
    }

    #[test]
    fn rejects_invalid_or_duplicate_names() {
        let mut registry = AdapterRegistry::new();
        assert!(matches!(
            registry.register(adapter("Indexing Persister")),
            Err(RegistryError::InvalidAdapterName(_))
        ));
        assert!(matches!(
            registry.register(adapter("   ")),
            Err(RegistryError::InvalidAdapterName(_))
        ));

        registry.register(adapter("indexing_persister")).unwrap();
        assert!(matches!(
            registry.register(adapter("indexing_persister")),
            Err(RegistryError::DuplicateAdapter(_))
        ));
    }

    #[test]
    fn replace_swaps_adapter_and_returns_previous() {
        let mut registry = AdapterRegistry::new();
        let first = adapter("wings");
        registry.register(Arc::clone(&first)).unwrap();

        let second = adapter("wings");
        let previous = registry.replace(Arc::clone(&second)).unwrap().unwrap();

        assert!(Arc::ptr_eq(&previous, &first));
        assert!(Arc::ptr_eq(&registry.find("wings").unwrap(), &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn teardown_empties_registry() {
        let mut registry = AdapterRegistry::new();
        registry.register(adapter("a")).unwrap();
        registry.register(adapter("b")).unwrap();
        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);

        assert!(registry.unregister("a").is_some());
        assert!(registry.unregister("a").is_none());
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn name_rule() {
        assert!(is_valid_adapter_name("fedora-6_test"));
        assert!(!is_valid_adapter_name("Fedora"));
        assert!(!is_valid_adapter_name(""));
    }
}
