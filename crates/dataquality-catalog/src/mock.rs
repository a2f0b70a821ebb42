//! In-memory definition provider for testing
//!
//! Returns predefined definitions without touching the file system. It counts
//! fetches so callers can assert on caching, and can simulate failures and
//! latency.
//!
//! ## Usage
//!
//! ```rust
//! use dataquality_catalog::{DefinitionProvider, MockDefinitionProvider};
//! use dataquality_core::{Definition, DefinitionKind, FieldDefinition};
//!
//! let provider = MockDefinitionProvider::new()
//!     .with_class(Definition::new("Product", vec![FieldDefinition::plain("sku")]));
//!
//! let definition = provider.definition(DefinitionKind::Class, "Product").unwrap();
//! assert_eq!(definition.fields.len(), 1);
//! assert_eq!(provider.fetch_count(), 1);
//! ```

use crate::adapter::{CatalogError, DefinitionProvider};
use dataquality_core::{Definition, DefinitionKind};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Mock definition provider
#[derive(Debug, Default)]
pub struct MockDefinitionProvider {
    /// Predefined definitions by (kind, name)
    definitions: RwLock<HashMap<(DefinitionKind, String), Definition>>,

    /// Definitions that fail with an IO error
    failing: RwLock<HashSet<(DefinitionKind, String)>>,

    /// Number of `definition` calls
    fetches: AtomicUsize,

    /// Simulated fetch latency
    latency: Duration,
}

impl MockDefinitionProvider {
    /// Create a provider with no definitions
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition
    pub fn add(&self, kind: DefinitionKind, definition: Definition) {
        if let Ok(mut definitions) = self.definitions.write() {
            definitions.insert((kind, definition.name.clone()), definition);
        }
    }

    /// Add a class definition (builder style)
    pub fn with_class(self, definition: Definition) -> Self {
        self.add(DefinitionKind::Class, definition);
        self
    }

    /// Add an objectbrick definition (builder style)
    pub fn with_brick(self, definition: Definition) -> Self {
        self.add(DefinitionKind::ObjectBrick, definition);
        self
    }

    /// Add a fieldcollection definition (builder style)
    pub fn with_collection(self, definition: Definition) -> Self {
        self.add(DefinitionKind::FieldCollection, definition);
        self
    }

    /// Make fetching a definition fail
    pub fn with_failure(self, kind: DefinitionKind, name: impl Into<String>) -> Self {
        if let Ok(mut failing) = self.failing.write() {
            failing.insert((kind, name.into()));
        }
        self
    }

    /// Simulate slow fetches
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of fetches so far
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl DefinitionProvider for MockDefinitionProvider {
    fn name(&self) -> &'static str {
        "Mock"
    }

    fn definition(&self, kind: DefinitionKind, name: &str) -> Result<Definition, CatalogError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }

        let key = (kind, name.to_string());
        if self
            .failing
            .read()
            .map(|failing| failing.contains(&key))
            .unwrap_or(false)
        {
            return Err(CatalogError::Io(format!("simulated failure for {} {}", kind, name)));
        }

        self.definitions
            .read()
            .ok()
            .and_then(|definitions| definitions.get(&key).cloned())
            .ok_or(CatalogError::NotFound {
                kind,
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataquality_core::FieldDefinition;

    #[test]
    fn kinds_do_not_collide() {
        let provider = MockDefinitionProvider::new()
            .with_class(Definition::new("Shared", vec![FieldDefinition::plain("a")]))
            .with_brick(Definition::new("Shared", vec![FieldDefinition::plain("b")]));

        let class = provider.definition(DefinitionKind::Class, "Shared").unwrap();
        let brick = provider.definition(DefinitionKind::ObjectBrick, "Shared").unwrap();
        assert_eq!(class.fields[0].name, "a");
        assert_eq!(brick.fields[0].name, "b");
        assert!(provider
            .definition(DefinitionKind::FieldCollection, "Shared")
            .is_err());
        assert_eq!(provider.fetch_count(), 3);
    }

    #[test]
    fn simulated_failure() {
        let provider = MockDefinitionProvider::new()
            .with_class(Definition::new("Product", vec![]))
            .with_failure(DefinitionKind::Class, "Product");

        let err = provider.definition(DefinitionKind::Class, "Product").unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
