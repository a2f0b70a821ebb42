//! Definition resolver
//!
//! Turns a class name into an immutable [`Schema`] tree. Brick and collection
//! types referenced by a class are resolved into their own schemas and
//! attached to the class schema; they are never expanded further.
//! Every schema is built at most once per `(kind, name)` pair.

use crate::cache::OnceCache;
use dataquality_catalog::DefinitionProvider;
use dataquality_core::{base_class_name, DefinitionKind, EngineError, FieldKind, Schema};
use std::sync::Arc;

type SchemaKey = (DefinitionKind, String);

/// Caching schema resolver over a [`DefinitionProvider`]
pub struct DefinitionResolver {
    provider: Arc<dyn DefinitionProvider>,
    schemas: OnceCache<SchemaKey, Schema>,
}

impl DefinitionResolver {
    pub fn new(provider: Arc<dyn DefinitionProvider>) -> Self {
        Self {
            provider,
            schemas: OnceCache::new(),
        }
    }

    /// Schema of a class, with its brick and collection types attached
    ///
    /// Namespaced names resolve to their base name.
    pub fn resolve(&self, class_name: &str) -> Result<Arc<Schema>, EngineError> {
        self.resolve_kind(DefinitionKind::Class, base_class_name(class_name))
    }

    /// Schema of any definition kind
    pub fn resolve_kind(
        &self,
        kind: DefinitionKind,
        name: &str,
    ) -> Result<Arc<Schema>, EngineError> {
        let key = (kind, name.to_string());
        self.schemas.get_or_try_build(&key, || self.build(kind, name))
    }

    /// Forget one cached schema
    ///
    /// Class schemas embed their nested types, so after changing a brick or
    /// collection definition the owning classes must be invalidated as well.
    pub fn invalidate(&self, kind: DefinitionKind, name: &str) {
        self.schemas.invalidate(&(kind, name.to_string()));
    }

    /// Forget every cached schema
    pub fn clear(&self) {
        self.schemas.clear();
    }

    /// Provider used for definitions
    pub fn provider(&self) -> &dyn DefinitionProvider {
        self.provider.as_ref()
    }

    fn build(&self, kind: DefinitionKind, name: &str) -> Result<Schema, EngineError> {
        let definition = self.provider.definition(kind, name).map_err(|error| {
            tracing::warn!(
                provider = self.provider.name(),
                "Failed to resolve {} definition {}: {}",
                kind,
                name,
                error
            );
            EngineError::UnknownClass {
                kind,
                name: name.to_string(),
            }
        })?;

        let mut schema = Schema::from_definition(kind, definition);

        // Only classes own bricks and collections
        if kind == DefinitionKind::Class {
            let mut nested = Vec::new();
            for field in &schema.fields {
                let (nested_kind, allowed_types) = match &field.kind {
                    FieldKind::ObjectBrick { allowed_types } => {
                        (DefinitionKind::ObjectBrick, allowed_types)
                    }
                    FieldKind::FieldCollection { allowed_types } => {
                        (DefinitionKind::FieldCollection, allowed_types)
                    }
                    FieldKind::Plain
                    | FieldKind::Localized { .. }
                    | FieldKind::ClassificationStore
                    | FieldKind::Relation => continue,
                };

                for type_name in allowed_types {
                    let resolved = self.resolve_kind(nested_kind, type_name)?;
                    let key = format!("{}.{}", field.name, type_name);
                    let owned = Schema {
                        owner: Some(format!("{}.{}", schema.name, field.name)),
                        ..resolved.as_ref().clone()
                    };
                    nested.push((key, Arc::new(owned)));
                }
            }
            schema.nested.extend(nested);
        }

        tracing::debug!(
            "Resolved {} {} ({} fields, {} nested types)",
            kind,
            name,
            schema.fields.len(),
            schema.nested.len()
        );
        Ok(schema)
    }
}

impl std::fmt::Debug for DefinitionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefinitionResolver")
            .field("provider", &self.provider.name())
            .field("cached", &self.schemas.len())
            .finish()
    }
}
