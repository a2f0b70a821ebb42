//! Schema types and attribute categories

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Which registry a definition lives in
///
/// Classes, objectbricks and fieldcollections have separate namespaces, so a
/// brick type and a class may share a name without colliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    /// Top-level data object class
    Class,

    /// Objectbrick type
    #[serde(rename = "objectbrick")]
    ObjectBrick,

    /// Fieldcollection item type
    #[serde(rename = "fieldcollection")]
    FieldCollection,
}

impl DefinitionKind {
    /// Stable lowercase identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::ObjectBrick => "objectbrick",
            Self::FieldCollection => "fieldcollection",
        }
    }
}

impl std::fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structural kind of a field definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldKind {
    /// Scalar value stored directly on the object
    Plain,

    /// Container of per-locale child fields
    Localized {
        children: Vec<FieldDefinition>,
    },

    /// Polymorphic brick container
    #[serde(rename = "objectbrick")]
    ObjectBrick {
        allowed_types: Vec<String>,
    },

    /// Repeatable typed item container
    #[serde(rename = "fieldcollection")]
    FieldCollection {
        allowed_types: Vec<String>,
    },

    /// Open-ended key/value store
    #[serde(rename = "classificationstore")]
    ClassificationStore,

    /// Reference to other objects
    Relation,
}

/// A single field of a definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field name as used by the object accessors
    pub name: String,

    /// Human readable title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Structural kind
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDefinition {
    /// Create a plain field
    pub fn plain(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Plain)
    }

    /// Create a field with the given kind
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            title: None,
            kind,
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Title, falling back to the field name
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// A definition as produced by a definition provider
///
/// Brick and collection fields only name their allowed types here; the
/// resolver turns a `Definition` into a `Schema` with those types attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    /// Definition name (class, brick type or collection type)
    pub name: String,

    /// Human readable title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Ordered field definitions
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl Definition {
    /// Create a definition from fields
    pub fn new(name: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
        Self {
            name: name.into(),
            title: None,
            fields,
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Immutable, resolved schema tree
///
/// Nested brick and collection schemas are keyed by `"<field>.<type>"`.
/// Nested schemas never point back at their owner; `owner` only records the
/// owning path for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Registry the definition came from
    pub kind: DefinitionKind,

    /// Definition name
    pub name: String,

    /// Human readable title
    pub title: Option<String>,

    /// Ordered field definitions
    pub fields: Vec<FieldDefinition>,

    /// Resolved brick/collection schemas keyed by `"<field>.<type>"`
    pub nested: BTreeMap<String, Arc<Schema>>,

    /// Path of the owning field, for nested schemas
    pub owner: Option<String>,
}

impl Schema {
    /// Build a schema without nested types from a definition
    pub fn from_definition(kind: DefinitionKind, definition: Definition) -> Self {
        Self {
            kind,
            name: definition.name,
            title: definition.title,
            fields: definition.fields,
            nested: BTreeMap::new(),
            owner: None,
        }
    }

    /// Find a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Nested schema attached to `field` for `type_name`
    pub fn nested_schema(&self, field: &str, type_name: &str) -> Option<&Arc<Schema>> {
        self.nested.get(&format!("{}.{}", field, type_name))
    }

    /// Title, falling back to the definition name
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// The category an attribute path is classified into
///
/// Every schema field maps to exactly one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Plain,
    Localized,
    #[serde(rename = "objectbrick")]
    ObjectBrick,
    #[serde(rename = "fieldcollection")]
    FieldCollection,
    #[serde(rename = "classificationstore")]
    ClassificationStore,
    Relation,
}

impl Category {
    /// All categories, in classification priority order
    pub const ALL: [Category; 6] = [
        Category::Localized,
        Category::ObjectBrick,
        Category::FieldCollection,
        Category::ClassificationStore,
        Category::Relation,
        Category::Plain,
    ];

    /// Stable identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Localized => "localized",
            Self::ObjectBrick => "objectbrick",
            Self::FieldCollection => "fieldcollection",
            Self::ClassificationStore => "classificationstore",
            Self::Relation => "relation",
        }
    }

    /// Whether paths of this category resolve to an indexed list of values
    pub fn is_multi_valued(&self) -> bool {
        matches!(self, Self::ObjectBrick | Self::FieldCollection)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reduce a namespaced class name (`App\Model\Product`) to its base name
pub fn base_class_name(name: &str) -> &str {
    name.rsplit('\\').next().unwrap_or(name)
}

/// Split a container path `field.type.inner` into its parts
///
/// The inner part may itself contain dots.
pub fn split_container_path(path: &str) -> Option<(&str, &str, &str)> {
    let mut parts = path.splitn(3, '.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(field), Some(type_name), Some(inner))
            if !field.is_empty() && !type_name.is_empty() && !inner.is_empty() =>
        {
            Some((field, type_name, inner))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_definition_json_shape() {
        let json = r#"{
            "name": "items",
            "title": "Items",
            "kind": "fieldcollection",
            "allowed_types": ["LineItem"]
        }"#;

        let field: FieldDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(field.name, "items");
        assert_eq!(field.label(), "Items");
        assert_eq!(
            field.kind,
            FieldKind::FieldCollection {
                allowed_types: vec!["LineItem".to_string()]
            }
        );
    }

    #[test]
    fn localized_children_deserialize() {
        let json = r#"{
            "name": "localizedfields",
            "kind": "localized",
            "children": [{"name": "title", "kind": "plain"}]
        }"#;

        let field: FieldDefinition = serde_json::from_str(json).unwrap();
        match field.kind {
            FieldKind::Localized { children } => {
                assert_eq!(children.len(), 1);
                assert_eq!(children[0].name, "title");
            }
            other => panic!("expected localized, got {:?}", other),
        }
    }

    #[test]
    fn class_name_normalisation() {
        assert_eq!(base_class_name("Pimcore\\Model\\DataObject\\Product"), "Product");
        assert_eq!(base_class_name("Product"), "Product");
    }

    #[test]
    fn container_path_parts() {
        assert_eq!(
            split_container_path("items.LineItem.qty"),
            Some(("items", "LineItem", "qty"))
        );
        assert_eq!(
            split_container_path("bricks.Invoice.a.b"),
            Some(("bricks", "Invoice", "a.b"))
        );
        assert_eq!(split_container_path("sku"), None);
        assert_eq!(split_container_path("items..qty"), None);
    }

    #[test]
    fn category_display() {
        assert_eq!(Category::FieldCollection.to_string(), "fieldcollection");
        assert!(Category::ObjectBrick.is_multi_valued());
        assert!(!Category::Localized.is_multi_valued());
    }
}
