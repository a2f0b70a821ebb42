//! Object model seam
//!
//! The engine reads objects through [`DataObject`]. [`JsonObject`] is a
//! self-contained implementation used by the CLI and the tests.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One item stored in a brick or fieldcollection container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerItem {
    /// Brick or collection type of this item
    #[serde(rename = "type")]
    pub type_name: String,

    /// Item field values
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
}

impl ContainerItem {
    /// Create an empty item of the given type
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Set a field value
    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Read a field value, `Null` when absent
    pub fn get(&self, name: &str) -> Value {
        self.values.get(name).cloned().unwrap_or(Value::Null)
    }
}

/// Raw value of an object field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Brick or collection container, items in stored order
    Container {
        #[serde(rename = "container")]
        items: Vec<ContainerItem>,
    },

    /// Any other value
    Scalar(Value),
}

impl FieldValue {
    /// Container items, if this is a container
    pub fn items(&self) -> Option<&[ContainerItem]> {
        match self {
            Self::Container { items } => Some(items),
            Self::Scalar(_) => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Scalar(value)
    }
}

/// Read access to a data object
pub trait DataObject: Send + Sync {
    /// Object identity
    fn id(&self) -> String;

    /// Class name of the object (may be namespaced)
    fn class_name(&self) -> &str;

    /// Raw field value, `None` when the object has no such field
    fn get(&self, field: &str) -> Option<FieldValue>;
}

/// Data object backed by JSON values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonObject {
    pub id: String,

    #[serde(rename = "class")]
    pub class_name: String,

    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl JsonObject {
    /// Create an object without fields
    pub fn new(id: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            class_name: class_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Set a scalar field
    pub fn with_value(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fields.insert(field.into(), FieldValue::Scalar(value));
        self
    }

    /// Set a container field
    pub fn with_items(mut self, field: impl Into<String>, items: Vec<ContainerItem>) -> Self {
        self.fields.insert(field.into(), FieldValue::Container { items });
        self
    }
}

impl DataObject for JsonObject {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn get(&self, field: &str) -> Option<FieldValue> {
        self.fields.get(field).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn container_fields_deserialize_as_containers() {
        let object: JsonObject = serde_json::from_value(json!({
            "id": "42",
            "class": "Product",
            "fields": {
                "sku": "ABC",
                "items": {"container": [
                    {"type": "LineItem", "values": {"qty": 0}},
                    {"type": "LineItem", "values": {"qty": 2}}
                ]}
            }
        }))
        .unwrap();

        assert_eq!(object.get("sku"), Some(FieldValue::Scalar(json!("ABC"))));
        let items = object.get("items").unwrap();
        let items = items.items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].get("qty"), json!(2));
        assert_eq!(items[0].get("missing"), Value::Null);
    }

    #[test]
    fn plain_mapping_stays_scalar() {
        let value: FieldValue = serde_json::from_value(json!({"city": "Bern"})).unwrap();
        assert!(value.items().is_none());
    }
}
