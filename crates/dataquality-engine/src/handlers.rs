//! Value resolution per attribute category
//!
//! Each category has one [`AttributeHandler`] that reads the raw value(s) a
//! path addresses on an object. Single-valued categories always yield one
//! value at index 0 (`null` when the object lacks the field). Brick and
//! collection paths yield one value per matching container item, indexed by
//! the item's stored position.
//!
//! Resolution never fails. A field that cannot be read the way its category
//! requires resolves to no values, with the reason kept in
//! [`Resolved::degraded`].

use dataquality_core::{split_container_path, Category, DataObject, FieldValue};
use serde_json::Value;

/// One resolved value and its position
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedValue {
    pub index: usize,
    pub value: Value,
}

impl IndexedValue {
    pub fn new(index: usize, value: Value) -> Self {
        Self { index, value }
    }
}

/// Values resolved for a path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolved {
    pub values: Vec<IndexedValue>,

    /// Why the path resolved to nothing, when the object data had the wrong shape
    pub degraded: Option<String>,
}

impl Resolved {
    fn values(values: Vec<IndexedValue>) -> Self {
        Self {
            values,
            degraded: None,
        }
    }

    fn single(value: Value) -> Self {
        Self::values(vec![IndexedValue::new(0, value)])
    }

    fn degraded(reason: impl Into<String>) -> Self {
        Self {
            values: Vec::new(),
            degraded: Some(reason.into()),
        }
    }
}

/// Reads the values of one attribute category
pub trait AttributeHandler: Send + Sync {
    /// Category handled
    fn category(&self) -> Category;

    /// Values addressed by `path` on `object`, in stored order
    fn resolve(&self, object: &dyn DataObject, path: &str) -> Resolved;
}

/// Handler for a category
pub fn handler_for(category: Category) -> &'static dyn AttributeHandler {
    match category {
        Category::Plain => &PlainHandler,
        Category::Localized => &LocalizedHandler,
        Category::ObjectBrick => &ObjectBrickHandler,
        Category::FieldCollection => &FieldCollectionHandler,
        Category::ClassificationStore => &ClassificationStoreHandler,
        Category::Relation => &RelationHandler,
    }
}

pub struct PlainHandler;
pub struct LocalizedHandler;
pub struct RelationHandler;

/// Classification stores are read as one opaque value
pub struct ClassificationStoreHandler;

pub struct ObjectBrickHandler;
pub struct FieldCollectionHandler;

impl AttributeHandler for PlainHandler {
    fn category(&self) -> Category {
        Category::Plain
    }

    fn resolve(&self, object: &dyn DataObject, path: &str) -> Resolved {
        single_value(object, path)
    }
}

impl AttributeHandler for LocalizedHandler {
    fn category(&self) -> Category {
        Category::Localized
    }

    fn resolve(&self, object: &dyn DataObject, path: &str) -> Resolved {
        single_value(object, path)
    }
}

impl AttributeHandler for RelationHandler {
    fn category(&self) -> Category {
        Category::Relation
    }

    fn resolve(&self, object: &dyn DataObject, path: &str) -> Resolved {
        single_value(object, path)
    }
}

impl AttributeHandler for ClassificationStoreHandler {
    fn category(&self) -> Category {
        Category::ClassificationStore
    }

    fn resolve(&self, object: &dyn DataObject, path: &str) -> Resolved {
        single_value(object, path)
    }
}

impl AttributeHandler for ObjectBrickHandler {
    fn category(&self) -> Category {
        Category::ObjectBrick
    }

    fn resolve(&self, object: &dyn DataObject, path: &str) -> Resolved {
        container_values(object, path)
    }
}

impl AttributeHandler for FieldCollectionHandler {
    fn category(&self) -> Category {
        Category::FieldCollection
    }

    fn resolve(&self, object: &dyn DataObject, path: &str) -> Resolved {
        container_values(object, path)
    }
}

fn single_value(object: &dyn DataObject, field: &str) -> Resolved {
    match object.get(field) {
        None => Resolved::single(Value::Null),
        Some(FieldValue::Scalar(value)) => Resolved::single(value),
        Some(FieldValue::Container { .. }) => {
            Resolved::degraded(format!("field '{}' holds a container, expected a value", field))
        }
    }
}

/// Values of `field.Type.inner` across the items of type `Type`
///
/// Items of other types are skipped but still count for the index.
fn container_values(object: &dyn DataObject, path: &str) -> Resolved {
    let Some((field, type_name, inner)) = split_container_path(path) else {
        return Resolved::degraded(format!("'{}' is not a container path", path));
    };

    match object.get(field) {
        None | Some(FieldValue::Scalar(Value::Null)) => Resolved::default(),
        Some(FieldValue::Scalar(_)) => {
            Resolved::degraded(format!("field '{}' is not a container", field))
        }
        Some(FieldValue::Container { items }) => Resolved::values(
            items
                .iter()
                .enumerate()
                .filter(|(_, item)| item.type_name == type_name)
                .map(|(index, item)| IndexedValue::new(index, item.get(inner)))
                .collect(),
        ),
    }
}
