//! Attribute classification
//!
//! Walks a resolved [`Schema`] once and assigns every reachable attribute
//! path to exactly one [`Category`]:
//!
//! - localized children at their bare name
//! - brick members as `field.BrickType.inner`
//! - collection members as `field.CollectionType.inner`
//! - classification stores, relations and plain fields at their bare name
//!
//! Categories are visited in [`Category::ALL`] order and the first category
//! to claim a path keeps it. All lookups afterwards are views over the
//! resulting index.

use crate::cache::OnceCache;
use crate::resolver::DefinitionResolver;
use dataquality_core::{
    base_class_name, split_container_path, Category, DefinitionKind, Diagnostic, DiagnosticCode,
    EngineError, FieldDefinition, FieldKind, Schema,
};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Classified attributes of one class
#[derive(Debug, Clone)]
pub struct ClassInformation {
    name: String,
    schema: Arc<Schema>,
    index: BTreeMap<String, Category>,
    registry: BTreeMap<String, FieldDefinition>,
    diagnostics: Vec<Diagnostic>,
}

impl ClassInformation {
    /// Classify every attribute of a resolved class schema
    pub fn classify(schema: Arc<Schema>) -> Self {
        let mut info = Self {
            name: schema.name.clone(),
            schema: Arc::clone(&schema),
            index: BTreeMap::new(),
            registry: BTreeMap::new(),
            diagnostics: Vec::new(),
        };

        for category in Category::ALL {
            for field in schema.fields.iter().filter(|f| category_of(&f.kind) == category) {
                for (path, definition) in info.flatten(&schema, field) {
                    info.insert(path, category, definition);
                }
            }
        }

        tracing::debug!(
            "Classified {}: {} attributes ({} diagnostics)",
            info.name,
            info.index.len(),
            info.diagnostics.len()
        );
        info
    }

    /// Attribute paths contributed by one top-level field
    fn flatten(&mut self, schema: &Schema, field: &FieldDefinition) -> Vec<(String, FieldDefinition)> {
        match &field.kind {
            FieldKind::Localized { children } => children
                .iter()
                .map(|child| (child.name.clone(), child.clone()))
                .collect(),
            FieldKind::ObjectBrick { allowed_types } | FieldKind::FieldCollection { allowed_types } => {
                let mut paths = Vec::new();
                for type_name in allowed_types {
                    let Some(nested) = schema.nested_schema(&field.name, type_name) else {
                        tracing::warn!(
                            "{}.{}: type {} was not resolved, skipping its attributes",
                            schema.name,
                            field.name,
                            type_name
                        );
                        continue;
                    };
                    for (inner, definition) in self.leaf_attributes(nested) {
                        paths.push((format!("{}.{}.{}", field.name, type_name, inner), definition));
                    }
                }
                paths
            }
            FieldKind::ClassificationStore | FieldKind::Relation | FieldKind::Plain => {
                vec![(field.name.clone(), field.clone())]
            }
        }
    }

    /// Members of a brick or collection schema
    ///
    /// Nesting stops here: containers inside containers are not classified.
    fn leaf_attributes(&mut self, nested: &Schema) -> Vec<(String, FieldDefinition)> {
        let mut leaves = Vec::new();
        for field in &nested.fields {
            match &field.kind {
                FieldKind::Localized { children } => {
                    leaves.extend(children.iter().map(|c| (c.name.clone(), c.clone())));
                }
                FieldKind::Plain | FieldKind::Relation | FieldKind::ClassificationStore => {
                    leaves.push((field.name.clone(), field.clone()));
                }
                FieldKind::ObjectBrick { .. } | FieldKind::FieldCollection { .. } => {
                    let owner = nested.owner.as_deref().unwrap_or(&nested.name);
                    tracing::debug!("{}: ignoring nested container {}", owner, field.name);
                    self.diagnostics.push(
                        Diagnostic::new(
                            DiagnosticCode::NestedContainerIgnored,
                            format!(
                                "Container field '{}' inside {} {} is not classified",
                                field.name, nested.kind, nested.name
                            ),
                        )
                        .with_class(&self.name)
                        .with_attribute(&field.name),
                    );
                }
            }
        }
        leaves
    }

    fn insert(&mut self, path: String, category: Category, definition: FieldDefinition) {
        match self.index.entry(path) {
            Entry::Vacant(slot) => {
                self.registry.insert(slot.key().clone(), definition);
                slot.insert(category);
            }
            Entry::Occupied(slot) => {
                tracing::warn!(
                    "{}: attribute path '{}' is already classified as {}, ignoring it as {}",
                    self.name,
                    slot.key(),
                    slot.get(),
                    category
                );
                let diagnostic = Diagnostic::new(
                    DiagnosticCode::DuplicateAttributePath,
                    format!(
                        "Attribute path '{}' is claimed by {} and {}",
                        slot.key(),
                        slot.get(),
                        category
                    ),
                )
                .with_class(&self.name)
                .with_attribute(slot.key());
                self.diagnostics.push(diagnostic);
            }
        }
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema the classification was built from
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Path to category index
    pub fn path_index(&self) -> &BTreeMap<String, Category> {
        &self.index
    }

    /// Path to field definition registry
    pub fn registry(&self) -> &BTreeMap<String, FieldDefinition> {
        &self.registry
    }

    /// Problems found while classifying
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Field definition behind a path
    pub fn field_definition(&self, path: &str) -> Option<&FieldDefinition> {
        self.registry.get(path)
    }

    pub fn is_attribute(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Category of a path, `None` when the schema has no such attribute
    pub fn attribute_type(&self, path: &str) -> Option<Category> {
        self.index.get(path).copied()
    }

    pub fn is_plain_attribute(&self, path: &str) -> bool {
        self.attribute_type(path) == Some(Category::Plain)
    }

    pub fn is_localized_attribute(&self, path: &str) -> bool {
        self.attribute_type(path) == Some(Category::Localized)
    }

    pub fn is_objectbrick_attribute(&self, path: &str) -> bool {
        self.attribute_type(path) == Some(Category::ObjectBrick)
    }

    pub fn is_fieldcollection_attribute(&self, path: &str) -> bool {
        self.attribute_type(path) == Some(Category::FieldCollection)
    }

    pub fn is_classificationstore_attribute(&self, path: &str) -> bool {
        self.attribute_type(path) == Some(Category::ClassificationStore)
    }

    pub fn is_relation_attribute(&self, path: &str) -> bool {
        self.attribute_type(path) == Some(Category::Relation)
    }

    /// Sorted paths of one category
    pub fn attributes(&self, category: Category) -> Vec<&str> {
        self.index
            .iter()
            .filter(|(_, c)| **c == category)
            .map(|(path, _)| path.as_str())
            .collect()
    }

    /// All paths, sorted
    pub fn all_attributes(&self) -> Vec<&str> {
        self.index.keys().map(String::as_str).collect()
    }

    /// Human readable label of a path; empty for unknown paths
    ///
    /// Container members read `Field > Type > Inner`.
    pub fn attribute_label(&self, path: &str) -> String {
        let Some(category) = self.attribute_type(path) else {
            return String::new();
        };

        let leaf = self
            .field_definition(path)
            .map(FieldDefinition::label)
            .unwrap_or(path);

        if !category.is_multi_valued() {
            return leaf.to_string();
        }

        let Some((field, type_name, _)) = split_container_path(path) else {
            return leaf.to_string();
        };
        let field_label = self
            .schema
            .field(field)
            .map(FieldDefinition::label)
            .unwrap_or(field);
        let type_label = self
            .schema
            .nested_schema(field, type_name)
            .map(|nested| nested.label())
            .unwrap_or(type_name);

        format!("{} > {} > {}", field_label, type_label, leaf)
    }
}

/// Category a top-level field belongs to
fn category_of(kind: &FieldKind) -> Category {
    match kind {
        FieldKind::Localized { .. } => Category::Localized,
        FieldKind::ObjectBrick { .. } => Category::ObjectBrick,
        FieldKind::FieldCollection { .. } => Category::FieldCollection,
        FieldKind::ClassificationStore => Category::ClassificationStore,
        FieldKind::Relation => Category::Relation,
        FieldKind::Plain => Category::Plain,
    }
}

/// Caching classifier
///
/// Classifications are built at most once per class name.
pub struct Classifier {
    resolver: DefinitionResolver,
    classes: OnceCache<String, ClassInformation>,
}

impl Classifier {
    pub fn new(resolver: DefinitionResolver) -> Self {
        Self {
            resolver,
            classes: OnceCache::new(),
        }
    }

    /// Classified attributes of a class
    pub fn classify(&self, class_name: &str) -> Result<Arc<ClassInformation>, EngineError> {
        let name = base_class_name(class_name);
        self.classes.get_or_try_build(&name.to_string(), || {
            let schema = self.resolver.resolve(name)?;
            Ok(ClassInformation::classify(schema))
        })
    }

    /// Forget the classification and schema of a class
    pub fn invalidate(&self, class_name: &str) {
        let name = base_class_name(class_name);
        self.classes.invalidate(&name.to_string());
        self.resolver.invalidate(DefinitionKind::Class, name);
    }

    /// Forget every classification and schema
    pub fn clear(&self) {
        self.classes.clear();
        self.resolver.clear();
    }

    pub fn resolver(&self) -> &DefinitionResolver {
        &self.resolver
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("resolver", &self.resolver)
            .field("classes", &self.classes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataquality_catalog::MockDefinitionProvider;
    use dataquality_core::Definition;
    use pretty_assertions::assert_eq;

    fn container(name: &str, kind: fn(Vec<String>) -> FieldKind, types: &[&str]) -> FieldDefinition {
        FieldDefinition::new(name, kind(types.iter().map(|t| t.to_string()).collect()))
    }

    fn brick(allowed_types: Vec<String>) -> FieldKind {
        FieldKind::ObjectBrick { allowed_types }
    }

    fn collection(allowed_types: Vec<String>) -> FieldKind {
        FieldKind::FieldCollection { allowed_types }
    }

    fn classifier() -> Classifier {
        let provider = MockDefinitionProvider::new()
            .with_class(
                Definition::new(
                    "Product",
                    vec![
                        FieldDefinition::plain("sku").with_title("SKU"),
                        FieldDefinition::new(
                            "localizedfields",
                            FieldKind::Localized {
                                children: vec![
                                    FieldDefinition::plain("name").with_title("Name"),
                                    FieldDefinition::plain("description"),
                                ],
                            },
                        ),
                        container("specs", brick, &["Dimensions"]).with_title("Specifications"),
                        container("items", collection, &["LineItem"]),
                        FieldDefinition::new("attributes", FieldKind::ClassificationStore),
                        FieldDefinition::new("related", FieldKind::Relation),
                    ],
                )
                .with_title("Product"),
            )
            .with_brick(
                Definition::new(
                    "Dimensions",
                    vec![
                        FieldDefinition::plain("width").with_title("Width"),
                        container("parts", collection, &["LineItem"]),
                    ],
                )
                .with_title("Dimensions brick"),
            )
            .with_collection(Definition::new(
                "LineItem",
                vec![
                    FieldDefinition::plain("qty"),
                    FieldDefinition::new(
                        "localizedfields",
                        FieldKind::Localized {
                            children: vec![FieldDefinition::plain("label")],
                        },
                    ),
                ],
            ));
        Classifier::new(DefinitionResolver::new(Arc::new(provider)))
    }

    #[test]
    fn classifies_every_category() {
        let info = classifier().classify("Product").unwrap();

        assert_eq!(info.attribute_type("sku"), Some(Category::Plain));
        assert_eq!(info.attribute_type("name"), Some(Category::Localized));
        assert_eq!(info.attribute_type("specs.Dimensions.width"), Some(Category::ObjectBrick));
        assert_eq!(info.attribute_type("items.LineItem.qty"), Some(Category::FieldCollection));
        assert_eq!(info.attribute_type("items.LineItem.label"), Some(Category::FieldCollection));
        assert_eq!(info.attribute_type("attributes"), Some(Category::ClassificationStore));
        assert_eq!(info.attribute_type("related"), Some(Category::Relation));

        assert!(info.is_plain_attribute("sku"));
        assert!(info.is_localized_attribute("description"));
        assert!(info.is_objectbrick_attribute("specs.Dimensions.width"));
        assert!(info.is_fieldcollection_attribute("items.LineItem.qty"));
        assert!(info.is_classificationstore_attribute("attributes"));
        assert!(info.is_relation_attribute("related"));
        assert!(!info.is_plain_attribute("name"));
    }

    #[test]
    fn containers_and_unknown_paths_are_not_attributes() {
        let info = classifier().classify("Product").unwrap();

        assert!(!info.is_attribute("localizedfields"));
        assert!(!info.is_attribute("specs"));
        assert!(!info.is_attribute("items"));
        assert!(!info.is_attribute("nope"));
        assert_eq!(info.attribute_type("nope"), None);
    }

    #[test]
    fn nested_containers_are_reported_not_classified() {
        let info = classifier().classify("Product").unwrap();

        assert!(!info
            .all_attributes()
            .iter()
            .any(|path| path.starts_with("specs.Dimensions.parts")));
        assert!(info
            .diagnostics()
            .iter()
            .any(|d| d.code == DiagnosticCode::NestedContainerIgnored));
    }

    #[test]
    fn attributes_by_category() {
        let info = classifier().classify("Product").unwrap();

        assert_eq!(info.attributes(Category::Localized), vec!["description", "name"]);
        assert_eq!(
            info.attributes(Category::FieldCollection),
            vec!["items.LineItem.label", "items.LineItem.qty"]
        );
        assert_eq!(info.all_attributes().len(), 8);
    }

    #[test]
    fn labels() {
        let info = classifier().classify("Product").unwrap();

        assert_eq!(info.attribute_label("sku"), "SKU");
        assert_eq!(info.attribute_label("description"), "description");
        assert_eq!(
            info.attribute_label("specs.Dimensions.width"),
            "Specifications > Dimensions brick > Width"
        );
        assert_eq!(info.attribute_label("items.LineItem.qty"), "items > LineItem > qty");
        assert_eq!(info.attribute_label("unknown"), "");
    }

    #[test]
    fn first_category_wins_on_collision() {
        let provider = MockDefinitionProvider::new().with_class(Definition::new(
            "Page",
            vec![
                FieldDefinition::plain("title"),
                FieldDefinition::new(
                    "localizedfields",
                    FieldKind::Localized {
                        children: vec![FieldDefinition::plain("title")],
                    },
                ),
            ],
        ));
        let classifier = Classifier::new(DefinitionResolver::new(Arc::new(provider)));
        let info = classifier.classify("Page").unwrap();

        assert_eq!(info.attribute_type("title"), Some(Category::Localized));
        assert_eq!(info.diagnostics()[0].code, DiagnosticCode::DuplicateAttributePath);
    }

    #[test]
    fn classification_is_cached_per_class() {
        let provider = Arc::new(
            MockDefinitionProvider::new()
                .with_class(Definition::new("Note", vec![FieldDefinition::plain("text")])),
        );
        let classifier = Classifier::new(DefinitionResolver::new(provider.clone()));

        let first = classifier.classify("Note").unwrap();
        let second = classifier.classify("Vendor\\Note").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.fetch_count(), 1);

        classifier.invalidate("Note");
        let third = classifier.classify("Note").unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(provider.fetch_count(), 2);
        assert_eq!(third.schema().kind, DefinitionKind::Class);
    }
}
