//! Property-based tests for classification and validation.

use dataquality_catalog::{MemoryRuleStore, MockDefinitionProvider, StandardRegistry};
use dataquality_core::{
    Category, ClassRules, ContainerItem, Definition, DefinitionKind, FieldDefinition, FieldKind,
    JsonObject, RecordingSink,
};
use dataquality_engine::{Classifier, DefinitionResolver, Orchestrator};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A generated class with the paths its classification must produce
struct GeneratedClass {
    provider: MockDefinitionProvider,
    expected: BTreeMap<String, Category>,
}

fn inner_fields() -> Vec<FieldDefinition> {
    vec![FieldDefinition::plain("v0"), FieldDefinition::plain("v1")]
}

fn generate(fields: &[(u8, usize)]) -> GeneratedClass {
    let provider = MockDefinitionProvider::new();
    let mut expected = BTreeMap::new();
    let mut definitions = Vec::new();

    for (i, (tag, count)) in fields.iter().enumerate() {
        let name = format!("f{}", i);
        let definition = match tag {
            0 => {
                expected.insert(name.clone(), Category::Plain);
                FieldDefinition::plain(&name)
            }
            1 => {
                let children: Vec<_> = (0..*count)
                    .map(|j| FieldDefinition::plain(format!("l{}_{}", i, j)))
                    .collect();
                for child in &children {
                    expected.insert(child.name.clone(), Category::Localized);
                }
                FieldDefinition::new(&name, FieldKind::Localized { children })
            }
            2 | 3 => {
                let (prefix, category) = if *tag == 2 {
                    ("B", Category::ObjectBrick)
                } else {
                    ("C", Category::FieldCollection)
                };
                let types: Vec<String> = (0..*count).map(|t| format!("{}{}_{}", prefix, i, t)).collect();
                for type_name in &types {
                    let nested = Definition::new(type_name, inner_fields());
                    if *tag == 2 {
                        provider.add(DefinitionKind::ObjectBrick, nested);
                    } else {
                        provider.add(DefinitionKind::FieldCollection, nested);
                    }
                    for inner in ["v0", "v1"] {
                        expected.insert(format!("{}.{}.{}", name, type_name, inner), category);
                    }
                }
                let kind = if *tag == 2 {
                    FieldKind::ObjectBrick { allowed_types: types }
                } else {
                    FieldKind::FieldCollection { allowed_types: types }
                };
                FieldDefinition::new(&name, kind)
            }
            4 => {
                expected.insert(name.clone(), Category::ClassificationStore);
                FieldDefinition::new(&name, FieldKind::ClassificationStore)
            }
            _ => {
                expected.insert(name.clone(), Category::Relation);
                FieldDefinition::new(&name, FieldKind::Relation)
            }
        };
        definitions.push(definition);
    }

    provider.add(
        DefinitionKind::Class,
        Definition::new("Generated", definitions),
    );
    GeneratedClass { provider, expected }
}

prop_compose! {
    fn arbitrary_fields()(fields in prop::collection::vec((0..6u8, 1..4usize), 1..12)) -> Vec<(u8, usize)> {
        fields
    }
}

proptest! {
    #[test]
    fn classification_is_total_and_exclusive(fields in arbitrary_fields()) {
        let generated = generate(&fields);
        let classifier = Classifier::new(DefinitionResolver::new(Arc::new(generated.provider)));
        let info = classifier.classify("Generated").unwrap();

        prop_assert_eq!(info.path_index(), &generated.expected);

        let bucketed: usize = Category::ALL
            .iter()
            .map(|category| info.attributes(*category).len())
            .sum();
        prop_assert_eq!(bucketed, info.all_attributes().len());

        for path in info.all_attributes() {
            let matches = [
                info.is_plain_attribute(path),
                info.is_localized_attribute(path),
                info.is_objectbrick_attribute(path),
                info.is_fieldcollection_attribute(path),
                info.is_classificationstore_attribute(path),
                info.is_relation_attribute(path),
            ];
            prop_assert_eq!(matches.iter().filter(|m| **m).count(), 1);
        }

        prop_assert_eq!(info.attribute_type("not-a-field"), None);
    }

    #[test]
    fn validation_is_deterministic(
        sku in ".{0,6}",
        quantities in prop::collection::vec(-3i64..5, 0..6),
    ) {
        let provider = MockDefinitionProvider::new()
            .with_class(Definition::new(
                "Product",
                vec![
                    FieldDefinition::plain("sku"),
                    FieldDefinition::new(
                        "items",
                        FieldKind::FieldCollection { allowed_types: vec!["LineItem".to_string()] },
                    ),
                ],
            ))
            .with_collection(Definition::new("LineItem", vec![FieldDefinition::plain("qty")]));
        let rules = ClassRules::new("Product")
            .with_rule("sku", "NotBlank", Value::Null)
            .with_rule("sku", "Length", json!({"max": 4}))
            .with_rule("items.LineItem.qty", "Min", json!({"value": 1}));
        let orchestrator = Orchestrator::new(
            Arc::new(provider),
            Arc::new(StandardRegistry::with_defaults()),
            Arc::new(MemoryRuleStore::from_rules([rules])),
            Arc::new(RecordingSink::new()),
        );

        let items = quantities
            .iter()
            .map(|qty| ContainerItem::new("LineItem").with_value("qty", json!(qty)))
            .collect();
        let object = JsonObject::new("p", "Product")
            .with_value("sku", json!(sku))
            .with_items("items", items);

        let first = orchestrator.validate(&object).unwrap();
        let second = orchestrator.validate(&object).unwrap();
        prop_assert_eq!(&first, &second);

        let expected_low = quantities.iter().filter(|qty| **qty < 1).count();
        prop_assert_eq!(first.violations("items.LineItem.qty").len(), expected_low);
        prop_assert!(first.score.ratio() >= 0.0 && first.score.ratio() <= 1.0);
    }
}
