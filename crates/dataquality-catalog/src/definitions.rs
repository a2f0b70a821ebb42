//! Definition provider reading JSON files from a directory
//!
//! Layout:
//!
//! ```text
//! definitions/
//!   classes/Product.json
//!   objectbricks/InvoiceBrick.json
//!   fieldcollections/LineItem.json
//! ```

use crate::adapter::{CatalogError, DefinitionProvider};
use dataquality_core::{Definition, DefinitionKind};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Reads definitions from `<root>/<kind dir>/<name>.json`
#[derive(Debug, Clone)]
pub struct JsonDefinitionProvider {
    root: PathBuf,
}

impl JsonDefinitionProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding definitions of `kind`
    pub fn kind_dir(&self, kind: DefinitionKind) -> PathBuf {
        let dir = match kind {
            DefinitionKind::Class => "classes",
            DefinitionKind::ObjectBrick => "objectbricks",
            DefinitionKind::FieldCollection => "fieldcollections",
        };
        self.root.join(dir)
    }

    /// Names of all definitions of `kind`, sorted
    pub fn list(&self, kind: DefinitionKind) -> Vec<String> {
        let dir = self.kind_dir(kind);
        let mut names: Vec<String> = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("json"))
            .filter_map(|entry| {
                entry
                    .path()
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string)
            })
            .collect();
        names.sort();
        names
    }

    /// Write a definition file, creating directories as needed
    pub fn save(&self, kind: DefinitionKind, definition: &Definition) -> Result<(), CatalogError> {
        let dir = self.kind_dir(kind);
        std::fs::create_dir_all(&dir).map_err(|e| CatalogError::Io(e.to_string()))?;

        let json = serde_json::to_string_pretty(definition)
            .map_err(|e| CatalogError::Parse(e.to_string()))?;
        std::fs::write(dir.join(format!("{}.json", definition.name)), json)
            .map_err(|e| CatalogError::Io(e.to_string()))
    }

    fn load(path: &Path, kind: DefinitionKind, name: &str) -> Result<Definition, CatalogError> {
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CatalogError::NotFound {
                kind,
                name: name.to_string(),
            },
            _ => CatalogError::Io(format!("{}: {}", path.display(), e)),
        })?;

        let definition: Definition = serde_json::from_str(&contents)
            .map_err(|e| CatalogError::Parse(format!("{}: {}", path.display(), e)))?;

        if definition.name != name {
            return Err(CatalogError::Parse(format!(
                "{}: declares '{}' but was requested as '{}'",
                path.display(),
                definition.name,
                name
            )));
        }

        Ok(definition)
    }
}

impl DefinitionProvider for JsonDefinitionProvider {
    fn name(&self) -> &'static str {
        "JsonDirectory"
    }

    fn definition(&self, kind: DefinitionKind, name: &str) -> Result<Definition, CatalogError> {
        // Names are file stems; refuse anything that could escape the directory
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(CatalogError::NotFound {
                kind,
                name: name.to_string(),
            });
        }

        let path = self.kind_dir(kind).join(format!("{}.json", name));
        tracing::debug!(path = %path.display(), "loading {} definition", kind);
        Self::load(&path, kind, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataquality_core::{FieldDefinition, FieldKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let provider = JsonDefinitionProvider::new(dir.path());

        let product = Definition::new(
            "Product",
            vec![
                FieldDefinition::plain("sku").with_title("SKU"),
                FieldDefinition::new(
                    "items",
                    FieldKind::FieldCollection {
                        allowed_types: vec!["LineItem".to_string()],
                    },
                ),
            ],
        );
        provider.save(DefinitionKind::Class, &product).unwrap();

        let loaded = provider.definition(DefinitionKind::Class, "Product").unwrap();
        assert_eq!(loaded, product);
        assert_eq!(provider.list(DefinitionKind::Class), vec!["Product".to_string()]);
        assert!(provider.list(DefinitionKind::ObjectBrick).is_empty());
    }

    #[test]
    fn missing_definition_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let provider = JsonDefinitionProvider::new(dir.path());

        let err = provider.definition(DefinitionKind::Class, "Ghost").unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));

        let err = provider.definition(DefinitionKind::Class, "../etc").unwrap_err();
        assert!(matches!(err, CatalogError::NotFound { .. }));
    }

    #[test]
    fn mismatched_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let provider = JsonDefinitionProvider::new(dir.path());
        std::fs::create_dir_all(provider.kind_dir(DefinitionKind::Class)).unwrap();
        std::fs::write(
            provider.kind_dir(DefinitionKind::Class).join("Product.json"),
            r#"{"name": "Other", "fields": []}"#,
        )
        .unwrap();

        let err = provider.definition(DefinitionKind::Class, "Product").unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }
}
