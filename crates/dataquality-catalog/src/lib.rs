//! External collaborators of the validation engine
//!
//! This crate holds the seams the engine consumes (definition provider,
//! validator registry, configuration store) together with concrete
//! implementations:
//!
//! - [`JsonDefinitionProvider`] - class/brick/collection definitions from JSON files
//! - [`MockDefinitionProvider`] - in-memory definitions for tests
//! - [`StandardRegistry`] - the standard constraint library
//! - [`YamlRuleStore`] / [`MemoryRuleStore`] - the rule configuration
//!
//! ## Example
//!
//! ```rust,ignore
//! use dataquality_catalog::{JsonDefinitionProvider, DefinitionProvider};
//! use dataquality_core::DefinitionKind;
//!
//! let provider = JsonDefinitionProvider::new("definitions");
//! let product = provider.definition(DefinitionKind::Class, "Product")?;
//! ```

pub mod adapter;
pub mod constraints;
pub mod definitions;
pub mod mock;
pub mod rule_store;

pub use adapter::{
    CatalogError, ConfigurationStore, ConstraintError, DefinitionProvider, Validator,
    ValidatorRegistry,
};
pub use constraints::{FnValidator, StandardRegistry};
pub use definitions::JsonDefinitionProvider;
pub use mock::MockDefinitionProvider;
pub use rule_store::{MemoryRuleStore, StoreError, YamlRuleStore};
