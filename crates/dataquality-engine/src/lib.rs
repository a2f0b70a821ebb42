//! DataQuality engine - attribute classification and constraint validation
//!
//! This crate implements the validation pipeline:
//! - Definition resolution into immutable schema trees
//! - Attribute classification into categories
//! - Value resolution per category
//! - Constraint evaluation with per-value failure isolation
//! - Per-object orchestration and scoring
//!
//! Schemas and classifications are cached per key and built at most once,
//! so an [`Orchestrator`] can be shared across threads.

pub mod cache;
pub mod classifier;
pub mod evaluator;
pub mod handlers;
pub mod orchestrator;
pub mod resolver;

pub use cache::OnceCache;
pub use classifier::{ClassInformation, Classifier};
pub use evaluator::{ConstraintEvaluator, ConstraintFailure, Evaluation};
pub use handlers::{handler_for, AttributeHandler, IndexedValue, Resolved};
pub use orchestrator::{BatchOutcome, Orchestrator, ValidationRun};
pub use resolver::DefinitionResolver;
