//! Constraint evaluation
//!
//! Runs every configured constraint of one attribute against its resolved
//! values. Each (constraint, value) pair is its own fallible step: a failure
//! is collected with the violations found before it and evaluation moves on
//! to the next pair.

use crate::handlers::IndexedValue;
use dataquality_catalog::ValidatorRegistry;
use dataquality_core::{EngineError, ViolationRecord};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A constraint that could not produce a verdict
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintFailure {
    pub constraint: String,

    /// Value being checked, `None` when the constraint could not be resolved
    pub value_index: Option<usize>,

    pub error: EngineError,

    /// Violations of the attribute recorded before the failure
    pub partial_violations: Vec<ViolationRecord>,
}

/// Outcome of evaluating one attribute
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub violations: Vec<ViolationRecord>,
    pub failures: Vec<ConstraintFailure>,
}

impl Evaluation {
    fn fail(&mut self, constraint: &str, value_index: Option<usize>, error: EngineError) {
        self.failures.push(ConstraintFailure {
            constraint: constraint.to_string(),
            value_index,
            error,
            partial_violations: self.violations.clone(),
        });
    }
}

/// Evaluates configured constraints through a [`ValidatorRegistry`]
#[derive(Clone)]
pub struct ConstraintEvaluator {
    registry: Arc<dyn ValidatorRegistry>,
}

impl ConstraintEvaluator {
    pub fn new(registry: Arc<dyn ValidatorRegistry>) -> Self {
        Self { registry }
    }

    /// Evaluate `rules` against the values of `path`
    ///
    /// `indexed` controls whether violations carry the value index; it is
    /// set for brick and collection paths. Constraints run in name order.
    pub fn evaluate(
        &self,
        path: &str,
        values: &[IndexedValue],
        indexed: bool,
        rules: &BTreeMap<String, Value>,
    ) -> Evaluation {
        let mut evaluation = Evaluation::default();

        for (name, params) in rules {
            let validator = match self.registry.resolve(name) {
                Ok(validator) => validator,
                Err(error) => {
                    tracing::warn!("{}: {}", path, error);
                    evaluation.fail(name, None, error);
                    continue;
                }
            };

            for IndexedValue { index, value } in values {
                match validator.validate(value, params) {
                    Ok(reasons) => {
                        evaluation
                            .violations
                            .extend(reasons.into_iter().map(|reason| ViolationRecord {
                                attribute_path: path.to_string(),
                                constraint_name: name.clone(),
                                value_index: indexed.then_some(*index),
                                reason,
                            }));
                    }
                    Err(error) => {
                        tracing::warn!("{}: constraint {} failed on value {}: {}", path, name, index, error);
                        let error = EngineError::ConstraintEvaluation {
                            path: path.to_string(),
                            constraint: name.clone(),
                            reason: error.to_string(),
                        };
                        evaluation.fail(name, Some(*index), error);
                    }
                }
            }
        }

        evaluation
    }
}

impl std::fmt::Debug for ConstraintEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintEvaluator").finish_non_exhaustive()
    }
}
