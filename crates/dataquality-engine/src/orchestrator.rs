//! Validation orchestrator
//!
//! Validates one object: looks up the rules configured for its class,
//! classifies the class, resolves every configured path through the handler
//! of its category and evaluates the rules against the values. Attribute
//! level problems become diagnostics on the result and are also sent to the
//! notification sink; only a class that cannot be resolved aborts the object.
//!
//! Scoring policy: the score is the share of configured (and classifiable)
//! attributes without violations. An object with nothing configured is
//! vacuously compliant and scores 1.0.

use crate::classifier::{ClassInformation, Classifier};
use crate::evaluator::{ConstraintEvaluator, ConstraintFailure};
use crate::handlers::handler_for;
use crate::resolver::DefinitionResolver;
use dataquality_catalog::{ConfigurationStore, DefinitionProvider, ValidatorRegistry};
use dataquality_core::{
    base_class_name, AllowlistRules, AttributeConfig, ConstraintFailureEvent, DataObject,
    Diagnostic, DiagnosticCode, DiagnosticEvent, EngineConfig, EngineError, Event, FailedObject,
    NotificationSink, Report, SeverityThreshold, ValidationResult,
};
use std::sync::Arc;

/// Caller supplied context of a batch run
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRun {
    /// When false, nothing is validated
    pub enabled: bool,

    /// Classes to leave out
    pub allowlist: AllowlistRules,
}

impl ValidationRun {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            enabled: config.enabled,
            allowlist: config.allowlist.clone(),
        }
    }
}

impl Default for ValidationRun {
    fn default() -> Self {
        Self {
            enabled: true,
            allowlist: AllowlistRules::default(),
        }
    }
}

/// What happened to one object of a batch
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Validated(ValidationResult),
    Skipped { object_id: String, class_name: String },
    Failed {
        object_id: String,
        class_name: String,
        error: EngineError,
    },
}

impl BatchOutcome {
    /// Summarise outcomes into a report; skipped objects are left out
    pub fn into_report(outcomes: impl IntoIterator<Item = BatchOutcome>) -> Report {
        let mut report = Report::new();
        for outcome in outcomes {
            match outcome {
                BatchOutcome::Validated(result) => report.add_result(result),
                BatchOutcome::Skipped { .. } => {}
                BatchOutcome::Failed {
                    object_id,
                    class_name,
                    error,
                } => report.add_failure(FailedObject {
                    object_id,
                    class_name,
                    error: error.to_string(),
                }),
            }
        }
        report
    }
}

/// Validates objects against their configured rules
pub struct Orchestrator {
    classifier: Classifier,
    evaluator: ConstraintEvaluator,
    store: Arc<dyn ConfigurationStore>,
    sink: Arc<dyn NotificationSink>,
    severity: SeverityThreshold,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn DefinitionProvider>,
        registry: Arc<dyn ValidatorRegistry>,
        store: Arc<dyn ConfigurationStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            classifier: Classifier::new(DefinitionResolver::new(provider)),
            evaluator: ConstraintEvaluator::new(registry),
            store,
            sink,
            severity: SeverityThreshold::default(),
        }
    }

    /// Use severity overrides for diagnostics
    pub fn with_severity(mut self, severity: SeverityThreshold) -> Self {
        self.severity = severity;
        self
    }

    /// Classifier shared by every validation
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Validate one object
    ///
    /// Fails only when the object's class cannot be resolved.
    pub fn validate(&self, object: &dyn DataObject) -> Result<ValidationResult, EngineError> {
        let object_id = object.id();
        let class_name = base_class_name(object.class_name());
        let mut result = ValidationResult::empty(&object_id, class_name);

        let rules = self.store.rules_for_class(class_name);
        if rules.is_empty() {
            tracing::debug!("{} {}: no rules configured", class_name, object_id);
            return Ok(result);
        }

        let info = self.classifier.classify(class_name)?;
        result.diagnostics.extend(
            info.diagnostics()
                .iter()
                .map(|d| d.clone().with_severity(self.severity.severity_of(d.code))),
        );

        for (path, config) in &rules.attributes {
            self.validate_attribute(object, &object_id, &info, path, config, &mut result);
        }

        result.finalize_score();
        tracing::debug!(
            "{} {}: score {}, {} violations",
            class_name,
            object_id,
            result.score,
            result.violation_count()
        );
        Ok(result)
    }

    fn validate_attribute(
        &self,
        object: &dyn DataObject,
        object_id: &str,
        info: &ClassInformation,
        path: &str,
        config: &AttributeConfig,
        result: &mut ValidationResult,
    ) {
        let Some(category) = info.attribute_type(path) else {
            tracing::warn!("{}: configured attribute '{}' is not in the schema", info.name(), path);
            let diagnostic = self.diagnostic(
                DiagnosticCode::AttributeNotInSchema,
                format!("Configured attribute '{}' is not part of {}", path, info.name()),
                info.name(),
                path,
            );
            self.report(object_id, diagnostic, result);
            return;
        };

        let resolved = handler_for(category).resolve(object, path);
        if let Some(reason) = &resolved.degraded {
            tracing::warn!("{} {}: {}: {}", info.name(), object_id, path, reason);
            let diagnostic = self.diagnostic(
                DiagnosticCode::ValueResolutionDegraded,
                reason.clone(),
                info.name(),
                path,
            );
            self.report(object_id, diagnostic, result);
        }

        let evaluation = self.evaluator.evaluate(
            path,
            &resolved.values,
            category.is_multi_valued(),
            &config.rules,
        );

        for failure in evaluation.failures {
            result
                .diagnostics
                .push(self.failure_diagnostic(&failure, info.name(), path));
            self.sink.notify(Event::ConstraintFailure(ConstraintFailureEvent {
                error: failure.error,
                object_id: object_id.to_string(),
                attribute_path: path.to_string(),
                partial_violations: failure.partial_violations,
            }));
        }

        result.record(path, evaluation.violations);
    }

    /// Validate many objects
    ///
    /// Returns nothing when the run is disabled. Objects of classes in the
    /// allowlist are skipped; an object whose class cannot be resolved is
    /// reported as failed without affecting the others.
    pub fn validate_batch<'a, O>(
        &self,
        objects: impl IntoIterator<Item = &'a O>,
        run: &ValidationRun,
    ) -> Vec<BatchOutcome>
    where
        O: DataObject + 'a,
    {
        if !run.enabled {
            tracing::info!("Validation disabled, skipping batch");
            return Vec::new();
        }

        objects
            .into_iter()
            .map(|object| self.validate_in_run(object, run))
            .collect()
    }

    /// Validate one object of a batch
    pub fn validate_in_run(&self, object: &dyn DataObject, run: &ValidationRun) -> BatchOutcome {
        let class_name = base_class_name(object.class_name()).to_string();
        if run.allowlist.is_class_skipped(&class_name) {
            tracing::debug!("Skipping {} {} (allowlisted)", class_name, object.id());
            return BatchOutcome::Skipped {
                object_id: object.id(),
                class_name,
            };
        }

        match self.validate(object) {
            Ok(result) => BatchOutcome::Validated(result),
            Err(error) => {
                tracing::warn!("Failed to validate {} {}: {}", class_name, object.id(), error);
                BatchOutcome::Failed {
                    object_id: object.id(),
                    class_name,
                    error,
                }
            }
        }
    }

    /// Record an attribute diagnostic on the result and the sink
    fn report(&self, object_id: &str, diagnostic: Diagnostic, result: &mut ValidationResult) {
        self.sink.notify(Event::Diagnostic(DiagnosticEvent {
            object_id: object_id.to_string(),
            diagnostic: diagnostic.clone(),
        }));
        result.diagnostics.push(diagnostic);
    }

    fn diagnostic(
        &self,
        code: DiagnosticCode,
        message: String,
        class_name: &str,
        path: &str,
    ) -> Diagnostic {
        Diagnostic::new(code, message)
            .with_severity(self.severity.severity_of(code))
            .with_class(class_name)
            .with_attribute(path)
    }

    fn failure_diagnostic(
        &self,
        failure: &ConstraintFailure,
        class_name: &str,
        path: &str,
    ) -> Diagnostic {
        let code = match failure.error {
            EngineError::UnknownConstraint(_) => DiagnosticCode::UnknownConstraint,
            _ => DiagnosticCode::ConstraintEvaluationFailed,
        };
        self.diagnostic(code, failure.error.to_string(), class_name, path)
            .with_constraint(&failure.constraint)
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataquality_catalog::{MemoryRuleStore, MockDefinitionProvider, StandardRegistry};
    use dataquality_core::{
        ClassRules, Definition, FieldDefinition, JsonObject, RecordingSink, Score, Severity,
    };
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn orchestrator(rules: ClassRules, sink: Arc<RecordingSink>) -> Orchestrator {
        let provider = MockDefinitionProvider::new().with_class(Definition::new(
            "Product",
            vec![FieldDefinition::plain("sku"), FieldDefinition::plain("ean")],
        ));
        Orchestrator::new(
            Arc::new(provider),
            Arc::new(StandardRegistry::with_defaults()),
            Arc::new(MemoryRuleStore::from_rules([rules])),
            sink,
        )
    }

    #[test]
    fn unconfigured_class_is_vacuously_compliant() {
        let sink = Arc::new(RecordingSink::new());
        let orchestrator = orchestrator(ClassRules::new("Product"), sink);

        let result = orchestrator
            .validate(&JsonObject::new("1", "Unresolvable"))
            .unwrap();
        assert_eq!(result.score, Score::vacuous());
        assert_eq!(result.score.ratio(), 1.0);
    }

    #[test]
    fn path_outside_schema_is_skipped_with_diagnostic() {
        let sink = Arc::new(RecordingSink::new());
        let rules = ClassRules::new("Product")
            .with_rule("sku", "NotBlank", Value::Null)
            .with_rule("ghost", "NotBlank", Value::Null);
        let orchestrator = orchestrator(rules, sink.clone());

        let result = orchestrator
            .validate(&JsonObject::new("1", "Product").with_value("sku", json!("A")))
            .unwrap();

        assert_eq!(result.score, Score::new(1, 1));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::AttributeNotInSchema);
        assert_eq!(result.diagnostics[0].attribute.as_deref(), Some("ghost"));

        let reported = sink.diagnostics();
        assert_eq!(reported.len(), 1);
        assert_eq!(reported[0].object_id, "1");
        assert_eq!(reported[0].diagnostic.code, DiagnosticCode::AttributeNotInSchema);
    }

    #[test]
    fn unknown_constraint_is_reported_and_others_still_run() {
        let sink = Arc::new(RecordingSink::new());
        let rules = ClassRules::new("Product")
            .with_rule("sku", "Frobnicate", Value::Null)
            .with_rule("ean", "NotBlank", Value::Null);
        let orchestrator = orchestrator(rules, sink.clone());

        let result = orchestrator.validate(&JsonObject::new("7", "Product")).unwrap();

        assert_eq!(result.violations("ean").len(), 1);
        assert!(result.violations("sku").is_empty());
        assert_eq!(result.score, Score::new(1, 2));

        let failures = sink.constraint_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].object_id, "7");
        assert_eq!(failures[0].attribute_path, "sku");
        assert_eq!(
            failures[0].error,
            EngineError::UnknownConstraint("Frobnicate".to_string())
        );
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::UnknownConstraint);
        assert_eq!(result.diagnostics[0].constraint.as_deref(), Some("Frobnicate"));
    }

    #[test]
    fn unknown_class_aborts_the_object() {
        let sink = Arc::new(RecordingSink::new());
        let rules = ClassRules::new("Ghost").with_rule("x", "NotBlank", Value::Null);
        let orchestrator = orchestrator(rules, sink);

        let err = orchestrator.validate(&JsonObject::new("1", "Ghost")).unwrap_err();
        assert_eq!(err, EngineError::unknown_class("Ghost"));
    }

    #[test]
    fn severity_overrides_apply() {
        let sink = Arc::new(RecordingSink::new());
        let rules = ClassRules::new("Product").with_rule("ghost", "NotBlank", Value::Null);
        let mut severity = SeverityThreshold::default();
        severity.set_override(DiagnosticCode::AttributeNotInSchema, Severity::Info);
        let orchestrator = orchestrator(rules, sink).with_severity(severity);

        let result = orchestrator.validate(&JsonObject::new("1", "Product")).unwrap();
        assert_eq!(result.diagnostics[0].severity, Severity::Info);
    }

    #[test]
    fn disabled_run_validates_nothing() {
        let sink = Arc::new(RecordingSink::new());
        let rules = ClassRules::new("Product").with_rule("sku", "NotBlank", Value::Null);
        let orchestrator = orchestrator(rules, sink);
        let objects = vec![JsonObject::new("1", "Product")];

        let run = ValidationRun {
            enabled: false,
            ..ValidationRun::default()
        };
        assert!(orchestrator.validate_batch(&objects, &run).is_empty());
        assert_eq!(orchestrator.validate_batch(&objects, &ValidationRun::default()).len(), 1);
    }

    #[test]
    fn batch_skips_allowlisted_and_reports_failures() {
        let sink = Arc::new(RecordingSink::new());
        let provider = MockDefinitionProvider::new()
            .with_class(Definition::new("Product", vec![FieldDefinition::plain("sku")]));
        let store = MemoryRuleStore::from_rules([
            ClassRules::new("Product").with_rule("sku", "NotBlank", Value::Null),
            ClassRules::new("Ghost").with_rule("x", "NotBlank", Value::Null),
        ]);
        let orchestrator = Orchestrator::new(
            Arc::new(provider),
            Arc::new(StandardRegistry::with_defaults()),
            Arc::new(store),
            sink,
        );

        let objects = vec![
            JsonObject::new("1", "Product").with_value("sku", json!("A")),
            JsonObject::new("2", "Product"),
            JsonObject::new("3", "Ghost"),
            JsonObject::new("4", "TmpImport"),
        ];
        let run = ValidationRun {
            enabled: true,
            allowlist: AllowlistRules {
                skip_classes: vec!["Tmp*".to_string()],
            },
        };

        let outcomes = orchestrator.validate_batch(&objects, &run);
        assert!(matches!(outcomes[3], BatchOutcome::Skipped { .. }));
        assert!(matches!(outcomes[2], BatchOutcome::Failed { .. }));

        let report = BatchOutcome::into_report(outcomes);
        assert_eq!(report.summary.objects_validated, 2);
        assert_eq!(report.summary.objects_failed, 1);
        assert_eq!(report.summary.fully_compliant, 1);
        assert_eq!(report.summary.violations, 1);
        assert_eq!(report.summary.mean_score, Some(0.5));
    }
}
