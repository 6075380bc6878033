//! Core diagnosis logic shared by library callers and the CLI.
//! Composes rule evaluation, trigger explanations and narratives over one
//! [`LabSnapshot`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::engine::{
    validate_rule, DiagnosticObserver, EvaluationSettings, RuleEvaluation, RuleEvaluator,
    SkippedRule,
};
use crate::model::{CircuitRule, Consequence, RuleCategory, Severity};
use crate::narrative::{
    generate_consequence_narrative, generate_workflow_narratives, Decision, NarrativeContext,
    TechnicalNarrative,
};
use crate::snapshot::LabSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum LabDiagError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Load error: {0}")]
    Load(String),
    #[error("Invalid rule '{rule_id}': {}", .errors.join("; "))]
    InvalidRule { rule_id: String, errors: Vec<String> },
    #[error("Unknown rule: {0}")]
    UnknownRule(String),
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LabDiagError>;

/// Options for a diagnosis run (library or CLI).
#[derive(Clone, Debug)]
pub struct DiagnosisOptions {
    pub narrate_measurements: bool,
    pub narrate_consequences: bool,
    pub explain_triggers: bool,
    /// Only evaluate rules in these categories. Empty means all.
    pub categories: Vec<RuleCategory>,
    pub settings: EvaluationSettings,
}

impl Default for DiagnosisOptions {
    fn default() -> Self {
        Self {
            narrate_measurements: true,
            narrate_consequences: true,
            explain_triggers: true,
            categories: vec![],
            settings: EvaluationSettings::default(),
        }
    }
}

impl DiagnosisOptions {
    /// Evaluation only, no explanations or narratives.
    pub fn evaluation_only() -> Self {
        Self {
            narrate_measurements: false,
            narrate_consequences: false,
            explain_triggers: false,
            ..Self::default()
        }
    }

    pub fn includes(&self, category: RuleCategory) -> bool {
        self.categories.is_empty() || self.categories.contains(&category)
    }
}

/// The diagnostic knowledge attached to a circuit after one evaluation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticKnowledge {
    pub circuit_id: String,
    pub rules: Vec<CircuitRule>,
    /// Ids of the rules that fired.
    pub active_symptoms: Vec<String>,
    pub predicted_consequences: Vec<Consequence>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerExplanation {
    pub rule_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisStats {
    pub rules_evaluated: usize,
    pub rules_triggered: usize,
    pub rules_skipped: usize,
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
    pub narratives_pass: usize,
    pub narratives_warning: usize,
    pub narratives_fail: usize,
}

/// Everything one diagnosis run produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisReport {
    pub circuit_id: String,
    pub circuit_name: String,
    pub generated_at: DateTime<Utc>,
    pub evaluation: RuleEvaluation,
    pub explanations: Vec<TriggerExplanation>,
    pub measurement_narratives: Vec<TechnicalNarrative>,
    pub consequence_narratives: Vec<TechnicalNarrative>,
    pub knowledge: DiagnosticKnowledge,
    /// Rules dropped at load time followed by rules rejected by validation.
    pub skipped_rules: Vec<SkippedRule>,
    pub stats: DiagnosisStats,
}

impl DiagnosisReport {
    pub fn has_critical(&self) -> bool {
        self.worst_severity() == Some(Severity::Critical)
    }

    /// Highest severity among predicted consequences and measurement
    /// narratives that did not pass.
    pub fn worst_severity(&self) -> Option<Severity> {
        let consequences = self.evaluation.consequences.iter().map(|c| c.severity);
        let readings = self
            .measurement_narratives
            .iter()
            .filter(|n| n.decision != Decision::Pass)
            .map(|n| n.severity);
        consequences.chain(readings).max()
    }

    /// True when anything at or above `threshold` was found.
    pub fn meets(&self, threshold: Severity) -> bool {
        self.worst_severity().is_some_and(|s| s >= threshold)
    }
}

fn collect_stats(report: &DiagnosisReport, rules_evaluated: usize) -> DiagnosisStats {
    let mut stats = DiagnosisStats {
        rules_evaluated,
        rules_triggered: report.evaluation.triggered_rules.len(),
        rules_skipped: report.skipped_rules.len(),
        ..DiagnosisStats::default()
    };
    for consequence in &report.evaluation.consequences {
        match consequence.severity {
            Severity::Critical => stats.critical += 1,
            Severity::Warning => stats.warning += 1,
            Severity::Info => stats.info += 1,
        }
    }
    for narrative in &report.measurement_narratives {
        match narrative.decision {
            Decision::Pass => stats.narratives_pass += 1,
            Decision::Warning => stats.narratives_warning += 1,
            Decision::Fail => stats.narratives_fail += 1,
            Decision::Unknown => {}
        }
    }
    stats
}

/// Validation outcome for one rule of a snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCheck {
    pub rule_id: Option<String>,
    pub name: Option<String>,
    pub errors: Vec<String>,
}

impl RuleCheck {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Core diagnosis API used by both library callers and the CLI.
pub struct LabDiagCore;

impl LabDiagCore {
    /// Diagnoses a snapshot, reporting engine anomalies through `tracing`.
    pub fn diagnose(snapshot: &LabSnapshot, options: &DiagnosisOptions) -> DiagnosisReport {
        let evaluator = RuleEvaluator::new().with_settings(options.settings);
        Self::diagnose_with(&evaluator, snapshot, options)
    }

    pub fn diagnose_with_observer(
        snapshot: &LabSnapshot,
        options: &DiagnosisOptions,
        observer: Arc<dyn DiagnosticObserver>,
    ) -> DiagnosisReport {
        let evaluator = RuleEvaluator::new()
            .with_settings(options.settings)
            .with_observer(observer);
        Self::diagnose_with(&evaluator, snapshot, options)
    }

    fn diagnose_with(
        evaluator: &RuleEvaluator,
        snapshot: &LabSnapshot,
        options: &DiagnosisOptions,
    ) -> DiagnosisReport {
        let circuit = &snapshot.circuit;
        let measurements = snapshot.measurements();
        let context = snapshot.context(&measurements);

        let rules: Vec<CircuitRule> = snapshot
            .rules
            .iter()
            .filter(|r| options.includes(r.category))
            .cloned()
            .collect();
        let evaluation = evaluator.evaluate_all_rules(&rules, &context);

        let explanations = if options.explain_triggers {
            evaluation
                .triggered_rules
                .iter()
                .map(|rule| TriggerExplanation {
                    rule_id: rule.id.clone(),
                    text: evaluator.explain_rule_trigger(rule, &context),
                })
                .collect()
        } else {
            vec![]
        };

        let measurement_narratives = if options.narrate_measurements {
            let narrative_context =
                NarrativeContext::new(circuit).with_triggered_rules(&evaluation.triggered_rules);
            generate_workflow_narratives(&narrative_context, &measurements)
        } else {
            vec![]
        };

        let consequence_narratives = if options.narrate_consequences {
            evaluation
                .triggered_rules
                .iter()
                .map(|rule| generate_consequence_narrative(&rule.consequence, circuit, Some(rule)))
                .collect()
        } else {
            vec![]
        };

        let knowledge = DiagnosticKnowledge {
            circuit_id: circuit.id.clone(),
            rules: snapshot.rules.clone(),
            active_symptoms: evaluation.triggered_rules.iter().map(|r| r.id.clone()).collect(),
            predicted_consequences: evaluation.consequences.clone(),
        };

        let mut skipped_rules = snapshot.skipped_rules.clone();
        skipped_rules.extend(evaluation.skipped.iter().cloned());

        let mut report = DiagnosisReport {
            circuit_id: circuit.id.clone(),
            circuit_name: circuit.name.clone(),
            generated_at: Utc::now(),
            evaluation,
            explanations,
            measurement_narratives,
            consequence_narratives,
            knowledge,
            skipped_rules,
            stats: DiagnosisStats::default(),
        };
        report.stats = collect_stats(&report, rules.len());

        tracing::info!(
            "Diagnosed {}: {} of {} rules triggered, {} narratives",
            report.circuit_id,
            report.stats.rules_triggered,
            report.stats.rules_evaluated,
            report.measurement_narratives.len()
        );
        report
    }

    /// Explains why a snapshot rule fires, or would fire, in the snapshot's
    /// current state.
    pub fn explain(snapshot: &LabSnapshot, rule_id: &str) -> Result<String> {
        let rule = snapshot
            .rule(rule_id)
            .ok_or_else(|| LabDiagError::UnknownRule(rule_id.to_string()))?;
        let measurements = snapshot.measurements();
        let context = snapshot.context(&measurements);
        Ok(RuleEvaluator::new().explain_rule_trigger(rule, &context))
    }

    /// Validation outcome of every rule, unreadable ones first.
    pub fn validate(snapshot: &LabSnapshot) -> Vec<RuleCheck> {
        let unreadable = snapshot.skipped_rules.iter().map(|skipped| RuleCheck {
            rule_id: skipped.rule_id.clone(),
            name: None,
            errors: skipped.errors.clone(),
        });
        let loaded = snapshot.rules.iter().map(|rule| RuleCheck {
            rule_id: Some(rule.id.clone()).filter(|id| !id.trim().is_empty()),
            name: Some(rule.name.clone()),
            errors: validate_rule(rule).messages(),
        });
        unreadable.chain(loaded).collect()
    }
}
