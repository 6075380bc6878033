//! LabDiag - rule-based circuit diagnosis library
//!
//! This library evaluates diagnostic rules against the measured state of a
//! circuit under test, explains why rules fired, and writes technical
//! narratives comparing expected with observed measurements.
//!
//! # Quick Start
//!
//! ```no_run
//! use labdiag::{DiagnosisOptions, LabDiagCore, LabSnapshot};
//! use std::path::Path;
//!
//! let snapshot = LabSnapshot::from_path(Path::new("bench.json")).unwrap();
//! let report = LabDiagCore::diagnose(&snapshot, &DiagnosisOptions::default());
//!
//! for consequence in &report.evaluation.consequences {
//!     println!("{}: {}", consequence.severity, consequence.description);
//! }
//! ```
//!
//! # Features
//!
//! - **Rule evaluation**: net voltages, readings, component and signal state
//! - **Explanations**: per-condition account of why a rule fired
//! - **Narratives**: tolerance parsing and pass/warning/fail verdicts
//! - **Template library**: 41 pre-authored rules ready for conditions

pub mod core;
pub mod engine;
pub mod library;
pub mod model;
pub mod narrative;
pub mod snapshot;

// Re-export main types
pub use self::core::{
    DiagnosisOptions, DiagnosisReport, DiagnosisStats, DiagnosticKnowledge, LabDiagCore,
    LabDiagError, Result, RuleCheck, TriggerExplanation,
};
pub use engine::{
    evaluate_all_rules, evaluate_condition, evaluate_rule, explain_rule_trigger,
    is_valid_condition, validate_rule, DiagnosticEvent, DiagnosticObserver, EvaluationContext,
    EvaluationSettings, RuleEvaluation, RuleEvaluator,
};
pub use library::{RuleBuilder, RuleTemplate};
pub use model::{
    Circuit, CircuitRule, Component, Condition, Consequence, ConsequenceType, MeasurementStep, Net,
    RuleCategory, Severity,
};
pub use narrative::{
    generate_consequence_narrative, generate_measurement_narrative, generate_workflow_narratives,
    parse_actual_value, parse_expected_value, Decision, NarrativeContext, TechnicalNarrative,
};
pub use snapshot::LabSnapshot;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        CircuitRule, Condition, Decision, DiagnosisOptions, DiagnosisReport, EvaluationContext,
        LabDiagCore, LabDiagError, LabSnapshot, RuleEvaluator, Severity, TechnicalNarrative,
    };
}
