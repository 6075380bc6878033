//! Rule Engine
//!
//! Validates diagnostic rules, evaluates them against a snapshot of circuit
//! state and explains why a rule fired.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │    Rules     │───▶│  Validation  │───▶│  Evaluation  │───▶ triggered rules
//! └──────────────┘    └──────┬───────┘    └──────┬───────┘     + consequences
//!                            │                   │
//!                            ▼                   ▼
//!                     ┌─────────────────────────────────┐
//!                     │       DiagnosticObserver        │
//!                     └─────────────────────────────────┘
//! ```
//!
//! Evaluation never fails at its public boundary. A condition that cannot be
//! judged (missing net, unparseable reading, NaN, out of bounds threshold)
//! counts as not satisfied; structurally invalid rules are excluded from a
//! rule set and reported as [`SkippedRule`]s.

pub mod evaluate;
pub mod explain;
pub mod observer;
pub mod settings;
pub mod validate;

pub use evaluate::{
    compare_numeric, parse_reading, EvaluationContext, RuleEvaluation, RuleEvaluator, Unsatisfied,
};
pub use observer::{
    DiagnosticEvent, DiagnosticObserver, NullObserver, RecordingObserver, TracingObserver,
};
pub use settings::{EvaluationSettings, COMPARISON_TOLERANCE, MAX_SAFE_VALUE};
pub use validate::{
    check_condition, is_valid_condition, validate_rule, ConditionDefect, RuleValidation,
    SkippedRule, ValidationError,
};

use crate::model::{CircuitRule, Condition};

/// Evaluates a condition with default settings.
pub fn evaluate_condition(condition: &Condition, context: &EvaluationContext<'_>) -> bool {
    RuleEvaluator::default().evaluate_condition(condition, context)
}

/// Evaluates a rule with default settings.
pub fn evaluate_rule(rule: &CircuitRule, context: &EvaluationContext<'_>) -> bool {
    RuleEvaluator::default().evaluate_rule(rule, context)
}

/// Evaluates a rule set with default settings.
pub fn evaluate_all_rules(rules: &[CircuitRule], context: &EvaluationContext<'_>) -> RuleEvaluation {
    RuleEvaluator::default().evaluate_all_rules(rules, context)
}

pub fn explain_rule_trigger(rule: &CircuitRule, context: &EvaluationContext<'_>) -> String {
    RuleEvaluator::default().explain_rule_trigger(rule, context)
}
