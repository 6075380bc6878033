//! Structural validation of rules and conditions.
//!
//! Operator/type pairing is guaranteed by [`Condition`]'s shape, so the checks
//! here cover what the type system cannot: empty identifiers, thresholds that
//! are missing or not finite, inverted ranges and condition types with no
//! operator family. Validation accumulates every violation instead of
//! stopping at the first one.

use serde::{Deserialize, Serialize};

use crate::model::{CircuitRule, Condition, NumericCondition, NumericOperator, PresenceCondition};

/// Why a single condition is structurally invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConditionDefect {
    #[error("missing id")]
    MissingId,
    #[error("missing target id")]
    MissingTarget,
    #[error("unknown condition type")]
    UnsupportedType,
    #[error("net_current conditions have no operator family")]
    NoOperatorFamily,
    #[error("operator requires a value")]
    MissingValue,
    #[error("operator 'between' requires a value range")]
    MissingRange,
    #[error("threshold is not a finite number")]
    NonFiniteThreshold,
    #[error("value range min is greater than max")]
    InvertedRange,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Rule must have a valid id")]
    MissingId,
    #[error("Rule must have a valid name")]
    MissingName,
    #[error("Rule must have a valid circuitId")]
    MissingCircuitId,
    #[error("Rule must have at least one condition")]
    NoConditions,
    #[error("Condition {index} is invalid or has incompatible operator ({defect})")]
    InvalidCondition { index: usize, defect: ConditionDefect },
    #[error("Consequence must have id, type, and severity")]
    IncompleteConsequence,
    #[error("Consequence must have description and explanation")]
    UndescribedConsequence,
}

/// Outcome of [`validate_rule`]. A rule is valid iff `errors` is empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleValidation {
    pub errors: Vec<ValidationError>,
}

impl RuleValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// A rule excluded from evaluation, either because it could not be read or
/// because it failed [`validate_rule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRule {
    /// Position of the rule in the input list.
    pub index: usize,
    pub rule_id: Option<String>,
    pub errors: Vec<String>,
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn check_numeric(condition: &NumericCondition) -> Result<(), ConditionDefect> {
    if is_blank(&condition.id) {
        return Err(ConditionDefect::MissingId);
    }
    if is_blank(&condition.target_id) {
        return Err(ConditionDefect::MissingTarget);
    }

    if let Some(value) = condition.value {
        if !value.is_finite() {
            return Err(ConditionDefect::NonFiniteThreshold);
        }
    }
    if let Some(range) = condition.value_range {
        if !range.min.is_finite() || !range.max.is_finite() {
            return Err(ConditionDefect::NonFiniteThreshold);
        }
        if range.min > range.max {
            return Err(ConditionDefect::InvertedRange);
        }
    }

    match condition.operator {
        NumericOperator::Between if condition.value_range.is_none() => {
            Err(ConditionDefect::MissingRange)
        }
        NumericOperator::Between => Ok(()),
        _ if condition.value.is_none() => Err(ConditionDefect::MissingValue),
        _ => Ok(()),
    }
}

fn check_presence(condition: &PresenceCondition) -> Result<(), ConditionDefect> {
    if is_blank(&condition.id) {
        return Err(ConditionDefect::MissingId);
    }
    if is_blank(&condition.target_id) {
        return Err(ConditionDefect::MissingTarget);
    }
    Ok(())
}

/// Checks a single condition, returning the first defect found.
pub fn check_condition(condition: &Condition) -> Result<(), ConditionDefect> {
    match condition {
        Condition::NetVoltage(c) | Condition::Measurement(c) => check_numeric(c),
        Condition::NetCurrent(_) => Err(ConditionDefect::NoOperatorFamily),
        Condition::ComponentState(c) | Condition::SignalPresent(c) => check_presence(c),
        Condition::Unsupported => Err(ConditionDefect::UnsupportedType),
    }
}

pub fn is_valid_condition(condition: &Condition) -> bool {
    check_condition(condition).is_ok()
}

/// Validates a rule's structure. Never fails; returns every violation found.
pub fn validate_rule(rule: &CircuitRule) -> RuleValidation {
    let mut errors = Vec::new();

    if is_blank(&rule.id) {
        errors.push(ValidationError::MissingId);
    }
    if is_blank(&rule.name) {
        errors.push(ValidationError::MissingName);
    }
    if is_blank(&rule.circuit_id) {
        errors.push(ValidationError::MissingCircuitId);
    }

    if rule.conditions.is_empty() {
        errors.push(ValidationError::NoConditions);
    } else {
        for (index, condition) in rule.conditions.iter().enumerate() {
            if let Err(defect) = check_condition(condition) {
                errors.push(ValidationError::InvalidCondition { index, defect });
            }
        }
    }

    let consequence = &rule.consequence;
    if is_blank(&consequence.id) {
        errors.push(ValidationError::IncompleteConsequence);
    }
    if is_blank(&consequence.description) || is_blank(&consequence.explanation) {
        errors.push(ValidationError::UndescribedConsequence);
    }

    RuleValidation { errors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Consequence, ConsequenceType, PresenceOperator, RuleCategory, Severity,
    };

    fn low_vcc_rule() -> CircuitRule {
        CircuitRule {
            id: "test-rule".to_string(),
            name: "Low Voltage Detection".to_string(),
            circuit_id: "test-circuit".to_string(),
            conditions: vec![Condition::NetVoltage(
                NumericCondition::new("cond-1", "vcc-net", NumericOperator::Lt)
                    .threshold(2.0)
                    .describe("VCC voltage below 2V"),
            )],
            consequence: Consequence {
                id: "cons-1".to_string(),
                kind: ConsequenceType::NoOutput,
                severity: Severity::Critical,
                affected_net_ids: vec!["vcc-net".to_string()],
                affected_component_ids: vec![],
                description: "Circuit will not function".to_string(),
                explanation: "Insufficient supply voltage".to_string(),
            },
            enabled: true,
            category: RuleCategory::Power,
        }
    }

    #[test]
    fn test_valid_rule() {
        let validation = validate_rule(&low_vcc_rule());
        assert!(validation.is_valid(), "{:?}", validation.errors);
        assert!(validation.messages().is_empty());
    }

    #[test]
    fn test_accumulates_all_errors() {
        let mut rule = low_vcc_rule();
        rule.id = String::new();
        rule.name = "  ".to_string();
        rule.conditions.clear();
        rule.consequence.explanation = String::new();

        let validation = validate_rule(&rule);
        assert_eq!(
            validation.errors,
            vec![
                ValidationError::MissingId,
                ValidationError::MissingName,
                ValidationError::NoConditions,
                ValidationError::UndescribedConsequence,
            ]
        );
    }

    #[test]
    fn test_invalid_conditions_reported_by_index() {
        let mut rule = low_vcc_rule();
        rule.conditions.push(Condition::Unsupported);
        rule.conditions.push(Condition::NetVoltage(
            NumericCondition::new("cond-3", "vcc-net", NumericOperator::Between).range(5.0, 1.0),
        ));

        let validation = validate_rule(&rule);
        assert_eq!(
            validation.errors,
            vec![
                ValidationError::InvalidCondition {
                    index: 1,
                    defect: ConditionDefect::UnsupportedType
                },
                ValidationError::InvalidCondition {
                    index: 2,
                    defect: ConditionDefect::InvertedRange
                },
            ]
        );
        assert!(validation.messages()[0].starts_with("Condition 1 is invalid"));
    }

    #[test]
    fn test_check_condition_defects() {
        let missing_value = Condition::NetVoltage(NumericCondition::new("c", "n", NumericOperator::Gt));
        assert_eq!(check_condition(&missing_value), Err(ConditionDefect::MissingValue));

        let missing_range =
            Condition::Measurement(NumericCondition::new("c", "m", NumericOperator::Between).threshold(1.0));
        assert_eq!(check_condition(&missing_range), Err(ConditionDefect::MissingRange));

        let nan_threshold =
            Condition::NetVoltage(NumericCondition::new("c", "n", NumericOperator::Lt).threshold(f64::NAN));
        assert_eq!(check_condition(&nan_threshold), Err(ConditionDefect::NonFiniteThreshold));

        let current =
            Condition::NetCurrent(NumericCondition::new("c", "n", NumericOperator::Gt).threshold(0.1));
        assert_eq!(check_condition(&current), Err(ConditionDefect::NoOperatorFamily));

        let no_target =
            Condition::ComponentState(PresenceCondition::new("c", "", PresenceOperator::Present));
        assert_eq!(check_condition(&no_target), Err(ConditionDefect::MissingTarget));

        let ok = Condition::SignalPresent(PresenceCondition::new("c", "m1", PresenceOperator::Absent));
        assert!(is_valid_condition(&ok));
    }
}
