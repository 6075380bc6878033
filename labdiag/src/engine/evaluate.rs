//! Condition, rule and rule-set evaluation.
//!
//! Every evaluation is a pure function of the rule and the
//! [`EvaluationContext`] snapshot. Conditions that cannot be judged (missing
//! data, unsafe numbers, malformed shape) count as not satisfied; the reason
//! is available through [`RuleEvaluator::assess_condition`] and reported to
//! the evaluator's [`DiagnosticObserver`].

use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, LazyLock};

use super::observer::{DiagnosticEvent, DiagnosticObserver, TracingObserver};
use super::settings::EvaluationSettings;
use super::validate::{check_condition, validate_rule, ConditionDefect, SkippedRule};
use crate::model::{
    Circuit, CircuitRule, Component, Condition, Consequence, MeasurementStatus, MeasurementStep,
    Net, NumericCondition, NumericOperator, PresenceCondition, PresenceOperator, ValueRange,
};

/// Leading decimal number of a reading, the way a lab operator types it.
static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").expect("valid regex")
});

/// Read-only view of the circuit state that conditions resolve against.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub nets: &'a [Net],
    pub components: &'a [Component],
    pub measurements: &'a [MeasurementStep],
}

impl<'a> EvaluationContext<'a> {
    pub fn new(
        nets: &'a [Net],
        components: &'a [Component],
        measurements: &'a [MeasurementStep],
    ) -> Self {
        Self {
            nets,
            components,
            measurements,
        }
    }

    pub fn from_circuit(circuit: &'a Circuit, measurements: &'a [MeasurementStep]) -> Self {
        Self::new(&circuit.nets, &circuit.components, measurements)
    }

    pub fn net(&self, id: &str) -> Option<&'a Net> {
        self.nets.iter().find(|n| n.id == id)
    }

    pub fn component(&self, id: &str) -> Option<&'a Component> {
        self.components.iter().find(|c| c.id == id)
    }

    /// First measurement whose own id or linked net id is `target_id`.
    pub fn measurement_for(&self, target_id: &str) -> Option<&'a MeasurementStep> {
        self.measurements.iter().find(|m| m.matches_target(target_id))
    }
}

/// Why a condition could not be judged true.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Unsatisfied {
    #[error("condition is structurally invalid: {0}")]
    Structural(ConditionDefect),
    #[error("target not found")]
    NotFound,
    #[error("no measurement available")]
    Unmeasured,
    #[error("sample value {0} is not finite or exceeds the safety bound")]
    UnsafeValue(f64),
    #[error("reading is not numeric")]
    Unparseable,
    #[error("no threshold supplied for the operator")]
    MissingThreshold,
    #[error("threshold is not finite or exceeds the safety bound")]
    UnsafeThreshold,
    #[error("value range min is greater than max")]
    InvertedRange,
}

/// Parses the leading number of a reading such as `"5.02V"` or `" -1.2e-3 A"`.
pub fn parse_reading(raw: &str) -> Option<f64> {
    LEADING_NUMBER
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Compares `value` against a threshold or range.
///
/// `=` and `!=` use the absolute `comparison_tolerance` rather than exact
/// floating point equality.
pub fn compare_numeric(
    value: f64,
    operator: NumericOperator,
    target: Option<f64>,
    range: Option<ValueRange>,
    settings: &EvaluationSettings,
) -> Result<bool, Unsatisfied> {
    if !settings.is_safe(value) {
        return Err(Unsatisfied::UnsafeValue(value));
    }
    if let Some(t) = target {
        if !settings.is_safe(t) {
            return Err(Unsatisfied::UnsafeThreshold);
        }
    }
    if let Some(r) = range {
        if !settings.is_safe(r.min) || !settings.is_safe(r.max) {
            return Err(Unsatisfied::UnsafeThreshold);
        }
        if r.min > r.max {
            return Err(Unsatisfied::InvertedRange);
        }
    }

    let tolerance = settings.comparison_tolerance;
    let threshold = || target.ok_or(Unsatisfied::MissingThreshold);
    match operator {
        NumericOperator::Gt => Ok(value > threshold()?),
        NumericOperator::Lt => Ok(value < threshold()?),
        NumericOperator::Eq => Ok((value - threshold()?).abs() < tolerance),
        NumericOperator::Ge => Ok(value >= threshold()?),
        NumericOperator::Le => Ok(value <= threshold()?),
        NumericOperator::Ne => Ok((value - threshold()?).abs() >= tolerance),
        NumericOperator::Between => {
            let r = range.ok_or(Unsatisfied::MissingThreshold)?;
            Ok(value >= r.min && value <= r.max)
        }
    }
}

/// Result of evaluating a rule set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEvaluation {
    /// Rules whose conditions all held, in input order.
    pub triggered_rules: Vec<CircuitRule>,
    pub consequences: Vec<Consequence>,
    /// Rules excluded by validation.
    pub skipped: Vec<SkippedRule>,
}

impl RuleEvaluation {
    pub fn is_empty(&self) -> bool {
        self.triggered_rules.is_empty()
    }
}

/// Evaluates conditions and rules, reporting anomalies to an observer.
#[derive(Clone)]
pub struct RuleEvaluator {
    settings: EvaluationSettings,
    observer: Arc<dyn DiagnosticObserver>,
}

impl Default for RuleEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEvaluator {
    pub fn new() -> Self {
        Self {
            settings: EvaluationSettings::default(),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_settings(mut self, settings: EvaluationSettings) -> Self {
        self.settings = settings.sanitized();
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn DiagnosticObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn settings(&self) -> &EvaluationSettings {
        &self.settings
    }

    /// Judges a condition, or says why it could not be judged.
    pub fn assess_condition(
        &self,
        condition: &Condition,
        context: &EvaluationContext<'_>,
    ) -> Result<bool, Unsatisfied> {
        self.assess_in_rule(condition, context, None)
    }

    /// True only when the condition can be confidently judged true.
    pub fn evaluate_condition(&self, condition: &Condition, context: &EvaluationContext<'_>) -> bool {
        matches!(self.assess_condition(condition, context), Ok(true))
    }

    /// A disabled rule or one without conditions never fires; otherwise
    /// every condition must hold.
    pub fn evaluate_rule(&self, rule: &CircuitRule, context: &EvaluationContext<'_>) -> bool {
        if !rule.enabled || rule.conditions.is_empty() {
            return false;
        }
        rule.conditions
            .iter()
            .all(|condition| matches!(self.assess_in_rule(condition, context, Some(&rule.id)), Ok(true)))
    }

    /// Validates every rule, skips the invalid ones and returns the rules
    /// that fired together with their consequences.
    pub fn evaluate_all_rules(
        &self,
        rules: &[CircuitRule],
        context: &EvaluationContext<'_>,
    ) -> RuleEvaluation {
        let mut evaluation = RuleEvaluation::default();

        for (index, rule) in rules.iter().enumerate() {
            let validation = validate_rule(rule);
            if !validation.is_valid() {
                let skipped = SkippedRule {
                    index,
                    rule_id: Some(rule.id.clone()).filter(|id| !id.trim().is_empty()),
                    errors: validation.messages(),
                };
                self.observer.observe(&DiagnosticEvent::RuleSkipped {
                    rule_id: skipped.rule_id.clone(),
                    errors: skipped.errors.clone(),
                });
                evaluation.skipped.push(skipped);
                continue;
            }

            if self.evaluate_rule(rule, context) {
                evaluation.consequences.push(rule.consequence.clone());
                evaluation.triggered_rules.push(rule.clone());
            }
        }

        tracing::debug!(
            "Evaluated {} rules: {} triggered, {} skipped",
            rules.len(),
            evaluation.triggered_rules.len(),
            evaluation.skipped.len()
        );
        evaluation
    }

    fn assess_in_rule(
        &self,
        condition: &Condition,
        context: &EvaluationContext<'_>,
        rule_id: Option<&str>,
    ) -> Result<bool, Unsatisfied> {
        if let Err(defect) = check_condition(condition) {
            let event = match condition {
                Condition::Unsupported => DiagnosticEvent::UnsupportedCondition {
                    rule_id: rule_id.map(str::to_string),
                },
                _ => DiagnosticEvent::InvalidCondition {
                    rule_id: rule_id.map(str::to_string),
                    condition_id: condition.id().map(str::to_string),
                    defect: defect.to_string(),
                },
            };
            self.observer.observe(&event);
            return Err(Unsatisfied::Structural(defect));
        }

        let result = match condition {
            Condition::NetVoltage(c) => self.assess_net_voltage(c, context),
            Condition::Measurement(c) => self.assess_measurement(c, context),
            Condition::ComponentState(c) => assess_component_state(c, context),
            Condition::SignalPresent(c) => assess_signal_present(c, context),
            // Rejected by check_condition above.
            Condition::NetCurrent(_) => Err(Unsatisfied::Structural(ConditionDefect::NoOperatorFamily)),
            Condition::Unsupported => Err(Unsatisfied::Structural(ConditionDefect::UnsupportedType)),
        };

        if let (Err(reason), Some(id)) = (&result, condition.id()) {
            self.report(*reason, id, condition, context, rule_id);
        }
        result
    }

    fn assess_net_voltage(
        &self,
        condition: &NumericCondition,
        context: &EvaluationContext<'_>,
    ) -> Result<bool, Unsatisfied> {
        let net = context.net(&condition.target_id).ok_or(Unsatisfied::NotFound)?;
        let voltage = net.voltage.ok_or(Unsatisfied::Unmeasured)?;
        compare_numeric(
            voltage,
            condition.operator,
            condition.value,
            condition.value_range,
            &self.settings,
        )
    }

    fn assess_measurement(
        &self,
        condition: &NumericCondition,
        context: &EvaluationContext<'_>,
    ) -> Result<bool, Unsatisfied> {
        let measurement = context
            .measurement_for(&condition.target_id)
            .ok_or(Unsatisfied::NotFound)?;
        let raw = measurement.reading().ok_or(Unsatisfied::Unmeasured)?;
        let value = parse_reading(raw).ok_or(Unsatisfied::Unparseable)?;
        compare_numeric(
            value,
            condition.operator,
            condition.value,
            condition.value_range,
            &self.settings,
        )
    }

    fn report(
        &self,
        reason: Unsatisfied,
        condition_id: &str,
        condition: &Condition,
        context: &EvaluationContext<'_>,
        rule_id: Option<&str>,
    ) {
        let rule_id = rule_id.map(str::to_string);
        let condition_id = condition_id.to_string();
        let event = match reason {
            Unsatisfied::UnsafeValue(value) => DiagnosticEvent::UnsafeValue {
                rule_id,
                condition_id,
                value,
            },
            Unsatisfied::UnsafeThreshold | Unsatisfied::InvertedRange => {
                DiagnosticEvent::InvalidThreshold {
                    rule_id,
                    condition_id,
                    reason: reason.to_string(),
                }
            }
            Unsatisfied::Unparseable => DiagnosticEvent::UnparseableReading {
                rule_id,
                condition_id,
                raw: condition
                    .target_id()
                    .and_then(|t| context.measurement_for(t))
                    .and_then(|m| m.actual_value.clone())
                    .unwrap_or_default(),
            },
            // Missing data is the normal "not satisfied" case.
            Unsatisfied::NotFound
            | Unsatisfied::Unmeasured
            | Unsatisfied::MissingThreshold
            | Unsatisfied::Structural(_) => return,
        };
        self.observer.observe(&event);
    }
}

fn assess_component_state(
    condition: &PresenceCondition,
    context: &EvaluationContext<'_>,
) -> Result<bool, Unsatisfied> {
    let component = context
        .component(&condition.target_id)
        .ok_or(Unsatisfied::NotFound)?;
    let connected = component.connected.ok_or(Unsatisfied::Unmeasured)?;
    Ok(match condition.operator {
        PresenceOperator::Present => connected,
        PresenceOperator::Absent => !connected,
    })
}

fn assess_signal_present(
    condition: &PresenceCondition,
    context: &EvaluationContext<'_>,
) -> Result<bool, Unsatisfied> {
    let measurement = context
        .measurement_for(&condition.target_id)
        .ok_or(Unsatisfied::NotFound)?;
    let has_reading = measurement.reading().is_some();
    Ok(match condition.operator {
        PresenceOperator::Present => measurement.status == MeasurementStatus::Complete && has_reading,
        PresenceOperator::Absent => measurement.status == MeasurementStatus::Failed || !has_reading,
    })
}
