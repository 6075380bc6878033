//! Human-readable account of why a rule fired.

use super::evaluate::{EvaluationContext, RuleEvaluator};
use crate::model::{CircuitRule, Condition};

const NO_MEASUREMENT: &str = "(no measurement)";
const READ_ERROR: &str = "(error reading value)";

impl RuleEvaluator {
    /// Renders the rule name, one bullet per condition annotated with the
    /// value it resolved to, then the consequence and its explanation.
    ///
    /// Lookups that fail degrade to an inline annotation; rendering itself
    /// cannot fail.
    pub fn explain_rule_trigger(&self, rule: &CircuitRule, context: &EvaluationContext<'_>) -> String {
        let name = if rule.name.trim().is_empty() {
            "Unnamed Rule"
        } else {
            rule.name.as_str()
        };

        let mut out = format!("{}:\nConditions:\n", name);
        for condition in &rule.conditions {
            let description = match condition.description() {
                "" => "No description",
                d => d,
            };
            out.push_str(&format!(
                "  • {} {}\n",
                description,
                self.annotate(condition, context)
            ));
        }

        let consequence = &rule.consequence;
        let description = or_placeholder(&consequence.description, "No consequence description");
        let explanation = or_placeholder(&consequence.explanation, "No explanation");
        out.push_str(&format!("Consequence: {}\nExplanation: {}", description, explanation));
        out
    }

    fn annotate(&self, condition: &Condition, context: &EvaluationContext<'_>) -> String {
        match condition {
            Condition::NetVoltage(c) => match context.net(&c.target_id).and_then(|n| n.voltage) {
                Some(v) if v.is_finite() => format!("(measured: {:.2}V)", v),
                Some(_) => READ_ERROR.to_string(),
                None => NO_MEASUREMENT.to_string(),
            },
            Condition::Measurement(c) => match context
                .measurement_for(&c.target_id)
                .and_then(|m| m.reading())
            {
                Some(raw) => format!("(measured: {})", raw),
                None => NO_MEASUREMENT.to_string(),
            },
            Condition::ComponentState(c) => {
                match context.component(&c.target_id).and_then(|comp| comp.connected) {
                    Some(true) => "(connected)".to_string(),
                    Some(false) => "(disconnected)".to_string(),
                    None => NO_MEASUREMENT.to_string(),
                }
            }
            Condition::SignalPresent(c) => match context.measurement_for(&c.target_id) {
                Some(m) => format!("(status: {})", m.status),
                None => NO_MEASUREMENT.to_string(),
            },
            Condition::NetCurrent(_) => NO_MEASUREMENT.to_string(),
            Condition::Unsupported => READ_ERROR.to_string(),
        }
    }
}

fn or_placeholder<'a>(text: &'a str, placeholder: &'a str) -> &'a str {
    if text.trim().is_empty() {
        placeholder
    } else {
        text
    }
}
