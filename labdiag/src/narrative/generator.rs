//! Technical narrative generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::actions::{
    consequence_actions, measurement_actions, to_owned, OVER_VOLTAGE_ACTIONS, PASS_ACTIONS,
    UNDER_VOLTAGE_ACTIONS,
};
use super::tolerance::{parse_actual_value, parse_expected_value, ActualValue, ExpectedValue};
use crate::model::{
    Circuit, CircuitRule, Component, Consequence, MeasurementStatus, MeasurementStep, Net, Severity,
};

/// Fail when the reading is below this fraction of the lower bound.
pub const FAIL_LOW_FACTOR: f64 = 0.5;
/// Fail when the reading is above this multiple of the upper bound.
pub const FAIL_HIGH_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Pass,
    Fail,
    Warning,
    Unknown,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Pass => "pass",
            Decision::Fail => "fail",
            Decision::Warning => "warning",
            Decision::Unknown => "unknown",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Decision::Pass | Decision::Unknown => Severity::Info,
            Decision::Warning => Severity::Warning,
            Decision::Fail => Severity::Critical,
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A synthesized verdict comparing expected against observed.
///
/// Created once per measurement or consequence and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalNarrative {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    pub expected: String,
    pub observed: String,
    pub decision: Decision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probable_cause: Option<String>,
    pub full_narrative: String,
    pub severity: Severity,
    pub technical_explanation: String,
    pub recommended_actions: Vec<String>,
}

fn narrative_id(source_id: &str) -> String {
    format!("narrative-{}-{}", source_id, Uuid::new_v4())
}

/// What a measurement narrative is generated from.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeContext<'a> {
    pub circuit: &'a Circuit,
    pub measurement: Option<&'a MeasurementStep>,
    pub net: Option<&'a Net>,
    pub component: Option<&'a Component>,
    /// Rules that fired in the latest evaluation, used to attribute a cause.
    pub triggered_rules: &'a [CircuitRule],
}

impl<'a> NarrativeContext<'a> {
    pub fn new(circuit: &'a Circuit) -> Self {
        Self {
            circuit,
            measurement: None,
            net: None,
            component: None,
            triggered_rules: &[],
        }
    }

    pub fn with_measurement(mut self, measurement: &'a MeasurementStep) -> Self {
        self.measurement = Some(measurement);
        self
    }

    pub fn with_net(mut self, net: &'a Net) -> Self {
        self.net = Some(net);
        self
    }

    pub fn with_component(mut self, component: &'a Component) -> Self {
        self.component = Some(component);
        self
    }

    pub fn with_triggered_rules(mut self, rules: &'a [CircuitRule]) -> Self {
        self.triggered_rules = rules;
        self
    }

    /// The triggered rule naming this context's net or component, falling
    /// back to the first triggered rule.
    fn relevant_rule(&self) -> Option<&'a CircuitRule> {
        let net_id = self.net.map(|n| n.id.as_str());
        let component_id = self.component.map(|c| c.id.as_str());
        self.triggered_rules
            .iter()
            .find(|rule| rule.consequence.affects(net_id, component_id))
            .or_else(|| self.triggered_rules.first())
    }
}

/// Classifies an observed value against a tolerance band.
pub fn classify(expected: &ExpectedValue, observed: f64) -> Decision {
    if expected.contains(observed) {
        Decision::Pass
    } else if observed < expected.min_tolerance * FAIL_LOW_FACTOR
        || observed > expected.max_tolerance * FAIL_HIGH_FACTOR
    {
        Decision::Fail
    } else {
        Decision::Warning
    }
}

struct Diagnosis {
    cause: String,
    explanation: String,
    actions: Vec<String>,
}

fn deviation_cause(expected: &ExpectedValue, actual: &ActualValue) -> Diagnosis {
    let direction = if actual.value < expected.min_tolerance {
        "below"
    } else {
        "above"
    };
    let magnitude = if expected.nominal == 0.0 {
        format!("{}{}", (actual.value - expected.nominal).abs(), actual.unit)
    } else {
        let percent = (actual.value - expected.nominal) / expected.nominal * 100.0;
        format!("{}%", ((percent * 10.0).round() / 10.0).abs())
    };
    let cause = format!("Voltage is {} {} expected", magnitude, direction);

    if direction == "below" {
        Diagnosis {
            cause,
            explanation: "The measured voltage is significantly lower than specified. This could \
                indicate excessive load, component failure, or power supply issues."
                .to_string(),
            actions: to_owned(UNDER_VOLTAGE_ACTIONS),
        }
    } else {
        Diagnosis {
            cause,
            explanation: "The measured voltage is significantly higher than specified. This could \
                indicate open circuits, missing loads, or incorrect component values."
                .to_string(),
            actions: to_owned(OVER_VOLTAGE_ACTIONS),
        }
    }
}

/// Builds the narrative for one measurement.
///
/// Returns `None` when there is no measurement, the reading is blank, or
/// either the expected or observed value cannot be parsed.
pub fn generate_measurement_narrative(context: &NarrativeContext<'_>) -> Option<TechnicalNarrative> {
    let measurement = context.measurement?;
    let raw = measurement.reading()?;
    let expected = parse_expected_value(measurement.expected_value.as_deref().unwrap_or_default())?;
    let actual = parse_actual_value(raw)?;

    let decision = classify(&expected, actual.value);

    let diagnosis = match context.relevant_rule() {
        Some(rule) => Diagnosis {
            cause: rule.consequence.description.clone(),
            explanation: rule.consequence.explanation.clone(),
            actions: to_owned(measurement_actions(rule.consequence.kind)),
        },
        None if decision != Decision::Pass => deviation_cause(&expected, &actual),
        None => Diagnosis {
            cause: "Measurement within acceptable range".to_string(),
            explanation: "The measured value matches the expected specification within tolerance."
                .to_string(),
            actions: to_owned(PASS_ACTIONS),
        },
    };

    let net_name = context.net.map_or("Unknown Net", |n| n.name.as_str());
    let location = match context.component {
        Some(component) if !component.name.is_empty() => {
            format!("at {} ({})", component.name, net_name)
        }
        _ => format!("at {}", net_name),
    };

    let expected_text = expected.describe();
    let observed_text = actual.to_string();
    let verdict = if decision == Decision::Pass {
        "Nominal operation.".to_string()
    } else {
        format!("Probable cause: {}.", diagnosis.cause)
    };
    let full_narrative = format!(
        "{}: Expected {} {}. Observed: {}. Result: {}. {}",
        measurement.name,
        expected_text,
        location,
        observed_text,
        decision.as_str().to_uppercase(),
        verdict
    );

    Some(TechnicalNarrative {
        id: narrative_id(&measurement.id),
        timestamp: Utc::now(),
        net_id: context.net.map(|n| n.id.clone()),
        component_id: context.component.map(|c| c.id.clone()),
        expected: expected_text,
        observed: observed_text,
        decision,
        probable_cause: (decision != Decision::Pass).then_some(diagnosis.cause),
        full_narrative,
        severity: decision.severity(),
        technical_explanation: diagnosis.explanation,
        recommended_actions: diagnosis.actions,
    })
}

/// Builds the narrative for a predicted consequence. Always a `Fail`.
pub fn generate_consequence_narrative(
    consequence: &Consequence,
    circuit: &Circuit,
    rule: Option<&CircuitRule>,
) -> TechnicalNarrative {
    let affected: Vec<&str> = consequence
        .affected_net_ids
        .iter()
        .filter_map(|id| circuit.net(id).map(|n| n.name.as_str()))
        .chain(
            consequence
                .affected_component_ids
                .iter()
                .filter_map(|id| circuit.component(id).map(|c| c.name.as_str())),
        )
        .collect();

    let rule_name = rule
        .map(|r| r.name.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("Diagnostic Rule");

    let mut full_narrative = format!("{}: {}. ", rule_name, consequence.description);
    if !affected.is_empty() {
        full_narrative.push_str(&format!("Affects: {}. ", affected.join(", ")));
    }
    full_narrative.push_str(&format!("Explanation: {}", consequence.explanation));

    TechnicalNarrative {
        id: narrative_id(&consequence.id),
        timestamp: Utc::now(),
        net_id: consequence.affected_net_ids.first().cloned(),
        component_id: consequence.affected_component_ids.first().cloned(),
        expected: "Normal operation".to_string(),
        observed: consequence.description.clone(),
        decision: Decision::Fail,
        probable_cause: Some(consequence.description.clone()),
        full_narrative,
        severity: consequence.severity,
        technical_explanation: consequence.explanation.clone(),
        recommended_actions: to_owned(consequence_actions(consequence.kind)),
    }
}

/// Narrates every completed measurement with a reading, in input order.
///
/// Each step's net and component are resolved against `context.circuit`;
/// steps whose values cannot be parsed are left out.
pub fn generate_workflow_narratives(
    context: &NarrativeContext<'_>,
    measurements: &[MeasurementStep],
) -> Vec<TechnicalNarrative> {
    measurements
        .iter()
        .filter(|m| m.status == MeasurementStatus::Complete && m.reading().is_some())
        .filter_map(|measurement| {
            let step_context = NarrativeContext {
                measurement: Some(measurement),
                net: measurement.net_id.as_deref().and_then(|id| context.circuit.net(id)),
                component: measurement
                    .component_id
                    .as_deref()
                    .and_then(|id| context.circuit.component(id)),
                ..*context
            };
            generate_measurement_narrative(&step_context)
        })
        .collect()
}
