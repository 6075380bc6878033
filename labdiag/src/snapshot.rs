//! Loading of caller-owned lab state from JSON.
//!
//! A snapshot is the JSON form of one circuit under test, its measurement
//! workflows and the rules attached to it:
//!
//! ```json
//! {
//!   "circuit": { "id": "circuit-1", "name": "Audio Amplifier Stage", "nets": [], "components": [] },
//!   "workflows": [ { "id": "workflow-1", "name": "Power Supply Verification", "steps": [] } ],
//!   "rules": [ { "id": "vcc-low", "name": "VCC below 2V", "circuitId": "circuit-1", "conditions": [], "consequence": {} } ]
//! }
//! ```
//!
//! Rules are read one at a time. A rule that cannot be read is recorded as a
//! [`SkippedRule`] and the rest of the snapshot still loads.

use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use crate::core::LabDiagError;
use crate::engine::{EvaluationContext, SkippedRule};
use crate::model::{Circuit, CircuitRule, MeasurementStep, MeasurementWorkflow};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabSnapshot {
    pub circuit: Circuit,
    pub workflows: Vec<MeasurementWorkflow>,
    pub rules: Vec<CircuitRule>,
    /// Rules dropped while loading. `index` is the position in the file.
    pub skipped_rules: Vec<SkippedRule>,
}

impl LabSnapshot {
    pub fn new(circuit: Circuit) -> Self {
        Self {
            circuit,
            workflows: Vec::new(),
            rules: Vec::new(),
            skipped_rules: Vec::new(),
        }
    }

    pub fn with_workflow(mut self, workflow: MeasurementWorkflow) -> Self {
        self.workflows.push(workflow);
        self
    }

    pub fn with_rule(mut self, rule: CircuitRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn from_path(path: &Path) -> Result<Self, LabDiagError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content).map_err(|e| match e {
            LabDiagError::Load(msg) => LabDiagError::Load(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, LabDiagError> {
        let root: Value = serde_json::from_str(json)?;
        let Value::Object(mut root) = root else {
            return Err(LabDiagError::Load("snapshot must be a JSON object".to_string()));
        };

        let circuit = match root.remove("circuit") {
            Some(Value::Null) | None => {
                return Err(LabDiagError::Load("snapshot has no circuit".to_string()))
            }
            Some(value) => serde_json::from_value::<Circuit>(value)
                .map_err(|e| LabDiagError::Load(format!("invalid circuit: {}", e)))?,
        };

        let workflows = match root.remove("workflows") {
            Some(Value::Null) | None => Vec::new(),
            Some(value) => serde_json::from_value::<Vec<MeasurementWorkflow>>(value)
                .map_err(|e| LabDiagError::Load(format!("invalid workflows: {}", e)))?,
        };

        let (rules, skipped_rules) = parse_rules(root.remove("rules"));

        tracing::debug!(
            "Loaded snapshot for circuit {}: {} workflows, {} rules, {} skipped",
            circuit.id,
            workflows.len(),
            rules.len(),
            skipped_rules.len()
        );

        Ok(Self {
            circuit,
            workflows,
            rules,
            skipped_rules,
        })
    }

    /// Every workflow step, workflows in order and steps in order.
    pub fn measurements(&self) -> Vec<MeasurementStep> {
        self.workflows
            .iter()
            .flat_map(|w| w.steps.iter().cloned())
            .collect()
    }

    /// Evaluation context over this circuit and the given measurements,
    /// usually the result of [`measurements`](Self::measurements).
    pub fn context<'a>(&'a self, measurements: &'a [MeasurementStep]) -> EvaluationContext<'a> {
        EvaluationContext::from_circuit(&self.circuit, measurements)
    }

    pub fn rule(&self, id: &str) -> Option<&CircuitRule> {
        self.rules.iter().find(|r| r.id == id)
    }
}

/// Reads each array element as a rule, keeping the ones that parse.
fn parse_rules(value: Option<Value>) -> (Vec<CircuitRule>, Vec<SkippedRule>) {
    let items = match value {
        None => return (Vec::new(), Vec::new()),
        Some(Value::Array(items)) => items,
        Some(Value::Null) => {
            tracing::warn!("Snapshot rules are null, evaluating no rules");
            return (Vec::new(), Vec::new());
        }
        Some(other) => {
            tracing::warn!(
                "Snapshot rules are not an array (found {}), evaluating no rules",
                json_kind(&other)
            );
            return (Vec::new(), Vec::new());
        }
    };

    let mut rules = Vec::new();
    let mut skipped = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        let rule_id = item
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string);

        match serde_json::from_value::<CircuitRule>(item) {
            Ok(rule) => rules.push(rule),
            Err(e) => {
                tracing::warn!(
                    "Skipping unreadable rule {} at index {}: {}",
                    rule_id.as_deref().unwrap_or("<no id>"),
                    index,
                    e
                );
                skipped.push(SkippedRule {
                    index,
                    rule_id,
                    errors: vec![e.to_string()],
                });
            }
        }
    }
    (rules, skipped)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
