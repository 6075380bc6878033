//! Measurement workflow records.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MeasurementStatus {
    #[default]
    Pending,
    InProgress,
    Complete,
    Failed,
}

impl MeasurementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementStatus::Pending => "pending",
            MeasurementStatus::InProgress => "in-progress",
            MeasurementStatus::Complete => "complete",
            MeasurementStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for MeasurementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a measurement workflow.
///
/// `expected_value` is a free-text tolerance specification (`"5V ± 5%"`) and
/// `actual_value` the observed reading as typed or received (`"5.02V"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementStep {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub probe: String,
    #[serde(default)]
    pub test_point: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<String>,
    #[serde(default)]
    pub status: MeasurementStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
}

impl MeasurementStep {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            probe: String::new(),
            test_point: String::new(),
            expected_value: None,
            actual_value: None,
            status: MeasurementStatus::Pending,
            net_id: None,
            component_id: None,
        }
    }

    pub fn expecting(mut self, expected: impl Into<String>) -> Self {
        self.expected_value = Some(expected.into());
        self
    }

    /// Records a reading and marks the step complete.
    pub fn observed(mut self, actual: impl Into<String>) -> Self {
        self.actual_value = Some(actual.into());
        self.status = MeasurementStatus::Complete;
        self
    }

    pub fn with_status(mut self, status: MeasurementStatus) -> Self {
        self.status = status;
        self
    }

    pub fn on_net(mut self, net_id: impl Into<String>) -> Self {
        self.net_id = Some(net_id.into());
        self
    }

    pub fn on_component(mut self, component_id: impl Into<String>) -> Self {
        self.component_id = Some(component_id.into());
        self
    }

    /// The reading, if one was recorded and is not blank.
    pub fn reading(&self) -> Option<&str> {
        self.actual_value.as_deref().filter(|v| !v.is_empty())
    }

    /// True when `target_id` names this step or the net it probes.
    pub fn matches_target(&self, target_id: &str) -> bool {
        self.id == target_id || self.net_id.as_deref() == Some(target_id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowStatus {
    #[default]
    NotStarted,
    InProgress,
    Complete,
}

/// How the readings of a workflow are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementSource {
    Manual,
    Serial,
    Usb,
    Ble,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementWorkflow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub circuit_id: String,
    #[serde(default)]
    pub steps: Vec<MeasurementStep>,
    #[serde(default)]
    pub status: WorkflowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<MeasurementSource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_spelling() {
        let status: MeasurementStatus = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(status, MeasurementStatus::InProgress);
        assert_eq!(serde_json::to_string(&MeasurementStatus::Complete).unwrap(), "\"complete\"");
    }

    #[test]
    fn test_reading_ignores_blank_values() {
        let step = MeasurementStep::new("m1", "VCC").observed("");
        assert_eq!(step.reading(), None);

        let step = MeasurementStep::new("m1", "VCC").observed("5.02V");
        assert_eq!(step.reading(), Some("5.02V"));
        assert_eq!(step.status, MeasurementStatus::Complete);
    }

    #[test]
    fn test_matches_target_by_id_or_net() {
        let step = MeasurementStep::new("m1", "VCC").on_net("vcc");
        assert!(step.matches_target("m1"));
        assert!(step.matches_target("vcc"));
        assert!(!step.matches_target("gnd"));
    }

    #[test]
    fn test_workflow_defaults() {
        let json = r#"{"id":"workflow-1","name":"Power Supply Verification","steps":[{"id":"step-1","name":"Measure VCC"}]}"#;
        let workflow: MeasurementWorkflow = serde_json::from_str(json).unwrap();
        assert_eq!(workflow.status, WorkflowStatus::NotStarted);
        assert_eq!(workflow.steps[0].status, MeasurementStatus::Pending);
        assert!(workflow.source.is_none());
    }
}
