//! Causal rules: conditions over circuit state mapped to a predicted consequence.
//!
//! A [`Condition`] is a tagged union keyed by its `type`. Numeric variants can
//! only hold a [`NumericOperator`] and presence variants only a
//! [`PresenceOperator`], so a `net_voltage` condition with operator `present`
//! cannot be constructed (and fails to deserialize). What remains to check at
//! runtime are the cross-field invariants, see [`crate::engine::validate`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Comparison operators admitted by numeric conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericOperator {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "between")]
    Between,
}

impl NumericOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            NumericOperator::Gt => ">",
            NumericOperator::Lt => "<",
            NumericOperator::Eq => "=",
            NumericOperator::Ge => ">=",
            NumericOperator::Le => "<=",
            NumericOperator::Ne => "!=",
            NumericOperator::Between => "between",
        }
    }
}

impl fmt::Display for NumericOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for NumericOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" => Ok(NumericOperator::Gt),
            "<" => Ok(NumericOperator::Lt),
            "=" | "==" => Ok(NumericOperator::Eq),
            ">=" => Ok(NumericOperator::Ge),
            "<=" => Ok(NumericOperator::Le),
            "!=" => Ok(NumericOperator::Ne),
            "between" => Ok(NumericOperator::Between),
            other => Err(format!("'{}' is not a numeric operator", other)),
        }
    }
}

/// Operators admitted by presence conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceOperator {
    Present,
    Absent,
}

impl PresenceOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            PresenceOperator::Present => "present",
            PresenceOperator::Absent => "absent",
        }
    }
}

impl fmt::Display for PresenceOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

/// Payload of a numeric condition (`net_voltage`, `net_current`, `measurement`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericCondition {
    pub id: String,
    pub target_id: String,
    pub operator: NumericOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_range: Option<ValueRange>,
    #[serde(default)]
    pub description: String,
}

impl NumericCondition {
    pub fn new(id: impl Into<String>, target_id: impl Into<String>, operator: NumericOperator) -> Self {
        Self {
            id: id.into(),
            target_id: target_id.into(),
            operator,
            value: None,
            value_range: None,
            description: String::new(),
        }
    }

    pub fn threshold(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.value_range = Some(ValueRange { min, max });
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Payload of a presence condition (`component_state`, `signal_present`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceCondition {
    pub id: String,
    pub target_id: String,
    pub operator: PresenceOperator,
    #[serde(default)]
    pub description: String,
}

impl PresenceCondition {
    pub fn new(id: impl Into<String>, target_id: impl Into<String>, operator: PresenceOperator) -> Self {
        Self {
            id: id.into(),
            target_id: target_id.into(),
            operator,
            description: String::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A single testable predicate over circuit or measurement state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Voltage of a net, resolved by net id.
    NetVoltage(NumericCondition),
    /// Nets carry no current telemetry; always structurally invalid.
    NetCurrent(NumericCondition),
    /// Numeric reading of a measurement step, resolved by step id or net id.
    Measurement(NumericCondition),
    /// `present` when the component is connected, `absent` when it is not.
    ComponentState(PresenceCondition),
    /// Whether a measurement step produced a reading.
    SignalPresent(PresenceCondition),
    /// Any `type` outside the known vocabulary.
    #[serde(other)]
    Unsupported,
}

impl Condition {
    pub fn net_voltage(condition: NumericCondition) -> Self {
        Condition::NetVoltage(condition)
    }

    pub fn measurement(condition: NumericCondition) -> Self {
        Condition::Measurement(condition)
    }

    pub fn component_state(condition: PresenceCondition) -> Self {
        Condition::ComponentState(condition)
    }

    pub fn signal_present(condition: PresenceCondition) -> Self {
        Condition::SignalPresent(condition)
    }

    /// The vocabulary name of this condition's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Condition::NetVoltage(_) => "net_voltage",
            Condition::NetCurrent(_) => "net_current",
            Condition::Measurement(_) => "measurement",
            Condition::ComponentState(_) => "component_state",
            Condition::SignalPresent(_) => "signal_present",
            Condition::Unsupported => "unsupported",
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Condition::NetVoltage(c) | Condition::NetCurrent(c) | Condition::Measurement(c) => {
                Some(&c.id)
            }
            Condition::ComponentState(c) | Condition::SignalPresent(c) => Some(&c.id),
            Condition::Unsupported => None,
        }
    }

    pub fn target_id(&self) -> Option<&str> {
        match self {
            Condition::NetVoltage(c) | Condition::NetCurrent(c) | Condition::Measurement(c) => {
                Some(&c.target_id)
            }
            Condition::ComponentState(c) | Condition::SignalPresent(c) => Some(&c.target_id),
            Condition::Unsupported => None,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Condition::NetVoltage(c) | Condition::NetCurrent(c) | Condition::Measurement(c) => {
                &c.description
            }
            Condition::ComponentState(c) | Condition::SignalPresent(c) => &c.description,
            Condition::Unsupported => "",
        }
    }

    pub fn operator_symbol(&self) -> Option<&'static str> {
        match self {
            Condition::NetVoltage(c) | Condition::NetCurrent(c) | Condition::Measurement(c) => {
                Some(c.operator.symbol())
            }
            Condition::ComponentState(c) | Condition::SignalPresent(c) => Some(c.operator.symbol()),
            Condition::Unsupported => None,
        }
    }
}

/// Severity of a predicted consequence or narrative. Ordered `Info < Warning < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsequenceType {
    FunctionalFailure,
    OscillationStop,
    RailDrop,
    SignalLoss,
    Heating,
    NoOutput,
}

impl ConsequenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsequenceType::FunctionalFailure => "functional_failure",
            ConsequenceType::OscillationStop => "oscillation_stop",
            ConsequenceType::RailDrop => "rail_drop",
            ConsequenceType::SignalLoss => "signal_loss",
            ConsequenceType::Heating => "heating",
            ConsequenceType::NoOutput => "no_output",
        }
    }
}

impl fmt::Display for ConsequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The predicted failure effect carried by a rule when it fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consequence {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ConsequenceType,
    pub severity: Severity,
    #[serde(default)]
    pub affected_net_ids: Vec<String>,
    #[serde(default)]
    pub affected_component_ids: Vec<String>,
    pub description: String,
    /// The causal "why".
    pub explanation: String,
}

impl Consequence {
    /// True when the consequence names `net_id` or `component_id` as affected.
    pub fn affects(&self, net_id: Option<&str>, component_id: Option<&str>) -> bool {
        let hits_net = net_id.is_some_and(|id| self.affected_net_ids.iter().any(|n| n == id));
        let hits_component =
            component_id.is_some_and(|id| self.affected_component_ids.iter().any(|c| c == id));
        hits_net || hits_component
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Power,
    Signal,
    Timing,
    Filtering,
    Amplification,
    Regulation,
    #[default]
    General,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 7] = [
        RuleCategory::Power,
        RuleCategory::Signal,
        RuleCategory::Timing,
        RuleCategory::Filtering,
        RuleCategory::Amplification,
        RuleCategory::Regulation,
        RuleCategory::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Power => "power",
            RuleCategory::Signal => "signal",
            RuleCategory::Timing => "timing",
            RuleCategory::Filtering => "filtering",
            RuleCategory::Amplification => "amplification",
            RuleCategory::Regulation => "regulation",
            RuleCategory::General => "general",
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        RuleCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| format!("unknown rule category '{}'", s))
    }
}

fn default_true() -> bool {
    true
}

/// An AND-combination of conditions mapped to one consequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitRule {
    pub id: String,
    pub name: String,
    pub circuit_id: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    pub consequence: Consequence,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub category: RuleCategory,
}
