//! Promotion of a template into an evaluable rule.

use super::RuleTemplate;
use crate::core::LabDiagError;
use crate::engine::validate_rule;
use crate::model::{CircuitRule, Condition, Consequence};

/// Attaches circuit-specific data to a [`RuleTemplate`].
///
/// ```
/// use labdiag::library::{find_rule_template, RuleBuilder};
/// use labdiag::model::{Condition, NumericCondition, NumericOperator};
///
/// let template = find_rule_template("Rail Voltage Below Minimum").unwrap();
/// let rule = RuleBuilder::from_template(template)
///     .with_id("vcc-low")
///     .for_circuit("circuit-1")
///     .with_condition(Condition::net_voltage(
///         NumericCondition::new("cond-1", "vcc", NumericOperator::Lt)
///             .threshold(4.5)
///             .describe("VCC below 4.5V"),
///     ))
///     .affecting_net("vcc")
///     .build()
///     .unwrap();
/// assert_eq!(rule.consequence.id, "vcc-low-consequence");
/// ```
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    template: RuleTemplate,
    id: String,
    circuit_id: String,
    name: Option<String>,
    consequence_id: Option<String>,
    conditions: Vec<Condition>,
    affected_net_ids: Vec<String>,
    affected_component_ids: Vec<String>,
    enabled: Option<bool>,
}

impl RuleBuilder {
    pub fn from_template(template: &RuleTemplate) -> Self {
        Self {
            template: template.clone(),
            id: String::new(),
            circuit_id: String::new(),
            name: None,
            consequence_id: None,
            conditions: Vec::new(),
            affected_net_ids: Vec::new(),
            affected_component_ids: Vec::new(),
            enabled: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn for_circuit(mut self, circuit_id: impl Into<String>) -> Self {
        self.circuit_id = circuit_id.into();
        self
    }

    /// Overrides the template name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Defaults to `<rule id>-consequence`.
    pub fn with_consequence_id(mut self, id: impl Into<String>) -> Self {
        self.consequence_id = Some(id.into());
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_conditions(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.conditions.extend(conditions);
        self
    }

    pub fn affecting_net(mut self, net_id: impl Into<String>) -> Self {
        self.affected_net_ids.push(net_id.into());
        self
    }

    pub fn affecting_component(mut self, component_id: impl Into<String>) -> Self {
        self.affected_component_ids.push(component_id.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Assembles the rule and validates it.
    pub fn build(self) -> Result<CircuitRule, LabDiagError> {
        let consequence_id = self
            .consequence_id
            .unwrap_or_else(|| format!("{}-consequence", self.id));
        let template = self.template;

        let rule = CircuitRule {
            id: self.id,
            name: self.name.unwrap_or(template.name),
            circuit_id: self.circuit_id,
            conditions: self.conditions,
            consequence: Consequence {
                id: consequence_id,
                kind: template.consequence.kind,
                severity: template.consequence.severity,
                affected_net_ids: self.affected_net_ids,
                affected_component_ids: self.affected_component_ids,
                description: template.consequence.description,
                explanation: template.consequence.explanation,
            },
            enabled: self.enabled.unwrap_or(template.enabled),
            category: template.category,
        };

        let validation = validate_rule(&rule);
        if !validation.is_valid() {
            return Err(LabDiagError::InvalidRule {
                rule_id: rule.id,
                errors: validation.messages(),
            });
        }
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::find_rule_template;
    use crate::model::{PresenceCondition, PresenceOperator, RuleCategory};

    fn oscillator_template() -> &'static RuleTemplate {
        find_rule_template("Oscillator Not Starting").unwrap()
    }

    #[test]
    fn test_build_from_template() {
        let rule = RuleBuilder::from_template(oscillator_template())
            .with_id("osc-dead")
            .for_circuit("mcu-board")
            .with_condition(Condition::signal_present(PresenceCondition::new(
                "c1",
                "clk",
                PresenceOperator::Absent,
            )))
            .affecting_component("y1")
            .build()
            .unwrap();

        assert_eq!(rule.name, "Oscillator Not Starting");
        assert_eq!(rule.category, RuleCategory::Timing);
        assert_eq!(rule.consequence.affected_component_ids, vec!["y1"]);
        assert!(rule.enabled);
        assert!(validate_rule(&rule).is_valid());
    }

    #[test]
    fn test_build_without_conditions_fails() {
        let err = RuleBuilder::from_template(oscillator_template())
            .with_id("osc-dead")
            .for_circuit("mcu-board")
            .build()
            .unwrap_err();

        match err {
            LabDiagError::InvalidRule { rule_id, errors } => {
                assert_eq!(rule_id, "osc-dead");
                assert_eq!(errors, vec!["Rule must have at least one condition"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_overrides() {
        let rule = RuleBuilder::from_template(oscillator_template())
            .with_id("r1")
            .for_circuit("c1")
            .with_name("Crystal dead")
            .with_consequence_id("k1")
            .enabled(false)
            .with_conditions([Condition::signal_present(PresenceCondition::new(
                "c1",
                "clk",
                PresenceOperator::Absent,
            ))])
            .build()
            .unwrap();
        assert_eq!(rule.name, "Crystal dead");
        assert_eq!(rule.consequence.id, "k1");
        assert!(!rule.enabled);
    }
}
