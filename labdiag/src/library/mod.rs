//! Rule Template Library
//!
//! Pre-authored rule templates grouped by subsystem. A template carries a
//! name, a category and a consequence but no conditions: it becomes an
//! evaluable [`CircuitRule`](crate::model::CircuitRule) only once a
//! [`RuleBuilder`] attaches circuit-specific conditions to it.
//!
//! The templates are compiled into the binary from `rules/*.json`.

pub mod builder;

pub use builder::RuleBuilder;

use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::model::{ConsequenceType, RuleCategory, Severity};

const EMBEDDED_POWER: &str = include_str!("../../rules/power.json");
const EMBEDDED_SIGNAL: &str = include_str!("../../rules/signal.json");
const EMBEDDED_TIMING: &str = include_str!("../../rules/timing.json");
const EMBEDDED_COMPONENT: &str = include_str!("../../rules/component.json");
const EMBEDDED_FILTERING: &str = include_str!("../../rules/filtering.json");
const EMBEDDED_THERMAL: &str = include_str!("../../rules/thermal.json");
const EMBEDDED_DIGITAL: &str = include_str!("../../rules/digital.json");
const EMBEDDED_PROTECTION: &str = include_str!("../../rules/protection.json");

/// Consequence half of a template; ids and affected items come later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsequenceTemplate {
    #[serde(rename = "type")]
    pub kind: ConsequenceType,
    pub severity: Severity,
    pub description: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTemplate {
    pub name: String,
    pub category: RuleCategory,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub consequence: ConsequenceTemplate,
}

fn default_true() -> bool {
    true
}

/// A named group of templates, one per embedded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateGroup {
    pub group: String,
    pub templates: Vec<RuleTemplate>,
}

static GROUPS: LazyLock<Vec<TemplateGroup>> = LazyLock::new(|| {
    let embedded = [
        EMBEDDED_POWER,
        EMBEDDED_SIGNAL,
        EMBEDDED_TIMING,
        EMBEDDED_COMPONENT,
        EMBEDDED_FILTERING,
        EMBEDDED_THERMAL,
        EMBEDDED_DIGITAL,
        EMBEDDED_PROTECTION,
    ];

    let mut groups = Vec::new();
    for json_str in embedded {
        match serde_json::from_str::<TemplateGroup>(json_str) {
            Ok(group) => groups.push(group),
            Err(e) => {
                tracing::warn!("Failed to parse embedded rule templates: {}", e);
            }
        }
    }
    groups
});

/// All template groups, in library order.
pub fn template_groups() -> &'static [TemplateGroup] {
    &GROUPS
}

/// Every template in library order.
pub fn all_rule_templates() -> Vec<&'static RuleTemplate> {
    GROUPS.iter().flat_map(|g| g.templates.iter()).collect()
}

pub fn rule_templates_by_category(category: RuleCategory) -> Vec<&'static RuleTemplate> {
    GROUPS
        .iter()
        .flat_map(|g| g.templates.iter())
        .filter(|t| t.category == category)
        .collect()
}

pub fn rule_template_count() -> usize {
    GROUPS.iter().map(|g| g.templates.len()).sum()
}

/// Looks a template up by name, ignoring case.
pub fn find_rule_template(name: &str) -> Option<&'static RuleTemplate> {
    let name = name.trim();
    GROUPS
        .iter()
        .flat_map(|g| g.templates.iter())
        .find(|t| t.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_embedded_groups_parse() {
        let names: Vec<&str> = template_groups().iter().map(|g| g.group.as_str()).collect();
        assert_eq!(
            names,
            vec!["power", "signal", "timing", "component", "filtering", "thermal", "digital", "protection"]
        );
        assert_eq!(rule_template_count(), 41);
        assert_eq!(all_rule_templates().len(), rule_template_count());
    }

    #[test]
    fn test_templates_are_complete() {
        for template in all_rule_templates() {
            assert!(!template.name.is_empty());
            assert!(!template.consequence.description.is_empty(), "{}", template.name);
            assert!(!template.consequence.explanation.is_empty(), "{}", template.name);
        }
    }

    #[test]
    fn test_by_category() {
        let power = rule_templates_by_category(RuleCategory::Power);
        assert!(!power.is_empty());
        assert!(power.iter().all(|t| t.category == RuleCategory::Power));

        let total: usize = RuleCategory::ALL
            .iter()
            .map(|c| rule_templates_by_category(*c).len())
            .sum();
        assert_eq!(total, rule_template_count());
    }

    #[test]
    fn test_find_by_name() {
        let template = find_rule_template("rail voltage below minimum").unwrap();
        assert_eq!(template.consequence.kind, ConsequenceType::RailDrop);
        assert_eq!(template.consequence.severity, Severity::Critical);
        assert!(find_rule_template("Flux Capacitor Overload").is_none());
    }
}
