//! Promote library templates into rules and evaluate them against a circuit.

use labdiag::library::{find_rule_template, template_groups};
use labdiag::model::{
    Circuit, Component, Net, NumericCondition, NumericOperator, PresenceCondition,
    PresenceOperator,
};
use labdiag::prelude::*;
use labdiag::RuleBuilder;

fn main() -> Result<(), LabDiagError> {
    for group in template_groups() {
        println!("{} ({} templates)", group.group, group.templates.len());
    }
    println!();

    let circuit = Circuit::new("psu-1", "5V Linear Supply")
        .with_net(Net::new("vout", "VOUT").with_voltage(3.9))
        .with_component(Component::new("u1", "U1", "Regulator").with_value("LM7805"))
        .with_component(Component::new("c2", "C2", "Capacitor").with_value("10μF").disconnected());

    let rail = find_rule_template("Rail Voltage Below Minimum")
        .ok_or_else(|| LabDiagError::Other("template missing".to_string()))?;
    let decoupling = find_rule_template("Decoupling Capacitor Missing")
        .ok_or_else(|| LabDiagError::Other("template missing".to_string()))?;

    let rules = vec![
        RuleBuilder::from_template(rail)
            .with_id("vout-low")
            .for_circuit(&circuit.id)
            .with_condition(Condition::net_voltage(
                NumericCondition::new("vout-lt", "vout", NumericOperator::Lt)
                    .threshold(4.75)
                    .describe("VOUT below 4.75V"),
            ))
            .affecting_net("vout")
            .affecting_component("u1")
            .build()?,
        RuleBuilder::from_template(decoupling)
            .with_id("c2-missing")
            .for_circuit(&circuit.id)
            .with_condition(Condition::component_state(
                PresenceCondition::new("c2-absent", "c2", PresenceOperator::Absent)
                    .describe("Output capacitor C2 not fitted"),
            ))
            .affecting_component("c2")
            .build()?,
    ];

    let context = EvaluationContext::from_circuit(&circuit, &[]);
    let evaluator = RuleEvaluator::new();
    let evaluation = evaluator.evaluate_all_rules(&rules, &context);

    for rule in &evaluation.triggered_rules {
        println!("{}", evaluator.explain_rule_trigger(rule, &context));
        println!();
    }
    Ok(())
}
