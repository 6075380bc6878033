//! Rule engine behaviour over hand-built contexts

use labdiag::engine::{
    check_condition, evaluate_all_rules, evaluate_condition, evaluate_rule, is_valid_condition,
    validate_rule, DiagnosticEvent, EvaluationContext, EvaluationSettings, RecordingObserver,
    RuleEvaluator, Unsatisfied,
};
use labdiag::model::{
    Component, Condition, Consequence, ConsequenceType, MeasurementStep, Net, NumericCondition,
    NumericOperator, PresenceCondition, PresenceOperator, RuleCategory, Severity,
};
use labdiag::CircuitRule;
use std::sync::Arc;

fn vcc_below(threshold: f64) -> Condition {
    Condition::net_voltage(
        NumericCondition::new("vcc-cond", "vcc", NumericOperator::Lt)
            .threshold(threshold)
            .describe(format!("VCC voltage below {}V", threshold)),
    )
}

fn rule_with(id: &str, conditions: Vec<Condition>) -> CircuitRule {
    CircuitRule {
        id: id.to_string(),
        name: "VCC below 2V".to_string(),
        circuit_id: "bench".to_string(),
        conditions,
        consequence: Consequence {
            id: format!("{}-consequence", id),
            kind: ConsequenceType::NoOutput,
            severity: Severity::Critical,
            affected_net_ids: vec!["vcc".to_string()],
            affected_component_ids: vec![],
            description: "Circuit will not function".to_string(),
            explanation: "Insufficient supply voltage".to_string(),
        },
        enabled: true,
        category: RuleCategory::Power,
    }
}

fn nets_with_vcc(voltage: Option<f64>) -> Vec<Net> {
    let net = Net::new("vcc", "VCC");
    vec![match voltage {
        Some(v) => net.with_voltage(v),
        None => net,
    }]
}

fn invalid_conditions() -> Vec<Condition> {
    vec![
        Condition::Unsupported,
        Condition::NetCurrent(NumericCondition::new("c", "vcc", NumericOperator::Gt).threshold(0.0)),
        Condition::net_voltage(NumericCondition::new("", "vcc", NumericOperator::Gt).threshold(0.0)),
        Condition::net_voltage(NumericCondition::new("c", "", NumericOperator::Gt).threshold(0.0)),
        Condition::net_voltage(NumericCondition::new("c", "vcc", NumericOperator::Gt)),
        Condition::net_voltage(NumericCondition::new("c", "vcc", NumericOperator::Between)),
        Condition::net_voltage(
            NumericCondition::new("c", "vcc", NumericOperator::Between).range(10.0, -10.0),
        ),
        Condition::component_state(PresenceCondition::new("c", "", PresenceOperator::Absent)),
    ]
}

#[test]
fn test_end_to_end_vcc_below_two_volts() {
    let rule = rule_with("vcc-low", vec![vcc_below(2.0)]);

    let low = nets_with_vcc(Some(1.8));
    let result = evaluate_all_rules(
        std::slice::from_ref(&rule),
        &EvaluationContext::new(&low, &[], &[]),
    );
    assert_eq!(result.triggered_rules, vec![rule.clone()]);
    assert_eq!(result.consequences[0].severity, Severity::Critical);
    assert_eq!(result.consequences[0].kind, ConsequenceType::NoOutput);

    let healthy = nets_with_vcc(Some(2.5));
    let result = evaluate_all_rules(
        std::slice::from_ref(&rule),
        &EvaluationContext::new(&healthy, &[], &[]),
    );
    assert!(result.triggered_rules.is_empty());

    let unmeasured = nets_with_vcc(None);
    let context = EvaluationContext::new(&unmeasured, &[], &[]);
    let result = evaluate_all_rules(std::slice::from_ref(&rule), &context);
    assert!(result.triggered_rules.is_empty());
    assert_eq!(
        RuleEvaluator::new().assess_condition(&rule.conditions[0], &context),
        Err(Unsatisfied::Unmeasured)
    );
}

#[test]
fn test_invalid_conditions_never_evaluate_true() {
    // Every target resolves and every value is extreme, so only validity
    // could keep these from firing.
    let nets = nets_with_vcc(Some(1.0));
    let components = vec![Component::new("r1", "R1", "Resistor").disconnected()];
    let context = EvaluationContext::new(&nets, &components, &[]);

    for condition in invalid_conditions() {
        assert!(!is_valid_condition(&condition), "{:?}", condition);
        assert!(!evaluate_condition(&condition, &context), "{:?}", condition);
        assert!(matches!(
            RuleEvaluator::new().assess_condition(&condition, &context),
            Err(Unsatisfied::Structural(_))
        ));
    }
}

#[test]
fn test_unsafe_samples_are_false() {
    let components: Vec<Component> = vec![];
    let evaluator = RuleEvaluator::new();
    let always = |op| {
        Condition::net_voltage(NumericCondition::new("c", "vcc", op).threshold(0.0))
    };

    for sample in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 1e6, -1e6, 5e9] {
        let nets = nets_with_vcc(Some(sample));
        let context = EvaluationContext::new(&nets, &components, &[]);
        for op in [
            NumericOperator::Gt,
            NumericOperator::Lt,
            NumericOperator::Ne,
            NumericOperator::Ge,
            NumericOperator::Le,
        ] {
            assert!(!evaluator.evaluate_condition(&always(op), &context), "{} {}", sample, op);
        }
    }

    let readings = vec![MeasurementStep::new("m1", "Overrange").observed("2e6V")];
    let context = EvaluationContext::new(&[], &components, &readings);
    let reading = Condition::measurement(
        NumericCondition::new("c", "m1", NumericOperator::Gt).threshold(0.0),
    );
    assert_eq!(
        evaluator.assess_condition(&reading, &context),
        Err(Unsatisfied::UnsafeValue(2e6))
    );
}

#[test]
fn test_disabled_or_empty_rules_never_fire() {
    let nets = nets_with_vcc(Some(1.0));
    let context = EvaluationContext::new(&nets, &[], &[]);

    let mut disabled = rule_with("disabled", vec![vcc_below(2.0)]);
    disabled.enabled = false;
    assert!(!evaluate_rule(&disabled, &context));

    let empty = rule_with("empty", vec![]);
    assert!(!evaluate_rule(&empty, &context));
}

#[test]
fn test_rule_requires_all_conditions() {
    let nets = nets_with_vcc(Some(1.0));
    let context = EvaluationContext::new(&nets, &[], &[]);

    let all_true = rule_with("t", vec![vcc_below(2.0), vcc_below(3.0), vcc_below(4.0)]);
    assert!(evaluate_rule(&all_true, &context));

    let last_false = rule_with("f", vec![vcc_below(2.0), vcc_below(3.0), vcc_below(0.5)]);
    assert!(!evaluate_rule(&last_false, &context));
}

#[test]
fn test_rule_set_excludes_invalid_rules() {
    let nets = nets_with_vcc(Some(1.0));
    let context = EvaluationContext::new(&nets, &[], &[]);
    let observer = Arc::new(RecordingObserver::new());
    let evaluator = RuleEvaluator::new().with_observer(observer.clone());

    let mut invalid = rule_with("invalid", vec![Condition::Unsupported]);
    invalid.name = String::new();
    let valid = rule_with("valid", vec![vcc_below(2.0)]);

    let result = evaluator.evaluate_all_rules(&[invalid, valid.clone()], &context);
    assert_eq!(result.consequences, vec![valid.consequence.clone()]);
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].index, 0);
    assert_eq!(
        result.skipped[0].errors,
        vec![
            "Rule must have a valid name".to_string(),
            "Condition 0 is invalid or has incompatible operator (unknown condition type)".to_string(),
        ]
    );

    let events = observer.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        DiagnosticEvent::RuleSkipped { rule_id: Some(id), .. } if id == "invalid"
    ));

    let empty = evaluator.evaluate_all_rules(&[], &context);
    assert!(empty.is_empty());
    assert!(empty.skipped.is_empty());
}

#[test]
fn test_rule_set_evaluation_is_deterministic() {
    let nets = nets_with_vcc(Some(1.0));
    let measurements = vec![MeasurementStep::new("m1", "Out").on_net("out").observed("0.4V")];
    let context = EvaluationContext::new(&nets, &[], &measurements);
    let rules = vec![
        rule_with("a", vec![vcc_below(2.0)]),
        rule_with("b", vec![vcc_below(0.5)]),
        rule_with(
            "c",
            vec![Condition::measurement(
                NumericCondition::new("m", "out", NumericOperator::Between).range(0.0, 0.5),
            )],
        ),
    ];

    let first = evaluate_all_rules(&rules, &context);
    let second = evaluate_all_rules(&rules, &context);
    assert_eq!(first, second);
    let ids: Vec<&str> = first.triggered_rules.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);
}

#[test]
fn test_equality_uses_tolerance() {
    let eq = |target| {
        Condition::net_voltage(
            NumericCondition::new("c", "vcc", NumericOperator::Eq).threshold(target),
        )
    };

    let nets = nets_with_vcc(Some(5.005));
    assert!(evaluate_condition(&eq(5.0), &EvaluationContext::new(&nets, &[], &[])));

    let nets = nets_with_vcc(Some(5.02));
    assert!(!evaluate_condition(&eq(5.0), &EvaluationContext::new(&nets, &[], &[])));

    let loose = RuleEvaluator::new().with_settings(EvaluationSettings::default().with_tolerance(0.05));
    assert!(loose.evaluate_condition(&eq(5.0), &EvaluationContext::new(&nets, &[], &[])));
}

#[test]
fn test_validate_rule_messages() {
    let mut rule = rule_with("r", vec![vcc_below(2.0)]);
    assert!(validate_rule(&rule).is_valid());

    rule.circuit_id = String::new();
    rule.consequence.id = String::new();
    assert_eq!(
        validate_rule(&rule).messages(),
        vec![
            "Rule must have a valid circuitId".to_string(),
            "Consequence must have id, type, and severity".to_string(),
        ]
    );
    assert!(check_condition(&rule.conditions[0]).is_ok());
}

#[test]
fn test_conditions_from_json() {
    let json = r#"[
        {"id":"a","type":"net_voltage","targetId":"vcc","operator":"<=","value":1.0},
        {"id":"b","type":"component_state","targetId":"r1","operator":"absent"},
        {"id":"c","type":"signal_present","targetId":"vcc","operator":"present"}
    ]"#;
    let conditions: Vec<Condition> = serde_json::from_str(json).unwrap();

    let nets = nets_with_vcc(Some(1.0));
    let components = vec![Component::new("r1", "R1", "Resistor").disconnected()];
    let measurements = vec![MeasurementStep::new("m1", "VCC").on_net("vcc").observed("1.0V")];
    let context = EvaluationContext::new(&nets, &components, &measurements);

    assert!(conditions.iter().all(|c| evaluate_condition(c, &context)));
}

#[test]
fn test_component_without_connection_state_never_fires() {
    let components: Vec<Component> =
        serde_json::from_str(r#"[{"id":"q1","name":"Q1","type":"Transistor"}]"#).unwrap();
    assert_eq!(components[0].connected, None);
    let context = EvaluationContext::new(&[], &components, &[]);
    let evaluator = RuleEvaluator::new();

    for operator in [PresenceOperator::Present, PresenceOperator::Absent] {
        let condition = Condition::ComponentState(PresenceCondition::new("c", "q1", operator));
        assert!(!evaluate_condition(&condition, &context));
        assert_eq!(
            evaluator.assess_condition(&condition, &context),
            Err(Unsatisfied::Unmeasured)
        );
    }
}
