//! Measurement Narratives
//!
//! Turns an expected-versus-observed measurement into a decision
//! (pass, warning, fail) and a readable account of it, attributing a
//! probable cause to a triggered rule when one applies.

pub mod actions;
pub mod generator;
pub mod tolerance;

pub use generator::{
    classify, generate_consequence_narrative, generate_measurement_narrative,
    generate_workflow_narratives, Decision, NarrativeContext, TechnicalNarrative,
};
pub use tolerance::{parse_actual_value, parse_expected_value, ActualValue, ExpectedValue};
