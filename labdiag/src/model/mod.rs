//! Data model shared by the rule engine and the narrative generator.

pub mod circuit;
pub mod measurement;
pub mod rule;

pub use circuit::{Circuit, Component, Net, Position, TestPoint};
pub use measurement::{
    MeasurementSource, MeasurementStatus, MeasurementStep, MeasurementWorkflow, WorkflowStatus,
};
pub use rule::{
    CircuitRule, Condition, Consequence, ConsequenceType, NumericCondition, NumericOperator,
    PresenceCondition, PresenceOperator, RuleCategory, Severity, ValueRange,
};
