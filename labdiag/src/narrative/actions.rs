//! Recommended-action tables.
//!
//! Measurement narratives and consequence narratives keep separate tables:
//! the first is phrased for a bench operator holding a probe, the second for
//! someone triaging a predicted failure.

use crate::model::ConsequenceType;

/// Actions when a measurement is explained by a triggered rule.
pub fn measurement_actions(kind: ConsequenceType) -> &'static [&'static str] {
    match kind {
        ConsequenceType::RailDrop => &[
            "Check for component saturation or excessive load",
            "Verify power supply current capability",
            "Inspect voltage regulator if present",
        ],
        ConsequenceType::NoOutput => &[
            "Verify component connections",
            "Check for reverse polarity",
            "Measure intermediate nodes to isolate fault",
        ],
        ConsequenceType::Heating => &[
            "Reduce supply voltage or current",
            "Check component power ratings",
            "Improve thermal management",
        ],
        ConsequenceType::SignalLoss => &[
            "Check signal path for opens or shorts",
            "Verify AC coupling capacitors",
            "Inspect bias network",
        ],
        ConsequenceType::OscillationStop => &[
            "Verify oscillator components (crystal, caps)",
            "Check load capacitance matches crystal spec",
            "Ensure adequate power supply decoupling",
        ],
        ConsequenceType::FunctionalFailure => &[
            "Perform systematic troubleshooting",
            "Check component values and connections",
            "Consult circuit documentation",
        ],
    }
}

/// Actions for a reading below its tolerance band with no rule to blame.
pub const UNDER_VOLTAGE_ACTIONS: &[&str] = &[
    "Check for shorts or excessive current draw",
    "Verify power supply output",
    "Inspect all components in power path",
];

/// Actions for a reading above its tolerance band with no rule to blame.
pub const OVER_VOLTAGE_ACTIONS: &[&str] = &[
    "Check for open connections",
    "Verify load components are present and connected",
    "Inspect voltage divider or regulator circuit",
];

pub const PASS_ACTIONS: &[&str] = &["Continue with next measurement step"];

/// Actions attached to a consequence narrative.
pub fn consequence_actions(kind: ConsequenceType) -> &'static [&'static str] {
    match kind {
        ConsequenceType::RailDrop => &[
            "Measure current consumption to identify saturated component",
            "Check voltage regulator output capability",
            "Verify power supply specifications",
        ],
        ConsequenceType::OscillationStop => &[
            "Verify crystal load capacitors are present and correct value",
            "Check oscillator enable signals",
            "Measure DC bias at oscillator pins",
        ],
        ConsequenceType::NoOutput => &[
            "Verify input signals are present",
            "Check power supply voltages",
            "Measure intermediate signals to isolate failure point",
        ],
        ConsequenceType::Heating => &[
            "Measure component temperature",
            "Check component power dissipation vs rating",
            "Improve cooling or reduce power",
        ],
        ConsequenceType::SignalLoss => &[
            "Check signal path for opens",
            "Verify coupling capacitors",
            "Measure DC bias points",
        ],
        ConsequenceType::FunctionalFailure => &[
            "Perform systematic troubleshooting",
            "Measure all relevant test points",
            "Consult circuit schematic and documentation",
        ],
    }
}

pub(crate) fn to_owned(actions: &[&str]) -> Vec<String> {
    actions.iter().map(|a| a.to_string()).collect()
}
