//! Parsing of expected-value tolerance specifications and observed readings.
//!
//! Whitespace is stripped before matching, so `"5V ± 5%"` and `"5V±5%"` are
//! equivalent. Forms are tried in a fixed order and the first match wins:
//!
//! | Form      | Example        | Band                          |
//! |-----------|----------------|-------------------------------|
//! | percent   | `5V ± 5%`      | nominal ± nominal × pct / 100 |
//! | absolute  | `3.3V ± 0.1V`  | nominal ± tolerance           |
//! | range     | `1.7V - 2.0V`  | [low, high], nominal midpoint |
//! | bare      | `12V`          | nominal ± 5%                  |
//!
//! The unit defaults to volts.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Unit assumed when a specification or reading carries none.
pub const DEFAULT_UNIT: &str = "V";

/// Tolerance applied to a bare nominal value.
pub const DEFAULT_TOLERANCE_PERCENT: f64 = 5.0;

static PERCENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+\.?\d*)([A-Za-z]+)?±(\d+\.?\d*)%").expect("valid regex")
});

static ABSOLUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+\.?\d*)([A-Za-z]+)?±(\d+\.?\d*)([A-Za-z]+)?").expect("valid regex")
});

static RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+\.?\d*)([A-Za-z]+)?-(\d+\.?\d*)([A-Za-z]+)?").expect("valid regex")
});

static BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)([A-Za-z]+)?").expect("valid regex"));

/// Signed, unlike the expected-value forms.
static READING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([+-]?\d+\.?\d*)([A-Za-z]+)?").expect("valid regex"));

/// A tolerance band parsed from an expected-value specification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpectedValue {
    pub nominal: f64,
    pub min_tolerance: f64,
    pub max_tolerance: f64,
    pub unit: String,
}

impl ExpectedValue {
    fn symmetric(nominal: f64, tolerance: f64, unit: String) -> Self {
        Self {
            nominal,
            min_tolerance: nominal - tolerance,
            max_tolerance: nominal + tolerance,
            unit,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min_tolerance && value <= self.max_tolerance
    }

    /// Upper half-width of the band as a percentage of nominal, or `None`
    /// when nominal is zero.
    pub fn tolerance_percent(&self) -> Option<f64> {
        if self.nominal == 0.0 {
            return None;
        }
        Some((self.max_tolerance - self.nominal) / self.nominal * 100.0)
    }

    /// `"5V ± 5.0%"`, or `"0V ± 0.1V"` when nominal is zero.
    pub fn describe(&self) -> String {
        match self.tolerance_percent() {
            Some(pct) => format!("{}{} ± {:.1}%", self.nominal, self.unit, pct),
            None => format!(
                "{}{} ± {}{}",
                self.nominal,
                self.unit,
                self.max_tolerance - self.nominal,
                self.unit
            ),
        }
    }
}

/// A parsed observed reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActualValue {
    pub value: f64,
    pub unit: String,
}

impl std::fmt::Display for ActualValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.value, self.unit)
    }
}

fn number(caps: &regex::Captures<'_>, group: usize) -> Option<f64> {
    caps.get(group)?.as_str().parse().ok()
}

fn unit(caps: &regex::Captures<'_>, groups: &[usize]) -> String {
    groups
        .iter()
        .find_map(|&g| caps.get(g))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_UNIT.to_string())
}

/// Parses an expected-value specification into a tolerance band.
///
/// Returns `None` for empty input or when no form matches.
pub fn parse_expected_value(text: &str) -> Option<ExpectedValue> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }

    if let Some(caps) = PERCENT.captures(&cleaned) {
        let nominal = number(&caps, 1)?;
        let percent = number(&caps, 3)?;
        return Some(ExpectedValue::symmetric(
            nominal,
            nominal * percent / 100.0,
            unit(&caps, &[2]),
        ));
    }

    if let Some(caps) = ABSOLUTE.captures(&cleaned) {
        let nominal = number(&caps, 1)?;
        let tolerance = number(&caps, 3)?;
        return Some(ExpectedValue::symmetric(nominal, tolerance, unit(&caps, &[2, 4])));
    }

    if let Some(caps) = RANGE.captures(&cleaned) {
        let low = number(&caps, 1)?;
        let high = number(&caps, 3)?;
        return Some(ExpectedValue {
            nominal: (low + high) / 2.0,
            min_tolerance: low,
            max_tolerance: high,
            unit: unit(&caps, &[2, 4]),
        });
    }

    let caps = BARE.captures(&cleaned)?;
    let nominal = number(&caps, 1)?;
    Some(ExpectedValue::symmetric(
        nominal,
        nominal * DEFAULT_TOLERANCE_PERCENT / 100.0,
        unit(&caps, &[2]),
    ))
}

/// Extracts the first signed number of a reading and the unit letters that
/// follow it.
pub fn parse_actual_value(text: &str) -> Option<ActualValue> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return None;
    }
    let caps = READING.captures(&cleaned)?;
    Some(ActualValue {
        value: number(&caps, 1)?,
        unit: unit(&caps, &[2]),
    })
}
