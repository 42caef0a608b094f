use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One row of a tabular dataset, keyed by column name in column order.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Which trained pipeline serves a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelChoice {
    #[default]
    #[serde(rename = "logistic")]
    LogisticRegression,
    #[serde(rename = "dt")]
    DecisionTree,
}

impl ModelChoice {
    pub const ALL: [ModelChoice; 2] = [ModelChoice::LogisticRegression, ModelChoice::DecisionTree];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LogisticRegression => "logistic",
            Self::DecisionTree => "dt",
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModelChoice(pub String);

impl fmt::Display for UnknownModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Input should be 'logistic' or 'dt', got '{}'", self.0)
    }
}

impl std::error::Error for UnknownModelChoice {}

impl FromStr for ModelChoice {
    type Err = UnknownModelChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|choice| choice.as_str() == s)
            .ok_or_else(|| UnknownModelChoice(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    High,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResponse {
    pub prediction: u8,
    /// Positive-class probability as a percentage, rounded to 2 decimals.
    pub probability: f64,
    pub risk_level: RiskLevel,
}

impl PredictionResponse {
    /// Shapes a raw pipeline output. The risk level is decided on the raw
    /// fraction, before the percentage is rounded.
    pub fn new(prediction: u8, fraction: f64) -> Self {
        let risk_level = if fraction > 0.5 {
            RiskLevel::High
        } else {
            RiskLevel::Low
        };
        Self {
            prediction,
            probability: percent(fraction),
            risk_level,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub results: Vec<Record>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Fraction in [0, 1] to a percentage rounded to 2 decimals. Rounds the
/// exact binary value of the percentage, ties to even.
pub fn percent(fraction: f64) -> f64 {
    let scaled = fraction * 100.0;
    round_cents(scaled).unwrap_or(scaled)
}

/// Percentage column of a batch result: the percentage is scaled by 100,
/// rounded ties to even and scaled back.
pub fn batch_percent(fraction: f64) -> f64 {
    (fraction * 100.0 * 100.0).round_ties_even() / 100.0
}

fn round_cents(value: f64) -> Option<f64> {
    if !value.is_finite() || value.abs() >= 1e15 {
        return None;
    }
    // 60 places separate any f64 below 1e15 from the nearest half-cent
    // unless it sits exactly on it
    let text = format!("{:.60}", value.abs());
    let (whole, fraction) = text.split_once('.')?;
    let (cents, rest) = fraction.split_at(2);

    let mut cents = whole.parse::<u64>().ok()? * 100 + cents.parse::<u64>().ok()?;
    let (first, tail) = rest.split_at(1);
    let above_half = tail.bytes().any(|b| b != b'0');
    match first {
        "5" if above_half || cents % 2 == 1 => cents += 1,
        "6" | "7" | "8" | "9" => cents += 1,
        _ => {}
    }

    let rounded = cents as f64 / 100.0;
    Some(if value < 0.0 { -rounded } else { rounded })
}
