use serde::Deserialize;

use crate::error::MatchError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct MatchConfig {
    pub name: String,
    pub sources: SourcesConfig,
    #[serde(default)]
    pub weights: Weights,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct SourcesConfig {
    pub orders: OrderSource,
    pub reservations: ReservationSource,
}

// ---------------------------------------------------------------------------
// Sources + column mappings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OrderSource {
    pub file: String,
    pub columns: OrderColumns,
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderColumns {
    pub id: String,
    pub customer: String,
    pub date: String,
    pub time: String,
    pub amount: String,
    pub channel: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReservationSource {
    pub file: String,
    pub columns: ReservationColumns,
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReservationColumns {
    pub id: String,
    pub customer: String,
    pub date: String,
    pub time: String,
    pub party_size: String,
    pub status: String,
}

fn default_date_formats() -> Vec<String> {
    vec![
        "%Y-%m-%d".into(),
        "%Y/%m/%d".into(),
        "%d/%m/%Y".into(),
        "%Y年%m月%d日".into(),
    ]
}

// ---------------------------------------------------------------------------
// Weights + matching knobs
// ---------------------------------------------------------------------------

/// Score component weights. Normalized before use; relative values are
/// what matters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Weights {
    #[serde(default = "default_w_name")]
    pub name: f64,
    #[serde(default = "default_w_date")]
    pub date: f64,
    #[serde(default = "default_w_time")]
    pub time: f64,
    #[serde(default = "default_w_amount")]
    pub amount: f64,
}

fn default_w_name() -> f64 {
    0.5
}
fn default_w_date() -> f64 {
    0.25
}
fn default_w_time() -> f64 {
    0.15
}
fn default_w_amount() -> f64 {
    0.10
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            name: default_w_name(),
            date: default_w_date(),
            time: default_w_time(),
            amount: default_w_amount(),
        }
    }
}

impl Weights {
    pub fn total(&self) -> f64 {
        self.name + self.date + self.time + self.amount
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MatchingConfig {
    /// Candidates scoring below this are incompatible.
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    /// Two candidates within epsilon of each other are a tie.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    /// Reservations within this many days of the order date are candidates.
    #[serde(default = "default_date_window")]
    pub date_window_days: u32,
    #[serde(default)]
    pub fail_on_ambiguous: bool,
}

fn default_min_score() -> f64 {
    0.60
}
fn default_epsilon() -> f64 {
    0.05
}
fn default_date_window() -> u32 {
    1
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            epsilon: default_epsilon(),
            date_window_days: default_date_window(),
            fail_on_ambiguous: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub json: Option<String>,
    #[serde(default)]
    pub report: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MatchConfig {
    pub fn from_toml(input: &str) -> Result<Self, MatchError> {
        let config: MatchConfig =
            toml::from_str(input).map_err(|e| MatchError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        let w = &self.weights;
        for (label, value) in [
            ("name", w.name),
            ("date", w.date),
            ("time", w.time),
            ("amount", w.amount),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(MatchError::ConfigValidation(format!(
                    "weight '{label}' must be non-negative, got {value}"
                )));
            }
        }
        if w.total() <= 0.0 {
            return Err(MatchError::ConfigValidation(
                "at least one weight must be positive".into(),
            ));
        }

        let m = &self.matching;
        if !(0.0..=1.0).contains(&m.min_score) {
            return Err(MatchError::ConfigValidation(format!(
                "min_score must be in [0,1], got {}",
                m.min_score
            )));
        }
        if !(0.0..=1.0).contains(&m.epsilon) {
            return Err(MatchError::ConfigValidation(format!(
                "epsilon must be in [0,1], got {}",
                m.epsilon
            )));
        }

        if self.sources.orders.date_formats.is_empty()
            || self.sources.reservations.date_formats.is_empty()
        {
            return Err(MatchError::ConfigValidation(
                "date_formats must not be empty".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
name = "Nightly Match"

[sources.orders]
file = "orders.csv"

[sources.orders.columns]
id       = "order_id"
customer = "customer"
date     = "order_date"
time     = "slot"
amount   = "amount"
channel  = "channel"

[sources.reservations]
file = "reservations.csv"

[sources.reservations.columns]
id         = "res_id"
customer   = "guest"
date       = "res_date"
time       = "slot"
party_size = "party"
status     = "status"
"#;

    #[test]
    fn parse_valid_with_defaults() {
        let config = MatchConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "Nightly Match");
        assert_eq!(config.sources.orders.file, "orders.csv");
        assert_eq!(config.weights.name, 0.5);
        assert_eq!(config.matching.min_score, 0.60);
        assert_eq!(config.matching.epsilon, 0.05);
        assert_eq!(config.matching.date_window_days, 1);
        assert!(!config.matching.fail_on_ambiguous);
        assert!(!config.sources.orders.date_formats.is_empty());
    }

    #[test]
    fn parse_overridden_knobs() {
        let input = format!(
            r#"{VALID}
[weights]
name = 0.7
date = 0.3
time = 0.0
amount = 0.0

[matching]
min_score = 0.8
epsilon = 0.02
date_window_days = 3
fail_on_ambiguous = true
"#
        );
        let config = MatchConfig::from_toml(&input).unwrap();
        assert_eq!(config.weights.name, 0.7);
        assert_eq!(config.weights.time, 0.0);
        assert_eq!(config.matching.min_score, 0.8);
        assert_eq!(config.matching.date_window_days, 3);
        assert!(config.matching.fail_on_ambiguous);
    }

    #[test]
    fn reject_negative_weight() {
        let input = format!(
            r#"{VALID}
[weights]
name = -0.1
"#
        );
        let err = MatchConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn reject_all_zero_weights() {
        let input = format!(
            r#"{VALID}
[weights]
name = 0.0
date = 0.0
time = 0.0
amount = 0.0
"#
        );
        let err = MatchConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("at least one weight"));
    }

    #[test]
    fn reject_min_score_out_of_range() {
        let input = format!(
            r#"{VALID}
[matching]
min_score = 1.5
"#
        );
        let err = MatchConfig::from_toml(&input).unwrap_err();
        assert!(err.to_string().contains("min_score"));
    }

    #[test]
    fn reject_missing_source() {
        let input = r#"
name = "Bad"

[sources.orders]
file = "orders.csv"
[sources.orders.columns]
id = "a"
customer = "b"
date = "c"
time = "d"
amount = "e"
channel = "f"
"#;
        let err = MatchConfig::from_toml(input).unwrap_err();
        assert!(matches!(err, MatchError::ConfigParse(_)));
    }
}
