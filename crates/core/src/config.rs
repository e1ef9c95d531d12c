use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LinkPulseError, LinkPulseResult};

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `LINKPULSE__`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_max_concurrency() -> usize {
    8
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

// ─── Scoring Config ─────────────────────────────────────────────────────

/// Weights and half-lives driving the hotness score. Immutable once handed
/// to an engine; call [`ScoringConfig::validate`] before use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub click_weights: ClickWeights,
    #[serde(default)]
    pub streak_weights: StreakWeights,
    #[serde(default)]
    pub conversion_weights: ConversionWeights,
    #[serde(default)]
    pub decay_rates: DecayRates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClickWeights {
    #[serde(default = "default_click_per_unit")]
    pub click_per_unit: f64,
    /// Clicks beyond this count on a single UTC day are ignored.
    #[serde(default = "default_daily_click_cap")]
    pub daily_click_cap: u32,
    #[serde(default = "default_velocity_burst_bonus")]
    pub velocity_burst_bonus: f64,
    #[serde(default = "default_rapid_fire_bonus")]
    pub rapid_fire_bonus: f64,
    #[serde(default = "default_marathon_session_bonus")]
    pub marathon_session_bonus: f64,
}

fn default_click_per_unit() -> f64 { 4.0 }
fn default_daily_click_cap() -> u32 { 3 }
fn default_velocity_burst_bonus() -> f64 { 5.0 }
fn default_rapid_fire_bonus() -> f64 { 8.0 }
fn default_marathon_session_bonus() -> f64 { 12.0 }

impl Default for ClickWeights {
    fn default() -> Self {
        Self {
            click_per_unit: default_click_per_unit(),
            daily_click_cap: default_daily_click_cap(),
            velocity_burst_bonus: default_velocity_burst_bonus(),
            rapid_fire_bonus: default_rapid_fire_bonus(),
            marathon_session_bonus: default_marathon_session_bonus(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakWeights {
    #[serde(default = "default_streak_3_days_bonus")]
    pub streak_3_days_bonus: f64,
    #[serde(default = "default_streak_5_days_bonus")]
    pub streak_5_days_bonus: f64,
    #[serde(default = "default_streak_7_days_bonus")]
    pub streak_7_days_bonus: f64,
    #[serde(default = "default_flex_streak_active_per_day")]
    pub flex_streak_active_per_day: f64,
    #[serde(default = "default_flex_streak_length_per_day")]
    pub flex_streak_length_per_day: f64,
    #[serde(default = "default_flex_streak_gap_penalty")]
    pub flex_streak_gap_penalty: f64,
    #[serde(default = "default_flex_streak_alt_pattern_bonus")]
    pub flex_streak_alt_pattern_bonus: f64,
    /// Upper clamp for the flexible-window contribution.
    #[serde(default = "default_flex_streak_max_bonus")]
    pub flex_streak_max_bonus: f64,
    #[serde(default = "default_consistency_bonus")]
    pub consistency_bonus: f64,
}

fn default_streak_3_days_bonus() -> f64 { 8.0 }
fn default_streak_5_days_bonus() -> f64 { 15.0 }
fn default_streak_7_days_bonus() -> f64 { 25.0 }
fn default_flex_streak_active_per_day() -> f64 { 3.0 }
fn default_flex_streak_length_per_day() -> f64 { 1.0 }
fn default_flex_streak_gap_penalty() -> f64 { 1.0 }
fn default_flex_streak_alt_pattern_bonus() -> f64 { 4.0 }
fn default_flex_streak_max_bonus() -> f64 { 28.0 }
fn default_consistency_bonus() -> f64 { 10.0 }

impl Default for StreakWeights {
    fn default() -> Self {
        Self {
            streak_3_days_bonus: default_streak_3_days_bonus(),
            streak_5_days_bonus: default_streak_5_days_bonus(),
            streak_7_days_bonus: default_streak_7_days_bonus(),
            flex_streak_active_per_day: default_flex_streak_active_per_day(),
            flex_streak_length_per_day: default_flex_streak_length_per_day(),
            flex_streak_gap_penalty: default_flex_streak_gap_penalty(),
            flex_streak_alt_pattern_bonus: default_flex_streak_alt_pattern_bonus(),
            flex_streak_max_bonus: default_flex_streak_max_bonus(),
            consistency_bonus: default_consistency_bonus(),
        }
    }
}

/// How the fast lead-to-sale bonus accumulates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadToSalePolicy {
    /// Every (lead, sale) pair within the conversion window earns the bonus.
    #[default]
    PerPair,
    /// Each sale earns the bonus at most once, however many leads precede it.
    PerSale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionWeights {
    #[serde(default = "default_lead_weight")]
    pub lead: f64,
    #[serde(default = "default_sale_weight")]
    pub sale: f64,
    #[serde(default = "default_lead_proximity_bonus")]
    pub lead_proximity_bonus: f64,
    #[serde(default = "default_sale_recency_bonus")]
    pub sale_recency_bonus: f64,
    #[serde(default)]
    pub lead_to_sale_policy: LeadToSalePolicy,
}

fn default_lead_weight() -> f64 { 12.0 }
fn default_sale_weight() -> f64 { 12.0 }
fn default_lead_proximity_bonus() -> f64 { 8.0 }
fn default_sale_recency_bonus() -> f64 { 6.0 }

impl Default for ConversionWeights {
    fn default() -> Self {
        Self {
            lead: default_lead_weight(),
            sale: default_sale_weight(),
            lead_proximity_bonus: default_lead_proximity_bonus(),
            sale_recency_bonus: default_sale_recency_bonus(),
            lead_to_sale_policy: LeadToSalePolicy::default(),
        }
    }
}

/// Half-lives in days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecayRates {
    #[serde(default = "default_click_decay_days")]
    pub click_decay_days: f64,
    #[serde(default = "default_lead_decay_days")]
    pub lead_decay_days: f64,
    #[serde(default = "default_sale_decay_days")]
    pub sale_decay_days: f64,
}

fn default_click_decay_days() -> f64 { 10.0 }
fn default_lead_decay_days() -> f64 { 21.0 }
fn default_sale_decay_days() -> f64 { 45.0 }

impl Default for DecayRates {
    fn default() -> Self {
        Self {
            click_decay_days: default_click_decay_days(),
            lead_decay_days: default_lead_decay_days(),
            sale_decay_days: default_sale_decay_days(),
        }
    }
}

impl ScoringConfig {
    /// Reject non-finite or negative weights and non-positive half-lives.
    pub fn validate(&self) -> LinkPulseResult<()> {
        let c = &self.click_weights;
        let s = &self.streak_weights;
        let v = &self.conversion_weights;
        let weights = [
            ("click_weights.click_per_unit", c.click_per_unit),
            ("click_weights.velocity_burst_bonus", c.velocity_burst_bonus),
            ("click_weights.rapid_fire_bonus", c.rapid_fire_bonus),
            ("click_weights.marathon_session_bonus", c.marathon_session_bonus),
            ("streak_weights.streak_3_days_bonus", s.streak_3_days_bonus),
            ("streak_weights.streak_5_days_bonus", s.streak_5_days_bonus),
            ("streak_weights.streak_7_days_bonus", s.streak_7_days_bonus),
            ("streak_weights.flex_streak_active_per_day", s.flex_streak_active_per_day),
            ("streak_weights.flex_streak_length_per_day", s.flex_streak_length_per_day),
            ("streak_weights.flex_streak_gap_penalty", s.flex_streak_gap_penalty),
            ("streak_weights.flex_streak_alt_pattern_bonus", s.flex_streak_alt_pattern_bonus),
            ("streak_weights.flex_streak_max_bonus", s.flex_streak_max_bonus),
            ("streak_weights.consistency_bonus", s.consistency_bonus),
            ("conversion_weights.lead", v.lead),
            ("conversion_weights.sale", v.sale),
            ("conversion_weights.lead_proximity_bonus", v.lead_proximity_bonus),
            ("conversion_weights.sale_recency_bonus", v.sale_recency_bonus),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(LinkPulseError::Config(format!(
                    "{name} must be a finite, non-negative number (got {value})"
                )));
            }
        }

        let d = &self.decay_rates;
        let half_lives = [
            ("decay_rates.click_decay_days", d.click_decay_days),
            ("decay_rates.lead_decay_days", d.lead_decay_days),
            ("decay_rates.sale_decay_days", d.sale_decay_days),
        ];
        for (name, value) in half_lives {
            if !value.is_finite() || value <= 0.0 {
                return Err(LinkPulseError::Config(format!(
                    "{name} must be a finite half-life greater than zero (got {value})"
                )));
            }
        }

        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from an optional TOML file, then environment
    /// variables (`LINKPULSE__SCORING__DECAY_RATES__CLICK_DECAY_DAYS=7`).
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let builder = builder.add_source(
            config::Environment::with_prefix("LINKPULSE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScoringConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.click_weights.daily_click_cap, 3);
        assert!((config.streak_weights.flex_streak_max_bonus - 28.0).abs() < f64::EPSILON);
        assert!((config.decay_rates.sale_decay_days - 45.0).abs() < f64::EPSILON);
        assert_eq!(
            config.conversion_weights.lead_to_sale_policy,
            LeadToSalePolicy::PerPair
        );
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = ScoringConfig::default();
        config.conversion_weights.lead = -1.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, LinkPulseError::Config(_)));
        assert!(err.to_string().contains("conversion_weights.lead"));
    }

    #[test]
    fn test_non_finite_weight_rejected() {
        let mut config = ScoringConfig::default();
        config.click_weights.rapid_fire_bonus = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = ScoringConfig::default();
        config.streak_weights.consistency_bonus = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_half_life_rejected() {
        let mut config = ScoringConfig::default();
        config.decay_rates.click_decay_days = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("click_decay_days"));
    }

    #[test]
    fn test_zero_weights_are_allowed() {
        let mut config = ScoringConfig::default();
        config.click_weights.click_per_unit = 0.0;
        config.click_weights.daily_click_cap = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let raw = r#"
            [scoring.decay_rates]
            click_decay_days = 7.0

            [scoring.conversion_weights]
            lead_to_sale_policy = "per_sale"

            [batch]
            max_concurrency = 2
        "#;
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!((config.scoring.decay_rates.click_decay_days - 7.0).abs() < f64::EPSILON);
        assert!((config.scoring.decay_rates.lead_decay_days - 21.0).abs() < f64::EPSILON);
        assert_eq!(
            config.scoring.conversion_weights.lead_to_sale_policy,
            LeadToSalePolicy::PerSale
        );
        assert!((config.scoring.conversion_weights.sale - 12.0).abs() < f64::EPSILON);
        assert_eq!(config.batch.max_concurrency, 2);
    }
}
