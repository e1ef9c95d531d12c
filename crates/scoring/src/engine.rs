//! Hotness engine: runs every stage against one `now` and folds the
//! contributions into a bounded score, a tier and the explaining windows.

use chrono::{DateTime, Utc};
use linkpulse_core::config::ScoringConfig;
use linkpulse_core::error::LinkPulseResult;
use linkpulse_core::types::{ActivityEvent, ClickEvent, HotSummary, ScoreBreakdown, Tier};
use tracing::debug;

use crate::buckets::DailyBuckets;
use crate::clicks::click_contribution;
use crate::conversion::score_conversions;
use crate::decay::DecayModel;
use crate::streak::{score_streaks, ActivityLookback};
use crate::velocity::detect_bursts;

pub const MAX_SCORE: f64 = 100.0;

/// Stateless scorer over a validated [`ScoringConfig`]. Cheap to share
/// across threads; every call is independent.
#[derive(Debug, Clone)]
pub struct HotnessEngine {
    config: ScoringConfig,
}

impl HotnessEngine {
    /// Validate `config` once; an invalid config never produces an engine.
    pub fn new(config: ScoringConfig) -> LinkPulseResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn score(&self, clicks: &[ClickEvent], events: &[ActivityEvent]) -> u8 {
        self.score_at(clicks, events, Utc::now())
    }

    pub fn score_at(&self, clicks: &[ClickEvent], events: &[ActivityEvent], now: DateTime<Utc>) -> u8 {
        self.details_at(clicks, events, now).score
    }

    pub fn details(&self, clicks: &[ClickEvent], events: &[ActivityEvent]) -> HotSummary {
        self.details_at(clicks, events, Utc::now())
    }

    pub fn details_at(
        &self,
        clicks: &[ClickEvent],
        events: &[ActivityEvent],
        now: DateTime<Utc>,
    ) -> HotSummary {
        let config = &self.config;
        let decay = DecayModel::new(now);
        let buckets = DailyBuckets::build(clicks, events);

        let clicks_score = click_contribution(
            &buckets,
            &config.click_weights,
            config.decay_rates.click_decay_days,
            &decay,
        );
        let streak = score_streaks(&ActivityLookback::build(&buckets, now), &config.streak_weights);
        let velocity = detect_bursts(clicks, &config.click_weights);
        let conversion = score_conversions(
            events,
            &config.conversion_weights,
            &config.decay_rates,
            &decay,
        );

        let breakdown = ScoreBreakdown {
            clicks: clicks_score,
            streak: streak.total(),
            velocity: velocity.score,
            conversions: conversion.contribution,
            proximity: conversion.proximity,
        };
        let score = breakdown.total().round().clamp(0.0, MAX_SCORE) as u8;
        let tier = Tier::from_score(score);

        let hot_windows: Vec<_> = [streak.hot_window, velocity.hot_window, conversion.hot_window]
            .into_iter()
            .flatten()
            .collect();

        debug!(
            clicks = clicks.len(),
            events = events.len(),
            active_days = streak.active_days,
            score,
            tier = %tier,
            windows = hot_windows.len(),
            "Hotness computed"
        );

        HotSummary {
            score,
            tier,
            hot_windows,
            breakdown,
        }
    }
}

/// Score a history against `config` as of `now`.
pub fn compute_lead_score(
    clicks: &[ClickEvent],
    events: &[ActivityEvent],
    config: &ScoringConfig,
    now: DateTime<Utc>,
) -> LinkPulseResult<u8> {
    Ok(get_lead_score_details(clicks, events, config, now)?.score)
}

/// Full summary for a history against `config` as of `now`.
pub fn get_lead_score_details(
    clicks: &[ClickEvent],
    events: &[ActivityEvent],
    config: &ScoringConfig,
    now: DateTime<Utc>,
) -> LinkPulseResult<HotSummary> {
    config.validate()?;
    Ok(HotnessEngine {
        config: config.clone(),
    }
    .details_at(clicks, events, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use linkpulse_core::LinkPulseError;

    fn midnight() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap()
    }

    fn engine() -> HotnessEngine {
        HotnessEngine::new(ScoringConfig::default()).unwrap()
    }

    #[test]
    fn test_empty_history_is_cold() {
        let summary = engine().details_at(&[], &[], midnight());
        assert_eq!(summary.score, 0);
        assert_eq!(summary.tier, Tier::Cold);
        assert!(summary.hot_windows.is_empty());
        assert_eq!(summary.breakdown, ScoreBreakdown::default());
    }

    #[test]
    fn test_single_click_today() {
        let summary = engine().details_at(&[ClickEvent::new(midnight())], &[], midnight());
        assert_eq!(summary.score, 4);
        assert_eq!(summary.tier, Tier::Cold);
        assert!((summary.breakdown.clicks - 4.0).abs() < f64::EPSILON);
        assert_eq!(summary.breakdown.streak, 0.0);
        assert_eq!(summary.breakdown.velocity, 0.0);
    }

    #[test]
    fn test_score_is_clamped_to_100() {
        let now = midnight() + Duration::hours(12);
        let clicks: Vec<_> = (0..14)
            .flat_map(|d| (0..12).map(move |m| now - Duration::days(d) + Duration::minutes(m * 5)))
            .filter(|ts| *ts <= now)
            .map(ClickEvent::new)
            .collect();
        let events: Vec<_> = (0..6)
            .map(|d| ActivityEvent::lead(now - Duration::days(d)))
            .chain((0..3).map(|d| ActivityEvent::sale(now - Duration::days(d))))
            .collect();

        let summary = engine().details_at(&clicks, &events, now);
        assert!(summary.breakdown.total() > 100.0);
        assert_eq!(summary.score, 100);
        assert_eq!(summary.tier, Tier::VeryHot);
        assert_eq!(summary.hot_windows.len(), 3);
    }

    #[test]
    fn test_same_inputs_same_result() {
        let now = midnight() + Duration::hours(9);
        let clicks = vec![
            ClickEvent::new(now - Duration::minutes(20)),
            ClickEvent::new(now - Duration::days(2)),
        ];
        let events = vec![ActivityEvent::sale(now - Duration::days(1))];
        let a = engine().details_at(&clicks, &events, now);
        let b = engine().details_at(&clicks, &events, now);
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_config_refused() {
        let mut config = ScoringConfig::default();
        config.decay_rates.lead_decay_days = -3.0;
        assert!(matches!(HotnessEngine::new(config.clone()), Err(LinkPulseError::Config(_))));
        assert!(compute_lead_score(&[], &[], &config, midnight()).is_err());
    }

    #[test]
    fn test_free_functions_match_engine() {
        let now = midnight() + Duration::hours(6);
        let clicks = vec![ClickEvent::new(now), ClickEvent::new(now - Duration::minutes(30))];
        let config = ScoringConfig::default();

        let score = compute_lead_score(&clicks, &[], &config, now).unwrap();
        let details = get_lead_score_details(&clicks, &[], &config, now).unwrap();
        assert_eq!(score, details.score);
        assert_eq!(details, engine().details_at(&clicks, &[], now));
    }
}
