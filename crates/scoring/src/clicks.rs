//! Daily-capped, decayed click contribution.

use linkpulse_core::config::ClickWeights;

use crate::buckets::{day_start, DailyBuckets};
use crate::decay::DecayModel;

/// Sum over days of `min(cap, clicks) * click_per_unit * decay(day midnight)`.
pub fn click_contribution(
    buckets: &DailyBuckets,
    weights: &ClickWeights,
    half_life_days: f64,
    decay: &DecayModel,
) -> f64 {
    buckets
        .clicks_by_day
        .iter()
        .map(|(day, &count)| {
            let effective = count.min(weights.daily_click_cap) as f64;
            effective * weights.click_per_unit * decay.factor(day_start(*day), half_life_days)
        })
        .sum()
}
