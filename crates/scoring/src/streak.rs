//! Streak scoring over the trailing 14 UTC days.
//!
//! Two layers contribute:
//!
//! * a fixed tier keyed on how many of the 14 days saw any activity, and
//! * a flexible best-window search that enumerates every contiguous
//!   sub-window, discards those containing a double gap (two inactive days
//!   in a row), and ranks the rest by activity, length, gap penalty and
//!   pattern bonuses (alternating, crescendo, burst, consistency).

use chrono::{DateTime, Duration, NaiveDate, Utc};
use linkpulse_core::config::StreakWeights;
use linkpulse_core::types::HotWindow;
use serde::{Deserialize, Serialize};

use crate::buckets::{day_key, day_start, DailyBuckets};

pub const LOOKBACK_DAYS: usize = 14;

const CRESCENDO_BONUS: f64 = 6.0;
const BURST_BONUS: f64 = 8.0;
const BURST_DAY_MIN_EVENTS: u32 = 3;
const BURST_MIN_DAYS: usize = 2;
const PATTERN_MIN_ACTIVE_DAYS: usize = 3;
const CRESCENDO_GROWTH: f64 = 1.5;
const CONSISTENCY_THRESHOLD: f64 = 0.6;
const TODAY_RECENCY_BIAS: f64 = 5.0;
const RECENCY_BIAS_PER_INDEX: f64 = 0.01;
const ENDS_TODAY_MULTIPLIER: f64 = 1.2;
const HOT_WINDOW_MIN_FLEX: f64 = 10.0;

const LAST: usize = LOOKBACK_DAYS - 1;

/// Activity counts for the 14 UTC days ending on `now`'s day (index 13).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityLookback {
    days: [NaiveDate; LOOKBACK_DAYS],
    counts: [u32; LOOKBACK_DAYS],
}

impl ActivityLookback {
    pub fn build(buckets: &DailyBuckets, now: DateTime<Utc>) -> Self {
        let today = day_key(now);
        let days = Self::days_ending(today);
        let counts = days.map(|day| buckets.events_on(day));
        Self { days, counts }
    }

    pub fn from_counts(today: NaiveDate, counts: [u32; LOOKBACK_DAYS]) -> Self {
        Self {
            days: Self::days_ending(today),
            counts,
        }
    }

    fn days_ending(today: NaiveDate) -> [NaiveDate; LOOKBACK_DAYS] {
        std::array::from_fn(|k| today - Duration::days((LAST - k) as i64))
    }

    pub fn day(&self, index: usize) -> NaiveDate {
        self.days[index]
    }

    pub fn count(&self, index: usize) -> u32 {
        self.counts[index]
    }

    fn is_active(&self, index: usize) -> bool {
        self.counts[index] >= 1
    }

    pub fn active_days(&self) -> usize {
        (0..LOOKBACK_DAYS).filter(|&k| self.is_active(k)).count()
    }
}

/// Highest qualifying fixed tier for the number of active days.
pub fn fixed_tier_bonus(active_days: usize, weights: &StreakWeights) -> f64 {
    match active_days {
        10.. => weights.streak_7_days_bonus,
        8..=9 => weights.streak_5_days_bonus,
        4..=7 => weights.streak_3_days_bonus,
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPatterns {
    pub alternating: bool,
    pub crescendo: bool,
    pub burst: bool,
    pub consistent: bool,
}

/// A candidate window `[start, end]` (inclusive lookback indices).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexWindow {
    pub start: usize,
    pub end: usize,
    pub active_days: usize,
    pub patterns: WindowPatterns,
    /// Score without the recency bias.
    pub base_score: f64,
    /// `base_score` plus recency bias; used only for ranking.
    pub ranking_score: f64,
}

impl FlexWindow {
    pub fn length(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn ends_today(&self) -> bool {
        self.end == LAST
    }

    pub fn reasons(&self) -> Vec<String> {
        let mut reasons = Vec::new();
        if self.patterns.alternating {
            reasons.push("Alternating-day engagement".to_string());
        }
        if self.patterns.crescendo {
            reasons.push("Building momentum (crescendo)".to_string());
        }
        if self.patterns.burst {
            reasons.push("Multiple high-activity days".to_string());
        }
        if self.patterns.consistent {
            reasons.push(format!(
                "Consistent activity ({}/{} days)",
                self.active_days,
                self.length()
            ));
        }
        reasons
    }
}

/// Score the window `[start, end]`, or `None` if it holds a double gap or
/// fewer than two active days.
pub fn evaluate_window(
    lookback: &ActivityLookback,
    start: usize,
    end: usize,
    weights: &StreakWeights,
) -> Option<FlexWindow> {
    debug_assert!(start <= end && end < LOOKBACK_DAYS);

    let active: Vec<bool> = (start..=end).map(|k| lookback.is_active(k)).collect();
    let counts = &lookback.counts[start..=end];

    if active.windows(2).any(|pair| !pair[0] && !pair[1]) {
        return None;
    }

    let length = active.len();
    let active_days = active.iter().filter(|&&a| a).count();
    if active_days < 2 {
        return None;
    }
    let zeros = length - active_days;

    let alternating = active.windows(2).all(|pair| pair[0] != pair[1]);

    let crescendo = active_days >= PATTERN_MIN_ACTIVE_DAYS && {
        let half = length / 2;
        let first: u32 = counts[..half].iter().sum();
        let second: u32 = counts[half..].iter().sum();
        let second = second as f64;
        second > half as f64 && second > CRESCENDO_GROWTH * first as f64
    };

    let burst = active_days >= PATTERN_MIN_ACTIVE_DAYS
        && counts.iter().filter(|&&c| c >= BURST_DAY_MIN_EVENTS).count() >= BURST_MIN_DAYS;

    let consistent = active_days as f64 / length as f64 > CONSISTENCY_THRESHOLD;

    let mut base_score = active_days as f64 * weights.flex_streak_active_per_day
        + length as f64 * weights.flex_streak_length_per_day
        - zeros as f64 * weights.flex_streak_gap_penalty;
    if alternating {
        base_score += weights.flex_streak_alt_pattern_bonus;
    }
    if crescendo {
        base_score += CRESCENDO_BONUS;
    }
    if burst {
        base_score += BURST_BONUS;
    }
    if consistent {
        base_score += weights.consistency_bonus;
    }

    let recency_bias = if end == LAST {
        TODAY_RECENCY_BIAS
    } else {
        end as f64 * RECENCY_BIAS_PER_INDEX
    };

    Some(FlexWindow {
        start,
        end,
        active_days,
        patterns: WindowPatterns {
            alternating,
            crescendo,
            burst,
            consistent,
        },
        base_score,
        ranking_score: base_score + recency_bias,
    })
}

/// Best-ranked window across all 105 contiguous sub-windows. Earlier windows
/// (lower start, then lower end) win ties.
pub fn best_flex_window(lookback: &ActivityLookback, weights: &StreakWeights) -> Option<FlexWindow> {
    let mut best: Option<FlexWindow> = None;

    for start in 0..LOOKBACK_DAYS {
        for end in start..LOOKBACK_DAYS {
            let Some(candidate) = evaluate_window(lookback, start, end, weights) else {
                continue;
            };
            let better = best
                .as_ref()
                .map_or(true, |current| candidate.ranking_score > current.ranking_score);
            if better {
                best = Some(candidate);
            }
        }
    }

    best
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreakOutcome {
    pub active_days: usize,
    pub fixed_bonus: f64,
    /// Rounded and clamped to `flex_streak_max_bonus`.
    pub flex_bonus: f64,
    pub best_window: Option<FlexWindow>,
    pub hot_window: Option<HotWindow>,
}

impl StreakOutcome {
    pub fn total(&self) -> f64 {
        self.fixed_bonus + self.flex_bonus
    }
}

pub fn score_streaks(lookback: &ActivityLookback, weights: &StreakWeights) -> StreakOutcome {
    let active_days = lookback.active_days();
    let fixed_bonus = fixed_tier_bonus(active_days, weights);

    let Some(window) = best_flex_window(lookback, weights) else {
        return StreakOutcome {
            active_days,
            fixed_bonus,
            ..Default::default()
        };
    };

    let multiplier = if window.ends_today() {
        ENDS_TODAY_MULTIPLIER
    } else {
        1.0
    };
    let flex_bonus = (window.base_score * multiplier)
        .round()
        .clamp(0.0, weights.flex_streak_max_bonus);

    let hot_window = (flex_bonus > HOT_WINDOW_MIN_FLEX).then(|| HotWindow {
        start: day_start(lookback.day(window.start)),
        end: day_start(lookback.day(window.end)),
        score: flex_bonus,
        reasons: window.reasons(),
    });

    StreakOutcome {
        active_days,
        fixed_bonus,
        flex_bonus,
        best_window: Some(window),
        hot_window,
    }
}
