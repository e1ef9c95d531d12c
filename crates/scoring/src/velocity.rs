//! Sliding-window burst detection over raw click timestamps.
//!
//! Three independent checks at different time scales; each contributes its
//! bonus at most once.

use chrono::{DateTime, Duration, Utc};
use linkpulse_core::config::ClickWeights;
use linkpulse_core::types::{ClickEvent, HotWindow};

pub const QUICK_BURST_REASON: &str = "Quick engagement burst (1h)";
pub const RAPID_FIRE_REASON: &str = "Rapid-fire clicking (2h)";
pub const MARATHON_REASON: &str = "Marathon research session (1 day)";

const RAPID_FIRE_CLICKS: usize = 5;
const MARATHON_CLICKS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VelocityOutcome {
    pub score: f64,
    pub reasons: Vec<String>,
    pub hot_window: Option<HotWindow>,
}

/// True if some run of `run` consecutive sorted timestamps spans at most `span`.
fn has_dense_run(sorted: &[DateTime<Utc>], run: usize, span: Duration) -> bool {
    sorted
        .windows(run)
        .any(|w| w[run - 1] - w[0] <= span)
}

pub fn detect_bursts(clicks: &[ClickEvent], weights: &ClickWeights) -> VelocityOutcome {
    let mut sorted: Vec<DateTime<Utc>> = clicks.iter().map(|c| c.timestamp).collect();
    sorted.sort_unstable();

    let mut score = 0.0;
    let mut reasons = Vec::new();

    if has_dense_run(&sorted, 2, Duration::minutes(60)) {
        score += weights.velocity_burst_bonus;
        reasons.push(QUICK_BURST_REASON.to_string());
    }
    if has_dense_run(&sorted, RAPID_FIRE_CLICKS, Duration::hours(2)) {
        score += weights.rapid_fire_bonus;
        reasons.push(RAPID_FIRE_REASON.to_string());
    }
    if has_dense_run(&sorted, MARATHON_CLICKS, Duration::hours(24)) {
        score += weights.marathon_session_bonus;
        reasons.push(MARATHON_REASON.to_string());
    }

    // Spans all clicks, not just the dense run.
    let hot_window = match (sorted.first(), sorted.last()) {
        (Some(&start), Some(&end)) if score > 0.0 => Some(HotWindow {
            start,
            end,
            score,
            reasons: reasons.clone(),
        }),
        _ => None,
    };

    VelocityOutcome {
        score,
        reasons,
        hot_window,
    }
}
