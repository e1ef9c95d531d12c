//! Exponential half-life decay anchored to a single "as of" instant.

use chrono::{DateTime, Utc};

pub const MS_PER_DAY: f64 = 86_400_000.0;

/// Decay calculator bound to one `now`, shared by every scoring stage so a
/// call never mixes reference times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecayModel {
    now: DateTime<Utc>,
}

impl DecayModel {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Fractional days between `at` and `now`. Future instants count as age 0.
    pub fn age_days(&self, at: DateTime<Utc>) -> f64 {
        let age_ms = (self.now - at).num_milliseconds() as f64;
        (age_ms / MS_PER_DAY).max(0.0)
    }

    /// `0.5 ^ (age / half_life)`, kept within (0, 1].
    ///
    /// `half_life_days` must be positive; [`ScoringConfig::validate`] guarantees
    /// this for configured half-lives.
    ///
    /// [`ScoringConfig::validate`]: linkpulse_core::ScoringConfig::validate
    pub fn factor(&self, at: DateTime<Utc>, half_life_days: f64) -> f64 {
        debug_assert!(half_life_days > 0.0);
        0.5_f64
            .powf(self.age_days(at) / half_life_days)
            .max(f64::MIN_POSITIVE)
    }
}
