//! Per-UTC-day event counters.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use linkpulse_core::types::{ActivityEvent, ClickEvent};

/// UTC calendar day an instant falls on.
pub fn day_key(timestamp: DateTime<Utc>) -> NaiveDate {
    timestamp.date_naive()
}

/// UTC midnight at the start of `day`.
pub fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Click and activity counts bucketed by UTC day.
#[derive(Debug, Clone, Default)]
pub struct DailyBuckets {
    /// Clicks only.
    pub clicks_by_day: BTreeMap<NaiveDate, u32>,
    /// Clicks, leads and sales combined; drives activity detection.
    pub events_by_day: BTreeMap<NaiveDate, u32>,
}

impl DailyBuckets {
    pub fn build(clicks: &[ClickEvent], events: &[ActivityEvent]) -> Self {
        let mut buckets = Self::default();

        for click in clicks {
            let day = day_key(click.timestamp);
            *buckets.clicks_by_day.entry(day).or_insert(0) += 1;
            *buckets.events_by_day.entry(day).or_insert(0) += 1;
        }
        for event in events {
            *buckets.events_by_day.entry(day_key(event.timestamp)).or_insert(0) += 1;
        }

        buckets
    }

    pub fn events_on(&self, day: NaiveDate) -> u32 {
        self.events_by_day.get(&day).copied().unwrap_or(0)
    }
}
