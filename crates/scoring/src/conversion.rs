//! Lead and sale scoring: decayed per-event value plus proximity bonuses.

use chrono::{DateTime, Duration, Utc};
use linkpulse_core::config::{ConversionWeights, DecayRates, LeadToSalePolicy};
use linkpulse_core::types::{ActivityEvent, ConversionKind, HotWindow};

use crate::decay::DecayModel;

pub const LEAD_CLUSTER_REASON: &str = "Multiple leads within 7 days";
pub const FAST_CONVERSION_REASON: &str = "Fast lead-to-sale conversion";

const LEAD_CLUSTER_DAYS: i64 = 7;
const SALE_RECENCY_DAYS: i64 = 7;
const LEAD_TO_SALE_DAYS: i64 = 30;
const LEAD_TO_SALE_BONUS: f64 = 10.0;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionOutcome {
    /// Decayed lead and sale value.
    pub contribution: f64,
    /// Clustering, recency and lead-to-sale bonuses.
    pub proximity: f64,
    pub reasons: Vec<String>,
    pub hot_window: Option<HotWindow>,
}

pub fn score_conversions(
    events: &[ActivityEvent],
    weights: &ConversionWeights,
    rates: &DecayRates,
    decay: &DecayModel,
) -> ConversionOutcome {
    let mut leads: Vec<DateTime<Utc>> = Vec::new();
    let mut sales: Vec<DateTime<Utc>> = Vec::new();
    let mut contribution = 0.0;

    for event in events {
        match event.kind {
            ConversionKind::Lead => {
                contribution += weights.lead * decay.factor(event.timestamp, rates.lead_decay_days);
                leads.push(event.timestamp);
            }
            ConversionKind::Sale => {
                contribution += weights.sale * decay.factor(event.timestamp, rates.sale_decay_days);
                sales.push(event.timestamp);
            }
        }
    }
    leads.sort_unstable();
    sales.sort_unstable();

    let mut proximity = 0.0;
    let mut reasons = Vec::new();

    let clustered = leads
        .windows(2)
        .any(|pair| pair[1] - pair[0] <= Duration::days(LEAD_CLUSTER_DAYS));
    if clustered {
        proximity += weights.lead_proximity_bonus;
        reasons.push(LEAD_CLUSTER_REASON.to_string());
    }

    if let Some(&latest_sale) = sales.last() {
        let age = decay.now() - latest_sale;
        if age <= Duration::days(SALE_RECENCY_DAYS) {
            proximity += weights.sale_recency_bonus;
            reasons.push(format!("Recent sale ({}d ago)", age.num_days().max(0)));
        }
    }

    let fast_conversions = count_fast_conversions(&leads, &sales, weights.lead_to_sale_policy);
    if fast_conversions > 0 {
        proximity += LEAD_TO_SALE_BONUS * fast_conversions as f64;
        reasons.push(if fast_conversions == 1 {
            FAST_CONVERSION_REASON.to_string()
        } else {
            format!("{FAST_CONVERSION_REASON} (x{fast_conversions})")
        });
    }

    let first = leads.first().into_iter().chain(sales.first()).min();
    let last = leads.last().into_iter().chain(sales.last()).max();
    let hot_window = match (first, last) {
        (Some(&start), Some(&end)) if proximity > 0.0 => Some(HotWindow {
            start,
            end,
            score: proximity,
            reasons: reasons.clone(),
        }),
        _ => None,
    };

    ConversionOutcome {
        contribution,
        proximity,
        reasons,
        hot_window,
    }
}

/// Number of lead-to-sale bonuses earned: sales landing 0–30 days after a lead.
fn count_fast_conversions(
    leads: &[DateTime<Utc>],
    sales: &[DateTime<Utc>],
    policy: LeadToSalePolicy,
) -> usize {
    let within = |lead: &DateTime<Utc>, sale: &DateTime<Utc>| {
        let gap = *sale - *lead;
        gap >= Duration::zero() && gap <= Duration::days(LEAD_TO_SALE_DAYS)
    };

    match policy {
        LeadToSalePolicy::PerPair => leads
            .iter()
            .map(|lead| sales.iter().filter(|sale| within(lead, sale)).count())
            .sum(),
        LeadToSalePolicy::PerSale => sales
            .iter()
            .filter(|sale| leads.iter().any(|lead| within(lead, sale)))
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn score(events: &[ActivityEvent]) -> ConversionOutcome {
        score_with(events, ConversionWeights::default())
    }

    fn score_with(events: &[ActivityEvent], weights: ConversionWeights) -> ConversionOutcome {
        score_conversions(events, &weights, &DecayRates::default(), &DecayModel::new(now()))
    }

    #[test]
    fn test_three_leads_at_now() {
        let events = vec![ActivityEvent::lead(now()); 3];
        let outcome = score(&events);
        assert!((outcome.contribution - 36.0).abs() < f64::EPSILON);
        assert_eq!(outcome.proximity, 8.0);
        assert_eq!(outcome.reasons, vec![LEAD_CLUSTER_REASON.to_string()]);
        assert!(outcome.hot_window.is_some());
    }

    #[test]
    fn test_sale_decays_on_its_own_half_life() {
        let events = vec![ActivityEvent::sale(now() - Duration::days(45))];
        let outcome = score(&events);
        assert!((outcome.contribution - 6.0).abs() < 1e-12);
        assert_eq!(outcome.proximity, 0.0);
        assert!(outcome.hot_window.is_none());
    }

    #[test]
    fn test_leads_far_apart_do_not_cluster() {
        let events = vec![
            ActivityEvent::lead(now()),
            ActivityEvent::lead(now() - Duration::days(8)),
        ];
        let outcome = score(&events);
        assert_eq!(outcome.proximity, 0.0);
    }

    #[test]
    fn test_recent_sale_reason_reports_days() {
        let events = vec![ActivityEvent::sale(now() - Duration::days(3) - Duration::hours(5))];
        let outcome = score(&events);
        assert_eq!(outcome.proximity, 6.0);
        assert_eq!(outcome.reasons, vec!["Recent sale (3d ago)".to_string()]);
    }

    #[test]
    fn test_lead_to_sale_accumulates_per_pair() {
        let sale_at = now() - Duration::days(20);
        let events = vec![
            ActivityEvent::lead(sale_at - Duration::days(1)),
            ActivityEvent::lead(sale_at - Duration::days(10)),
            ActivityEvent::lead(sale_at - Duration::days(40)),
            ActivityEvent::sale(sale_at),
        ];
        let outcome = score(&events);
        // two qualifying leads; the pair of leads is 9 days apart so no cluster
        assert_eq!(outcome.proximity, 20.0);
        assert_eq!(outcome.reasons, vec!["Fast lead-to-sale conversion (x2)".to_string()]);

        let window = outcome.hot_window.unwrap();
        assert_eq!(window.start, sale_at - Duration::days(40));
        assert_eq!(window.end, sale_at);
    }

    #[test]
    fn test_lead_to_sale_per_sale_policy() {
        let sale_at = now() - Duration::days(20);
        let events = vec![
            ActivityEvent::lead(sale_at - Duration::days(1)),
            ActivityEvent::lead(sale_at - Duration::days(10)),
            ActivityEvent::sale(sale_at),
        ];
        let weights = ConversionWeights {
            lead_to_sale_policy: LeadToSalePolicy::PerSale,
            ..ConversionWeights::default()
        };
        assert_eq!(score_with(&events, weights).proximity, 10.0);
    }

    #[test]
    fn test_sale_before_lead_is_not_fast_conversion() {
        let events = vec![
            ActivityEvent::sale(now() - Duration::days(20)),
            ActivityEvent::lead(now() - Duration::days(10)),
        ];
        assert_eq!(score(&events).proximity, 0.0);
    }

    #[test]
    fn test_single_fast_conversion_reason_has_no_count() {
        let sale_at = now() - Duration::days(20);
        let events = vec![
            ActivityEvent::lead(sale_at - Duration::days(2)),
            ActivityEvent::sale(sale_at),
        ];
        let outcome = score(&events);
        assert_eq!(outcome.proximity, 10.0);
        assert_eq!(outcome.reasons, vec![FAST_CONVERSION_REASON.to_string()]);
    }

    #[test]
    fn test_leads_exactly_seven_days_apart_cluster() {
        let events = vec![
            ActivityEvent::lead(now() - Duration::days(10)),
            ActivityEvent::lead(now() - Duration::days(17)),
        ];
        let outcome = score(&events);
        assert_eq!(outcome.proximity, 8.0);
        assert_eq!(outcome.reasons, vec![LEAD_CLUSTER_REASON.to_string()]);

        let events = vec![
            ActivityEvent::lead(now() - Duration::days(10)),
            ActivityEvent::lead(now() - Duration::days(17) - Duration::seconds(1)),
        ];
        assert_eq!(score(&events).proximity, 0.0);
    }

    #[test]
    fn test_sale_exactly_seven_days_old_is_recent() {
        let events = vec![ActivityEvent::sale(now() - Duration::days(7))];
        let outcome = score(&events);
        assert_eq!(outcome.proximity, 6.0);
        assert_eq!(outcome.reasons, vec!["Recent sale (7d ago)".to_string()]);

        let events = vec![ActivityEvent::sale(now() - Duration::days(7) - Duration::seconds(1))];
        let outcome = score(&events);
        assert_eq!(outcome.proximity, 0.0);
        assert!(outcome.reasons.is_empty());
    }

    #[test]
    fn test_sale_at_same_instant_as_lead_is_fast_conversion() {
        let at = now() - Duration::days(20);
        let events = vec![ActivityEvent::lead(at), ActivityEvent::sale(at)];
        let outcome = score(&events);
        assert_eq!(outcome.proximity, 10.0);
        assert_eq!(outcome.reasons, vec![FAST_CONVERSION_REASON.to_string()]);

        let events = vec![
            ActivityEvent::lead(at + Duration::seconds(1)),
            ActivityEvent::sale(at),
        ];
        assert_eq!(score(&events).proximity, 0.0);
    }

    #[test]
    fn test_sale_exactly_thirty_days_after_lead() {
        let sale_at = now() - Duration::days(10);
        let events = vec![
            ActivityEvent::lead(sale_at - Duration::days(30)),
            ActivityEvent::sale(sale_at),
        ];
        assert_eq!(score(&events).proximity, 10.0);

        let events = vec![
            ActivityEvent::lead(sale_at - Duration::days(30) - Duration::seconds(1)),
            ActivityEvent::sale(sale_at),
        ];
        assert_eq!(score(&events).proximity, 0.0);
    }
}
