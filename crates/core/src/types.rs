use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LinkPulseError, LinkPulseResult};

/// One raw click on a short link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub timestamp: DateTime<Utc>,
}

impl ClickEvent {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self { timestamp }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionKind {
    Lead,
    Sale,
}

impl ConversionKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "lead" => Some(Self::Lead),
            "sale" => Some(Self::Sale),
            _ => None,
        }
    }
}

/// A conversion event (lead or sale) attributed to a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    #[serde(rename = "event")]
    pub kind: ConversionKind,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEvent {
    pub fn lead(timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: ConversionKind::Lead,
            timestamp,
        }
    }

    pub fn sale(timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: ConversionKind::Sale,
            timestamp,
        }
    }
}

// ─── Ingestion ──────────────────────────────────────────────────────────

/// Click record as delivered by the event store, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawClickEvent {
    pub timestamp: String,
}

/// Conversion record as delivered by the event store, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawActivityEvent {
    pub event: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCustomerHistory {
    pub customer_id: String,
    #[serde(default)]
    pub clicks: Vec<RawClickEvent>,
    #[serde(default)]
    pub events: Vec<RawActivityEvent>,
}

/// A customer's full, validated event history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerHistory {
    pub customer_id: String,
    pub clicks: Vec<ClickEvent>,
    pub events: Vec<ActivityEvent>,
}

fn parse_timestamp(raw: &str) -> LinkPulseResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| LinkPulseError::InvalidEvent(format!("unparsable timestamp {raw:?}: {e}")))
}

impl TryFrom<&RawClickEvent> for ClickEvent {
    type Error = LinkPulseError;

    fn try_from(raw: &RawClickEvent) -> Result<Self, Self::Error> {
        Ok(ClickEvent::new(parse_timestamp(&raw.timestamp)?))
    }
}

impl TryFrom<&RawActivityEvent> for ActivityEvent {
    type Error = LinkPulseError;

    fn try_from(raw: &RawActivityEvent) -> Result<Self, Self::Error> {
        let kind = ConversionKind::parse(&raw.event).ok_or_else(|| {
            LinkPulseError::InvalidEvent(format!("unknown conversion event {:?}", raw.event))
        })?;
        Ok(ActivityEvent {
            kind,
            timestamp: parse_timestamp(&raw.timestamp)?,
        })
    }
}

impl RawCustomerHistory {
    /// Convert every record, failing on the first malformed one.
    pub fn validate(&self) -> LinkPulseResult<CustomerHistory> {
        let with_customer = |e: LinkPulseError| match e {
            LinkPulseError::InvalidEvent(msg) => {
                LinkPulseError::InvalidEvent(format!("customer {}: {msg}", self.customer_id))
            }
            other => other,
        };

        let clicks = self
            .clicks
            .iter()
            .map(ClickEvent::try_from)
            .collect::<LinkPulseResult<Vec<_>>>()
            .map_err(with_customer)?;
        let events = self
            .events
            .iter()
            .map(ActivityEvent::try_from)
            .collect::<LinkPulseResult<Vec<_>>>()
            .map_err(with_customer)?;

        Ok(CustomerHistory {
            customer_id: self.customer_id.clone(),
            clicks,
            events,
        })
    }
}

// ─── Output ─────────────────────────────────────────────────────────────

/// Discrete engagement bucket derived from the numeric score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Cold,
    Warm,
    Hot,
    VeryHot,
}

impl Tier {
    pub fn from_score(score: u8) -> Self {
        match score {
            75.. => Tier::VeryHot,
            50..=74 => Tier::Hot,
            25..=49 => Tier::Warm,
            _ => Tier::Cold,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Tier::Cold => 0,
            Tier::Warm => 1,
            Tier::Hot => 2,
            Tier::VeryHot => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::Cold => "cold",
            Tier::Warm => "warm",
            Tier::Hot => "hot",
            Tier::VeryHot => "very_hot",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A behavior pattern that contributed to the score, with the range it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub score: f64,
    pub reasons: Vec<String>,
}

/// Unrounded per-stage contributions that sum to the final score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub clicks: f64,
    pub streak: f64,
    pub velocity: f64,
    pub conversions: f64,
    pub proximity: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.clicks + self.streak + self.velocity + self.conversions + self.proximity
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HotSummary {
    /// Always within 0..=100.
    pub score: u8,
    pub tier: Tier,
    pub hot_windows: Vec<HotWindow>,
    pub breakdown: ScoreBreakdown,
}
