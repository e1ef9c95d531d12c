//! Engagement hotness scoring: turns a customer's clicks, leads and sales
//! into a bounded 0–100 score, a tier, and the hot windows that explain it.
//!
//! Every stage is pure: callers pass the full history plus an explicit
//! "as of" instant and get the same answer every time.

pub mod batch;
pub mod buckets;
pub mod clicks;
pub mod conversion;
pub mod decay;
pub mod engine;
pub mod streak;
pub mod velocity;

pub use batch::{BatchRecomputer, CustomerScore};
pub use engine::{compute_lead_score, get_lead_score_details, HotnessEngine};
