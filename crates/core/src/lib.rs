pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, ScoringConfig};
pub use error::{LinkPulseError, LinkPulseResult};
