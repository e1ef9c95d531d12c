//! Batch recomputation: fans customer histories out over Tokio tasks.
//!
//! Each customer is scored independently, so the only shared state is the
//! result map, keyed by input position. Concurrency is bounded by a semaphore.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use linkpulse_core::types::{CustomerHistory, HotSummary};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::engine::HotnessEngine;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerScore {
    pub customer_id: String,
    pub summary: HotSummary,
}

pub struct BatchRecomputer {
    engine: Arc<HotnessEngine>,
    max_concurrency: usize,
}

impl BatchRecomputer {
    pub fn new(engine: Arc<HotnessEngine>, max_concurrency: usize) -> Self {
        Self {
            engine,
            max_concurrency: max_concurrency.clamp(1, Semaphore::MAX_PERMITS),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Score every history as of `now`. Results are sorted by customer id,
    /// with histories sharing an id kept in input order; a task that panics
    /// is logged and its history omitted.
    pub async fn recompute(
        &self,
        histories: Vec<CustomerHistory>,
        now: DateTime<Utc>,
    ) -> Vec<CustomerScore> {
        let total = histories.len();
        let results: Arc<DashMap<usize, CustomerScore>> = Arc::new(DashMap::new());
        let permits = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        let mut seen = HashSet::with_capacity(total);
        for history in &histories {
            if !seen.insert(history.customer_id.as_str()) {
                warn!(customer_id = %history.customer_id, "Duplicate customer id in batch");
                metrics::counter!("hotness.duplicate_customers").increment(1);
            }
        }

        for (idx, history) in histories.into_iter().enumerate() {
            let engine = self.engine.clone();
            let results = results.clone();
            let permits = permits.clone();

            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };
                let summary = engine.details_at(&history.clicks, &history.events, now);
                metrics::counter!("hotness.customers_scored").increment(1);
                metrics::histogram!("hotness.score").record(summary.score as f64);
                results.insert(
                    idx,
                    CustomerScore {
                        customer_id: history.customer_id,
                        summary,
                    },
                );
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Scoring task failed");
                metrics::counter!("hotness.task_failures").increment(1);
            }
        }

        let mut indexed: Vec<(usize, CustomerScore)> = results
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        indexed.sort_by(|(ia, a), (ib, b)| a.customer_id.cmp(&b.customer_id).then(ia.cmp(ib)));
        let scores: Vec<CustomerScore> = indexed.into_iter().map(|(_, score)| score).collect();

        info!(
            requested = total,
            scored = scores.len(),
            concurrency = self.max_concurrency,
            "Batch recompute finished"
        );

        scores
    }
}
