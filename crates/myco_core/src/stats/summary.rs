//! Dashboard summary counts.

use crate::calc::success_rate;
use crate::model::experiment::{Experiment, ExperimentStatus};
use serde::{Deserialize, Serialize};

/// Headline counts shown on the dashboard.
///
/// `active_count` covers every status except `done` and `contaminated`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_count: u64,
    pub active_count: u64,
    pub contaminated_count: u64,
    /// Non-contaminated share of `total_count` in percent, one decimal.
    pub success_rate: f64,
}

impl SummaryStats {
    pub fn from_counts(total_count: u64, active_count: u64, contaminated_count: u64) -> Self {
        Self {
            total_count,
            active_count,
            contaminated_count,
            success_rate: success_rate(total_count, contaminated_count),
        }
    }

    /// Computes the same counts the store reports, over an in-memory set.
    pub fn from_records(experiments: &[Experiment]) -> Self {
        let total = experiments.len() as u64;
        let active = experiments
            .iter()
            .filter(|experiment| experiment.status.is_active())
            .count() as u64;
        let contaminated = experiments
            .iter()
            .filter(|experiment| experiment.status == ExperimentStatus::Contaminated)
            .count() as u64;
        Self::from_counts(total, active, contaminated)
    }

    /// Finished, non-contaminated runs.
    pub fn done_count(&self) -> u64 {
        self.total_count
            .saturating_sub(self.active_count)
            .saturating_sub(self.contaminated_count)
    }
}
