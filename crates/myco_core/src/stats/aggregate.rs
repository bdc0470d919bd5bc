//! Per-substrate, per-status and timeline aggregates for analytics charts.

use crate::calc::{days_to_colonization, round1, success_rate};
use crate::model::experiment::{Experiment, ExperimentStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate row for one substrate type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstrateSummary {
    pub count: u64,
    /// Records whose status is not `contaminated`.
    pub successful_count: u64,
    /// Records with a known days-to-colonization value.
    pub colonized_count: u64,
    /// Mean over `colonized_count` records, one decimal; `None` when zero.
    pub avg_days_to_colonization: Option<f64>,
    pub success_rate_pct: f64,
}

/// One point of the cumulative inoculation timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    /// Records inoculated on `date`.
    pub count: u64,
    /// Records inoculated on or before `date`.
    pub cumulative_count: u64,
}

/// Headline numbers for the analytics view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total: u64,
    pub avg_days_to_colonization: Option<f64>,
    pub contaminated_count: u64,
    /// Non-contaminated share of `total` in percent, one decimal; `0.0` when empty.
    pub success_rate_pct: f64,
    /// Contaminated share of `total` in percent, one decimal; `0.0` when empty.
    pub contamination_rate_pct: f64,
}

#[derive(Default)]
struct SubstrateAccumulator {
    count: u64,
    successful: u64,
    colonized: u64,
    colonization_days_sum: i64,
}

/// Groups records by `substrate_type`.
pub fn group_by_substrate(experiments: &[Experiment]) -> BTreeMap<String, SubstrateSummary> {
    let mut groups: BTreeMap<String, SubstrateAccumulator> = BTreeMap::new();
    for experiment in experiments {
        let entry = groups.entry(experiment.substrate_type.clone()).or_default();
        entry.count += 1;
        if experiment.status.is_successful() {
            entry.successful += 1;
        }
        if let Some(days) = days_to_colonization(experiment) {
            entry.colonized += 1;
            entry.colonization_days_sum += days;
        }
    }

    groups
        .into_iter()
        .map(|(substrate, acc)| {
            let summary = SubstrateSummary {
                count: acc.count,
                successful_count: acc.successful,
                colonized_count: acc.colonized,
                avg_days_to_colonization: mean(acc.colonization_days_sum, acc.colonized),
                success_rate_pct: success_rate(acc.count, acc.count - acc.successful),
            };
            (substrate, summary)
        })
        .collect()
}

/// Counts records per status. Statuses absent from the input are absent
/// from the map.
pub fn status_distribution(experiments: &[Experiment]) -> BTreeMap<ExperimentStatus, u64> {
    let mut counts = BTreeMap::new();
    for experiment in experiments {
        *counts.entry(experiment.status).or_insert(0) += 1;
    }
    counts
}

/// Running total of records by inoculation date, oldest date first.
pub fn cumulative_timeline(experiments: &[Experiment]) -> Vec<TimelinePoint> {
    let mut per_date: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for experiment in experiments {
        *per_date.entry(experiment.inoculation_date).or_insert(0) += 1;
    }

    let mut running = 0;
    per_date
        .into_iter()
        .map(|(date, count)| {
            running += count;
            TimelinePoint {
                date,
                count,
                cumulative_count: running,
            }
        })
        .collect()
}

/// Summarizes total, colonization speed and contamination over a record set.
pub fn analytics_summary(experiments: &[Experiment]) -> AnalyticsSummary {
    let total = experiments.len() as u64;
    let contaminated_count = experiments
        .iter()
        .filter(|experiment| !experiment.status.is_successful())
        .count() as u64;

    let (days_sum, colonized) = experiments
        .iter()
        .filter_map(days_to_colonization)
        .fold((0_i64, 0_u64), |(sum, n), days| (sum + days, n + 1));

    let contamination_rate_pct = if total == 0 {
        0.0
    } else {
        round1(contaminated_count as f64 / total as f64 * 100.0)
    };

    AnalyticsSummary {
        total,
        avg_days_to_colonization: mean(days_sum, colonized),
        contaminated_count,
        success_rate_pct: success_rate(total, contaminated_count),
        contamination_rate_pct,
    }
}

fn mean(sum: i64, count: u64) -> Option<f64> {
    if count == 0 {
        return None;
    }
    Some(round1(sum as f64 / count as f64))
}
