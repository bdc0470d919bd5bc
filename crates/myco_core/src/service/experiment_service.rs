//! Experiment use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD entry points for host applications.
//! - Assemble dashboard and analytics view models from store, filter and
//!   statistics layers.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Day-based values are computed against the injected clock only.

use crate::calc::days_elapsed;
use crate::clock::Clock;
use crate::model::experiment::{
    Experiment, ExperimentId, ExperimentPatch, ExperimentStatus, NewExperiment,
};
use crate::query::filter::ExperimentFilter;
use crate::repo::experiment_repo::{ExperimentRepository, RepoResult};
use crate::stats::{
    analytics_summary, cumulative_timeline, group_by_substrate, status_distribution,
    AnalyticsSummary, SubstrateSummary, SummaryStats, TimelinePoint,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Number of rows shown in the dashboard's recent list.
pub const DASHBOARD_RECENT_LIMIT: u32 = 5;

/// Dashboard row for one recent experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentRow {
    pub id: ExperimentId,
    pub experiment_name: String,
    pub substrate_type: String,
    pub status: ExperimentStatus,
    pub inoculation_date: NaiveDate,
    pub days_elapsed: Option<i64>,
}

/// Landing page view model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub stats: SummaryStats,
    pub recent: Vec<RecentRow>,
}

/// Browse view result: matching rows plus the unfiltered total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrowseResult {
    pub total: usize,
    pub rows: Vec<(Experiment, Option<i64>)>,
}

/// Analytics view model over a filtered record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub summary: AnalyticsSummary,
    pub status_distribution: BTreeMap<ExperimentStatus, u64>,
    pub by_substrate: BTreeMap<String, SubstrateSummary>,
    pub timeline: Vec<TimelinePoint>,
}

/// Use-case service wrapper for experiment operations.
pub struct ExperimentService<R: ExperimentRepository> {
    repo: R,
}

impl<R: ExperimentRepository> ExperimentService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create(&self, experiment: &NewExperiment) -> RepoResult<ExperimentId> {
        self.repo.create_experiment(experiment)
    }

    pub fn get(&self, id: ExperimentId) -> RepoResult<Option<Experiment>> {
        self.repo.get_experiment(id)
    }

    pub fn list(&self) -> RepoResult<Vec<Experiment>> {
        self.repo.list_experiments()
    }

    pub fn list_by_status(&self, status: ExperimentStatus) -> RepoResult<Vec<Experiment>> {
        self.repo.list_by_status(status)
    }

    /// Returns whether a row was affected; unknown ids and empty patches
    /// are reported as `false`.
    pub fn update(&self, id: ExperimentId, patch: &ExperimentPatch) -> RepoResult<bool> {
        self.repo.update_experiment(id, patch)
    }

    /// Moves one experiment to a new status, leaving every other column as is.
    pub fn set_status(&self, id: ExperimentId, status: ExperimentStatus) -> RepoResult<bool> {
        let patch = ExperimentPatch {
            status: Some(status),
            ..ExperimentPatch::default()
        };
        self.repo.update_experiment(id, &patch)
    }

    pub fn delete(&self, id: ExperimentId) -> RepoResult<bool> {
        self.repo.delete_experiment(id)
    }

    pub fn stats(&self) -> RepoResult<SummaryStats> {
        self.repo.summary_stats()
    }

    /// Builds the landing page: summary counts plus the newest records with
    /// days since inoculation.
    pub fn dashboard(&self, clock: &dyn Clock) -> RepoResult<Dashboard> {
        let today = clock.today();
        let stats = self.repo.summary_stats()?;
        let recent = self
            .repo
            .recent_experiments(DASHBOARD_RECENT_LIMIT)?
            .into_iter()
            .map(|experiment| RecentRow {
                id: experiment.id,
                days_elapsed: days_elapsed(Some(experiment.inoculation_date), today),
                experiment_name: experiment.experiment_name,
                substrate_type: experiment.substrate_type,
                status: experiment.status,
                inoculation_date: experiment.inoculation_date,
            })
            .collect();
        Ok(Dashboard { stats, recent })
    }

    /// Loads every record, applies `filter` and attaches days elapsed.
    pub fn browse(
        &self,
        filter: &ExperimentFilter,
        clock: &dyn Clock,
    ) -> RepoResult<BrowseResult> {
        let today = clock.today();
        let all = self.repo.list_experiments()?;
        let rows = filter
            .apply(&all)
            .into_iter()
            .map(|experiment| {
                let elapsed = days_elapsed(Some(experiment.inoculation_date), today);
                (experiment, elapsed)
            })
            .collect();
        Ok(BrowseResult {
            total: all.len(),
            rows,
        })
    }

    /// Loads every record, applies `filter` and computes all analytics
    /// aggregates over the result.
    pub fn analytics(&self, filter: &ExperimentFilter) -> RepoResult<AnalyticsReport> {
        let filtered = filter.apply(&self.repo.list_experiments()?);
        Ok(build_analytics_report(&filtered))
    }
}

/// Computes every analytics aggregate over an already filtered set.
pub fn build_analytics_report(experiments: &[Experiment]) -> AnalyticsReport {
    AnalyticsReport {
        summary: analytics_summary(experiments),
        status_distribution: status_distribution(experiments),
        by_substrate: group_by_substrate(experiments),
        timeline: cumulative_timeline(experiments),
    }
}
