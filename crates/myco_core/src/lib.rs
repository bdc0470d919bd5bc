//! Core record store and reporting logic for mushroom cultivation
//! experiments.
//!
//! Data flows one way: the SQLite store yields full record sets, the query
//! engine narrows them, and the statistics engine shapes them for display.

pub mod calc;
pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;
pub mod stats;
pub mod validation;

pub use calc::{
    biological_efficiency, days_elapsed, days_elapsed_str, days_to_colonization, format_date,
    format_weight, round1, success_rate, WeightUnit,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::experiment::{
    Experiment, ExperimentField, ExperimentId, ExperimentPatch, ExperimentStatus, NewExperiment,
    ValidationError, KNOWN_CONTAINERS, KNOWN_SUBSTRATES,
};
pub use query::filter::{filter_experiments, DateRange, ExperimentFilter};
pub use repo::experiment_repo::{
    ExperimentRepository, RepoError, RepoResult, SqliteExperimentRepository,
};
pub use service::experiment_service::{
    build_analytics_report, AnalyticsReport, BrowseResult, Dashboard, ExperimentService,
    RecentRow, DASHBOARD_RECENT_LIMIT,
};
pub use stats::{
    analytics_summary, cumulative_timeline, group_by_substrate, status_distribution,
    AnalyticsSummary, SubstrateSummary, SummaryStats, TimelinePoint,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
