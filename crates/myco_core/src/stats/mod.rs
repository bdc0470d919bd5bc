//! Statistics and aggregation engine.
//!
//! # Responsibility
//! - Shape (possibly pre-filtered) record sets into summary counts and
//!   chart-ready aggregates.
//!
//! # Invariants
//! - Pure functions over slices; no storage access.
//! - "Successful" means any status other than `contaminated`.

pub mod aggregate;
pub mod summary;

pub use aggregate::{
    analytics_summary, cumulative_timeline, group_by_substrate, status_distribution,
    AnalyticsSummary, SubstrateSummary, TimelinePoint,
};
pub use summary::SummaryStats;
