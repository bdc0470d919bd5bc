//! Experiment filter specification and evaluation.
//!
//! # Responsibility
//! - Match records by status, substrate, name substring and inoculation
//!   date range.
//!
//! # Invariants
//! - Predicates are ANDed and commute; applying a filter twice equals
//!   applying it once.
//! - An empty status or substrate set, an absent or empty search term and
//!   a half-open date range each mean "no filtering" for that predicate.
//! - Search terms are matched verbatim apart from case; whitespace counts.

use crate::model::experiment::{Experiment, ExperimentStatus};
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Inclusive inoculation date bounds.
///
/// Filtering only applies when both bounds are present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Creates a closed range.
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Returns whether `date` passes this range.
    ///
    /// A range with `start > end` matches nothing.
    pub fn contains(&self, date: NaiveDate) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= date && date <= end,
            _ => true,
        }
    }
}

/// Filter specification shared by the browse and analytics views.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExperimentFilter {
    /// Keep only these statuses; empty keeps all.
    pub statuses: BTreeSet<ExperimentStatus>,
    /// Keep only these substrate types (exact match); empty keeps all.
    pub substrates: BTreeSet<String>,
    /// Case-insensitive substring of `experiment_name`.
    pub name_search: Option<String>,
    pub date_range: DateRange,
    /// Analytics view toggle: drop contaminated runs.
    pub exclude_contaminated: bool,
}

impl ExperimentFilter {
    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = ExperimentStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    pub fn with_substrates<S: Into<String>>(
        mut self,
        substrates: impl IntoIterator<Item = S>,
    ) -> Self {
        self.substrates = substrates.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_name_search(mut self, term: impl Into<String>) -> Self {
        self.name_search = Some(term.into());
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = range;
        self
    }

    pub fn excluding_contaminated(mut self) -> Self {
        self.exclude_contaminated = true;
        self
    }

    /// Returns whether one record passes every active predicate.
    pub fn matches(&self, experiment: &Experiment) -> bool {
        self.matches_status(experiment)
            && self.matches_substrate(experiment)
            && self.matches_name(experiment)
            && self.date_range.contains(experiment.inoculation_date)
    }

    /// Returns the matching records in input order.
    pub fn apply(&self, experiments: &[Experiment]) -> Vec<Experiment> {
        let needle = self.normalized_search();
        experiments
            .iter()
            .filter(|experiment| {
                self.matches_status(experiment)
                    && self.matches_substrate(experiment)
                    && name_contains(experiment, needle.as_deref())
                    && self.date_range.contains(experiment.inoculation_date)
            })
            .cloned()
            .collect()
    }

    fn matches_status(&self, experiment: &Experiment) -> bool {
        if self.exclude_contaminated && experiment.status == ExperimentStatus::Contaminated {
            return false;
        }
        self.statuses.is_empty() || self.statuses.contains(&experiment.status)
    }

    fn matches_substrate(&self, experiment: &Experiment) -> bool {
        self.substrates.is_empty() || self.substrates.contains(&experiment.substrate_type)
    }

    fn matches_name(&self, experiment: &Experiment) -> bool {
        name_contains(experiment, self.normalized_search().as_deref())
    }

    fn normalized_search(&self) -> Option<String> {
        self.name_search
            .as_deref()
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }
}

/// Filters `experiments` by `filter`; see [`ExperimentFilter::apply`].
pub fn filter_experiments(
    experiments: &[Experiment],
    filter: &ExperimentFilter,
) -> Vec<Experiment> {
    filter.apply(experiments)
}

fn name_contains(experiment: &Experiment, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) => experiment.experiment_name.to_lowercase().contains(needle),
        None => true,
    }
}
