//! Derived-field calculators.
//!
//! # Responsibility
//! - Compute day counts, success rates and biological efficiency from
//!   record fields.
//! - Format dates and weights for report tables.
//!
//! # Invariants
//! - Calculators never fail: absent or malformed input yields `None`
//!   (or `"N/A"` for formatters), so one bad row cannot break a report.
//! - Every reported percentage or average is rounded half away from zero
//!   to one decimal place via [`round1`].

use crate::model::experiment::Experiment;
use chrono::NaiveDate;

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";
const NOT_AVAILABLE: &str = "N/A";

/// Display unit for [`format_weight`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightUnit {
    #[default]
    Grams,
    Kilograms,
}

/// Rounds half away from zero to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Parses `YYYY-MM-DD` text.
///
/// A trailing time part (`YYYY-MM-DD HH:MM:SS` or `...T...`) is ignored so
/// comparisons stay on the calendar date.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, ISO_DATE_FORMAT) {
        return Some(date);
    }
    let (head, tail) = trimmed.split_at_checked(10)?;
    if !tail.starts_with([' ', 'T']) {
        return None;
    }
    NaiveDate::parse_from_str(head, ISO_DATE_FORMAT).ok()
}

/// Days from `date` to `reference`; `None` when `date` is absent.
///
/// Dates after `reference` give negative counts.
pub fn days_elapsed(date: Option<NaiveDate>, reference: NaiveDate) -> Option<i64> {
    date.map(|date| (reference - date).num_days())
}

/// Same as [`days_elapsed`] for raw date text; unparseable text is `None`.
pub fn days_elapsed_str(value: &str, reference: NaiveDate) -> Option<i64> {
    days_elapsed(parse_iso_date(value), reference)
}

/// Days between inoculation and observed full colonization.
pub fn days_to_colonization(experiment: &Experiment) -> Option<i64> {
    experiment
        .colonization_date
        .map(|colonized| (colonized - experiment.inoculation_date).num_days())
}

/// Successful share of `total` in percent; `0.0` when `total` is zero.
pub fn success_rate(total: u64, contaminated: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let successful = total.saturating_sub(contaminated);
    round1(successful as f64 / total as f64 * 100.0)
}

/// Biological efficiency: fresh harvest weight over dry substrate weight,
/// in percent.
///
/// `None` for non-positive substrate weight or negative harvest weight.
pub fn biological_efficiency(harvest_weight_grams: f64, substrate_weight_kg: f64) -> Option<f64> {
    if !harvest_weight_grams.is_finite() || !substrate_weight_kg.is_finite() {
        return None;
    }
    if substrate_weight_kg <= 0.0 || harvest_weight_grams < 0.0 {
        return None;
    }
    let substrate_weight_grams = substrate_weight_kg * 1000.0;
    Some(round1(harvest_weight_grams / substrate_weight_grams * 100.0))
}

/// Reformats `YYYY-MM-DD` text with a chrono pattern, or `"N/A"`.
pub fn format_date(value: Option<&str>, pattern: &str) -> String {
    match value.and_then(parse_iso_date) {
        Some(date) => date.format(pattern).to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Formats a gram weight; absent or negative weights render as `"N/A"`.
pub fn format_weight(weight_grams: Option<f64>, unit: WeightUnit) -> String {
    match weight_grams {
        Some(grams) if grams >= 0.0 => match unit {
            WeightUnit::Grams => format!("{grams:.1} g"),
            WeightUnit::Kilograms => format!("{:.2} kg", grams / 1000.0),
        },
        _ => NOT_AVAILABLE.to_string(),
    }
}
