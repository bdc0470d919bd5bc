//! Experiment domain model.
//!
//! # Responsibility
//! - Define the canonical experiment record and its lifecycle status.
//! - Provide typed create (`NewExperiment`) and partial update
//!   (`ExperimentPatch`) requests in place of free-form field maps.
//!
//! # Invariants
//! - `id` and `created_at` are assigned by the store and never updated.
//! - Only `experiment_name`, `substrate_type`, `inoculation_date` and
//!   `status` are required; everything else is optional.
//! - Status transitions are unrestricted; ordering is used for reporting only.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned experiment identifier.
pub type ExperimentId = i64;

/// Substrate names offered by entry forms. The store accepts any text.
pub const KNOWN_SUBSTRATES: &[&str] = &[
    "cardboard",
    "coffee grounds",
    "straw",
    "sawdust pellets",
    "mix",
    "other",
];

/// Container names offered by entry forms. The store accepts any text.
pub const KNOWN_CONTAINERS: &[&str] = &["bucket", "bag", "jar", "other"];

/// Cultivation lifecycle state, declared in lifecycle order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    /// Spawn mixed into substrate.
    Inoculating,
    /// Mycelium spreading through the substrate.
    Colonizing,
    /// Primordia forming.
    Pinning,
    /// Mushrooms growing to harvest.
    Fruiting,
    /// Finished run.
    Done,
    /// Lost to contamination.
    Contaminated,
}

impl ExperimentStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [ExperimentStatus; 6] = [
        Self::Inoculating,
        Self::Colonizing,
        Self::Pinning,
        Self::Fruiting,
        Self::Done,
        Self::Contaminated,
    ];

    /// Storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inoculating => "inoculating",
            Self::Colonizing => "colonizing",
            Self::Pinning => "pinning",
            Self::Fruiting => "fruiting",
            Self::Done => "done",
            Self::Contaminated => "contaminated",
        }
    }

    /// Parses the storage representation; surrounding whitespace and case
    /// are ignored.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "inoculating" => Some(Self::Inoculating),
            "colonizing" => Some(Self::Colonizing),
            "pinning" => Some(Self::Pinning),
            "fruiting" => Some(Self::Fruiting),
            "done" => Some(Self::Done),
            "contaminated" => Some(Self::Contaminated),
            _ => None,
        }
    }

    /// Human-readable label for report headers.
    pub fn label(self) -> &'static str {
        match self {
            Self::Inoculating => "Inoculating",
            Self::Colonizing => "Colonizing",
            Self::Pinning => "Pinning",
            Self::Fruiting => "Fruiting",
            Self::Done => "Done",
            Self::Contaminated => "Contaminated",
        }
    }

    /// Active runs are neither finished nor contaminated.
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Done | Self::Contaminated)
    }

    /// Any run that did not end up contaminated counts as successful.
    pub fn is_successful(self) -> bool {
        self != Self::Contaminated
    }
}

impl Display for ExperimentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted experiment record.
///
/// `status` is decoded strictly: a stored value outside
/// [`ExperimentStatus::ALL`] fails the whole read with
/// `RepoError::InvalidData` instead of being dropped or coerced, so a bad
/// row is reported rather than silently skewing counts. The raw text is
/// always available through [`ExperimentStatus::as_str`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub id: ExperimentId,
    pub experiment_name: String,
    pub substrate_type: String,
    pub substrate_details: Option<String>,
    /// Spawn percentage by weight.
    pub spawn_ratio: Option<f64>,
    pub substrate_weight_kg: Option<f64>,
    pub container_type: Option<String>,
    pub inoculation_date: NaiveDate,
    pub colonization_date: Option<NaiveDate>,
    pub first_pin_date: Option<NaiveDate>,
    pub status: ExperimentStatus,
    /// Meaningful only when `status == Contaminated`; not enforced.
    pub contamination_type: Option<String>,
    pub contamination_notes: Option<String>,
    pub notes: Option<String>,
    /// Insertion time in UTC, second precision.
    pub created_at: NaiveDateTime,
}

/// Create request for one experiment.
///
/// The four required fields are constructor arguments; optional fields are
/// set directly on the struct.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExperiment {
    pub experiment_name: String,
    pub substrate_type: String,
    pub substrate_details: Option<String>,
    pub spawn_ratio: Option<f64>,
    pub substrate_weight_kg: Option<f64>,
    pub container_type: Option<String>,
    pub inoculation_date: NaiveDate,
    pub colonization_date: Option<NaiveDate>,
    pub first_pin_date: Option<NaiveDate>,
    pub status: ExperimentStatus,
    pub contamination_type: Option<String>,
    pub contamination_notes: Option<String>,
    pub notes: Option<String>,
    /// Import paths may carry an original timestamp; `None` lets the store
    /// stamp the current time.
    pub created_at: Option<NaiveDateTime>,
}

impl NewExperiment {
    /// Creates a request with all optional fields unset.
    pub fn new(
        experiment_name: impl Into<String>,
        substrate_type: impl Into<String>,
        inoculation_date: NaiveDate,
        status: ExperimentStatus,
    ) -> Self {
        Self {
            experiment_name: experiment_name.into(),
            substrate_type: substrate_type.into(),
            substrate_details: None,
            spawn_ratio: None,
            substrate_weight_kg: None,
            container_type: None,
            inoculation_date,
            colonization_date: None,
            first_pin_date: None,
            status,
            contamination_type: None,
            contamination_notes: None,
            notes: None,
            created_at: None,
        }
    }

    /// Checks the fields the store itself requires.
    ///
    /// Only presence is checked here; domain rules such as future dates are
    /// left to [`NewExperiment::validate_for_entry`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("experiment_name", &self.experiment_name)?;
        require_text("substrate_type", &self.substrate_type)?;
        Ok(())
    }

    /// Runs entry-form checks and returns every problem found.
    ///
    /// An empty result means the request is acceptable for a user-facing
    /// create. `today` is the caller's notion of the current date.
    pub fn validate_for_entry(&self, today: NaiveDate) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if let Err(err) = require_text("experiment_name", &self.experiment_name) {
            errors.push(err);
        }
        if let Err(err) = require_text("substrate_type", &self.substrate_type) {
            errors.push(err);
        }
        if self.inoculation_date > today {
            errors.push(ValidationError::FutureDate {
                field: "inoculation_date",
                date: self.inoculation_date,
            });
        }
        if let Some(err) = non_positive("spawn_ratio", self.spawn_ratio) {
            errors.push(err);
        }
        if let Some(err) = non_positive("substrate_weight_kg", self.substrate_weight_kg) {
            errors.push(err);
        }
        errors
    }
}

/// Updatable columns of the `experiments` table.
///
/// This is the complete allow-list for partial updates; `id` and
/// `created_at` are deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExperimentField {
    ExperimentName,
    SubstrateType,
    SubstrateDetails,
    SpawnRatio,
    SubstrateWeightKg,
    ContainerType,
    InoculationDate,
    ColonizationDate,
    FirstPinDate,
    Status,
    ContaminationType,
    ContaminationNotes,
    Notes,
}

impl ExperimentField {
    /// Column name in the `experiments` table.
    pub fn column(self) -> &'static str {
        match self {
            Self::ExperimentName => "experiment_name",
            Self::SubstrateType => "substrate_type",
            Self::SubstrateDetails => "substrate_details",
            Self::SpawnRatio => "spawn_ratio",
            Self::SubstrateWeightKg => "substrate_weight_kg",
            Self::ContainerType => "container_type",
            Self::InoculationDate => "inoculation_date",
            Self::ColonizationDate => "colonization_date",
            Self::FirstPinDate => "first_pin_date",
            Self::Status => "status",
            Self::ContaminationType => "contamination_type",
            Self::ContaminationNotes => "contamination_notes",
            Self::Notes => "notes",
        }
    }
}

/// Value assigned to one column by a partial update.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(Option<String>),
    Real(Option<f64>),
    Date(Option<NaiveDate>),
    Status(ExperimentStatus),
}

/// Partial update request.
///
/// `None` leaves a column untouched. For nullable columns the inner option
/// selects between setting a value and clearing it to NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExperimentPatch {
    pub experiment_name: Option<String>,
    pub substrate_type: Option<String>,
    pub substrate_details: Option<Option<String>>,
    pub spawn_ratio: Option<Option<f64>>,
    pub substrate_weight_kg: Option<Option<f64>>,
    pub container_type: Option<Option<String>>,
    pub inoculation_date: Option<NaiveDate>,
    pub colonization_date: Option<Option<NaiveDate>>,
    pub first_pin_date: Option<Option<NaiveDate>>,
    pub status: Option<ExperimentStatus>,
    pub contamination_type: Option<Option<String>>,
    pub contamination_notes: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

impl ExperimentPatch {
    /// Returns whether no column would be assigned.
    pub fn is_empty(&self) -> bool {
        self.assignments().is_empty()
    }

    /// Rejects blanking required text columns.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = self.experiment_name.as_deref() {
            require_text("experiment_name", name)?;
        }
        if let Some(substrate) = self.substrate_type.as_deref() {
            require_text("substrate_type", substrate)?;
        }
        Ok(())
    }

    /// Lists `(column, value)` pairs in a stable column order.
    pub fn assignments(&self) -> Vec<(ExperimentField, FieldValue)> {
        let mut out = Vec::new();
        if let Some(value) = &self.experiment_name {
            out.push((
                ExperimentField::ExperimentName,
                FieldValue::Text(Some(value.clone())),
            ));
        }
        if let Some(value) = &self.substrate_type {
            out.push((
                ExperimentField::SubstrateType,
                FieldValue::Text(Some(value.clone())),
            ));
        }
        if let Some(value) = &self.substrate_details {
            out.push((
                ExperimentField::SubstrateDetails,
                FieldValue::Text(value.clone()),
            ));
        }
        if let Some(value) = self.spawn_ratio {
            out.push((ExperimentField::SpawnRatio, FieldValue::Real(value)));
        }
        if let Some(value) = self.substrate_weight_kg {
            out.push((ExperimentField::SubstrateWeightKg, FieldValue::Real(value)));
        }
        if let Some(value) = &self.container_type {
            out.push((
                ExperimentField::ContainerType,
                FieldValue::Text(value.clone()),
            ));
        }
        if let Some(value) = self.inoculation_date {
            out.push((
                ExperimentField::InoculationDate,
                FieldValue::Date(Some(value)),
            ));
        }
        if let Some(value) = self.colonization_date {
            out.push((ExperimentField::ColonizationDate, FieldValue::Date(value)));
        }
        if let Some(value) = self.first_pin_date {
            out.push((ExperimentField::FirstPinDate, FieldValue::Date(value)));
        }
        if let Some(value) = self.status {
            out.push((ExperimentField::Status, FieldValue::Status(value)));
        }
        if let Some(value) = &self.contamination_type {
            out.push((
                ExperimentField::ContaminationType,
                FieldValue::Text(value.clone()),
            ));
        }
        if let Some(value) = &self.contamination_notes {
            out.push((
                ExperimentField::ContaminationNotes,
                FieldValue::Text(value.clone()),
            ));
        }
        if let Some(value) = &self.notes {
            out.push((ExperimentField::Notes, FieldValue::Text(value.clone())));
        }
        out
    }
}

/// Caller-side data problems on experiment input.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A required field is absent or blank.
    MissingField(&'static str),
    /// Date text is not `YYYY-MM-DD`.
    InvalidDate { field: &'static str, value: String },
    /// A date lies after the reference date.
    FutureDate { field: &'static str, date: NaiveDate },
    /// A quantity that must be positive is zero or negative.
    NonPositive { field: &'static str, value: f64 },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field: {field}"),
            Self::InvalidDate { field, value } => {
                write!(f, "invalid date `{value}` for {field} (expected YYYY-MM-DD)")
            }
            Self::FutureDate { field, date } => {
                write!(f, "{field} cannot be in the future: {date}")
            }
            Self::NonPositive { field, value } => {
                write!(f, "{field} must be positive, got {value}")
            }
        }
    }
}

impl Error for ValidationError {}

fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

fn non_positive(field: &'static str, value: Option<f64>) -> Option<ValidationError> {
    match value {
        Some(value) if value <= 0.0 || value.is_nan() => {
            Some(ValidationError::NonPositive { field, value })
        }
        _ => None,
    }
}
