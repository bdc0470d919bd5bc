//! Experiment repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, status listing and summary counts over `experiments`.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths validate required fields before any SQL runs.
//! - Partial updates only assign columns from the `ExperimentField`
//!   allow-list; caller text never reaches the SQL string.
//! - Listings are ordered newest first (`created_at DESC`, then `id DESC`).
//! - Read paths reject undecodable persisted rows instead of masking them.

use crate::calc::parse_iso_date;
use crate::db::DbError;
use crate::model::experiment::{
    Experiment, ExperimentId, ExperimentPatch, ExperimentStatus, FieldValue, NewExperiment,
    ValidationError,
};
use crate::stats::SummaryStats;
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const EXPERIMENT_SELECT_SQL: &str = "SELECT
    id,
    experiment_name,
    substrate_type,
    substrate_details,
    spawn_ratio,
    substrate_weight_kg,
    container_type,
    inoculation_date,
    colonization_date,
    first_pin_date,
    status,
    contamination_type,
    contamination_notes,
    notes,
    created_at
FROM experiments";

const NEWEST_FIRST_SQL: &str = " ORDER BY created_at DESC, id DESC";

const REQUIRED_COLUMNS: &[&str] = &[
    "id",
    "experiment_name",
    "substrate_type",
    "substrate_details",
    "spawn_ratio",
    "substrate_weight_kg",
    "container_type",
    "inoculation_date",
    "colonization_date",
    "first_pin_date",
    "status",
    "contamination_type",
    "contamination_notes",
    "notes",
    "created_at",
];

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for experiment persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Caller input rejected before touching storage.
    Validation(ValidationError),
    /// Underlying storage failure; the enclosing transaction was rolled back.
    Db(DbError),
    /// A persisted row could not be decoded.
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted experiment data: {message}")
            }
            Self::MissingRequiredTable(table) => {
                write!(f, "missing required table `{table}`; open it with db::open_db")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_)
            | Self::MissingRequiredTable(_)
            | Self::MissingRequiredColumn { .. } => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for experiment records.
pub trait ExperimentRepository {
    /// Inserts one record and returns its new id.
    fn create_experiment(&self, experiment: &NewExperiment) -> RepoResult<ExperimentId>;
    /// Returns every record, newest first.
    fn list_experiments(&self) -> RepoResult<Vec<Experiment>>;
    /// Returns the first `limit` records of [`Self::list_experiments`].
    fn recent_experiments(&self, limit: u32) -> RepoResult<Vec<Experiment>>;
    fn get_experiment(&self, id: ExperimentId) -> RepoResult<Option<Experiment>>;
    /// Applies a partial update; returns whether a row was affected.
    fn update_experiment(&self, id: ExperimentId, patch: &ExperimentPatch) -> RepoResult<bool>;
    /// Permanently removes a record; returns whether it existed.
    fn delete_experiment(&self, id: ExperimentId) -> RepoResult<bool>;
    /// Returns records with the given status, newest first.
    fn list_by_status(&self, status: ExperimentStatus) -> RepoResult<Vec<Experiment>>;
    /// Returns dashboard counts over the whole table.
    fn summary_stats(&self) -> RepoResult<SummaryStats>;
}

/// SQLite-backed experiment repository.
pub struct SqliteExperimentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteExperimentRepository<'conn> {
    /// Constructs a repository from an initialized connection.
    ///
    /// Connections without a complete `experiments` table are rejected; run
    /// [`crate::db::initialize`] (or open through [`crate::db::open_db`]) first.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn begin(&self, behavior: TransactionBehavior) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(self.conn, behavior)?)
    }
}

impl ExperimentRepository for SqliteExperimentRepository<'_> {
    fn create_experiment(&self, experiment: &NewExperiment) -> RepoResult<ExperimentId> {
        experiment.validate()?;

        let tx = self.begin(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO experiments (
                experiment_name,
                substrate_type,
                substrate_details,
                spawn_ratio,
                substrate_weight_kg,
                container_type,
                inoculation_date,
                colonization_date,
                first_pin_date,
                status,
                contamination_type,
                contamination_notes,
                notes,
                created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                COALESCE(?14, CURRENT_TIMESTAMP)
            );",
            params![
                experiment.experiment_name.as_str(),
                experiment.substrate_type.as_str(),
                experiment.substrate_details.as_deref(),
                experiment.spawn_ratio,
                experiment.substrate_weight_kg,
                experiment.container_type.as_deref(),
                date_to_db(experiment.inoculation_date),
                experiment.colonization_date.map(date_to_db),
                experiment.first_pin_date.map(date_to_db),
                experiment.status.as_str(),
                experiment.contamination_type.as_deref(),
                experiment.contamination_notes.as_deref(),
                experiment.notes.as_deref(),
                experiment.created_at.map(timestamp_to_db),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!("event=experiment_create module=repo status=ok id={id}");
        Ok(id)
    }

    fn list_experiments(&self) -> RepoResult<Vec<Experiment>> {
        let tx = self.begin(TransactionBehavior::Deferred)?;
        let experiments = query_experiments(
            &tx,
            &format!("{EXPERIMENT_SELECT_SQL}{NEWEST_FIRST_SQL};"),
            Vec::new(),
        )?;
        tx.commit()?;
        Ok(experiments)
    }

    fn recent_experiments(&self, limit: u32) -> RepoResult<Vec<Experiment>> {
        let tx = self.begin(TransactionBehavior::Deferred)?;
        let experiments = query_experiments(
            &tx,
            &format!("{EXPERIMENT_SELECT_SQL}{NEWEST_FIRST_SQL} LIMIT ?;"),
            vec![Value::Integer(i64::from(limit))],
        )?;
        tx.commit()?;
        Ok(experiments)
    }

    fn get_experiment(&self, id: ExperimentId) -> RepoResult<Option<Experiment>> {
        let tx = self.begin(TransactionBehavior::Deferred)?;
        let mut found = query_experiments(
            &tx,
            &format!("{EXPERIMENT_SELECT_SQL} WHERE id = ?;"),
            vec![Value::Integer(id)],
        )?;
        tx.commit()?;
        Ok(found.pop())
    }

    fn update_experiment(&self, id: ExperimentId, patch: &ExperimentPatch) -> RepoResult<bool> {
        patch.validate()?;

        let assignments = patch.assignments();
        if assignments.is_empty() {
            debug!("event=experiment_update module=repo status=skipped reason=empty_patch id={id}");
            return Ok(false);
        }

        let set_clause = assignments
            .iter()
            .map(|(field, _)| format!("{} = ?", field.column()))
            .collect::<Vec<_>>()
            .join(", ");
        let mut bind_values = assignments
            .into_iter()
            .map(|(_, value)| field_value_to_db(value))
            .collect::<Vec<_>>();
        bind_values.push(Value::Integer(id));

        let tx = self.begin(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            &format!("UPDATE experiments SET {set_clause} WHERE id = ?;"),
            params_from_iter(bind_values),
        )?;
        tx.commit()?;

        info!(
            "event=experiment_update module=repo status=ok id={id} affected={}",
            changed > 0
        );
        Ok(changed > 0)
    }

    fn delete_experiment(&self, id: ExperimentId) -> RepoResult<bool> {
        let tx = self.begin(TransactionBehavior::Immediate)?;
        let changed = tx.execute("DELETE FROM experiments WHERE id = ?1;", [id])?;
        tx.commit()?;

        info!(
            "event=experiment_delete module=repo status=ok id={id} affected={}",
            changed > 0
        );
        Ok(changed > 0)
    }

    fn list_by_status(&self, status: ExperimentStatus) -> RepoResult<Vec<Experiment>> {
        let tx = self.begin(TransactionBehavior::Deferred)?;
        let experiments = query_experiments(
            &tx,
            &format!("{EXPERIMENT_SELECT_SQL} WHERE status = ?{NEWEST_FIRST_SQL};"),
            vec![Value::Text(status.as_str().to_string())],
        )?;
        tx.commit()?;
        Ok(experiments)
    }

    fn summary_stats(&self) -> RepoResult<SummaryStats> {
        let tx = self.begin(TransactionBehavior::Deferred)?;
        let (total, active, contaminated) = tx.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN status NOT IN ('done', 'contaminated') THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = 'contaminated' THEN 1 ELSE 0 END), 0)
             FROM experiments;",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )?;
        tx.commit()?;

        Ok(SummaryStats::from_counts(
            count_to_u64(total)?,
            count_to_u64(active)?,
            count_to_u64(contaminated)?,
        ))
    }
}

fn query_experiments(
    tx: &Transaction<'_>,
    sql: &str,
    bind_values: Vec<Value>,
) -> RepoResult<Vec<Experiment>> {
    let mut stmt = tx.prepare(sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut experiments = Vec::new();
    while let Some(row) = rows.next()? {
        experiments.push(parse_experiment_row(row)?);
    }
    Ok(experiments)
}

fn parse_experiment_row(row: &Row<'_>) -> RepoResult<Experiment> {
    let status_text: String = row.get("status")?;
    let status = ExperimentStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in experiments.status"
        ))
    })?;

    let inoculation_text: String = row.get("inoculation_date")?;
    let inoculation_date = parse_required_date(&inoculation_text, "inoculation_date")?;

    let created_text: String = row.get("created_at")?;
    let created_at = parse_timestamp(&created_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid timestamp `{created_text}` in experiments.created_at"
        ))
    })?;

    Ok(Experiment {
        id: row.get("id")?,
        experiment_name: row.get("experiment_name")?,
        substrate_type: row.get("substrate_type")?,
        substrate_details: row.get("substrate_details")?,
        spawn_ratio: row.get("spawn_ratio")?,
        substrate_weight_kg: row.get("substrate_weight_kg")?,
        container_type: row.get("container_type")?,
        inoculation_date,
        colonization_date: parse_optional_date(
            row.get::<_, Option<String>>("colonization_date")?,
            "colonization_date",
        )?,
        first_pin_date: parse_optional_date(
            row.get::<_, Option<String>>("first_pin_date")?,
            "first_pin_date",
        )?,
        status,
        contamination_type: row.get("contamination_type")?,
        contamination_notes: row.get("contamination_notes")?,
        notes: row.get("notes")?,
        created_at,
    })
}

fn parse_required_date(value: &str, column: &str) -> RepoResult<NaiveDate> {
    parse_iso_date(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid date `{value}` in experiments.{column}"))
    })
}

fn parse_optional_date(value: Option<String>, column: &str) -> RepoResult<Option<NaiveDate>> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => parse_required_date(text, column).map(Some),
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
}

fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn timestamp_to_db(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn field_value_to_db(value: FieldValue) -> Value {
    match value {
        FieldValue::Text(Some(text)) => Value::Text(text),
        FieldValue::Real(Some(number)) => Value::Real(number),
        FieldValue::Date(Some(date)) => Value::Text(date_to_db(date)),
        FieldValue::Status(status) => Value::Text(status.as_str().to_string()),
        FieldValue::Text(None) | FieldValue::Real(None) | FieldValue::Date(None) => Value::Null,
    }
}

fn count_to_u64(value: i64) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative row count `{value}`")))
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, "experiments")? {
        return Err(RepoError::MissingRequiredTable("experiments"));
    }

    for &column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "experiments", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "experiments",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
