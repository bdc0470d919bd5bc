//! Experiment table definition and idempotent initializer.
//!
//! # Invariants
//! - Every statement is written with `IF NOT EXISTS`; databases created by
//!   earlier tooling are adopted as-is.
//! - Initialization never drops or rewrites existing rows.

use crate::db::DbResult;
use rusqlite::Connection;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Ensures the `experiments` table and its listing index exist.
///
/// Safe to call on every startup.
pub fn initialize(conn: &mut Connection) -> DbResult<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.commit()?;
    Ok(())
}
