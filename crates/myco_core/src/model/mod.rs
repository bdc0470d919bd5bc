//! Domain model for cultivation experiment records.
//!
//! # Responsibility
//! - Define the persisted `Experiment` shape and its typed write requests.
//! - Own status lifecycle vocabulary shared by store, filters and reports.
//!
//! # Invariants
//! - Every record is identified by a store-assigned `ExperimentId`.
//! - Deletion is permanent; there are no tombstones.

pub mod experiment;
