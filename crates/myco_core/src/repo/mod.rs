//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for experiments.
//! - Isolate SQLite query details from service and reporting code.
//!
//! # Invariants
//! - Every repository call runs inside exactly one transaction and either
//!   commits fully or leaves storage untouched.
//! - Unknown ids on update/delete report "no effect" (`Ok(false)`), not an
//!   error.

pub mod experiment_repo;
