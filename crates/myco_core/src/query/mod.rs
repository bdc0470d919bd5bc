//! In-memory query and filter engine for browsing and analytics views.
//!
//! # Responsibility
//! - Narrow a full record set with composable, side-effect free predicates.
//!
//! # Invariants
//! - No storage access happens here.
//! - Input order is preserved in the output.

pub mod filter;
