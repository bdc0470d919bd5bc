//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and reporting into use-case level APIs.
//! - Keep presentation layers decoupled from storage details.

pub mod experiment_service;
