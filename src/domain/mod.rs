//! Domain layer for the cielo learning-path planner
//!
//! This module contains the core models, errors, and the port traits that
//! adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
