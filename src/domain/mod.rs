//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the immutable input table (`Dataset`)
//! - fit outputs (`FittedModel`, `DiagnosticSet`, `JointTest`)
//! - lasso selection outputs (`CrossValidationResult`, `LassoPath`, `LassoSelection`)
//! - resolved run configuration (`FitConfig`, `LassoConfig`)

pub mod config;
pub mod dataset;
pub mod types;

pub use config::*;
pub use dataset::*;
pub use types::*;
