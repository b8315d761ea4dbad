//! Model fitting.
//!
//! Responsibilities:
//!
//! - OLS / WLS fits with inference, diagnostics and joint F-tests
//! - fold assignment, λ sequences and path cross-validation for the lasso
//! - `λ_min` selection, refit and application to a disjoint slice

pub mod cross_validation;
pub mod diagnostics;
pub mod folds;
pub mod hypothesis;
pub mod lambda_grid;
pub mod regression;
pub mod selection;

pub use cross_validation::*;
pub use diagnostics::*;
pub use folds::*;
pub use hypothesis::*;
pub use lambda_grid::*;
pub use regression::*;
pub use selection::*;
