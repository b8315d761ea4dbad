//! Numerical core: weighted least squares, L1-penalized least squares and the
//! distribution tails used for inference.

pub mod dist;
pub mod lasso;
pub mod ols;

pub use dist::*;
pub use lasso::*;
pub use ols::*;
