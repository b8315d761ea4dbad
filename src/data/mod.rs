//! Data sources that do not come from disk.
//!
//! - `synthetic`: seeded synthetic datasets with known coefficients

pub mod synthetic;

pub use synthetic::*;
