//! `covid-regress` library crate.
//!
//! The binary (`creg`) is a thin wrapper around this library so that:
//!
//! - the estimators are testable without spawning processes
//! - the fit / lasso pipelines can be driven from other tools
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod report;
