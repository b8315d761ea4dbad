//! Resolved run configuration (after CLI / environment parsing).

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::Dataset;
use crate::error::FitError;
use crate::fit::CvOptions;

/// Transformation applied to the response column before fitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseTransform {
    #[default]
    Identity,
    /// Square root, the variance-stabilizing choice for count-like rates.
    Sqrt,
}

impl ResponseTransform {
    /// Return the dataset with the transformed response and its column name.
    ///
    /// `Sqrt` adds a `sqrt_<response>` column; negative values fail as
    /// missing, since their root is undefined.
    pub fn apply(self, dataset: &Dataset, response: &str) -> Result<(Dataset, String), FitError> {
        match self {
            ResponseTransform::Identity => Ok((dataset.clone(), response.to_string())),
            ResponseTransform::Sqrt => {
                let target = format!("sqrt_{response}");
                let derived = dataset.map_column(response, target.clone(), f64::sqrt)?;
                Ok((derived, target))
            }
        }
    }
}

/// Configuration of a `creg fit` run.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub csv_path: PathBuf,
    pub response: String,
    pub predictors: Vec<String>,
    pub transform: ResponseTransform,
    pub weighted: bool,
    /// Coefficients for the joint F-test; empty skips the test.
    pub test_terms: Vec<String>,
    pub alpha: f64,
    pub confidence: Option<f64>,
    pub diagnostics: bool,
    pub top_n: usize,
    pub export_json: Option<PathBuf>,
}

/// Configuration of a `creg lasso` run.
#[derive(Debug, Clone)]
pub struct LassoConfig {
    pub csv_path: PathBuf,
    pub response: String,
    pub predictors: Vec<String>,
    pub transform: ResponseTransform,
    /// Column that separates the training slice (`< split_at`) from the
    /// application slice (`>= split_at`).
    pub split_column: String,
    pub split_at: f64,
    pub cv: CvOptions,
    pub export_json: Option<PathBuf>,
    pub export_predictions: Option<PathBuf>,
}
