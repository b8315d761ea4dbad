//! Error types.
//!
//! - `FitError`: typed failures raised by the regression core. Every variant
//!   is terminal for the fit call that produced it.
//! - `AppError`: what the `creg` binary reports (message + process exit code).

use thiserror::Error;

/// Failures raised by the solvers, fitters and the lasso selector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// The (weighted) design matrix is not of full column rank.
    #[error("Singular design matrix: rank {rank} < {columns} columns (collinear or duplicate predictors)")]
    SingularDesign { rank: usize, columns: usize },

    /// A WLS weight derived from the OLS fit would be undefined or negative.
    #[error("Non-positive OLS fitted value {fitted} at row {index}: inverse weight is undefined")]
    NonPositiveWeight { index: usize, fitted: f64 },

    #[error("Cannot split {observations} observations into {folds} folds")]
    InsufficientFoldSize { folds: usize, observations: usize },

    #[error("Lasso path is empty: all coefficients are zero at every one of {candidates} candidate lambda values")]
    EmptyPredictorSet { candidates: usize },

    #[error("Fold count must be at least 2, got {folds}")]
    InvalidFoldCount { folds: usize },

    #[error("Not enough data: {n_samples} observations for {n_params} parameters")]
    InsufficientData { n_samples: usize, n_params: usize },

    #[error("Unknown column: `{0}`")]
    UnknownColumn(String),

    #[error("Duplicate column: `{0}`")]
    DuplicateColumn(String),

    #[error("Missing or non-finite value in column `{column}` at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("Length mismatch for `{column}`: expected {expected}, found {found}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Dataset has no rows")]
    EmptyDataset,

    #[error("Invalid weight {weight} at row {index} (weights must be finite and >= 0)")]
    InvalidWeight { index: usize, weight: f64 },

    #[error("Invalid lambda {0} (must be finite and >= 0)")]
    InvalidLambda(f64),

    #[error("Invalid lambda grid: {0}")]
    InvalidLambdaGrid(String),

    #[error("Significance level must lie in (0, 1), got {0}")]
    InvalidSignificance(f64),

    #[error("Joint hypothesis needs at least one coefficient")]
    EmptyHypothesis,

    #[error("Coefficient `{0}` is not a predictor of this model")]
    UnknownCoefficient(String),

    #[error("Diagnostics need an OLS or WLS fit with inference statistics")]
    DiagnosticsUnavailable,

    #[error("Coordinate descent did not converge at lambda={lambda} after {max_iter} sweeps")]
    NotConverged { lambda: f64, max_iter: usize },

    #[error("Distribution error: {0}")]
    Distribution(String),
}

impl FitError {
    /// Exit code used when the error reaches the binary.
    ///
    /// - 2: invalid input or configuration
    /// - 3: not enough data
    /// - 4: numerical failure
    pub fn exit_code(&self) -> u8 {
        match self {
            FitError::InsufficientFoldSize { .. }
            | FitError::InsufficientData { .. }
            | FitError::EmptyDataset => 3,
            FitError::SingularDesign { .. }
            | FitError::NonPositiveWeight { .. }
            | FitError::EmptyPredictorSet { .. }
            | FitError::NotConverged { .. }
            | FitError::Distribution(_) => 4,
            _ => 2,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
