//! Result value objects.
//!
//! These types are plain, serializable values created once by a fit call and
//! never mutated afterwards. Refitting produces a new value.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::domain::Dataset;
use crate::error::FitError;

/// Name used for the intercept term in coefficient tables.
pub const INTERCEPT: &str = "(Intercept)";

/// How WLS weights are derived from the first-stage OLS fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariancePolicy {
    /// Residual variance proportional to the OLS-predicted mean: `w_i = 1 / ŷ_i`.
    ///
    /// A fitted value `ŷ_i <= 0` has no valid inverse weight and fails the fit
    /// with `NonPositiveWeight`; it is never clipped.
    ProportionalToMean,
}

impl VariancePolicy {
    /// Derive one weight per fitted value.
    pub fn weights(self, fitted: &[f64]) -> Result<Vec<f64>, FitError> {
        match self {
            VariancePolicy::ProportionalToMean => fitted
                .iter()
                .enumerate()
                .map(|(index, &y_hat)| {
                    if y_hat > 0.0 {
                        Ok(1.0 / y_hat)
                    } else {
                        Err(FitError::NonPositiveWeight {
                            index,
                            fitted: y_hat,
                        })
                    }
                })
                .collect(),
        }
    }
}

/// Which estimator produced a `FittedModel`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "method")]
pub enum FitKind {
    Ols,
    Wls { policy: VariancePolicy },
    Lasso { lambda: f64 },
}

impl FitKind {
    pub fn display_name(self) -> &'static str {
        match self {
            FitKind::Ols => "OLS",
            FitKind::Wls { .. } => "WLS",
            FitKind::Lasso { .. } => "Lasso",
        }
    }
}

/// One row of a coefficient table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientStat {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
}

/// Inference statistics for OLS / WLS fits.
///
/// For WLS all sums of squares are weighted and the total sum of squares is
/// taken about the weighted mean of the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inference {
    /// Intercept first, then predictors in model order.
    pub coefficients: Vec<CoefficientStat>,
    pub residual_std_error: f64,
    pub df_residual: usize,
    pub df_model: usize,
    pub rss: f64,
    pub tss: f64,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    /// Overall F-statistic; `None` for an intercept-only model.
    pub f_statistic: Option<f64>,
    pub f_p_value: Option<f64>,
    /// `(XᵀWX)⁻¹`, row-major, intercept first.
    pub unscaled_cov: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
}

/// A fitted linear model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub kind: FitKind,
    pub response: String,
    pub predictors: Vec<String>,
    pub intercept: f64,
    /// One coefficient per predictor, same order as `predictors`.
    pub coefficients: Vec<f64>,
    pub fitted_values: Vec<f64>,
    /// Raw residuals `y - ŷ`.
    pub residuals: Vec<f64>,
    /// Observation weights (WLS only).
    pub weights: Option<Vec<f64>>,
    pub inference: Option<Inference>,
}

impl FittedModel {
    pub fn n_obs(&self) -> usize {
        self.fitted_values.len()
    }

    /// Number of estimated parameters including the intercept.
    pub fn n_params(&self) -> usize {
        self.predictors.len() + 1
    }

    /// Number of non-intercept coefficients that are not exactly zero.
    pub fn nonzero_count(&self) -> usize {
        self.coefficients.iter().filter(|&&c| c != 0.0).count()
    }

    pub fn coefficient(&self, name: &str) -> Option<f64> {
        if name == INTERCEPT {
            return Some(self.intercept);
        }
        self.predictors
            .iter()
            .position(|p| p == name)
            .map(|idx| self.coefficients[idx])
    }

    /// Linear predictor for every row of `dataset`.
    ///
    /// Only the predictor columns are read; the response column (if any) is
    /// never touched.
    pub fn predict(&self, dataset: &Dataset) -> Result<Vec<f64>, FitError> {
        let columns: Vec<&[f64]> = self
            .predictors
            .iter()
            .map(|p| dataset.column(p))
            .collect::<Result<_, _>>()?;

        Ok((0..dataset.n_rows())
            .map(|i| {
                self.coefficients
                    .iter()
                    .zip(columns.iter())
                    .fold(self.intercept, |acc, (b, col)| acc + b * col[i])
            })
            .collect())
    }

    /// Two-sided t-based confidence intervals at `level` (e.g. 0.95).
    pub fn confidence_intervals(&self, level: f64) -> Result<Vec<ConfidenceInterval>, FitError> {
        if !(level > 0.0 && level < 1.0) {
            return Err(FitError::InvalidSignificance(level));
        }
        let inference = self
            .inference
            .as_ref()
            .ok_or(FitError::DiagnosticsUnavailable)?;
        let t = StudentsT::new(0.0, 1.0, inference.df_residual as f64)
            .map_err(|e| FitError::Distribution(e.to_string()))?;
        let q = t.inverse_cdf(0.5 + level / 2.0);

        Ok(inference
            .coefficients
            .iter()
            .map(|c| ConfidenceInterval {
                name: c.name.clone(),
                lower: c.estimate - q * c.std_error,
                upper: c.estimate + q * c.std_error,
            })
            .collect())
    }
}

/// Residual and influence diagnostics for an OLS / WLS fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticSet {
    pub leverage: Vec<f64>,
    pub standardized_residuals: Vec<f64>,
    /// Externally studentized residuals.
    pub studentized_residuals: Vec<f64>,
    pub cooks_distance: Vec<f64>,
    /// Rows with `h_ii > 2p/n`.
    pub high_leverage: Vec<usize>,
    /// Rows with Cook's distance `> 4/n`.
    pub influential: Vec<usize>,
}

/// Outcome of a nested-model F-test that a group of coefficients is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointTest {
    pub terms: Vec<String>,
    pub f_statistic: f64,
    pub df_numerator: usize,
    pub df_denominator: usize,
    pub p_value: f64,
    pub alpha: f64,
    pub reject: bool,
    pub rss_full: f64,
    pub rss_restricted: f64,
}

/// Cross-validated error along a descending lambda sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationResult {
    /// Candidate penalties, strictly descending.
    pub lambdas: Vec<f64>,
    /// Mean held-out squared error per lambda.
    pub mean_error: Vec<f64>,
    /// Standard error of `mean_error` across folds.
    pub std_error: Vec<f64>,
    /// Nonzero coefficients on the full training slice per lambda.
    pub nonzero: Vec<usize>,
    pub folds: usize,
    pub index_min: usize,
    pub lambda_min: f64,
    pub index_1se: usize,
    pub lambda_1se: f64,
}

/// Lasso coefficients along the lambda sequence on the full training slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LassoPath {
    pub predictors: Vec<String>,
    pub lambdas: Vec<f64>,
    pub intercepts: Vec<f64>,
    /// `coefficients[i]` belongs to `lambdas[i]`.
    pub coefficients: Vec<Vec<f64>>,
}

impl LassoPath {
    pub fn nonzero_counts(&self) -> Vec<usize> {
        self.coefficients
            .iter()
            .map(|beta| beta.iter().filter(|&&b| b != 0.0).count())
            .collect()
    }
}

/// Everything produced by a cross-validated lasso selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LassoSelection {
    pub cv: CrossValidationResult,
    pub path: LassoPath,
    /// Refit on the full training slice at `cv.lambda_min`.
    pub model: FittedModel,
    /// Predictions for the application slice.
    pub predictions: Vec<f64>,
}

/// Accuracy of predictions against observed values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionError {
    pub n: usize,
    pub mse: f64,
    pub rmse: f64,
    pub mae: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> FittedModel {
        FittedModel {
            kind: FitKind::Lasso { lambda: 0.5 },
            response: "y".to_string(),
            predictors: vec!["a".to_string(), "b".to_string()],
            intercept: 1.0,
            coefficients: vec![2.0, 0.0],
            fitted_values: vec![],
            residuals: vec![],
            weights: None,
            inference: None,
        }
    }

    #[test]
    fn proportional_to_mean_inverts_fitted_values() {
        let w = VariancePolicy::ProportionalToMean
            .weights(&[2.0, 4.0, 0.5])
            .unwrap();
        assert_eq!(w, vec![0.5, 0.25, 2.0]);
    }

    #[test]
    fn proportional_to_mean_rejects_non_positive_fitted_values() {
        let err = VariancePolicy::ProportionalToMean
            .weights(&[1.0, 0.0, -2.0])
            .unwrap_err();
        assert_eq!(err, FitError::NonPositiveWeight { index: 1, fitted: 0.0 });
    }

    #[test]
    fn predict_reads_only_predictor_columns() {
        let ds = Dataset::new(vec![("b", vec![10.0, 20.0]), ("a", vec![1.0, 2.0])]).unwrap();
        let y = model().predict(&ds).unwrap();
        assert_eq!(y, vec![3.0, 5.0]);
        assert_eq!(model().nonzero_count(), 1);
        assert_eq!(model().coefficient(INTERCEPT), Some(1.0));
    }

    #[test]
    fn confidence_intervals_need_inference() {
        assert_eq!(
            model().confidence_intervals(0.95).unwrap_err(),
            FitError::DiagnosticsUnavailable
        );
    }
}
