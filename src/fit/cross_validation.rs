//! k-fold cross-validation of a lasso path.
//!
//! For each fold we fit the whole descending λ path on the other folds
//! (warm-started), predict the held-out rows at every λ and record the sum of
//! squared errors. Folds are independent and may run on the rayon pool; the
//! per-λ reduction always walks the folds in index order using sums and
//! counts only, so the curve does not depend on scheduling.

use log::debug;
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::FitError;
use crate::fit::folds::{FoldAssignment, FoldStrategy};
use crate::math::{LassoOptions, LassoProblem};

/// Knobs for the cross-validated lasso.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvOptions {
    pub folds: usize,
    pub strategy: FoldStrategy,
    pub lasso: LassoOptions,
    /// Fit folds on the rayon pool.
    pub parallel: bool,
    /// Length of the auto-generated λ sequence.
    pub n_lambda: usize,
    /// Smallest-to-largest λ ratio; `None` picks by problem shape.
    pub lambda_ratio: Option<f64>,
    /// Caller-supplied λ sequence; overrides `n_lambda` / `lambda_ratio`.
    pub lambdas: Option<Vec<f64>>,
}

impl Default for CvOptions {
    fn default() -> Self {
        Self {
            folds: 10,
            strategy: FoldStrategy::default(),
            lasso: LassoOptions::default(),
            parallel: true,
            n_lambda: crate::fit::lambda_grid::DEFAULT_N_LAMBDA,
            lambda_ratio: None,
            lambdas: None,
        }
    }
}

/// Held-out squared error of one fold along the λ sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldErrors {
    pub fold: usize,
    /// Held-out rows in this fold.
    pub n: usize,
    /// `sse[l]` belongs to `lambdas[l]`.
    pub sse: Vec<f64>,
}

/// Mean CV error and its standard error per λ.
#[derive(Debug, Clone, PartialEq)]
pub struct CvCurve {
    pub lambdas: Vec<f64>,
    pub mean_error: Vec<f64>,
    pub std_error: Vec<f64>,
    pub folds: usize,
}

/// Fit every fold of `assignment` and summarize.
///
/// `x` holds predictor columns only; `lambdas` must already be descending.
pub fn cross_validate(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    assignment: &FoldAssignment,
    lambdas: &[f64],
    options: &CvOptions,
) -> Result<CvCurve, FitError> {
    let errors = fold_errors(x, y, assignment, lambdas, &options.lasso, options.parallel)?;
    Ok(summarize(lambdas, &errors))
}

/// Fit the path on each training complement and score the held-out fold.
///
/// Output is ordered by fold index regardless of `parallel`.
pub fn fold_errors(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    assignment: &FoldAssignment,
    lambdas: &[f64],
    opts: &LassoOptions,
    parallel: bool,
) -> Result<Vec<FoldErrors>, FitError> {
    if assignment.n_observations() != x.nrows() {
        return Err(FitError::LengthMismatch {
            column: "fold assignment".to_string(),
            expected: x.nrows(),
            found: assignment.n_observations(),
        });
    }
    let run = |fold: usize| score_fold(x, y, assignment, fold, lambdas, opts);
    if parallel {
        (0..assignment.n_folds()).into_par_iter().map(run).collect()
    } else {
        (0..assignment.n_folds()).map(run).collect()
    }
}

fn score_fold(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    assignment: &FoldAssignment,
    fold: usize,
    lambdas: &[f64],
    opts: &LassoOptions,
) -> Result<FoldErrors, FitError> {
    let train = assignment.train(fold);
    let test = assignment.test(fold);

    let problem = LassoProblem::new(&x.select_rows(&train), &y.select_rows(&train), opts.standardize)?;
    let path = problem.solve_path(lambdas, opts)?;

    let x_test = x.select_rows(test);
    let y_test = y.select_rows(test);
    let sse: Vec<f64> = path
        .iter()
        .map(|sol| {
            let pred = (&x_test * &sol.beta).add_scalar(sol.intercept);
            (&y_test - pred).norm_squared()
        })
        .collect();

    debug!(
        "fold {fold}: train={}, test={}, sse[λ_max]={:.6}",
        train.len(),
        test.len(),
        sse.first().copied().unwrap_or(f64::NAN)
    );
    Ok(FoldErrors {
        fold,
        n: test.len(),
        sse,
    })
}

/// Per-λ mean error `Σ SSE / n` and its standard error
/// `sqrt(Σ_f n_f (mse_f - mean)² / n / (k - 1))`.
///
/// The input order of `errors` does not matter.
pub fn summarize(lambdas: &[f64], errors: &[FoldErrors]) -> CvCurve {
    let mut ordered: Vec<&FoldErrors> = errors.iter().collect();
    ordered.sort_by_key(|e| e.fold);

    let k = ordered.len();
    let n_total: usize = ordered.iter().map(|e| e.n).sum();
    let n = n_total as f64;

    let mut mean_error = Vec::with_capacity(lambdas.len());
    let mut std_error = Vec::with_capacity(lambdas.len());
    for l in 0..lambdas.len() {
        let total: f64 = ordered.iter().map(|e| e.sse[l]).sum();
        let mean = total / n;
        let spread: f64 = ordered
            .iter()
            .filter(|e| e.n > 0)
            .map(|e| {
                let mse = e.sse[l] / e.n as f64;
                e.n as f64 * (mse - mean).powi(2)
            })
            .sum();
        let se = if k > 1 {
            (spread / n / (k - 1) as f64).sqrt()
        } else {
            0.0
        };
        mean_error.push(mean);
        std_error.push(se);
    }

    CvCurve {
        lambdas: lambdas.to_vec(),
        mean_error,
        std_error,
        folds: k,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{generate, predictor_names, SyntheticSpec};
    use crate::fit::folds::assign_folds;
    use crate::fit::lambda_grid::auto_lambdas;
    use approx::assert_abs_diff_eq;

    fn problem() -> (DMatrix<f64>, DVector<f64>) {
        let ds = generate(&SyntheticSpec {
            n: 60,
            intercept: 0.5,
            coefficients: vec![2.0, 0.0, -1.0, 0.0],
            noise_sd: 0.5,
            seed: 17,
            ..SyntheticSpec::default()
        })
        .unwrap();
        (
            ds.predictor_matrix(&predictor_names(4)).unwrap(),
            ds.response("y").unwrap(),
        )
    }

    #[test]
    fn parallel_and_sequential_folds_agree_exactly() {
        let (x, y) = problem();
        let lambdas = auto_lambdas(100.0, 20, 1e-3).unwrap();
        let assignment = assign_folds(60, 10, FoldStrategy::Shuffled { seed: 3 }).unwrap();
        let opts = LassoOptions::default();

        let par = fold_errors(&x, &y, &assignment, &lambdas, &opts, true).unwrap();
        let seq = fold_errors(&x, &y, &assignment, &lambdas, &opts, false).unwrap();
        assert_eq!(par, seq);
        assert_eq!(summarize(&lambdas, &par), summarize(&lambdas, &seq));
    }

    #[test]
    fn summary_is_invariant_to_fold_order() {
        let (x, y) = problem();
        let lambdas = auto_lambdas(100.0, 15, 1e-3).unwrap();
        let assignment = assign_folds(60, 5, FoldStrategy::Contiguous).unwrap();
        let errors =
            fold_errors(&x, &y, &assignment, &lambdas, &LassoOptions::default(), false).unwrap();

        let mut reversed = errors.clone();
        reversed.reverse();
        assert_eq!(summarize(&lambdas, &errors), summarize(&lambdas, &reversed));
    }

    #[test]
    fn summary_matches_hand_computation() {
        let lambdas = vec![2.0, 1.0];
        let errors = vec![
            FoldErrors {
                fold: 0,
                n: 2,
                sse: vec![4.0, 2.0],
            },
            FoldErrors {
                fold: 1,
                n: 3,
                sse: vec![3.0, 3.0],
            },
        ];
        let curve = summarize(&lambdas, &errors);
        // λ=2: mean = 7/5; mse = (2, 1); spread = 2(0.6)² + 3(0.4)² = 1.2
        assert_abs_diff_eq!(curve.mean_error[0], 1.4, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.std_error[0], (1.2_f64 / 5.0).sqrt(), epsilon = 1e-12);
        // λ=1: mean = 1; both folds have mse 1.
        assert_abs_diff_eq!(curve.mean_error[1], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.std_error[1], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn cv_error_at_lambda_max_is_about_response_variance() {
        let (x, y) = problem();
        let lambdas = vec![1e6, 0.01];
        let opts = CvOptions::default();
        let assignment = assign_folds(60, opts.folds, opts.strategy).unwrap();
        let curve = cross_validate(&x, &y, &assignment, &lambdas, &opts).unwrap();
        // An intercept-only prediction is much worse than the near-OLS fit.
        assert!(curve.mean_error[0] > 2.0 * curve.mean_error[1]);
        assert_eq!(curve.folds, 10);
    }

    #[test]
    fn assignment_must_cover_every_row() {
        let (x, y) = problem();
        let assignment = assign_folds(50, 5, FoldStrategy::Contiguous).unwrap();
        assert_eq!(
            cross_validate(&x, &y, &assignment, &[1.0], &CvOptions::default()).unwrap_err(),
            FitError::LengthMismatch {
                column: "fold assignment".to_string(),
                expected: 60,
                found: 50
            }
        );
    }
}
