//! Cross-validated lasso selection.
//!
//! Stages, each producing a new immutable value:
//! 1. candidate λ sequence (caller-supplied or log-spaced from `lambda_max`)
//! 2. the full-training-slice path, to reject degenerate all-zero selections
//! 3. k-fold CV along the path
//! 4. `λ_min` selection, refit on the full training slice, and prediction on
//!    the application slice
//!
//! Selection rule: `λ_min` is the exact minimizer of mean CV error. Ties go to
//! the larger λ (the sparser model). `λ_1se` is reported alongside but never
//! used to pick the model.

use log::{debug, info};

use crate::domain::{
    CrossValidationResult, Dataset, FitKind, FittedModel, LassoPath, LassoSelection,
    PredictionError,
};
use crate::error::FitError;
use crate::fit::cross_validation::{cross_validate, CvCurve, CvOptions};
use crate::fit::folds::assign_folds;
use crate::fit::lambda_grid::{auto_lambdas, default_ratio, normalize_lambdas};
use crate::math::{LassoOptions, LassoProblem};

/// Run the full selection on `train` and predict `application`.
///
/// Only the predictor columns of `application` are read.
pub fn select_lasso(
    train: &Dataset,
    application: &Dataset,
    response: &str,
    predictors: &[String],
    options: &CvOptions,
) -> Result<LassoSelection, FitError> {
    if train.n_rows() == 0 {
        return Err(FitError::EmptyDataset);
    }
    let x = train.predictor_matrix(predictors)?;
    let y = train.response(response)?;
    let assignment = assign_folds(x.nrows(), options.folds, options.strategy)?;
    let problem = LassoProblem::new(&x, &y, options.lasso.standardize)?;

    let lambdas = candidate_lambdas(&problem, x.nrows(), options)?;
    let path = lasso_path(&problem, predictors, &lambdas, &options.lasso)?;
    let nonzero = path.nonzero_counts();
    if nonzero.iter().all(|&c| c == 0) {
        return Err(FitError::EmptyPredictorSet {
            candidates: lambdas.len(),
        });
    }
    debug!(
        "lasso path: {} lambdas in [{:.4e}, {:.4e}], max nonzero {}",
        lambdas.len(),
        lambdas[lambdas.len() - 1],
        lambdas[0],
        nonzero.iter().max().copied().unwrap_or(0)
    );

    let curve = cross_validate(&x, &y, &assignment, &lambdas, options)?;
    let cv = select_lambda(curve, nonzero);
    info!(
        "{}-fold CV: lambda_min={:.4e} (cv mse {:.6}, {} nonzero), lambda_1se={:.4e}",
        cv.folds,
        cv.lambda_min,
        cv.mean_error[cv.index_min],
        cv.nonzero[cv.index_min],
        cv.lambda_1se
    );

    let model = fit_lasso(train, response, predictors, cv.lambda_min, &options.lasso)?;
    let predictions = apply(&model, application)?;

    Ok(LassoSelection {
        cv,
        path,
        model,
        predictions,
    })
}

fn candidate_lambdas(
    problem: &LassoProblem,
    n_obs: usize,
    options: &CvOptions,
) -> Result<Vec<f64>, FitError> {
    if let Some(user) = &options.lambdas {
        return normalize_lambdas(user);
    }
    let lambda_max = problem.lambda_max();
    if lambda_max <= 0.0 {
        return Err(FitError::EmptyPredictorSet {
            candidates: options.n_lambda,
        });
    }
    let ratio = options
        .lambda_ratio
        .unwrap_or_else(|| default_ratio(n_obs, problem.n_predictors()));
    auto_lambdas(lambda_max, options.n_lambda, ratio)
}

/// Warm-started coefficient path on the full slice.
pub fn lasso_path(
    problem: &LassoProblem,
    predictors: &[String],
    lambdas: &[f64],
    opts: &LassoOptions,
) -> Result<LassoPath, FitError> {
    let solutions = problem.solve_path(lambdas, opts)?;
    Ok(LassoPath {
        predictors: predictors.to_vec(),
        lambdas: lambdas.to_vec(),
        intercepts: solutions.iter().map(|s| s.intercept).collect(),
        coefficients: solutions
            .iter()
            .map(|s| s.beta.iter().copied().collect())
            .collect(),
    })
}

/// Pick `λ_min` and `λ_1se` from a CV curve over a descending λ sequence.
///
/// `λ_min` is the first (largest) λ attaining the minimum mean error.
/// `λ_1se` is the largest λ whose mean error is within one standard error of
/// that minimum.
pub fn select_lambda(curve: CvCurve, nonzero: Vec<usize>) -> CrossValidationResult {
    let mut index_min = 0;
    for (l, &err) in curve.mean_error.iter().enumerate() {
        if err < curve.mean_error[index_min] {
            index_min = l;
        }
    }
    let bound = curve.mean_error[index_min] + curve.std_error[index_min];
    let index_1se = curve
        .mean_error
        .iter()
        .position(|&err| err <= bound)
        .unwrap_or(index_min);

    CrossValidationResult {
        lambda_min: curve.lambdas[index_min],
        lambda_1se: curve.lambdas[index_1se],
        lambdas: curve.lambdas,
        mean_error: curve.mean_error,
        std_error: curve.std_error,
        nonzero,
        folds: curve.folds,
        index_min,
        index_1se,
    }
}

/// Lasso fit at one penalty on the whole dataset.
pub fn fit_lasso(
    dataset: &Dataset,
    response: &str,
    predictors: &[String],
    lambda: f64,
    opts: &LassoOptions,
) -> Result<FittedModel, FitError> {
    let x = dataset.predictor_matrix(predictors)?;
    let y = dataset.column(response)?;
    let sol = LassoProblem::new(&x, &dataset.response(response)?, opts.standardize)?
        .solve(lambda, opts)?;

    let mut model = FittedModel {
        kind: FitKind::Lasso { lambda },
        response: response.to_string(),
        predictors: predictors.to_vec(),
        intercept: sol.intercept,
        coefficients: sol.beta.iter().copied().collect(),
        fitted_values: Vec::new(),
        residuals: Vec::new(),
        weights: None,
        inference: None,
    };
    model.fitted_values = model.predict(dataset)?;
    model.residuals = y
        .iter()
        .zip(&model.fitted_values)
        .map(|(obs, fit)| obs - fit)
        .collect();
    debug!(
        "lasso refit at lambda={lambda:.4e}: {} of {} coefficients nonzero after {} sweeps",
        model.nonzero_count(),
        predictors.len(),
        sol.iterations
    );
    Ok(model)
}

/// Predictions of `model` on a disjoint slice. No fitting happens here.
pub fn apply(model: &FittedModel, dataset: &Dataset) -> Result<Vec<f64>, FitError> {
    model.predict(dataset)
}

/// Accuracy of `predictions` against `observed`.
pub fn prediction_error(predictions: &[f64], observed: &[f64]) -> Result<PredictionError, FitError> {
    if predictions.len() != observed.len() {
        return Err(FitError::LengthMismatch {
            column: "observed".to_string(),
            expected: predictions.len(),
            found: observed.len(),
        });
    }
    if predictions.is_empty() {
        return Err(FitError::EmptyDataset);
    }
    let n = predictions.len();
    let (sq, abs) = predictions
        .iter()
        .zip(observed)
        .fold((0.0, 0.0), |(sq, abs), (p, o)| {
            let e = o - p;
            (sq + e * e, abs + e.abs())
        });
    let mse = sq / n as f64;
    Ok(PredictionError {
        n,
        mse,
        rmse: mse.sqrt(),
        mae: abs / n as f64,
    })
}
