//! Candidate penalty sequences for the lasso path.
//!
//! The path is always solved from the largest λ down so each fit can
//! warm-start from the sparser solution before it. Auto-generated sequences
//! are log-spaced from `lambda_max` (where every coefficient is zero) down to
//! `lambda_max * ratio`.

use crate::error::FitError;

/// Default number of auto-generated penalties.
pub const DEFAULT_N_LAMBDA: usize = 100;

/// Smallest-to-largest λ ratio when there are at least as many rows as predictors.
pub const RATIO_TALL: f64 = 1e-4;

/// Ratio when predictors outnumber rows.
pub const RATIO_WIDE: f64 = 1e-2;

/// Generate `steps` log-spaced points between `min` and `max` (inclusive), ascending.
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, FitError> {
    if !(min.is_finite() && min > 0.0) {
        return Err(FitError::InvalidLambda(min));
    }
    if !(max.is_finite() && max > min) {
        return Err(FitError::InvalidLambda(max));
    }
    if steps < 2 {
        return Err(FitError::InvalidLambdaGrid(format!(
            "need at least 2 steps, got {steps}"
        )));
    }

    let ln_min = min.ln();
    let step = (max.ln() - ln_min) / (steps as f64 - 1.0);
    let mut out: Vec<f64> = (0..steps).map(|i| (ln_min + step * i as f64).exp()).collect();
    // Pin the endpoints so lambda_max is reproduced exactly.
    out[0] = min;
    out[steps - 1] = max;
    Ok(out)
}

/// Default ratio for an `n x p` training problem.
pub fn default_ratio(n_obs: usize, n_predictors: usize) -> f64 {
    if n_obs >= n_predictors {
        RATIO_TALL
    } else {
        RATIO_WIDE
    }
}

/// Descending sequence from `lambda_max` to `lambda_max * ratio`.
pub fn auto_lambdas(lambda_max: f64, n_lambda: usize, ratio: f64) -> Result<Vec<f64>, FitError> {
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(FitError::InvalidLambdaGrid(format!(
            "ratio must lie in (0, 1), got {ratio}"
        )));
    }
    let mut grid = log_space(lambda_max * ratio, lambda_max, n_lambda)?;
    grid.reverse();
    Ok(grid)
}

/// Validate a caller-supplied sequence: every value finite and `>= 0`, then
/// sorted descending with duplicates removed.
pub fn normalize_lambdas(lambdas: &[f64]) -> Result<Vec<f64>, FitError> {
    if lambdas.is_empty() {
        return Err(FitError::InvalidLambdaGrid("no candidate values".to_string()));
    }
    if let Some(&bad) = lambdas.iter().find(|l| !(l.is_finite() && **l >= 0.0)) {
        return Err(FitError::InvalidLambda(bad));
    }
    let mut out = lambdas.to_vec();
    out.sort_by(|a, b| b.total_cmp(a));
    out.dedup();
    Ok(out)
}
