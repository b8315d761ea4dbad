//! Residual and influence diagnostics for OLS / WLS fits.
//!
//! All quantities use the weighted hat matrix
//! `H = W^{1/2} X (XᵀWX)⁻¹ Xᵀ W^{1/2}` (unit weights for OLS):
//!
//! - leverage `h_ii = w_i x_iᵀ (XᵀWX)⁻¹ x_i`
//! - standardized residual `r_i = sqrt(w_i) e_i / (σ̂ sqrt(1 - h_ii))`
//! - externally studentized residual `t_i = r_i sqrt((n-p-1) / (n-p-r_i²))`
//! - Cook's distance `D_i = (r_i² / p) · h_ii / (1 - h_ii)`

use log::debug;

use crate::domain::{Dataset, DiagnosticSet, FittedModel};
use crate::error::FitError;
use crate::math::solve_weighted_least_squares;

/// Diagnostics of `model` over the dataset it was fit on.
pub fn compute_diagnostics(
    model: &FittedModel,
    dataset: &Dataset,
) -> Result<DiagnosticSet, FitError> {
    let inference = model
        .inference
        .as_ref()
        .ok_or(FitError::DiagnosticsUnavailable)?;
    let n = dataset.n_rows();
    if n != model.n_obs() {
        return Err(FitError::LengthMismatch {
            column: "rows".to_string(),
            expected: model.n_obs(),
            found: n,
        });
    }

    let x = dataset.design_matrix(&model.predictors)?;
    let y = dataset.response(&model.response)?;
    let fitted = model.predict(dataset)?;
    let hat = solve_weighted_least_squares(&x, &y, model.weights.as_deref())?.leverage;
    let p = model.n_params();
    let df = inference.df_residual as f64;
    let sigma = inference.residual_std_error;
    let weight = |i: usize| model.weights.as_ref().map_or(1.0, |w| w[i]);

    let mut leverage = Vec::with_capacity(n);
    let mut standardized = Vec::with_capacity(n);
    let mut studentized = Vec::with_capacity(n);
    let mut cooks = Vec::with_capacity(n);

    for i in 0..n {
        let h = hat[i];
        let e = y[i] - fitted[i];
        let r = weight(i).sqrt() * e / (sigma * (1.0 - h).sqrt());
        let t = r * ((df - 1.0) / (df - r * r)).sqrt();
        let d = (r * r / p as f64) * h / (1.0 - h);

        leverage.push(h);
        standardized.push(r);
        studentized.push(t);
        cooks.push(d);
    }

    let leverage_cut = 2.0 * p as f64 / n as f64;
    let cooks_cut = 4.0 / n as f64;
    let high_leverage: Vec<usize> = (0..n).filter(|&i| leverage[i] > leverage_cut).collect();
    let influential: Vec<usize> = (0..n).filter(|&i| cooks[i] > cooks_cut).collect();
    debug!(
        "diagnostics: {} high-leverage rows (h > {leverage_cut:.4}), {} influential rows (D > {cooks_cut:.4})",
        high_leverage.len(),
        influential.len()
    );

    Ok(DiagnosticSet {
        leverage,
        standardized_residuals: standardized,
        studentized_residuals: studentized,
        cooks_distance: cooks,
        high_leverage,
        influential,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{generate, predictor_names, NoiseModel, SyntheticSpec};
    use crate::fit::regression::{fit_ols, fit_wls};
    use approx::assert_abs_diff_eq;

    fn dataset() -> Dataset {
        let ds = generate(&SyntheticSpec {
            n: 30,
            intercept: 2.0,
            coefficients: vec![1.5, -0.5],
            noise_sd: 0.3,
            seed: 5,
            ..SyntheticSpec::default()
        })
        .unwrap();
        // One far-out row so the influence flags have something to find.
        let mut x1 = ds.column("x1").unwrap().to_vec();
        x1[0] = 8.0;
        Dataset::new(vec![
            ("x1", x1),
            ("x2", ds.column("x2").unwrap().to_vec()),
            ("y", ds.column("y").unwrap().to_vec()),
        ])
        .unwrap()
    }

    #[test]
    fn leverages_sum_to_parameter_count() {
        let ds = dataset();
        let model = fit_ols(&ds, "y", &predictor_names(2)).unwrap();
        let diag = compute_diagnostics(&model, &ds).unwrap();
        let total: f64 = diag.leverage.iter().sum();
        assert_abs_diff_eq!(total, 3.0, epsilon = 1e-9);
        assert!(diag.leverage.iter().all(|&h| h > 0.0 && h < 1.0));
        assert!(diag.high_leverage.contains(&0));
        assert!(diag.influential.contains(&0));
    }

    #[test]
    fn studentized_residuals_match_leave_one_out_refits() {
        let ds = dataset();
        let preds = predictor_names(2);
        let model = fit_ols(&ds, "y", &preds).unwrap();
        let diag = compute_diagnostics(&model, &ds).unwrap();
        let sigma2 = model.inference.as_ref().unwrap().residual_std_error.powi(2);
        let n = ds.n_rows();

        for i in [0usize, 7, 19] {
            let keep: Vec<usize> = (0..n).filter(|&j| j != i).collect();
            let loo = fit_ols(&ds.select_rows(&keep), "y", &preds).unwrap();
            let sigma_i = loo.inference.as_ref().unwrap().residual_std_error;
            let h = diag.leverage[i];
            let expected_t = model.residuals[i] / (sigma_i * (1.0 - h).sqrt());
            assert_abs_diff_eq!(diag.studentized_residuals[i], expected_t, epsilon = 1e-8);

            // Cook's distance as the scaled shift of all fitted values.
            let shifted = loo.predict(&ds).unwrap();
            let shift: f64 = model
                .fitted_values
                .iter()
                .zip(&shifted)
                .map(|(a, b)| (a - b).powi(2))
                .sum();
            assert_abs_diff_eq!(diag.cooks_distance[i], shift / (3.0 * sigma2), epsilon = 1e-8);
        }
    }

    #[test]
    fn weighted_leverages_sum_to_parameter_count() {
        let ds = generate(&SyntheticSpec {
            n: 60,
            intercept: 8.0,
            coefficients: vec![1.0],
            noise_sd: 0.4,
            noise: NoiseModel::ProportionalToMean,
            seed: 21,
            ..SyntheticSpec::default()
        })
        .unwrap();
        let model = fit_wls(&ds, "y", &predictor_names(1)).unwrap();
        let diag = compute_diagnostics(&model, &ds).unwrap();
        let total: f64 = diag.leverage.iter().sum();
        assert_abs_diff_eq!(total, 2.0, epsilon = 1e-9);

        // Standardized residuals use the weighted residual sqrt(w) e.
        let w = model.weights.as_ref().unwrap();
        let sigma = model.inference.as_ref().unwrap().residual_std_error;
        let i = 4;
        let expected = w[i].sqrt() * model.residuals[i] / (sigma * (1.0 - diag.leverage[i]).sqrt());
        assert_abs_diff_eq!(diag.standardized_residuals[i], expected, epsilon = 1e-12);
    }

    #[test]
    fn rejects_mismatched_dataset() {
        let ds = dataset();
        let model = fit_ols(&ds, "y", &predictor_names(2)).unwrap();
        let err = compute_diagnostics(&model, &ds.select_rows(&[0, 1, 2])).unwrap_err();
        assert!(matches!(err, FitError::LengthMismatch { expected: 30, found: 3, .. }));
    }
}
