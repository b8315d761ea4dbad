//! OLS and two-stage WLS fits with inference statistics.
//!
//! Given:
//! - a complete-case `Dataset`
//! - a response column
//! - an ordered list of predictor columns
//!
//! we solve the (weighted) least squares problem once and derive coefficient
//! standard errors, t/p values, R², adjusted R² and the overall F test.
//!
//! WLS is a two-stage fit: an OLS pass provides fitted values `ŷ_i`, the
//! `VariancePolicy` turns them into weights (`1/ŷ_i`), and the weighted
//! problem is solved on the same design.

use log::debug;
use nalgebra::DVector;

use crate::domain::{
    CoefficientStat, Dataset, FitKind, FittedModel, Inference, VariancePolicy, INTERCEPT,
};
use crate::error::FitError;
use crate::math::{f_upper_p, solve_weighted_least_squares, t_two_sided_p};

/// Ordinary least squares with an intercept.
pub fn fit_ols(
    dataset: &Dataset,
    response: &str,
    predictors: &[String],
) -> Result<FittedModel, FitError> {
    fit_weighted(dataset, response, predictors, FitKind::Ols, None)
}

/// Weighted least squares with weights `1/ŷ_i` from a first-stage OLS fit.
pub fn fit_wls(
    dataset: &Dataset,
    response: &str,
    predictors: &[String],
) -> Result<FittedModel, FitError> {
    fit_wls_with_policy(dataset, response, predictors, VariancePolicy::ProportionalToMean)
}

pub fn fit_wls_with_policy(
    dataset: &Dataset,
    response: &str,
    predictors: &[String],
    policy: VariancePolicy,
) -> Result<FittedModel, FitError> {
    let ols = fit_ols(dataset, response, predictors)?;
    let weights = policy.weights(&ols.fitted_values)?;
    debug!(
        "WLS weights from {:?}: min={:.4}, max={:.4}",
        policy,
        weights.iter().copied().fold(f64::INFINITY, f64::min),
        weights.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    );
    fit_weighted(dataset, response, predictors, FitKind::Wls { policy }, Some(weights))
}

/// Solve the weighted problem and attach inference statistics.
///
/// `weights = None` means unit weights.
pub(crate) fn fit_weighted(
    dataset: &Dataset,
    response: &str,
    predictors: &[String],
    kind: FitKind,
    weights: Option<Vec<f64>>,
) -> Result<FittedModel, FitError> {
    if dataset.n_rows() == 0 {
        return Err(FitError::EmptyDataset);
    }
    let x = dataset.design_matrix(predictors)?;
    let y = dataset.response(response)?;
    let (n, p) = x.shape();
    if n <= p {
        return Err(FitError::InsufficientData {
            n_samples: n,
            n_params: p,
        });
    }

    let sol = solve_weighted_least_squares(&x, &y, weights.as_deref())?;
    let fitted: DVector<f64> = &x * &sol.beta;
    let residuals: DVector<f64> = &y - &fitted;

    let w_at = |i: usize| weights.as_ref().map_or(1.0, |w| w[i]);
    let rss: f64 = (0..n).map(|i| w_at(i) * residuals[i] * residuals[i]).sum();
    let w_sum: f64 = (0..n).map(w_at).sum();
    let y_bar = (0..n).map(|i| w_at(i) * y[i]).sum::<f64>() / w_sum;
    let tss: f64 = (0..n).map(|i| w_at(i) * (y[i] - y_bar).powi(2)).sum();

    let df_residual = n - p;
    let df_model = p - 1;
    let sigma2 = rss / df_residual as f64;
    let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { 0.0 };
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n - 1) as f64 / df_residual as f64;

    let (f_statistic, f_p_value) = if df_model > 0 {
        let f = ((tss - rss) / df_model as f64) / sigma2;
        (Some(f), Some(f_upper_p(f, df_model, df_residual)?))
    } else {
        (None, None)
    };

    let names = std::iter::once(INTERCEPT.to_string()).chain(predictors.iter().cloned());
    let coefficients = names
        .enumerate()
        .map(|(j, name)| {
            let estimate = sol.beta[j];
            let std_error = (sigma2 * sol.xtwx_inv[(j, j)]).sqrt();
            let t_value = estimate / std_error;
            Ok(CoefficientStat {
                name,
                estimate,
                std_error,
                t_value,
                p_value: t_two_sided_p(t_value, df_residual)?,
            })
        })
        .collect::<Result<Vec<_>, FitError>>()?;

    let unscaled_cov = (0..p)
        .map(|i| (0..p).map(|j| sol.xtwx_inv[(i, j)]).collect())
        .collect();

    debug!(
        "{} fit of `{response}` on {} predictors: n={n}, rss={rss:.6}, r2={r_squared:.4}",
        kind.display_name(),
        predictors.len()
    );

    Ok(FittedModel {
        kind,
        response: response.to_string(),
        predictors: predictors.to_vec(),
        intercept: sol.beta[0],
        coefficients: sol.beta.iter().skip(1).copied().collect(),
        fitted_values: fitted.iter().copied().collect(),
        residuals: residuals.iter().copied().collect(),
        weights,
        inference: Some(Inference {
            coefficients,
            residual_std_error: sigma2.sqrt(),
            df_residual,
            df_model,
            rss,
            tss,
            r_squared,
            adj_r_squared,
            f_statistic,
            f_p_value,
            unscaled_cov,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{generate, predictor_names, NoiseModel, SyntheticSpec};
    use approx::assert_abs_diff_eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// y = 1 + 2x with alternating ±0.1 noise.
    fn line() -> Dataset {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y = x
            .iter()
            .enumerate()
            .map(|(i, &v)| 1.0 + 2.0 * v + if i % 2 == 0 { 0.1 } else { -0.1 })
            .collect();
        Dataset::new(vec![("x", x), ("y", y)]).unwrap()
    }

    #[test]
    fn ols_recovers_slope_and_reports_inference() {
        let model = fit_ols(&line(), "y", &names(&["x"])).unwrap();
        assert_eq!(model.kind, FitKind::Ols);
        assert_abs_diff_eq!(model.coefficients[0], 2.0, epsilon = 0.05);
        assert_abs_diff_eq!(model.intercept, 1.0, epsilon = 0.2);

        let inf = model.inference.as_ref().unwrap();
        assert_eq!(inf.df_residual, 8);
        assert_eq!(inf.df_model, 1);
        assert_eq!(inf.coefficients[0].name, INTERCEPT);
        assert_eq!(inf.coefficients[1].name, "x");
        assert!(inf.r_squared > 0.99);
        assert!(inf.coefficients[1].p_value < 1e-6);
        // With one predictor the overall F equals the squared slope t value.
        let t = inf.coefficients[1].t_value;
        assert_abs_diff_eq!(inf.f_statistic.unwrap(), t * t, epsilon = 1e-6 * t * t);
        assert!(model.weights.is_none());
    }

    #[test]
    fn ols_residuals_are_orthogonal_to_design() {
        let model = fit_ols(&line(), "y", &names(&["x"])).unwrap();
        let x = line().column("x").unwrap().to_vec();
        let sum: f64 = model.residuals.iter().sum();
        let dot: f64 = model.residuals.iter().zip(&x).map(|(r, v)| r * v).sum();
        assert_abs_diff_eq!(sum, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(dot, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn ols_recovers_true_slope_on_noisy_synthetic_data() {
        let spec = SyntheticSpec {
            n: 100,
            intercept: 1.0,
            coefficients: vec![3.0],
            noise_sd: 0.2,
            seed: 11,
            ..SyntheticSpec::default()
        };
        let ds = generate(&spec).unwrap();
        let model = fit_ols(&ds, "y", &predictor_names(1)).unwrap();
        let slope = model.coefficients[0];
        assert!((slope - 3.0).abs() <= 0.3, "slope {slope} outside ±10% of 3.0");
    }

    #[test]
    fn wls_uses_inverse_ols_fitted_values_as_weights() {
        let spec = SyntheticSpec {
            n: 200,
            intercept: 10.0,
            coefficients: vec![2.0, 1.0],
            noise_sd: 0.5,
            noise: NoiseModel::ProportionalToMean,
            seed: 3,
            ..SyntheticSpec::default()
        };
        let ds = generate(&spec).unwrap();
        let preds = predictor_names(2);

        let ols = fit_ols(&ds, "y", &preds).unwrap();
        let wls = fit_wls(&ds, "y", &preds).unwrap();

        assert_eq!(
            wls.kind,
            FitKind::Wls {
                policy: VariancePolicy::ProportionalToMean
            }
        );
        let weights = wls.weights.as_ref().unwrap();
        for (w, y_hat) in weights.iter().zip(&ols.fitted_values) {
            assert_abs_diff_eq!(*w, 1.0 / y_hat, epsilon = 1e-12);
        }
        // Non-uniform weights move the estimate.
        let moved = ols
            .coefficients
            .iter()
            .zip(&wls.coefficients)
            .any(|(a, b)| (a - b).abs() > 1e-9);
        assert!(moved);
    }

    #[test]
    fn wls_fails_on_non_positive_fitted_values() {
        // The OLS line crosses zero inside the data range.
        let x: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| v - 3.5 + 0.01 * v * v).collect();
        let ds = Dataset::new(vec![("x", x), ("y", y)]).unwrap();

        let err = fit_wls(&ds, "y", &names(&["x"])).unwrap_err();
        assert!(matches!(err, FitError::NonPositiveWeight { index: 0, .. }));
    }

    #[test]
    fn duplicate_predictors_are_singular_for_ols_and_wls() {
        let base = line();
        let x = base.column("x").unwrap().to_vec();
        let ds = base.with_column("x_copy", x).unwrap();
        let preds = names(&["x", "x_copy"]);

        assert!(matches!(
            fit_ols(&ds, "y", &preds).unwrap_err(),
            FitError::SingularDesign { columns: 3, .. }
        ));
        assert!(matches!(
            fit_wls(&ds, "y", &preds).unwrap_err(),
            FitError::SingularDesign { columns: 3, .. }
        ));
    }

    #[test]
    fn duplicate_predictors_are_singular_for_unpenalized_lasso() {
        use crate::fit::selection::fit_lasso;
        use crate::math::LassoOptions;

        let base = line();
        let x = base.column("x").unwrap().to_vec();
        let ds = base.with_column("x_copy", x).unwrap();
        let preds = names(&["x", "x_copy"]);
        let opts = LassoOptions::default();

        assert_eq!(
            fit_lasso(&ds, "y", &preds, 0.0, &opts).unwrap_err(),
            FitError::SingularDesign { rank: 1, columns: 2 }
        );
        assert!(fit_lasso(&ds, "y", &preds, 1.0, &opts).is_ok());
    }

    #[test]
    fn intercept_only_model_has_no_f_statistic() {
        let model = fit_ols(&line(), "y", &[]).unwrap();
        let inf = model.inference.unwrap();
        assert!(inf.f_statistic.is_none());
        assert_eq!(inf.df_model, 0);
        assert_abs_diff_eq!(inf.r_squared, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn needs_more_rows_than_parameters() {
        let ds = Dataset::new(vec![("x", vec![1.0, 2.0]), ("y", vec![1.0, 3.0])]).unwrap();
        assert_eq!(
            fit_ols(&ds, "y", &names(&["x"])).unwrap_err(),
            FitError::InsufficientData {
                n_samples: 2,
                n_params: 2
            }
        );
    }

    #[test]
    fn confidence_interval_brackets_estimate() {
        let model = fit_ols(&line(), "y", &names(&["x"])).unwrap();
        let ci = model.confidence_intervals(0.95).unwrap();
        assert_eq!(ci.len(), 2);
        assert!(ci[1].lower < 2.0 && 2.0 < ci[1].upper);
        assert!(ci[1].lower < model.coefficients[0] && model.coefficients[0] < ci[1].upper);
    }
}
