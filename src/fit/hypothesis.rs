//! Nested-model F-test that a group of coefficients is jointly zero.
//!
//! The restricted model drops the named predictors and is refit on the same
//! rows with the same weights as the full model, so for WLS the comparison is
//! between weighted residual sums of squares:
//!
//! ```text
//! F = ((RSS_r - RSS_f) / q) / (RSS_f / (n - p))
//! ```

use log::debug;

use crate::domain::{Dataset, FittedModel, JointTest};
use crate::error::FitError;
use crate::fit::regression::fit_weighted;
use crate::math::f_upper_p;

/// Test `H0: β_t = 0 for every t in terms` at significance `alpha`.
///
/// `alpha` has no default and must lie strictly between 0 and 1. The null is
/// rejected when the p-value is below `alpha`.
pub fn joint_f_test(
    model: &FittedModel,
    dataset: &Dataset,
    terms: &[String],
    alpha: f64,
) -> Result<JointTest, FitError> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(FitError::InvalidSignificance(alpha));
    }
    let inference = model
        .inference
        .as_ref()
        .ok_or(FitError::DiagnosticsUnavailable)?;

    let mut tested: Vec<String> = Vec::with_capacity(terms.len());
    for term in terms {
        if !model.predictors.contains(term) {
            return Err(FitError::UnknownCoefficient(term.clone()));
        }
        if !tested.contains(term) {
            tested.push(term.clone());
        }
    }
    if tested.is_empty() {
        return Err(FitError::EmptyHypothesis);
    }
    if dataset.n_rows() != model.n_obs() {
        return Err(FitError::LengthMismatch {
            column: "rows".to_string(),
            expected: model.n_obs(),
            found: dataset.n_rows(),
        });
    }

    let restricted_predictors: Vec<String> = model
        .predictors
        .iter()
        .filter(|p| !tested.contains(p))
        .cloned()
        .collect();
    let restricted = fit_weighted(
        dataset,
        &model.response,
        &restricted_predictors,
        model.kind,
        model.weights.clone(),
    )?;
    let rss_restricted = restricted
        .inference
        .as_ref()
        .map(|inf| inf.rss)
        .ok_or(FitError::DiagnosticsUnavailable)?;

    let rss_full = inference.rss;
    let df_numerator = tested.len();
    let df_denominator = inference.df_residual;
    let f_statistic = ((rss_restricted - rss_full) / df_numerator as f64)
        / (rss_full / df_denominator as f64);
    let p_value = f_upper_p(f_statistic, df_numerator, df_denominator)?;
    let reject = p_value < alpha;

    debug!(
        "joint test of {tested:?}: F({df_numerator}, {df_denominator}) = {f_statistic:.4}, p = {p_value:.4e}, reject = {reject}"
    );

    Ok(JointTest {
        terms: tested,
        f_statistic,
        df_numerator,
        df_denominator,
        p_value,
        alpha,
        reject,
        rss_full,
        rss_restricted,
    })
}
