//! Plain-text tables for the terminal: coefficient summaries, diagnostics,
//! joint tests and the lasso CV curve.

use crate::domain::{
    DiagnosticSet, FittedModel, JointTest, LassoSelection, PredictionError,
};
use crate::io::ingest::IngestedData;
use crate::report::rank_influence;

/// Rows read / used / dropped during ingest.
pub fn format_ingest(ingest: &IngestedData) -> String {
    let mut out = format!(
        "Rows: read={} | used={} | incomplete={} | errors={}\n",
        ingest.rows_read,
        ingest.rows_used,
        ingest.rows_incomplete,
        ingest.row_errors.len()
    );
    for e in ingest.row_errors.iter().take(5) {
        out.push_str(&format!("  line {}: {}\n", e.line, e.message));
    }
    if ingest.row_errors.len() > 5 {
        out.push_str(&format!("  ... {} more\n", ingest.row_errors.len() - 5));
    }
    out
}

/// Coefficient table plus goodness of fit, in the usual regression-summary layout.
pub fn format_model_summary(model: &FittedModel) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== {} fit of `{}` (n={}) ===\n",
        model.kind.display_name(),
        model.response,
        model.n_obs()
    ));

    let Some(inf) = &model.inference else {
        out.push_str(&format_sparse_coefficients(model));
        return out;
    };

    out.push_str(&header_line(&format!(
        "{:<24} {:>12} {:>12} {:>9} {:>10}",
        "term", "estimate", "std_error", "t", "p"
    )));
    out.push_str(&header_line(&format!(
        "{:-<24} {:-<12} {:-<12} {:-<9} {:-<10}",
        "", "", "", "", ""
    )));
    for c in &inf.coefficients {
        out.push_str(&header_line(&format!(
            "{:<24} {:>12.6} {:>12.6} {:>9.3} {:>10} {}",
            truncate(&c.name, 24),
            c.estimate,
            c.std_error,
            c.t_value,
            fmt_p(c.p_value),
            signif(c.p_value)
        )));
    }
    out.push('\n');
    out.push_str(&format!(
        "Residual std. error: {:.6} on {} degrees of freedom\n",
        inf.residual_std_error, inf.df_residual
    ));
    out.push_str(&format!(
        "R-squared: {:.4} | adjusted: {:.4}\n",
        inf.r_squared, inf.adj_r_squared
    ));
    if let (Some(f), Some(p)) = (inf.f_statistic, inf.f_p_value) {
        out.push_str(&format!(
            "F-statistic: {:.4} on {} and {} DF, p-value: {}\n",
            f,
            inf.df_model,
            inf.df_residual,
            fmt_p(p)
        ));
    }
    if let Some(w) = &model.weights {
        let (lo, hi) = min_max(w);
        out.push_str(&format!("Weights: 1/fitted, range [{lo:.4e}, {hi:.4e}]\n"));
    }
    out
}

fn format_sparse_coefficients(model: &FittedModel) -> String {
    let mut out = String::new();
    out.push_str(&header_line(&format!("{:<24} {:>12}", "term", "estimate")));
    out.push_str(&header_line(&format!("{:-<24} {:-<12}", "", "")));
    out.push_str(&header_line(&format!(
        "{:<24} {:>12.6}",
        crate::domain::INTERCEPT,
        model.intercept
    )));
    for (name, beta) in model.predictors.iter().zip(&model.coefficients) {
        let value = if *beta == 0.0 {
            ".".to_string()
        } else {
            format!("{beta:.6}")
        };
        out.push_str(&header_line(&format!("{:<24} {:>12}", truncate(name, 24), value)));
    }
    out.push_str(&format!(
        "Nonzero: {} of {}\n",
        model.nonzero_count(),
        model.predictors.len()
    ));
    out
}

/// Diagnostic counts and the most influential rows.
pub fn format_diagnostics(diag: &DiagnosticSet, top_n: usize) -> String {
    let n = diag.leverage.len();
    let mut out = String::new();
    out.push_str("Diagnostics:\n");
    out.push_str(&format!(
        "- high leverage (h > 2p/n): {} of {n}\n",
        diag.high_leverage.len()
    ));
    out.push_str(&format!(
        "- influential (Cook's D > 4/n): {} of {n}\n",
        diag.influential.len()
    ));
    let (lo, hi) = min_max(&diag.studentized_residuals);
    out.push_str(&format!("- studentized residuals in [{lo:.3}, {hi:.3}]\n"));

    let top = rank_influence(diag, top_n);
    if top.is_empty() {
        return out;
    }
    out.push('\n');
    out.push_str(&header_line(&format!(
        "{:>8} {:>10} {:>12} {:>12}",
        "row", "leverage", "student", "cooks_d"
    )));
    out.push_str(&header_line(&format!(
        "{:-<8} {:-<10} {:-<12} {:-<12}",
        "", "", "", ""
    )));
    for r in top {
        out.push_str(&header_line(&format!(
            "{:>8} {:>10.4} {:>12.4} {:>12.4}",
            r.row, r.leverage, r.studentized_residual, r.cooks_distance
        )));
    }
    out
}

pub fn format_joint_test(test: &JointTest) -> String {
    let verdict = if test.reject { "reject" } else { "fail to reject" };
    format!(
        "Joint F-test H0: {} = 0\n- F({}, {}) = {:.4}, p-value: {}\n- alpha = {}: {verdict}\n",
        test.terms.join(" = "),
        test.df_numerator,
        test.df_denominator,
        test.f_statistic,
        fmt_p(test.p_value),
        test.alpha
    )
}

/// CV summary, a condensed error curve, and the refit coefficients.
pub fn format_cv(selection: &LassoSelection, error: Option<&PredictionError>) -> String {
    let cv = &selection.cv;
    let mut out = String::new();
    out.push_str(&format!(
        "=== {}-fold cross-validated lasso ({} lambdas) ===\n",
        cv.folds,
        cv.lambdas.len()
    ));
    out.push_str(&format!(
        "lambda_min = {:.6e} (cv mse {:.6} ± {:.6}, {} nonzero)\n",
        cv.lambda_min, cv.mean_error[cv.index_min], cv.std_error[cv.index_min], cv.nonzero[cv.index_min]
    ));
    out.push_str(&format!(
        "lambda_1se = {:.6e} (cv mse {:.6}, {} nonzero)\n\n",
        cv.lambda_1se, cv.mean_error[cv.index_1se], cv.nonzero[cv.index_1se]
    ));

    out.push_str(&header_line(&format!(
        "  {:>14} {:>12} {:>12} {:>8}",
        "lambda", "cv_mse", "cv_se", "nonzero"
    )));
    out.push_str(&header_line(&format!(
        "  {:-<14} {:-<12} {:-<12} {:-<8}",
        "", "", "", ""
    )));
    let step = (cv.lambdas.len() / 10).max(1);
    for l in 0..cv.lambdas.len() {
        let marked = l == cv.index_min || l == cv.index_1se;
        if !(marked || l % step == 0 || l + 1 == cv.lambdas.len()) {
            continue;
        }
        let tag = if l == cv.index_min {
            "*"
        } else if l == cv.index_1se {
            "+"
        } else {
            " "
        };
        out.push_str(&header_line(&format!(
            "{tag} {:>14.6e} {:>12.6} {:>12.6} {:>8}",
            cv.lambdas[l], cv.mean_error[l], cv.std_error[l], cv.nonzero[l]
        )));
    }
    out.push_str("(* lambda_min, + lambda_1se)\n\n");

    out.push_str(&format_model_summary(&selection.model));
    out.push_str(&format!("Predictions: {} application rows\n", selection.predictions.len()));
    if let Some(e) = error {
        out.push_str(&format!(
            "Application error: mse={:.6} rmse={:.6} mae={:.6}\n",
            e.mse, e.rmse, e.mae
        ));
    }
    out
}

fn header_line(s: &str) -> String {
    format!("{}\n", s.trim_end())
}

fn fmt_p(p: f64) -> String {
    if p < 2e-16 {
        "<2e-16".to_string()
    } else if p < 1e-4 {
        format!("{p:.2e}")
    } else {
        format!("{p:.4}")
    }
}

fn signif(p: f64) -> &'static str {
    if p < 0.001 {
        "***"
    } else if p < 0.01 {
        "**"
    } else if p < 0.05 {
        "*"
    } else if p < 0.1 {
        "."
    } else {
        ""
    }
}

fn min_max(v: &[f64]) -> (f64, f64) {
    v.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
        (lo.min(x), hi.max(x))
    })
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{generate, predictor_names, SyntheticSpec};
    use crate::fit::{compute_diagnostics, fit_lasso, fit_ols, joint_f_test};
    use crate::math::LassoOptions;

    #[test]
    fn model_summary_lists_every_term() {
        let ds = generate(&SyntheticSpec {
            coefficients: vec![2.0, 0.5],
            ..SyntheticSpec::default()
        })
        .unwrap();
        let model = fit_ols(&ds, "y", &predictor_names(2)).unwrap();
        let text = format_model_summary(&model);
        assert!(text.starts_with("=== OLS fit of `y` (n=100) ==="));
        assert!(text.contains("(Intercept)"));
        assert!(text.contains("x2"));
        assert!(text.contains("R-squared"));
        assert!(text.contains("on 2 and 97 DF"));
        assert!(text.lines().all(|l| l == l.trim_end()));
    }

    #[test]
    fn lasso_summary_marks_zero_coefficients() {
        let ds = generate(&SyntheticSpec {
            coefficients: vec![2.0, 0.0],
            noise_sd: 0.5,
            ..SyntheticSpec::default()
        })
        .unwrap();
        let model = fit_lasso(&ds, "y", &predictor_names(2), 1e4, &LassoOptions::default()).unwrap();
        let text = format_model_summary(&model);
        assert!(text.contains("=== Lasso fit"));
        assert!(text.contains("Nonzero: 0 of 2"));
    }

    #[test]
    fn diagnostics_and_joint_test_render() {
        let ds = generate(&SyntheticSpec::default()).unwrap();
        let model = fit_ols(&ds, "y", &predictor_names(1)).unwrap();
        let diag = compute_diagnostics(&model, &ds).unwrap();
        let text = format_diagnostics(&diag, 3);
        assert!(text.contains("influential"));
        assert_eq!(text.lines().filter(|l| l.starts_with("      ")).count(), 3);

        let test = joint_f_test(&model, &ds, &["x1".to_string()], 0.05).unwrap();
        let text = format_joint_test(&test);
        assert!(text.contains("H0: x1 = 0"));
        assert!(text.contains(": reject"));
    }

    #[test]
    fn p_values_are_compact() {
        assert_eq!(fmt_p(1e-20), "<2e-16");
        assert_eq!(fmt_p(0.0312), "0.0312");
        assert_eq!(signif(0.0312), "*");
        assert_eq!(truncate("abcdefgh", 5), "abcd.");
    }
}
