//! Weighted least squares solver.
//!
//! Every OLS/WLS fit in this crate reduces to:
//!
//! ```text
//! minimize Σ w_i (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - We scale rows by `sqrt(w_i)` and solve an ordinary least squares problem.
//! - We use a thin SVD of the scaled design. The same decomposition yields the
//!   rank check, `(XᵀWX)⁻¹ = V Σ⁻² Vᵀ` and the hat-matrix diagonal (row norms
//!   of `U`), so inference and diagnostics never need a second factorization.

use nalgebra::{DMatrix, DVector};

use crate::error::FitError;

/// Relative singular-value cutoff below which the design counts as rank deficient.
pub(crate) const RANK_TOL: f64 = 1e-10;

/// Solution of a (weighted) least squares problem.
#[derive(Debug, Clone)]
pub struct LeastSquaresSolution {
    pub beta: DVector<f64>,
    /// `(XᵀWX)⁻¹`.
    pub xtwx_inv: DMatrix<f64>,
    /// Diagonal of `W^{1/2} X (XᵀWX)⁻¹ Xᵀ W^{1/2}`.
    pub leverage: DVector<f64>,
}

/// Solve `min Σ w_i (y_i - x_i^T β)^2`. `None` means unit weights.
///
/// Fails with `SingularDesign` when the scaled design is not of full column
/// rank (e.g. duplicate predictor columns).
pub fn solve_weighted_least_squares(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    weights: Option<&[f64]>,
) -> Result<LeastSquaresSolution, FitError> {
    let (n, p) = x.shape();
    if y.len() != n {
        return Err(FitError::LengthMismatch {
            column: "response".to_string(),
            expected: n,
            found: y.len(),
        });
    }
    if p == 0 || n < p {
        return Err(FitError::InsufficientData {
            n_samples: n,
            n_params: p,
        });
    }

    let mut xw = x.clone();
    let mut yw = y.clone();
    if let Some(w) = weights {
        if w.len() != n {
            return Err(FitError::LengthMismatch {
                column: "weights".to_string(),
                expected: n,
                found: w.len(),
            });
        }
        for (i, &wi) in w.iter().enumerate() {
            if !(wi.is_finite() && wi >= 0.0) {
                return Err(FitError::InvalidWeight {
                    index: i,
                    weight: wi,
                });
            }
            let sw = wi.sqrt();
            xw.row_mut(i).scale_mut(sw);
            yw[i] *= sw;
        }
    }

    let svd = xw.svd(true, true);
    let sv = &svd.singular_values;
    let s_max = sv.max();
    let rank = sv.iter().filter(|&&s| s > RANK_TOL * s_max).count();
    if !(s_max.is_finite() && s_max > 0.0) || rank < p {
        return Err(FitError::SingularDesign { rank, columns: p });
    }

    let (Some(u), Some(v_t)) = (svd.u.as_ref(), svd.v_t.as_ref()) else {
        return Err(FitError::SingularDesign { rank, columns: p });
    };

    // β = V Σ⁻¹ Uᵀ y_w
    let uty = u.transpose() * &yw;
    let scaled = DVector::from_fn(p, |j, _| uty[j] / sv[j]);
    let v = v_t.transpose();
    let beta = &v * scaled;

    let inv_sq = DMatrix::from_diagonal(&sv.map(|s| 1.0 / (s * s)));
    let xtwx_inv = &v * inv_sq * v.transpose();
    let leverage = DVector::from_fn(n, |i, _| u.row(i).norm_squared());

    if beta.iter().any(|b| !b.is_finite()) {
        return Err(FitError::SingularDesign { rank, columns: p });
    }

    Ok(LeastSquaresSolution {
        beta,
        xtwx_inv,
        leverage,
    })
}
