//! L1-penalized least squares by cyclic coordinate descent.
//!
//! We solve, for a fixed `λ >= 0`:
//!
//! ```text
//! minimize Σ_i (y_i - β0 - x_i^T β)^2 + λ Σ_j |β_j|
//! ```
//!
//! with the intercept `β0` unpenalized. Centering `X` and `y` removes `β0`
//! from the coordinate updates; it is recovered afterwards as
//! `β0 = ȳ - x̄^T β`.
//!
//! Each coordinate update is the closed-form minimizer
//! `β_j = S(x_j^T r_(-j), λ/2) / ||x_j||^2`, where `S` is soft-thresholding.
//! Soft-thresholding returns an exact `0.0` inside the threshold, so sparsity
//! is exact rather than "small".
//!
//! At `λ = 0` the problem is ordinary least squares, which has no unique
//! solution on a rank-deficient design; that case fails with `SingularDesign`.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::FitError;
use crate::math::ols::RANK_TOL;

/// Solver settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LassoOptions {
    /// Scale each predictor to unit (population) variance before fitting.
    /// Coefficients are always reported on the original scale.
    pub standardize: bool,
    /// Convergence threshold on `max_j ||x_j||^2 Δβ_j^2`, relative to the
    /// centred total sum of squares.
    pub tol: f64,
    /// Maximum number of full coordinate sweeps.
    pub max_iter: usize,
}

impl Default for LassoOptions {
    fn default() -> Self {
        Self {
            standardize: false,
            tol: 1e-12,
            max_iter: 100_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LassoSolution {
    pub lambda: f64,
    pub intercept: f64,
    /// Original-scale coefficients, one per predictor column.
    pub beta: DVector<f64>,
    /// Coordinate sweeps used.
    pub iterations: usize,
}

/// A lasso problem prepared once (centred, optionally scaled) and solved for
/// any number of penalties.
#[derive(Debug, Clone)]
pub struct LassoProblem {
    xc: DMatrix<f64>,
    yc: DVector<f64>,
    x_mean: Vec<f64>,
    y_mean: f64,
    scale: Vec<f64>,
    col_sq: Vec<f64>,
    tss: f64,
}

impl LassoProblem {
    /// `x` holds predictor columns only (no intercept column).
    pub fn new(x: &DMatrix<f64>, y: &DVector<f64>, standardize: bool) -> Result<Self, FitError> {
        let (n, p) = x.shape();
        if n == 0 {
            return Err(FitError::EmptyDataset);
        }
        if y.len() != n {
            return Err(FitError::LengthMismatch {
                column: "response".to_string(),
                expected: n,
                found: y.len(),
            });
        }

        let n_f = n as f64;
        let y_mean = y.mean();
        let yc = y.map(|v| v - y_mean);

        let mut xc = x.clone();
        let mut x_mean = Vec::with_capacity(p);
        let mut scale = Vec::with_capacity(p);
        let mut col_sq = Vec::with_capacity(p);
        for j in 0..p {
            let mut col = xc.column_mut(j);
            let mean = col.mean();
            col.add_scalar_mut(-mean);

            let mut s = 1.0;
            if standardize {
                let sd = (col.norm_squared() / n_f).sqrt();
                if sd > 0.0 {
                    s = sd;
                    col.unscale_mut(sd);
                }
            }
            x_mean.push(mean);
            scale.push(s);
            col_sq.push(col.norm_squared());
        }

        let tss = yc.norm_squared();
        Ok(Self {
            xc,
            yc,
            x_mean,
            y_mean,
            scale,
            col_sq,
            tss,
        })
    }

    pub fn n_predictors(&self) -> usize {
        self.col_sq.len()
    }

    /// Smallest penalty at which every coefficient is zero: `2 max_j |x_j^T y|`
    /// on the centred (and, if enabled, standardized) problem.
    pub fn lambda_max(&self) -> f64 {
        (0..self.n_predictors())
            .map(|j| 2.0 * self.xc.column(j).dot(&self.yc).abs())
            .fold(0.0, f64::max)
    }

    pub fn solve(&self, lambda: f64, opts: &LassoOptions) -> Result<LassoSolution, FitError> {
        let mut beta = DVector::zeros(self.n_predictors());
        let iterations = self.descend(lambda, opts, &mut beta)?;
        Ok(self.to_solution(lambda, &beta, iterations))
    }

    /// Solve a descending penalty sequence, warm-starting each fit from the
    /// previous solution.
    pub fn solve_path(
        &self,
        lambdas: &[f64],
        opts: &LassoOptions,
    ) -> Result<Vec<LassoSolution>, FitError> {
        let mut beta = DVector::zeros(self.n_predictors());
        lambdas
            .iter()
            .map(|&lambda| {
                let iterations = self.descend(lambda, opts, &mut beta)?;
                Ok(self.to_solution(lambda, &beta, iterations))
            })
            .collect()
    }

    fn descend(
        &self,
        lambda: f64,
        opts: &LassoOptions,
        beta: &mut DVector<f64>,
    ) -> Result<usize, FitError> {
        if !(lambda.is_finite() && lambda >= 0.0) {
            return Err(FitError::InvalidLambda(lambda));
        }
        if lambda == 0.0 {
            self.check_full_rank()?;
        }
        let threshold = lambda / 2.0;
        let mut r = &self.yc - &self.xc * &*beta;

        for sweep in 1..=opts.max_iter {
            let mut max_delta: f64 = 0.0;
            for j in 0..self.n_predictors() {
                let sq = self.col_sq[j];
                if sq <= 0.0 {
                    continue;
                }
                let xj = self.xc.column(j);
                let old = beta[j];
                let rho = xj.dot(&r) + sq * old;
                let new = soft_threshold(rho, threshold) / sq;
                if new != old {
                    let delta = new - old;
                    r.axpy(-delta, &xj, 1.0);
                    beta[j] = new;
                    max_delta = max_delta.max(sq * delta * delta);
                }
            }
            if max_delta <= opts.tol * self.tss {
                return Ok(sweep);
            }
        }

        Err(FitError::NotConverged {
            lambda,
            max_iter: opts.max_iter,
        })
    }

    /// Rank test of the centred design, same relative cutoff as the WLS solver.
    fn check_full_rank(&self) -> Result<(), FitError> {
        let p = self.n_predictors();
        if p == 0 {
            return Ok(());
        }
        let sv = self.xc.clone().singular_values();
        let s_max = sv.max();
        let rank = if s_max.is_finite() && s_max > 0.0 {
            sv.iter().filter(|&&s| s > RANK_TOL * s_max).count()
        } else {
            0
        };
        if rank < p {
            return Err(FitError::SingularDesign { rank, columns: p });
        }
        Ok(())
    }

    fn to_solution(&self, lambda: f64, beta_scaled: &DVector<f64>, iterations: usize) -> LassoSolution {
        let beta = DVector::from_fn(beta_scaled.len(), |j, _| beta_scaled[j] / self.scale[j]);
        let intercept = self.y_mean
            - beta
                .iter()
                .zip(self.x_mean.iter())
                .map(|(b, m)| b * m)
                .sum::<f64>();
        LassoSolution {
            lambda,
            intercept,
            beta,
            iterations,
        }
    }
}

/// `sign(z) * max(|z| - t, 0)`.
pub fn soft_threshold(z: f64, t: f64) -> f64 {
    if z > t {
        z - t
    } else if z < -t {
        z + t
    } else {
        0.0
    }
}
