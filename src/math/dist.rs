//! Tail probabilities for coefficient and nested-model tests.

use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

use crate::error::FitError;

/// Two-sided p-value of a t statistic with `df` degrees of freedom.
pub fn t_two_sided_p(t: f64, df: usize) -> Result<f64, FitError> {
    let dist = StudentsT::new(0.0, 1.0, df as f64)
        .map_err(|e| FitError::Distribution(e.to_string()))?;
    if t.is_nan() {
        return Ok(f64::NAN);
    }
    Ok((2.0 * dist.sf(t.abs())).min(1.0))
}

/// Upper-tail p-value of an F statistic with `(d1, d2)` degrees of freedom.
pub fn f_upper_p(f: f64, d1: usize, d2: usize) -> Result<f64, FitError> {
    let dist = FisherSnedecor::new(d1 as f64, d2 as f64)
        .map_err(|e| FitError::Distribution(e.to_string()))?;
    if f.is_nan() {
        return Ok(f64::NAN);
    }
    if f <= 0.0 {
        return Ok(1.0);
    }
    if f.is_infinite() {
        return Ok(0.0);
    }
    Ok(dist.sf(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn t_tail_matches_reference_values() {
        // qt(0.975, 10) = 2.228139
        assert_abs_diff_eq!(t_two_sided_p(2.228139, 10).unwrap(), 0.05, epsilon = 1e-5);
        assert_abs_diff_eq!(t_two_sided_p(0.0, 10).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn f_tail_matches_reference_values() {
        // qf(0.95, 2, 20) = 3.492828
        assert_abs_diff_eq!(f_upper_p(3.492828, 2, 20).unwrap(), 0.05, epsilon = 1e-5);
        assert_eq!(f_upper_p(0.0, 2, 20).unwrap(), 1.0);
        assert_eq!(f_upper_p(f64::INFINITY, 2, 20).unwrap(), 0.0);
    }
}
