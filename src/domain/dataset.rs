//! In-memory tabular dataset.
//!
//! A `Dataset` is a set of named numeric columns of equal length. Construction
//! rejects non-finite cells, so every fitter can assume complete cases.
//! All operations that "change" a dataset return a new one.

use nalgebra::{DMatrix, DVector};

use crate::error::FitError;

/// Column-oriented table of county-period observations.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    n_rows: usize,
}

impl Dataset {
    /// Build a dataset from `(name, values)` pairs.
    pub fn new<S: Into<String>>(columns: Vec<(S, Vec<f64>)>) -> Result<Self, FitError> {
        let mut names: Vec<String> = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());
        let mut n_rows = None;

        for (name, col) in columns {
            let name = name.into();
            if names.contains(&name) {
                return Err(FitError::DuplicateColumn(name));
            }
            let expected = *n_rows.get_or_insert(col.len());
            if col.len() != expected {
                return Err(FitError::LengthMismatch {
                    column: name,
                    expected,
                    found: col.len(),
                });
            }
            if let Some(row) = col.iter().position(|v| !v.is_finite()) {
                return Err(FitError::MissingValue { column: name, row });
            }
            names.push(name);
            values.push(col);
        }

        Ok(Self {
            names,
            columns: values,
            n_rows: n_rows.unwrap_or(0),
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Result<&[f64], FitError> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.columns[idx].as_slice())
            .ok_or_else(|| FitError::UnknownColumn(name.to_string()))
    }

    /// Return a copy with an extra column appended.
    pub fn with_column(&self, name: impl Into<String>, values: Vec<f64>) -> Result<Self, FitError> {
        let mut columns: Vec<(String, Vec<f64>)> = self
            .names
            .iter()
            .cloned()
            .zip(self.columns.iter().cloned())
            .collect();
        columns.push((name.into(), values));
        Dataset::new(columns)
    }

    /// Derive `target` from `source` row by row (e.g. `sqrt_cli` from `cli`).
    pub fn map_column(
        &self,
        source: &str,
        target: impl Into<String>,
        f: impl Fn(f64) -> f64,
    ) -> Result<Self, FitError> {
        let values = self.column(source)?.iter().map(|&v| f(v)).collect();
        self.with_column(target, values)
    }

    /// Rows at `indices`, in the given order.
    ///
    /// # Panics
    /// Panics if an index is out of bounds.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|col| indices.iter().map(|&i| col[i]).collect())
            .collect();
        Self {
            names: self.names.clone(),
            columns,
            n_rows: indices.len(),
        }
    }

    /// Split into rows with `column < cutoff` and rows with `column >= cutoff`.
    ///
    /// The two halves are disjoint by construction; this is the time split used
    /// for the training and application periods of the lasso problem.
    pub fn partition(&self, column: &str, cutoff: f64) -> Result<(Self, Self), FitError> {
        let values = self.column(column)?;
        let (before, after): (Vec<usize>, Vec<usize>) =
            (0..self.n_rows).partition(|&i| values[i] < cutoff);
        Ok((self.select_rows(&before), self.select_rows(&after)))
    }

    /// Design matrix with a leading intercept column of ones.
    pub fn design_matrix(&self, predictors: &[String]) -> Result<DMatrix<f64>, FitError> {
        let cols = self.predictor_columns(predictors)?;
        Ok(DMatrix::from_fn(self.n_rows, predictors.len() + 1, |i, j| {
            if j == 0 { 1.0 } else { cols[j - 1][i] }
        }))
    }

    /// Predictor matrix without an intercept column.
    pub fn predictor_matrix(&self, predictors: &[String]) -> Result<DMatrix<f64>, FitError> {
        let cols = self.predictor_columns(predictors)?;
        Ok(DMatrix::from_fn(self.n_rows, predictors.len(), |i, j| {
            cols[j][i]
        }))
    }

    pub fn response(&self, name: &str) -> Result<DVector<f64>, FitError> {
        Ok(DVector::from_column_slice(self.column(name)?))
    }

    fn predictor_columns(&self, predictors: &[String]) -> Result<Vec<&[f64]>, FitError> {
        predictors.iter().map(|p| self.column(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Dataset {
        Dataset::new(vec![
            ("period", vec![1.0, 2.0, 3.0, 4.0]),
            ("cli", vec![0.4, 0.9, 1.6, 2.5]),
            ("mask", vec![80.0, 82.0, 85.0, 90.0]),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_missing_values_and_ragged_columns() {
        let err = Dataset::new(vec![("a", vec![1.0, f64::NAN])]).unwrap_err();
        assert_eq!(
            err,
            FitError::MissingValue {
                column: "a".to_string(),
                row: 1
            }
        );

        let err = Dataset::new(vec![("a", vec![1.0, 2.0]), ("b", vec![1.0])]).unwrap_err();
        assert!(matches!(err, FitError::LengthMismatch { expected: 2, found: 1, .. }));

        let err = Dataset::new(vec![("a", vec![1.0]), ("a", vec![2.0])]).unwrap_err();
        assert_eq!(err, FitError::DuplicateColumn("a".to_string()));
    }

    #[test]
    fn design_matrix_has_intercept_and_predictor_order() {
        let ds = small();
        let x = ds
            .design_matrix(&["mask".to_string(), "period".to_string()])
            .unwrap();
        assert_eq!(x.shape(), (4, 3));
        assert_eq!(x[(2, 0)], 1.0);
        assert_eq!(x[(2, 1)], 85.0);
        assert_eq!(x[(2, 2)], 3.0);

        let err = ds.design_matrix(&["nope".to_string()]).unwrap_err();
        assert_eq!(err, FitError::UnknownColumn("nope".to_string()));
    }

    #[test]
    fn partition_is_disjoint_and_complete() {
        let ds = small();
        let (train, apply) = ds.partition("period", 3.0).unwrap();
        assert_eq!(train.n_rows(), 2);
        assert_eq!(apply.n_rows(), 2);
        assert_eq!(train.column("period").unwrap(), &[1.0, 2.0]);
        assert_eq!(apply.column("period").unwrap(), &[3.0, 4.0]);
    }

    #[test]
    fn map_column_derives_sqrt_response() {
        let ds = small().map_column("cli", "sqrt_cli", f64::sqrt).unwrap();
        let v = ds.column("sqrt_cli").unwrap();
        assert!((v[3] - 2.5_f64.sqrt()).abs() < 1e-12);
        assert_eq!(ds.names().len(), 4);
    }
}
