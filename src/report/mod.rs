//! Reporting utilities: influence rankings and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::DiagnosticSet;

/// One row of the influence ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct InfluenceRow {
    pub row: usize,
    pub leverage: f64,
    pub studentized_residual: f64,
    pub cooks_distance: f64,
}

/// The `top_n` rows with the largest Cook's distance, largest first.
pub fn rank_influence(diag: &DiagnosticSet, top_n: usize) -> Vec<InfluenceRow> {
    let mut rows: Vec<InfluenceRow> = (0..diag.cooks_distance.len())
        .map(|i| InfluenceRow {
            row: i,
            leverage: diag.leverage[i],
            studentized_residual: diag.studentized_residuals[i],
            cooks_distance: diag.cooks_distance[i],
        })
        .collect();
    rows.sort_by(|a, b| b.cooks_distance.total_cmp(&a.cooks_distance));
    rows.truncate(top_n);
    rows
}
