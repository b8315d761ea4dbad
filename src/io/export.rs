//! Result exports.
//!
//! - any result value object as pretty JSON (`write_json`)
//! - application-slice predictions as CSV (`write_predictions_csv`)

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::AppError;

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| AppError::new(2, format!("Failed to write JSON: {e}")))?;
    Ok(())
}

/// One line per application row: `row,predicted[,observed,error]`.
pub fn write_predictions_csv(
    path: &Path,
    predictions: &[f64],
    observed: Option<&[f64]>,
) -> Result<(), AppError> {
    if let Some(obs) = observed {
        if obs.len() != predictions.len() {
            return Err(AppError::new(
                4,
                format!(
                    "Observed length ({}) != predictions length ({})",
                    obs.len(),
                    predictions.len()
                ),
            ));
        }
    }

    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    let header = if observed.is_some() {
        "row,predicted,observed,error"
    } else {
        "row,predicted"
    };
    writeln!(file, "{header}")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for (i, pred) in predictions.iter().enumerate() {
        let line = match observed {
            Some(obs) => format!("{i},{pred:.10},{:.10},{:.10}", obs[i], obs[i] - pred),
            None => format!("{i},{pred:.10}"),
        };
        writeln!(file, "{line}")
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}
