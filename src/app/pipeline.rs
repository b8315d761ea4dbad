//! Workflow shared by the `fit`, `lasso` and `demo` commands:
//! ingest -> response transform -> fit / select -> diagnostics / tests.
//!
//! Nothing here prints; the command handlers own presentation and exports.

use log::info;
use serde::Serialize;

use crate::domain::{
    ConfidenceInterval, Dataset, DiagnosticSet, FitConfig, FittedModel, JointTest, LassoConfig,
    LassoSelection, PredictionError,
};
use crate::error::AppError;
use crate::fit::{
    compute_diagnostics, fit_ols, fit_wls, joint_f_test, prediction_error, select_lasso, CvOptions,
};
use crate::io::ingest::{load_dataset, IngestedData};

/// Everything a `creg fit` run computes. Serialized as the JSON export.
#[derive(Debug, Clone, Serialize)]
pub struct FitOutput {
    pub model: FittedModel,
    pub confidence_intervals: Option<Vec<ConfidenceInterval>>,
    pub diagnostics: Option<DiagnosticSet>,
    pub joint_test: Option<JointTest>,
}

/// Options of the OLS / WLS stage, independent of where the data came from.
#[derive(Debug, Clone)]
pub struct FitStage<'a> {
    pub response: &'a str,
    pub predictors: &'a [String],
    pub weighted: bool,
    pub test_terms: &'a [String],
    pub alpha: f64,
    pub confidence: Option<f64>,
    pub diagnostics: bool,
}

/// Everything a `creg lasso` run computes. Serialized as the JSON export.
#[derive(Debug, Clone, Serialize)]
pub struct LassoOutput {
    pub train_rows: usize,
    pub application_rows: usize,
    pub selection: LassoSelection,
    /// Observed application responses, read only after prediction.
    pub application_observed: Option<Vec<f64>>,
    /// Accuracy on the application slice, when it carries the response.
    pub application_error: Option<PredictionError>,
}

#[derive(Debug, Clone)]
pub struct FitRun {
    pub ingest: IngestedData,
    pub output: FitOutput,
}

#[derive(Debug, Clone)]
pub struct LassoRun {
    pub ingest: IngestedData,
    pub output: LassoOutput,
}

/// Load the CSV and run the OLS / WLS stage.
pub fn run_fit(config: &FitConfig) -> Result<FitRun, AppError> {
    let mut columns = vec![config.response.clone()];
    columns.extend(config.predictors.iter().cloned());
    let ingest = load_dataset(&config.csv_path, &columns)?;

    let (dataset, response) = config.transform.apply(&ingest.dataset, &config.response)?;
    let output = fit_stage(
        &dataset,
        &FitStage {
            response: &response,
            predictors: &config.predictors,
            weighted: config.weighted,
            test_terms: &config.test_terms,
            alpha: config.alpha,
            confidence: config.confidence,
            diagnostics: config.diagnostics,
        },
    )?;
    Ok(FitRun { ingest, output })
}

pub fn fit_stage(dataset: &Dataset, stage: &FitStage<'_>) -> Result<FitOutput, AppError> {
    let model = if stage.weighted {
        fit_wls(dataset, stage.response, stage.predictors)?
    } else {
        fit_ols(dataset, stage.response, stage.predictors)?
    };
    info!(
        "{} fit of `{}`: n={}, p={}",
        model.kind.display_name(),
        stage.response,
        model.n_obs(),
        model.n_params()
    );

    let confidence_intervals = stage
        .confidence
        .map(|level| model.confidence_intervals(level))
        .transpose()?;
    let diagnostics = if stage.diagnostics {
        Some(compute_diagnostics(&model, dataset)?)
    } else {
        None
    };
    let joint_test = if stage.test_terms.is_empty() {
        None
    } else {
        Some(joint_f_test(&model, dataset, stage.test_terms, stage.alpha)?)
    };

    Ok(FitOutput {
        model,
        confidence_intervals,
        diagnostics,
        joint_test,
    })
}

/// Load the CSV, split it in time and run the cross-validated lasso.
pub fn run_lasso(config: &LassoConfig) -> Result<LassoRun, AppError> {
    let mut columns = vec![config.response.clone(), config.split_column.clone()];
    columns.extend(config.predictors.iter().cloned());
    let ingest = load_dataset(&config.csv_path, &columns)?;

    let (dataset, response) = config.transform.apply(&ingest.dataset, &config.response)?;
    let output = lasso_stage(
        &dataset,
        &response,
        &config.predictors,
        &config.split_column,
        config.split_at,
        &config.cv,
    )?;
    Ok(LassoRun { ingest, output })
}

pub fn lasso_stage(
    dataset: &Dataset,
    response: &str,
    predictors: &[String],
    split_column: &str,
    split_at: f64,
    cv: &CvOptions,
) -> Result<LassoOutput, AppError> {
    let (train, application) = dataset.partition(split_column, split_at)?;
    if application.n_rows() == 0 {
        return Err(AppError::new(
            3,
            format!("No application rows with `{split_column}` >= {split_at}."),
        ));
    }
    info!(
        "time split on `{split_column}` at {split_at}: train={}, application={}",
        train.n_rows(),
        application.n_rows()
    );

    let selection = select_lasso(&train, &application, response, predictors, cv)?;
    let application_observed = application.column(response).ok().map(<[f64]>::to_vec);
    let application_error = application_observed
        .as_deref()
        .map(|observed| prediction_error(&selection.predictions, observed))
        .transpose()?;

    Ok(LassoOutput {
        train_rows: train.n_rows(),
        application_rows: application.n_rows(),
        selection,
        application_observed,
        application_error,
    })
}
