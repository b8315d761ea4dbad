//! Command dispatch for the `creg` binary.
//!
//! `run` loads `.env`, initializes logging, parses the CLI and hands each
//! subcommand to its handler, which runs a pipeline and prints the report.

use clap::Parser;

use crate::cli::{Command, CvArgs, DemoArgs, FitArgs, InputArgs, LassoArgs};
use crate::data::{generate, predictor_names, NoiseModel, SyntheticSpec};
use crate::domain::{FitConfig, LassoConfig};
use crate::error::AppError;
use crate::fit::{CvOptions, FoldStrategy};
use crate::math::LassoOptions;

pub mod pipeline;

/// Entry point for the `creg` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Lasso(args) => handle_lasso(args),
        Command::Demo(args) => handle_demo(args),
    }
}

/// `RUST_LOG` controls verbosity; warnings and errors are shown by default.
fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("warn");
    // A second initialization (e.g. from tests) is harmless.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args);
    let run = pipeline::run_fit(&config)?;

    print!("{}", crate::report::format_ingest(&run.ingest));
    println!("{}", crate::report::format_model_summary(&run.output.model));
    if let Some(intervals) = &run.output.confidence_intervals {
        for ci in intervals {
            println!("  {:<24} [{:.6}, {:.6}]", ci.name, ci.lower, ci.upper);
        }
        println!();
    }
    if let Some(diag) = &run.output.diagnostics {
        println!("{}", crate::report::format_diagnostics(diag, config.top_n));
    }
    if let Some(test) = &run.output.joint_test {
        println!("{}", crate::report::format_joint_test(test));
    }

    if let Some(path) = &config.export_json {
        crate::io::export::write_json(path, &run.output)?;
    }
    Ok(())
}

fn handle_lasso(args: LassoArgs) -> Result<(), AppError> {
    let config = lasso_config_from_args(&args)?;
    let run = pipeline::run_lasso(&config)?;

    print!("{}", crate::report::format_ingest(&run.ingest));
    println!(
        "Split on `{}` at {}: train={} | application={}",
        config.split_column, config.split_at, run.output.train_rows, run.output.application_rows
    );
    println!(
        "{}",
        crate::report::format_cv(&run.output.selection, run.output.application_error.as_ref())
    );

    if let Some(path) = &config.export_json {
        crate::io::export::write_json(path, &run.output)?;
    }
    if let Some(path) = &config.export_predictions {
        crate::io::export::write_predictions_csv(
            path,
            &run.output.selection.predictions,
            run.output.application_observed.as_deref(),
        )?;
    }
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    // Thirteen predictors, three active, variance proportional to the mean.
    let mut coefficients = vec![1.5, -1.0, 0.8];
    coefficients.extend(std::iter::repeat(0.0).take(10));
    let spec = SyntheticSpec {
        n: args.n,
        intercept: 10.0,
        coefficients,
        noise_sd: 0.3,
        noise: NoiseModel::ProportionalToMean,
        seed: args.data_seed,
        ..SyntheticSpec::default()
    };
    let dataset = generate(&spec)?;
    let predictors = predictor_names(spec.coefficients.len());
    let inactive: Vec<String> = predictors[3..].to_vec();

    println!("=== creg demo: n={} synthetic rows, 3 of 13 predictors active ===\n", args.n);

    let fit = pipeline::fit_stage(
        &dataset,
        &pipeline::FitStage {
            response: "y",
            predictors: &predictors,
            weighted: true,
            test_terms: &inactive,
            alpha: 0.05,
            confidence: None,
            diagnostics: true,
        },
    )?;
    println!("{}", crate::report::format_model_summary(&fit.model));
    if let Some(diag) = &fit.diagnostics {
        println!("{}", crate::report::format_diagnostics(diag, 5));
    }
    if let Some(test) = &fit.joint_test {
        println!("{}", crate::report::format_joint_test(test));
    }

    let split_at = (args.n as f64 * 0.8).floor();
    let lasso = pipeline::lasso_stage(
        &dataset,
        "y",
        &predictors,
        "period",
        split_at,
        &cv_options_from_args(&args.cv),
    )?;
    println!(
        "{}",
        crate::report::format_cv(&lasso.selection, lasso.application_error.as_ref())
    );
    Ok(())
}

fn normalized(names: &[String]) -> Vec<String> {
    names.iter().map(|n| n.trim().to_ascii_lowercase()).collect()
}

fn input_columns(input: &InputArgs) -> (String, Vec<String>) {
    (
        input.response.trim().to_ascii_lowercase(),
        normalized(&input.predictors),
    )
}

pub fn fit_config_from_args(args: &FitArgs) -> FitConfig {
    let (response, predictors) = input_columns(&args.input);
    FitConfig {
        csv_path: args.input.csv.clone(),
        response,
        predictors,
        transform: args.input.transform,
        weighted: args.weighted,
        test_terms: normalized(&args.test_terms),
        alpha: args.alpha,
        confidence: args.confidence,
        diagnostics: args.diagnostics,
        top_n: args.top,
        export_json: args.export.clone(),
    }
}

pub fn lasso_config_from_args(args: &LassoArgs) -> Result<LassoConfig, AppError> {
    if !args.split_at.is_finite() {
        return Err(AppError::new(2, "Invalid --split-at value (must be finite)."));
    }
    let (response, predictors) = input_columns(&args.input);
    Ok(LassoConfig {
        csv_path: args.input.csv.clone(),
        response,
        predictors,
        transform: args.input.transform,
        split_column: args.split_column.trim().to_ascii_lowercase(),
        split_at: args.split_at,
        cv: cv_options_from_args(&args.cv),
        export_json: args.export.clone(),
        export_predictions: args.export_predictions.clone(),
    })
}

pub fn cv_options_from_args(args: &CvArgs) -> CvOptions {
    CvOptions {
        folds: args.folds,
        strategy: if args.contiguous {
            FoldStrategy::Contiguous
        } else {
            FoldStrategy::Shuffled { seed: args.seed }
        },
        lasso: LassoOptions {
            standardize: args.standardize,
            ..LassoOptions::default()
        },
        parallel: !args.sequential,
        n_lambda: args.n_lambda,
        lambda_ratio: args.lambda_ratio,
        lambdas: args.lambdas.clone(),
    }
}
