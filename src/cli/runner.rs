use std::fs;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use s2dos::api::{compute_indices_file, correct_file, export_product, unzip_product};
use s2dos::{Band, CorrectionMethod, CorrectionParams, ExportParams, Resolution};

use super::args::{CliArgs, Command, CorrectArgs, ExportArgs, IndicesArgs, UnzipArgs};
use super::errors::AppError;

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_export_params(args: &ExportArgs) -> Result<ExportParams, AppError> {
    let mut params = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            serde_json::from_str(&text).map_err(|e| AppError::Config {
                path: path.clone(),
                message: e.to_string(),
            })?
        }
        None => ExportParams {
            bands: Vec::new(),
            ..ExportParams::default()
        },
    };

    if args.all_visnir {
        params.bands = Band::visnir();
    } else if !args.bands.is_empty() {
        params.bands = args
            .bands
            .iter()
            .map(|b| b.parse::<Band>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| AppError::InvalidBands {
                bands: args.bands.join(","),
            })?;
    }
    if params.bands.is_empty() {
        return Err(AppError::NoBandsSelected);
    }

    if let Some(res) = &args.resolution {
        params.resolution = res.parse::<Resolution>()?;
    }
    if !args.granules.is_empty() {
        params.granules = args.granules.clone();
    }
    if let Some(max) = args.max_cloud_cover {
        params.max_cloud_cover = max;
    }
    if let Some(min) = args.min_data_cover {
        params.min_data_cover = min;
    }
    Ok(params)
}

fn run_unzip(args: &UnzipArgs) -> Result<(), AppError> {
    let products = unzip_product(&args.input, &args.output_dir)?;
    if products.is_empty() {
        return Err(AppError::NoProductInArchive {
            path: args.input.clone(),
        });
    }
    for product in &products {
        info!("Extracted product: {:?}", product);
    }
    Ok(())
}

fn run_export(args: &ExportArgs) -> Result<(), AppError> {
    let params = load_export_params(args)?;
    info!(
        "Exporting {:?} at {} to {:?}",
        params.bands, params.resolution, args.output_dir
    );
    let report = export_product(&args.input, &args.output_dir, &params, args.continue_on_error)?;

    for skipped in &report.skipped {
        info!(
            "Skipped {}: {:?} (cloud {:.0}%, data {:.0}%)",
            skipped.tile, skipped.reason, skipped.cloud_cover, skipped.data_cover
        );
    }
    for failed in &report.errors {
        warn!("Failed {}: {}", failed.tile, failed.message);
    }
    info!("Exported: {}", report.exported.len());
    info!("Skipped: {}", report.skipped.len());
    info!("Errors: {}", report.errors.len());

    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report).map_err(|e| AppError::Config {
            path: path.clone(),
            message: e.to_string(),
        })?;
        fs::write(path, json)?;
    }
    Ok(())
}

fn run_correct(args: &CorrectArgs) -> Result<(), AppError> {
    let params = CorrectionParams {
        method: args.method.parse::<CorrectionMethod>()?,
        dark_object_policy: args.policy(),
    };
    correct_file(&args.input, &args.metadata, &args.output, &params)?;
    Ok(())
}

fn run_indices(args: &IndicesArgs) -> Result<(), AppError> {
    let output = compute_indices_file(&args.input, &args.output_dir)?;
    info!("Successfully processed: {:?} -> {:?}", args.input, output);
    Ok(())
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(args.log);

    match &args.command {
        Command::Unzip(a) => run_unzip(a)?,
        Command::Export(a) => run_export(a)?,
        Command::Correct(a) => run_correct(a)?,
        Command::Indices(a) => run_indices(a)?,
    }
    Ok(())
}
