use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use s2dos::DarkObjectPolicy;

#[derive(Parser)]
#[command(name = "s2dos", version, about = "Sentinel-2 L1C atmospheric correction toolbox")]
pub struct CliArgs {
    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    pub log: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract a downloaded product archive
    Unzip(UnzipArgs),
    /// Export band files of an unzipped product to GeoTIFF, one per tile
    Export(ExportArgs),
    /// Atmospheric correction of a band-stacked GeoTIFF (DOS, TOA or RAD)
    Correct(CorrectArgs),
    /// Normalized difference indices of a 10-band reflectance stack
    Indices(IndicesArgs),
}

#[derive(Args)]
pub struct UnzipArgs {
    /// Zip archive of the product
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory to extract into
    #[arg(short, long)]
    pub output_dir: PathBuf,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Unzipped .SAFE directory
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory for the tile GeoTIFFs
    #[arg(short, long)]
    pub output_dir: PathBuf,

    /// JSON file with export parameters; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output resolution (10, 20 or 60, optionally with "m")
    #[arg(long)]
    pub resolution: Option<String>,

    /// Comma-separated band list (e.g. B02,B03,B04,B8A)
    #[arg(long, value_delimiter = ',')]
    pub bands: Vec<String>,

    /// Export B01..B8A
    #[arg(long, default_value_t = false)]
    pub all_visnir: bool,

    /// Comma-separated MGRS tile codes (e.g. 32UNG,33UUB)
    #[arg(long, value_delimiter = ',')]
    pub granules: Vec<String>,

    /// Maximum cloudy pixel percentage of a tile
    #[arg(long)]
    pub max_cloud_cover: Option<f64>,

    /// Minimum percentage of non-zero B01 pixels of a tile
    #[arg(long)]
    pub min_data_cover: Option<f64>,

    /// Keep exporting other tiles after a tile fails
    #[arg(long, default_value_t = false)]
    pub continue_on_error: bool,

    /// Write the export report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Args)]
pub struct CorrectArgs {
    /// Band-stacked DN GeoTIFF (B01..B8A first)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Product metadata file (MTD_MSIL1C.xml) of the same product
    #[arg(short, long)]
    pub metadata: PathBuf,

    /// Output GeoTIFF
    #[arg(short, long)]
    pub output: PathBuf,

    /// Correction method: DOS, TOA or RAD
    #[arg(long, default_value = "DOS")]
    pub method: String,

    /// Use offset 0 for bands without a detectable dark object
    #[arg(long, default_value_t = false)]
    pub dark_object_fallback: bool,
}

impl CorrectArgs {
    pub fn policy(&self) -> DarkObjectPolicy {
        if self.dark_object_fallback {
            DarkObjectPolicy::ZeroFallback
        } else {
            DarkObjectPolicy::Fail
        }
    }
}

#[derive(Args)]
pub struct IndicesArgs {
    /// 10-band reflectance stack (B02..B8A, B11, B12)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory
    #[arg(short, long)]
    pub output_dir: PathBuf,
}
