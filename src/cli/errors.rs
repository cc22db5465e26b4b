use std::path::PathBuf;

use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid band list: {bands}")]
    InvalidBands { bands: String },

    #[error("Either --bands or --all-visnir is required (or `bands` in --config)")]
    NoBandsSelected,

    #[error("Failed to read config {path:?}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Archive contained no .SAFE product: {path:?}")]
    NoProductInArchive { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Library(#[from] s2dos::Error),
}
