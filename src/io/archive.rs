//! Zip extraction for downloaded `.SAFE` products.
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::ZipArchive;

use crate::error::Result;

/// Extract every entry of `zip_path` into `dst_dir` and return the top-level
/// `.SAFE` directories it contained
pub fn unzip_product(zip_path: &Path, dst_dir: &Path) -> Result<Vec<PathBuf>> {
    info!("Extracting {:?} into {:?}", zip_path, dst_dir);
    fs::create_dir_all(dst_dir)?;
    let mut archive = ZipArchive::new(File::open(zip_path)?)?;
    debug!("Archive holds {} entries", archive.len());

    let roots: BTreeSet<String> = archive
        .file_names()
        .filter_map(|name| name.split('/').next())
        .filter(|root| root.ends_with(".SAFE"))
        .map(str::to_string)
        .collect();

    archive.extract(dst_dir)?;

    let products: Vec<PathBuf> = roots.into_iter().map(|root| dst_dir.join(root)).collect();
    info!("Extracted {} product(s)", products.len());
    Ok(products)
}
