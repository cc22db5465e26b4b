#![doc = r#"
s2dos — Sentinel-2 Level-1C atmospheric correction toolkit.

This crate turns Sentinel-2 L1C products into band-stacked GeoTIFFs and derives
top-of-atmosphere radiance, top-of-atmosphere reflectance or Dark Object Subtraction
(DOS) corrected reflectance from them, plus eight normalized difference indices. It
powers the s2dos CLI and can be embedded in your own Rust applications.

Requirements
------------
- GDAL development headers and runtime available on your system.
- Rust 2024 edition toolchain.

Add dependency
--------------
```toml
[dependencies]
s2dos = "0.1"
```

Quick start: correct a band stack to a file
-------------------------------------------
```rust,no_run
use std::path::Path;
use s2dos::{CorrectionMethod, CorrectionParams, DarkObjectPolicy};

fn main() -> s2dos::Result<()> {
    let params = CorrectionParams {
        method: CorrectionMethod::Dos,
        dark_object_policy: DarkObjectPolicy::Fail,
    };
    s2dos::api::correct_file(
        Path::new("/data/T32UNG_20171012T103021.tif"),
        Path::new("/data/S2A_MSIL1C_20171012T103021.SAFE/MTD_MSIL1C.xml"),
        Path::new("/out/T32UNG_dos.tif"),
        &params,
    )
}
```

Work in memory
--------------
```rust,no_run
use std::path::Path;
use s2dos::{CorrectedRaster, CorrectionMethod, DarkObjectPolicy, MetadataRecord, RasterReader};
use s2dos::core::processing::pipeline::correct;

fn main() -> s2dos::Result<()> {
    let image = RasterReader::open(Path::new("/data/stack.tif"))?.read_u16()?;
    let meta = MetadataRecord::from_product_xml(Path::new("/data/X.SAFE/MTD_MSIL1C.xml"))?;
    match correct(image, &meta, CorrectionMethod::Rad, DarkObjectPolicy::Fail)? {
        CorrectedRaster::Radiance(rad) => println!("{} radiance bands", rad.band_count()),
        other => println!("{} reflectance bands", other.band_count()),
    }
    Ok(())
}
```

Unzip and export
----------------
```rust,no_run
use std::path::Path;
use s2dos::{Band, ExportParams, Resolution};

fn main() -> s2dos::Result<()> {
    let products = s2dos::api::unzip_product(Path::new("/dl/product.zip"), Path::new("/data"))?;
    let params = ExportParams {
        bands: Band::visnir(),
        resolution: Resolution::R10,
        granules: vec!["32UNG".to_string()],
        max_cloud_cover: 30.0,
        min_data_cover: 50.0,
    };
    for product in products {
        let report = s2dos::api::export_product(&product, Path::new("/out"), &params, true)?;
        println!("exported={} skipped={}", report.exported.len(), report.skipped.len());
    }
    Ok(())
}
```

Error handling
--------------
All public functions return `s2dos::Result<T>`; match on `s2dos::Error` to handle specific
cases, e.g. a band without a detectable dark object.

```rust,no_run
use s2dos::Error;

fn report(err: Error) {
    match err {
        Error::DarkObjectNotFound { band, .. } => eprintln!("band {band} has no dark object"),
        Error::Metadata(e) => eprintln!("metadata error: {e}"),
        other => eprintln!("other error: {other}"),
    }
}
```

Useful modules
--------------
- [`api`] — high-level, ergonomic entry points.
- [`core`] — dark object estimation, radiometric conversion, indices.
- [`types`] — enums and core types (e.g. `CorrectionMethod`, `Band`, `RasterImage`).
- [`io`] — metadata parsing, GDAL reader, raster writers, zip extraction.
- [`error`] — crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use crate::core::params::{CorrectionParams, ExportParams};
pub use crate::core::processing::pipeline::CorrectedRaster;
pub use error::{Error, Result};
pub use types::{Band, CorrectionMethod, DarkObjectPolicy, GeoTransform, RasterImage, Resolution};

// Readers
pub use io::gdal::{GdalError, GdalMetadata, RasterReader};
pub use io::sentinel2::{MetadataError, MetadataRecord, ProductMetadata, TileMetadata};

// Writers
pub use io::writers::metadata::extract_metadata_fields;
pub use io::writers::{Destination, write_raster, write_raster_with_nodata};
