pub mod metadata;
pub mod raster;

pub use raster::{Destination, NO_DATA_VALUE, write_raster, write_raster_with_nodata};
