mod common;

use std::collections::BTreeMap;

use gdal::Metadata;
use gdal::spatial_ref::SpatialRef;
use ndarray::Array3;
use s2dos::{Destination, Error, RasterImage, RasterReader, write_raster, write_raster_with_nodata};
use tempfile::TempDir;

use common::{ULX, ULY, stack};

#[test]
fn test_memory_sink_keeps_georeferencing_and_nodata() {
    let image = stack(3, 5, 7, |b, r, c| (b * 100 + r * 7 + c) as u16);
    let mut items = BTreeMap::new();
    items.insert("CORRECTION_METHOD".to_string(), "TOA".to_string());

    let ds = write_raster(&image, &Destination::Memory, &items).unwrap();
    assert_eq!(ds.raster_size(), (7, 5));
    assert_eq!(ds.raster_count(), 3);
    assert_eq!(ds.geo_transform().unwrap(), image.geotransform);
    assert_eq!(ds.metadata_item("CORRECTION_METHOD", "").as_deref(), Some("TOA"));

    for b in 1..=3 {
        let band = ds.rasterband(b).unwrap();
        assert_eq!(band.no_data_value(), Some(0.0));
        let buf = band.read_as::<u16>((0, 0), (7, 5), (7, 5), None).unwrap();
        let expected: Vec<u16> = image.band(b - 1).iter().copied().collect();
        assert_eq!(buf.data(), expected.as_slice());
    }
}

#[test]
fn test_geotiff_roundtrip_u16() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("dos.tif");
    let image = stack(9, 16, 12, |b, r, c| if r == 0 { 0 } else { (b + r * c) as u16 });

    let ds = write_raster(&image, &Destination::file(&path), &BTreeMap::new()).unwrap();
    drop(ds);

    let ds = gdal::Dataset::open(&path).unwrap();
    assert_eq!(
        ds.metadata_item("COMPRESSION", "IMAGE_STRUCTURE").as_deref(),
        Some("DEFLATE")
    );
    // Tiled GeoTIFFs use square blocks; strips span the full 12-pixel width
    let (block_x, block_y) = ds.rasterband(1).unwrap().block_size();
    assert_eq!(block_x, block_y);
    assert!(block_y > 1);
    drop(ds);

    let reader = RasterReader::open(&path).unwrap();
    assert_eq!(reader.metadata.bands, 9);
    assert_eq!(reader.metadata.no_data, Some(0.0));
    let back = reader.read_u16().unwrap();
    assert_eq!(back.data, image.data);
    assert_eq!(back.geotransform, [ULX, 10.0, 0.0, ULY, 0.0, -10.0]);

    let written = SpatialRef::from_wkt(&back.projection).unwrap();
    let expected = SpatialRef::from_epsg(32632).unwrap();
    assert_eq!(written.auth_code().unwrap(), expected.auth_code().unwrap());
    assert_eq!(
        s2dos::io::gdal::parse_epsg(&back.projection).as_deref(),
        Some("EPSG:32632")
    );
}

#[test]
fn test_geotiff_roundtrip_f32_is_exact() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("rad.tif");
    let data = Array3::from_shape_fn((9, 4, 4), |(b, r, c)| {
        (b as f32 + 1.0) * 79577.47 + r as f32 * 0.125 - c as f32 * 3.5
    });
    let image = RasterImage::new(data, [ULX, 20.0, 0.0, ULY, 0.0, -20.0], "EPSG:32632");

    drop(write_raster(&image, &Destination::file(&path), &BTreeMap::new()).unwrap());

    let back = RasterReader::open(&path).unwrap().read_f32().unwrap();
    assert_eq!(back.data, image.data);
    assert_eq!(back.geotransform, image.geotransform);
}

#[test]
fn test_explicit_nodata_or_none() {
    let image = stack(2, 3, 3, |_, _, _| 0);
    let ds = write_raster_with_nodata(&image, &Destination::Memory, &BTreeMap::new(), None).unwrap();
    assert_eq!(ds.rasterband(1).unwrap().no_data_value(), None);

    let ds = write_raster_with_nodata(&image, &Destination::Memory, &BTreeMap::new(), Some(65535.0))
        .unwrap();
    assert_eq!(ds.rasterband(2).unwrap().no_data_value(), Some(65535.0));
}

#[test]
fn test_unwritable_destination_is_a_write_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("missing_dir").join("out.tif");
    let image = stack(1, 2, 2, |_, _, _| 1);
    let err = write_raster(&image, &Destination::file(&path), &BTreeMap::new()).unwrap_err();
    match err {
        Error::Write { destination, .. } => assert!(destination.ends_with("out.tif")),
        other => panic!("expected write error, got {other}"),
    }
}
