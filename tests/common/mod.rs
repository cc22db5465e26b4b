#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::Array3;
use s2dos::{Destination, RasterImage, write_raster};

pub const ULX: f64 = 499980.0;
pub const ULY: f64 = 6000000.0;

pub fn product_xml(irradiance: &[f64]) -> String {
    let list: String = irradiance
        .iter()
        .enumerate()
        .map(|(i, v)| {
            format!(
                "<SOLAR_IRRADIANCE bandId=\"{}\" unit=\"W/m²/µm\">{}</SOLAR_IRRADIANCE>",
                i, v
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<n1:Level-1C_User_Product xmlns:n1="https://psd-14.sentinel2.eo.esa.int/PSD/User_Product_Level-1C.xsd">
  <n1:General_Info>
    <Product_Info>
      <PRODUCT_START_TIME>2017-10-12T10:30:21.026Z</PRODUCT_START_TIME>
      <PRODUCT_URI>S2A_MSIL1C_20171012T103021_N0205_R108_T32UNG_20171012T103022.SAFE</PRODUCT_URI>
      <PROCESSING_BASELINE>02.05</PROCESSING_BASELINE>
      <Datatake datatakeIdentifier="GS2A_20171012T103021_012029_N02.05">
        <SPACECRAFT_NAME>Sentinel-2A</SPACECRAFT_NAME>
      </Datatake>
    </Product_Info>
    <Product_Image_Characteristics>
      <QUANTIFICATION_VALUE unit="none">10000</QUANTIFICATION_VALUE>
      <Reflectance_Conversion>
        <U>0.99765</U>
        <Solar_Irradiance_List>{}</Solar_Irradiance_List>
      </Reflectance_Conversion>
    </Product_Image_Characteristics>
  </n1:General_Info>
</n1:Level-1C_User_Product>"#,
        list
    )
}

/// Tile metadata with a 10 m grid of `rows10` x `rows10` pixels
pub fn tile_xml(rows10: usize, sun_zenith: f64, cloudy: f64) -> String {
    let size = |res: usize| {
        let n = rows10 * 10 / res;
        format!(
            "<Size resolution=\"{res}\"><NROWS>{n}</NROWS><NCOLS>{n}</NCOLS></Size>\
             <Geoposition resolution=\"{res}\"><ULX>{ulx}</ULX><ULY>{uly}</ULY></Geoposition>",
            res = res,
            n = n,
            ulx = ULX,
            uly = ULY
        )
    };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<n1:Level-1C_Tile_ID xmlns:n1="https://psd-14.sentinel2.eo.esa.int/PSD/S2_PDI_Level-1C_Tile_Metadata.xsd">
  <n1:General_Info>
    <TILE_ID metadataLevel="Brief">S2A_OPER_MSI_L1C_TL_SGS__20171012T103022_A012029_T32UNG_N02.05</TILE_ID>
  </n1:General_Info>
  <n1:Geometric_Info>
    <Tile_Geocoding metadataLevel="Brief">
      <HORIZONTAL_CS_CODE>EPSG:32632</HORIZONTAL_CS_CODE>
      {}{}{}
    </Tile_Geocoding>
    <Tile_Angles>
      <Mean_Sun_Angle>
        <ZENITH_ANGLE unit="deg">{}</ZENITH_ANGLE>
        <AZIMUTH_ANGLE unit="deg">165.2</AZIMUTH_ANGLE>
      </Mean_Sun_Angle>
    </Tile_Angles>
  </n1:Geometric_Info>
  <n1:Quality_Indicators_Info>
    <Image_Content_QI>
      <CLOUDY_PIXEL_PERCENTAGE>{}</CLOUDY_PIXEL_PERCENTAGE>
    </Image_Content_QI>
  </n1:Quality_Indicators_Info>
</n1:Level-1C_Tile_ID>"#,
        size(10),
        size(20),
        size(60),
        sun_zenith,
        cloudy
    )
}

/// Minimal unzipped product: main metadata plus one granule with tile metadata.
/// Returns (product_dir, granule_dir).
pub fn write_product(
    root: &Path,
    granule: &str,
    irradiance: &[f64],
    rows10: usize,
    sun_zenith: f64,
    cloudy: f64,
) -> (PathBuf, PathBuf) {
    let product = root.join("S2A_MSIL1C_20171012T103021_N0205_R108_T32UNG_20171012T103022.SAFE");
    let granule_dir = product.join("GRANULE").join(granule);
    fs::create_dir_all(granule_dir.join("IMG_DATA")).unwrap();
    fs::write(product.join("MTD_MSIL1C.xml"), product_xml(irradiance)).unwrap();
    fs::write(granule_dir.join("MTD_TL.xml"), tile_xml(rows10, sun_zenith, cloudy)).unwrap();
    (product, granule_dir)
}

/// Single-band GeoTIFF standing in for a JP2 band file (GDAL probes by content)
pub fn write_band_file(path: &Path, band: ndarray::Array2<u16>, res: f64) {
    let (rows, cols) = band.dim();
    let data = band.into_shape((1, rows, cols)).unwrap();
    let image = RasterImage::new(data, [ULX, res, 0.0, ULY, 0.0, -res], "EPSG:32632");
    let ds = write_raster(&image, &Destination::file(path), &Default::default()).unwrap();
    drop(ds);
}

pub fn stack(bands: usize, rows: usize, cols: usize, f: impl Fn(usize, usize, usize) -> u16) -> RasterImage<u16> {
    let data = Array3::from_shape_fn((bands, rows, cols), |(b, r, c)| f(b, r, c));
    RasterImage::new(data, [ULX, 10.0, 0.0, ULY, 0.0, -10.0], "EPSG:32632")
}
