//! Georeferencing of a GeoTIFF image directory
//!
//! Resolves the pixel-to-world transform from the GeoTIFF model tags and
//! the nodata sentinel from the GDAL_NODATA tag.

use log::{debug, warn};
use std::fmt;

use crate::coordinate::GeoTransform;
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{geo_keys, tags};
use crate::tiff::errors::TiffResult;
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;
use crate::tiff::types::SampleKind;

/// Where the transform came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformSource {
    ModelTransformation,
    TiepointAndScale,
    /// No model tags; coordinates are pixel positions
    Missing,
}

impl fmt::Display for TransformSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransformSource::ModelTransformation => "ModelTransformationTag",
            TransformSource::TiepointAndScale => "ModelTiepointTag + ModelPixelScaleTag",
            TransformSource::Missing => "none (pixel space)",
        })
    }
}

/// Transform and nodata of one raster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Georeference {
    pub transform: GeoTransform,
    pub source: TransformSource,
    pub pixel_is_point: bool,
    /// Already narrowed to the precision of the band's samples
    pub nodata: Option<f64>,
}

impl Georeference {
    /// Reads the georeferencing tags of `ifd`
    ///
    /// `name` only labels log messages.
    pub fn read(tiff_reader: &TiffReader, reader: &mut dyn SeekableReader, ifd: &IFD,
                kind: SampleKind, name: &str) -> TiffResult<Self> {
        let (mut transform, source) = read_transform(tiff_reader, reader, ifd)?;
        if source == TransformSource::Missing {
            warn!("{} has no georeferencing tags, emitting pixel coordinates", name);
        }

        let pixel_is_point = raster_type(tiff_reader, reader, ifd)? == Some(geo_keys::PIXEL_IS_POINT);
        if pixel_is_point {
            transform = transform.shifted_for_pixel_is_point();
        }

        let nodata = if ifd.has_tag(tags::GDAL_NODATA) {
            let text = tiff_reader.read_tag_ascii(reader, ifd, tags::GDAL_NODATA)?;
            let parsed = parse_nodata(&text);
            if parsed.is_none() {
                warn!("{} has unparseable nodata value {:?}, ignoring it", name, text);
            }
            parsed.map(|value| kind.normalize_nodata(value))
        } else {
            None
        };

        debug!("{}: transform {} from {}, nodata {:?}", name, transform, source, nodata);
        Ok(Georeference { transform, source, pixel_is_point, nodata })
    }
}

fn read_transform(tiff_reader: &TiffReader, reader: &mut dyn SeekableReader,
                  ifd: &IFD) -> TiffResult<(GeoTransform, TransformSource)> {
    if ifd.has_tag(tags::MODEL_TRANSFORMATION_TAG) {
        let matrix = tiff_reader.read_tag_f64s(reader, ifd, tags::MODEL_TRANSFORMATION_TAG)?;
        if let Some(transform) = GeoTransform::from_model_transformation(&matrix) {
            return Ok((transform, TransformSource::ModelTransformation));
        }
    }

    if ifd.has_tag(tags::MODEL_TIEPOINT_TAG) && ifd.has_tag(tags::MODEL_PIXEL_SCALE_TAG) {
        let tiepoint = tiff_reader.read_tag_f64s(reader, ifd, tags::MODEL_TIEPOINT_TAG)?;
        let scale = tiff_reader.read_tag_f64s(reader, ifd, tags::MODEL_PIXEL_SCALE_TAG)?;
        if let Some(transform) = GeoTransform::from_tiepoint_scale(&tiepoint, &scale) {
            return Ok((transform, TransformSource::TiepointAndScale));
        }
    }

    Ok((GeoTransform::identity(), TransformSource::Missing))
}

/// GTRasterTypeGeoKey from the GeoKeyDirectoryTag, if present
fn raster_type(tiff_reader: &TiffReader, reader: &mut dyn SeekableReader,
               ifd: &IFD) -> TiffResult<Option<u16>> {
    if !ifd.has_tag(tags::GEO_KEY_DIRECTORY_TAG) {
        return Ok(None);
    }

    let directory = tiff_reader.read_tag_values(reader, ifd, tags::GEO_KEY_DIRECTORY_TAG)?;
    // Header: version, revision, minor revision, key count; then
    // (key id, location, count, value) per key. Location 0 means inline.
    let raster_type = directory
        .chunks_exact(4)
        .skip(1)
        .find(|key| key[0] == geo_keys::RASTER_TYPE as u64 && key[1] == 0)
        .map(|key| key[3] as u16);

    Ok(raster_type)
}

/// Parses GDAL_NODATA text; `nan` in any case is NaN
pub fn parse_nodata(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    trimmed.parse::<f64>().ok()
}
