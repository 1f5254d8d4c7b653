use std::path::Path;

use dicom::{
    object::open_file,
    pixeldata::{ConvertOptions, ModalityLutOption, PixelDecoder, VoiLutOption},
};
use dicom_dictionary_std::tags;
use ndarray::{Array2, s};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SliceDecodeError {
    #[error("failed to read DICOM object: {0}")]
    Read(#[from] dicom::object::ReadError),

    #[error("missing or invalid RescaleIntercept")]
    MissingRescaleIntercept,

    #[error("failed to decode pixel data: {0}")]
    PixelData(#[from] dicom::pixeldata::Error),
}

/// One decoded single-frame image: physical intensities plus the
/// information needed to place it within a series.
#[derive(Debug, Clone)]
pub struct DecodedSlice {
    /// Physical intensity values (e.g. Hounsfield Units), row-major.
    pub physical: Array2<f32>,
    /// Position along the series axis (ImagePositionPatient z), if present.
    pub sort_key: Option<f32>,
    pub basename: String,
}

/// Decode a single DICOM file into physical intensity values.
///
/// Stored pixel values are rescaled as `value * RescaleSlope +
/// RescaleIntercept`. RescaleIntercept is required; a missing RescaleSlope
/// defaults to 1. Only the first frame of the object is used.
pub fn decode_slice(path: &Path) -> Result<DecodedSlice, SliceDecodeError> {
    let obj = open_file(path)?;

    let intercept = obj
        .element(tags::RESCALE_INTERCEPT)
        .ok()
        .and_then(|el| el.to_float32().ok())
        .ok_or(SliceDecodeError::MissingRescaleIntercept)?;
    let slope = obj
        .element(tags::RESCALE_SLOPE)
        .ok()
        .and_then(|el| el.to_float32().ok())
        .unwrap_or(1.0);

    let sort_key = obj
        .element(tags::IMAGE_POSITION_PATIENT)
        .ok()
        .and_then(|el| el.to_multi_float32().ok())
        .and_then(|pos| pos.get(2).copied());

    let options = ConvertOptions::new()
        .with_modality_lut(ModalityLutOption::None)
        .with_voi_lut(VoiLutOption::Identity);
    let stored = obj
        .decode_pixel_data()?
        .to_ndarray_with_options::<f32>(&options)?
        .slice_move(s![0, .., .., 0]);

    let physical = stored.mapv(|value| value * slope + intercept);

    let basename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(DecodedSlice {
        physical,
        sort_key,
        basename,
    })
}
