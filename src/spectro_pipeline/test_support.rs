//! Synthetic spectrometer photographs shared by the unit tests.

use crate::spectro_pipeline::image::RgbImage;

pub const BACKGROUND: [u8; 3] = [40, 40, 40];
pub const REFERENCE_COLOR: [u8; 3] = [100, 120, 60];
pub const SAMPLE_COLOR: [u8; 3] = [60, 90, 30];

/// Rows of the red (top) and blue-tinted red (bottom) fiducial lines.
pub const FIDUCIAL_ROWS: (usize, usize) = (50, 150);

/// A level 160x201 photograph: reference band in columns 50..=70 with fiducials at rows
/// 50 and 150, flat sample band in columns 107..=127, grey elsewhere.
pub fn spectrometer_image() -> RgbImage {
    spectrometer_image_with_sample(SAMPLE_COLOR)
}

/// [`spectrometer_image`] with a differently coloured sample band.
pub fn spectrometer_image_with_sample(sample: [u8; 3]) -> RgbImage {
    RgbImage::from_fn(160, 201, |row, col| match col {
        50..=70 if row == FIDUCIAL_ROWS.0 => [250, REFERENCE_COLOR[1], REFERENCE_COLOR[2]],
        50..=70 if row == FIDUCIAL_ROWS.1 => [250, REFERENCE_COLOR[1], 200],
        50..=70 => REFERENCE_COLOR,
        107..=127 => sample,
        _ => BACKGROUND,
    })
    .expect("valid synthetic image")
}

/// `image` with the columns shifted right by `shear * row`, clamped at the border.
pub fn sheared(image: &RgbImage, shear: f64) -> RgbImage {
    RgbImage::from_fn(image.width, image.height, |row, col| {
        let shift = (shear * row as f64).round() as usize;
        if col < shift { BACKGROUND } else { image.pixel(row, col - shift) }
    })
    .expect("valid synthetic image")
}
