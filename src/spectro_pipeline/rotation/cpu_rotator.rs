use image::Rgb;
use imageproc::geometric_transformations::{Interpolation, Projection, warp};
use tracing::info;

use crate::spectro_pipeline::common::error::{AnalysisError, Result};
use crate::spectro_pipeline::image::RgbImage;
use crate::spectro_pipeline::rotation::rotator::ImageRotator;

/// Nearest-neighbour rotation about the image centre on the CPU, backed by `imageproc`.
/// Pixels that map outside the source are black.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuRotator;

impl CpuRotator {
    pub fn new() -> Self {
        Self
    }
}

impl ImageRotator for CpuRotator {
    fn rotate(&self, image: &RgbImage, angle_deg: f64) -> Result<RgbImage> {
        if !angle_deg.is_finite() {
            return Err(AnalysisError::RotationFailed(format!(
                "angle {angle_deg} is not finite"
            )));
        }

        let (width, height) = (image.width, image.height);
        info!("Rotating {}x{} image by {:.3} deg", width, height, angle_deg);

        let buffer = image::RgbImage::from_raw(width as u32, height as u32, image.data().to_vec())
            .ok_or_else(|| {
                AnalysisError::RotationFailed(format!("{width}x{height} buffer has the wrong size"))
            })?;

        // Projection::rotate turns clockwise on screen, so a visual counter-clockwise turn
        // takes the negated angle. The centre is in pixel-index coordinates.
        let (cx, cy) = ((width as f32 - 1.0) / 2.0, (height as f32 - 1.0) / 2.0);
        let projection = Projection::translate(cx, cy)
            * Projection::rotate(-(angle_deg.to_radians() as f32))
            * Projection::translate(-cx, -cy);

        let rotated = warp(&buffer, &projection, Interpolation::Nearest, Rgb([0, 0, 0]));
        RgbImage::new(width, height, rotated.into_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_angle_is_identity() {
        let image = RgbImage::from_fn(6, 9, |r, c| [r as u8, c as u8, 1]).unwrap();
        assert_eq!(CpuRotator.rotate(&image, 0.0).unwrap(), image);
    }

    #[test]
    fn test_quarter_turn_counter_clockwise() {
        // A marker right of centre moves above centre after a visual CCW quarter turn.
        let image = RgbImage::from_fn(11, 11, |r, c| {
            if r == 5 && c == 9 { [255, 0, 0] } else { [0, 0, 0] }
        })
        .unwrap();
        let rotated = CpuRotator.rotate(&image, 90.0).unwrap();
        assert_eq!(rotated.pixel(1, 5), [255, 0, 0]);
        assert_eq!(rotated.pixel(5, 9), [0, 0, 0]);
    }

    #[test]
    fn test_rejects_nan_angle() {
        let image = RgbImage::from_fn(2, 2, |_, _| [0, 0, 0]).unwrap();
        assert!(matches!(
            CpuRotator.rotate(&image, f64::NAN),
            Err(AnalysisError::RotationFailed(_))
        ));
    }
}
