use crate::spectro_pipeline::common::error::Result;
use crate::spectro_pipeline::image::RgbImage;

pub trait ImageRotator {
    /// Rotates `image` counter-clockwise (as displayed) by `angle_deg` degrees about its
    /// centre, keeping the original dimensions.
    fn rotate(&self, image: &RgbImage, angle_deg: f64) -> Result<RgbImage>;
}
