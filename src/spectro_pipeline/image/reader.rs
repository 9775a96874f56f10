use crate::spectro_pipeline::common::error::Result;
use crate::spectro_pipeline::image::types::RgbImage;

pub trait ImageReader {
    fn read_image(&self, data: &[u8]) -> Result<RgbImage>;
}
