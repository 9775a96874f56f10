use std::io::Write;
use crate::spectro_pipeline::common::error::Result;
use crate::spectro_pipeline::image::types::RgbImage;

pub trait ImageWriter {
    fn write_image(&self, image: &RgbImage, output: &mut dyn Write) -> Result<()>;

    /// File extension, without the dot, of the format this writer produces.
    fn extension(&self) -> &'static str;
}
