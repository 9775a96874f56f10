use crate::spectro_pipeline::common::error::Result;
use crate::spectro_pipeline::image::codec_reader::CodecImageReader;
use crate::spectro_pipeline::image::reader::ImageReader;
use crate::spectro_pipeline::image::tiff_reader::{TiffImageReader, is_tiff};
use crate::spectro_pipeline::image::types::RgbImage;

/// Sends TIFF input to [`TiffImageReader`] and everything else to [`CodecImageReader`].
#[derive(Default)]
pub struct AutoImageReader;

impl ImageReader for AutoImageReader {
    fn read_image(&self, data: &[u8]) -> Result<RgbImage> {
        if is_tiff(data) {
            TiffImageReader.read_image(data)
        } else {
            CodecImageReader.read_image(data)
        }
    }
}
