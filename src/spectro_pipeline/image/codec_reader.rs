//! JPEG/PNG reader implementation using the image library.

use image::DynamicImage;
use tracing::debug;

use crate::spectro_pipeline::common::error::{AnalysisError, Result};
use crate::spectro_pipeline::image::reader::ImageReader;
use crate::spectro_pipeline::image::types::RgbImage;

/// Reader for the compressed formats phone cameras produce.
pub struct CodecImageReader;

impl ImageReader for CodecImageReader {
    fn read_image(&self, data: &[u8]) -> Result<RgbImage> {
        debug!("Decoding image, {} bytes", data.len());

        let decoded = image::load_from_memory(data)
            .map_err(|e| AnalysisError::DecodeError(e.to_string()))?;

        let color = decoded.color();
        let channels = color.channel_count() as usize;
        let bits = color.bytes_per_pixel() as u32 * 8 / channels as u32;
        let (width, height) = (decoded.width() as usize, decoded.height() as usize);

        debug!("Decoded image: {}x{}, {:?}", width, height, color);

        match decoded {
            DynamicImage::ImageRgb8(buffer) => {
                RgbImage::from_samples(width, height, channels, bits, buffer.into_raw())
            }
            _ if channels != RgbImage::CHANNELS => Err(AnalysisError::InvalidChannelCount(channels)),
            _ => Err(AnalysisError::UnsupportedSampleDepth(format!("{color:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use std::io::Cursor;

    fn encode_png(image: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_reads_rgb8_png() {
        let pixels: Vec<u8> = (0..3 * 4 * 3).map(|v| (v * 5) as u8).collect();
        let buffer = image::RgbImage::from_raw(3, 4, pixels.clone()).unwrap();
        let bytes = encode_png(DynamicImage::ImageRgb8(buffer));

        let decoded = CodecImageReader.read_image(&bytes).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 4));
        assert_eq!(decoded.data(), &pixels[..]);
    }

    #[test]
    fn test_rejects_rgba() {
        let buffer = image::RgbaImage::new(2, 2);
        let bytes = encode_png(DynamicImage::ImageRgba8(buffer));
        let result = CodecImageReader.read_image(&bytes);
        assert!(matches!(result, Err(AnalysisError::InvalidChannelCount(4))));
    }

    #[test]
    fn test_rejects_16_bit() {
        let buffer: image::ImageBuffer<image::Rgb<u16>, Vec<u16>> = image::ImageBuffer::new(2, 2);
        let bytes = encode_png(DynamicImage::ImageRgb16(buffer));
        let result = CodecImageReader.read_image(&bytes);
        assert!(matches!(result, Err(AnalysisError::UnsupportedSampleDepth(_))));
    }

    #[test]
    fn test_rejects_garbage() {
        let result = CodecImageReader.read_image(b"not an image");
        assert!(matches!(result, Err(AnalysisError::DecodeError(_))));
    }
}
