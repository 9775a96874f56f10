use std::io::Write;
use tiff::encoder::{Compression, TiffEncoder, colortype, compression::DeflateLevel};
use tracing::debug;
use crate::spectro_pipeline::common::error::{AnalysisError, Result};
use crate::spectro_pipeline::image::types::RgbImage;
use crate::spectro_pipeline::image::writer::ImageWriter;

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    #[default]
    None,
    /// LZW compression
    Lzw,
    /// Deflate compression - balanced level
    Deflate,
}

impl From<TiffCompression> for Compression {
    fn from(compression: TiffCompression) -> Self {
        match compression {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::Deflate => Compression::Deflate(DeflateLevel::Balanced),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TiffImageWriter {
    pub compression: TiffCompression,
}

impl TiffImageWriter {
    pub fn new(compression: TiffCompression) -> Self {
        Self { compression }
    }
}

impl ImageWriter for TiffImageWriter {
    fn write_image(&self, image: &RgbImage, output: &mut dyn Write) -> Result<()> {
        debug!("Encoding TIFF image: {}x{}", image.width, image.height);

        let mut buffer = Vec::new();
        {
            let mut encoder = TiffEncoder::new(std::io::Cursor::new(&mut buffer))
                .map_err(|e| AnalysisError::EncodeError(e.to_string()))?
                .with_compression(self.compression.into());

            encoder
                .write_image::<colortype::RGB8>(
                    image.width as u32,
                    image.height as u32,
                    image.data(),
                )
                .map_err(|e| AnalysisError::EncodeError(e.to_string()))?;
        }

        output.write_all(&buffer)?;

        debug!("TIFF encoding complete, {} bytes", buffer.len());
        Ok(())
    }

    fn extension(&self) -> &'static str {
        "tiff"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectro_pipeline::image::{ImageReader, TiffImageReader};

    #[test]
    fn test_written_tiff_reads_back() {
        let image = RgbImage::from_fn(5, 7, |r, c| [(r * 30) as u8, (c * 40) as u8, 9]).unwrap();

        for compression in [TiffCompression::None, TiffCompression::Lzw, TiffCompression::Deflate] {
            let mut bytes = Vec::new();
            TiffImageWriter::new(compression)
                .write_image(&image, &mut bytes)
                .unwrap();
            let decoded = TiffImageReader.read_image(&bytes).unwrap();
            assert_eq!(decoded, image, "compression {compression:?}");
        }
    }
}
