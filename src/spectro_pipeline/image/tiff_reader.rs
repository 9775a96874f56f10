//! TIFF reader implementation using the tiff library.
//!
//! Only baseline 8-bit RGB strips and tiles are accepted; anything else is reported with
//! the channel count or sample depth the decoder found so the caller can tell the user
//! which part of the image contract failed.

use std::io::Cursor;

use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tracing::debug;

use crate::spectro_pipeline::common::error::{AnalysisError, Result};
use crate::spectro_pipeline::image::reader::ImageReader;
use crate::spectro_pipeline::image::types::RgbImage;

pub struct TiffImageReader;

/// Little- and big-endian TIFF signatures.
pub(crate) const TIFF_MAGIC: [[u8; 4]; 2] = [*b"II*\0", *b"MM\0*"];

pub(crate) fn is_tiff(data: &[u8]) -> bool {
    data.len() >= 4 && TIFF_MAGIC.iter().any(|magic| data[..4] == magic[..])
}

/// Returns `(channels, bits_per_sample)` for a TIFF color type.
fn sample_layout(color: ColorType) -> Result<(usize, u32)> {
    match color {
        ColorType::Gray(bits) | ColorType::Palette(bits) => Ok((1, bits as u32)),
        ColorType::GrayA(bits) => Ok((2, bits as u32)),
        ColorType::RGB(bits) => Ok((3, bits as u32)),
        ColorType::RGBA(bits) | ColorType::CMYK(bits) => Ok((4, bits as u32)),
        ColorType::Multiband {
            bit_depth,
            num_samples,
        } => Ok((num_samples as usize, bit_depth as u32)),
        other => Err(AnalysisError::DecodeError(format!(
            "unsupported TIFF color type {other:?}"
        ))),
    }
}

impl ImageReader for TiffImageReader {
    fn read_image(&self, data: &[u8]) -> Result<RgbImage> {
        debug!("Decoding TIFF image, {} bytes", data.len());

        let mut decoder = Decoder::new(Cursor::new(data))
            .map_err(|e| AnalysisError::DecodeError(e.to_string()))?;

        let (width, height) = decoder
            .dimensions()
            .map_err(|e| AnalysisError::DecodeError(e.to_string()))?;
        let color = decoder
            .colortype()
            .map_err(|e| AnalysisError::DecodeError(e.to_string()))?;
        let (channels, bits) = sample_layout(color)?;

        debug!("TIFF image: {}x{}, {} channels at {} bits", width, height, channels, bits);

        // Reject before decoding the pixel data so the error names the real cause.
        if channels != RgbImage::CHANNELS {
            return Err(AnalysisError::InvalidChannelCount(channels));
        }
        if bits != 8 {
            return Err(AnalysisError::UnsupportedSampleDepth(format!("{bits}-bit")));
        }

        let samples = match decoder
            .read_image()
            .map_err(|e| AnalysisError::DecodeError(e.to_string()))?
        {
            DecodingResult::U8(samples) => samples,
            _ => {
                return Err(AnalysisError::UnsupportedSampleDepth(
                    "non-u8 sample buffer".to_string(),
                ));
            }
        };

        RgbImage::from_samples(width as usize, height as usize, channels, bits, samples)
    }
}
