//! Image data types

use std::fmt;
use std::str::FromStr;

use crate::spectro_pipeline::common::error::{AnalysisError, Result};

/// Decoded 8-bit RGB image, row-major with interleaved samples `[R, G, B, R, G, B, ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbImage {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    data: Vec<u8>,
}

impl RgbImage {
    pub const CHANNELS: usize = 3;

    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AnalysisError::InvalidDimensions(width, height));
        }
        if data.len() != width * height * Self::CHANNELS {
            return Err(AnalysisError::DecodeError(format!(
                "expected {} samples for {}x{} RGB, got {}",
                width * height * Self::CHANNELS,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Validates a decoder's sample layout before accepting its buffer.
    pub fn from_samples(
        width: usize,
        height: usize,
        channels: usize,
        bits_per_sample: u32,
        data: Vec<u8>,
    ) -> Result<Self> {
        if channels != Self::CHANNELS {
            return Err(AnalysisError::InvalidChannelCount(channels));
        }
        if bits_per_sample != 8 {
            return Err(AnalysisError::UnsupportedSampleDepth(format!(
                "{bits_per_sample}-bit"
            )));
        }
        Self::new(width, height, data)
    }

    /// Builds an image by evaluating `f(row, col)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> [u8; 3]) -> Result<Self> {
        let mut data = Vec::with_capacity(width * height * Self::CHANNELS);
        for row in 0..height {
            for col in 0..width {
                data.extend_from_slice(&f(row, col));
            }
        }
        Self::new(width, height, data)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn pixel(&self, row: usize, col: usize) -> [u8; 3] {
        let i = (row * self.width + col) * Self::CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Samples of one image row.
    pub fn row(&self, row: usize) -> &[u8] {
        let stride = self.width * Self::CHANNELS;
        &self.data[row * stride..(row + 1) * stride]
    }

    pub fn is_portrait(&self) -> bool {
        self.height >= self.width
    }

    /// Copies the `height x width` window whose top-left corner is `(top, left)`.
    pub fn crop(&self, top: usize, left: usize, width: usize, height: usize) -> Result<Self> {
        if top + height > self.height || left + width > self.width {
            return Err(AnalysisError::InvalidDimensions(width, height));
        }
        let mut data = Vec::with_capacity(width * height * Self::CHANNELS);
        for row in top..top + height {
            let start = left * Self::CHANNELS;
            data.extend_from_slice(&self.row(row)[start..start + width * Self::CHANNELS]);
        }
        Self::new(width, height, data)
    }

    /// Keeps the central half of the image in both dimensions.
    pub fn trim_edges(&self) -> Result<Self> {
        let (top, bottom) = (self.height / 4, self.height * 3 / 4);
        let (left, right) = (self.width / 4, self.width * 3 / 4);
        self.crop(top, left, right - left, bottom - top)
    }
}

/// One color channel of an RGB sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    pub fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        }
    }
}

impl FromStr for Channel {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "r" | "red" => Ok(Channel::Red),
            "g" | "green" => Ok(Channel::Green),
            "b" | "blue" => Ok(Channel::Blue),
            _ => Err(AnalysisError::InvalidChannel(s.to_string())),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
