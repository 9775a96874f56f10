//! RGB channel-divergence heatmap.

use crate::spectro_pipeline::common::error::{AnalysisError, Result};
use crate::spectro_pipeline::image::RgbImage;

/// Per-pixel `|R-G| + |R-B| + |G-B|`, row-major.
///
/// Grey or white pixels score near zero regardless of brightness while dispersed
/// spectra and coloured fiducials score high, so the bands stand out as bright regions.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub width: usize,
    pub height: usize,
    data: Vec<f64>,
}

impl Heatmap {
    pub fn from_image(image: &RgbImage) -> Self {
        let data = image
            .data()
            .chunks_exact(RgbImage::CHANNELS)
            .map(|px| {
                let (r, g, b) = (px[0] as f64, px[1] as f64, px[2] as f64);
                (r - g).abs() + (r - b).abs() + (g - b).abs()
            })
            .collect();

        Self {
            width: image.width,
            height: image.height,
            data,
        }
    }

    /// Wraps precomputed values, e.g. a synthetic heatmap.
    pub fn from_raw(width: usize, height: usize, data: Vec<f64>) -> Result<Self> {
        if width == 0 || height == 0 || data.len() != width * height {
            return Err(AnalysisError::InvalidDimensions(width, height));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.width + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.width..(row + 1) * self.width]
    }

    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// Mean of every column over all rows.
    pub fn column_means(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.width];
        for row in self.data.chunks_exact(self.width) {
            for (sum, v) in sums.iter_mut().zip(row) {
                *sum += v;
            }
        }
        let n = self.height as f64;
        sums.into_iter().map(|s| s / n).collect()
    }

    /// Mean of every row over the inclusive column range `[first, last]`.
    pub fn row_means(&self, first: usize, last: usize) -> Vec<f64> {
        let n = (last - first + 1) as f64;
        self.data
            .chunks_exact(self.width)
            .map(|row| row[first..=last].iter().sum::<f64>() / n)
            .collect()
    }
}
