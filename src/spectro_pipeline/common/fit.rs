//! Degree-1 least-squares fitting shared by the tilt check, the wavelength axis and the
//! concentration calibration.

use crate::spectro_pipeline::common::error::{AnalysisError, Result};

/// A fitted line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Fits a line through `(xs[i], ys[i])` minimising the squared vertical residuals.
    ///
    /// Fails when fewer than two points are given, the slices differ in length, or every
    /// `x` is identical.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(AnalysisError::DegenerateFit(format!(
                "{} x values but {} y values",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(AnalysisError::DegenerateFit(format!(
                "need at least 2 points, got {}",
                xs.len()
            )));
        }

        let n = xs.len() as f64;
        let mean_x = xs.iter().sum::<f64>() / n;
        let mean_y = ys.iter().sum::<f64>() / n;

        let (mut sxx, mut sxy) = (0.0, 0.0);
        for (&x, &y) in xs.iter().zip(ys) {
            let dx = x - mean_x;
            sxx += dx * dx;
            sxy += dx * (y - mean_y);
        }

        if sxx == 0.0 || !sxx.is_finite() {
            return Err(AnalysisError::DegenerateFit(
                "all x values are identical".to_string(),
            ));
        }

        let slope = sxy / sxx;
        Ok(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    /// Fits `y` against the sample index `0, 1, 2, ...`.
    pub fn fit_indexed(ys: &[f64]) -> Result<Self> {
        let xs: Vec<f64> = (0..ys.len()).map(|i| i as f64).collect();
        Self::fit(&xs, ys)
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}
