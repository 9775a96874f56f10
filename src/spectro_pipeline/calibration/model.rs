use std::fmt;

use crate::spectro_pipeline::common::constants::{DEFAULT_B, DEFAULT_K};
use crate::spectro_pipeline::common::error::{AnalysisError, Result};
use crate::spectro_pipeline::common::fit::LinearFit;

/// Coefficients of `concentration = k * log10(intensity) + b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationCoefficients {
    pub k: f64,
    pub b: f64,
}

impl Default for CalibrationCoefficients {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            b: DEFAULT_B,
        }
    }
}

impl CalibrationCoefficients {
    pub fn new(k: f64, b: f64) -> Self {
        Self { k, b }
    }

    pub fn concentration(&self, intensity: f64) -> Result<f64> {
        if intensity.is_nan() || intensity <= 0.0 {
            return Err(AnalysisError::NonPositiveIntensity(intensity));
        }
        Ok(self.k * intensity.log10() + self.b)
    }

    /// Least-squares fit of known concentrations against `log10` of the measured intensities.
    pub fn fit(intensities: &[f64], concentrations: &[f64]) -> Result<Self> {
        if intensities.len() != concentrations.len() {
            return Err(AnalysisError::LengthMismatch {
                images: intensities.len(),
                concentrations: concentrations.len(),
            });
        }

        let log_intensities = intensities
            .iter()
            .map(|&i| {
                if i > 0.0 {
                    Ok(i.log10())
                } else {
                    Err(AnalysisError::NonPositiveIntensity(i))
                }
            })
            .collect::<Result<Vec<f64>>>()?;

        let fit = LinearFit::fit(&log_intensities, concentrations)?;
        Ok(Self::new(fit.slope, fit.intercept))
    }
}

/// Where the coefficients used for a measurement came from.
#[derive(Debug, Clone, PartialEq)]
pub enum CoefficientSource {
    Record { date: String, time: String },
    Manual,
    Default,
}

impl fmt::Display for CoefficientSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoefficientSource::Record { date, time } => {
                write!(f, "calibration record from {date} {time}")
            }
            CoefficientSource::Manual => f.write_str("manually supplied coefficients"),
            CoefficientSource::Default => f.write_str("default coefficients"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_conversion() {
        let coefficients = CalibrationCoefficients::default();
        let nc = coefficients.concentration(0.75).unwrap();
        assert!((nc - (-7.8279 * 0.75f64.log10() - 0.14917)).abs() < 1e-12);
        assert!((coefficients.concentration(1.0).unwrap() - DEFAULT_B).abs() < 1e-12);
    }

    #[test]
    fn test_non_positive_intensity() {
        let coefficients = CalibrationCoefficients::default();
        assert!(matches!(
            coefficients.concentration(0.0),
            Err(AnalysisError::NonPositiveIntensity(_))
        ));
        assert!(coefficients.concentration(f64::NAN).is_err());
    }

    #[test]
    fn test_fit_recovers_model() {
        let truth = CalibrationCoefficients::new(-8.0, 0.5);
        let intensities = [0.9, 0.7, 0.5, 0.3];
        let concentrations: Vec<f64> = intensities
            .iter()
            .map(|&i| truth.concentration(i).unwrap())
            .collect();

        let fitted = CalibrationCoefficients::fit(&intensities, &concentrations).unwrap();
        assert!((fitted.k - truth.k).abs() < 1e-9);
        assert!((fitted.b - truth.b).abs() < 1e-9);
    }

    #[test]
    fn test_fit_length_mismatch() {
        let result = CalibrationCoefficients::fit(&[0.5, 0.6], &[1.0]);
        assert!(matches!(
            result,
            Err(AnalysisError::LengthMismatch { images: 2, concentrations: 1 })
        ));
    }
}
