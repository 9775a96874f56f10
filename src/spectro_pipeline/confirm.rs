//! Confirmation service
//!
//! The numeric stages never ask questions. The orchestration layer raises a [`Prompt`] at
//! each decision point and a [`Confirmer`] answers it: interactively in the CLI, or with
//! a fixed policy in batch runs and tests.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::spectro_pipeline::calibration::CalibrationCoefficients;

#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    /// The image is wider than it is tall.
    LandscapeOrientation { width: usize, height: usize },
    /// The image was cropped to its central half; continue with the crop?
    TrimmedImage { width: usize, height: usize },
    /// The band is tilted beyond tolerance; rotate by `correction_deg`?
    RotateTiltedImage { tilt_deg: f64, correction_deg: f64 },
    /// Rotation was declined, unavailable or did not help; measure the tilted image anyway?
    ContinueWithTilt { tilt_deg: f64 },
    /// A calibration record already exists at this path; overwrite it?
    OverwriteRecord { path: PathBuf },
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prompt::LandscapeOrientation { width, height } => {
                write!(f, "Image appears to be landscape ({width}x{height}). Continue?")
            }
            Prompt::TrimmedImage { width, height } => {
                write!(f, "Continue with the trimmed {width}x{height} image?")
            }
            Prompt::RotateTiltedImage { tilt_deg, .. } => write!(
                f,
                "Image tilt ~ {tilt_deg:.3} deg outside permitted range. Let program rotate image?"
            ),
            Prompt::ContinueWithTilt { tilt_deg } => write!(
                f,
                "Continuing with a {tilt_deg:.3} deg tilt could result in significant measurement error. Continue anyway?"
            ),
            Prompt::OverwriteRecord { path } => write!(
                f,
                "Calibration record '{}' already exists. Overwrite this record?",
                path.display()
            ),
        }
    }
}

pub trait Confirmer {
    fn confirm(&self, prompt: &Prompt) -> bool;

    /// Coefficients to use when no calibration record exists.
    fn manual_coefficients(&self) -> Option<CalibrationCoefficients> {
        None
    }

    /// Alternative path when overwriting `existing` was declined.
    fn alternate_record_path(&self, _existing: &Path) -> Option<PathBuf> {
        None
    }
}

/// Answers every prompt with the same decision.
#[derive(Debug, Clone, Copy)]
pub struct FixedConfirmer {
    pub answer: bool,
    pub manual: Option<CalibrationCoefficients>,
}

impl FixedConfirmer {
    pub fn accept_all() -> Self {
        Self {
            answer: true,
            manual: None,
        }
    }

    pub fn decline_all() -> Self {
        Self {
            answer: false,
            manual: None,
        }
    }

    pub fn with_manual_coefficients(mut self, coefficients: CalibrationCoefficients) -> Self {
        self.manual = Some(coefficients);
        self
    }
}

impl Confirmer for FixedConfirmer {
    fn confirm(&self, _prompt: &Prompt) -> bool {
        self.answer
    }

    fn manual_coefficients(&self) -> Option<CalibrationCoefficients> {
        self.manual
    }
}
