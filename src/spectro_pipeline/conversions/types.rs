use std::path::PathBuf;

use crate::spectro_pipeline::analysis::{
    AlignmentResult, BandGeometry, Heatmap, IntegratedIntensity, SpectralExtraction,
};
use crate::spectro_pipeline::calibration::{
    AbsorbancePlot, CalibrationCoefficients, CalibrationRecord, CoefficientSource,
};
use crate::spectro_pipeline::image::RgbImage;

/// An image whose band geometry was located and whose tilt was checked. All fields
/// describe the same image generation; a rotation produces a new `AlignedImage`.
#[derive(Debug, Clone)]
pub struct AlignedImage {
    pub image: RgbImage,
    pub heatmap: Heatmap,
    pub geometry: BandGeometry,
    pub alignment: AlignmentResult,
    /// Rotations applied before this generation was accepted.
    pub rotations: usize,
    /// Accepted although the tilt exceeds tolerance.
    pub tilt_accepted: bool,
}

#[derive(Debug, Clone)]
pub struct SpectralAnalysis {
    pub aligned: AlignedImage,
    pub extraction: SpectralExtraction,
    pub intensity: IntegratedIntensity,
}

#[derive(Debug, Clone)]
pub struct Measurement {
    pub analysis: SpectralAnalysis,
    pub coefficients: CalibrationCoefficients,
    pub source: CoefficientSource,
    /// Nitrate concentration in mg/L
    pub concentration: f64,
}

#[derive(Debug, Clone)]
pub struct CalibrationOutcome {
    pub coefficients: CalibrationCoefficients,
    /// Average window intensity of each image, in input order.
    pub intensities: Vec<f64>,
    pub record: CalibrationRecord,
    pub record_path: PathBuf,
    pub plot: Option<AbsorbancePlot>,
}
