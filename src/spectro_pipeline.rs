//! Spectral analysis pipeline module
//!
//! Turns a photograph of the spectrometer into a nitrate concentration: image decoding,
//! band localisation and tilt correction, spectral extraction, intensity integration and
//! the calibration model that maps intensity to mg/L.

pub mod analysis;
pub mod calibration;
pub mod common;
pub mod config;
pub mod confirm;
pub mod conversions;
pub mod image;
pub mod rotation;

#[cfg(test)]
mod test_support;

pub use common::{AnalysisError, LinearFit, Result};

pub use image::{
    AutoImageReader, Channel, CodecImageReader, ImageReader, ImageWriter, RgbImage,
    TiffCompression, TiffImageReader, TiffImageWriter,
};

pub use rotation::{CpuRotator, ImageRotator};

pub use analysis::{
    AlignmentResult, BandGeometry, ExtractionOptions, GapMode, Heatmap, IntegratedIntensity,
    PeakChannel, SpectralExtraction, SpectrumProfile, WavelengthCalibration,
};

pub use calibration::{
    AbsorbancePlot, CalibrationCoefficients, CalibrationRecord, CoefficientSource, CsvPlotSink,
    PlotSink, TracingPlotSink,
};

pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use confirm::{Confirmer, FixedConfirmer, Prompt};

pub use conversions::{
    AlignedImage, CalibrationOutcome, ImageToNitratePipeline, Measurement, SpectralAnalysis,
};
