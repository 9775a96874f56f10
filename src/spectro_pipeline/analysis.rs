//! Spectral analysis module
//!
//! The numeric core: each stage is a pure function of its inputs and returns an immutable
//! result. Replacing the image means recomputing every stage from [`Heatmap::from_image`].

pub mod heatmap;
pub mod band;
pub mod alignment;
pub mod spectrum;
pub mod intensity;

pub use heatmap::Heatmap;
pub use band::{BandGeometry, locate_band};
pub use alignment::{AlignmentResult, check_alignment};
pub use spectrum::{
    ExtractionOptions, GapMode, PeakChannel, SpectralExtraction, SpectrumProfile,
    WavelengthCalibration, extract_spectrum,
};
pub use intensity::{IntegratedIntensity, integrate_intensity};
