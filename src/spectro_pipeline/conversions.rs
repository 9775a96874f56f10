//! Pipeline conversions module
//!
//! Orchestrates the analysis stages for Measure and Calibrate runs, including the
//! confirmation points and the bounded rotate-and-retry loop.

mod image_to_nitrate;
mod types;


pub use image_to_nitrate::ImageToNitratePipeline;
pub use types::{AlignedImage, CalibrationOutcome, Measurement, SpectralAnalysis};
