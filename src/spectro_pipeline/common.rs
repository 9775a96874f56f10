//! Common utilities module
//!
//! This module contains shared utilities used across the spectral pipeline.

pub mod constants;
pub mod error;
pub mod fit;

pub use error::{AnalysisError, Result};
pub use fit::LinearFit;
