//! Wavelength-window integration of a normalized profile.

use tracing::debug;

use crate::spectro_pipeline::analysis::spectrum::SpectrumProfile;
use crate::spectro_pipeline::common::error::{AnalysisError, Result};
use crate::spectro_pipeline::image::Channel;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratedIntensity {
    /// First profile row inside the window.
    pub first_row: usize,
    /// Last profile row inside the window, inclusive.
    pub last_row: usize,
    pub sum: f64,
    pub count: usize,
    /// `sum / count`
    pub average: f64,
}

/// Averages one channel of `profile` over the rows whose wavelength lies strictly inside
/// `(wl_low, wl_high)`.
///
/// The axis is linear, so those rows are contiguous whichever way it runs. With the red
/// fiducial above the blue one the axis falls with the row index, and the window spans the
/// first row below `wl_high` to the last row above `wl_low`.
pub fn integrate_intensity(
    profile: &SpectrumProfile,
    wavelengths: &[f64],
    channel: Channel,
    wl_low: f64,
    wl_high: f64,
) -> Result<IntegratedIntensity> {
    if wavelengths.len() != profile.len() {
        return Err(AnalysisError::DegenerateBand(format!(
            "{} wavelengths for {} profile rows",
            wavelengths.len(),
            profile.len()
        )));
    }

    let empty = || AnalysisError::EmptyIntegrationWindow { wl_low, wl_high };
    let inside = |&wl: &f64| wl > wl_low && wl < wl_high;
    let first_row = wavelengths.iter().position(inside).ok_or_else(empty)?;
    let last_row = wavelengths.iter().rposition(inside).ok_or_else(empty)?;

    let c = channel.index();
    let sum: f64 = profile.rows()[first_row..=last_row].iter().map(|px| px[c]).sum();
    let count = last_row - first_row + 1;
    let average = sum / count as f64;

    debug!(%channel, first_row, last_row, average, "Integrated intensity");

    Ok(IntegratedIntensity {
        first_row,
        last_row,
        sum,
        count,
        average,
    })
}
