//! Reference/sample profile extraction and wavelength calibration.

use std::ops::Range;

use tracing::debug;

use crate::spectro_pipeline::analysis::band::BandGeometry;
use crate::spectro_pipeline::common::constants::{
    FIDUCIAL_BOTTOM_NM, FIDUCIAL_TOP_NM, GAP_PEAK_RATIO, GAP_WIDTH_RATIO, MARGIN_FRACTION,
};
use crate::spectro_pipeline::common::error::{AnalysisError, Result};
use crate::spectro_pipeline::common::fit::LinearFit;
use crate::spectro_pipeline::image::{Channel, RgbImage};

/// How the two fiducial rows are located in the reference profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeakChannel {
    /// Red maximum in the top half and red maximum in the bottom half.
    #[default]
    Red,
    /// Whole-profile maximum of the red channel and of the blue channel.
    PerChannel,
}

/// How the distance between the reference and sample bands is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GapMode {
    /// Proportional to the reference band width.
    ReferenceWidth,
    /// Proportional to the distance between the fiducial peaks.
    #[default]
    PeakDistance,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractionOptions {
    pub peak_channel: PeakChannel,
    pub trim_margin: bool,
    pub gap_mode: GapMode,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            peak_channel: PeakChannel::Red,
            trim_margin: true,
            gap_mode: GapMode::PeakDistance,
        }
    }
}

/// Per-row `(R, G, B)` averages over a column band.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumProfile {
    rows: Vec<[f64; 3]>,
}

impl SpectrumProfile {
    pub fn from_rows(rows: Vec<[f64; 3]>) -> Self {
        Self { rows }
    }

    /// Averages `image` over `cols` for every row in `rows`.
    pub fn from_region(image: &RgbImage, rows: Range<usize>, cols: Range<usize>) -> Result<Self> {
        if cols.is_empty() || rows.is_empty() || cols.end > image.width || rows.end > image.height {
            return Err(AnalysisError::DegenerateBand(format!(
                "cannot average rows {rows:?}, columns {cols:?} of a {}x{} image",
                image.width, image.height
            )));
        }

        let n = cols.len() as f64;
        let rows = rows
            .map(|row| {
                let mut sum = [0.0; 3];
                for col in cols.clone() {
                    let px = image.pixel(row, col);
                    for (s, v) in sum.iter_mut().zip(px) {
                        *s += v as f64;
                    }
                }
                sum.map(|s| s / n)
            })
            .collect();
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[[f64; 3]] {
        &self.rows
    }

    pub fn channel(&self, channel: Channel) -> Vec<f64> {
        let c = channel.index();
        self.rows.iter().map(|px| px[c]).collect()
    }

    pub fn channel_max(&self) -> [f64; 3] {
        self.rows.iter().fold([f64::NEG_INFINITY; 3], |acc, px| {
            [acc[0].max(px[0]), acc[1].max(px[1]), acc[2].max(px[2])]
        })
    }

    /// Row of the first maximum of `channel` within `range`.
    fn argmax(&self, channel: Channel, range: Range<usize>) -> Option<usize> {
        let c = channel.index();
        let mut best: Option<(usize, f64)> = None;
        for row in range {
            let v = self.rows[row][c];
            if best.is_none_or(|(_, b)| v > b) {
                best = Some((row, v));
            }
        }
        best.map(|(row, _)| row)
    }

    /// Divides every channel by the matching entry of `max_rgb`.
    fn normalized_by(&self, max_rgb: [f64; 3]) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|px| [px[0] / max_rgb[0], px[1] / max_rgb[1], px[2] / max_rgb[2]])
            .collect();
        Self { rows }
    }
}

/// Linear map from profile row to wavelength in nanometres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavelengthCalibration {
    pub fit_slope: f64,
    pub fit_intercept: f64,
}

impl WavelengthCalibration {
    /// Fits the map through the two fiducial rows.
    pub fn from_fiducials(peak_top: usize, peak_bottom: usize) -> Result<Self> {
        let fit = LinearFit::fit(
            &[peak_top as f64, peak_bottom as f64],
            &[FIDUCIAL_TOP_NM, FIDUCIAL_BOTTOM_NM],
        )
        .map_err(|_| {
            AnalysisError::DegenerateFit(format!(
                "both fiducial peaks found at row {peak_top}"
            ))
        })?;
        Ok(Self {
            fit_slope: fit.slope,
            fit_intercept: fit.intercept,
        })
    }

    pub fn wavelength(&self, row: usize) -> f64 {
        self.fit_slope * row as f64 + self.fit_intercept
    }

    pub fn axis(&self, len: usize) -> Vec<f64> {
        (0..len).map(|row| self.wavelength(row)).collect()
    }
}

/// Everything derived from one image's reference and sample bands.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralExtraction {
    pub reference: SpectrumProfile,
    pub sample: SpectrumProfile,
    /// Sample profile divided channel-wise by the reference maxima.
    pub normalized: SpectrumProfile,
    pub max_rgb: [f64; 3],
    pub peak_top: usize,
    pub peak_bottom: usize,
    pub margin: usize,
    pub gap: usize,
    pub calibration: WavelengthCalibration,
    /// Wavelength of each profile row.
    pub wavelengths: Vec<f64>,
}

/// Extracts the reference and sample profiles and calibrates the wavelength axis.
pub fn extract_spectrum(
    image: &RgbImage,
    geometry: &BandGeometry,
    options: &ExtractionOptions,
) -> Result<SpectralExtraction> {
    let margin = if options.trim_margin {
        (geometry.ref_width as f64 * MARGIN_FRACTION) as usize
    } else {
        0
    };
    let rows = geometry.t_edge..geometry.b_edge;

    let reference = SpectrumProfile::from_region(
        image,
        rows.clone(),
        geometry.l_edge + margin..geometry.r_edge - margin,
    )?;

    let (peak_top, peak_bottom) = match options.peak_channel {
        PeakChannel::Red => {
            let half = geometry.half_height.min(reference.len());
            let top = reference.argmax(Channel::Red, 0..half);
            let bottom = reference.argmax(Channel::Red, half..reference.len());
            top.zip(bottom).ok_or_else(|| {
                AnalysisError::DegenerateBand(format!(
                    "cannot split {} profile rows at {half}",
                    reference.len()
                ))
            })?
        }
        PeakChannel::PerChannel => {
            let all = 0..reference.len();
            let red = reference.argmax(Channel::Red, all.clone());
            let blue = reference.argmax(Channel::Blue, all);
            red.zip(blue)
                .ok_or_else(|| AnalysisError::DegenerateBand("empty reference profile".to_string()))?
        }
    };

    let gap = match options.gap_mode {
        GapMode::ReferenceWidth => (geometry.ref_width as f64 * GAP_WIDTH_RATIO).round(),
        GapMode::PeakDistance => (peak_bottom.abs_diff(peak_top) as f64 * GAP_PEAK_RATIO).round(),
    } as usize;

    let sample_cols = geometry.r_edge + gap + margin..geometry.r_edge + gap + geometry.ref_width - margin;
    if sample_cols.end > image.width {
        return Err(AnalysisError::SampleBandOutOfBounds {
            start: sample_cols.start,
            end: sample_cols.end,
            width: image.width,
        });
    }
    let sample = SpectrumProfile::from_region(image, rows, sample_cols)?;

    let max_rgb = reference.channel_max();
    for channel in Channel::ALL {
        if max_rgb[channel.index()] <= 0.0 {
            return Err(AnalysisError::DegenerateReference(channel.name()));
        }
    }
    let normalized = sample.normalized_by(max_rgb);

    let calibration = WavelengthCalibration::from_fiducials(peak_top, peak_bottom)?;
    let wavelengths = calibration.axis(reference.len());

    debug!(
        margin,
        gap,
        peak_top,
        peak_bottom,
        fit_slope = calibration.fit_slope,
        fit_intercept = calibration.fit_intercept,
        "Extracted spectrum"
    );

    Ok(SpectralExtraction {
        reference,
        sample,
        normalized,
        max_rgb,
        peak_top,
        peak_bottom,
        margin,
        gap,
        calibration,
        wavelengths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectro_pipeline::analysis::band::locate_band;
    use crate::spectro_pipeline::analysis::heatmap::Heatmap;
    use crate::spectro_pipeline::analysis::intensity::integrate_intensity;
    use crate::spectro_pipeline::test_support::{SAMPLE_COLOR, spectrometer_image};

    fn geometry_of(image: &RgbImage) -> BandGeometry {
        locate_band(&Heatmap::from_image(image), 0.25).unwrap()
    }

    #[test]
    fn test_fiducials_calibrate_wavelength_axis() {
        let image = spectrometer_image();
        let geometry = geometry_of(&image);
        assert_eq!(geometry, BandGeometry::from_edges(50, 70, 0, 200));

        let extraction = extract_spectrum(&image, &geometry, &ExtractionOptions::default()).unwrap();
        assert_eq!((extraction.peak_top, extraction.peak_bottom), (50, 150));
        assert_eq!(extraction.margin, 2);
        assert_eq!(extraction.gap, 37);
        assert_eq!(extraction.wavelengths.len(), 200);
        assert!((extraction.wavelengths[50] - 610.65).abs() < 1e-9);
        assert!((extraction.wavelengths[150] - 449.1).abs() < 1e-9);
        assert!(extraction.calibration.fit_slope < 0.0);
    }

    #[test]
    fn test_sample_is_normalized_by_reference_maxima() {
        let image = spectrometer_image();
        let geometry = geometry_of(&image);
        let extraction = extract_spectrum(&image, &geometry, &ExtractionOptions::default()).unwrap();

        assert_eq!(extraction.max_rgb, [250.0, 120.0, 200.0]);
        for px in extraction.sample.rows() {
            assert_eq!(*px, SAMPLE_COLOR.map(|v| v as f64));
        }
        for px in extraction.normalized.rows() {
            assert!((px[0] - 60.0 / 250.0).abs() < 1e-12);
            assert!((px[1] - 0.75).abs() < 1e-12);
            assert!((px[2] - 30.0 / 200.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_per_channel_peaks() {
        let image = spectrometer_image();
        let geometry = geometry_of(&image);
        let options = ExtractionOptions {
            peak_channel: PeakChannel::PerChannel,
            ..Default::default()
        };
        let extraction = extract_spectrum(&image, &geometry, &options).unwrap();
        assert_eq!((extraction.peak_top, extraction.peak_bottom), (50, 150));
    }

    #[test]
    fn test_blue_fiducial_above_red_gives_rising_axis() {
        // Blue line at row 50, red line at row 150.
        let image = RgbImage::from_fn(160, 201, |row, col| match col {
            50..=70 if row == 50 => [100, 120, 220],
            50..=70 if row == 150 => [250, 120, 60],
            50..=70 => [100, 120, 60],
            107..=127 => SAMPLE_COLOR,
            _ => [40, 40, 40],
        })
        .unwrap();
        let geometry = BandGeometry::from_edges(50, 70, 0, 200);
        let options = ExtractionOptions {
            peak_channel: PeakChannel::PerChannel,
            ..Default::default()
        };

        let extraction = extract_spectrum(&image, &geometry, &options).unwrap();
        assert_eq!((extraction.peak_top, extraction.peak_bottom), (150, 50));
        assert!(extraction.calibration.fit_slope > 0.0);

        // Only the rows near 530 nm are averaged, not the whole profile.
        let intensity = integrate_intensity(
            &extraction.normalized,
            &extraction.wavelengths,
            Channel::Green,
            525.0,
            535.0,
        )
        .unwrap();
        assert_eq!((intensity.first_row, intensity.last_row), (97, 103));
        for row in intensity.first_row..=intensity.last_row {
            let wl = extraction.wavelengths[row];
            assert!(wl > 525.0 && wl < 535.0, "row {row} at {wl} nm");
        }
        assert!((intensity.average - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_width_gap_and_untrimmed_margin() {
        let image = spectrometer_image();
        let geometry = geometry_of(&image);
        let options = ExtractionOptions {
            gap_mode: GapMode::ReferenceWidth,
            trim_margin: false,
            ..Default::default()
        };
        let extraction = extract_spectrum(&image, &geometry, &options).unwrap();
        assert_eq!(extraction.margin, 0);
        assert_eq!(extraction.gap, 18);
    }

    #[test]
    fn test_sample_band_outside_image() {
        let image = spectrometer_image();
        let geometry = BandGeometry::from_edges(50, 140, 0, 200);
        let result = extract_spectrum(&image, &geometry, &ExtractionOptions::default());
        assert!(matches!(result, Err(AnalysisError::SampleBandOutOfBounds { .. })));
    }

    #[test]
    fn test_dark_reference_cannot_normalize() {
        let image = RgbImage::from_fn(40, 60, |_, col| {
            if col < 20 { [0, 0, 0] } else { [10, 20, 30] }
        })
        .unwrap();
        let geometry = BandGeometry::from_edges(2, 12, 0, 50);
        let result = extract_spectrum(&image, &geometry, &ExtractionOptions::default());
        assert!(matches!(result, Err(AnalysisError::DegenerateReference(_))));
    }

    #[test]
    fn test_coincident_peaks_cannot_calibrate() {
        assert!(matches!(
            WavelengthCalibration::from_fiducials(40, 40),
            Err(AnalysisError::DegenerateFit(_))
        ));
    }
}
