//! Analysis configuration types

use std::path::PathBuf;

use crate::spectro_pipeline::analysis::{ExtractionOptions, GapMode, PeakChannel};
use crate::spectro_pipeline::common::constants::{
    DEFAULT_CENTER_WAVELENGTH, DEFAULT_HALF_WINDOW, DEFAULT_RECORD_FILE,
    DEFAULT_THRESHOLD_FRACTION, MAX_ROTATION_RETRIES, TILT_TOLERANCE,
};
use crate::spectro_pipeline::image::{Channel, TiffCompression};

/// Configuration for one nitrate analysis
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Heatmap threshold as a fraction of the profile maximum (0.1-0.9)
    pub threshold_fraction: f64,
    /// How the fiducial peaks are located
    pub peak_channel: PeakChannel,
    /// Drop a tenth of the band width on each side before averaging columns
    pub trim_margin: bool,
    /// How the reference-to-sample gap is estimated
    pub gap_mode: GapMode,
    /// Channel integrated over the wavelength window
    pub intensity_channel: Channel,
    /// Centre of the integration window in nm
    pub center_wavelength: f64,
    /// Half-width of the integration window in nm
    pub half_window: f64,
    /// Largest tolerated edge slope
    pub tilt_tolerance: f64,
    /// Rotate-and-retry attempts per image
    pub max_rotation_retries: usize,
    /// Crop the input to its central half before analysis
    pub trim_edge: bool,
    /// Write rotated images next to their source file
    pub save_rotated: bool,
    /// Compression of saved rotated images
    pub rotated_compression: TiffCompression,
    /// Calibration record location
    pub record_path: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold_fraction: DEFAULT_THRESHOLD_FRACTION,
            peak_channel: PeakChannel::Red,
            trim_margin: true,
            gap_mode: GapMode::PeakDistance,
            intensity_channel: Channel::Green,
            center_wavelength: DEFAULT_CENTER_WAVELENGTH,
            half_window: DEFAULT_HALF_WINDOW,
            tilt_tolerance: TILT_TOLERANCE,
            max_rotation_retries: MAX_ROTATION_RETRIES,
            trim_edge: false,
            save_rotated: false,
            rotated_compression: TiffCompression::None,
            record_path: PathBuf::from(DEFAULT_RECORD_FILE),
        }
    }
}

impl AnalysisConfig {
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    pub fn extraction_options(&self) -> ExtractionOptions {
        ExtractionOptions {
            peak_channel: self.peak_channel,
            trim_margin: self.trim_margin,
            gap_mode: self.gap_mode,
        }
    }

    /// `(wl_low, wl_high)` of the integration window.
    pub fn wavelength_window(&self) -> (f64, f64) {
        (
            self.center_wavelength - self.half_window,
            self.center_wavelength + self.half_window,
        )
    }
}

/// Builder for AnalysisConfig
#[derive(Default)]
pub struct AnalysisConfigBuilder {
    threshold_fraction: Option<f64>,
    peak_channel: Option<PeakChannel>,
    trim_margin: Option<bool>,
    gap_mode: Option<GapMode>,
    intensity_channel: Option<Channel>,
    center_wavelength: Option<f64>,
    half_window: Option<f64>,
    tilt_tolerance: Option<f64>,
    max_rotation_retries: Option<usize>,
    trim_edge: Option<bool>,
    save_rotated: Option<bool>,
    rotated_compression: Option<TiffCompression>,
    record_path: Option<PathBuf>,
}

impl AnalysisConfigBuilder {
    pub fn threshold_fraction(mut self, fraction: f64) -> Self {
        self.threshold_fraction = Some(fraction);
        self
    }

    pub fn peak_channel(mut self, peak_channel: PeakChannel) -> Self {
        self.peak_channel = Some(peak_channel);
        self
    }

    pub fn trim_margin(mut self, trim: bool) -> Self {
        self.trim_margin = Some(trim);
        self
    }

    pub fn gap_mode(mut self, gap_mode: GapMode) -> Self {
        self.gap_mode = Some(gap_mode);
        self
    }

    pub fn intensity_channel(mut self, channel: Channel) -> Self {
        self.intensity_channel = Some(channel);
        self
    }

    pub fn center_wavelength(mut self, nm: f64) -> Self {
        self.center_wavelength = Some(nm);
        self
    }

    pub fn half_window(mut self, nm: f64) -> Self {
        self.half_window = Some(nm);
        self
    }

    pub fn tilt_tolerance(mut self, tolerance: f64) -> Self {
        self.tilt_tolerance = Some(tolerance);
        self
    }

    pub fn max_rotation_retries(mut self, retries: usize) -> Self {
        self.max_rotation_retries = Some(retries);
        self
    }

    pub fn trim_edge(mut self, trim: bool) -> Self {
        self.trim_edge = Some(trim);
        self
    }

    pub fn save_rotated(mut self, save: bool) -> Self {
        self.save_rotated = Some(save);
        self
    }

    pub fn rotated_compression(mut self, compression: TiffCompression) -> Self {
        self.rotated_compression = Some(compression);
        self
    }

    pub fn record_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.record_path = Some(path.into());
        self
    }

    pub fn build(self) -> AnalysisConfig {
        let default = AnalysisConfig::default();
        AnalysisConfig {
            threshold_fraction: self.threshold_fraction.unwrap_or(default.threshold_fraction),
            peak_channel: self.peak_channel.unwrap_or(default.peak_channel),
            trim_margin: self.trim_margin.unwrap_or(default.trim_margin),
            gap_mode: self.gap_mode.unwrap_or(default.gap_mode),
            intensity_channel: self.intensity_channel.unwrap_or(default.intensity_channel),
            center_wavelength: self.center_wavelength.unwrap_or(default.center_wavelength),
            half_window: self.half_window.unwrap_or(default.half_window),
            tilt_tolerance: self.tilt_tolerance.unwrap_or(default.tilt_tolerance),
            max_rotation_retries: self.max_rotation_retries.unwrap_or(default.max_rotation_retries),
            trim_edge: self.trim_edge.unwrap_or(default.trim_edge),
            save_rotated: self.save_rotated.unwrap_or(default.save_rotated),
            rotated_compression: self.rotated_compression.unwrap_or(default.rotated_compression),
            record_path: self.record_path.unwrap_or(default.record_path),
        }
    }
}
