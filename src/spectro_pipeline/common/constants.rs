//! Named constants of the EOS 1 spectrometer analysis.
//!
//! The values come from the instrument's published analysis procedure and must not be
//! altered without recalibrating the hardware.

/// Default heatmap threshold, as a fraction of the profile maximum.
pub const DEFAULT_THRESHOLD_FRACTION: f64 = 0.25;
/// Accepted range for the threshold fraction; values outside fall back to the default.
pub const MIN_THRESHOLD_FRACTION: f64 = 0.1;
pub const MAX_THRESHOLD_FRACTION: f64 = 0.9;

/// Index gaps larger than this split the thresholded column set into separate bands.
pub const BAND_SPLIT_GAP: usize = 2;

/// Largest tolerated edge slope (columns per row) before the image counts as tilted.
pub const TILT_TOLERANCE: f64 = 0.1;
/// The tilt check rotates and retries at most this many times per run.
pub const MAX_ROTATION_RETRIES: usize = 1;

/// Fraction of the reference band width trimmed from each side when averaging columns.
pub const MARGIN_FRACTION: f64 = 0.1;

/// Reference-to-sample gap as a fraction of the reference band width.
pub const GAP_WIDTH_RATIO: f64 = 0.901;
/// Reference-to-sample gap as a fraction of the fiducial peak distance.
pub const GAP_PEAK_RATIO: f64 = 0.368;

/// Known wavelength of the fiducial in the top half of the reference band (nm).
pub const FIDUCIAL_TOP_NM: f64 = 610.65;
/// Known wavelength of the fiducial in the bottom half of the reference band (nm).
pub const FIDUCIAL_BOTTOM_NM: f64 = 449.1;

/// Centre and half-width of the nitrate integration window (nm).
pub const DEFAULT_CENTER_WAVELENGTH: f64 = 530.0;
pub const DEFAULT_HALF_WINDOW: f64 = 5.0;

/// Factory calibration used when no record or manual coefficients are available.
pub const DEFAULT_K: f64 = -7.8279;
pub const DEFAULT_B: f64 = -0.14917;

/// Decimal places kept when persisting calibration coefficients.
pub const RECORD_DECIMALS: i32 = 5;

/// File name of the calibration record in the working directory.
pub const DEFAULT_RECORD_FILE: &str = "nitrate_calibration.csv";
