use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Failed to encode TIFF image: {0}")]
    EncodeError(String),

    #[error("Image array dimension incorrect: expected an RGB image with 3 channels, found {0}")]
    InvalidChannelCount(usize),

    #[error("Image array datatype incorrect: expected 8-bit unsigned samples, found {0}")]
    UnsupportedSampleDepth(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Image appears to be landscape ({width}x{height}); terminated by user")]
    LandscapeRejected { width: usize, height: usize },

    #[error("Trimmed image rejected by user; rerun without edge trimming")]
    TrimRejected,

    #[error("No band detected: no {0} exceed the heatmap threshold")]
    NoBandDetected(&'static str),

    #[error("Degenerate band geometry: {0}")]
    DegenerateBand(String),

    #[error("Image tilt ~ {tilt_deg:.3} deg (slope {slope:.4}) outside permitted range")]
    TiltOutOfTolerance { tilt_deg: f64, slope: f64 },

    #[error("Image rotation failed: {0}")]
    RotationFailed(String),

    #[error("Sample band columns {start}..{end} fall outside image width {width}")]
    SampleBandOutOfBounds {
        start: usize,
        end: usize,
        width: usize,
    },

    #[error("Degenerate least-squares fit: {0}")]
    DegenerateFit(String),

    #[error("Reference band has zero {0} intensity; cannot normalize the sample band")]
    DegenerateReference(&'static str),

    #[error("No rows fall inside the wavelength window {wl_low:.2}-{wl_high:.2} nm")]
    EmptyIntegrationWindow { wl_low: f64, wl_high: f64 },

    #[error("Color channel should be 'r', 'g', or 'b', got '{0}'")]
    InvalidChannel(String),

    #[error("Image list and concentration list should have the same length ({images} vs {concentrations})")]
    LengthMismatch { images: usize, concentrations: usize },

    #[error("Integrated intensity must be positive to take its logarithm, got {0}")]
    NonPositiveIntensity(f64),

    #[error("Malformed calibration record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("Calibration record already exists and was not overwritten: {0}")]
    RecordExists(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AnalysisError {
    /// Alignment exceedance can be recovered by rotating and resubmitting the image.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AnalysisError::TiltOutOfTolerance { .. })
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
