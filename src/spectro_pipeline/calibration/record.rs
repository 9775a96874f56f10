//! Calibration record text format.
//!
//! Four comma-separated lines in a fixed order, shared with records written by earlier
//! versions of the instrument software:
//!
//! ```text
//! date,2019-05-01
//! time,14:03:27
//! k,-7.8279
//! b,-0.14917
//! ```

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use tracing::debug;

use crate::spectro_pipeline::calibration::model::CalibrationCoefficients;
use crate::spectro_pipeline::common::constants::RECORD_DECIMALS;
use crate::spectro_pipeline::common::error::{AnalysisError, Result};

const KEYS: [&str; 4] = ["date", "time", "k", "b"];

#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationRecord {
    pub date: String,
    pub time: String,
    pub k: f64,
    pub b: f64,
}

/// Rounds to the number of decimals kept in the record.
fn round_coefficient(value: f64) -> f64 {
    let scale = 10f64.powi(RECORD_DECIMALS);
    (value * scale).round() / scale
}

/// Shortest round-trip text of `value` in the layout of Python's `repr(float)`: positional
/// for decimal exponents in `-4..16` (always with a fractional part), scientific otherwise
/// with a signed exponent of at least two digits (`1e-05`, `1.2345678901234568e+16`).
fn format_coefficient(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{value:e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if (-4..16).contains(&exponent) {
        let positional = value.to_string();
        if positional.contains('.') {
            positional
        } else {
            format!("{positional}.0")
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    }
}

impl CalibrationRecord {
    /// Stamps `coefficients` with the current local date and time.
    pub fn new(coefficients: CalibrationCoefficients) -> Self {
        Self::stamped(coefficients, Local::now())
    }

    pub fn stamped(coefficients: CalibrationCoefficients, at: DateTime<Local>) -> Self {
        Self {
            date: at.format("%Y-%m-%d").to_string(),
            time: at.format("%H:%M:%S").to_string(),
            k: round_coefficient(coefficients.k),
            b: round_coefficient(coefficients.b),
        }
    }

    pub fn coefficients(&self) -> CalibrationCoefficients {
        CalibrationCoefficients::new(self.k, self.b)
    }

    pub fn to_text(&self) -> String {
        format!(
            "date,{}\ntime,{}\nk,{}\nb,{}\n",
            self.date,
            self.time,
            format_coefficient(round_coefficient(self.k)),
            format_coefficient(round_coefficient(self.b))
        )
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut values = [""; 4];
        let mut lines = text.lines();

        for (i, key) in KEYS.iter().enumerate() {
            let line = lines.next().ok_or_else(|| AnalysisError::MalformedRecord {
                line: i + 1,
                reason: format!("missing '{key}' line"),
            })?;
            let (found, value) = line.trim().split_once(',').ok_or_else(|| {
                AnalysisError::MalformedRecord {
                    line: i + 1,
                    reason: format!("expected '{key},<value>', got '{}'", line.trim()),
                }
            })?;
            if found.trim() != *key {
                return Err(AnalysisError::MalformedRecord {
                    line: i + 1,
                    reason: format!("expected key '{key}', got '{}'", found.trim()),
                });
            }
            values[i] = value.trim();
        }

        let number = |i: usize| {
            values[i]
                .parse::<f64>()
                .map(round_coefficient)
                .map_err(|e| AnalysisError::MalformedRecord {
                    line: i + 1,
                    reason: format!("'{}' is not a number: {e}", values[i]),
                })
        };

        Ok(Self {
            date: values[0].to_string(),
            time: values[1].to_string(),
            k: number(2)?,
            b: number(3)?,
        })
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            AnalysisError::InputReadError(format!("{}: {}", path.display(), e))
        })?;
        let record = Self::parse(&text)?;
        debug!(path = %path.display(), k = record.k, b = record.b, "Loaded calibration record");
        Ok(record)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_text()).map_err(|e| {
            AnalysisError::OutputWriteError(format!("{}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Wrote calibration record");
        Ok(())
    }
}
