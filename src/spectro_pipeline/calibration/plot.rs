//! Absorbance-vs-concentration fit and the sinks that present it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use tracing::info;

use crate::spectro_pipeline::common::error::{AnalysisError, Result};
use crate::spectro_pipeline::common::fit::LinearFit;

/// Calibration samples as `(concentration, absorbance)` with a fitted line
/// `absorbance = slope * concentration + intercept`.
#[derive(Debug, Clone, PartialEq)]
pub struct AbsorbancePlot {
    /// Integration window in nanometres.
    pub wl_low: f64,
    pub wl_high: f64,
    pub points: Vec<(f64, f64)>,
    pub fit: LinearFit,
}

impl AbsorbancePlot {
    /// Absorbance is `-log10` of the integrated intensity.
    pub fn from_samples(
        concentrations: &[f64],
        intensities: &[f64],
        wl_low: f64,
        wl_high: f64,
    ) -> Result<Self> {
        if concentrations.len() != intensities.len() {
            return Err(AnalysisError::LengthMismatch {
                images: intensities.len(),
                concentrations: concentrations.len(),
            });
        }
        let absorbances: Vec<f64> = intensities.iter().map(|i| -i.log10()).collect();
        let fit = LinearFit::fit(concentrations, &absorbances)?;
        Ok(Self {
            wl_low,
            wl_high,
            points: concentrations.iter().copied().zip(absorbances).collect(),
            fit,
        })
    }
}

/// Destination for the calibration plot. Presentation never affects the fit.
pub trait PlotSink {
    fn present(&self, plot: &AbsorbancePlot) -> Result<()>;
}

/// Logs every point and the fitted line.
pub struct TracingPlotSink;

impl PlotSink for TracingPlotSink {
    fn present(&self, plot: &AbsorbancePlot) -> Result<()> {
        for &(concentration, absorbance) in &plot.points {
            info!(concentration, absorbance, "Calibration data");
        }
        info!(
            slope = plot.fit.slope,
            intercept = plot.fit.intercept,
            "Absorbance ({}nm - {}nm) linear fit",
            plot.wl_low,
            plot.wl_high
        );
        Ok(())
    }
}

/// Writes `concentration,absorbance,fitted_absorbance` rows for external plotting.
pub struct CsvPlotSink {
    pub path: PathBuf,
}

impl CsvPlotSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PlotSink for CsvPlotSink {
    fn present(&self, plot: &AbsorbancePlot) -> Result<()> {
        let file = File::create(&self.path).map_err(|e| {
            AnalysisError::OutputWriteError(format!("{}: {}", self.path.display(), e))
        })?;
        let mut out = BufWriter::new(file);
        writeln!(out, "concentration,absorbance,fitted_absorbance")?;
        for &(concentration, absorbance) in &plot.points {
            writeln!(
                out,
                "{},{},{}",
                concentration,
                absorbance,
                plot.fit.eval(concentration)
            )?;
        }
        out.flush()?;
        info!(path = %self.path.display(), "Wrote absorbance plot data");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorbance_fit() {
        // absorbance = 0.1 * concentration + 0.05
        let concentrations = [0.0, 1.0, 2.0, 4.0];
        let intensities: Vec<f64> = concentrations
            .iter()
            .map(|c| 10f64.powf(-(0.1 * c + 0.05)))
            .collect();
        let plot = AbsorbancePlot::from_samples(&concentrations, &intensities, 525.0, 535.0).unwrap();
        assert!((plot.fit.slope - 0.1).abs() < 1e-9);
        assert!((plot.fit.intercept - 0.05).abs() < 1e-9);
        assert_eq!(plot.points.len(), 4);
    }

    #[test]
    fn test_csv_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absorbance.csv");
        let plot = AbsorbancePlot {
            wl_low: 525.0,
            wl_high: 535.0,
            points: vec![(0.0, 0.5), (2.0, 1.5)],
            fit: LinearFit { slope: 0.5, intercept: 0.5 },
        };
        CsvPlotSink::new(&path).present(&plot).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "concentration,absorbance,fitted_absorbance\n0,0.5,0.5\n2,1.5,1.5\n");
    }
}
