//! Concentration calibration module
//!
//! The log-linear intensity-to-concentration model, its four-line text record, and sinks
//! for the absorbance-vs-concentration fit produced while calibrating.

mod record;
mod model;
mod plot;

pub use record::CalibrationRecord;
pub use model::{CalibrationCoefficients, CoefficientSource};
pub use plot::{AbsorbancePlot, CsvPlotSink, PlotSink, TracingPlotSink};
