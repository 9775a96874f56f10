//! Tilt measurement from the reference band's right edge.

use tracing::debug;

use crate::spectro_pipeline::analysis::band::BandGeometry;
use crate::spectro_pipeline::analysis::heatmap::Heatmap;
use crate::spectro_pipeline::common::error::{AnalysisError, Result};
use crate::spectro_pipeline::common::fit::LinearFit;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentResult {
    /// Columns the right edge moves per row.
    pub slope: f64,
    /// `atan(slope)` in degrees.
    pub tilt_angle: f64,
}

impl AlignmentResult {
    pub fn from_slope(slope: f64) -> Self {
        Self {
            slope,
            tilt_angle: slope.atan().to_degrees(),
        }
    }

    pub fn is_within(&self, tolerance: f64) -> bool {
        self.slope.abs() <= tolerance
    }

    /// Angle to hand to an [`ImageRotator`](crate::spectro_pipeline::rotation::ImageRotator)
    /// to level the band.
    pub fn correction_angle(&self) -> f64 {
        -self.tilt_angle
    }

    pub fn out_of_tolerance(&self) -> AnalysisError {
        AnalysisError::TiltOutOfTolerance {
            tilt_deg: self.tilt_angle,
            slope: self.slope,
        }
    }
}

/// Column offset of the steepest falling step in `window`.
fn steepest_drop(window: &[f64]) -> usize {
    let mut best = (0, f64::INFINITY);
    for (offset, pair) in window.windows(2).enumerate() {
        let step = pair[1] - pair[0];
        if step < best.1 {
            best = (offset, step);
        }
    }
    best.0
}

/// Measures how far the band's right edge drifts per row.
///
/// Every row in `[t_edge, b_edge]` is searched for its steepest falling step inside a
/// `ref_width`-wide window centred on `r_edge`; a line fitted through those offsets gives
/// the slope.
pub fn check_alignment(heatmap: &Heatmap, geometry: &BandGeometry) -> Result<AlignmentResult> {
    let half = geometry.ref_width / 2;
    let start = geometry.r_edge.saturating_sub(half);
    let end = (geometry.r_edge + half).min(heatmap.width);

    if end < start + 2 {
        return Err(AnalysisError::DegenerateBand(format!(
            "edge window {start}..{end} is too narrow to measure tilt"
        )));
    }

    let offsets: Vec<f64> = (geometry.t_edge..=geometry.b_edge)
        .map(|row| steepest_drop(&heatmap.row(row)[start..end]) as f64)
        .collect();

    let fit = LinearFit::fit_indexed(&offsets)?;
    let result = AlignmentResult::from_slope(fit.slope);

    debug!(
        window_start = start,
        window_end = end,
        slope = result.slope,
        tilt_deg = result.tilt_angle,
        "Measured edge tilt"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectro_pipeline::analysis::band::locate_band;
    use crate::spectro_pipeline::common::constants::TILT_TOLERANCE;
    use crate::spectro_pipeline::image::RgbImage;
    use crate::spectro_pipeline::rotation::{CpuRotator, ImageRotator};

    /// Band whose edges drift `shear` columns per row.
    fn sheared_heatmap(width: usize, height: usize, left: usize, right: usize, shear: f64) -> Heatmap {
        let mut data = vec![0.0; width * height];
        for row in 0..height {
            let shift = (shear * row as f64).floor() as usize;
            for col in left + shift..=right + shift {
                data[row * width + col] = 100.0;
            }
        }
        Heatmap::from_raw(width, height, data).unwrap()
    }

    #[test]
    fn test_vertical_edge_has_zero_slope() {
        let heatmap = sheared_heatmap(200, 100, 60, 120, 0.0);
        let geometry = BandGeometry::from_edges(60, 120, 0, 99);
        let result = check_alignment(&heatmap, &geometry).unwrap();
        assert!(result.slope.abs() < 1e-12);
        assert!(result.is_within(TILT_TOLERANCE));
    }

    #[test]
    fn test_sheared_band_exceeds_tolerance() {
        let heatmap = sheared_heatmap(400, 200, 100, 200, 0.2);
        let geometry = BandGeometry::from_edges(100, 220, 0, 199);
        let result = check_alignment(&heatmap, &geometry).unwrap();

        assert!(!result.is_within(TILT_TOLERANCE));
        assert!((result.slope - 0.2).abs() < 0.01, "slope {}", result.slope);
        let expected = 0.2f64.atan().to_degrees();
        assert!((result.tilt_angle - expected).abs() < 0.5, "tilt {}", result.tilt_angle);
        assert!(result.correction_angle() < 0.0);
    }

    #[test]
    fn test_narrow_window_is_rejected() {
        let heatmap = sheared_heatmap(10, 10, 2, 3, 0.0);
        let geometry = BandGeometry::from_edges(2, 3, 0, 9);
        assert!(matches!(
            check_alignment(&heatmap, &geometry),
            Err(AnalysisError::DegenerateBand(_))
        ));
    }

    #[test]
    fn test_compensating_rotation_restores_alignment() {
        let upright = RgbImage::from_fn(300, 600, |row, col| {
            if (90..210).contains(&col) && (150..450).contains(&row) {
                [200, 50, 50]
            } else {
                [0, 0, 0]
            }
        })
        .unwrap();

        let measure = |image: &RgbImage| {
            let heatmap = Heatmap::from_image(image);
            let geometry = locate_band(&heatmap, 0.25).unwrap();
            check_alignment(&heatmap, &geometry).unwrap()
        };

        assert!(measure(&upright).is_within(TILT_TOLERANCE));

        let tilted = CpuRotator.rotate(&upright, 15.0).unwrap();
        let tilt = measure(&tilted);
        assert!(tilt.slope > TILT_TOLERANCE, "slope {}", tilt.slope);
        assert!(tilt.correction_angle() < 0.0);

        let corrected = CpuRotator.rotate(&tilted, -15.0).unwrap();
        let after = measure(&corrected);
        assert!(after.is_within(TILT_TOLERANCE), "slope {}", after.slope);
    }
}
