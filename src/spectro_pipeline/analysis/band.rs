//! Reference band localisation from heatmap projections.

use tracing::debug;

use crate::spectro_pipeline::analysis::heatmap::Heatmap;
use crate::spectro_pipeline::common::constants::{
    BAND_SPLIT_GAP, DEFAULT_THRESHOLD_FRACTION, MAX_THRESHOLD_FRACTION, MIN_THRESHOLD_FRACTION,
};
use crate::spectro_pipeline::common::error::{AnalysisError, Result};

/// Pixel bounds of the reference band. Edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandGeometry {
    pub l_edge: usize,
    pub r_edge: usize,
    pub t_edge: usize,
    pub b_edge: usize,
    /// `r_edge - l_edge`
    pub ref_width: usize,
    /// `floor((b_edge - t_edge) / 2)`, splits the top and bottom fiducial search regions.
    pub half_height: usize,
}

impl BandGeometry {
    pub fn from_edges(l_edge: usize, r_edge: usize, t_edge: usize, b_edge: usize) -> Self {
        Self {
            l_edge,
            r_edge,
            t_edge,
            b_edge,
            ref_width: r_edge - l_edge,
            half_height: (b_edge - t_edge) / 2,
        }
    }
}

/// Threshold fractions outside `[0.1, 0.9]` fall back to the default of 0.25.
pub fn effective_threshold(fraction: f64) -> f64 {
    if (MIN_THRESHOLD_FRACTION..=MAX_THRESHOLD_FRACTION).contains(&fraction) {
        fraction
    } else {
        DEFAULT_THRESHOLD_FRACTION
    }
}

/// Indices whose value exceeds `max(profile) * fraction`.
fn above_threshold(profile: &[f64], fraction: f64) -> Vec<usize> {
    let max = profile.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let cutoff = max * fraction;
    profile
        .iter()
        .enumerate()
        .filter(|&(_, &v)| v > cutoff)
        .map(|(i, _)| i)
        .collect()
}

/// Splits a sorted index set into inclusive `(first, last)` runs wherever consecutive
/// indices are more than [`BAND_SPLIT_GAP`] apart.
fn split_runs(indices: &[usize]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let Some(&first) = indices.first() else {
        return runs;
    };

    let mut start = first;
    for pair in indices.windows(2) {
        if pair[1] - pair[0] > BAND_SPLIT_GAP {
            runs.push((start, pair[0]));
            start = pair[1];
        }
    }
    if let Some(&last) = indices.last() {
        runs.push((start, last));
    }
    runs
}

/// Finds the reference band's horizontal and vertical extent.
///
/// Columns whose mean heatmap value exceeds the threshold are grouped into candidate
/// bands; the candidate whose midpoint lies closest to the image's horizontal centre wins.
/// Rows are then thresholded the same way over the winning columns only.
pub fn locate_band(heatmap: &Heatmap, threshold_fraction: f64) -> Result<BandGeometry> {
    let n = effective_threshold(threshold_fraction);
    if n != threshold_fraction {
        debug!("Threshold fraction {} out of range, using {}", threshold_fraction, n);
    }

    let columns = above_threshold(&heatmap.column_means(), n);
    let runs = split_runs(&columns);
    let center = heatmap.width as f64 / 2.0;

    let (l_edge, r_edge) = runs
        .iter()
        .copied()
        .min_by(|a, b| {
            let da = (center - (a.0 + a.1) as f64 / 2.0).abs();
            let db = (center - (b.0 + b.1) as f64 / 2.0).abs();
            da.total_cmp(&db)
        })
        .ok_or(AnalysisError::NoBandDetected("columns"))?;

    debug!(candidates = runs.len(), l_edge, r_edge, "Selected reference columns");

    let rows = above_threshold(&heatmap.row_means(l_edge, r_edge), n);
    let (&t_edge, &b_edge) = rows
        .first()
        .zip(rows.last())
        .ok_or(AnalysisError::NoBandDetected("rows"))?;

    if r_edge - l_edge < 2 {
        return Err(AnalysisError::DegenerateBand(format!(
            "reference band spans only columns {l_edge}..={r_edge}"
        )));
    }
    if b_edge - t_edge < 2 {
        return Err(AnalysisError::DegenerateBand(format!(
            "reference band spans only rows {t_edge}..={b_edge}"
        )));
    }

    Ok(BandGeometry::from_edges(l_edge, r_edge, t_edge, b_edge))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banded_heatmap(width: usize, height: usize, bands: &[(usize, usize)]) -> Heatmap {
        let mut data = vec![1.0; width * height];
        for row in 0..height {
            for &(first, last) in bands {
                for col in first..=last {
                    data[row * width + col] = 100.0;
                }
            }
        }
        Heatmap::from_raw(width, height, data).unwrap()
    }

    #[test]
    fn test_selects_band_nearest_center() {
        let heatmap = banded_heatmap(400, 60, &[(100, 150), (300, 350)]);
        let geometry = locate_band(&heatmap, 0.5).unwrap();
        assert_eq!((geometry.l_edge, geometry.r_edge), (100, 150));
        assert_eq!((geometry.t_edge, geometry.b_edge), (0, 59));
        assert_eq!(geometry.ref_width, 50);
        assert_eq!(geometry.half_height, 29);
    }

    #[test]
    fn test_single_band_without_gaps() {
        let heatmap = banded_heatmap(100, 40, &[(20, 35)]);
        let geometry = locate_band(&heatmap, 0.25).unwrap();
        assert_eq!((geometry.l_edge, geometry.r_edge), (20, 35));
    }

    #[test]
    fn test_small_gaps_do_not_split() {
        // Column 40 is dark, but an index step of 2 keeps the band whole.
        let mut heatmap = banded_heatmap(100, 20, &[(30, 39), (41, 50)]);
        let geometry = locate_band(&heatmap, 0.25).unwrap();
        assert_eq!((geometry.l_edge, geometry.r_edge), (30, 50));

        heatmap = banded_heatmap(100, 20, &[(30, 39), (43, 50)]);
        let geometry = locate_band(&heatmap, 0.25).unwrap();
        assert_eq!((geometry.l_edge, geometry.r_edge), (43, 50));
    }

    #[test]
    fn test_row_extent() {
        let (width, height) = (80, 100);
        let mut data = vec![0.0; width * height];
        for row in 10..90 {
            for col in 30..50 {
                data[row * width + col] = 50.0;
            }
        }
        let heatmap = Heatmap::from_raw(width, height, data).unwrap();
        let geometry = locate_band(&heatmap, 0.25).unwrap();
        assert_eq!(geometry, BandGeometry::from_edges(30, 49, 10, 89));
        assert_eq!(geometry.half_height, 39);
    }

    #[test]
    fn test_blank_heatmap_has_no_band() {
        let heatmap = Heatmap::from_raw(10, 20, vec![0.0; 200]).unwrap();
        assert!(matches!(
            locate_band(&heatmap, 0.25),
            Err(AnalysisError::NoBandDetected("columns"))
        ));
    }

    #[test]
    fn test_threshold_clamping() {
        assert_eq!(effective_threshold(0.5), 0.5);
        assert_eq!(effective_threshold(0.05), DEFAULT_THRESHOLD_FRACTION);
        assert_eq!(effective_threshold(0.95), DEFAULT_THRESHOLD_FRACTION);
        assert_eq!(effective_threshold(f64::NAN), DEFAULT_THRESHOLD_FRACTION);
    }

    #[test]
    fn test_split_runs() {
        assert!(split_runs(&[]).is_empty());
        assert_eq!(split_runs(&[4, 5, 7, 11, 12]), vec![(4, 7), (11, 12)]);
    }
}
