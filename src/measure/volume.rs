//! Volume estimation: per-cell vertical prisms between two elevation
//! surfaces, accumulated into cut/fill/net totals.

use log::debug;
use serde::Serialize;

use crate::elevation::{ElevationError, ElevationProvider, ElevationSourceRef, ResolveOptions};
use crate::geom::{Polygon, Tolerance};

use super::grid::{GridError, build_sample_grid};

/// Signed volume totals in m³.
///
/// `cut` accumulates cells where the compare surface sits below baseline
/// (material removed, always ≤ 0); `fill` the rest (always ≥ 0); `net` is
/// their exact sum with no intermediate rounding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VolumeResult {
    pub cut: f64,
    pub fill: f64,
    pub net: f64,
}

impl VolumeResult {
    /// The cleared, nothing-measured state.
    pub const ZERO: Self = Self {
        cut: 0.0,
        fill: 0.0,
        net: 0.0,
    };

    /// Copy with every total rounded to `places` decimals. Display helper
    /// only; accumulation never rounds.
    #[must_use]
    pub fn rounded(self, places: u32) -> Self {
        let scale = 10f64.powi(places as i32);
        let round = |v: f64| (v * scale).round() / scale;
        Self {
            cut: round(self.cut),
            fill: round(self.fill),
            net: round(self.net),
        }
    }
}

/// Errors from a volume estimation run.
#[derive(Debug, thiserror::Error)]
pub enum VolumeError {
    /// The boundary has too few ring coordinates to measure. Callers gate
    /// on [`Polygon::is_measurable`] and treat this state as zero volume.
    #[error("boundary is not measurable: a closed ring of more than 3 coordinates is required")]
    NotMeasurable,

    #[error(transparent)]
    Grid(#[from] GridError),

    /// An elevation query failed; no partial volume is ever reported.
    #[error(transparent)]
    Elevation(#[from] ElevationError),

    /// A provider returned a different number of samples than it was
    /// asked for. Indicates a misbehaving provider.
    #[error(
        "elevation sample count mismatch: baseline {baseline}, compare {compare}, expected {expected}"
    )]
    SampleMismatch {
        baseline: usize,
        compare: usize,
        expected: usize,
    },
}

/// Estimate cut/fill/net volume over `boundary` between two elevation
/// sources.
///
/// Both sources are resolved against the same cell-centroid point set with
/// identical ordinal indexing; the queries run concurrently and carry no
/// ordering dependency. Any query failure fails the whole estimate.
pub async fn estimate_volume<P: ElevationProvider>(
    boundary: &Polygon,
    resolution: f64,
    baseline: &ElevationSourceRef,
    compare: &ElevationSourceRef,
    provider: &P,
) -> Result<VolumeResult, VolumeError> {
    if !boundary.is_measurable() {
        return Err(VolumeError::NotMeasurable);
    }

    let grid = build_sample_grid(boundary, resolution, Tolerance::AREA)?;
    if grid.is_empty() {
        debug!("volume estimate: boundary produced no sample cells");
        return Ok(VolumeResult::ZERO);
    }

    let centers = grid.centers_geometry();
    let options = ResolveOptions::with_sample_resolution(resolution);
    let (baseline_geom, compare_geom) = tokio::try_join!(
        baseline.resolve(&centers, options, provider),
        compare.resolve(&centers, options, provider),
    )?;

    let baseline_points = baseline_geom.into_points();
    let compare_points = compare_geom.into_points();
    if baseline_points.len() != grid.len() || compare_points.len() != grid.len() {
        return Err(VolumeError::SampleMismatch {
            baseline: baseline_points.len(),
            compare: compare_points.len(),
            expected: grid.len(),
        });
    }

    let mut result = VolumeResult::ZERO;
    for ((cell, below), above) in grid.cells().iter().zip(&baseline_points).zip(&compare_points) {
        let height_diff = above.z - below.z;
        let volume = height_diff * cell.area_m2;
        result.net += volume;
        // Zero-difference cells land in fill; an inherited convention.
        if volume < 0.0 {
            result.cut += volume;
        } else {
            result.fill += volume;
        }
    }

    debug!(
        "volume estimate: {} cells, cut {:.3} m³, fill {:.3} m³, net {:.3} m³",
        grid.len(),
        result.cut,
        result.fill,
        result.net
    );
    Ok(result)
}
