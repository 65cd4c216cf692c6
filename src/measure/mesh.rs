//! Visualization mesh construction: a boundary-clipped wireframe resolved
//! against both elevation sources, plus per-vertex elevation labels along
//! the boundary.
//!
//! The two wireframes share identical XY topology, so per-vertex elevation
//! differences at the same location are meaningful and the rendered
//! surfaces are visually comparable.

use log::debug;
use serde::Serialize;

use crate::elevation::{ElevationError, ElevationProvider, ElevationSourceRef, Geometry, ResolveOptions};
use crate::geom::{Point3, Polygon, Polyline, Tolerance, clip_paths_to_polygon};

/// Grid lines sit at half the sampling resolution so the wireframe is
/// denser than the volume grid.
pub const MESH_SPACING_FACTOR: f64 = 0.5;

/// The mesh grid extends 10% past the boundary bbox before clipping, so
/// edge cells get full-length lines to clip against.
pub const MESH_BBOX_EXPAND: f64 = 1.1;

/// Which elevation source a mesh artifact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceRole {
    Baseline,
    Compare,
}

/// An elevation callout at one boundary vertex.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElevationLabel {
    /// The resolved 3D location of the label.
    pub point: Point3,
    pub source: SourceRole,
    /// Display text: the elevation rounded to one decimal.
    pub text: String,
}

/// Two wireframes with identical XY topology, one per source, plus
/// boundary-vertex elevation labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshResult {
    pub baseline: Polyline,
    pub compare: Polyline,
    pub labels: Vec<ElevationLabel>,
}

/// Errors from mesh construction.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    /// The boundary has too few ring coordinates; mesh build is suppressed
    /// in that state.
    #[error("boundary is not measurable: a closed ring of more than 3 coordinates is required")]
    NotMeasurable,

    /// Sampling resolution must be a positive, finite number of meters.
    #[error("mesh resolution must be a positive, finite number of meters, got {resolution}")]
    InvalidResolution { resolution: f64 },

    #[error(transparent)]
    Elevation(#[from] ElevationError),

    /// A provider answered with a different geometry shape than it was
    /// given.
    #[error("elevation provider returned a mismatched geometry shape")]
    GeometryMismatch,
}

/// Build the visualization wireframes for `boundary` at `dem_resolution`.
///
/// The line network is the boundary outline plus horizontal and vertical
/// grid lines over the expanded bbox at half the resolution, clipped to the
/// boundary interior, then densified at the same spacing so long straight
/// runs follow the terrain once resolved. Baseline and compare queries run
/// concurrently against the identical network.
pub async fn build_mesh<P: ElevationProvider>(
    boundary: &Polygon,
    dem_resolution: f64,
    baseline: &ElevationSourceRef,
    compare: &ElevationSourceRef,
    provider: &P,
) -> Result<MeshResult, MeshError> {
    if !boundary.is_measurable() {
        return Err(MeshError::NotMeasurable);
    }
    if !dem_resolution.is_finite() || dem_resolution <= 0.0 {
        return Err(MeshError::InvalidResolution {
            resolution: dem_resolution,
        });
    }

    let spacing = dem_resolution * MESH_SPACING_FACTOR;
    let network = grid_network(boundary, spacing);
    let mut clipped = clip_paths_to_polygon(&network, boundary.ring(), Tolerance::DEFAULT);
    // The outline lies on the boundary itself; it is kept whole rather
    // than clipped against its own edges.
    for path in boundary.outline().into_paths() {
        clipped.add_path(path);
    }
    let densified = clipped.densify(spacing);
    debug!(
        "mesh network: {} paths, {} vertices after densify",
        densified.paths().len(),
        densified.vertex_count()
    );

    let options = ResolveOptions::with_sample_resolution(dem_resolution);
    let wire_geometry = Geometry::Polyline(densified);
    let label_geometry = Geometry::Multipoint(boundary.vertices().to_vec());

    let (baseline_wire, compare_wire, baseline_labels, compare_labels) = tokio::try_join!(
        baseline.resolve(&wire_geometry, options, provider),
        compare.resolve(&wire_geometry, options, provider),
        baseline.resolve(&label_geometry, options, provider),
        compare.resolve(&label_geometry, options, provider),
    )?;

    let baseline_wire = baseline_wire
        .into_polyline()
        .ok_or(MeshError::GeometryMismatch)?;
    let compare_wire = compare_wire
        .into_polyline()
        .ok_or(MeshError::GeometryMismatch)?;

    let mut labels = Vec::with_capacity(boundary.vertices().len() * 2);
    collect_labels(&mut labels, baseline_labels, SourceRole::Baseline);
    collect_labels(&mut labels, compare_labels, SourceRole::Compare);

    Ok(MeshResult {
        baseline: baseline_wire,
        compare: compare_wire,
        labels,
    })
}

/// Horizontal and vertical grid lines across the expanded bbox.
fn grid_network(boundary: &Polygon, spacing: f64) -> Polyline {
    let mut network = Polyline::new();
    let bbox = boundary.bbox().expand_scale(MESH_BBOX_EXPAND);

    let mut y = bbox.ymin;
    while y < bbox.ymax {
        network.add_path(vec![Point3::xy(bbox.xmin, y), Point3::xy(bbox.xmax, y)]);
        y += spacing;
    }
    let mut x = bbox.xmin;
    while x < bbox.xmax {
        network.add_path(vec![Point3::xy(x, bbox.ymin), Point3::xy(x, bbox.ymax)]);
        x += spacing;
    }
    network
}

fn collect_labels(labels: &mut Vec<ElevationLabel>, resolved: Geometry, source: SourceRole) {
    for point in resolved.into_points() {
        labels.push(ElevationLabel {
            point,
            source,
            text: format!("{:.1}", point.z),
        });
    }
}
