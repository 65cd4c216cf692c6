//! Sample grid construction: rasterizing a boundary polygon into uniform,
//! boundary-clipped cells.
//!
//! The grid covers the boundary's bounding box with `resolution`-sized
//! squares, row-major from `(xmin, ymin)`. Squares that miss the boundary
//! are dropped, squares fully inside keep their full footprint, and squares
//! crossing the boundary are clipped to the inside fragment. Each retained
//! cell records its planar area and centroid; the centroid list is the
//! point set elevation queries run against.

use log::debug;

use crate::elevation::Geometry;
use crate::geom::{Point3, Polygon, Rect, Tolerance, clip_ring_to_rect, ring_centroid, signed_area_xy};

/// One grid square's footprint inside the boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleCell {
    /// Closed ring of the (possibly clipped) footprint.
    pub footprint: Vec<Point3>,
    /// Planar footprint area in m². Planar rather than geodesic area is a
    /// documented approximation, acceptable at survey scale.
    pub area_m2: f64,
    /// Footprint centroid; the location elevation is sampled at.
    pub center: Point3,
}

/// The retained cells plus their centroids, in identical order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleGrid {
    cells: Vec<SampleCell>,
    centers: Vec<Point3>,
}

impl SampleGrid {
    #[must_use]
    pub fn cells(&self) -> &[SampleCell] {
        &self.cells
    }

    /// One centroid per cell, same ordinal indexing as [`cells`](Self::cells).
    #[must_use]
    pub fn centers(&self) -> &[Point3] {
        &self.centers
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The centroids as elevation-query geometry.
    #[must_use]
    pub fn centers_geometry(&self) -> Geometry {
        Geometry::Multipoint(self.centers.clone())
    }

    fn push(&mut self, cell: SampleCell) {
        self.centers.push(cell.center);
        self.cells.push(cell);
    }
}

/// Errors from sample grid construction.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// Resolution must be a positive, finite number of meters. Never
    /// silently clamped.
    #[error("sample resolution must be a positive, finite number of meters, got {resolution}")]
    InvalidResolution { resolution: f64 },
}

/// Rasterize `boundary` into `resolution`-sized sample cells.
///
/// Cell ordering is deterministic (row-major from the bbox minimum), so
/// repeated builds over the same boundary yield identical grids. A boundary
/// that produces no cells (degenerate or self-cancelling ring) yields an
/// empty grid, not an error.
pub fn build_sample_grid(
    boundary: &Polygon,
    resolution: f64,
    tol: Tolerance,
) -> Result<SampleGrid, GridError> {
    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(GridError::InvalidResolution { resolution });
    }

    let bbox = boundary.bbox();
    let mut grid = SampleGrid::default();

    let mut y = bbox.ymin;
    while y < bbox.ymax {
        let mut x = bbox.xmin;
        while x < bbox.xmax {
            let square = Rect::new(x, y, x + resolution, y + resolution);
            if let Some(cell) = sample_cell(boundary, square, tol) {
                grid.push(cell);
            }
            x += resolution;
        }
        y += resolution;
    }

    debug!(
        "sample grid: {} cells at {resolution} m over {:.1} m² boundary",
        grid.len(),
        boundary.area()
    );
    Ok(grid)
}

fn sample_cell(boundary: &Polygon, square: Rect, tol: Tolerance) -> Option<SampleCell> {
    if !square.intersects(boundary.bbox()) {
        return None;
    }

    // A square whose corners all sit inside an edge-free stretch of the
    // boundary keeps its full footprint unclipped.
    let footprint = if square.corners().iter().all(|&c| boundary.contains_point(c))
        && !boundary_crosses_rect(boundary, square)
    {
        square.to_ring()
    } else {
        clip_ring_to_rect(boundary.ring(), square, tol)?
    };

    let area_m2 = signed_area_xy(&footprint).abs();
    if area_m2 <= tol.eps {
        return None;
    }
    let center = ring_centroid(&footprint, tol);
    Some(SampleCell {
        footprint,
        area_m2,
        center,
    })
}

/// Whether any boundary edge passes through the rectangle's interior band.
fn boundary_crosses_rect(boundary: &Polygon, rect: Rect) -> bool {
    boundary.ring().windows(2).any(|edge| {
        let edge_box = Rect::from_points(edge);
        edge_box.is_some_and(|b| b.intersects(rect))
    })
}
