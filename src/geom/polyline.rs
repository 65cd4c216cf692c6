//! Multi-path line networks.
//!
//! A [`Polyline`] is the wireframe currency of the engine: the boundary
//! outline, the mesh grid lines, and the elevation-resolved copies of both
//! are all polylines. Paths are independent open chains of vertices.

use serde::Serialize;

use super::core::Point3;

/// A collection of line paths. Each path is an ordered vertex chain; paths
/// are not connected to each other.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Polyline {
    paths: Vec<Vec<Point3>>,
}

impl Polyline {
    #[must_use]
    pub const fn new() -> Self {
        Self { paths: Vec::new() }
    }

    #[must_use]
    pub fn from_paths(paths: Vec<Vec<Point3>>) -> Self {
        Self { paths }
    }

    /// Append a path. Paths with fewer than 2 vertices carry no segments
    /// but are kept as-is; callers decide what a lone vertex means.
    pub fn add_path(&mut self, path: Vec<Point3>) {
        self.paths.push(path);
    }

    #[must_use]
    pub fn paths(&self) -> &[Vec<Point3>] {
        &self.paths
    }

    #[must_use]
    pub fn into_paths(self) -> Vec<Vec<Point3>> {
        self.paths
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.iter().all(Vec::is_empty)
    }

    /// Total number of vertices across all paths.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.paths.iter().map(Vec::len).sum()
    }

    /// Total planar (XY) length across all paths.
    #[must_use]
    pub fn total_length_xy(&self) -> f64 {
        self.paths
            .iter()
            .map(|path| {
                path.windows(2)
                    .map(|pair| pair[0].distance_xy(pair[1]))
                    .sum::<f64>()
            })
            .sum()
    }

    /// All vertices flattened in path order.
    #[must_use]
    pub fn flat_vertices(&self) -> Vec<Point3> {
        self.paths.iter().flatten().copied().collect()
    }

    /// Densify every path so that no segment is longer than `max_segment`
    /// in XY. Inserted vertices are linear interpolations of the segment
    /// endpoints; existing vertices are preserved, so densifying an already
    /// dense polyline is a no-op.
    ///
    /// Spacing is planar, a documented stand-in for geodesic densification;
    /// at survey scale the difference is negligible.
    #[must_use]
    pub fn densify(&self, max_segment: f64) -> Self {
        if !(max_segment > 0.0) {
            return self.clone();
        }
        let paths = self
            .paths
            .iter()
            .map(|path| densify_path(path, max_segment))
            .collect();
        Self { paths }
    }
}

fn densify_path(path: &[Point3], max_segment: f64) -> Vec<Point3> {
    if path.len() < 2 {
        return path.to_vec();
    }
    let mut out = Vec::with_capacity(path.len());
    for pair in path.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        out.push(a);
        let length = a.distance_xy(b);
        if length > max_segment {
            let pieces = (length / max_segment).ceil() as usize;
            for i in 1..pieces {
                out.push(a.lerp(b, i as f64 / pieces as f64));
            }
        }
    }
    out.push(path[path.len() - 1]);
    out
}
