//! The boundary polygon: a single closed ring over which volumes are
//! measured.
//!
//! Rings are stored closed (first == last in XY). The constructor closes an
//! open ring rather than rejecting it, because boundaries arrive from an
//! interactive sketch that may or may not repeat the first vertex. Z values
//! are carried through untouched and ignored by every planar operation.

use serde::Serialize;

use super::core::{Point3, Rect, Tolerance};
use super::polyline::Polyline;

/// Errors produced by polygon construction.
#[derive(Debug, thiserror::Error)]
pub enum PolygonError {
    /// The ring has too few coordinates to describe any region.
    #[error("polygon ring must have at least 3 coordinates, got {count}")]
    TooFewCoordinates { count: usize },
}

/// A polygon with one closed ring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polygon {
    ring: Vec<Point3>,
}

impl Polygon {
    /// Build a polygon from a coordinate ring, closing it in XY if the
    /// caller left it open. Self-intersecting rings are accepted; they
    /// degrade to degenerate clip results downstream rather than failing
    /// here.
    pub fn new(mut ring: Vec<Point3>) -> Result<Self, PolygonError> {
        if ring.len() < 3 {
            return Err(PolygonError::TooFewCoordinates { count: ring.len() });
        }
        let first = ring[0];
        let last = ring[ring.len() - 1];
        if !first.same_xy(last) {
            ring.push(first);
        }
        Ok(Self { ring })
    }

    /// The closed coordinate ring, first == last.
    #[must_use]
    pub fn ring(&self) -> &[Point3] {
        &self.ring
    }

    /// Ring vertices without the duplicated closing coordinate.
    #[must_use]
    pub fn vertices(&self) -> &[Point3] {
        &self.ring[..self.ring.len() - 1]
    }

    /// Whether the boundary encloses a region worth measuring: more than 3
    /// ring coordinates including the closing one, i.e. at least a closed
    /// triangle. Anything smaller is a point or a line segment.
    #[must_use]
    pub fn is_measurable(&self) -> bool {
        self.ring.len() > 3
    }

    /// Axis-aligned bounding box of the ring.
    #[must_use]
    pub fn bbox(&self) -> Rect {
        // The ring is never empty per the constructor.
        Rect::from_points(&self.ring).unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0))
    }

    /// Planar area in square meters (absolute shoelace value).
    ///
    /// Planar rather than geodesic area is a documented approximation,
    /// acceptable at survey scale.
    #[must_use]
    pub fn area(&self) -> f64 {
        signed_area_xy(&self.ring).abs()
    }

    /// Area-weighted centroid. Falls back to the vertex mean for rings
    /// whose signed area vanishes (collinear or self-cancelling).
    #[must_use]
    pub fn centroid(&self) -> Point3 {
        ring_centroid(&self.ring, Tolerance::AREA)
    }

    /// Even-odd containment test against the XY projection of the ring.
    /// Points exactly on an edge may land on either side; the sampling
    /// grid treats that jitter as acceptable.
    #[must_use]
    pub fn contains_point(&self, p: Point3) -> bool {
        point_in_ring(&self.ring, p)
    }

    /// The boundary as a polyline with a single path, for clipping and
    /// elevation queries.
    #[must_use]
    pub fn outline(&self) -> Polyline {
        Polyline::from_paths(vec![self.ring.clone()])
    }
}

/// Signed shoelace area of a closed ring's XY projection. Positive for
/// counter-clockwise winding.
#[must_use]
pub(crate) fn signed_area_xy(ring: &[Point3]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for pair in ring.windows(2) {
        sum += pair[0].x * pair[1].y - pair[1].x * pair[0].y;
    }
    // Guard against callers handing an unclosed ring.
    let first = ring[0];
    let last = ring[ring.len() - 1];
    if !first.same_xy(last) {
        sum += last.x * first.y - first.x * last.y;
    }
    sum * 0.5
}

/// Area-weighted centroid of a closed ring, with a vertex-mean fallback
/// for degenerate rings.
#[must_use]
pub(crate) fn ring_centroid(ring: &[Point3], tol: Tolerance) -> Point3 {
    let area = signed_area_xy(ring);
    if tol.approx_zero_f64(area) {
        let n = ring.len().max(1) as f64;
        let (sx, sy) = ring
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        return Point3::xy(sx / n, sy / n);
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    for pair in ring.windows(2) {
        let cross = pair[0].x * pair[1].y - pair[1].x * pair[0].y;
        cx += (pair[0].x + pair[1].x) * cross;
        cy += (pair[0].y + pair[1].y) * cross;
    }
    let scale = 1.0 / (6.0 * area);
    Point3::xy(cx * scale, cy * scale)
}

/// Even-odd ray cast in XY.
#[must_use]
pub(crate) fn point_in_ring(ring: &[Point3], p: Point3) -> bool {
    let mut inside = false;
    for pair in ring.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if (a.y > p.y) != (b.y > p.y) {
            let t = (p.y - a.y) / (b.y - a.y);
            if p.x < a.x + t * (b.x - a.x) {
                inside = !inside;
            }
        }
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square(side: f64) -> Polygon {
        Polygon::new(vec![
            Point3::xy(0.0, 0.0),
            Point3::xy(side, 0.0),
            Point3::xy(side, side),
            Point3::xy(0.0, side),
        ])
        .unwrap()
    }

    #[test]
    fn open_ring_gets_closed() {
        let square = unit_square(10.0);
        assert_eq!(square.ring().len(), 5);
        assert!(square.ring()[0].same_xy(square.ring()[4]));
    }

    #[test]
    fn too_few_coordinates_is_rejected() {
        let result = Polygon::new(vec![Point3::xy(0.0, 0.0), Point3::xy(1.0, 0.0)]);
        assert!(matches!(
            result,
            Err(PolygonError::TooFewCoordinates { count: 2 })
        ));
    }

    #[test]
    fn measurability_gate() {
        // A closed triangle (4 ring coordinates) is measurable.
        assert!(unit_square(1.0).is_measurable());
        let triangle = Polygon::new(vec![
            Point3::xy(0.0, 0.0),
            Point3::xy(4.0, 0.0),
            Point3::xy(0.0, 3.0),
        ])
        .unwrap();
        assert!(triangle.is_measurable());

        // Three coordinates that already close describe only a segment.
        let segment = Polygon::new(vec![
            Point3::xy(0.0, 0.0),
            Point3::xy(4.0, 0.0),
            Point3::xy(0.0, 0.0),
        ])
        .unwrap();
        assert!(!segment.is_measurable());
    }

    #[test]
    fn area_is_winding_independent() {
        let ccw = unit_square(10.0);
        let cw = Polygon::new(vec![
            Point3::xy(0.0, 0.0),
            Point3::xy(0.0, 10.0),
            Point3::xy(10.0, 10.0),
            Point3::xy(10.0, 0.0),
        ])
        .unwrap();
        assert!((ccw.area() - 100.0).abs() < 1e-9);
        assert!((cw.area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn centroid_of_square_and_degenerate_ring() {
        let square = unit_square(10.0);
        let c = square.centroid();
        assert!((c.x - 5.0).abs() < 1e-9);
        assert!((c.y - 5.0).abs() < 1e-9);

        let collinear = Polygon::new(vec![
            Point3::xy(0.0, 0.0),
            Point3::xy(2.0, 0.0),
            Point3::xy(4.0, 0.0),
        ])
        .unwrap();
        let c = collinear.centroid();
        assert!(c.x.is_finite() && c.y.is_finite());
    }

    #[test]
    fn containment_even_odd() {
        let square = unit_square(10.0);
        assert!(square.contains_point(Point3::xy(5.0, 5.0)));
        assert!(!square.contains_point(Point3::xy(15.0, 5.0)));
        assert!(!square.contains_point(Point3::xy(-0.1, 5.0)));

        // Concave L-shape: the notch is outside.
        let l_shape = Polygon::new(vec![
            Point3::xy(0.0, 0.0),
            Point3::xy(10.0, 0.0),
            Point3::xy(10.0, 4.0),
            Point3::xy(4.0, 4.0),
            Point3::xy(4.0, 10.0),
            Point3::xy(0.0, 10.0),
        ])
        .unwrap();
        assert!(l_shape.contains_point(Point3::xy(2.0, 8.0)));
        assert!(!l_shape.contains_point(Point3::xy(8.0, 8.0)));
    }

    #[test]
    fn outline_has_one_closed_path() {
        let square = unit_square(10.0);
        let outline = square.outline();
        assert_eq!(outline.paths().len(), 1);
        assert_eq!(outline.paths()[0].len(), 5);
    }
}
