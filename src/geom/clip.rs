//! Clipping of rings and line networks against the measurement boundary.
//!
//! Two operations cover everything the engine needs:
//! - [`clip_ring_to_rect`] intersects the boundary ring with a convex grid
//!   square (Sutherland–Hodgman against the square's four half-planes) and
//!   returns the fragment inside both, which is exactly the inside part of
//!   a boundary-crossing sample cell.
//! - [`clip_paths_to_polygon`] cuts a line network at every boundary
//!   crossing and keeps only the sub-segments whose midpoint lies inside
//!   the boundary.
//!
//! Both degrade to empty output for degenerate input instead of failing;
//! "no geometry survived the clip" is a normal answer here.

use super::core::{Point3, Rect, Tolerance};
use super::polygon::{point_in_ring, signed_area_xy};
use super::polyline::Polyline;

/// Parametric tolerance for deduplicating crossing parameters on a segment.
const PARAM_EPS: f64 = 1e-12;

/// Clip a closed ring against an axis-aligned rectangle, returning the
/// closed inside fragment, or `None` when nothing of substance remains
/// (fragment area at or below `tol.eps`, in m²).
#[must_use]
pub fn clip_ring_to_rect(ring: &[Point3], rect: Rect, tol: Tolerance) -> Option<Vec<Point3>> {
    if ring.len() < 3 {
        return None;
    }
    // Work on the open ring; the closing duplicate is re-added at the end.
    let mut subject: Vec<Point3> = if ring[0].same_xy(ring[ring.len() - 1]) {
        ring[..ring.len() - 1].to_vec()
    } else {
        ring.to_vec()
    };

    for edge in [
        RectEdge::Left(rect.xmin),
        RectEdge::Right(rect.xmax),
        RectEdge::Bottom(rect.ymin),
        RectEdge::Top(rect.ymax),
    ] {
        subject = clip_against_edge(&subject, edge);
        if subject.len() < 3 {
            return None;
        }
    }

    subject.push(subject[0]);
    if signed_area_xy(&subject).abs() <= tol.eps {
        return None;
    }
    Some(subject)
}

/// One half-plane of a clip rectangle.
#[derive(Clone, Copy)]
enum RectEdge {
    Left(f64),
    Right(f64),
    Bottom(f64),
    Top(f64),
}

impl RectEdge {
    fn is_inside(self, p: Point3) -> bool {
        match self {
            Self::Left(x) => p.x >= x,
            Self::Right(x) => p.x <= x,
            Self::Bottom(y) => p.y >= y,
            Self::Top(y) => p.y <= y,
        }
    }

    /// Intersection of segment `a -> b` with the edge line. Only called
    /// when the segment crosses, so the denominator is nonzero.
    fn intersect(self, a: Point3, b: Point3) -> Point3 {
        let t = match self {
            Self::Left(x) | Self::Right(x) => (x - a.x) / (b.x - a.x),
            Self::Bottom(y) | Self::Top(y) => (y - a.y) / (b.y - a.y),
        };
        a.lerp(b, t)
    }
}

fn clip_against_edge(subject: &[Point3], edge: RectEdge) -> Vec<Point3> {
    let mut out = Vec::with_capacity(subject.len() + 4);
    for i in 0..subject.len() {
        let current = subject[i];
        let previous = subject[(i + subject.len() - 1) % subject.len()];
        let current_in = edge.is_inside(current);
        let previous_in = edge.is_inside(previous);

        if current_in {
            if !previous_in {
                out.push(edge.intersect(previous, current));
            }
            out.push(current);
        } else if previous_in {
            out.push(edge.intersect(previous, current));
        }
    }
    out
}

/// Parametric intersection of segments `a0 -> a1` and `b0 -> b1` in XY.
/// Returns `(t, u)` with the crossing at `a0.lerp(a1, t)`. Parallel and
/// collinear segments yield `None`; the callers treat overlap as
/// non-crossing.
#[must_use]
pub(crate) fn segment_intersection_t(
    a0: Point3,
    a1: Point3,
    b0: Point3,
    b1: Point3,
) -> Option<(f64, f64)> {
    let rx = a1.x - a0.x;
    let ry = a1.y - a0.y;
    let sx = b1.x - b0.x;
    let sy = b1.y - b0.y;
    let denom = rx * sy - ry * sx;
    if denom.abs() <= Tolerance::ZERO_LENGTH.eps {
        return None;
    }
    let qx = b0.x - a0.x;
    let qy = b0.y - a0.y;
    let t = (qx * sy - qy * sx) / denom;
    let u = (qx * ry - qy * rx) / denom;
    if (-PARAM_EPS..=1.0 + PARAM_EPS).contains(&t) && (-PARAM_EPS..=1.0 + PARAM_EPS).contains(&u) {
        Some((t.clamp(0.0, 1.0), u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// Clip every path of a line network against a boundary ring, keeping the
/// inside fragments. Contiguous kept pieces are merged back into single
/// paths so densification and elevation queries see continuous lines.
#[must_use]
pub fn clip_paths_to_polygon(
    lines: &Polyline,
    boundary: &[Point3],
    tol: Tolerance,
) -> Polyline {
    let mut out = Polyline::new();
    for path in lines.paths() {
        let mut current: Vec<Point3> = Vec::new();
        for pair in path.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a.distance_xy(b) <= Tolerance::ZERO_LENGTH.eps {
                continue;
            }

            let mut crossings = vec![0.0, 1.0];
            for edge in boundary.windows(2) {
                if let Some((t, _)) = segment_intersection_t(a, b, edge[0], edge[1]) {
                    crossings.push(t);
                }
            }
            crossings.sort_by(f64::total_cmp);
            crossings.dedup_by(|x, y| (*x - *y).abs() <= PARAM_EPS);

            for span in crossings.windows(2) {
                let (t0, t1) = (span[0], span[1]);
                if t1 - t0 <= PARAM_EPS {
                    continue;
                }
                let midpoint = a.lerp(b, (t0 + t1) * 0.5);
                if !point_in_ring(boundary, midpoint) {
                    continue;
                }
                let p0 = a.lerp(b, t0);
                let p1 = a.lerp(b, t1);
                let contiguous = current
                    .last()
                    .is_some_and(|last| last.distance_xy(p0) <= tol.eps);
                if contiguous {
                    current.push(p1);
                } else {
                    if current.len() >= 2 {
                        out.add_path(std::mem::take(&mut current));
                    }
                    current = vec![p0, p1];
                }
            }
        }
        if current.len() >= 2 {
            out.add_path(current);
        }
    }
    out
}
