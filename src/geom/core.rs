use serde::Serialize;

// ─────────────────────────────────────────────────────────────────────────────
// Point3
// ─────────────────────────────────────────────────────────────────────────────

/// A 3D coordinate. Sampling and clipping operate on X/Y only; Z carries a
/// resolved elevation (or 0.0 for geometry that has not been resolved yet).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    /// The origin point (0, 0, 0).
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// A 2D coordinate with Z at 0.
    #[must_use]
    pub const fn xy(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0)
    }

    /// Create a Point3 from an array.
    #[must_use]
    pub const fn from_array(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// The same XY location with a new elevation.
    #[must_use]
    pub const fn with_z(self, z: f64) -> Self {
        Self::new(self.x, self.y, z)
    }

    /// Linear interpolation between two points.
    /// Returns `self * (1 - t) + rhs * t`.
    #[must_use]
    pub fn lerp(self, rhs: Self, t: f64) -> Self {
        Self::new(
            self.x + (rhs.x - self.x) * t,
            self.y + (rhs.y - self.y) * t,
            self.z + (rhs.z - self.z) * t,
        )
    }

    /// Euclidean distance to another point, all three axes.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Planar (XY) distance to another point.
    #[must_use]
    pub fn distance_xy(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Whether two points share the same XY location exactly.
    #[must_use]
    pub fn same_xy(self, other: Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl Default for Point3 {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl From<[f64; 3]> for Point3 {
    fn from(arr: [f64; 3]) -> Self {
        Self::from_array(arr)
    }
}

impl From<Point3> for [f64; 3] {
    fn from(p: Point3) -> Self {
        p.to_array()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rect
// ─────────────────────────────────────────────────────────────────────────────

/// A planar axis-aligned rectangle. Grid cells and boundary bounding boxes
/// are rectangles; elevation plays no part in sampling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Rect {
    #[must_use]
    pub const fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Axis-aligned bounding box of a point set in XY.
    /// Returns `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Point3]) -> Option<Self> {
        let mut iter = points.iter();
        let first = iter.next()?;
        let mut rect = Self::new(first.x, first.y, first.x, first.y);
        for p in iter {
            rect.xmin = rect.xmin.min(p.x);
            rect.ymin = rect.ymin.min(p.y);
            rect.xmax = rect.xmax.max(p.x);
            rect.ymax = rect.ymax.max(p.y);
        }
        Some(rect)
    }

    #[must_use]
    pub fn width(self) -> f64 {
        self.xmax - self.xmin
    }

    #[must_use]
    pub fn height(self) -> f64 {
        self.ymax - self.ymin
    }

    /// Planar area of the rectangle.
    #[must_use]
    pub fn area(self) -> f64 {
        self.width() * self.height()
    }

    #[must_use]
    pub fn center(self) -> Point3 {
        Point3::xy(
            (self.xmin + self.xmax) * 0.5,
            (self.ymin + self.ymax) * 0.5,
        )
    }

    /// Check if an XY location is inside the rectangle (inclusive).
    #[must_use]
    pub fn contains(self, p: Point3) -> bool {
        p.x >= self.xmin && p.x <= self.xmax && p.y >= self.ymin && p.y <= self.ymax
    }

    /// Check if this rectangle overlaps another (inclusive of edges).
    #[must_use]
    pub fn intersects(self, other: Self) -> bool {
        self.xmin <= other.xmax
            && self.xmax >= other.xmin
            && self.ymin <= other.ymax
            && self.ymax >= other.ymin
    }

    /// Scale the rectangle about its center. A factor of 1.1 grows each
    /// dimension by 10%, matching the mesh grid's expanded extent.
    #[must_use]
    pub fn expand_scale(self, factor: f64) -> Self {
        let center = self.center();
        let half_w = self.width() * 0.5 * factor;
        let half_h = self.height() * 0.5 * factor;
        Self::new(
            center.x - half_w,
            center.y - half_h,
            center.x + half_w,
            center.y + half_h,
        )
    }

    /// Corner points in counter-clockwise order starting at (xmin, ymin).
    #[must_use]
    pub fn corners(self) -> [Point3; 4] {
        [
            Point3::xy(self.xmin, self.ymin),
            Point3::xy(self.xmax, self.ymin),
            Point3::xy(self.xmax, self.ymax),
            Point3::xy(self.xmin, self.ymax),
        ]
    }

    /// The rectangle as a closed ring (5 points, first == last).
    #[must_use]
    pub fn to_ring(self) -> Vec<Point3> {
        let c = self.corners();
        vec![c[0], c[1], c[2], c[3], c[0]]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tolerance
// ─────────────────────────────────────────────────────────────────────────────

/// Tolerance configuration for geometric comparisons.
///
/// Named constants keep epsilons from scattering through the code:
/// - `Tolerance::DEFAULT` - general coordinate comparisons (1e-9)
/// - `Tolerance::AREA` - degenerate clip-fragment detection in m² (1e-6)
/// - `Tolerance::ZERO_LENGTH` - zero-length segment detection (1e-12)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub eps: f64,
}

impl Tolerance {
    /// Default geometric tolerance (1e-9).
    pub const DEFAULT: Self = Self { eps: 1e-9 };

    /// Tolerance for discarding degenerate clip fragments, in m² (1e-6).
    pub const AREA: Self = Self { eps: 1e-6 };

    /// Tolerance for detecting zero-length segments (1e-12).
    pub const ZERO_LENGTH: Self = Self { eps: 1e-12 };

    #[must_use]
    pub const fn new(eps: f64) -> Self {
        Self { eps }
    }

    #[must_use]
    pub fn approx_eq_f64(self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.eps
    }

    #[must_use]
    pub fn approx_zero_f64(self, a: f64) -> bool {
        a.abs() <= self.eps
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
