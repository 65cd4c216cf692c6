//! Elevation sources: anything that can assign a Z value to XY geometry.
//!
//! A source is either a **layer** (raster/service backed, resolved through
//! an [`ElevationProvider`] the host application supplies) or a **plane**
//! (a constant-elevation surface that never performs I/O). The two are a
//! closed tagged variant, [`ElevationSourceRef`], with a single
//! [`resolve`](ElevationSourceRef::resolve) operation.
//!
//! Resolution never mutates the input geometry; callers get back a copy
//! with Z assigned, preserving XY vertex order and count so that two
//! resolutions of the same geometry zip by index.

use std::fmt;
use std::future::Future;

use serde::Serialize;

use crate::geom::{Point3, Polyline};

// ─────────────────────────────────────────────────────────────────────────────
// Identifiers and options
// ─────────────────────────────────────────────────────────────────────────────

/// Identifier of an elevation layer known to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LayerId(String);

impl LayerId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Options carried along with a resolve call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResolveOptions {
    /// Densification hint in meters. Raster-backed providers use it to
    /// choose sampling granularity; plane sources densify polylines at
    /// this spacing so both variants return comparable vertex chains.
    pub sample_resolution: Option<f64>,
}

impl ResolveOptions {
    #[must_use]
    pub const fn with_sample_resolution(sample_resolution: f64) -> Self {
        Self {
            sample_resolution: Some(sample_resolution),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Geometry payload
// ─────────────────────────────────────────────────────────────────────────────

/// The geometry shapes an elevation query accepts and returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Geometry {
    Point(Point3),
    Multipoint(Vec<Point3>),
    Polyline(Polyline),
}

impl Geometry {
    /// Number of coordinates in the geometry.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        match self {
            Self::Point(_) => 1,
            Self::Multipoint(points) => points.len(),
            Self::Polyline(line) => line.vertex_count(),
        }
    }

    /// All coordinates flattened in order.
    #[must_use]
    pub fn into_points(self) -> Vec<Point3> {
        match self {
            Self::Point(p) => vec![p],
            Self::Multipoint(points) => points,
            Self::Polyline(line) => line.flat_vertices(),
        }
    }

    /// Extract the polyline variant, if that is what this geometry is.
    #[must_use]
    pub fn into_polyline(self) -> Option<Polyline> {
        match self {
            Self::Polyline(line) => Some(line),
            _ => None,
        }
    }

    /// A copy with every coordinate's Z replaced. Polylines are densified
    /// first when the options carry a sampling hint, matching what a
    /// raster-backed provider would sample.
    #[must_use]
    fn resolved_against_plane(&self, z: f64, options: ResolveOptions) -> Self {
        match self {
            Self::Point(p) => Self::Point(p.with_z(z)),
            Self::Multipoint(points) => {
                Self::Multipoint(points.iter().map(|p| p.with_z(z)).collect())
            }
            Self::Polyline(line) => {
                let line = match options.sample_resolution {
                    Some(spacing) => line.densify(spacing),
                    None => line.clone(),
                };
                let paths = line
                    .into_paths()
                    .into_iter()
                    .map(|path| path.into_iter().map(|p| p.with_z(z)).collect())
                    .collect();
                Self::Polyline(Polyline::from_paths(paths))
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider seam and source references
// ─────────────────────────────────────────────────────────────────────────────

/// Errors from resolving elevation against a source.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ElevationError {
    /// The referenced layer is not (or no longer) available.
    #[error("elevation layer '{id}' is not available")]
    LayerUnavailable { id: LayerId },

    /// The backing service failed to answer the query.
    #[error("elevation query against layer '{id}' failed: {message}")]
    ServiceError { id: LayerId, message: String },
}

/// The host application's window onto its elevation layers. The engine
/// never reaches for a shared layer list; whatever set of layers exists is
/// behind this seam, handed in at construction.
///
/// Implementations must return geometry with the same XY coordinates (in
/// the same order) as the input, Z filled in. A failed query must surface
/// as an error, never as fabricated elevations.
pub trait ElevationProvider: Send + Sync {
    fn query_elevation(
        &self,
        layer: &LayerId,
        geometry: Geometry,
        options: ResolveOptions,
    ) -> impl Future<Output = Result<Geometry, ElevationError>> + Send;
}

/// A reference to one elevation source: a provider-backed layer or a
/// self-contained constant-elevation plane.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ElevationSourceRef {
    Layer(LayerId),
    Plane(f64),
}

impl ElevationSourceRef {
    #[must_use]
    pub fn layer(id: impl Into<LayerId>) -> Self {
        Self::Layer(id.into())
    }

    #[must_use]
    pub const fn plane(elevation: f64) -> Self {
        Self::Plane(elevation)
    }

    /// Resolve a Z value for every coordinate of `geometry`.
    ///
    /// Plane sources are pure: no I/O, always succeed. Layer sources
    /// delegate to the provider and propagate its failure untouched.
    pub async fn resolve<P: ElevationProvider>(
        &self,
        geometry: &Geometry,
        options: ResolveOptions,
        provider: &P,
    ) -> Result<Geometry, ElevationError> {
        match self {
            Self::Plane(z) => Ok(geometry.resolved_against_plane(*z, options)),
            Self::Layer(id) => {
                provider
                    .query_elevation(id, geometry.clone(), options)
                    .await
            }
        }
    }
}

impl From<LayerId> for ElevationSourceRef {
    fn from(id: LayerId) -> Self {
        Self::Layer(id)
    }
}
