mod clip;
mod core;
mod polygon;
mod polyline;

pub use clip::{clip_paths_to_polygon, clip_ring_to_rect};
pub use core::{Point3, Rect, Tolerance};
pub use polygon::{Polygon, PolygonError};
pub use polyline::Polyline;

pub(crate) use polygon::{ring_centroid, signed_area_xy};
