#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Volumetric cut/fill estimation over a user-drawn boundary polygon.
//!
//! The engine samples two elevation sources on a regular grid inside a
//! boundary, accumulates cut and fill volumes from the per-cell height
//! differences, and builds a wireframe comparison mesh draped over both
//! surfaces. [`measure::VolumeMeasurement`] wraps the pipelines in an
//! interactive session with debounced recomputation and stale-result
//! cancellation; elevation data arrives through the
//! [`elevation::ElevationProvider`] trait so any terrain service can back
//! a measurement.

pub mod elevation;
pub mod geom;
pub mod measure;

pub use elevation::{ElevationError, ElevationProvider, ElevationSourceRef, Geometry, LayerId};
pub use geom::{Point3, Polygon, Polyline, Rect};
pub use measure::{
    MeasurementEvent, MeasurementState, MeshResult, VolumeMeasurement, VolumeResult,
    estimate_volume,
};
