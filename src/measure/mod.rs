//! Cut/fill measurement: sample-grid construction, volume accumulation,
//! mesh generation, and the interactive session around them.

mod grid;
mod mesh;
mod session;
mod volume;

pub use grid::{GridError, SampleCell, SampleGrid, build_sample_grid};
pub use mesh::{
    ElevationLabel, MESH_BBOX_EXPAND, MESH_SPACING_FACTOR, MeshError, MeshResult, SourceRole,
    build_mesh,
};
pub use session::{
    DEFAULT_RESOLUTION, MeasurementEvent, MeasurementState, ParameterError, RESOLUTION_RANGE,
    SessionOptions, VolumeMeasurement,
};
pub use volume::{VolumeError, VolumeResult, estimate_volume};
