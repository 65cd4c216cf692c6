//! End-to-end volume and mesh runs against analytic terrain surfaces.

use std::collections::HashMap;

use cutfill::elevation::{
    ElevationError, ElevationProvider, ElevationSourceRef, Geometry, LayerId, ResolveOptions,
};
use cutfill::geom::{Point3, Polygon, Polyline};
use cutfill::measure::{MeshError, SourceRole, VolumeError, build_mesh, estimate_volume};

type Surface = fn(f64, f64) -> f64;

/// A provider backed by closed-form surfaces, one per layer. Polylines are
/// densified per the sampling hint, the way a raster-backed service would
/// sample them.
struct TerrainService {
    layers: HashMap<&'static str, Surface>,
}

impl TerrainService {
    fn new(layers: &[(&'static str, Surface)]) -> Self {
        Self {
            layers: layers.iter().copied().collect(),
        }
    }

    fn sample(surface: Surface, geometry: Geometry, options: ResolveOptions) -> Geometry {
        let lift = |p: Point3| {
            let z = surface(p.x, p.y);
            p.with_z(z)
        };
        match geometry {
            Geometry::Point(p) => Geometry::Point(lift(p)),
            Geometry::Multipoint(points) => {
                Geometry::Multipoint(points.into_iter().map(lift).collect())
            }
            Geometry::Polyline(line) => {
                let line = match options.sample_resolution {
                    Some(spacing) => line.densify(spacing),
                    None => line,
                };
                let paths = line
                    .into_paths()
                    .into_iter()
                    .map(|path| path.into_iter().map(lift).collect())
                    .collect();
                Geometry::Polyline(Polyline::from_paths(paths))
            }
        }
    }
}

impl ElevationProvider for TerrainService {
    async fn query_elevation(
        &self,
        layer: &LayerId,
        geometry: Geometry,
        options: ResolveOptions,
    ) -> Result<Geometry, ElevationError> {
        let surface = self
            .layers
            .get(layer.as_str())
            .copied()
            .ok_or_else(|| ElevationError::LayerUnavailable { id: layer.clone() })?;
        Ok(Self::sample(surface, geometry, options))
    }
}

fn square(side: f64) -> Polygon {
    Polygon::new(vec![
        Point3::xy(0.0, 0.0),
        Point3::xy(side, 0.0),
        Point3::xy(side, side),
        Point3::xy(0.0, side),
    ])
    .unwrap()
}

#[test_log::test(tokio::test)]
async fn flat_offset_square_is_pure_fill() {
    let service = TerrainService::new(&[("ground", |_, _| 0.0), ("design", |_, _| 5.0)]);
    let result = estimate_volume(
        &square(10.0),
        10.0,
        &ElevationSourceRef::layer("ground"),
        &ElevationSourceRef::layer("design"),
        &service,
    )
    .await
    .unwrap();

    assert!((result.fill - 500.0).abs() < 1e-9);
    assert_eq!(result.cut, 0.0);
    assert!((result.net - 500.0).abs() < 1e-9);
}

#[test_log::test(tokio::test)]
async fn sloped_design_matches_analytic_volume() {
    // z = x / 10 over a 10 m square integrates to 50 m³; the midpoint rule
    // is exact for a linear surface, so 1 m cells reproduce it.
    let service = TerrainService::new(&[("ground", |_, _| 0.0), ("design", |x, _| x / 10.0)]);
    let result = estimate_volume(
        &square(10.0),
        1.0,
        &ElevationSourceRef::layer("ground"),
        &ElevationSourceRef::layer("design"),
        &service,
    )
    .await
    .unwrap();

    assert!((result.net - 50.0).abs() < 1e-9);
    assert_eq!(result.cut, 0.0);
}

#[test_log::test(tokio::test)]
async fn mixed_terrain_splits_cut_and_fill() {
    // z = x - 5 is below grade for x < 5 and above for x > 5; the two
    // halves cancel to zero net while each side carries 125 m³.
    let service = TerrainService::new(&[("ground", |_, _| 0.0), ("design", |x, _| x - 5.0)]);
    let result = estimate_volume(
        &square(10.0),
        1.0,
        &ElevationSourceRef::layer("ground"),
        &ElevationSourceRef::layer("design"),
        &service,
    )
    .await
    .unwrap();

    assert!((result.cut - (-125.0)).abs() < 1e-9);
    assert!((result.fill - 125.0).abs() < 1e-9);
    assert!(result.net.abs() < 1e-9);
}

#[test_log::test(tokio::test)]
async fn clipped_triangle_weights_cells_by_covered_area() {
    // Half the square with a constant 2 m offset: clipped edge cells must
    // contribute only their covered fraction, so the total is area * 2.
    let triangle = Polygon::new(vec![
        Point3::xy(0.0, 0.0),
        Point3::xy(10.0, 0.0),
        Point3::xy(0.0, 10.0),
    ])
    .unwrap();
    let result = estimate_volume(
        &triangle,
        0.5,
        &ElevationSourceRef::plane(0.0),
        &ElevationSourceRef::plane(2.0),
        &TerrainService::new(&[]),
    )
    .await
    .unwrap();

    assert!((result.fill - 100.0).abs() < 1e-6);
    assert_eq!(result.cut, 0.0);
}

#[test_log::test(tokio::test)]
async fn unavailable_layer_aborts_the_estimate() {
    let service = TerrainService::new(&[("design", |_, _| 5.0)]);
    let result = estimate_volume(
        &square(10.0),
        10.0,
        &ElevationSourceRef::layer("ground"),
        &ElevationSourceRef::layer("design"),
        &service,
    )
    .await;

    assert!(matches!(
        result,
        Err(VolumeError::Elevation(ElevationError::LayerUnavailable { .. }))
    ));
}

#[test_log::test(tokio::test)]
async fn degenerate_boundary_is_not_measurable() {
    let sliver = Polygon::new(vec![
        Point3::xy(0.0, 0.0),
        Point3::xy(10.0, 0.0),
        Point3::xy(0.0, 0.0),
    ])
    .unwrap();
    let result = estimate_volume(
        &sliver,
        3.0,
        &ElevationSourceRef::plane(0.0),
        &ElevationSourceRef::plane(5.0),
        &TerrainService::new(&[]),
    )
    .await;

    assert!(matches!(result, Err(VolumeError::NotMeasurable)));

    let mesh = build_mesh(
        &sliver,
        3.0,
        &ElevationSourceRef::plane(0.0),
        &ElevationSourceRef::plane(5.0),
        &TerrainService::new(&[]),
    )
    .await;
    assert!(matches!(mesh, Err(MeshError::NotMeasurable)));
}

#[test_log::test(tokio::test)]
async fn mesh_wireframes_follow_their_surfaces() {
    let service = TerrainService::new(&[("ground", |_, _| 0.0), ("design", |x, _| x / 10.0)]);
    let mesh = build_mesh(
        &square(10.0),
        3.0,
        &ElevationSourceRef::layer("ground"),
        &ElevationSourceRef::layer("design"),
        &service,
    )
    .await
    .unwrap();

    // Both wireframes share one XY topology; Z comes from each surface.
    let baseline = mesh.baseline.flat_vertices();
    let compare = mesh.compare.flat_vertices();
    assert_eq!(baseline.len(), compare.len());
    for (b, c) in baseline.iter().zip(&compare) {
        assert!(b.same_xy(*c));
        assert!(b.z.abs() < 1e-9);
        assert!((c.z - c.x / 10.0).abs() < 1e-9);
    }

    // One label per boundary vertex per source, annotated to one decimal.
    let boundary = square(10.0);
    assert_eq!(mesh.labels.len(), boundary.vertices().len() * 2);
    let corner = mesh
        .labels
        .iter()
        .find(|label| {
            label.source == SourceRole::Compare && label.point.same_xy(Point3::xy(10.0, 0.0))
        })
        .expect("compare label at (10, 0)");
    assert_eq!(corner.text, "1.0");
}
