//! End-to-end extraction passes over known fields.

use std::f32::consts::{FRAC_PI_2, PI};

use implicit_cubes::{
    Bounds, CancelToken, ExtractionOptions, ExtractionRequest, MarchingCubesError,
    MissingCrossingPolicy, Parallelism, Resolution, Sampling, SurfaceMesh, extract,
    extract_with_stats,
    field::{Constant, Metaballs, PointSource, Sphere, orbiting_pair},
    types::{Point, Value},
};

fn point_source(p: Point) -> Value {
    1.0 / p.coords.norm_squared() - 1.0
}

fn unit_source_request() -> ExtractionRequest<fn(Point) -> Value> {
    ExtractionRequest::new(point_source as fn(Point) -> Value)
        .with_bounds(Bounds::cube(2.0))
        .with_resolution(Resolution::uniform(10))
}

fn sphere(radius: Value) -> Sphere {
    Sphere {
        center: Point::origin(),
        radius,
    }
}

/// Number of connected pieces, joining triangles whose vertices coincide.
fn components(mesh: &SurfaceMesh) -> usize {
    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    let mut parent: Vec<usize> = (0..mesh.triangle_count()).collect();
    for i in 0..mesh.vertices.len() {
        for j in i + 1..mesh.vertices.len() {
            if (mesh.vertices[i] - mesh.vertices[j]).norm() < 1e-4 {
                let a = find(&mut parent, i / 3);
                let b = find(&mut parent, j / 3);
                parent[a] = b;
            }
        }
    }
    (0..parent.len())
        .filter(|&t| find(&mut parent, t) == t)
        .count()
}

#[test]
fn unit_source_gives_a_unit_shell() {
    let mesh = extract(&unit_source_request()).unwrap();

    assert!(!mesh.is_empty());
    assert_eq!(mesh.indices.len() % 3, 0);
    assert_eq!(mesh.indices.len(), mesh.vertices.len());
    for v in &mesh.vertices {
        let r = v.coords.norm();
        assert!((0.95..1.1).contains(&r), "vertex {v:?} at radius {r}");
    }

    // outward-facing, roughly the unit ball
    let ratio = mesh.signed_volume() / (4.0 / 3.0 * PI);
    assert!((0.85..1.1).contains(&ratio), "volume ratio {ratio}");
    assert_eq!(components(&mesh), 1);
}

#[test]
fn field_that_is_never_inside_gives_empty_mesh() {
    let request = ExtractionRequest::new(Constant(-1.0))
        .with_bounds(Bounds::cube(3.0))
        .with_resolution(Resolution::new(4, 7, 5));
    let mesh = extract(&request).unwrap();
    assert!(mesh.vertices.is_empty());
    assert!(mesh.indices.is_empty());

    let request = ExtractionRequest::new(Constant(1.0));
    assert!(extract(&request).unwrap().is_empty());

    // touches zero at the origin, but zero counts as outside
    let request = ExtractionRequest::new(|p: Point| -p.coords.norm_squared())
        .with_resolution(Resolution::uniform(4));
    assert!(extract(&request).unwrap().is_empty());
}

#[test]
fn sources_outside_the_box_give_empty_mesh() {
    let far = Metaballs::new(1.2)
        .with_source(PointSource::new(Point::new(-4.0, 0.0, 0.0)))
        .with_source(PointSource::new(Point::new(4.0, 0.0, 0.0)));
    let request = ExtractionRequest::new(far).with_resolution(Resolution::uniform(8));
    assert!(extract(&request).unwrap().is_empty());
}

#[test]
fn close_sources_merge_into_one_blob() {
    let close = Metaballs::new(1.2)
        .with_source(PointSource::new(Point::new(-0.5, 0.0, 0.0)))
        .with_source(PointSource::new(Point::new(0.5, 0.0, 0.0)));
    let request = ExtractionRequest::new(close)
        .with_bounds(Bounds::cube(1.5))
        .with_resolution(Resolution::uniform(12));
    let mesh = extract(&request).unwrap();

    assert!(!mesh.is_empty());
    assert_eq!(components(&mesh), 1);
    assert!(mesh.signed_volume() > 0.0);
}

#[test]
fn orbiting_pair_splits_and_merges() {
    let request = |time: Value| {
        ExtractionRequest::new(orbiting_pair(time))
            .with_bounds(Bounds::cube(4.0))
            .with_resolution(Resolution::uniform(25))
    };

    let merged = extract(&request(0.0)).unwrap();
    assert_eq!(components(&merged), 1);
    assert!(merged.vertices.iter().all(|v| v.x.abs() < 1.5));

    // sources at x = 0 and x = 3: nothing spans the gap between them
    let apart = extract(&request(FRAC_PI_2)).unwrap();
    assert_eq!(components(&apart), 2);
    assert!(apart.vertices.iter().all(|v| (v.x - 1.5).abs() > 0.3));
    assert!(apart.vertices.iter().any(|v| v.x > 2.5));
}

#[test]
fn corners_exactly_on_the_level_count_as_outside() {
    // x = 0 is a lattice plane, so the surface lands on it exactly
    let request = ExtractionRequest::new(|p: Point| p.x).with_resolution(Resolution::uniform(4));
    let mesh = extract(&request).unwrap();

    // only the 4×4 cubes with x in [0, 0.5] see an inside corner
    assert_eq!(mesh.triangle_count(), 32);
    assert!(mesh.vertices.iter().all(|v| v.x == 0.0));
    assert!((mesh.area() - 4.0).abs() < 1e-4);
    for tri in 0..mesh.triangle_count() {
        let n = mesh.tri_normal(tri);
        assert!((n.x + 1.0).abs() < 1e-5, "triangle {tri} normal {n:?}");
    }
}

#[test]
fn iso_level_shifts_the_surface() {
    let options = ExtractionOptions::default().with_iso_level(0.5);
    let request = ExtractionRequest::new(sphere(1.0))
        .with_resolution(Resolution::uniform(10))
        .with_options(options);
    let mesh = extract(&request).unwrap();

    assert!(!mesh.is_empty());
    for v in &mesh.vertices {
        let r = v.coords.norm();
        assert!((0.48..0.51).contains(&r), "vertex {v:?} at radius {r}");
    }
}

fn nan_on_negative_x(p: Point) -> Value {
    if p.x < 0.0 {
        Value::NAN
    } else {
        0.5 - p.coords.norm()
    }
}

#[test]
fn nan_next_to_inside_aborts_by_default() {
    let request = ExtractionRequest::new(nan_on_negative_x).with_resolution(Resolution::uniform(4));
    let err = extract(&request).unwrap_err();
    assert!(
        matches!(
            err,
            MarchingCubesError::MissingCrossing {
                cube: [1, 1, 1],
                mask: 0x40,
                ..
            }
        ),
        "{err}"
    );
}

#[test]
fn nan_next_to_inside_can_be_skipped() {
    let options = ExtractionOptions::default().with_missing_crossing(MissingCrossingPolicy::SkipTriangle);
    let request = ExtractionRequest::new(nan_on_negative_x)
        .with_resolution(Resolution::uniform(4))
        .with_options(options);
    let (mesh, stats) = extract_with_stats(&request).unwrap();

    assert!(stats.skipped_triangles > 0);
    assert!(stats.non_finite_corners > 0);
    assert_eq!(mesh.triangle_count(), stats.triangles);
    assert!(mesh.vertices.iter().all(|v| v.x >= 0.0 && v.coords.iter().all(|c| c.is_finite())));
}

#[test]
fn repeated_passes_are_identical() {
    let request = unit_source_request();
    assert_eq!(extract(&request).unwrap(), extract(&request).unwrap());
}

#[test]
fn every_strategy_matches_the_sequential_sweep() {
    let request = ExtractionRequest::new(orbiting_pair(0.4))
        .with_bounds(Bounds::cube(4.0))
        .with_resolution(Resolution::new(20, 17, 23));
    let reference = extract(&request).unwrap();
    assert!(!reference.is_empty());

    for parallelism in [Parallelism::Sequential, Parallelism::Rayon] {
        for sampling in [Sampling::PerCube, Sampling::Lattice] {
            let options = ExtractionOptions::default()
                .with_parallelism(parallelism)
                .with_sampling(sampling);
            let mesh = extract(&request.clone().with_options(options)).unwrap();
            assert_eq!(mesh, reference, "{parallelism:?} / {sampling:?}");
        }
    }
}

#[test]
fn finer_grids_track_the_surface_more_closely() {
    let mean_error = |steps: usize| {
        let request = ExtractionRequest::new(sphere(0.8)).with_resolution(Resolution::uniform(steps));
        let mesh = extract(&request).unwrap();
        mesh.vertices
            .iter()
            .map(|v| (v.coords.norm() - 0.8).abs())
            .sum::<Value>()
            / mesh.vertices.len() as Value
    };

    let coarse = mean_error(8);
    let fine = mean_error(32);
    assert!(fine < coarse, "coarse {coarse}, fine {fine}");
    assert!(fine < 1e-3);
}

#[test]
fn doubling_the_resolution_never_loses_triangles() {
    // Single steps are not monotonic (7 -> 8 drops from 140 to 104 triangles here),
    // but each doubling refines every cube.
    let counts: Vec<usize> = [8, 16, 32]
        .into_iter()
        .map(|steps| {
            let request = unit_source_request().with_resolution(Resolution::uniform(steps));
            extract(&request).unwrap().triangle_count()
        })
        .collect();

    assert!(counts[0] > 0);
    assert!(counts.windows(2).all(|pair| pair[0] <= pair[1]), "{counts:?}");
}

#[test]
fn stats_account_for_every_cube() {
    let (mesh, stats) = extract_with_stats(&unit_source_request()).unwrap();

    assert_eq!(stats.cubes, 1000);
    assert_eq!(stats.trivial_cubes + stats.interpolated_cubes, stats.cubes);
    assert!(stats.trivial_cubes > stats.interpolated_cubes);
    assert_eq!(stats.triangles, mesh.triangle_count());
    assert_eq!(stats.skipped_triangles, 0);
    // the origin is a lattice point, where 1/|p|² is infinite
    assert_eq!(stats.non_finite_corners, 8);
}

#[test]
fn cancelled_pass_returns_no_mesh() {
    let token = CancelToken::new();
    token.cancel();
    let options = ExtractionOptions::default().with_cancel(token);

    for parallelism in [Parallelism::Sequential, Parallelism::Rayon] {
        let request = unit_source_request().with_options(options.clone().with_parallelism(parallelism));
        assert_eq!(extract(&request), Err(MarchingCubesError::Cancelled));
    }
}

#[test]
fn invalid_requests_are_rejected_before_sampling() {
    let request = ExtractionRequest::new(|_: Point| -> Value { panic!("field must not be sampled") });

    let zero = request.clone().with_resolution(Resolution::new(4, 0, 4));
    assert_eq!(
        extract(&zero),
        Err(MarchingCubesError::InvalidResolution { steps: [4, 0, 4] })
    );

    let inverted = request.clone().with_bounds(Bounds::new(
        Point::new(0.0, 1.0, 0.0),
        Point::new(1.0, -1.0, 1.0),
    ));
    assert!(matches!(
        extract(&inverted),
        Err(MarchingCubesError::InvertedBounds { axis: 1, .. })
    ));

    let infinite = request.clone().with_bounds(Bounds::new(
        Point::new(Value::NEG_INFINITY, 0.0, 0.0),
        Point::new(1.0, 1.0, 1.0),
    ));
    assert_eq!(extract(&infinite), Err(MarchingCubesError::NonFiniteBounds));

    let iso = request
        .clone()
        .with_options(ExtractionOptions::default().with_iso_level(Value::NAN));
    assert!(matches!(
        extract(&iso),
        Err(MarchingCubesError::InvalidIsoLevel(_))
    ));

    let tolerance = request.with_options(ExtractionOptions::default().with_edge_tolerance(-1.0));
    assert_eq!(
        extract(&tolerance),
        Err(MarchingCubesError::InvalidTolerance(-1.0))
    );
}
