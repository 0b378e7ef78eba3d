//! The extraction pass.
//!
//! ```text
//! Per cube (z, then y, then x):
//! 1. corner_positions / lattice     →  8 corner points and values
//! 2. classify                       →  case mask
//! 3. table.triangle_count(mask)     →  0 ⇒ skip the cube
//! 4. edge_crossings                 →  12 optional crossing points
//! 5. triangulate_cube               →  triangles appended to the mesh
//! ```

use std::ops::AddAssign;

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, debug_span, warn};

use crate::{
    classify::classify,
    config::{ExtractionOptions, ExtractionRequest, Parallelism, Sampling},
    error::{MarchingCubesError, Result},
    field::ScalarField,
    grid::CubeGrid,
    interp::edge_crossings,
    lattice::SampleLattice,
    mesh::SurfaceMesh,
    tables::{CaseTable, StandardCaseTable},
    triangulate::triangulate_cube,
    types::CubeIndex,
};

/// Counters collected over one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Cubes visited.
    pub cubes: usize,
    /// Cubes whose case has no triangles; these skip edge interpolation.
    pub trivial_cubes: usize,
    /// Cubes whose edges were interpolated.
    pub interpolated_cubes: usize,
    pub triangles: usize,
    /// Triangles dropped under [`MissingCrossingPolicy::SkipTriangle`](crate::config::MissingCrossingPolicy::SkipTriangle).
    pub skipped_triangles: usize,
    /// Cube corners whose sample was NaN or infinite (a shared corner counts once per cube).
    pub non_finite_corners: usize,
}

impl AddAssign for PassStats {
    fn add_assign(&mut self, rhs: Self) {
        self.cubes += rhs.cubes;
        self.trivial_cubes += rhs.trivial_cubes;
        self.interpolated_cubes += rhs.interpolated_cubes;
        self.triangles += rhs.triangles;
        self.skipped_triangles += rhs.skipped_triangles;
        self.non_finite_corners += rhs.non_finite_corners;
    }
}

/// Extracts the iso-surface of `request.field` with the standard case table.
///
/// The returned mesh is built from scratch; nothing is reused from earlier passes.
pub fn extract<F>(request: &ExtractionRequest<F>) -> Result<SurfaceMesh>
where
    F: ScalarField,
{
    extract_with_table(request, &StandardCaseTable)
}

/// Like [`extract`], but reads triangulations from `table`.
pub fn extract_with_table<F, T>(request: &ExtractionRequest<F>, table: &T) -> Result<SurfaceMesh>
where
    F: ScalarField,
    T: CaseTable + ?Sized,
{
    run_pass(request, table).map(|(mesh, _)| mesh)
}

/// Like [`extract`], and also reports what the pass did.
pub fn extract_with_stats<F>(request: &ExtractionRequest<F>) -> Result<(SurfaceMesh, PassStats)>
where
    F: ScalarField,
{
    run_pass(request, &StandardCaseTable)
}

/// Where a cube's corner values come from.
enum Corners<'a, F: ?Sized> {
    Field(&'a F),
    Lattice(SampleLattice),
}

fn run_pass<F, T>(request: &ExtractionRequest<F>, table: &T) -> Result<(SurfaceMesh, PassStats)>
where
    F: ScalarField,
    T: CaseTable + ?Sized,
{
    let grid = request.grid()?;
    let options = &request.options;

    let span = debug_span!(
        "extract",
        steps = ?grid.steps(),
        sampling = ?options.sampling,
        parallelism = ?options.parallelism
    );
    let _enter = span.enter();

    if options.is_cancelled() {
        return Err(MarchingCubesError::Cancelled);
    }

    let corners = match (options.sampling, options.parallelism) {
        (Sampling::PerCube, _) => Corners::Field(&request.field),
        (Sampling::Lattice, Parallelism::Sequential) => Corners::Lattice(SampleLattice::sample(
            &grid,
            &request.field,
            options.cancel.as_ref(),
        )?),
        (Sampling::Lattice, Parallelism::Rayon) => Corners::Lattice(SampleLattice::par_sample(
            &grid,
            &request.field,
            options.cancel.as_ref(),
        )?),
    };

    let [_, _, slabs] = grid.steps();
    let (mesh, stats) = match options.parallelism {
        Parallelism::Sequential => {
            let mut mesh = SurfaceMesh::new_empty();
            let mut stats = PassStats::default();
            for zi in 0..slabs {
                march_slab(&grid, zi, &corners, options, table, &mut mesh, &mut stats)?;
            }
            (mesh, stats)
        }
        Parallelism::Rayon => {
            let parts = (0..slabs)
                .into_par_iter()
                .map(|zi| {
                    let mut mesh = SurfaceMesh::new_empty();
                    let mut stats = PassStats::default();
                    march_slab(&grid, zi, &corners, options, table, &mut mesh, &mut stats)?;
                    Ok::<_, MarchingCubesError>((mesh, stats))
                })
                .collect::<Result<Vec<_>>>()?;

            // Merge per-slab meshes in slab order so the result matches a sequential sweep
            let mut stats = PassStats::default();
            let meshes = parts
                .into_iter()
                .map(|(mesh, part)| {
                    stats += part;
                    mesh
                })
                .collect();
            (SurfaceMesh::concat(meshes)?, stats)
        }
    };

    if stats.non_finite_corners > 0 {
        warn!(
            corners = stats.non_finite_corners,
            "field returned NaN or infinite samples; NaN corners were treated as outside"
        );
    }
    if stats.skipped_triangles > 0 {
        warn!(
            skipped = stats.skipped_triangles,
            "triangles dropped for missing edge crossings; the mesh may have cracks"
        );
    }
    debug!(
        cubes = stats.cubes,
        trivial = stats.trivial_cubes,
        triangles = stats.triangles,
        "extraction pass complete"
    );

    Ok((mesh, stats))
}

/// Marches every cube of z-slab `zi`, appending to `mesh`.
fn march_slab<F, T>(
    grid: &CubeGrid,
    zi: usize,
    corners: &Corners<'_, F>,
    options: &ExtractionOptions,
    table: &T,
    mesh: &mut SurfaceMesh,
    stats: &mut PassStats,
) -> Result<()>
where
    F: ScalarField + ?Sized,
    T: CaseTable + ?Sized,
{
    for cube in grid.slab(zi) {
        if options.is_cancelled() {
            return Err(MarchingCubesError::Cancelled);
        }
        march_cube(grid, cube, corners, options, table, mesh, stats)?;
    }
    Ok(())
}

#[inline]
fn march_cube<F, T>(
    grid: &CubeGrid,
    cube: CubeIndex,
    corners: &Corners<'_, F>,
    options: &ExtractionOptions,
    table: &T,
    mesh: &mut SurfaceMesh,
    stats: &mut PassStats,
) -> Result<()>
where
    F: ScalarField + ?Sized,
    T: CaseTable + ?Sized,
{
    stats.cubes += 1;

    let (values, positions) = match corners {
        Corners::Field(field) => {
            let positions = grid.corner_positions(cube);
            (positions.map(|p| field.evaluate(p)), Some(positions))
        }
        Corners::Lattice(lattice) => (lattice.corner_values(grid, cube), None),
    };
    stats.non_finite_corners += values.iter().filter(|v| !v.is_finite()).count();

    let mask = classify(&values, options.iso_level);
    if table.triangle_count(mask) == 0 {
        stats.trivial_cubes += 1;
        return Ok(());
    }
    stats.interpolated_cubes += 1;

    let positions = positions.unwrap_or_else(|| grid.corner_positions(cube));
    let crossings = edge_crossings(
        &positions,
        &values,
        options.iso_level,
        options.edge_tolerance,
    );

    let out = triangulate_cube(
        table,
        cube,
        mask,
        &crossings,
        options.missing_crossing,
        mesh,
    )?;
    stats.triangles += out.emitted;
    stats.skipped_triangles += out.skipped;

    Ok(())
}
