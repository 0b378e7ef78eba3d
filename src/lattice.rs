use ndarray::{Array3, ArrayViewMut2, Axis, Zip, parallel::prelude::*};

use crate::{
    cancel::CancelToken,
    error::{MarchingCubesError, Result},
    field::ScalarField,
    grid::CubeGrid,
    types::{CubeIndex, Value},
};

/// Scalar field values sampled once at every lattice corner of a [`CubeGrid`].
///
/// The lattice has `(steps_x + 1) × (steps_y + 1) × (steps_z + 1)` corners and
/// is indexed `[z, y, x]`. Sampling this way calls the field once per corner
/// instead of once per cube corner, and guarantees that every cube touching a
/// corner reads the same value.
#[derive(Debug, Clone)]
pub struct SampleLattice {
    values: Array3<Value>,
}

impl SampleLattice {
    /// Evaluates `field` at every corner of `grid` on the calling thread.
    ///
    /// `cancel` is checked before each z-plane of the lattice.
    pub fn sample<F>(grid: &CubeGrid, field: &F, cancel: Option<&CancelToken>) -> Result<Self>
    where
        F: ScalarField + ?Sized,
    {
        let mut values = Self::zeroed(grid);
        for (z, plane) in values.axis_iter_mut(Axis(0)).enumerate() {
            fill_plane(grid, field, cancel, z, plane)?;
        }
        Ok(Self { values })
    }

    /// Like [`sample`](SampleLattice::sample), but spreads the z-planes over the rayon pool.
    pub fn par_sample<F>(grid: &CubeGrid, field: &F, cancel: Option<&CancelToken>) -> Result<Self>
    where
        F: ScalarField + ?Sized,
    {
        let mut values = Self::zeroed(grid);
        values
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .try_for_each(|(z, plane)| fill_plane(grid, field, cancel, z, plane))?;
        Ok(Self { values })
    }

    fn zeroed(grid: &CubeGrid) -> Array3<Value> {
        let [sx, sy, sz] = grid.steps();
        Array3::zeros((sz + 1, sy + 1, sx + 1))
    }

    /// Returns the value at lattice corner `(x, y, z)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> Value {
        self.values[[z, y, x]]
    }

    /// Returns `(steps_x + 1, steps_y + 1, steps_z + 1)`.
    pub fn dims(&self) -> [usize; 3] {
        let (z, y, x) = self.values.dim();
        [x, y, z]
    }

    /// The 8 corner values of `cube`, in canonical corner order.
    #[inline]
    pub fn corner_values(&self, grid: &CubeGrid, cube: CubeIndex) -> [Value; 8] {
        grid.corner_indices(cube).map(|[x, y, z]| self.get(x, y, z))
    }
}

/// Samples the lattice plane at height `z`, unless the pass was cancelled.
fn fill_plane<F>(
    grid: &CubeGrid,
    field: &F,
    cancel: Option<&CancelToken>,
    z: usize,
    plane: ArrayViewMut2<'_, Value>,
) -> Result<()>
where
    F: ScalarField + ?Sized,
{
    if cancel.is_some_and(CancelToken::is_cancelled) {
        return Err(MarchingCubesError::Cancelled);
    }
    Zip::indexed(plane).for_each(|(y, x), value| {
        *value = field.evaluate(grid.lattice_point([x, y, z]));
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::{
        grid::{Bounds, Resolution},
        types::Point,
    };

    fn plane(p: Point) -> Value {
        p.x + 10.0 * p.y + 100.0 * p.z
    }

    #[test]
    fn lattice_has_one_more_corner_than_cubes_per_axis() {
        let grid = CubeGrid::new(Bounds::default(), Resolution::new(2, 3, 4)).unwrap();
        let lattice = SampleLattice::sample(&grid, &plane, None).unwrap();
        assert_eq!(lattice.dims(), [3, 4, 5]);
    }

    #[test]
    fn corner_values_match_direct_evaluation() {
        let grid = CubeGrid::new(Bounds::cube(1.5), Resolution::new(3, 4, 5)).unwrap();
        let lattice = SampleLattice::sample(&grid, &plane, None).unwrap();

        for cube in grid.cubes() {
            let expected = grid.corner_positions(cube).map(plane);
            assert_eq!(lattice.corner_values(&grid, cube), expected, "cube {cube:?}");
        }
    }

    #[test]
    fn parallel_sampling_matches_sequential() {
        let grid = CubeGrid::new(Bounds::cube(2.0), Resolution::uniform(6)).unwrap();
        let field = |p: Point| (p.coords.norm_squared() - 1.0).sin();
        let seq = SampleLattice::sample(&grid, &field, None).unwrap();
        let par = SampleLattice::par_sample(&grid, &field, None).unwrap();
        assert_eq!(seq.values, par.values);
    }

    #[test]
    fn cancelling_stops_sampling_between_planes() {
        let grid = CubeGrid::new(Bounds::default(), Resolution::uniform(8)).unwrap();
        let token = CancelToken::new();
        let calls = AtomicUsize::new(0);
        // cancels itself partway through the second z-plane
        let field = |p: Point| {
            calls.fetch_add(1, Ordering::Relaxed);
            if p.z > -1.0 {
                token.cancel();
            }
            p.x
        };

        let result = SampleLattice::sample(&grid, &field, Some(&token));
        assert!(matches!(result, Err(MarchingCubesError::Cancelled)));
        // planes are 9 × 9 corners; only the first two were filled
        assert_eq!(calls.load(Ordering::Relaxed), 2 * 81);
    }

    #[test]
    fn cancelled_token_skips_parallel_sampling() {
        let grid = CubeGrid::new(Bounds::default(), Resolution::uniform(8)).unwrap();
        let token = CancelToken::new();
        token.cancel();
        let field = |_: Point| -> Value { panic!("field must not be sampled") };

        assert!(matches!(
            SampleLattice::par_sample(&grid, &field, Some(&token)),
            Err(MarchingCubesError::Cancelled)
        ));
    }
}
