use crate::{
    error::{MarchingCubesError, Result},
    tables::CORNER_OFFSETS,
    types::{CubeIndex, Point, Value, Vector},
};

/// Axis-aligned box sampled by a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(Point::new(-1.0, -1.0, -1.0), Point::new(1.0, 1.0, 1.0))
    }
}

impl Bounds {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// A cube of half-width `half_extent` around the origin.
    pub fn cube(half_extent: Value) -> Self {
        Self::centered(Point::origin(), Vector::repeat(2.0 * half_extent))
    }

    /// Returns the box of size `dims` centered on `center`.
    ///
    /// ```text
    ///  min = center - dims/2
    ///  max = center + dims/2
    /// ```
    pub fn centered(center: Point, dims: Vector) -> Self {
        Self {
            min: center - dims / 2.0,
            max: center + dims / 2.0,
        }
    }

    pub fn size(&self) -> Vector {
        self.max - self.min
    }

    pub fn contains(&self, p: &Point) -> bool {
        (0..3).all(|axis| self.min[axis] <= p[axis] && p[axis] <= self.max[axis])
    }

    /// Rejects non-finite and inverted boxes. A zero-width axis is allowed.
    pub fn validate(&self) -> Result<()> {
        if self.min.iter().chain(self.max.iter()).any(|v| !v.is_finite()) {
            return Err(MarchingCubesError::NonFiniteBounds);
        }
        for axis in 0..3 {
            if self.min[axis] > self.max[axis] {
                return Err(MarchingCubesError::InvertedBounds {
                    axis,
                    min: self.min[axis],
                    max: self.max[axis],
                });
            }
        }
        Ok(())
    }
}

/// Number of cubes along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub steps: [usize; 3],
}

impl Default for Resolution {
    fn default() -> Self {
        Self::uniform(16)
    }
}

impl Resolution {
    pub fn new(x: usize, y: usize, z: usize) -> Self {
        Self { steps: [x, y, z] }
    }

    pub fn uniform(steps: usize) -> Self {
        Self::new(steps, steps, steps)
    }

    pub fn cube_count(&self) -> usize {
        self.steps.iter().product()
    }

    pub fn validate(&self) -> Result<()> {
        if self.steps.contains(&0) {
            return Err(MarchingCubesError::InvalidResolution { steps: self.steps });
        }
        Ok(())
    }
}

/// The lattice of cubes a pass sweeps over.
///
/// Cube `(xi, yi, zi)` spans lattice corners `(xi..=xi+1, yi..=yi+1, zi..=zi+1)`.
/// Corner positions are derived from integer lattice indices, so cubes that
/// share a corner see the exact same point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeGrid {
    bounds: Bounds,
    steps: [usize; 3],
    cube_size: Vector,
}

impl CubeGrid {
    pub fn new(bounds: Bounds, resolution: Resolution) -> Result<Self> {
        bounds.validate()?;
        resolution.validate()?;

        let size = bounds.size();
        let steps = resolution.steps;
        let cube_size = Vector::new(
            size.x / steps[0] as Value,
            size.y / steps[1] as Value,
            size.z / steps[2] as Value,
        );

        Ok(Self {
            bounds,
            steps,
            cube_size,
        })
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn steps(&self) -> [usize; 3] {
        self.steps
    }

    pub fn cube_size(&self) -> Vector {
        self.cube_size
    }

    pub fn cube_count(&self) -> usize {
        self.steps.iter().product()
    }

    /// World coordinate of lattice index `i` along `axis`; index `steps` is exactly `max`.
    #[inline]
    pub fn lattice_coord(&self, axis: usize, i: usize) -> Value {
        if i >= self.steps[axis] {
            self.bounds.max[axis]
        } else {
            self.bounds.min[axis] + i as Value * self.cube_size[axis]
        }
    }

    /// World position of lattice corner `[x, y, z]`.
    #[inline]
    pub fn lattice_point(&self, [x, y, z]: [usize; 3]) -> Point {
        Point::new(
            self.lattice_coord(0, x),
            self.lattice_coord(1, y),
            self.lattice_coord(2, z),
        )
    }

    /// The world-space origin (corner 0) of cube `(xi, yi, zi)`.
    pub fn cube_origin(&self, cube: CubeIndex) -> Point {
        self.lattice_point(cube)
    }

    /// Lattice indices of the 8 corners of `cube`, in canonical corner order.
    #[inline]
    pub fn corner_indices(&self, [x, y, z]: CubeIndex) -> [[usize; 3]; 8] {
        CORNER_OFFSETS.map(|[dx, dy, dz]| [x + dx, y + dy, z + dz])
    }

    /// The 8 world-space corner positions of `cube`, in canonical corner order.
    #[inline]
    pub fn corner_positions(&self, cube: CubeIndex) -> [Point; 8] {
        self.corner_indices(cube).map(|corner| self.lattice_point(corner))
    }

    /// Every cube of the z-slab `zi`, y-major then x.
    pub fn slab(&self, zi: usize) -> impl Iterator<Item = CubeIndex> + '_ {
        let [sx, sy, _] = self.steps;
        (0..sy).flat_map(move |yi| (0..sx).map(move |xi| [xi, yi, zi]))
    }

    /// Every cube of the grid in sweep order: z outermost, then y, then x.
    pub fn cubes(&self) -> impl Iterator<Item = CubeIndex> + '_ {
        (0..self.steps[2]).flat_map(move |zi| self.slab(zi))
    }
}
