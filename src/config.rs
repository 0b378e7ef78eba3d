use crate::{
    cancel::CancelToken,
    error::{MarchingCubesError, Result},
    grid::{Bounds, CubeGrid, Resolution},
    types::Value,
};

/// Default ε for accepting interpolation factors slightly outside `[0, 1]`.
pub const DEFAULT_EDGE_TOLERANCE: Value = 1e-6;

/// What to do when the case table wants a triangle on an edge with no crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingCrossingPolicy {
    /// Fail the whole pass with [`MarchingCubesError::MissingCrossing`].
    #[default]
    Abort,
    /// Drop only the offending triangle, log a warning, and keep going.
    SkipTriangle,
}

/// How the cube sweep is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parallelism {
    /// One thread, z → y → x.
    #[default]
    Sequential,
    /// One rayon job per z-slab; results are concatenated in slab order, so
    /// the mesh is identical to the sequential one.
    Rayon,
}

/// Where cube corner values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sampling {
    /// Evaluate the field at the 8 corners of every cube.
    #[default]
    PerCube,
    /// Evaluate the field once per lattice corner up front, then read cubes from the lattice.
    Lattice,
}

/// Tuning knobs of an extraction pass.
///
/// ```rust,ignore
/// let options = ExtractionOptions::default()
///     .with_parallelism(Parallelism::Rayon)
///     .with_missing_crossing(MissingCrossingPolicy::SkipTriangle);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    /// Surface level. A corner is inside when its value is strictly above it.
    pub iso_level: Value,
    /// ε for the edge interpolator.
    pub edge_tolerance: Value,
    pub missing_crossing: MissingCrossingPolicy,
    pub parallelism: Parallelism,
    pub sampling: Sampling,
    /// Checked before every cube when present.
    pub cancel: Option<CancelToken>,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            iso_level: 0.0,
            edge_tolerance: DEFAULT_EDGE_TOLERANCE,
            missing_crossing: MissingCrossingPolicy::default(),
            parallelism: Parallelism::default(),
            sampling: Sampling::default(),
            cancel: None,
        }
    }
}

impl ExtractionOptions {
    pub fn with_iso_level(mut self, iso_level: Value) -> Self {
        self.iso_level = iso_level;
        self
    }

    pub fn with_edge_tolerance(mut self, tolerance: Value) -> Self {
        self.edge_tolerance = tolerance;
        self
    }

    pub fn with_missing_crossing(mut self, policy: MissingCrossingPolicy) -> Self {
        self.missing_crossing = policy;
        self
    }

    pub fn with_parallelism(mut self, parallelism: Parallelism) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.iso_level.is_finite() {
            return Err(MarchingCubesError::InvalidIsoLevel(self.iso_level));
        }
        if !self.edge_tolerance.is_finite() || self.edge_tolerance < 0.0 {
            return Err(MarchingCubesError::InvalidTolerance(self.edge_tolerance));
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

/// One extraction pass: which region to sample, how finely, and what field.
///
/// ```rust,ignore
/// let request = ExtractionRequest::new(|p: Point| 1.0 / p.coords.norm_squared() - 1.0)
///     .with_bounds(Bounds::cube(2.0))
///     .with_resolution(Resolution::uniform(10));
/// let mesh = extract(&request)?;
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionRequest<F> {
    pub bounds: Bounds,
    /// Cost grows with the product of the steps.
    pub resolution: Resolution,
    pub field: F,
    pub options: ExtractionOptions,
}

impl<F> ExtractionRequest<F> {
    pub fn new(field: F) -> Self {
        Self {
            bounds: Bounds::default(),
            resolution: Resolution::default(),
            field,
            options: ExtractionOptions::default(),
        }
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_options(mut self, options: ExtractionOptions) -> Self {
        self.options = options;
        self
    }

    /// Validates the request and lays out its cube grid.
    pub fn grid(&self) -> Result<CubeGrid> {
        self.options.validate()?;
        CubeGrid::new(self.bounds, self.resolution)
    }
}
