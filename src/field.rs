//! Scalar fields: the functions whose level set becomes the mesh.
//!
//! Any `Fn(Point) -> Value + Sync` closure is a [`ScalarField`]. A field must be
//! deterministic for the duration of one extraction pass; time-varying fields
//! capture their time parameter before the pass starts (see [`orbiting_pair`]).

use crate::types::{Point, Value};

/// A scalar field: maps a [`Point`] to a [`Value`].
///
/// Values **strictly above** the iso level are "inside" the surface. NaN is
/// tolerated and treated as outside.
pub trait ScalarField: Sync {
    fn evaluate(&self, p: Point) -> Value;
}

impl<F> ScalarField for F
where
    F: Fn(Point) -> Value + Sync,
{
    #[inline]
    fn evaluate(&self, p: Point) -> Value {
        self(p)
    }
}

/// The same value everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant(pub Value);

impl ScalarField for Constant {
    #[inline]
    fn evaluate(&self, _p: Point) -> Value {
        self.0
    }
}

/// Inverse-square falloff around `center`: `strength / |p - center|²`.
///
/// Infinite at the center itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSource {
    pub center: Point,
    pub strength: Value,
}

impl PointSource {
    pub fn new(center: Point) -> Self {
        Self {
            center,
            strength: 1.0,
        }
    }

    pub fn with_strength(mut self, strength: Value) -> Self {
        self.strength = strength;
        self
    }

    #[inline]
    pub fn potential(&self, p: Point) -> Value {
        self.strength / (p - self.center).norm_squared()
    }
}

impl ScalarField for PointSource {
    #[inline]
    fn evaluate(&self, p: Point) -> Value {
        self.potential(p)
    }
}

/// Sum of point-source potentials minus a threshold.
///
/// Positive where the combined potential exceeds `threshold`, so nearby
/// sources merge into a single blob.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metaballs {
    pub sources: Vec<PointSource>,
    pub threshold: Value,
}

impl Metaballs {
    pub fn new(threshold: Value) -> Self {
        Self {
            sources: Vec::new(),
            threshold,
        }
    }

    pub fn with_source(mut self, source: PointSource) -> Self {
        self.sources.push(source);
        self
    }
}

impl ScalarField for Metaballs {
    fn evaluate(&self, p: Point) -> Value {
        self.sources.iter().map(|s| s.potential(p)).sum::<Value>() - self.threshold
    }
}

/// Solid ball of `radius` around `center`: positive inside, negative outside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Point,
    pub radius: Value,
}

impl ScalarField for Sphere {
    #[inline]
    fn evaluate(&self, p: Point) -> Value {
        self.radius - (p - self.center).norm()
    }
}

/// Combined-potential threshold of the two-source scene.
pub const ORBITING_PAIR_THRESHOLD: Value = 1.2;

/// Swing of the moving source along x, in world units.
pub const ORBITING_PAIR_AMPLITUDE: Value = 3.0;

/// Two unit sources at time `time` (seconds): one fixed at the origin, one
/// oscillating along x as `3·sin(time)`, thresholded at `1.2`.
pub fn orbiting_pair(time: Value) -> Metaballs {
    Metaballs::new(ORBITING_PAIR_THRESHOLD)
        .with_source(PointSource::new(Point::origin()))
        .with_source(PointSource::new(Point::new(
            ORBITING_PAIR_AMPLITUDE * time.sin(),
            0.0,
            0.0,
        )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_fields() {
        let f = |p: Point| p.x - 1.0;
        assert_eq!(f.evaluate(Point::new(3.0, 0.0, 0.0)), 2.0);
    }

    #[test]
    fn point_source_falls_off_with_square_distance() {
        let s = PointSource::new(Point::new(1.0, 0.0, 0.0)).with_strength(4.0);
        assert_eq!(s.evaluate(Point::new(3.0, 0.0, 0.0)), 1.0);
        assert!(s.evaluate(Point::new(1.0, 0.0, 0.0)).is_infinite());
    }

    #[test]
    fn metaballs_sum_then_threshold() {
        let m = Metaballs::new(0.5)
            .with_source(PointSource::new(Point::new(-1.0, 0.0, 0.0)))
            .with_source(PointSource::new(Point::new(1.0, 0.0, 0.0)));
        // both sources at distance 1
        assert_eq!(m.evaluate(Point::origin()), 1.5);
    }

    #[test]
    fn sphere_is_positive_inside() {
        let s = Sphere {
            center: Point::origin(),
            radius: 2.0,
        };
        assert_eq!(s.evaluate(Point::new(0.0, 1.0, 0.0)), 1.0);
        assert_eq!(s.evaluate(Point::new(0.0, 0.0, 3.0)), -1.0);
    }

    #[test]
    fn orbiting_pair_starts_merged() {
        let m = orbiting_pair(0.0);
        assert_eq!(m.sources.len(), 2);
        assert_eq!(m.sources[1].center, Point::origin());
        assert_eq!(m.threshold, ORBITING_PAIR_THRESHOLD);
    }
}
