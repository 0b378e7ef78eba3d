use crate::{
    tables::EDGE_CORNERS,
    types::{Point, Value},
};

/// Crossing points of the 12 edges of one cube; `None` where the field does not cross.
pub type EdgeCrossings = [Option<Point>; 12];

// Return the interpolation factor t at which the field crosses iso_val between v0 and v1
pub fn find_t(v0: Value, v1: Value, iso_val: Value) -> Value {
    (iso_val - v0) / (v1 - v0)
}

// Linear interpolation
pub fn lerp(a: Value, b: Value, t: Value) -> Value {
    a + (b - a) * t
}

// Linearly interpolate between two points by factor t
pub fn interpolate_points(p0: Point, p1: Point, t: Value) -> Point {
    Point::new(
        lerp(p0.x, p1.x, t),
        lerp(p0.y, p1.y, t),
        lerp(p0.z, p1.z, t),
    )
}

/// Returns where along an edge the field crosses zero, as a factor in `[0, 1]`.
///
/// `av` and `bv` are the edge's end values relative to the iso level. The edge
/// crosses when `av * bv <= 0`. A factor that lands within `tolerance` outside
/// `[0, 1]` is clamped; anything further out, or NaN (both ends exactly zero,
/// or a NaN end), means no crossing. An infinite end puts the crossing at the
/// finite end.
#[inline]
pub fn crossing_parameter(av: Value, bv: Value, tolerance: Value) -> Option<Value> {
    if av.is_nan() || bv.is_nan() || av * bv > 0.0 {
        return None;
    }

    let t = match (av.is_infinite(), bv.is_infinite()) {
        (false, false) => find_t(av, bv, 0.0),
        (true, false) => 1.0,
        (false, true) => 0.0,
        (true, true) => return None,
    };

    if t.is_nan() || t < -tolerance || t > 1.0 + tolerance {
        return None;
    }
    Some(t.clamp(0.0, 1.0))
}

/// Interpolates the crossing point on every edge of a cube.
///
/// All 12 edges are resolved up front so triangles sharing an edge reuse the
/// same point.
#[inline]
pub fn edge_crossings(
    corner_positions: &[Point; 8],
    corner_values: &[Value; 8],
    iso_level: Value,
    tolerance: Value,
) -> EdgeCrossings {
    let mut crossings: EdgeCrossings = [None; 12];

    for (edge, &[a, b]) in EDGE_CORNERS.iter().enumerate() {
        let av = corner_values[a] - iso_level;
        let bv = corner_values[b] - iso_level;

        crossings[edge] = crossing_parameter(av, bv, tolerance)
            .map(|t| interpolate_points(corner_positions[a], corner_positions[b], t));
    }

    crossings
}
