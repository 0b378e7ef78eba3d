use derive_more::Display;

use crate::types::{CubeIndex, Value};

pub type Result<T> = core::result::Result<T, MarchingCubesError>;

#[derive(Debug, Display, Clone, PartialEq)]
pub enum MarchingCubesError {
    /// Some axis was given zero steps.
    #[display("resolution must be at least one step per axis, got {steps:?}")]
    InvalidResolution { steps: [usize; 3] },

    /// `min > max` on `axis` (0 = x, 1 = y, 2 = z).
    #[display("inverted bounds on axis {axis}: min {min} > max {max}")]
    InvertedBounds { axis: usize, min: Value, max: Value },

    #[display("bounds must be finite")]
    NonFiniteBounds,

    #[display("edge tolerance must be finite and non-negative, got {_0}")]
    InvalidTolerance(Value),

    #[display("iso level must be finite, got {_0}")]
    InvalidIsoLevel(Value),

    /// The mesh would need vertex indices beyond `u32::MAX`.
    #[display("mesh would hold {vertices} vertices, more than u32 indices can address")]
    MeshTooLarge { vertices: usize },

    /// The case table asked for a triangle on an edge that has no crossing point.
    #[display("case {mask:#04x} of cube {cube:?} references edge {edge}, which has no crossing")]
    MissingCrossing {
        cube: CubeIndex,
        mask: u8,
        edge: usize,
    },

    #[display("extraction cancelled")]
    Cancelled,
}

impl std::error::Error for MarchingCubesError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let err = MarchingCubesError::InvertedBounds {
            axis: 1,
            min: 2.0,
            max: -1.0,
        };
        assert_eq!(err.to_string(), "inverted bounds on axis 1: min 2 > max -1");

        let err = MarchingCubesError::MissingCrossing {
            cube: [1, 2, 3],
            mask: 0x0f,
            edge: 8,
        };
        assert_eq!(
            err.to_string(),
            "case 0x0f of cube [1, 2, 3] references edge 8, which has no crossing"
        );
    }
}
