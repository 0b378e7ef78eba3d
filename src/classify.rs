use derive_more::Display;

use crate::types::Value;

/// 8-bit corner sign pattern of a cube: bit `i` is set when corner `i` is inside.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[display("{_0:#010b}")]
pub struct CaseMask(pub u8);

impl CaseMask {
    /// Every corner outside.
    pub const EMPTY: CaseMask = CaseMask(0x00);
    /// Every corner inside.
    pub const FULL: CaseMask = CaseMask(0xff);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether corner `corner` (0..8) is inside.
    #[inline]
    pub fn is_inside(self, corner: usize) -> bool {
        self.0 & (1 << corner) != 0
    }

    /// The mask with every corner flipped.
    #[inline]
    pub fn complement(self) -> CaseMask {
        CaseMask(!self.0)
    }
}

/// Computes the case mask of a cube from its corner values.
///
/// A corner is inside only when `value - iso_level > 0`. A value exactly at the
/// iso level is outside, and NaN compares false, so NaN corners are outside too.
///
/// ```text
/// corner index:  7  6  5  4  3  2  1  0
/// mask bits:    [_][_][_][_][_][_][_][_]
///                                     ^-- corner 0 inside?
/// ```
#[inline]
pub fn classify(corner_values: &[Value; 8], iso_level: Value) -> CaseMask {
    let mut mask = 0u8;
    for (i, &v) in corner_values.iter().enumerate() {
        if v - iso_level > 0.0 {
            mask |= 1 << i;
        }
    }
    CaseMask(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictly_positive_corners_are_inside() {
        let values = [1.0, -1.0, 0.5, -0.5, 2.0, -2.0, 0.1, -0.1];
        assert_eq!(classify(&values, 0.0), CaseMask(0b0101_0101));
    }

    #[test]
    fn zero_is_outside() {
        let values = [0.0; 8];
        assert_eq!(classify(&values, 0.0), CaseMask::EMPTY);

        let mut values = [1.0; 8];
        values[3] = 0.0;
        let mask = classify(&values, 0.0);
        assert!(!mask.is_inside(3));
        assert_eq!(mask, CaseMask(0b1111_0111));
    }

    #[test]
    fn nan_is_outside() {
        let mut values = [1.0; 8];
        values[0] = Value::NAN;
        values[7] = Value::NAN;
        assert_eq!(classify(&values, 0.0), CaseMask(0b0111_1110));
    }

    #[test]
    fn infinities_classify_by_sign() {
        let mut values = [-1.0; 8];
        values[2] = Value::INFINITY;
        values[5] = Value::NEG_INFINITY;
        assert_eq!(classify(&values, 0.0), CaseMask(0b0000_0100));
    }

    #[test]
    fn iso_level_shifts_the_threshold() {
        let values = [0.5, 1.5, 1.0, 0.0, 2.0, 0.9, 1.1, -3.0];
        assert_eq!(classify(&values, 1.0), CaseMask(0b0101_0010));
    }

    #[test]
    fn complement_flips_every_corner() {
        assert_eq!(CaseMask(0b1010_0001).complement(), CaseMask(0b0101_1110));
        assert_eq!(CaseMask::EMPTY.complement(), CaseMask::FULL);
    }
}
