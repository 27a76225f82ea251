use bevy::math::{IVec2, Vec2};

pub type Real = f32;

pub type Vector = Vec2;
pub type Coord = IVec2;

#[inline(always)]
pub fn zero_vector() -> Vector {
    Vec2::ZERO
}

#[inline(always)]
pub fn repeat_vector(value: Real) -> Vector {
    Vec2::splat(value)
}

/// Grid coordinate of the cell holding `position` for cells of edge `resolution`.
///
/// Cell lookup and cell containment both go through this mapping.
#[inline(always)]
pub fn cell_coord(position: Vector, resolution: Real) -> Coord {
    let inv = 1.0 / resolution;
    IVec2::new(
        (position.x * inv).floor() as i32,
        (position.y * inv).floor() as i32,
    )
}

/// L1 length of an offset, `|x| + |y|`.
#[inline(always)]
pub fn l1_length(v: Vector) -> Real {
    v.x.abs() + v.y.abs()
}

/// Offset scaled so its components sum (in absolute value) to one.
///
/// Diagonal and axis-aligned neighbours both end up with unit L1 length, so a
/// diagonal neighbour pushes as hard as an adjacent one. Returns `None` for a
/// zero offset; callers count that as a degenerate case.
#[inline(always)]
pub fn l1_direction(offset: Vector) -> Option<Vector> {
    let length = l1_length(offset);
    if length > 0.0 && length.is_finite() {
        Some(offset / length)
    } else {
        None
    }
}

/// Chebyshev distance between two grid coordinates.
#[inline(always)]
pub fn chebyshev(a: Coord, b: Coord) -> i32 {
    let d = (a - b).abs();
    d.x.max(d.y)
}

#[inline(always)]
pub fn vector_is_finite(v: Vector) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l1_direction_of_diagonal_has_half_components() {
        let dir = l1_direction(Vec2::new(1.0, -1.0)).unwrap();
        assert_eq!(dir, Vec2::new(0.5, -0.5));
        assert_eq!(l1_length(dir), 1.0);
    }

    #[test]
    fn l1_direction_rejects_zero_offset() {
        assert!(l1_direction(Vec2::ZERO).is_none());
    }

    #[test]
    fn chebyshev_takes_max_axis() {
        assert_eq!(chebyshev(IVec2::new(3, 1), IVec2::new(0, 0)), 3);
        assert_eq!(chebyshev(IVec2::new(-2, 2), IVec2::new(0, 0)), 2);
    }
}
