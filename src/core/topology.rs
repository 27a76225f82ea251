//! Chebyshev ring tables
//!
//! Ring `d` is every offset with `max(|dx|, |dy|) == d`. Tables are built once
//! up to a fixed radius; absolute lookups clip against the grid bounds.

use bevy::prelude::IVec2;

use crate::error::SimError;

/// Offsets of the Chebyshev ring of radius `d`, in a fixed order.
///
/// Walks the square clockwise-from-top-left: the top row left to right, the
/// right column downward, the bottom row right to left, then the left column
/// upward. `d == 0` yields nothing.
pub fn ring_offsets(d: usize) -> Vec<IVec2> {
    if d == 0 {
        return Vec::new();
    }
    let r = d as i32;
    let mut ring = Vec::with_capacity(8 * d);
    for dx in -r..r {
        ring.push(IVec2::new(dx, r));
    }
    for dy in (-r + 1..=r).rev() {
        ring.push(IVec2::new(r, dy));
    }
    for dx in (-r + 1..=r).rev() {
        ring.push(IVec2::new(dx, -r));
    }
    for dy in -r..r {
        ring.push(IVec2::new(-r, dy));
    }
    ring
}

#[derive(Clone, Debug)]
pub struct NeighborTopology {
    /// `rings[d]` holds ring `d`; `rings[0]` is empty.
    rings: Vec<Vec<IVec2>>,
    max_coord: IVec2,
}

impl NeighborTopology {
    /// Build tables for rings `0..=max_radius` on a grid whose last valid
    /// coordinate is `max_coord`.
    pub fn new(max_radius: usize, max_coord: IVec2) -> Self {
        Self {
            rings: (0..=max_radius).map(ring_offsets).collect(),
            max_coord,
        }
    }

    pub fn max_radius(&self) -> usize {
        self.rings.len() - 1
    }

    fn check(&self, d: usize) -> Result<(), SimError> {
        if d > self.max_radius() {
            Err(SimError::RadiusOutOfRange {
                requested: d,
                max: self.max_radius(),
            })
        } else {
            Ok(())
        }
    }

    pub fn ring(&self, d: usize) -> Result<&[IVec2], SimError> {
        self.check(d)?;
        Ok(&self.rings[d])
    }

    /// Ring `d` around `center`, translated and clipped to the grid.
    pub fn ring_at(&self, d: usize, center: IVec2) -> Result<Vec<IVec2>, SimError> {
        let mut out = Vec::with_capacity(8 * d);
        self.extend_ring_at(d, center, &mut out)?;
        Ok(out)
    }

    /// Rings `1..=d` concatenated.
    pub fn all_rings(&self, d: usize) -> Result<Vec<IVec2>, SimError> {
        self.check(d)?;
        Ok(self.rings[1..=d].iter().flatten().copied().collect())
    }

    /// Rings `1..=d` around `center`, clipped to the grid.
    pub fn all_rings_at(&self, d: usize, center: IVec2) -> Result<Vec<IVec2>, SimError> {
        self.check(d)?;
        let mut out = Vec::with_capacity(4 * d * (d + 1));
        for ring in 1..=d {
            self.extend_ring_at(ring, center, &mut out)?;
        }
        Ok(out)
    }

    /// Visit each in-grid cell of ring `d` around `center` as `(offset, absolute)`.
    ///
    /// Allocation-free form used by the diffusion pass.
    #[inline]
    pub fn for_each_in_ring<F>(&self, d: usize, center: IVec2, mut f: F) -> Result<(), SimError>
    where
        F: FnMut(IVec2, IVec2),
    {
        self.check(d)?;
        for &offset in &self.rings[d] {
            let coord = center + offset;
            if self.in_bounds(coord) {
                f(offset, coord);
            }
        }
        Ok(())
    }

    fn extend_ring_at(&self, d: usize, center: IVec2, out: &mut Vec<IVec2>) -> Result<(), SimError> {
        self.for_each_in_ring(d, center, |_, coord| out.push(coord))
    }

    #[inline(always)]
    fn in_bounds(&self, coord: IVec2) -> bool {
        coord.x >= 0 && coord.y >= 0 && coord.x <= self.max_coord.x && coord.y <= self.max_coord.y
    }
}
