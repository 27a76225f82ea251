//! Fixed background grid
//!
//! Dense cell arena plus an `[ix][iy]` lookup matrix of arena indices. The
//! arena is sized once and never reallocates.

use bevy::prelude::*;

use crate::config::SimParams;
use crate::error::SimError;
use crate::math::{Coord, Real, Vector, cell_coord, zero_vector};

/// Dense cell index, usable directly as an arena index.
pub type CellId = usize;

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub coord: IVec2,
    /// Signed occupancy; negative means the cell has been pulled below empty.
    pub density: Real,
    /// Force handed in by entering particles, owned by the residents.
    pub momentum: Vector,
    /// Derived each tick from neighbour densities.
    pub diffusion: Vector,
}

impl Cell {
    #[inline(always)]
    pub fn zeroed(coord: IVec2) -> Self {
        Self {
            coord,
            density: 0.0,
            momentum: zero_vector(),
            diffusion: zero_vector(),
        }
    }

    #[inline(always)]
    pub fn zero(&mut self) {
        self.density = 0.0;
        self.momentum = zero_vector();
        self.diffusion = zero_vector();
    }

    pub fn view(&self) -> CellView {
        CellView {
            coord: self.coord,
            density: self.density,
            momentum: self.momentum,
        }
    }
}

/// Read-only copy of the fields collaborators render or preview.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellView {
    pub coord: IVec2,
    pub density: Real,
    pub momentum: Vector,
}

#[derive(Clone, Debug)]
pub struct SpatialGrid {
    cells: Vec<Cell>,
    lookup: Vec<Vec<CellId>>,
    dimensions: UVec2,
    resolution: Real,
}

impl SpatialGrid {
    pub fn new(dimensions: UVec2, resolution: Real) -> Result<Self, SimError> {
        if dimensions.x == 0 || dimensions.y == 0 {
            return Err(SimError::EmptyGrid);
        }
        if !(resolution > 0.0 && resolution.is_finite()) {
            return Err(SimError::invalid("resolution", "must be positive and finite"));
        }

        let count = dimensions.x as usize * dimensions.y as usize;
        let mut cells = Vec::with_capacity(count);
        let mut lookup = vec![vec![0; dimensions.y as usize]; dimensions.x as usize];
        for iy in 0..dimensions.y {
            for ix in 0..dimensions.x {
                lookup[ix as usize][iy as usize] = cells.len();
                cells.push(Cell::zeroed(IVec2::new(ix as i32, iy as i32)));
            }
        }

        Ok(Self {
            cells,
            lookup,
            dimensions,
            resolution,
        })
    }

    pub fn from_params(params: &SimParams) -> Result<Self, SimError> {
        Self::new(params.grid_dimensions(), params.resolution)
    }

    pub fn dimensions(&self) -> UVec2 {
        self.dimensions
    }

    /// Largest valid coordinate on each axis.
    pub fn max_coord(&self) -> IVec2 {
        self.dimensions.as_ivec2() - IVec2::ONE
    }

    pub fn resolution(&self) -> Real {
        self.resolution
    }

    /// Length of a cell's diagonal.
    pub fn cell_diagonal(&self) -> Real {
        self.resolution * std::f32::consts::SQRT_2
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline(always)]
    pub fn is_valid_coord(&self, coord: Coord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as u32) < self.dimensions.x
            && (coord.y as u32) < self.dimensions.y
    }

    #[inline(always)]
    pub fn id_at(&self, coord: Coord) -> Option<CellId> {
        if self.is_valid_coord(coord) {
            Some(self.lookup[coord.x as usize][coord.y as usize])
        } else {
            None
        }
    }

    pub fn coord_of(&self, id: CellId) -> Option<Coord> {
        self.cells.get(id).map(|cell| cell.coord)
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id)
    }

    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell> {
        self.cells.get_mut(id)
    }

    pub fn cell_at(&self, coord: Coord) -> Option<&Cell> {
        self.id_at(coord).map(|id| &self.cells[id])
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Grid coordinate containing `position`, which may be outside the grid.
    #[inline(always)]
    pub fn coord_from_position(&self, position: Vector) -> Coord {
        cell_coord(position, self.resolution)
    }

    #[inline(always)]
    pub fn id_from_position(&self, position: Vector) -> Option<CellId> {
        self.id_at(self.coord_from_position(position))
    }

    /// Whether `position` lies inside the half-open bounds of cell `id`,
    /// using the same mapping as [`Self::coord_from_position`].
    #[inline(always)]
    pub fn contains(&self, id: CellId, position: Vector) -> bool {
        self.cells
            .get(id)
            .is_some_and(|cell| self.coord_from_position(position) == cell.coord)
    }


    pub fn total_density(&self) -> Real {
        self.cells.iter().map(|cell| cell.density).sum()
    }

    pub fn total_momentum(&self) -> Vector {
        self.cells.iter().map(|cell| cell.momentum).sum()
    }

    pub fn zero_all(&mut self) {
        for cell in &mut self.cells {
            cell.zero();
        }
    }
}
