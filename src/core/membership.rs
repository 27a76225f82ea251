//! Cell → resident particle index
//!
//! Only occupied cells have an entry. Insertion order is kept so every pass
//! over residents is reproducible.

use indexmap::{IndexMap, IndexSet};

use crate::core::grid::CellId;
use crate::core::particle::ParticleId;

pub type Residents = IndexSet<ParticleId>;

#[derive(Clone, Debug, Default)]
pub struct Membership {
    cells: IndexMap<CellId, Residents>,
}

impl Membership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn residents(&self, cell: CellId) -> Option<&Residents> {
        self.cells.get(&cell)
    }

    pub fn contains(&self, cell: CellId, particle: ParticleId) -> bool {
        self.cells
            .get(&cell)
            .is_some_and(|residents| residents.contains(&particle))
    }

    pub fn is_occupied(&self, cell: CellId) -> bool {
        self.cells.contains_key(&cell)
    }

    /// Occupied cells in index order.
    pub fn occupied(&self) -> impl Iterator<Item = CellId> + '_ {
        self.cells.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellId, &Residents)> {
        self.cells.iter().map(|(&id, residents)| (id, residents))
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.len()
    }

    pub fn particle_count(&self) -> usize {
        self.cells.values().map(IndexSet::len).sum()
    }

    /// Remove `removed`, then insert `added`, for one cell.
    ///
    /// Returns `true` when the cell ends up empty, in which case its entry has
    /// been dropped.
    pub fn update<R, A>(&mut self, cell: CellId, removed: R, added: A) -> bool
    where
        R: IntoIterator<Item = ParticleId>,
        A: IntoIterator<Item = ParticleId>,
    {
        let residents = self.cells.entry(cell).or_default();
        for particle in removed {
            residents.shift_remove(&particle);
        }
        residents.extend(added);

        if residents.is_empty() {
            self.cells.shift_remove(&cell);
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}
