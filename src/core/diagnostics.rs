use std::ops::{Add, AddAssign};

/// Event counters gathered during a tick.
///
/// Parallel slices each fill their own copy; copies are summed afterwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Velocity components halved by the soft cap
    pub soft_caps: u64,
    /// Velocity components zeroed by the hard cap
    pub hard_caps: u64,
    /// Exact particle overlaps hit by the local repulsion
    pub overlaps: u64,
    /// Nonzero offsets too small for their Euclidean length to register
    pub degenerate_offsets: u64,
    /// Boundary reflections
    pub reflections: u64,
    /// Particles that changed cell
    pub transitions: u64,
}

impl TickStats {
    pub fn is_quiet(&self) -> bool {
        self.hard_caps == 0 && self.overlaps == 0
    }
}

impl AddAssign for TickStats {
    fn add_assign(&mut self, rhs: Self) {
        self.soft_caps += rhs.soft_caps;
        self.hard_caps += rhs.hard_caps;
        self.overlaps += rhs.overlaps;
        self.degenerate_offsets += rhs.degenerate_offsets;
        self.reflections += rhs.reflections;
        self.transitions += rhs.transitions;
    }
}

impl Add for TickStats {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}
