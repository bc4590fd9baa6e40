/// Cell states and their properties.
/// Properties are queried via methods, not stored as flags,
/// so cell semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cell {
    /// Unclaimed space. Dangerous ground; enemies roam here.
    Void,
    /// Player-owned territory. Safe ground, blocks enemies.
    Claimed,
    /// In-progress cut through Void. Becomes Claimed on loop closure,
    /// reverts to Void on death.
    Trail,
}

impl Cell {
    /// Does this cell count toward the owned fraction?
    /// Trail deliberately does not: an unresolved cut owns nothing yet,
    /// which keeps the owned fraction monotonic even when trails are
    /// cleared on death.
    pub fn is_owned(self) -> bool {
        matches!(self, Cell::Claimed)
    }

    /// Do enemies bounce off this cell?
    pub fn blocks_enemies(self) -> bool {
        matches!(self, Cell::Claimed)
    }

    /// Is the player safe from proximity kills while standing here?
    pub fn is_safe_ground(self) -> bool {
        matches!(self, Cell::Claimed)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Void
    }
}
