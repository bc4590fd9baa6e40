/// The playfield grid.
///
/// A fixed-size rectangle of `Cell` values. The border ring is Claimed
/// from initialization and no gameplay path ever writes to it: `set`
/// calls come from trail deposition (writes a Void cell) and capture
/// resolution (writes Void/Trail cells), both of which leave Claimed
/// cells alone.
///
/// `cell` / `set` return `OutOfBounds` for coordinates outside
/// `[0,width) x [0,height)` — there is no clamping. Callers bounds-check
/// first; an `Err` reaching gameplay code is a programmer error, not a
/// runtime condition.

use thiserror::Error;

use super::cell::Cell;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
#[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
pub struct OutOfBounds {
    pub x: i32,
    pub y: i32,
    pub width: usize,
    pub height: usize,
}

#[derive(Clone, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Build a fresh level grid: Claimed border ring, Void interior.
    pub fn new(width: usize, height: usize) -> Self {
        let mut grid = Grid {
            width,
            height,
            cells: vec![Cell::Void; width * height],
        };
        for x in 0..width {
            grid.cells[x] = Cell::Claimed;
            grid.cells[(height - 1) * width + x] = Cell::Claimed;
        }
        for y in 0..height {
            grid.cells[y * width] = Cell::Claimed;
            grid.cells[y * width + width - 1] = Cell::Claimed;
        }
        grid
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn cell(&self, x: i32, y: i32) -> Result<Cell, OutOfBounds> {
        if self.in_bounds(x, y) {
            Ok(self.cells[y as usize * self.width + x as usize])
        } else {
            Err(self.oob(x, y))
        }
    }

    /// The only mutator. Performs no consistency checks of its own —
    /// capture resolution and the collision rules own the invariants.
    pub fn set(&mut self, x: i32, y: i32, cell: Cell) -> Result<(), OutOfBounds> {
        if self.in_bounds(x, y) {
            self.cells[y as usize * self.width + x as usize] = cell;
            Ok(())
        } else {
            Err(self.oob(x, y))
        }
    }

    /// Proportion of cells in state Claimed. Full scan each call — the
    /// grid is small and fixed, and a scan cannot drift out of sync.
    pub fn owned_fraction(&self) -> f64 {
        let owned = self.cells.iter().filter(|c| c.is_owned()).count();
        owned as f64 / self.cells.len() as f64
    }

    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// Is there an unresolved cut anywhere on the grid?
    pub fn has_trail(&self) -> bool {
        self.cells.iter().any(|&c| c == Cell::Trail)
    }

    /// Revert every Trail cell to Void. Death forfeits the cut.
    pub fn clear_trails(&mut self) {
        for c in &mut self.cells {
            if *c == Cell::Trail {
                *c = Cell::Void;
            }
        }
    }

    fn oob(&self, x: i32, y: i32) -> OutOfBounds {
        OutOfBounds {
            x,
            y,
            width: self.width,
            height: self.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_border_claimed_interior_void() {
        let g = Grid::new(8, 6);
        for x in 0..8 {
            assert_eq!(g.cell(x, 0).unwrap(), Cell::Claimed);
            assert_eq!(g.cell(x, 5).unwrap(), Cell::Claimed);
        }
        for y in 0..6 {
            assert_eq!(g.cell(0, y).unwrap(), Cell::Claimed);
            assert_eq!(g.cell(7, y).unwrap(), Cell::Claimed);
        }
        for y in 1..5 {
            for x in 1..7 {
                assert_eq!(g.cell(x, y).unwrap(), Cell::Void);
            }
        }
    }

    #[test]
    fn out_of_bounds_is_an_error_not_a_clamp() {
        let g = Grid::new(4, 4);
        assert!(g.cell(-1, 0).is_err());
        assert!(g.cell(0, -1).is_err());
        assert!(g.cell(4, 0).is_err());
        assert!(g.cell(0, 4).is_err());
        let err = g.cell(9, 2).unwrap_err();
        assert_eq!(err.x, 9);
        assert_eq!(err.width, 4);
    }

    #[test]
    fn partition_invariant_holds_through_mutation() {
        let mut g = Grid::new(10, 10);
        g.set(3, 3, Cell::Trail).unwrap();
        g.set(4, 3, Cell::Trail).unwrap();
        g.set(5, 5, Cell::Claimed).unwrap();
        let total = g.count(Cell::Void) + g.count(Cell::Claimed) + g.count(Cell::Trail);
        assert_eq!(total, 100);
    }

    #[test]
    fn owned_fraction_ignores_trails() {
        let mut g = Grid::new(10, 10);
        let before = g.owned_fraction();
        g.set(4, 4, Cell::Trail).unwrap();
        g.set(5, 4, Cell::Trail).unwrap();
        assert_eq!(g.owned_fraction(), before);
        g.clear_trails();
        assert_eq!(g.owned_fraction(), before);
        assert!(!g.has_trail());
    }

    #[test]
    fn owned_fraction_counts_border() {
        let g = Grid::new(10, 10);
        // 10x10 grid: border ring is 36 cells
        assert!((g.owned_fraction() - 0.36).abs() < 1e-12);
    }
}
