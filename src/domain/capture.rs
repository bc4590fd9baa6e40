/// Capture resolution: the flood fill that commits a closed cut.
///
/// Pure grid surgery — no entity or score knowledge. Called when the
/// player re-enters Claimed territory while a Trail exists.
///
/// Steps:
///   1. Every Trail cell becomes Claimed unconditionally (the cut
///      itself is now a wall).
///   2. On a scratch reachability buffer, flood-fill 4-connected from
///      the Boss's cell across Void cells. Visit order does not matter
///      for correctness; a plain stack is used.
///   3. Every Void cell the fill did NOT reach is committed to Claimed.
///      Reached cells stay Void. Disjoint enclosed regions are all
///      captured in this single pass, since only the Boss-connected
///      region survives.
///
/// Seed fallback: if the Boss's cell is not Void (Boss flush against a
/// wall), probe its neighbors in the fixed order {+y, -y, +x, -x} and
/// reseed from the first Void one. If none is Void the fill is skipped
/// and nothing beyond the trail conversion happens — a deliberate
/// no-op rather than an error.

use super::cell::Cell;
use super::grid::Grid;

/// Neighbor probe order for a non-Void seed: {+y, -y, +x, -x}.
const SEED_PROBES: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

/// What a resolution changed.
#[derive(Clone, Copy, Debug, Default)]
pub struct CaptureOutcome {
    /// Total cells newly Claimed: converted trail plus enclosed regions.
    pub claimed: usize,
    /// Of those, cells captured from enclosed Void regions.
    pub enclosed: usize,
}

/// Resolve a closed cut. `boss_cell` is the current cell of the Boss
/// enemy (`None` only if no Boss exists, which skips the fill).
pub fn resolve(grid: &mut Grid, boss_cell: Option<(i32, i32)>) -> CaptureOutcome {
    let mut outcome = CaptureOutcome::default();
    let w = grid.width() as i32;
    let h = grid.height() as i32;

    // 1. The cut becomes a wall.
    for y in 0..h {
        for x in 0..w {
            if grid.cell(x, y) == Ok(Cell::Trail) {
                let _ = grid.set(x, y, Cell::Claimed);
                outcome.claimed += 1;
            }
        }
    }

    let seed = match boss_cell.and_then(|c| seed_from(grid, c)) {
        Some(s) => s,
        None => return outcome,
    };

    // 2. Mark the outside: everything Void-connected to the Boss.
    let mut outside = vec![false; (w * h) as usize];
    let mut stack = vec![seed];
    outside[(seed.1 * w + seed.0) as usize] = true;
    while let Some((x, y)) = stack.pop() {
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let (nx, ny) = (x + dx, y + dy);
            if grid.cell(nx, ny) != Ok(Cell::Void) {
                continue;
            }
            let idx = (ny * w + nx) as usize;
            if !outside[idx] {
                outside[idx] = true;
                stack.push((nx, ny));
            }
        }
    }

    // 3. Commit every enclosed Void cell.
    for y in 0..h {
        for x in 0..w {
            if grid.cell(x, y) == Ok(Cell::Void) && !outside[(y * w + x) as usize] {
                let _ = grid.set(x, y, Cell::Claimed);
                outcome.claimed += 1;
                outcome.enclosed += 1;
            }
        }
    }

    outcome
}

/// Pick the fill seed: the Boss cell itself when Void, otherwise the
/// first Void neighbor in probe order, otherwise nothing.
fn seed_from(grid: &Grid, (bx, by): (i32, i32)) -> Option<(i32, i32)> {
    if grid.cell(bx, by) == Ok(Cell::Void) {
        return Some((bx, by));
    }
    SEED_PROBES
        .iter()
        .map(|&(dx, dy)| (bx + dx, by + dy))
        .find(|&(x, y)| grid.cell(x, y) == Ok(Cell::Void))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: build a Grid from a string diagram.
    /// Legend:  '#'=Claimed  '.'=Void  '*'=Trail
    fn grid_from(rows: &[&str]) -> Grid {
        let height = rows.len();
        let width = rows[0].len();
        let mut grid = Grid::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let cell = match ch {
                    '#' => Cell::Claimed,
                    '*' => Cell::Trail,
                    _ => Cell::Void,
                };
                grid.set(x as i32, y as i32, cell).unwrap();
            }
        }
        grid
    }

    #[test]
    fn trail_becomes_wall_and_enclosed_side_is_captured() {
        // Vertical cut splits the interior; boss on the right.
        let mut g = grid_from(&[
            "########",
            "#..*...#",
            "#..*...#",
            "#..*...#",
            "########",
        ]);
        let outcome = resolve(&mut g, Some((5, 2)));
        // 3 trail cells + 6 enclosed left cells
        assert_eq!(outcome.claimed, 9);
        assert_eq!(outcome.enclosed, 6);
        // Left side claimed, right side (boss-connected) stays Void
        assert_eq!(g.cell(1, 1).unwrap(), Cell::Claimed);
        assert_eq!(g.cell(2, 3).unwrap(), Cell::Claimed);
        assert_eq!(g.cell(3, 2).unwrap(), Cell::Claimed);
        assert_eq!(g.cell(5, 2).unwrap(), Cell::Void);
        assert!(!g.has_trail());
    }

    #[test]
    fn multiple_disjoint_regions_captured_in_one_pass() {
        // Two pockets sealed off by claimed walls; boss in the middle.
        let mut g = grid_from(&[
            "#########",
            "#.#...#.#",
            "#.#...#.#",
            "#########",
        ]);
        let outcome = resolve(&mut g, Some((4, 2)));
        assert_eq!(outcome.enclosed, 4);
        assert_eq!(g.cell(1, 1).unwrap(), Cell::Claimed);
        assert_eq!(g.cell(1, 2).unwrap(), Cell::Claimed);
        assert_eq!(g.cell(7, 1).unwrap(), Cell::Claimed);
        assert_eq!(g.cell(7, 2).unwrap(), Cell::Claimed);
        assert_eq!(g.cell(3, 1).unwrap(), Cell::Void);
        assert_eq!(g.cell(5, 2).unwrap(), Cell::Void);
    }

    #[test]
    fn boss_on_wall_reseeds_from_first_void_probe() {
        // Boss sits on the claimed wall at (4, 2); probe order is
        // {+y, -y, +x, -x}, and (4, 3) below is Void, so the fill runs
        // from there and the region above the wall is captured.
        let mut g = grid_from(&[
            "#########",
            "#.......#",
            "#########",
            "#.......#",
            "#########",
        ]);
        let outcome = resolve(&mut g, Some((4, 2)));
        assert_eq!(outcome.enclosed, 7); // row 1 captured
        assert_eq!(g.cell(4, 1).unwrap(), Cell::Claimed);
        assert_eq!(g.cell(4, 3).unwrap(), Cell::Void);
    }

    #[test]
    fn boss_with_no_void_neighbor_makes_resolution_a_noop() {
        // Boss buried in claimed cells: trail still converts, but no
        // region is captured.
        let mut g = grid_from(&[
            "#########",
            "#...###.#",
            "#.*.###.#",
            "#...###.#",
            "#########",
        ]);
        let outcome = resolve(&mut g, Some((5, 2)));
        assert_eq!(outcome.claimed, 1); // the trail cell only
        assert_eq!(outcome.enclosed, 0);
        assert_eq!(g.cell(1, 1).unwrap(), Cell::Void);
        assert_eq!(g.cell(7, 2).unwrap(), Cell::Void);
        assert_eq!(g.cell(2, 2).unwrap(), Cell::Claimed);
    }

    #[test]
    fn no_boss_skips_the_fill() {
        let mut g = grid_from(&[
            "#####",
            "#.*.#",
            "#####",
        ]);
        let outcome = resolve(&mut g, None);
        assert_eq!(outcome.claimed, 1);
        assert_eq!(outcome.enclosed, 0);
        assert_eq!(g.cell(1, 1).unwrap(), Cell::Void);
    }

    #[test]
    fn partition_invariant_survives_resolution() {
        let mut g = grid_from(&[
            "########",
            "#..*...#",
            "#..*...#",
            "########",
        ]);
        let total = g.width() * g.height();
        resolve(&mut g, Some((5, 1)));
        assert_eq!(
            g.count(Cell::Void) + g.count(Cell::Claimed) + g.count(Cell::Trail),
            total
        );
    }

    #[test]
    fn owned_fraction_never_decreases() {
        let mut g = grid_from(&[
            "########",
            "#.***..#",
            "#.*.*..#",
            "#.***..#",
            "########",
        ]);
        let before = g.owned_fraction();
        resolve(&mut g, Some((6, 2)));
        assert!(g.owned_fraction() >= before);
    }
}
