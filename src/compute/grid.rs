//! Toroidal Game of Life board.
//!
//! Cells are stored row-major as a flat `Vec<bool>`. Every coordinate
//! lookup wraps around the edges, so each cell has exactly eight
//! neighbours and the borders need no special handling.

use rand::Rng;
use rayon::prelude::*;

/// Apply the B3/S23 rule to one cell.
///
/// A live cell survives with 2 or 3 live neighbours, a dead cell is born
/// with exactly 3, everything else is dead in the next generation.
#[inline]
pub fn next_state(alive: bool, neighbours: u8) -> bool {
    matches!((alive, neighbours), (true, 2) | (true, 3) | (false, 3))
}

/// One generation of cell state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<bool>,
    width: usize,
    height: usize,
}

impl Grid {
    /// Create an all-dead grid.
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be non-zero");
        Self {
            cells: vec![false; width * height],
            width,
            height,
        }
    }

    /// Create a grid where every cell is alive with probability 1/2.
    pub fn random<R: Rng + ?Sized>(width: usize, height: usize, rng: &mut R) -> Self {
        let mut grid = Self::new(width, height);
        grid.fill_random(rng);
        grid
    }

    /// Re-seed every cell independently with probability 1/2.
    pub fn fill_random<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for cell in &mut self.cells {
            *cell = rng.gen_bool(0.5);
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Row-major cell states.
    #[inline]
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Cell state at in-bounds coordinates.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.cells[y * self.width + x]
    }

    /// Set a cell at in-bounds coordinates.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        self.cells[y * self.width + x] = alive;
    }

    /// Wrap possibly out-of-range coordinates onto the torus.
    #[inline]
    pub fn wrap(&self, x: isize, y: isize) -> (usize, usize) {
        (
            x.rem_euclid(self.width as isize) as usize,
            y.rem_euclid(self.height as isize) as usize,
        )
    }

    /// Cell state at wrapped coordinates.
    #[inline]
    pub fn get_wrapped(&self, x: isize, y: isize) -> bool {
        let (x, y) = self.wrap(x, y);
        self.get(x, y)
    }

    /// Flip one cell after wrapping `(x, y)` into bounds.
    pub fn invert(&mut self, x: isize, y: isize) {
        let (x, y) = self.wrap(x, y);
        let idx = y * self.width + x;
        self.cells[idx] = !self.cells[idx];
    }

    /// Number of live cells among the eight toroidal neighbours of `(x, y)`.
    #[inline]
    pub fn neighbour_count(&self, x: usize, y: usize) -> u8 {
        let w = self.width;
        let h = self.height;
        let xm1 = if x == 0 { w - 1 } else { x - 1 };
        let xp1 = if x + 1 == w { 0 } else { x + 1 };
        let ym1 = if y == 0 { h - 1 } else { y - 1 };
        let yp1 = if y + 1 == h { 0 } else { y + 1 };

        let above = &self.cells[ym1 * w..(ym1 + 1) * w];
        let row = &self.cells[y * w..(y + 1) * w];
        let below = &self.cells[yp1 * w..(yp1 + 1) * w];

        above[xm1] as u8
            + above[x] as u8
            + above[xp1] as u8
            + row[xm1] as u8
            + row[xp1] as u8
            + below[xm1] as u8
            + below[x] as u8
            + below[xp1] as u8
    }

    /// Overwrite `self` with the generation that follows `source`.
    ///
    /// Only `source` is read; the borrow rules keep the two buffers distinct.
    pub fn advance_from(&mut self, source: &Grid) {
        assert_eq!(
            (self.width, self.height),
            (source.width, source.height),
            "grid dimensions differ"
        );

        let width = self.width;
        self.cells
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, cell) in row.iter_mut().enumerate() {
                    *cell = next_state(source.get(x, y), source.neighbour_count(x, y));
                }
            });
    }

    /// Flip random cells around a random centre.
    ///
    /// Each of the nine cells in the wrapped 3x3 block is inverted with
    /// probability 1/2. Returns the chosen centre.
    pub fn perturb<R: Rng + ?Sized>(&mut self, rng: &mut R) -> (usize, usize) {
        let cx = rng.gen_range(0..self.width);
        let cy = rng.gen_range(0..self.height);

        for x in cx as isize - 1..=cx as isize + 1 {
            for y in cy as isize - 1..=cy as isize + 1 {
                if rng.gen_bool(0.5) {
                    self.invert(x, y);
                }
            }
        }

        (cx, cy)
    }

    /// Count live cells.
    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&alive| alive).count()
    }

    /// Build a grid from ASCII rows, `#` alive and anything else dead.
    #[cfg(test)]
    pub(crate) fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows[0].len();
        let mut grid = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), width, "ragged pattern");
            for (x, b) in row.bytes().enumerate() {
                grid.set(x, y, b == b'#');
            }
        }
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_l_tromino_becomes_block() {
        let mut source = Grid::new(4, 4);
        source.set(1, 1, true);
        source.set(1, 2, true);
        source.set(2, 1, true);

        let mut next = Grid::new(4, 4);
        next.advance_from(&source);

        let expected = Grid::from_rows(&["....", ".##.", ".##.", "...."]);
        assert_eq!(next, expected);
        assert_eq!(next.population(), 4);
    }

    #[test]
    fn test_rule_all_neighbourhoods() {
        // On a 3x3 torus the centre's eight neighbours are the other eight cells.
        for bits in 0u32..512 {
            let mut source = Grid::new(3, 3);
            for i in 0..9 {
                source.set(i % 3, i / 3, bits & (1 << i) != 0);
            }

            let centre = bits & (1 << 4) != 0;
            let neighbours = (bits & !(1 << 4)).count_ones() as u8;
            assert_eq!(source.neighbour_count(1, 1), neighbours);

            let mut next = Grid::new(3, 3);
            next.advance_from(&source);

            let expected = (centre && (neighbours == 2 || neighbours == 3))
                || (!centre && neighbours == 3);
            assert_eq!(next.get(1, 1), expected, "configuration {bits:#011b}");
        }
    }

    #[test]
    fn test_blinker_wraps_across_edges() {
        // Vertical blinker straddling the top/bottom seam.
        let source = Grid::from_rows(&["..#..", ".....", ".....", "..#..", "..#.."]);
        let mut next = Grid::new(5, 5);
        next.advance_from(&source);

        let expected = Grid::from_rows(&[".....", ".....", ".....", ".....", ".###."]);
        assert_eq!(next, expected);
    }

    #[test]
    fn test_advance_is_pure() {
        let mut rng = StdRng::seed_from_u64(7);
        let source = Grid::random(24, 16, &mut rng);
        let snapshot = source.clone();

        let mut a = Grid::new(24, 16);
        let mut b = Grid::random(24, 16, &mut rng);
        a.advance_from(&source);
        b.advance_from(&source);

        assert_eq!(source, snapshot);
        assert_eq!(a, b);
    }

    #[test]
    fn test_invert_wraps() {
        let mut grid = Grid::new(4, 3);
        grid.invert(-1, -1);
        assert!(grid.get(3, 2));
        grid.invert(4, 3);
        assert!(grid.get(0, 0));
        grid.invert(3, 2);
        assert!(!grid.get(3, 2));
    }

    #[test]
    fn test_random_fill_is_mixed() {
        let mut rng = StdRng::seed_from_u64(42);
        let grid = Grid::random(64, 64, &mut rng);
        let population = grid.population();
        assert!(population > 1500 && population < 2600, "population {population}");
    }

    fn torus_distance(a: usize, b: usize, size: usize) -> usize {
        let d = a.abs_diff(b);
        d.min(size - d)
    }

    proptest! {
        #[test]
        fn prop_wrap_closure(
            width in 1usize..64,
            height in 1usize..64,
            fx in 0.0f64..1.0,
            fy in 0.0f64..1.0,
        ) {
            let grid = Grid::new(width, height);
            // x in [-1, W], y in [-1, H]
            let x = (fx * (width + 2) as f64) as isize - 1;
            let y = (fy * (height + 2) as f64) as isize - 1;

            let (wx, wy) = grid.wrap(x, y);
            prop_assert!(wx < width && wy < height);
            prop_assert_eq!((wx as isize - x).rem_euclid(width as isize), 0);
            prop_assert_eq!((wy as isize - y).rem_euclid(height as isize), 0);
            prop_assert_eq!(grid.wrap(wx as isize, wy as isize), (wx, wy));
        }

        #[test]
        fn prop_perturb_is_local(seed in any::<u64>(), width in 3usize..40, height in 3usize..40) {
            let mut rng = StdRng::seed_from_u64(seed);
            let before = Grid::random(width, height, &mut rng);
            let mut after = before.clone();
            let (cx, cy) = after.perturb(&mut rng);

            for y in 0..height {
                for x in 0..width {
                    if before.get(x, y) != after.get(x, y) {
                        prop_assert!(torus_distance(x, cx, width) <= 1);
                        prop_assert!(torus_distance(y, cy, height) <= 1);
                    }
                }
            }
        }
    }
}
