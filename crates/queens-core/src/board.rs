//! Board state: ground-truth region grid, knowledge grid, and queen assignments.
//!
//! The three grids are parallel n×n matrices stored row-major. Ground truth is
//! immutable after construction; the knowledge grid is monotonic (a cell goes
//! Unknown → Known exactly once, via probe or inference, and never back); the
//! assignment grid is the only state the search driver rolls back.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Region identifier. Small positive integers, 1-based; 0 is never a region.
pub type RegionId = u8;

/// A cell coordinate on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The four orthogonal neighbor offsets, in up/down/left/right order.
pub(crate) const ORTHOGONAL: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// In-bounds orthogonal neighbors of a cell on an n×n board.
pub(crate) fn orthogonal_neighbors(
    n: usize,
    row: usize,
    col: usize,
) -> impl Iterator<Item = (usize, usize)> {
    ORTHOGONAL.iter().filter_map(move |&(dr, dc)| {
        let r = row.checked_add_signed(dr)?;
        let c = col.checked_add_signed(dc)?;
        (r < n && c < n).then_some((r, c))
    })
}

/// Errors raised by board construction.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("board size must be at least 1")]
    EmptyBoard,
    #[error("region grid has {found} cells, expected {expected} for size {size}")]
    WrongCellCount {
        size: usize,
        expected: usize,
        found: usize,
    },
    #[error("region id 0 at cell ({row}, {col}); ids are 1-based")]
    ZeroRegionId { row: usize, col: usize },
    #[error("board of size {size} has {found} distinct regions, expected {size}")]
    WrongRegionCount { size: usize, found: usize },
}

/// An n×n colored-region queens board.
///
/// Construction yields a fully-known board; apply [`Board::mask_fraction`] or
/// [`Board::mask_all`] to model partial observability before solving.
#[derive(Debug, Clone)]
pub struct Board {
    n: usize,
    regions: Vec<RegionId>,
    knowledge: Vec<Option<RegionId>>,
    queens: Vec<bool>,
}

impl Board {
    /// Build a board from a row-major region grid.
    pub fn new(n: usize, regions: Vec<RegionId>) -> Result<Self, BoardError> {
        if n == 0 {
            return Err(BoardError::EmptyBoard);
        }
        if regions.len() != n * n {
            return Err(BoardError::WrongCellCount {
                size: n,
                expected: n * n,
                found: regions.len(),
            });
        }
        if let Some(idx) = regions.iter().position(|&id| id == 0) {
            return Err(BoardError::ZeroRegionId {
                row: idx / n,
                col: idx % n,
            });
        }
        let distinct: BTreeSet<RegionId> = regions.iter().copied().collect();
        if distinct.len() != n {
            return Err(BoardError::WrongRegionCount {
                size: n,
                found: distinct.len(),
            });
        }
        let knowledge = regions.iter().map(|&id| Some(id)).collect();
        Ok(Self {
            n,
            regions,
            knowledge,
            queens: vec![false; n * n],
        })
    }

    /// Board side length.
    #[inline]
    pub fn size(&self) -> usize {
        self.n
    }

    #[inline]
    fn idx(&self, row: usize, col: usize) -> usize {
        debug_assert!(row < self.n && col < self.n);
        row * self.n + col
    }

    /// Ground-truth region id of a cell. Read-only; the solver pays for this
    /// information through [`Board::reveal`].
    #[inline]
    pub fn region_of(&self, row: usize, col: usize) -> RegionId {
        self.regions[self.idx(row, col)]
    }

    /// Current knowledge of a cell: `Some(id)` if Known, `None` if Unknown.
    #[inline]
    pub fn known(&self, row: usize, col: usize) -> Option<RegionId> {
        self.knowledge[self.idx(row, col)]
    }

    /// Number of Unknown cells in the knowledge grid.
    pub fn unknown_count(&self) -> usize {
        self.knowledge.iter().filter(|k| k.is_none()).count()
    }

    /// All region ids present in the ground truth.
    pub fn region_ids(&self) -> BTreeSet<RegionId> {
        self.regions.iter().copied().collect()
    }

    /// Hide every cell's region id.
    pub fn mask_all(&mut self) {
        self.knowledge.fill(None);
    }

    /// Hide a single cell's region id.
    pub fn mask_cell(&mut self, row: usize, col: usize) {
        let idx = self.idx(row, col);
        self.knowledge[idx] = None;
    }

    /// Hide each cell independently with probability `fraction`.
    ///
    /// The fraction is clamped to `[0, 1]`. Masking is only meaningful before
    /// a solve; it is not monotonicity-constrained the way reveals are.
    pub fn mask_fraction<R: Rng>(&mut self, fraction: f64, rng: &mut R) {
        let p = fraction.clamp(0.0, 1.0);
        for cell in self.knowledge.iter_mut() {
            if rng.gen_bool(p) {
                *cell = None;
            }
        }
    }

    /// Copy the ground truth of one cell into the knowledge grid.
    ///
    /// Returns the region id now known. No-op on an already-Known cell, so
    /// knowledge stays monotonic.
    pub fn reveal(&mut self, row: usize, col: usize) -> RegionId {
        let idx = self.idx(row, col);
        let id = self.regions[idx];
        if self.knowledge[idx].is_none() {
            self.knowledge[idx] = Some(id);
        }
        id
    }

    /// Record an inferred region id for an Unknown cell.
    ///
    /// Inference is only ever accepted when it is certain, so a mismatch with
    /// an existing Known value is a logic error upstream; the existing value
    /// wins and the write is dropped.
    pub fn set_inferred(&mut self, row: usize, col: usize, id: RegionId) {
        let idx = self.idx(row, col);
        if self.knowledge[idx].is_none() {
            self.knowledge[idx] = Some(id);
        }
    }

    /// Whether a queen currently occupies the cell.
    #[inline]
    pub fn has_queen(&self, row: usize, col: usize) -> bool {
        self.queens[self.idx(row, col)]
    }

    /// Whether any queen occupies the given row.
    pub fn queen_in_row(&self, row: usize) -> bool {
        self.queens[row * self.n..(row + 1) * self.n]
            .iter()
            .any(|&q| q)
    }

    pub fn place_queen(&mut self, row: usize, col: usize) {
        let idx = self.idx(row, col);
        debug_assert!(!self.queens[idx], "queen already at ({row}, {col})");
        self.queens[idx] = true;
    }

    pub fn remove_queen(&mut self, row: usize, col: usize) {
        let idx = self.idx(row, col);
        debug_assert!(self.queens[idx], "no queen at ({row}, {col})");
        self.queens[idx] = false;
    }

    /// Remove every queen from the board.
    pub fn clear_queens(&mut self) {
        self.queens.fill(false);
    }

    /// Number of queens currently placed.
    pub fn queen_count(&self) -> usize {
        self.queens.iter().filter(|&&q| q).count()
    }

    /// Positions of all placed queens, in row-major order.
    pub fn queen_positions(&self) -> Vec<Position> {
        (0..self.n * self.n)
            .filter(|&i| self.queens[i])
            .map(|i| Position::new(i / self.n, i % self.n))
            .collect()
    }

    /// Render placed queens as a `Q`/`.` diagram.
    pub fn queens_diagram(&self) -> String {
        let mut out = String::with_capacity(self.n * (2 * self.n + 1));
        for row in 0..self.n {
            for col in 0..self.n {
                out.push(if self.has_queen(row, col) { 'Q' } else { '.' });
                if col + 1 < self.n {
                    out.push(' ');
                }
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Board {
    /// Knowledge-grid view: region ids for Known cells, `?` for Unknown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.n {
            for col in 0..self.n {
                if col > 0 {
                    write!(f, " ")?;
                }
                match self.known(row, col) {
                    Some(id) => write!(f, "{id}")?,
                    None => write!(f, "?")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn small_board() -> Board {
        // 2x2, two regions in vertical stripes
        Board::new(2, vec![1, 2, 1, 2]).unwrap()
    }

    #[test]
    fn test_new_validates_cell_count() {
        let err = Board::new(3, vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, BoardError::WrongCellCount { .. }));
    }

    #[test]
    fn test_new_rejects_zero_region_id() {
        let err = Board::new(2, vec![1, 0, 2, 2]).unwrap_err();
        assert!(matches!(err, BoardError::ZeroRegionId { row: 0, col: 1 }));
    }

    #[test]
    fn test_new_requires_n_regions() {
        let err = Board::new(2, vec![1, 1, 1, 1]).unwrap_err();
        assert!(matches!(err, BoardError::WrongRegionCount { found: 1, .. }));
    }

    #[test]
    fn test_starts_fully_known() {
        let board = small_board();
        assert_eq!(board.unknown_count(), 0);
        assert_eq!(board.known(0, 1), Some(2));
    }

    #[test]
    fn test_mask_all_and_reveal() {
        let mut board = small_board();
        board.mask_all();
        assert_eq!(board.unknown_count(), 4);
        assert_eq!(board.known(1, 0), None);

        let id = board.reveal(1, 0);
        assert_eq!(id, 1);
        assert_eq!(board.known(1, 0), Some(1));
        assert_eq!(board.unknown_count(), 3);
    }

    #[test]
    fn test_reveal_is_idempotent() {
        let mut board = small_board();
        board.mask_all();
        board.reveal(0, 0);
        board.reveal(0, 0);
        assert_eq!(board.unknown_count(), 3);
    }

    #[test]
    fn test_knowledge_is_monotonic_under_inference() {
        let mut board = small_board();
        board.mask_all();
        board.reveal(0, 0);
        // A later inference write must not overturn the Known value
        board.set_inferred(0, 0, 2);
        assert_eq!(board.known(0, 0), Some(1));
    }

    #[test]
    fn test_mask_fraction_is_seeded_and_bounded() {
        let regions: Vec<RegionId> = (0..16).map(|i| (i % 4 + 1) as RegionId).collect();
        let mut a = Board::new(4, regions.clone()).unwrap();
        let mut b = Board::new(4, regions).unwrap();
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        a.mask_fraction(0.5, &mut rng_a);
        b.mask_fraction(0.5, &mut rng_b);

        for row in 0..4 {
            for col in 0..4 {
                assert_eq!(a.known(row, col), b.known(row, col), "seeded masks differ");
            }
        }

        let mut all = Board::new(2, vec![1, 2, 1, 2]).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        all.mask_fraction(1.0, &mut rng);
        assert_eq!(all.unknown_count(), 4);

        let mut none = Board::new(2, vec![1, 2, 1, 2]).unwrap();
        none.mask_fraction(0.0, &mut rng);
        assert_eq!(none.unknown_count(), 0);
    }

    #[test]
    fn test_queen_placement_and_rollback() {
        let mut board = small_board();
        board.place_queen(0, 0);
        assert!(board.has_queen(0, 0));
        assert!(board.queen_in_row(0));
        assert_eq!(board.queen_count(), 1);
        assert_eq!(board.queen_positions(), vec![Position::new(0, 0)]);

        board.remove_queen(0, 0);
        assert!(!board.has_queen(0, 0));
        assert_eq!(board.queen_count(), 0);
    }

    #[test]
    fn test_display_marks_unknown_cells() {
        let mut board = small_board();
        board.mask_all();
        board.reveal(0, 0);
        let text = format!("{board}");
        assert_eq!(text, "1 ?\n? ?\n");
    }

    #[test]
    fn test_queens_diagram() {
        let mut board = small_board();
        board.place_queen(0, 1);
        assert_eq!(board.queens_diagram(), ". Q\n. .\n");
    }
}
