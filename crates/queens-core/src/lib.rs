//! Core engine for the colored-region queens puzzle under partial
//! observability.
//!
//! A puzzle is an `n x n` grid partitioned into `n` contiguous colored
//! regions; a solution places one queen per row, column, and region with no
//! two queens diagonally adjacent. The twist: the solver may start with most
//! region colors hidden and must earn them back, either free through logical
//! inference or by spending probes from a hard budget.
//!
//! The pieces:
//! - [`Board`] holds ground truth, the knowledge grid, and queen placements.
//! - [`ActiveSolver`] runs the row-by-row backtracking search with active
//!   sensing, driven by a [`SolverConfig`].
//! - [`loader`] reads puzzle files and reads/writes solution logs.
//!
//! ```
//! use queens_core::{ActiveSolver, Board};
//!
//! let regions = vec![
//!     1, 1, 2, 2,
//!     1, 2, 2, 2,
//!     3, 3, 2, 2,
//!     3, 4, 4, 2,
//! ];
//! let mut board = Board::new(4, regions)?;
//! let mut solver = ActiveSolver::new(&mut board);
//! assert!(solver.solve());
//! # Ok::<(), queens_core::BoardError>(())
//! ```

pub mod board;
pub mod loader;
pub mod solver;

pub use board::{Board, BoardError, Position, RegionId};
pub use loader::{PuzzleFileError, SolveRecord};
pub use solver::{
    ActiveSolver, AdjacencyRules, ProbeBudget, RuleWeights, SolverConfig, SolverStats,
};
