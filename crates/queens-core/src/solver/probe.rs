//! Probe budget accounting and information-gain-directed probe selection.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::board::{orthogonal_neighbors, Board};

/// Tracks how many ground-truth reveals are still permitted.
///
/// The limit is computed once, at solve start, from the knowledge-grid
/// snapshot. Probes are irrevocable: the budget is never refunded, including
/// on backtrack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeBudget {
    limit: usize,
    used: usize,
    exhausted: bool,
}

impl ProbeBudget {
    /// `limit = floor(unknown_cells * fraction)`, fraction clamped to `[0, 1]`.
    pub fn new(unknown_cells: usize, fraction: f64) -> Self {
        let limit = (unknown_cells as f64 * fraction.clamp(0.0, 1.0)).floor() as usize;
        Self {
            limit,
            used: 0,
            exhausted: limit == 0,
        }
    }

    /// Whether another probe is permitted. Latches `exhausted` the first time
    /// the answer is no.
    pub fn can_probe(&mut self) -> bool {
        if self.used < self.limit {
            true
        } else {
            self.exhausted = true;
            false
        }
    }

    /// Record one consumed probe. Only called after a successful
    /// [`ProbeBudget::can_probe`].
    pub fn record_probe(&mut self) {
        debug_assert!(self.used < self.limit, "probe past budget");
        self.used += 1;
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// Expected information gain of probing a cell: one unit for the cell itself,
/// plus bonuses for Unknown neighbors it may help deduce, structural priors,
/// and region diversity among its Known neighbors.
pub(crate) fn estimate_gain(board: &Board, row: usize, col: usize) -> f64 {
    let n = board.size();
    let mut unknown_neighbors = 0usize;
    let mut known_regions = BTreeSet::new();
    for (r, c) in orthogonal_neighbors(n, row, col) {
        match board.known(r, c) {
            None => unknown_neighbors += 1,
            Some(id) => {
                known_regions.insert(id);
            }
        }
    }
    1.0 + 0.5 * unknown_neighbors as f64
        + 0.1 * structural_score(board, row, col)
        + 0.3 * known_regions.len() as f64
}

/// Heuristic prior on board positions: corners and edges constrain regions
/// more than interior cells, and rows without a queen are where the next
/// decision lands.
fn structural_score(board: &Board, row: usize, col: usize) -> f64 {
    let n = board.size();
    let on_row_edge = row == 0 || row == n - 1;
    let on_col_edge = col == 0 || col == n - 1;
    let mut score = if on_row_edge && on_col_edge {
        1.5
    } else if on_row_edge || on_col_edge {
        1.0
    } else {
        0.0
    };
    if !board.queen_in_row(row) {
        score += 2.0;
    }
    score
}

/// The `k` most informative Unknown cells reachable from the seed cells (the
/// seeds themselves plus their orthogonal neighbors), sorted by gain,
/// descending. Ties break by grid scan order for reproducibility.
pub(crate) fn select_top_k(
    board: &Board,
    k: usize,
    seeds: &[(usize, usize)],
) -> Vec<(usize, usize)> {
    let n = board.size();
    let mut reachable: BTreeSet<(usize, usize)> = BTreeSet::new();
    for &(row, col) in seeds {
        reachable.insert((row, col));
        reachable.extend(orthogonal_neighbors(n, row, col));
    }

    let mut scored: Vec<((usize, usize), f64)> = reachable
        .into_iter()
        .filter(|&(r, c)| board.known(r, c).is_none())
        .map(|cell| (cell, estimate_gain(board, cell.0, cell.1)))
        .collect();
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    scored.into_iter().take(k).map(|(cell, _)| cell).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, RegionId};

    fn masked_4x4() -> Board {
        let regions: Vec<RegionId> = vec![1, 1, 2, 2, 1, 2, 2, 2, 3, 3, 2, 2, 3, 4, 4, 2];
        let mut board = Board::new(4, regions).unwrap();
        board.mask_all();
        board
    }

    #[test]
    fn test_budget_limit_is_floor_of_fraction() {
        assert_eq!(ProbeBudget::new(10, 0.5).limit(), 5);
        assert_eq!(ProbeBudget::new(9, 0.5).limit(), 4);
        assert_eq!(ProbeBudget::new(16, 1.0).limit(), 16);
        assert_eq!(ProbeBudget::new(16, 0.0).limit(), 0);
    }

    #[test]
    fn test_budget_latches_exhausted() {
        let mut budget = ProbeBudget::new(4, 0.5);
        assert_eq!(budget.limit(), 2);
        assert!(!budget.is_exhausted());

        assert!(budget.can_probe());
        budget.record_probe();
        assert!(budget.can_probe());
        budget.record_probe();

        assert!(!budget.is_exhausted(), "exhausted latched before refusal");
        assert!(!budget.can_probe());
        assert!(budget.is_exhausted());
        assert_eq!(budget.used(), 2);
    }

    #[test]
    fn test_zero_budget_starts_exhausted() {
        let mut budget = ProbeBudget::new(16, 0.0);
        assert!(budget.is_exhausted());
        assert!(!budget.can_probe());
    }

    #[test]
    fn test_gain_rewards_unknown_neighbors() {
        let mut board = masked_4x4();
        // Interior cell with all neighbors Unknown, in a queenless row:
        // 1.0 + 0.5*4 + 0.1*2.0 = 3.2
        let all_unknown = estimate_gain(&board, 1, 1);
        assert!((all_unknown - 3.2).abs() < 1e-9);

        // Revealing neighbors lowers the unknown bonus but adds diversity
        board.reveal(0, 1); // region 1
        board.reveal(1, 0); // region 1
        // 1.0 + 0.5*2 + 0.1*2.0 + 0.3*1 = 2.5
        let partly_known = estimate_gain(&board, 1, 1);
        assert!((partly_known - 2.5).abs() < 1e-9);
        assert!(partly_known < all_unknown);
    }

    #[test]
    fn test_gain_structural_priors() {
        let board = masked_4x4();
        // Corner: 1.0 + 0.5*2 + 0.1*(1.5 + 2.0) = 2.35
        assert!((estimate_gain(&board, 0, 0) - 2.35).abs() < 1e-9);
        // Edge: 1.0 + 0.5*3 + 0.1*(1.0 + 2.0) = 2.8
        assert!((estimate_gain(&board, 0, 1) - 2.8).abs() < 1e-9);
    }

    #[test]
    fn test_gain_drops_queen_row_bonus() {
        let mut board = masked_4x4();
        let before = estimate_gain(&board, 1, 1);
        board.place_queen(1, 3);
        let after = estimate_gain(&board, 1, 1);
        assert!((before - after - 0.2).abs() < 1e-9, "queen-row prior is 0.1*2.0");
    }

    #[test]
    fn test_select_top_k_only_unknown_cells() {
        let mut board = masked_4x4();
        board.reveal(0, 0);
        board.reveal(0, 1);
        let picks = select_top_k(&board, 10, &[(0, 0), (0, 1)]);
        assert!(!picks.is_empty());
        for (r, c) in picks {
            assert_eq!(board.known(r, c), None, "picked a Known cell ({r}, {c})");
        }
    }

    #[test]
    fn test_select_top_k_is_deterministic_and_bounded() {
        let board = masked_4x4();
        let seeds = [(0, 0), (0, 1), (0, 2), (0, 3)];
        let a = select_top_k(&board, 2, &seeds);
        let b = select_top_k(&board, 2, &seeds);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_select_top_k_orders_by_gain() {
        let board = masked_4x4();
        let seeds = [(1, 1)];
        let picks = select_top_k(&board, usize::MAX, &seeds);
        let gains: Vec<f64> = picks
            .iter()
            .map(|&(r, c)| estimate_gain(&board, r, c))
            .collect();
        for pair in gains.windows(2) {
            assert!(pair[0] >= pair[1], "gains not sorted: {gains:?}");
        }
    }
}
