//! Row-by-row backtracking search driver with active sensing.
//!
//! The driver owns the board exclusively for the duration of a solve. Undo on
//! backtrack restores queen placements only; knowledge acquired by probing or
//! inference is permanent, and a spent probe is never refunded.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use tracing::{debug, trace};

use super::probe::ProbeBudget;
use super::{infer, probe, validate, SolverConfig, SolverStats};
use crate::board::{Board, Position, RegionId};

/// One queen on the current search path.
#[derive(Debug, Clone, Copy)]
struct Placement {
    row: usize,
    col: usize,
    region: RegionId,
    /// Region came from a confidence-weighted guess; the knowledge grid does
    /// not vouch for it.
    speculative: bool,
}

/// Active-sensing backtracking solver.
///
/// Holds an exclusive mutable borrow of the board for the duration of the
/// solve; the caller gets the board back (with the final assignment, or
/// cleared on failure) when the solver is dropped.
pub struct ActiveSolver<'a> {
    board: &'a mut Board,
    config: SolverConfig,
    budget: ProbeBudget,
    stats: SolverStats,
    placements: Vec<Placement>,
    best_partial: Vec<Position>,
}

impl<'a> ActiveSolver<'a> {
    pub fn new(board: &'a mut Board) -> Self {
        Self::with_config(board, SolverConfig::default())
    }

    pub fn with_config(board: &'a mut Board, config: SolverConfig) -> Self {
        Self {
            board,
            config,
            budget: ProbeBudget::default(),
            stats: SolverStats::default(),
            placements: Vec::new(),
            best_partial: Vec::new(),
        }
    }

    /// Solve using the configured probe-budget fraction.
    pub fn solve(&mut self) -> bool {
        self.solve_with_budget(self.config.probe_budget_fraction)
    }

    /// Solve with an explicit probe-budget fraction, overriding the config.
    ///
    /// On success the board holds a complete valid assignment; on failure the
    /// board is left without queens and the deepest partial solution reached
    /// is available via [`ActiveSolver::best_partial`].
    pub fn solve_with_budget(&mut self, fraction: f64) -> bool {
        let unknown = self.board.unknown_count();
        self.budget = ProbeBudget::new(unknown, fraction);
        self.stats = SolverStats {
            probe_limit: self.budget.limit(),
            initial_unknown: unknown,
            ..SolverStats::default()
        };
        self.placements.clear();
        self.best_partial.clear();
        self.board.clear_queens();

        // Free deductions available before any decision is made
        self.stats.inferred_count += self.run_cascade();

        let solved = self.search(0);
        debug!(
            solved,
            probes = self.stats.probe_count,
            probe_limit = self.stats.probe_limit,
            inferred = self.stats.inferred_count,
            backtracks = self.stats.backtrack_count,
            "solve finished"
        );
        solved
    }

    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    pub fn budget(&self) -> &ProbeBudget {
        &self.budget
    }

    /// The longest prefix of placements any branch reached.
    pub fn best_partial(&self) -> &[Position] {
        &self.best_partial
    }

    /// Re-apply the deepest partial solution to the board, for inspection or
    /// reporting after a failed solve.
    pub fn restore_best_partial(&mut self) {
        self.board.clear_queens();
        for p in &self.best_partial {
            self.board.place_queen(p.row, p.col);
        }
    }

    /// Fraction of ground-truth queen positions matched by the queens
    /// currently on the board.
    pub fn compare_with_ground_truth(&self, truth: &[Position]) -> f64 {
        if truth.is_empty() {
            return 0.0;
        }
        let matched = truth
            .iter()
            .filter(|p| self.board.has_queen(p.row, p.col))
            .count();
        matched as f64 / truth.len() as f64
    }

    // ==================== Search ====================

    fn search(&mut self, row: usize) -> bool {
        let n = self.board.size();

        if self.placements.len() > self.best_partial.len() {
            self.best_partial = self
                .placements
                .iter()
                .map(|p| Position::new(p.row, p.col))
                .collect();
        }

        if row == n {
            return self.finalize();
        }

        let mut candidates = self.viable_columns(row);
        if candidates.is_empty() {
            trace!(row, "no structurally viable columns");
            return false;
        }

        // Active sensing: resolve the most informative Unknown cells around
        // this row's decision, preferring free inference over spending budget,
        // then let the cascade pick up whatever became deducible.
        if self.budget.can_probe() {
            let seeds: Vec<(usize, usize)> = candidates.iter().map(|&c| (row, c)).collect();
            let targets = probe::select_top_k(self.board, self.config.probes_per_row, &seeds);
            for (r, c) in targets {
                if self.board.known(r, c).is_some() {
                    continue;
                }
                if let Some(id) = self.infer_cell(r, c) {
                    self.board.set_inferred(r, c, id);
                    self.stats.inferred_count += 1;
                } else if self.budget.can_probe() {
                    self.probe_cell(r, c);
                }
            }
            self.stats.inferred_count += self.run_cascade();

            candidates = self.viable_columns(row);
            if candidates.is_empty() {
                return false;
            }
        }

        // Order candidates by knowledge level: certain first, then those a
        // deduction could settle right now, then by expected probe value.
        let mut ordered: Vec<(usize, f64)> = candidates
            .iter()
            .map(|&col| {
                let score = if self.board.known(row, col).is_some() {
                    1000.0
                } else if self.infer_cell(row, col).is_some() {
                    500.0
                } else {
                    probe::estimate_gain(self.board, row, col)
                };
                (col, score)
            })
            .collect();
        ordered.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        for (col, _) in ordered {
            let Some((region, speculative)) = self.resolve_region(row, col) else {
                // Unknown at decision time and unresolvable: skip, not an error
                continue;
            };
            if self.region_has_queen(region) {
                continue;
            }
            let valid = if speculative {
                validate::structurally_valid(self.board, row, col, self.config.adjacency)
            } else {
                validate::is_valid(self.board, row, col, self.config.adjacency)
            };
            if !valid {
                continue;
            }

            self.board.place_queen(row, col);
            self.placements.push(Placement {
                row,
                col,
                region,
                speculative,
            });
            self.stats.queens_placed += 1;

            if self.search(row + 1) {
                return true;
            }

            // Undo the placement only; knowledge writes stay
            self.board.remove_queen(row, col);
            self.placements.pop();
            self.stats.queens_placed -= 1;
            self.stats.backtrack_count += 1;
        }

        false
    }

    /// Columns of `row` passing structural constraints under the current
    /// assignment. Region knowledge plays no part here.
    fn viable_columns(&self, row: usize) -> Vec<usize> {
        (0..self.board.size())
            .filter(|&col| validate::structurally_valid(self.board, row, col, self.config.adjacency))
            .collect()
    }

    /// Resolve a candidate cell's region id: Known, else inferred (recorded),
    /// else probed, else — only once the budget is exhausted — a tentative
    /// confidence-weighted guess that is never written into the knowledge
    /// grid. `None` means the candidate must be skipped.
    fn resolve_region(&mut self, row: usize, col: usize) -> Option<(RegionId, bool)> {
        if let Some(id) = self.board.known(row, col) {
            return Some((id, false));
        }
        if let Some(id) = self.infer_cell(row, col) {
            self.board.set_inferred(row, col, id);
            self.stats.inferred_count += 1;
            return Some((id, false));
        }
        if self.budget.can_probe() {
            return Some((self.probe_cell(row, col), false));
        }
        if self.budget.is_exhausted() {
            if let Some((id, confidence)) =
                infer::most_likely(self.board, &self.config.weights, row, col)
            {
                if confidence >= self.config.guess_threshold {
                    trace!(row, col, region = id, confidence, "speculative color guess");
                    return Some((id, true));
                }
            }
        }
        None
    }

    /// Whether any queen on the current path already claims the region,
    /// including speculatively-colored queens the validator cannot see.
    fn region_has_queen(&self, region: RegionId) -> bool {
        self.placements.iter().any(|p| p.region == region)
    }

    /// Full-board validation at `row == n`: resolve speculative queens,
    /// probing still-Unknown cells as a last resort, then check region
    /// uniqueness over the resolved colors.
    fn finalize(&mut self) -> bool {
        for i in 0..self.placements.len() {
            if !self.placements[i].speculative {
                continue;
            }
            let (row, col) = (self.placements[i].row, self.placements[i].col);
            if let Some(id) = self.board.known(row, col) {
                self.placements[i].region = id;
                self.placements[i].speculative = false;
            } else if self.budget.can_probe() {
                let id = self.probe_cell(row, col);
                self.placements[i].region = id;
                self.placements[i].speculative = false;
            }
            // Budget exhausted and still Unknown: the guess stands
        }

        let mut seen = BTreeSet::new();
        for p in &self.placements {
            if !seen.insert(p.region) {
                trace!(
                    row = p.row,
                    col = p.col,
                    region = p.region,
                    "final validation: duplicate region"
                );
                return false;
            }
        }
        true
    }

    // ==================== Sensing primitives ====================

    /// Threshold-gated pure deduction; no state is touched.
    fn infer_cell(&self, row: usize, col: usize) -> Option<RegionId> {
        infer::infer(
            self.board,
            &self.config.weights,
            self.config.confidence_threshold,
            row,
            col,
        )
    }

    /// Reveal ground truth, paying one unit of budget.
    fn probe_cell(&mut self, row: usize, col: usize) -> RegionId {
        let id = self.board.reveal(row, col);
        self.budget.record_probe();
        self.stats.probe_count += 1;
        debug!(row, col, region = id, "probe");
        id
    }

    /// Inference cascade over the whole knowledge grid.
    fn run_cascade(&mut self) -> usize {
        infer::run_cascade(
            self.board,
            &self.config.weights,
            self.config.confidence_threshold,
            self.config.cascade_pass_cap,
        )
    }
}

// ==================== Tests ====================
