//! Active-sensing solver: inference, budgeted probing, validation, and the
//! row-by-row backtracking driver.
//!
//! One canonical driver, parameterized by [`SolverConfig`]: the historical
//! solver variants differed only in rule weights, confidence thresholds, and
//! the adjacency ruleset, so those all live in configuration rather than in
//! parallel solver copies.

mod infer;
mod probe;
mod search;
mod validate;

use serde::{Deserialize, Serialize};

pub use probe::ProbeBudget;
pub use search::ActiveSolver;

/// Weights for the five inference rules.
///
/// Empirically chosen constants; tunable, with no stated derivation. The
/// defaults are the canonical values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleWeights {
    /// All in-bounds orthogonal neighbors are Known and agree.
    pub neighbor_agreement: f64,
    /// At least half of a row's (or column's) Known cells share one id.
    pub line_uniformity: f64,
    /// Exactly one region's Known-cell bounding box contains the cell.
    pub bounding_box: f64,
    /// Two Known neighbors on opposite sides share an id the cell would bridge.
    pub contiguity_bridge: f64,
    /// The cells above and to the left share one Known id.
    pub pattern_completion: f64,
}

impl Default for RuleWeights {
    fn default() -> Self {
        Self {
            neighbor_agreement: 3.0,
            line_uniformity: 2.5,
            bounding_box: 2.0,
            contiguity_bridge: 2.0,
            pattern_completion: 1.5,
        }
    }
}

/// Which queen-adjacency constraints apply.
///
/// The canonical ruleset forbids only diagonal adjacency between queens;
/// orthogonal adjacency is permitted. Some rule variants forbid both, so the
/// stricter check is configurable rather than hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AdjacencyRules {
    /// Also forbid horizontally/vertically adjacent queens.
    pub forbid_orthogonal: bool,
}

/// Solver configuration: probe budget, thresholds, rule weights, ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Fraction of initially-Unknown cells the solver may probe.
    pub probe_budget_fraction: f64,
    /// Informative cells resolved (inferred or probed) per row before the
    /// placement decision.
    pub probes_per_row: usize,
    /// Accumulated vote a deduction must exceed to be accepted as certain.
    /// Sits above the largest single rule weight so that acceptance needs
    /// agreement across rules.
    pub confidence_threshold: f64,
    /// Minimum vote for a speculative guess once the budget is exhausted.
    pub guess_threshold: f64,
    /// Hard cap on inference cascade passes; termination guard.
    pub cascade_pass_cap: usize,
    pub weights: RuleWeights,
    pub adjacency: AdjacencyRules,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            probe_budget_fraction: 0.5,
            probes_per_row: 2,
            confidence_threshold: 4.5,
            guess_threshold: 2.0,
            cascade_pass_cap: 10,
            weights: RuleWeights::default(),
            adjacency: AdjacencyRules::default(),
        }
    }
}

impl SolverConfig {
    /// Tight probe budget (15% of unknown cells), everything else canonical.
    pub fn frugal() -> Self {
        Self {
            probe_budget_fraction: 0.15,
            ..Self::default()
        }
    }

    /// Override the probe budget fraction.
    pub fn with_budget_fraction(mut self, fraction: f64) -> Self {
        self.probe_budget_fraction = fraction;
        self
    }
}

/// Read-only solve counters for external reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverStats {
    /// Queens currently on the board (equals `n` after a successful solve).
    pub queens_placed: usize,
    /// Ground-truth reveals consumed.
    pub probe_count: usize,
    /// Cells resolved by zero-cost inference.
    pub inferred_count: usize,
    /// Placements undone during search.
    pub backtrack_count: usize,
    /// Probe limit computed at solve start.
    pub probe_limit: usize,
    /// Unknown cells at solve start.
    pub initial_unknown: usize,
}
