//! Inference engine: five independent deduction rules over the knowledge
//! grid, combined by weighted voting.
//!
//! Every function here is a pure read of the board's knowledge grid except
//! [`run_cascade`], which is the single place deductions get written back.
//! A deduction is accepted as certain only when its accumulated vote exceeds
//! the confidence threshold, which sits above the largest single rule weight;
//! one rule alone never decides a cell.

use std::collections::BTreeMap;

use tracing::trace;

use super::RuleWeights;
use crate::board::{orthogonal_neighbors, Board, RegionId};

/// Deduce the region of an Unknown cell, or `None` if no deduction clears the
/// confidence threshold. Known cells always yield `None`; inference never
/// revisits acquired knowledge.
pub(crate) fn infer(
    board: &Board,
    weights: &RuleWeights,
    threshold: f64,
    row: usize,
    col: usize,
) -> Option<RegionId> {
    if board.known(row, col).is_some() {
        return None;
    }
    let (id, vote) = best_vote(board, weights, row, col)?;
    (vote > threshold).then_some(id)
}

/// Best confidence-weighted guess for an Unknown cell, with its vote.
///
/// Unlike [`infer`] this applies no threshold; the caller decides whether the
/// vote is strong enough to act on speculatively.
pub(crate) fn most_likely(
    board: &Board,
    weights: &RuleWeights,
    row: usize,
    col: usize,
) -> Option<(RegionId, f64)> {
    if board.known(row, col).is_some() {
        return None;
    }
    best_vote(board, weights, row, col)
}

/// Apply [`infer`] to every Unknown cell repeatedly until a pass makes no
/// progress or the pass cap is reached. The cap is a termination guard, not a
/// performance knob. Returns the number of cells deduced.
pub(crate) fn run_cascade(
    board: &mut Board,
    weights: &RuleWeights,
    threshold: f64,
    pass_cap: usize,
) -> usize {
    let n = board.size();
    let mut deduced = 0;
    for pass in 0..pass_cap {
        let mut progressed = false;
        for row in 0..n {
            for col in 0..n {
                if board.known(row, col).is_some() {
                    continue;
                }
                if let Some(id) = infer(board, weights, threshold, row, col) {
                    board.set_inferred(row, col, id);
                    trace!(pass, row, col, region = id, "cascade deduced cell");
                    deduced += 1;
                    progressed = true;
                }
            }
        }
        if !progressed {
            break;
        }
    }
    deduced
}

/// Accumulate the weighted votes of all five rules and return the strongest
/// proposal. Ties break toward the smaller region id for determinism.
fn best_vote(
    board: &Board,
    weights: &RuleWeights,
    row: usize,
    col: usize,
) -> Option<(RegionId, f64)> {
    let mut votes: BTreeMap<RegionId, f64> = BTreeMap::new();
    let mut add = |proposal: Option<RegionId>, weight: f64| {
        if let Some(id) = proposal {
            *votes.entry(id).or_insert(0.0) += weight;
        }
    };

    add(neighbor_agreement(board, row, col), weights.neighbor_agreement);
    add(line_uniformity(board, row, col), weights.line_uniformity);
    add(bounding_box(board, row, col), weights.bounding_box);
    add(contiguity_bridge(board, row, col), weights.contiguity_bridge);
    add(pattern_completion(board, row, col), weights.pattern_completion);

    let mut best: Option<(RegionId, f64)> = None;
    for (&id, &vote) in &votes {
        match best {
            Some((_, b)) if vote <= b => {}
            _ => best = Some((id, vote)),
        }
    }
    best
}

/// Rule 1: all in-bounds orthogonal neighbors are Known and agree.
fn neighbor_agreement(board: &Board, row: usize, col: usize) -> Option<RegionId> {
    let mut agreed: Option<RegionId> = None;
    for (r, c) in orthogonal_neighbors(board.size(), row, col) {
        let id = board.known(r, c)?;
        match agreed {
            None => agreed = Some(id),
            Some(prev) if prev != id => return None,
            Some(_) => {}
        }
    }
    agreed
}

/// Rule 2: at least half of the row's Known cells share one region id; the
/// column is consulted only when the row proposes nothing. One rule, one vote.
fn line_uniformity(board: &Board, row: usize, col: usize) -> Option<RegionId> {
    let n = board.size();
    line_majority((0..n).map(|c| board.known(row, c)))
        .or_else(|| line_majority((0..n).map(|r| board.known(r, col))))
}

/// Majority id among the Known cells of one line, if it covers at least half
/// of them. Ties break toward the smaller id.
fn line_majority(cells: impl Iterator<Item = Option<RegionId>>) -> Option<RegionId> {
    let mut counts: BTreeMap<RegionId, usize> = BTreeMap::new();
    let mut known = 0usize;
    for id in cells.flatten() {
        known += 1;
        *counts.entry(id).or_insert(0) += 1;
    }
    let mut best: Option<(RegionId, usize)> = None;
    for (&id, &count) in &counts {
        match best {
            Some((_, b)) if count <= b => {}
            _ => best = Some((id, count)),
        }
    }
    let (id, count) = best?;
    (2 * count >= known).then_some(id)
}

/// Rule 3: exactly one region's Known-cell bounding rectangle contains the
/// cell.
fn bounding_box(board: &Board, row: usize, col: usize) -> Option<RegionId> {
    struct Bounds {
        min_row: usize,
        max_row: usize,
        min_col: usize,
        max_col: usize,
    }

    let n = board.size();
    let mut boxes: BTreeMap<RegionId, Bounds> = BTreeMap::new();
    for r in 0..n {
        for c in 0..n {
            if let Some(id) = board.known(r, c) {
                let b = boxes.entry(id).or_insert(Bounds {
                    min_row: r,
                    max_row: r,
                    min_col: c,
                    max_col: c,
                });
                b.min_row = b.min_row.min(r);
                b.max_row = b.max_row.max(r);
                b.min_col = b.min_col.min(c);
                b.max_col = b.max_col.max(c);
            }
        }
    }

    let mut containing = boxes.iter().filter(|(_, b)| {
        row >= b.min_row && row <= b.max_row && col >= b.min_col && col <= b.max_col
    });
    let (&id, _) = containing.next()?;
    containing.next().is_none().then_some(id)
}

/// Rule 4: two Known neighbors on opposite sides share an id; the cell would
/// bridge two disconnected patches of that region.
fn contiguity_bridge(board: &Board, row: usize, col: usize) -> Option<RegionId> {
    let at = |dr: isize, dc: isize| -> Option<RegionId> {
        let r = row.checked_add_signed(dr)?;
        let c = col.checked_add_signed(dc)?;
        if r < board.size() && c < board.size() {
            board.known(r, c)
        } else {
            None
        }
    };

    let vertical = at(-1, 0).zip(at(1, 0)).and_then(|(a, b)| (a == b).then_some(a));
    let horizontal = at(0, -1).zip(at(0, 1)).and_then(|(a, b)| (a == b).then_some(a));
    vertical.or(horizontal)
}

/// Rule 5: the cells directly above and directly left share one Known id.
fn pattern_completion(board: &Board, row: usize, col: usize) -> Option<RegionId> {
    if row == 0 || col == 0 {
        return None;
    }
    let above = board.known(row - 1, col)?;
    let left = board.known(row, col - 1)?;
    (above == left).then_some(above)
}
