//! Branching variable selection.

use super::{BoundChange, Variable};

/// A branching decision.
#[derive(Debug, Clone)]
pub struct BranchDecision {
    /// Variable to branch on.
    pub var: usize,

    /// Bound change for the "down" branch (lower half of the domain).
    pub down_branch: BoundChange,

    /// Bound change for the "up" branch (upper half of the domain).
    pub up_branch: BoundChange,

    /// Score of this decision (for logging/debugging).
    pub score: f64,
}

/// Pick the unfixed integer variable whose objective term varies most over
/// its current domain, breaking ties by domain width and then index.
///
/// Returns None when every integer variable is fixed.
pub fn select_branching(vars: &[Variable], lb: &[f64], ub: &[f64]) -> Option<BranchDecision> {
    let mut best: Option<(f64, f64, usize)> = None;

    for (i, var) in vars.iter().enumerate() {
        if !var.var_type.is_integral() || ub[i] - lb[i] < 0.5 {
            continue;
        }
        let score = var.objective_range(lb[i], ub[i]);
        let width = ub[i] - lb[i];
        let better = match best {
            None => true,
            Some((s, w, _)) => score > s || (score == s && width > w),
        };
        if better {
            best = Some((score, width, i));
        }
    }

    best.map(|(score, _, var)| {
        // Split between floor(mid) and floor(mid) + 1
        let mid = ((lb[var] + ub[var]) / 2.0).floor() + 0.5;
        BranchDecision {
            var,
            down_branch: BoundChange::down_branch(var, lb[var], mid),
            up_branch: BoundChange::up_branch(var, ub[var], mid),
            score,
        }
    })
}
