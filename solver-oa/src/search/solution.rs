//! Reference host search results.

use crate::host::SearchStatus;

/// Result of a reference host search with diagnostics.
#[derive(Debug, Clone)]
pub struct SearchSolution {
    /// Search status.
    pub status: SearchStatus,

    /// Best solution found over all variables (empty if none).
    pub x: Vec<f64>,

    /// Host objective of the best solution (primal bound).
    pub obj_val: f64,

    /// Best dual bound still open when the search stopped.
    pub bound: f64,

    /// Number of nodes explored.
    pub nodes_explored: u64,

    /// Number of nodes pruned by bound or infeasibility.
    pub nodes_pruned: u64,

    /// Lazy constraints added from the callback.
    pub lazy_constraints: u64,

    /// Suggested solutions accepted as incumbents.
    pub heuristic_accepted: u64,

    /// Suggested solutions rejected (infeasible or not improving).
    pub heuristic_rejected: u64,

    /// Total search time in milliseconds.
    pub solve_time_ms: u64,
}

impl Default for SearchSolution {
    fn default() -> Self {
        Self {
            status: SearchStatus::Infeasible,
            x: Vec::new(),
            obj_val: f64::INFINITY,
            bound: f64::NEG_INFINITY,
            nodes_explored: 0,
            nodes_pruned: 0,
            lazy_constraints: 0,
            heuristic_accepted: 0,
            heuristic_rejected: 0,
            solve_time_ms: 0,
        }
    }
}

impl SearchSolution {
    /// Returns true if a feasible solution is available.
    pub fn has_solution(&self) -> bool {
        !self.x.is_empty() && self.obj_val.is_finite()
    }
}
