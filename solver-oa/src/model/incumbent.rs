//! Incumbent tracking.

/// Tracks the best known feasible solution (incumbent).
#[derive(Debug, Clone)]
pub struct IncumbentTracker {
    /// Current best solution over all model variables (if any).
    pub solution: Option<Vec<f64>>,

    /// Objective value of incumbent.
    /// Initialized to +inf for minimization.
    pub obj_val: f64,

    /// Number of times incumbent was updated.
    pub update_count: u64,
}

impl Default for IncumbentTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl IncumbentTracker {
    /// Create a new incumbent tracker.
    pub fn new() -> Self {
        Self {
            solution: None,
            obj_val: f64::INFINITY,
            update_count: 0,
        }
    }

    /// Check if we have an incumbent.
    pub fn has_incumbent(&self) -> bool {
        self.solution.is_some()
    }

    /// Check whether `obj` would replace the incumbent.
    pub fn improves(&self, obj: f64) -> bool {
        // For minimization, accept if strictly better
        obj < self.obj_val - 1e-9
    }

    /// Try to update incumbent with a new solution.
    ///
    /// Returns true if the incumbent was improved.
    pub fn update(&mut self, x: &[f64], obj: f64) -> bool {
        if self.improves(obj) {
            self.solution = Some(x.to_vec());
            self.obj_val = obj;
            self.update_count += 1;
            true
        } else {
            false
        }
    }

    /// Relative gap between the incumbent and a dual bound.
    pub fn gap(&self, dual_bound: f64) -> f64 {
        if self.obj_val.is_infinite() || dual_bound.is_infinite() {
            return f64::INFINITY;
        }
        let denom = self.obj_val.abs().max(1e-10);
        (self.obj_val - dual_bound).abs() / denom
    }
}
