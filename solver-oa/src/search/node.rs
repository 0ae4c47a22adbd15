//! Open subproblems of the reference search.

/// Domain restriction of one integer variable.
#[derive(Debug, Clone, Copy)]
pub struct BoundChange {
    /// Column index.
    pub var: usize,

    /// Lower end of the restricted domain.
    pub new_lb: f64,

    /// Upper end of the restricted domain.
    pub new_ub: f64,
}

impl BoundChange {
    /// Keep `lb..=floor(split)`.
    pub fn down_branch(var: usize, lb: f64, split: f64) -> Self {
        Self {
            var,
            new_lb: lb,
            new_ub: split.floor(),
        }
    }

    /// Keep `ceil(split)..=ub`.
    pub fn up_branch(var: usize, ub: f64, split: f64) -> Self {
        Self {
            var,
            new_lb: split.ceil(),
            new_ub: ub,
        }
    }
}

/// A box of integer domains still to be searched.
///
/// Domains are stored as the restrictions made on the way down from the
/// root; later entries for the same column override earlier ones.
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// Node id, 0 at the root. Reported to the callback.
    pub id: u64,

    /// Number of splits since the root.
    pub depth: usize,

    /// Restrictions in the order they were made.
    pub bound_changes: Vec<BoundChange>,

    /// Relaxation bound of the parent; -inf at the root.
    pub dual_bound: f64,
}

impl SearchNode {
    /// Unrestricted box.
    pub fn root() -> Self {
        Self {
            id: 0,
            depth: 0,
            bound_changes: Vec::new(),
            dual_bound: f64::NEG_INFINITY,
        }
    }

    /// Subbox with one more restriction, inheriting this node's bound.
    pub fn child(&self, id: u64, bound_change: BoundChange) -> Self {
        let mut bound_changes = Vec::with_capacity(self.bound_changes.len() + 1);
        bound_changes.extend_from_slice(&self.bound_changes);
        bound_changes.push(bound_change);
        Self {
            id,
            depth: self.depth + 1,
            bound_changes,
            dual_bound: self.dual_bound,
        }
    }

    /// Narrow the model domains `lb`/`ub` to this box.
    pub fn apply_bounds(&self, lb: &mut [f64], ub: &mut [f64]) {
        for bc in &self.bound_changes {
            lb[bc.var] = bc.new_lb;
            ub[bc.var] = bc.new_ub;
        }
    }

    /// Whether nothing in this box can beat `incumbent_obj`.
    pub fn can_prune(&self, incumbent_obj: f64) -> bool {
        self.dual_bound >= incumbent_obj - 1e-9
    }
}
