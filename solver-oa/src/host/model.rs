//! Model-level host operations.

use std::fmt;

use crate::cuts::LinearCut;
use crate::error::OaResult;

use super::SearchCallback;

/// Column index of a variable in the host model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub usize);

impl VarId {
    /// Position of the variable in a full assignment vector.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Final status of a host search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// Search tree exhausted with an incumbent.
    Optimal,

    /// Search tree exhausted without a feasible solution.
    Infeasible,

    /// A relaxation was unbounded and no bound could be proven.
    Unbounded,

    /// Node limit reached.
    NodeLimit,

    /// Time limit reached.
    TimeLimit,
}

impl SearchStatus {
    /// Returns true if the search proved optimality.
    pub fn is_optimal(&self) -> bool {
        matches!(self, SearchStatus::Optimal)
    }
}

/// A mixed-integer model that can run a branch-and-cut search with a callback.
///
/// Every mutating operation may fail, e.g. when the model is already in
/// search; callers propagate those failures without retrying.
pub trait HostModel {
    /// Allow lazy constraints to be added from inside the search callback.
    fn enable_lazy_constraints(&mut self) -> OaResult<()>;

    /// Add a continuous variable with the given objective coefficient and
    /// lower bound (upper bound is +inf). The coefficient is added on top of
    /// the existing objective.
    fn add_continuous_var(&mut self, name: &str, obj: f64, lower: f64) -> OaResult<VarId>;

    /// Synchronize pending variable additions so constraints may reference them.
    fn update(&mut self) -> OaResult<()>;

    /// Add a permanent constraint `cut.coefs · x <= cut.rhs`.
    fn add_constraint(&mut self, cut: &LinearCut) -> OaResult<()>;

    /// Number of synchronized variables.
    fn num_vars(&self) -> usize;

    /// Run the search, invoking `callback` at integer solutions and
    /// relaxation nodes. A callback error aborts the search.
    fn optimize(&mut self, callback: &mut dyn SearchCallback) -> OaResult<SearchStatus>;

    /// Best objective value the host found, as the host computes it.
    fn objective_value(&self) -> OaResult<f64>;
}
