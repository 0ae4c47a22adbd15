//! Search callback protocol.

use crate::cuts::LinearCut;
use crate::error::OaResult;

use super::VarId;

/// Why the host invoked the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackReason {
    /// A new integer-feasible candidate was found.
    IntegerSolution,

    /// A relaxation node was evaluated.
    RelaxationNode {
        /// Node index, 0 for the root.
        node_index: u64,
        /// Whether the node relaxation was solved to optimality.
        relaxation_optimal: bool,
    },

    /// Anything else (progress polling, presolve, ...).
    Other,
}

/// View of the host's search state during one callback invocation.
///
/// Integer-solution accessors are only valid at
/// [`CallbackReason::IntegerSolution`] and relaxation-node accessors only at
/// [`CallbackReason::RelaxationNode`]; hosts reject mismatched reads.
pub trait CallbackContext {
    /// Reason for this invocation.
    fn reason(&self) -> CallbackReason;

    /// Number of variables in the model, approximation variables included.
    fn num_vars(&self) -> usize;

    /// Host objective of the integer candidate (stale approximation values included).
    fn solution_objective(&self) -> OaResult<f64>;

    /// Value of `var` in the integer candidate.
    fn solution_value(&self, var: VarId) -> OaResult<f64>;

    /// Values of `vars` in the integer candidate.
    fn solution_values(&self, vars: &[VarId]) -> OaResult<Vec<f64>> {
        vars.iter().map(|&v| self.solution_value(v)).collect()
    }

    /// Best objective the host knows of at this relaxation node.
    fn node_best_objective(&self) -> OaResult<f64>;

    /// Value of `var` in the node relaxation.
    fn node_value(&self, var: VarId) -> OaResult<f64>;

    /// Values of `vars` in the node relaxation.
    fn node_values(&self, vars: &[VarId]) -> OaResult<Vec<f64>> {
        vars.iter().map(|&v| self.node_value(v)).collect()
    }

    /// Add a lazy constraint valid for the rest of the search.
    fn add_lazy(&mut self, cut: &LinearCut) -> OaResult<()>;

    /// Suggest a full assignment as a candidate feasible solution.
    fn suggest_solution(&mut self, values: &[f64]) -> OaResult<()>;
}

/// Callback registered with a host search.
pub trait SearchCallback {
    /// Handle one invocation. Returning an error aborts the search.
    fn invoke(&mut self, ctx: &mut dyn CallbackContext) -> OaResult<()>;
}

impl<F> SearchCallback for F
where
    F: FnMut(&mut dyn CallbackContext) -> OaResult<()>,
{
    fn invoke(&mut self, ctx: &mut dyn CallbackContext) -> OaResult<()> {
        self(ctx)
    }
}
