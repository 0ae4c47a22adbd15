//! Callback context handed out by the reference host.

use crate::cuts::LinearCut;
use crate::error::{OaError, OaResult};
use crate::host::{CallbackContext, CallbackReason, VarId};

use super::{Row, Sense, Variable};

/// One callback invocation's view of the search.
///
/// Borrows the model's columns for validation and its row list for lazy
/// constraints; a suggested solution is held until the host picks it up.
pub(crate) struct ReferenceContext<'a> {
    reason: CallbackReason,
    values: &'a [f64],
    objective: f64,
    host_best: f64,
    vars: &'a [Variable],
    rows: &'a mut Vec<Row>,
    lazy_enabled: bool,
    suggestion: Option<Vec<f64>>,
}

impl<'a> ReferenceContext<'a> {
    pub(crate) fn new(
        reason: CallbackReason,
        values: &'a [f64],
        objective: f64,
        host_best: f64,
        vars: &'a [Variable],
        rows: &'a mut Vec<Row>,
        lazy_enabled: bool,
    ) -> Self {
        Self {
            reason,
            values,
            objective,
            host_best,
            vars,
            rows,
            lazy_enabled,
            suggestion: None,
        }
    }

    /// Last suggestion made during the invocation.
    pub(crate) fn into_suggestion(self) -> Option<Vec<f64>> {
        self.suggestion
    }

    fn at_solution(&self) -> bool {
        self.reason == CallbackReason::IntegerSolution
    }

    fn at_node(&self) -> bool {
        matches!(self.reason, CallbackReason::RelaxationNode { .. })
    }

    fn value(&self, var: VarId) -> OaResult<f64> {
        self.values.get(var.index()).copied().ok_or_else(|| {
            OaError::Host(format!(
                "unknown variable {} ({} variables)",
                var,
                self.values.len()
            ))
        })
    }

    fn wrong_reason(&self, what: &str) -> OaError {
        OaError::Host(format!("{} not available at {:?}", what, self.reason))
    }
}

impl CallbackContext for ReferenceContext<'_> {
    fn reason(&self) -> CallbackReason {
        self.reason
    }

    fn num_vars(&self) -> usize {
        self.vars.len()
    }

    fn solution_objective(&self) -> OaResult<f64> {
        if !self.at_solution() {
            return Err(self.wrong_reason("solution objective"));
        }
        Ok(self.objective)
    }

    fn solution_value(&self, var: VarId) -> OaResult<f64> {
        if !self.at_solution() {
            return Err(self.wrong_reason("solution values"));
        }
        self.value(var)
    }

    fn node_best_objective(&self) -> OaResult<f64> {
        if !self.at_node() {
            return Err(self.wrong_reason("node best objective"));
        }
        Ok(self.host_best)
    }

    fn node_value(&self, var: VarId) -> OaResult<f64> {
        if !self.at_node() {
            return Err(self.wrong_reason("node relaxation values"));
        }
        self.value(var)
    }

    fn add_lazy(&mut self, cut: &LinearCut) -> OaResult<()> {
        if !self.lazy_enabled {
            return Err(OaError::Host(
                "lazy constraints are not enabled".to_string(),
            ));
        }
        let row = Row::from_cut(cut, Sense::Le, self.vars)?;
        self.rows.push(row);
        Ok(())
    }

    fn suggest_solution(&mut self, values: &[f64]) -> OaResult<()> {
        if !self.at_node() {
            return Err(self.wrong_reason("solution suggestions"));
        }
        if values.len() != self.vars.len() {
            return Err(OaError::Host(format!(
                "suggested solution has {} values, model has {} variables",
                values.len(),
                self.vars.len()
            )));
        }
        self.suggestion = Some(values.to_vec());
        Ok(())
    }
}
