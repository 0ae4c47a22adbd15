//! Reference host model and its search loop.

use crate::cuts::{CutSource, LinearCut};
use crate::error::{OaError, OaResult};
use crate::host::{CallbackReason, HostModel, SearchCallback, SearchStatus, VarId};
use crate::settings::SearchSettings;

use super::branching::select_branching;
use super::context::ReferenceContext;
use super::relaxation::solve_relaxation;
use super::{BranchAndBound, RelaxationStatus, SearchNode, SearchSolution};

/// Variable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    /// Continuous variable.
    Continuous,

    /// General integer variable.
    Integer,

    /// Binary variable (0 or 1).
    Binary,
}

impl VarType {
    /// Returns true for integer and binary variables.
    pub fn is_integral(&self) -> bool {
        matches!(self, VarType::Integer | VarType::Binary)
    }
}

/// A model column with a separable objective `obj * x + quad * x^2`.
#[derive(Debug, Clone)]
pub struct Variable {
    /// Name for logging.
    pub name: String,

    /// Lower bound.
    pub lb: f64,

    /// Upper bound.
    pub ub: f64,

    /// Linear objective coefficient.
    pub obj: f64,

    /// Quadratic objective coefficient (non-negative).
    pub quad: f64,

    /// Variable type.
    pub var_type: VarType,
}

impl Variable {
    /// Objective contribution at `x`.
    pub fn objective_at(&self, x: f64) -> f64 {
        let mut value = 0.0;
        if self.obj != 0.0 {
            value += self.obj * x;
        }
        if self.quad != 0.0 {
            value += self.quad * x * x;
        }
        value
    }

    /// Minimize the objective contribution over `[l, u]`.
    ///
    /// Returns the minimizer and its value, or None if unbounded below.
    pub fn minimize(&self, l: f64, u: f64) -> Option<(f64, f64)> {
        let x = if self.quad > 0.0 {
            -self.obj / (2.0 * self.quad)
        } else if self.obj > 0.0 {
            f64::NEG_INFINITY
        } else if self.obj < 0.0 {
            f64::INFINITY
        } else {
            0.0
        };
        let x = x.max(l).min(u);
        if x.is_finite() {
            Some((x, self.objective_at(x)))
        } else {
            None
        }
    }

    /// Spread of the objective contribution over `[l, u]`.
    pub fn objective_range(&self, l: f64, u: f64) -> f64 {
        let high = self.objective_at(l).max(self.objective_at(u));
        match self.minimize(l, u) {
            Some((_, low)) => high - low,
            None => f64::INFINITY,
        }
    }
}

/// Row sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    /// `a^T x <= rhs`
    Le,

    /// `a^T x >= rhs`
    Ge,

    /// `a^T x == rhs`
    Eq,
}

/// A linear row of the reference model.
#[derive(Debug, Clone)]
pub struct Row {
    /// Coefficients indexed by variable column.
    pub coefs: sprs::CsVec<f64>,

    /// Row sense.
    pub sense: Sense,

    /// Right-hand side.
    pub rhs: f64,
}

impl Row {
    /// Build a row from a cut, checking it against the model columns.
    ///
    /// Rows may hold at most one continuous variable.
    pub(crate) fn from_cut(cut: &LinearCut, sense: Sense, vars: &[Variable]) -> OaResult<Self> {
        if !cut.is_valid() {
            return Err(OaError::InvalidProblem(
                "row is empty or has non-finite coefficients".to_string(),
            ));
        }

        let mut continuous: Option<usize> = None;
        for &i in cut.coefs.indices() {
            let Some(var) = vars.get(i) else {
                return Err(OaError::Host(format!(
                    "row references unknown variable x{} ({} variables)",
                    i,
                    vars.len()
                )));
            };
            if !var.var_type.is_integral() {
                if let Some(other) = continuous {
                    return Err(OaError::InvalidProblem(format!(
                        "row couples continuous variables {} and {}",
                        vars[other].name, var.name
                    )));
                }
                continuous = Some(i);
            }
        }

        Ok(Self {
            coefs: cut.coefs.clone(),
            sense,
            rhs: cut.rhs,
        })
    }

    /// Left-hand side at `x`.
    pub fn activity(&self, x: &[f64]) -> f64 {
        self.coefs.iter().map(|(i, &a)| a * x[i]).sum()
    }

    /// Check the row at `x` with tolerance `tol`.
    pub fn is_satisfied(&self, x: &[f64], tol: f64) -> bool {
        let lhs = self.activity(x);
        match self.sense {
            Sense::Le => lhs <= self.rhs + tol,
            Sense::Ge => lhs >= self.rhs - tol,
            Sense::Eq => (lhs - self.rhs).abs() <= tol,
        }
    }
}

/// What processing a node led to.
enum NodeOutcome {
    Done,
    Unbounded,
}

/// In-memory branch-and-cut host.
///
/// Variables added since the last [`update`](HostModel::update) are pending
/// and cannot be referenced by rows yet.
#[derive(Debug, Clone, Default)]
pub struct ReferenceModel {
    vars: Vec<Variable>,
    synced: usize,
    rows: Vec<Row>,
    lazy_enabled: bool,
    settings: SearchSettings,
    result: Option<SearchSolution>,
}

impl ReferenceModel {
    /// Create an empty model.
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Add a variable. It becomes usable in rows after the next update.
    pub fn add_var(&mut self, name: &str, lb: f64, ub: f64, obj: f64, var_type: VarType) -> VarId {
        self.vars.push(Variable {
            name: name.to_string(),
            lb,
            ub,
            obj,
            quad: 0.0,
            var_type,
        });
        VarId(self.vars.len() - 1)
    }

    /// Add a binary variable.
    pub fn add_binary(&mut self, name: &str, obj: f64) -> VarId {
        self.add_var(name, 0.0, 1.0, obj, VarType::Binary)
    }

    /// Add a bounded integer variable.
    pub fn add_integer(&mut self, name: &str, lb: f64, ub: f64, obj: f64) -> VarId {
        self.add_var(name, lb, ub, obj, VarType::Integer)
    }

    /// Add a continuous variable.
    pub fn add_continuous(&mut self, name: &str, lb: f64, ub: f64, obj: f64) -> VarId {
        self.add_var(name, lb, ub, obj, VarType::Continuous)
    }

    /// Set the quadratic objective coefficient of `var`.
    pub fn set_quadratic(&mut self, var: VarId, quad: f64) -> OaResult<()> {
        if !(quad >= 0.0 && quad.is_finite()) {
            return Err(OaError::InvalidProblem(format!(
                "quadratic coefficient {} of {} must be finite and non-negative",
                quad, var
            )));
        }
        let v = self
            .vars
            .get_mut(var.index())
            .ok_or_else(|| OaError::Host(format!("unknown variable {}", var)))?;
        v.quad = quad;
        Ok(())
    }

    /// Add a row over synchronized variables.
    pub fn add_row(&mut self, terms: &[(VarId, f64)], sense: Sense, rhs: f64) -> OaResult<()> {
        let cut = LinearCut::new(self.synced, terms, rhs, CutSource::User)?;
        let row = Row::from_cut(&cut, sense, &self.vars)?;
        self.rows.push(row);
        Ok(())
    }

    /// Variables, pending ones included.
    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    /// Rows, lazy constraints added during search included.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Whether lazy constraints are enabled.
    pub fn lazy_enabled(&self) -> bool {
        self.lazy_enabled
    }

    /// Search settings.
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Result of the last search, if it finished.
    pub fn solution(&self) -> Option<&SearchSolution> {
        self.result.as_ref()
    }

    /// Host objective of a full assignment.
    pub fn objective(&self, x: &[f64]) -> f64 {
        self.vars
            .iter()
            .zip(x)
            .map(|(v, &xi)| v.objective_at(xi))
            .sum()
    }

    /// Check bounds, binaries and integer domains before search.
    fn validate(&mut self) -> OaResult<()> {
        for var in &mut self.vars {
            if var.var_type == VarType::Binary {
                var.lb = var.lb.max(0.0);
                var.ub = var.ub.min(1.0);
            }
            if var.lb.is_nan() || var.ub.is_nan() || var.lb > var.ub {
                return Err(OaError::InvalidProblem(format!(
                    "variable {} has empty domain [{}, {}]",
                    var.name, var.lb, var.ub
                )));
            }
            if var.var_type.is_integral() {
                if !var.lb.is_finite() || !var.ub.is_finite() {
                    return Err(OaError::InvalidProblem(format!(
                        "integer variable {} needs finite bounds",
                        var.name
                    )));
                }
                var.lb = var.lb.ceil();
                var.ub = var.ub.floor();
            }
        }
        Ok(())
    }

    /// Check a suggested assignment and adopt it if it improves the incumbent.
    fn try_accept(&self, tree: &mut BranchAndBound, values: &[f64]) -> bool {
        let feas_tol = self.settings.feas_tol;
        let int_tol = self.settings.int_feas_tol;

        let problem = if values.len() != self.vars.len() {
            Some(format!(
                "has {} values, model has {} variables",
                values.len(),
                self.vars.len()
            ))
        } else if let Some(var) = self.vars.iter().zip(values).find_map(|(v, &x)| {
            let outside = x < v.lb - feas_tol || x > v.ub + feas_tol || !x.is_finite();
            let fractional = v.var_type.is_integral() && (x - x.round()).abs() > int_tol;
            (outside || fractional).then_some(&v.name)
        }) {
            Some(format!("violates the domain of {}", var))
        } else {
            self.rows
                .iter()
                .position(|r| !r.is_satisfied(values, feas_tol))
                .map(|row| format!("violates row {}", row))
        };

        if let Some(problem) = problem {
            log::warn!("Rejected suggested solution: {}", problem);
            tree.suggestion_rejected();
            return false;
        }

        let obj = self.objective(values);
        if tree.update_incumbent(values, obj) {
            tree.suggestion_accepted();
            true
        } else {
            log::debug!(
                "Suggested solution obj={:.6e} does not improve {:.6e}",
                obj,
                tree.incumbent.obj_val
            );
            tree.suggestion_rejected();
            false
        }
    }

    /// Invoke the callback once. Returns the suggestion made, if any.
    fn run_callback(
        &mut self,
        callback: &mut dyn SearchCallback,
        reason: CallbackReason,
        values: &[f64],
        objective: f64,
        host_best: f64,
    ) -> OaResult<Option<Vec<f64>>> {
        let mut ctx = ReferenceContext::new(
            reason,
            values,
            objective,
            host_best,
            &self.vars,
            &mut self.rows,
            self.lazy_enabled,
        );
        callback
            .invoke(&mut ctx)
            .map_err(|err| OaError::CallbackAborted {
                source: Box::new(err),
            })?;
        Ok(ctx.into_suggestion())
    }

    /// Give the callback one more look at a leaf whose candidate was cut
    /// off, with the new rows in place. A suggestion made here is checked
    /// like any other.
    fn revisit_discarded_leaf(
        &mut self,
        tree: &mut BranchAndBound,
        node: &SearchNode,
        callback: &mut dyn SearchCallback,
        lb: &[f64],
        ub: &[f64],
    ) -> OaResult<()> {
        let relax = solve_relaxation(&self.vars, &self.rows, lb, ub, self.settings.feas_tol);
        if relax.status != RelaxationStatus::Optimal {
            return Ok(());
        }

        log::trace!("Node {}: candidate cut off, revisiting bound {:.6e}", node.id, relax.bound);
        let reason = CallbackReason::RelaxationNode {
            node_index: node.id,
            relaxation_optimal: true,
        };
        let before = self.rows.len();
        let host_best = tree.incumbent.obj_val;
        if let Some(values) = self.run_callback(callback, reason, &relax.x, relax.bound, host_best)? {
            self.try_accept(tree, &values);
        }
        tree.lazy_added(self.rows.len() - before);
        Ok(())
    }

    fn process_node(
        &mut self,
        tree: &mut BranchAndBound,
        node: &SearchNode,
        callback: &mut dyn SearchCallback,
    ) -> OaResult<NodeOutcome> {
        let feas_tol = self.settings.feas_tol;
        let max_rounds = self.settings.max_cut_rounds;

        let mut lb: Vec<f64> = self.vars.iter().map(|v| v.lb).collect();
        let mut ub: Vec<f64> = self.vars.iter().map(|v| v.ub).collect();
        node.apply_bounds(&mut lb, &mut ub);

        // Node cut loop: stops once the callback adds nothing or the bound stalls
        let mut relax = solve_relaxation(&self.vars, &self.rows, &lb, &ub, feas_tol);
        let mut rounds = 0;
        loop {
            if relax.status == RelaxationStatus::Infeasible {
                tree.node_pruned();
                return Ok(NodeOutcome::Done);
            }

            let reason = CallbackReason::RelaxationNode {
                node_index: node.id,
                relaxation_optimal: relax.status == RelaxationStatus::Optimal,
            };
            let before = self.rows.len();
            let host_best = tree.incumbent.obj_val;
            if let Some(values) = self.run_callback(callback, reason, &relax.x, relax.bound, host_best)? {
                self.try_accept(tree, &values);
            }
            let added = self.rows.len() - before;
            tree.lazy_added(added);
            if added == 0 {
                break;
            }

            let next = solve_relaxation(&self.vars, &self.rows, &lb, &ub, feas_tol);
            let stalled = next.status == relax.status && next.bound <= relax.bound + feas_tol;
            relax = next;
            rounds += 1;
            if stalled || rounds >= max_rounds {
                if !stalled {
                    log::warn!("Node {}: cut loop stopped after {} rounds", node.id, rounds);
                }
                if relax.status == RelaxationStatus::Infeasible {
                    tree.node_pruned();
                    return Ok(NodeOutcome::Done);
                }
                break;
            }
        }

        if relax.bound >= tree.incumbent.obj_val - 1e-9 {
            tree.node_pruned();
            return Ok(NodeOutcome::Done);
        }

        if let Some(decision) = select_branching(&self.vars, &lb, &ub) {
            let mut parent = node.clone();
            parent.dual_bound = relax.bound;
            let (down, up) = tree.branch(&parent, decision);
            tree.enqueue(up);
            tree.enqueue(down);
            return Ok(NodeOutcome::Done);
        }

        // Leaf: every integer is fixed, so the relaxation point is a candidate
        let mut rounds = 0;
        loop {
            match relax.status {
                RelaxationStatus::Infeasible => {
                    tree.node_pruned();
                    return Ok(NodeOutcome::Done);
                }
                RelaxationStatus::Unbounded => return Ok(NodeOutcome::Unbounded),
                RelaxationStatus::Optimal => {}
            }
            if relax.bound >= tree.incumbent.obj_val - 1e-9 {
                tree.node_pruned();
                return Ok(NodeOutcome::Done);
            }

            let before = self.rows.len();
            let host_best = tree.incumbent.obj_val;
            self.run_callback(
                callback,
                CallbackReason::IntegerSolution,
                &relax.x,
                relax.bound,
                host_best,
            )?;
            let added = self.rows.len() - before;
            tree.lazy_added(added);
            if added == 0 {
                tree.update_incumbent(&relax.x, relax.bound);
                return Ok(NodeOutcome::Done);
            }
            if !self.settings.reevaluate_cut_candidates {
                self.revisit_discarded_leaf(tree, node, callback, &lb, &ub)?;
                tree.node_pruned();
                return Ok(NodeOutcome::Done);
            }

            rounds += 1;
            if rounds >= max_rounds {
                return Err(OaError::CutLoopLimit { rounds });
            }
            relax = solve_relaxation(&self.vars, &self.rows, &lb, &ub, feas_tol);
        }
    }
}

impl HostModel for ReferenceModel {
    fn enable_lazy_constraints(&mut self) -> OaResult<()> {
        self.lazy_enabled = true;
        Ok(())
    }

    fn add_continuous_var(&mut self, name: &str, obj: f64, lower: f64) -> OaResult<VarId> {
        if lower.is_nan() || lower == f64::INFINITY {
            return Err(OaError::InvalidProblem(format!(
                "lower bound {} of {} is not usable",
                lower, name
            )));
        }
        Ok(self.add_continuous(name, lower, f64::INFINITY, obj))
    }

    fn update(&mut self) -> OaResult<()> {
        self.synced = self.vars.len();
        Ok(())
    }

    fn add_constraint(&mut self, cut: &LinearCut) -> OaResult<()> {
        if cut.coefs.indices().iter().any(|&i| i >= self.synced) {
            return Err(OaError::Host(
                "constraint references a variable added since the last update".to_string(),
            ));
        }
        let row = Row::from_cut(cut, Sense::Le, &self.vars)?;
        self.rows.push(row);
        Ok(())
    }

    fn num_vars(&self) -> usize {
        self.synced
    }

    fn optimize(&mut self, callback: &mut dyn SearchCallback) -> OaResult<SearchStatus> {
        self.result = None;
        self.update()?;
        self.validate()?;

        if self.settings.verbose {
            log::info!(
                "Reference search: {} variables ({} integral), {} rows",
                self.vars.len(),
                self.vars.iter().filter(|v| v.var_type.is_integral()).count(),
                self.rows.len()
            );
        }

        let mut tree = BranchAndBound::new(self.settings.clone());
        tree.initialize();

        let status = loop {
            if let Some(status) = tree.check_limits() {
                break status;
            }
            let Some(node) = tree.next_node() else {
                break if tree.incumbent.has_incumbent() {
                    SearchStatus::Optimal
                } else {
                    SearchStatus::Infeasible
                };
            };
            if node.can_prune(tree.incumbent.obj_val) {
                tree.node_pruned();
                continue;
            }

            tree.node_explored();
            if let NodeOutcome::Unbounded = self.process_node(&mut tree, &node, callback)? {
                break SearchStatus::Unbounded;
            }
            tree.log_progress();
        };

        let solution = tree.finish(status);
        if self.settings.verbose {
            log::info!(
                "Search finished: {:?}, obj={:.6e}, {} nodes, {} lazy constraints",
                solution.status,
                solution.obj_val,
                solution.nodes_explored,
                solution.lazy_constraints
            );
        }
        self.result = Some(solution);
        Ok(status)
    }

    fn objective_value(&self) -> OaResult<f64> {
        let solution = self.result.as_ref().ok_or(OaError::NotSolved)?;
        if solution.has_solution() {
            Ok(solution.obj_val)
        } else {
            Err(OaError::Host(format!(
                "no feasible solution available (status {:?})",
                solution.status
            )))
        }
    }
}
