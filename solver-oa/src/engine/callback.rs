//! Callback state machine.

use crate::cuts::{emit_tangent_cut, CutSource};
use crate::error::{OaError, OaResult};
use crate::host::{CallbackContext, CallbackReason, SearchCallback, VarId};
use crate::model::IncumbentTracker;
use crate::settings::OaSettings;

use super::ApproximationState;

/// Counters kept by the engine.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OaStats {
    /// Callback invocations received.
    pub callbacks: u64,

    /// Permanent cuts added at anchors before search.
    pub starting_cuts: u64,

    /// Lazy cuts added at the root relaxation.
    pub warm_start_cuts: u64,

    /// Lazy cuts added at integer candidates.
    pub lazy_cuts: u64,

    /// Repaired incumbents suggested to the host.
    pub suggestions: u64,

    /// Times the corrected incumbent improved.
    pub incumbent_updates: u64,
}

/// The engine's search callback.
///
/// Holds everything that changes during search: the corrected incumbent and
/// the counters. Invocations take `&mut self`, so one whole decision
/// sequence (correct, compare, replace) runs without interleaving.
#[derive(Debug)]
pub struct ApproximationCallback<'t> {
    state: ApproximationState<'t>,
    settings: OaSettings,
    incumbent: IncumbentTracker,
    stats: OaStats,
}

impl<'t> ApproximationCallback<'t> {
    pub(crate) fn new(state: ApproximationState<'t>, settings: OaSettings, stats: OaStats) -> Self {
        Self {
            state,
            settings,
            incumbent: IncumbentTracker::new(),
            stats,
        }
    }

    /// Terms and their approximation variables.
    pub fn state(&self) -> &ApproximationState<'t> {
        &self.state
    }

    /// Settings fixed at construction.
    pub fn settings(&self) -> &OaSettings {
        &self.settings
    }

    /// Best true objective and assignment seen at integer candidates.
    pub fn incumbent(&self) -> &IncumbentTracker {
        &self.incumbent
    }

    /// Counters.
    pub fn stats(&self) -> &OaStats {
        &self.stats
    }

    fn handle(&mut self, ctx: &mut dyn CallbackContext, reason: CallbackReason) -> OaResult<()> {
        match reason {
            CallbackReason::IntegerSolution => self.approximate(ctx, reason),
            CallbackReason::RelaxationNode {
                node_index,
                relaxation_optimal: true,
            } => {
                if self.suggest_incumbent(ctx)? {
                    return Ok(());
                }
                if node_index == 0 && self.settings.run_warm_start {
                    self.approximate(ctx, reason)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Suggest the repaired incumbent when the host's is worse.
    ///
    /// Returns true if a suggestion was made.
    fn suggest_incumbent(&mut self, ctx: &mut dyn CallbackContext) -> OaResult<bool> {
        if !self.settings.use_heuristic {
            return Ok(false);
        }
        let Some(solution) = self.incumbent.solution.as_ref() else {
            return Ok(false);
        };

        let host_best = ctx.node_best_objective()?;
        if host_best > self.incumbent.obj_val {
            ctx.suggest_solution(solution)?;
            self.stats.suggestions += 1;
            if self.settings.verbose {
                log::info!(
                    "Suggested incumbent with true objective {:.6e} (host best {:.6e})",
                    self.incumbent.obj_val,
                    host_best
                );
            }
            return Ok(true);
        }
        Ok(false)
    }

    /// Compare every term with its approximation and cut where it falls short.
    ///
    /// At integer candidates this also corrects the host objective to the
    /// true one and records it if it beats the incumbent.
    fn approximate(&mut self, ctx: &mut dyn CallbackContext, reason: CallbackReason) -> OaResult<()> {
        let at_solution = reason == CallbackReason::IntegerSolution;
        let dim = ctx.num_vars();

        let mut true_obj = if at_solution {
            ctx.solution_objective()?
        } else {
            0.0
        };
        let mut actuals = Vec::with_capacity(self.state.len());

        for (index, term, approx) in self.state.iter() {
            let approx_value = read_value(&*ctx, reason, approx)?;
            let point = read_values(&*ctx, reason, term.variables())?;
            let actual = term.checked_value(index, &point)?;

            true_obj += actual - approx_value;
            actuals.push(actual);

            if actual - approx_value > self.settings.cut_violation_tol {
                let source = if at_solution {
                    CutSource::Lazy { term: index }
                } else {
                    CutSource::WarmStart { term: index }
                };
                emit_tangent_cut(index, term, approx, &point, Some(actual), dim, source, |cut| {
                    ctx.add_lazy(cut)
                })?;
                if at_solution {
                    self.stats.lazy_cuts += 1;
                } else {
                    self.stats.warm_start_cuts += 1;
                }
            }
        }

        if at_solution && self.incumbent.improves(true_obj) {
            let all: Vec<VarId> = (0..dim).map(VarId).collect();
            let mut x = read_values(&*ctx, reason, &all)?;
            for (&var, &actual) in self.state.vars().iter().zip(&actuals) {
                x[var.index()] = actual;
            }
            self.incumbent.update(&x, true_obj);
            self.stats.incumbent_updates += 1;
            if self.settings.verbose {
                log::info!("New true incumbent: obj={:.6e}", true_obj);
            }
        }

        Ok(())
    }
}

impl SearchCallback for ApproximationCallback<'_> {
    fn invoke(&mut self, ctx: &mut dyn CallbackContext) -> OaResult<()> {
        self.stats.callbacks += 1;
        let reason = ctx.reason();
        self.handle(ctx, reason).map_err(|err| {
            log::error!("Outer approximation callback failed ({:?}): {}", reason, err);
            err
        })
    }
}

/// Read `var` with the accessor that matches `reason`.
fn read_value(ctx: &dyn CallbackContext, reason: CallbackReason, var: VarId) -> OaResult<f64> {
    match reason {
        CallbackReason::IntegerSolution => ctx.solution_value(var),
        CallbackReason::RelaxationNode { .. } => ctx.node_value(var),
        other => Err(OaError::UnsupportedCallbackReason(other)),
    }
}

/// Read `vars` with the accessor that matches `reason`.
fn read_values(
    ctx: &dyn CallbackContext,
    reason: CallbackReason,
    vars: &[VarId],
) -> OaResult<Vec<f64>> {
    let values = match reason {
        CallbackReason::IntegerSolution => ctx.solution_values(vars)?,
        CallbackReason::RelaxationNode { .. } => ctx.node_values(vars)?,
        other => return Err(OaError::UnsupportedCallbackReason(other)),
    };
    if values.len() != vars.len() {
        return Err(OaError::Host(format!(
            "host returned {} values for {} variables",
            values.len(),
            vars.len()
        )));
    }
    Ok(values)
}
