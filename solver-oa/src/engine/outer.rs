//! Engine construction and result access.

use crate::cuts::{emit_tangent_cut, CutSource};
use crate::error::OaResult;
use crate::host::{HostModel, SearchStatus, VarId};
use crate::model::IncumbentTracker;
use crate::settings::OaSettings;
use crate::term::ConvexTerm;

use super::{ApproximationCallback, ApproximationState, OaStats};

/// Lazy outer approximation of convex objective terms on a host model.
///
/// Construction augments the model; [`optimize`](Self::optimize) runs the
/// host's search with the engine's callback registered.
pub struct OuterApproximation<'t, M: HostModel> {
    model: M,
    callback: ApproximationCallback<'t>,
}

impl<'t, M: HostModel> OuterApproximation<'t, M> {
    /// Attach `terms` to `model`.
    ///
    /// Enables lazy constraints, adds one approximation variable per term
    /// (objective coefficient 1.0), synchronizes the model and adds a
    /// permanent tangent cut at every anchor. Any host rejection is returned
    /// as is.
    pub fn new(mut model: M, terms: &'t [ConvexTerm], settings: OaSettings) -> OaResult<Self> {
        model.enable_lazy_constraints()?;

        let mut vars = Vec::with_capacity(terms.len());
        for i in 0..terms.len() {
            let name = format!("convex_approximation_{}", i);
            vars.push(model.add_continuous_var(&name, 1.0, settings.approximation_lower_bound)?);
        }
        model.update()?;

        let state = ApproximationState::new(terms, vars);
        let mut stats = OaStats::default();
        let dim = model.num_vars();

        for (index, term, approx) in state.iter() {
            for (anchor, point) in term.anchors().iter().enumerate() {
                let source = CutSource::Starting {
                    term: index,
                    anchor,
                };
                emit_tangent_cut(index, term, approx, point, None, dim, source, |cut| {
                    model.add_constraint(cut)
                })?;
                stats.starting_cuts += 1;
            }
        }

        if settings.verbose {
            log::info!(
                "Outer approximation: {} terms, {} starting cuts",
                terms.len(),
                stats.starting_cuts
            );
        }

        Ok(Self {
            model,
            callback: ApproximationCallback::new(state, settings, stats),
        })
    }

    /// Run the host search with the approximation callback.
    pub fn optimize(&mut self) -> OaResult<SearchStatus> {
        let status = self.model.optimize(&mut self.callback)?;

        if self.callback.settings().verbose {
            let stats = self.callback.stats();
            log::info!(
                "Search finished: {:?} | lazy cuts {} | warm start cuts {} | suggestions {} | true obj {:.6e}",
                status,
                stats.lazy_cuts,
                stats.warm_start_cuts,
                stats.suggestions,
                self.best_true_objective()
            );
        }

        Ok(status)
    }

    /// Best objective as reported by the host, uncorrected.
    pub fn objective_value(&self) -> OaResult<f64> {
        self.model.objective_value()
    }

    /// Best true objective seen at integer candidates (+inf if none).
    ///
    /// Compare with [`objective_value`](Self::objective_value) to detect
    /// divergence between the host's bookkeeping and the true terms.
    pub fn best_true_objective(&self) -> f64 {
        self.callback.incumbent().obj_val
    }

    /// Corrected incumbent.
    pub fn incumbent(&self) -> &IncumbentTracker {
        self.callback.incumbent()
    }

    /// Approximation variables, parallel to the terms.
    pub fn approximation_vars(&self) -> &[VarId] {
        self.callback.state().vars()
    }

    /// The terms being approximated.
    pub fn terms(&self) -> &'t [ConvexTerm] {
        self.callback.state().terms()
    }

    /// Engine counters.
    pub fn stats(&self) -> &OaStats {
        self.callback.stats()
    }

    /// Engine settings.
    pub fn settings(&self) -> &OaSettings {
        self.callback.settings()
    }

    /// The host model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// The callback, for hosts that drive the search themselves.
    pub fn callback_mut(&mut self) -> &mut ApproximationCallback<'t> {
        &mut self.callback
    }

    /// Give the host model back.
    pub fn into_model(self) -> M {
        self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cuts::LinearCut;
    use crate::error::OaError;
    use crate::host::{CallbackContext, CallbackReason, SearchCallback};
    use crate::term::{Evaluator, Gradient};

    /// Host operations in the order they happened.
    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        EnableLazy,
        AddVar(f64, f64),
        Update,
        Constraint,
        Callback,
    }

    /// Model that records operations and replays scripted callbacks.
    struct RecordingModel {
        num_vars: usize,
        ops: Vec<Op>,
        constraints: Vec<LinearCut>,
        script: Vec<ScriptedContext>,
        replayed: Vec<ScriptedContext>,
        reject_vars: bool,
    }

    impl RecordingModel {
        fn new(num_vars: usize, script: Vec<ScriptedContext>) -> Self {
            Self {
                num_vars,
                ops: Vec::new(),
                constraints: Vec::new(),
                script,
                replayed: Vec::new(),
                reject_vars: false,
            }
        }
    }

    impl HostModel for RecordingModel {
        fn enable_lazy_constraints(&mut self) -> OaResult<()> {
            self.ops.push(Op::EnableLazy);
            Ok(())
        }

        fn add_continuous_var(&mut self, _name: &str, obj: f64, lower: f64) -> OaResult<VarId> {
            if self.reject_vars {
                return Err(OaError::Host("model is in search".into()));
            }
            self.ops.push(Op::AddVar(obj, lower));
            self.num_vars += 1;
            Ok(VarId(self.num_vars - 1))
        }

        fn update(&mut self) -> OaResult<()> {
            self.ops.push(Op::Update);
            Ok(())
        }

        fn add_constraint(&mut self, cut: &LinearCut) -> OaResult<()> {
            self.ops.push(Op::Constraint);
            self.constraints.push(cut.clone());
            Ok(())
        }

        fn num_vars(&self) -> usize {
            self.num_vars
        }

        fn optimize(&mut self, callback: &mut dyn SearchCallback) -> OaResult<SearchStatus> {
            for mut ctx in std::mem::take(&mut self.script) {
                self.ops.push(Op::Callback);
                callback.invoke(&mut ctx)?;
                self.replayed.push(ctx);
            }
            Ok(SearchStatus::Optimal)
        }

        fn objective_value(&self) -> OaResult<f64> {
            Ok(42.0)
        }
    }

    /// One callback invocation with fixed values.
    struct ScriptedContext {
        reason: CallbackReason,
        values: Vec<f64>,
        objective: f64,
        host_best: f64,
        lazy: Vec<LinearCut>,
        suggested: Vec<Vec<f64>>,
    }

    impl ScriptedContext {
        fn solution(values: Vec<f64>, objective: f64) -> Self {
            Self {
                reason: CallbackReason::IntegerSolution,
                values,
                objective,
                host_best: f64::INFINITY,
                lazy: Vec::new(),
                suggested: Vec::new(),
            }
        }

        fn node(node_index: u64, optimal: bool, values: Vec<f64>, host_best: f64) -> Self {
            Self {
                reason: CallbackReason::RelaxationNode {
                    node_index,
                    relaxation_optimal: optimal,
                },
                values,
                objective: f64::NAN,
                host_best,
                lazy: Vec::new(),
                suggested: Vec::new(),
            }
        }

        fn at_solution(&self) -> OaResult<()> {
            match self.reason {
                CallbackReason::IntegerSolution => Ok(()),
                _ => Err(OaError::Host("solution read outside an integer solution".into())),
            }
        }

        fn at_node(&self) -> OaResult<()> {
            match self.reason {
                CallbackReason::RelaxationNode { .. } => Ok(()),
                _ => Err(OaError::Host("node read outside a relaxation node".into())),
            }
        }
    }

    impl CallbackContext for ScriptedContext {
        fn reason(&self) -> CallbackReason {
            self.reason
        }

        fn num_vars(&self) -> usize {
            self.values.len()
        }

        fn solution_objective(&self) -> OaResult<f64> {
            self.at_solution()?;
            Ok(self.objective)
        }

        fn solution_value(&self, var: VarId) -> OaResult<f64> {
            self.at_solution()?;
            Ok(self.values[var.index()])
        }

        fn node_best_objective(&self) -> OaResult<f64> {
            self.at_node()?;
            Ok(self.host_best)
        }

        fn node_value(&self, var: VarId) -> OaResult<f64> {
            self.at_node()?;
            Ok(self.values[var.index()])
        }

        fn add_lazy(&mut self, cut: &LinearCut) -> OaResult<()> {
            self.lazy.push(cut.clone());
            Ok(())
        }

        fn suggest_solution(&mut self, values: &[f64]) -> OaResult<()> {
            self.at_node()?;
            self.suggested.push(values.to_vec());
            Ok(())
        }
    }

    /// `c * x^2` over variable 0.
    fn square_term(c: f64, anchors: Vec<Vec<f64>>) -> ConvexTerm {
        ConvexTerm::new(
            Evaluator::unary(move |x| c * x * x),
            Gradient::unary(move |x| vec![2.0 * c * x]),
            vec![VarId(0)],
            anchors,
        )
        .unwrap()
    }

    #[test]
    fn test_construction_order() {
        let terms = vec![
            square_term(1.0, vec![vec![0.0], vec![1.0]]),
            square_term(2.0, vec![vec![-1.0]]),
        ];
        let model = RecordingModel::new(1, vec![]);
        let engine = OuterApproximation::new(model, &terms, OaSettings::default()).unwrap();

        let lb = f64::NEG_INFINITY;
        assert_eq!(
            engine.model().ops,
            vec![
                Op::EnableLazy,
                Op::AddVar(1.0, lb),
                Op::AddVar(1.0, lb),
                Op::Update,
                Op::Constraint,
                Op::Constraint,
                Op::Constraint,
            ]
        );
        assert_eq!(engine.approximation_vars(), &[VarId(1), VarId(2)]);
        assert_eq!(engine.stats().starting_cuts, 3);

        // Second term's anchor cut references the second approximation variable.
        let cut = &engine.model().constraints[2];
        assert_eq!(cut.source, CutSource::Starting { term: 1, anchor: 0 });
        assert_eq!(cut.coef(VarId(2)), -1.0);
        assert_eq!(cut.coef(VarId(1)), 0.0);
        assert_eq!(cut.coef(VarId(0)), -4.0);
    }

    #[test]
    fn test_starting_cuts_precede_search() {
        let terms = vec![square_term(1.0, vec![vec![2.0], vec![3.0]])];
        let script = vec![ScriptedContext::solution(vec![1.0, 1.0], 1.0)];
        let model = RecordingModel::new(1, script);
        let mut engine = OuterApproximation::new(model, &terms, OaSettings::default()).unwrap();
        engine.optimize().unwrap();

        let ops = &engine.model().ops;
        let first_callback = ops.iter().position(|op| *op == Op::Callback).unwrap();
        let constraints: Vec<usize> = ops
            .iter()
            .enumerate()
            .filter(|(_, op)| **op == Op::Constraint)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(constraints.len(), 2);
        assert!(constraints.iter().all(|&i| i < first_callback));
    }

    #[test]
    fn test_host_rejection_propagates() {
        let terms = vec![square_term(1.0, vec![])];
        let mut model = RecordingModel::new(1, vec![]);
        model.reject_vars = true;

        let res = OuterApproximation::new(model, &terms, OaSettings::default());
        assert!(matches!(res, Err(OaError::Host(_))));
    }

    #[test]
    fn test_lazy_cut_at_violated_solution() {
        // x = 2, t = 1: actual 4, violation 3
        let terms = vec![square_term(1.0, vec![])];
        let script = vec![ScriptedContext::solution(vec![2.0, 1.0], 10.0)];
        let model = RecordingModel::new(1, script);
        let mut engine = OuterApproximation::new(model, &terms, OaSettings::default()).unwrap();
        engine.optimize().unwrap();

        let ctx = &engine.model().replayed[0];
        assert_eq!(ctx.lazy.len(), 1);
        let cut = &ctx.lazy[0];
        assert_eq!(cut.source, CutSource::Lazy { term: 0 });
        assert_eq!(cut.coef(VarId(0)), 4.0);
        assert_eq!(cut.coef(VarId(1)), -1.0);
        assert!((cut.rhs - 4.0).abs() < 1e-12);

        // Host said 10 with t = 1; truth is 10 - 1 + 4.
        assert!((engine.best_true_objective() - 13.0).abs() < 1e-12);
        // Approximation slot repaired to the true value.
        assert_eq!(engine.incumbent().solution.as_deref(), Some(&[2.0, 4.0][..]));
        assert_eq!(engine.stats().lazy_cuts, 1);
    }

    #[test]
    fn test_no_spurious_cuts() {
        // Violations just below the tolerance, then none at all.
        let terms = vec![square_term(1.0, vec![])];
        let script = vec![
            ScriptedContext::solution(vec![2.0, 4.0 - 9e-6], 4.0),
            ScriptedContext::solution(vec![2.0, 4.0 - 5e-6], 4.0),
            ScriptedContext::solution(vec![2.0, 5.0], 5.0),
        ];
        let model = RecordingModel::new(1, script);
        let mut engine = OuterApproximation::new(model, &terms, OaSettings::default()).unwrap();
        engine.optimize().unwrap();

        assert!(engine.model().replayed.iter().all(|ctx| ctx.lazy.is_empty()));
        assert_eq!(engine.stats().lazy_cuts, 0);
    }

    #[test]
    fn test_true_objective_accumulates_over_terms() {
        // Two terms on the same variable: x^2 and 3x^2 at x = 1.
        let terms = vec![square_term(1.0, vec![]), square_term(3.0, vec![])];
        // vars: x, t0, t1; host objective 7 = 5 (linear part) + t0 + t1
        let script = vec![ScriptedContext::solution(vec![1.0, 0.5, 1.5], 7.0)];
        let model = RecordingModel::new(1, script);
        let mut engine = OuterApproximation::new(model, &terms, OaSettings::default()).unwrap();
        engine.optimize().unwrap();

        assert!((engine.best_true_objective() - 9.0).abs() < 1e-12);
        assert_eq!(
            engine.incumbent().solution.as_deref(),
            Some(&[1.0, 1.0, 3.0][..])
        );
        assert_eq!(engine.model().replayed[0].lazy.len(), 2);
    }

    #[test]
    fn test_monotone_tightening() {
        // Host reports x = 1.5 each time; t follows the cuts added so far.
        let term = square_term(1.0, vec![vec![0.0]]);
        let terms = vec![term];
        let model = RecordingModel::new(1, vec![]);
        let mut engine = OuterApproximation::new(model, &terms, OaSettings::default()).unwrap();
        let mut cuts = engine.model().constraints.clone();

        let x = 1.5;
        let mut history = Vec::new();
        for _ in 0..5 {
            // Smallest t satisfying every cut at x.
            let t = cuts
                .iter()
                .map(|c| c.coef(VarId(0)) * x - c.rhs)
                .fold(f64::NEG_INFINITY, f64::max);
            history.push(t);

            let mut ctx = ScriptedContext::solution(vec![x, t], t);
            engine.callback_mut().invoke(&mut ctx).unwrap();
            cuts.extend(ctx.lazy);
        }

        assert!(history.windows(2).all(|w| w[1] >= w[0]));
        let last = *history.last().unwrap();
        assert!((x * x - last).abs() <= 1e-5);
        // One cut closes the gap at a fixed point; no more after that.
        assert_eq!(engine.stats().lazy_cuts, 1);
    }

    #[test]
    fn test_warm_start_only_at_optimal_root() {
        let terms = vec![square_term(1.0, vec![])];
        let settings = OaSettings::default().with_warm_start(true);
        let script = vec![
            ScriptedContext::node(0, false, vec![1.0, 0.0], f64::INFINITY),
            ScriptedContext::node(1, true, vec![1.0, 0.0], f64::INFINITY),
            ScriptedContext::node(0, true, vec![0.5, 0.0], f64::INFINITY),
        ];
        let model = RecordingModel::new(1, script);
        let mut engine = OuterApproximation::new(model, &terms, settings).unwrap();
        engine.optimize().unwrap();

        let replayed = &engine.model().replayed;
        assert!(replayed[0].lazy.is_empty());
        assert!(replayed[1].lazy.is_empty());
        assert_eq!(replayed[2].lazy.len(), 1);
        assert_eq!(replayed[2].lazy[0].source, CutSource::WarmStart { term: 0 });
        assert_eq!(engine.stats().warm_start_cuts, 1);
        // Node reads never touch the incumbent.
        assert!(!engine.incumbent().has_incumbent());
    }

    #[test]
    fn test_warm_start_disabled() {
        let terms = vec![square_term(1.0, vec![])];
        let script = vec![ScriptedContext::node(0, true, vec![0.5, 0.0], f64::INFINITY)];
        let model = RecordingModel::new(1, script);
        let mut engine = OuterApproximation::new(model, &terms, OaSettings::default()).unwrap();
        engine.optimize().unwrap();

        assert!(engine.model().replayed[0].lazy.is_empty());
    }

    #[test]
    fn test_heuristic_suggests_when_host_is_worse() {
        let terms = vec![square_term(1.0, vec![])];
        let settings = OaSettings::default()
            .with_heuristic(true)
            .with_warm_start(true);
        let script = vec![
            // Nothing recorded yet: no suggestion, warm start cut instead.
            ScriptedContext::node(0, true, vec![3.0, 0.0], f64::INFINITY),
            // True objective 1 - 0 + 1 = 2
            ScriptedContext::solution(vec![1.0, 0.0], 1.0),
            // Host best 5 > 2: suggest, skip the root cut pass.
            ScriptedContext::node(0, true, vec![3.0, 0.0], 5.0),
            // Host best 2 is not worse: nothing.
            ScriptedContext::node(4, true, vec![3.0, 0.0], 2.0),
            // Not optimal: nothing.
            ScriptedContext::node(5, false, vec![3.0, 0.0], 5.0),
        ];
        let model = RecordingModel::new(1, script);
        let mut engine = OuterApproximation::new(model, &terms, settings).unwrap();
        engine.optimize().unwrap();

        let replayed = &engine.model().replayed;
        assert!(replayed[0].suggested.is_empty());
        assert_eq!(replayed[0].lazy.len(), 1);

        assert_eq!(replayed[2].suggested, vec![vec![1.0, 1.0]]);
        assert!(replayed[2].lazy.is_empty());

        assert!(replayed[3].suggested.is_empty());
        assert!(replayed[4].suggested.is_empty());
        assert_eq!(engine.stats().suggestions, 1);
    }

    #[test]
    fn test_heuristic_disabled_never_suggests() {
        let terms = vec![square_term(1.0, vec![])];
        let script = vec![
            ScriptedContext::solution(vec![1.0, 0.0], 1.0),
            ScriptedContext::node(3, true, vec![3.0, 0.0], 100.0),
        ];
        let model = RecordingModel::new(1, script);
        let mut engine = OuterApproximation::new(model, &terms, OaSettings::default()).unwrap();
        engine.optimize().unwrap();

        assert!(engine.model().replayed[1].suggested.is_empty());
        assert_eq!(engine.stats().suggestions, 0);
    }

    #[test]
    fn test_other_reason_ignored() {
        let terms = vec![square_term(1.0, vec![])];
        let mut ctx = ScriptedContext::solution(vec![2.0, 0.0], 0.0);
        ctx.reason = CallbackReason::Other;
        let model = RecordingModel::new(1, vec![ctx]);
        let mut engine = OuterApproximation::new(model, &terms, OaSettings::default()).unwrap();
        engine.optimize().unwrap();

        assert!(engine.model().replayed[0].lazy.is_empty());
        assert_eq!(engine.stats().callbacks, 1);
    }

    #[test]
    fn test_evaluation_failure_aborts_search() {
        let terms = vec![ConvexTerm::new(
            Evaluator::unary(|x: f64| -x.ln()),
            Gradient::unary(|x| vec![-1.0 / x]),
            vec![VarId(0)],
            vec![],
        )
        .unwrap()];
        let script = vec![
            ScriptedContext::solution(vec![0.0, 0.0], 0.0),
            ScriptedContext::solution(vec![1.0, 0.0], 0.0),
        ];
        let model = RecordingModel::new(1, script);
        let mut engine = OuterApproximation::new(model, &terms, OaSettings::default()).unwrap();

        let err = engine.optimize().unwrap_err();
        assert!(matches!(err, OaError::Evaluation { term: 0, .. }));
        // The second invocation never happened.
        assert!(engine.model().replayed.is_empty());
    }

    #[test]
    fn test_objective_passthrough() {
        let terms = vec![square_term(1.0, vec![])];
        let model = RecordingModel::new(1, vec![]);
        let mut engine = OuterApproximation::new(model, &terms, OaSettings::default()).unwrap();
        engine.optimize().unwrap();

        assert_eq!(engine.objective_value().unwrap(), 42.0);
        assert_eq!(engine.best_true_objective(), f64::INFINITY);
    }
}
