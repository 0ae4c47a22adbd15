//! Configuration settings for the engine and the reference host.

/// Minimum violation `actual - approx` for a lazy cut to be added.
pub const TOLERANCE: f64 = 1e-5;

/// Outer approximation engine settings.
///
/// Fixed at engine construction.
#[derive(Debug, Clone)]
pub struct OaSettings {
    /// Add cuts at the root relaxation once it is solved to optimality.
    pub run_warm_start: bool,

    /// Suggest the cached, repaired incumbent at relaxation nodes whenever
    /// the host's own incumbent is worse.
    pub use_heuristic: bool,

    /// Violation above which a lazy cut is emitted.
    pub cut_violation_tol: f64,

    /// Lower bound given to each approximation variable.
    /// Negative infinity leaves the variable free.
    pub approximation_lower_bound: f64,

    /// Log every emitted cut and incumbent update.
    pub verbose: bool,
}

impl Default for OaSettings {
    fn default() -> Self {
        Self {
            run_warm_start: false,
            use_heuristic: false,
            cut_violation_tol: TOLERANCE,
            approximation_lower_bound: f64::NEG_INFINITY,
            verbose: false,
        }
    }
}

impl OaSettings {
    /// Enable or disable the root relaxation cut pass.
    pub fn with_warm_start(mut self, enabled: bool) -> Self {
        self.run_warm_start = enabled;
        self
    }

    /// Enable or disable incumbent-repair suggestions.
    pub fn with_heuristic(mut self, enabled: bool) -> Self {
        self.use_heuristic = enabled;
        self
    }

    /// Set the lower bound of the approximation variables.
    pub fn with_approximation_lower_bound(mut self, lb: f64) -> Self {
        self.approximation_lower_bound = lb;
        self
    }
}

/// Node selection strategy for the reference host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeSelection {
    /// Always select node with best (lowest) dual bound.
    BestBound,

    /// Depth-first search (finds incumbents quickly, small queue).
    #[default]
    DepthFirst,

    /// Hybrid: alternate between diving and best-bound.
    Hybrid {
        /// How often to dive (every N nodes).
        dive_freq: usize,
    },
}

/// Reference host search settings.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Maximum number of nodes to explore.
    pub max_nodes: u64,

    /// Time limit in milliseconds (None = unlimited).
    pub time_limit_ms: Option<u64>,

    /// A variable is considered integer if |x - round(x)| <= int_feas_tol.
    pub int_feas_tol: f64,

    /// Row feasibility tolerance.
    pub feas_tol: f64,

    /// Node selection strategy.
    pub node_selection: NodeSelection,

    /// Callback rounds allowed per node before the search gives up.
    pub max_cut_rounds: usize,

    /// Re-solve an integer candidate that received lazy constraints and offer
    /// it again. When off, the candidate is dropped and its node is handed to
    /// the callback once more as a relaxation node before being closed.
    pub reevaluate_cut_candidates: bool,

    /// Print progress information.
    pub verbose: bool,

    /// Log frequency (print every N nodes).
    pub log_freq: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_nodes: 10_000_000,
            time_limit_ms: None,
            int_feas_tol: 1e-6,
            feas_tol: 1e-6,
            node_selection: NodeSelection::default(),
            max_cut_rounds: 100,
            reevaluate_cut_candidates: true,
            verbose: false,
            log_freq: 1000,
        }
    }
}

impl SearchSettings {
    /// Create settings with verbose output enabled.
    pub fn verbose() -> Self {
        Self {
            verbose: true,
            log_freq: 100,
            ..Self::default()
        }
    }

    /// Set time limit in seconds.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit_ms = Some((seconds * 1000.0) as u64);
        self
    }

    /// Set maximum nodes.
    pub fn with_max_nodes(mut self, nodes: u64) -> Self {
        self.max_nodes = nodes;
        self
    }

    /// Set node selection strategy.
    pub fn with_node_selection(mut self, selection: NodeSelection) -> Self {
        self.node_selection = selection;
        self
    }

    /// Enable or disable re-solving integer candidates after lazy constraints.
    pub fn with_candidate_reevaluation(mut self, enabled: bool) -> Self {
        self.reevaluate_cut_candidates = enabled;
        self
    }
}
