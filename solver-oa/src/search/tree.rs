//! Branch-and-bound tree controller.

use std::time::Instant;

use super::{BranchDecision, NodeQueue, SearchNode, SearchSolution};
use crate::host::SearchStatus;
use crate::model::IncumbentTracker;
use crate::settings::SearchSettings;

/// Branch-and-bound tree controller.
///
/// Manages the node queue, the host's incumbent, counters and termination.
pub struct BranchAndBound {
    /// Node queue.
    queue: NodeQueue,

    /// Host incumbent, valued with the host objective.
    pub incumbent: IncumbentTracker,

    /// Next node ID to assign.
    next_node_id: u64,

    /// Total nodes explored.
    nodes_explored: u64,

    /// Nodes pruned.
    nodes_pruned: u64,

    /// Lazy constraints added from the callback.
    lazy_constraints: u64,

    /// Suggested solutions adopted.
    heuristic_accepted: u64,

    /// Suggested solutions turned down.
    heuristic_rejected: u64,

    /// Start time.
    start_time: Option<Instant>,

    /// Settings.
    settings: SearchSettings,
}

impl BranchAndBound {
    /// Create a new B&B controller.
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            queue: NodeQueue::new(settings.node_selection),
            incumbent: IncumbentTracker::new(),
            next_node_id: 1, // 0 reserved for root
            nodes_explored: 0,
            nodes_pruned: 0,
            lazy_constraints: 0,
            heuristic_accepted: 0,
            heuristic_rejected: 0,
            start_time: None,
            settings,
        }
    }

    /// Start the clock and queue the root node.
    pub fn initialize(&mut self) {
        self.start_time = Some(Instant::now());
        self.queue.push(SearchNode::root());
    }

    /// Get the next node to process.
    pub fn next_node(&mut self) -> Option<SearchNode> {
        self.queue.pop()
    }

    /// Mark a node as explored.
    pub fn node_explored(&mut self) {
        self.nodes_explored += 1;
    }

    /// Record that a node was pruned.
    pub fn node_pruned(&mut self) {
        self.nodes_pruned += 1;
    }

    /// Record lazy constraints added.
    pub fn lazy_added(&mut self, count: usize) {
        self.lazy_constraints += count as u64;
    }

    /// Record an adopted suggestion.
    pub fn suggestion_accepted(&mut self) {
        self.heuristic_accepted += 1;
    }

    /// Record a rejected suggestion.
    pub fn suggestion_rejected(&mut self) {
        self.heuristic_rejected += 1;
    }

    /// Create child nodes from a branching decision.
    ///
    /// Returns the two child nodes (down, up).
    pub fn branch(&mut self, parent: &SearchNode, decision: BranchDecision) -> (SearchNode, SearchNode) {
        let down_id = self.next_node_id;
        let up_id = self.next_node_id + 1;
        self.next_node_id += 2;

        log::trace!(
            "Node {}: branching on x{} (score {:.3e})",
            parent.id,
            decision.var,
            decision.score
        );

        let down_child = parent.child(down_id, decision.down_branch);
        let up_child = parent.child(up_id, decision.up_branch);

        (down_child, up_child)
    }

    /// Add a node to the queue.
    pub fn enqueue(&mut self, node: SearchNode) {
        self.queue.push(node);
    }

    /// Update incumbent with a new solution.
    ///
    /// Returns true if incumbent was improved.
    pub fn update_incumbent(&mut self, x: &[f64], obj: f64) -> bool {
        let improved = self.incumbent.update(x, obj);

        if improved {
            // Prune nodes dominated by new incumbent
            let pruned = self.queue.prune_by_bound(obj);
            self.nodes_pruned += pruned as u64;

            if self.settings.verbose {
                log::info!("New incumbent: obj={:.6e}, pruned {} nodes", obj, pruned);
            }
        }

        improved
    }

    /// Get the current optimality gap.
    pub fn gap(&self) -> f64 {
        self.incumbent.gap(self.best_bound())
    }

    /// Best dual bound over open nodes, capped by the incumbent.
    pub fn best_bound(&self) -> f64 {
        self.queue.best_bound().min(self.incumbent.obj_val)
    }

    /// Get elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    /// Check node and time limits.
    ///
    /// Returns Some(status) if the search must stop.
    pub fn check_limits(&self) -> Option<SearchStatus> {
        if let Some(limit) = self.settings.time_limit_ms {
            if self.elapsed_ms() >= limit {
                return Some(SearchStatus::TimeLimit);
            }
        }

        if self.nodes_explored >= self.settings.max_nodes {
            return Some(SearchStatus::NodeLimit);
        }

        None
    }

    /// Finalize the search and return the solution.
    pub fn finish(&self, status: SearchStatus) -> SearchSolution {
        SearchSolution {
            status,
            x: self.incumbent.solution.clone().unwrap_or_default(),
            obj_val: self.incumbent.obj_val,
            bound: self.best_bound(),
            nodes_explored: self.nodes_explored,
            nodes_pruned: self.nodes_pruned,
            lazy_constraints: self.lazy_constraints,
            heuristic_accepted: self.heuristic_accepted,
            heuristic_rejected: self.heuristic_rejected,
            solve_time_ms: self.elapsed_ms(),
        }
    }

    /// Log progress (if verbose).
    pub fn log_progress(&self) {
        if !self.settings.verbose {
            return;
        }

        if self.nodes_explored % self.settings.log_freq.max(1) != 0 {
            return;
        }

        log::info!(
            "Nodes: {} ({} open) | Bound: {:.6e} | Incumbent: {:.6e} | Gap: {:.2}% | Lazy: {} | Time: {:.1}s",
            self.nodes_explored,
            self.queue.len(),
            self.best_bound(),
            self.incumbent.obj_val,
            self.gap() * 100.0,
            self.lazy_constraints,
            self.elapsed_ms() as f64 / 1000.0,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::BoundChange;

    #[test]
    fn test_tree_initialization() {
        let mut tree = BranchAndBound::new(SearchSettings::default());
        tree.initialize();

        let root = tree.next_node().unwrap();
        assert_eq!(root.id, 0);
        assert!(tree.next_node().is_none()); // Queue now empty
    }

    #[test]
    fn test_incumbent_update_prunes_queue() {
        let mut tree = BranchAndBound::new(SearchSettings::default());
        tree.initialize();
        let mut root = tree.next_node().unwrap();
        root.dual_bound = 10.0;

        let decision = BranchDecision {
            var: 0,
            down_branch: BoundChange::down_branch(0, 0.0, 0.5),
            up_branch: BoundChange::up_branch(0, 1.0, 0.5),
            score: 1.0,
        };
        let (down, up) = tree.branch(&root, decision);
        assert_eq!((down.id, up.id), (1, 2));
        tree.enqueue(down);
        tree.enqueue(up);

        // First incumbent above the children's bound keeps them
        assert!(tree.update_incumbent(&[1.0], 100.0));
        assert_eq!(tree.best_bound(), 10.0);

        // Worse solution rejected
        assert!(!tree.update_incumbent(&[2.0], 150.0));
        assert_eq!(tree.incumbent.obj_val, 100.0);

        // Better solution at the bound prunes both
        assert!(tree.update_incumbent(&[0.0], 10.0));
        assert!(tree.next_node().is_none());
        assert_eq!(tree.incumbent.update_count, 2);

        let sol = tree.finish(SearchStatus::Optimal);
        assert_eq!(sol.nodes_pruned, 2);
        assert_eq!(sol.x, vec![0.0]);
        assert_eq!(sol.bound, 10.0);
    }

    #[test]
    fn test_node_limit() {
        let mut tree = BranchAndBound::new(SearchSettings::default().with_max_nodes(1));
        tree.initialize();
        assert_eq!(tree.check_limits(), None);

        tree.next_node();
        tree.node_explored();
        assert_eq!(tree.check_limits(), Some(SearchStatus::NodeLimit));

        let sol = tree.finish(SearchStatus::NodeLimit);
        assert_eq!(sol.nodes_explored, 1);
        assert!(!sol.has_solution());
    }
}
