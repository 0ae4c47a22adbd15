//! Open node storage.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::SearchNode;
use crate::settings::NodeSelection;

struct Entry {
    node: SearchNode,
    /// Larger is popped first.
    key: f64,
    /// Push order; the newest entry wins equal keys.
    seq: u64,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .total_cmp(&other.key)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Open nodes, ordered by the configured [`NodeSelection`].
///
/// Under depth-first selection the newest of the deepest nodes comes out
/// first, so pushing the up child before the down child explores the lower
/// half of a split first.
pub struct NodeQueue {
    strategy: NodeSelection,
    heap: BinaryHeap<Entry>,
    pushed: u64,
    popped: u64,
}

impl NodeQueue {
    /// Empty queue.
    pub fn new(strategy: NodeSelection) -> Self {
        Self {
            strategy,
            heap: BinaryHeap::new(),
            pushed: 0,
            popped: 0,
        }
    }

    /// Queue `node`.
    pub fn push(&mut self, node: SearchNode) {
        let key = self.key(&node);
        let seq = self.pushed;
        self.pushed += 1;
        self.heap.push(Entry { node, key, seq });
    }

    /// Take the next node to search.
    pub fn pop(&mut self) -> Option<SearchNode> {
        let entry = self.heap.pop()?;
        self.popped += 1;
        Some(entry.node)
    }

    /// Lowest parent bound among open nodes, +inf when empty.
    pub fn best_bound(&self) -> f64 {
        self.heap
            .iter()
            .map(|e| e.node.dual_bound)
            .fold(f64::INFINITY, f64::min)
    }

    /// Drop nodes that cannot beat `incumbent_obj`. Returns how many.
    pub fn prune_by_bound(&mut self, incumbent_obj: f64) -> usize {
        let before = self.heap.len();
        self.heap.retain(|e| !e.node.can_prune(incumbent_obj));
        before - self.heap.len()
    }

    /// Number of open nodes.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    fn key(&self, node: &SearchNode) -> f64 {
        match self.strategy {
            NodeSelection::BestBound => -node.dual_bound,
            NodeSelection::DepthFirst => node.depth as f64,
            NodeSelection::Hybrid { dive_freq } => {
                if self.popped % dive_freq.max(1) as u64 == 0 {
                    node.depth as f64
                } else {
                    -node.dual_bound
                }
            }
        }
    }
}
