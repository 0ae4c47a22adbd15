//! In-memory reference host.
//!
//! A small branch-and-bound over bounded integer variables that implements
//! the full [`HostModel`](crate::host::HostModel) callback contract. Node
//! relaxations are interval (box) relaxations; the continuous part of the
//! model must be separable, i.e. every row holds at most one continuous
//! variable, which makes leaves exact.

mod branching;
mod context;
mod model;
mod node;
mod queue;
mod relaxation;
mod solution;
mod tree;

pub use branching::BranchDecision;
pub use model::{ReferenceModel, Row, Sense, VarType, Variable};
pub use node::{BoundChange, SearchNode};
pub use queue::NodeQueue;
pub use relaxation::{Relaxation, RelaxationStatus};
pub use solution::SearchSolution;
pub use tree::BranchAndBound;
