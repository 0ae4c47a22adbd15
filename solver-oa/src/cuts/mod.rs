//! Cut generation for convex outer approximation.
//!
//! This module provides:
//! - Sparse linear cuts `a^T x <= rhs` shared with the host
//! - Tangent (gradient linearization) cuts of convex terms

mod linear;
mod tangent;

pub use linear::{CutSource, LinearCut};
pub use tangent::{emit_tangent_cut, tangent_cut};
