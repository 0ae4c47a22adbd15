//! Convex objective terms handed to the engine.

mod convex;
mod function;

pub use convex::ConvexTerm;
pub use function::{ConvexFunction, Evaluator, Gradient, ObjectiveFunction};
