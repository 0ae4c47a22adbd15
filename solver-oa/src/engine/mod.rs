//! Lazy outer approximation engine.
//!
//! The engine adds one approximation variable per convex term to the host
//! model, seeds tangent cuts at the terms' anchors, and then answers the
//! host's search callbacks: tangent cuts where a candidate underestimates a
//! term, and a repaired incumbent suggestion where the host's own incumbent
//! lags behind the true objective.

mod callback;
mod outer;
mod state;

pub use callback::{ApproximationCallback, OaStats};
pub use outer::OuterApproximation;
pub use state::ApproximationState;
