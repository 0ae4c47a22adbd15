//! Capability interface of the mixed-integer search host.
//!
//! The engine never talks to a solver directly. Everything it needs from the
//! host (variables, constraints, the search loop and the per-invocation view
//! of a callback) goes through the traits in this module.

mod callback;
mod model;

pub use callback::{CallbackContext, CallbackReason, SearchCallback};
pub use model::{HostModel, SearchStatus, VarId};
