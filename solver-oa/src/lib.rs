//! Lazy outer approximation of convex objective terms for mixed-integer search.
//!
//! A minimization model handed to a branch-and-cut host may carry convex,
//! nonlinear objective terms `f(x)` that the host cannot express. The
//! [`OuterApproximation`] engine replaces each term by an approximation
//! variable `t` with objective coefficient 1 and keeps `t >= f(x)` true where
//! it matters by adding tangent cuts
//!
//! ```text
//! t >= f(a) + ∇f(a)·(x - a)
//! ```
//!
//! at anchor points before the search and lazily at integer candidates
//! during it. The host's objective at a candidate is corrected to the true
//! one, and the best corrected candidate can be fed back to the host as a
//! heuristic solution.
//!
//! Hosts plug in through the [`HostModel`] and [`CallbackContext`] traits.
//! [`search::ReferenceModel`] is a small in-memory branch-and-bound that
//! implements them.
//!
//! # Example
//!
//! ```
//! use solver_oa::{ConvexTerm, Evaluator, Gradient, HostModel, OaSettings, OuterApproximation};
//! use solver_oa::search::ReferenceModel;
//! use solver_oa::settings::SearchSettings;
//!
//! // min (x - 1.4)^2 over integers 0..=3
//! let mut model = ReferenceModel::new(SearchSettings::default());
//! let x = model.add_integer("x", 0.0, 3.0, 0.0);
//! model.update().unwrap();
//!
//! let terms = vec![ConvexTerm::new(
//!     Evaluator::unary(|x| (x - 1.4) * (x - 1.4)),
//!     Gradient::unary(|x| vec![2.0 * (x - 1.4)]),
//!     vec![x],
//!     vec![vec![0.0]],
//! )
//! .unwrap()];
//!
//! let mut oa = OuterApproximation::new(model, &terms, OaSettings::default()).unwrap();
//! oa.optimize().unwrap();
//! assert!((oa.best_true_objective() - 0.16).abs() < 1e-9);
//! ```

#![warn(missing_docs)]

pub mod cuts;
pub mod engine;
pub mod error;
pub mod host;
pub mod model;
pub mod search;
pub mod settings;
pub mod term;

pub use engine::{ApproximationCallback, OaStats, OuterApproximation};
pub use error::{OaError, OaResult};
pub use host::{CallbackContext, CallbackReason, HostModel, SearchCallback, SearchStatus, VarId};
pub use settings::{OaSettings, TOLERANCE};
pub use term::{ConvexTerm, Evaluator, Gradient};
