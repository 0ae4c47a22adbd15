//! Tangent cut generation.
//!
//! For a convex term f over variables x with approximation variable t, the
//! tangent hyperplane at anchor a under-estimates f everywhere:
//!
//! ```text
//! t >= f(a) + grad f(a)^T (x - a)
//! ```
//!
//! Rearranged into the host's `a^T x <= rhs` shape:
//!
//! ```text
//! -t + grad f(a)^T x <= grad f(a)^T a - f(a)
//! ```

use crate::error::OaResult;
use crate::host::VarId;
use crate::term::ConvexTerm;

use super::{CutSource, LinearCut};

/// Build the tangent cut of `term` at `point`.
///
/// `value` is `f(point)` when the caller already evaluated it; otherwise the
/// term is evaluated here. `dim` is the number of model columns.
pub fn tangent_cut(
    term_index: usize,
    term: &ConvexTerm,
    approx: VarId,
    point: &[f64],
    value: Option<f64>,
    dim: usize,
    source: CutSource,
) -> OaResult<LinearCut> {
    let value = match value {
        Some(v) => v,
        None => term.checked_value(term_index, point)?,
    };
    let grad = term.checked_gradient(term_index, point)?;

    let mut coefs = Vec::with_capacity(term.arity() + 1);
    coefs.push((approx, -1.0));
    let mut rhs = -value;
    for ((&var, &g), &a) in term.variables().iter().zip(&grad).zip(point) {
        coefs.push((var, g));
        rhs += g * a;
    }

    LinearCut::new(dim, &coefs, rhs, source)
}

/// Build the tangent cut of `term` at `point` and hand it to `register`.
///
/// `register` decides how the cut enters the host (permanent constraint
/// before search, lazy constraint during search); the cut itself is the same.
#[allow(clippy::too_many_arguments)]
pub fn emit_tangent_cut<F>(
    term_index: usize,
    term: &ConvexTerm,
    approx: VarId,
    point: &[f64],
    value: Option<f64>,
    dim: usize,
    source: CutSource,
    register: F,
) -> OaResult<()>
where
    F: FnOnce(&LinearCut) -> OaResult<()>,
{
    let cut = tangent_cut(term_index, term, approx, point, value, dim, source)?;
    log::debug!(
        "{:?} cut for term {} at {:?}: {} nonzeros, rhs {:.6e}",
        source,
        term_index,
        point,
        cut.coefs.nnz(),
        cut.rhs
    );
    register(&cut)
}
