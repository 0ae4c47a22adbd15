//! Association between convex terms and their approximation variables.

use crate::host::VarId;
use crate::term::ConvexTerm;

/// Approximation variables, parallel to the borrowed term slice.
///
/// Terms are identified by position, never by value, so two equal terms
/// still get separate variables.
#[derive(Debug, Clone)]
pub struct ApproximationState<'t> {
    terms: &'t [ConvexTerm],
    vars: Vec<VarId>,
}

impl<'t> ApproximationState<'t> {
    /// Pair `terms[i]` with `vars[i]`. Both come from engine construction,
    /// which creates exactly one variable per term.
    pub(crate) fn new(terms: &'t [ConvexTerm], vars: Vec<VarId>) -> Self {
        assert_eq!(terms.len(), vars.len(), "one approximation variable per term");
        Self { terms, vars }
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Check if there are no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The terms.
    pub fn terms(&self) -> &'t [ConvexTerm] {
        self.terms
    }

    /// Approximation variables in term order.
    pub fn vars(&self) -> &[VarId] {
        &self.vars
    }

    /// Approximation variable of term `index`.
    pub fn var(&self, index: usize) -> Option<VarId> {
        self.vars.get(index).copied()
    }

    /// Iterate over `(index, term, approximation variable)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &'t ConvexTerm, VarId)> + '_ {
        let terms = self.terms;
        terms
            .iter()
            .zip(self.vars.iter().copied())
            .enumerate()
            .map(|(i, (term, var))| (i, term, var))
    }
}
