//! Sparse linear cuts.

use std::collections::BTreeMap;

use sprs::CsVec;

use crate::error::{OaError, OaResult};
use crate::host::VarId;

/// Source of a cut (for tracking and debugging).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutSource {
    /// Permanent cut seeded at a caller-supplied anchor before search.
    Starting {
        /// Term index.
        term: usize,
        /// Anchor index within the term.
        anchor: usize,
    },

    /// Lazy cut at the root relaxation point.
    WarmStart {
        /// Term index.
        term: usize,
    },

    /// Lazy cut at an integer-feasible candidate.
    Lazy {
        /// Term index.
        term: usize,
    },

    /// Model row supplied by the user.
    User,
}

/// A linear cut: a^T x <= rhs, with `a` stored sparsely.
#[derive(Debug, Clone)]
pub struct LinearCut {
    /// Coefficient vector indexed by variable column.
    pub coefs: CsVec<f64>,

    /// Right-hand side.
    pub rhs: f64,

    /// Source of this cut.
    pub source: CutSource,
}

impl LinearCut {
    /// Create a cut over `dim` columns from `(variable, coefficient)` pairs.
    ///
    /// Repeated variables are summed and zero coefficients dropped.
    pub fn new(dim: usize, terms: &[(VarId, f64)], rhs: f64, source: CutSource) -> OaResult<Self> {
        let mut merged: BTreeMap<usize, f64> = BTreeMap::new();
        for &(var, coef) in terms {
            if var.index() >= dim {
                return Err(OaError::CutGeneration(format!(
                    "{} out of range for {} columns",
                    var, dim
                )));
            }
            *merged.entry(var.index()).or_insert(0.0) += coef;
        }

        let (indices, data): (Vec<usize>, Vec<f64>) =
            merged.into_iter().filter(|&(_, c)| c != 0.0).unzip();
        let coefs = CsVec::try_new(dim, indices, data)
            .map_err(|(_, _, e)| OaError::CutGeneration(format!("{:?}", e)))?;

        Ok(Self {
            coefs,
            rhs,
            source,
        })
    }

    /// Coefficient of `var` (zero if absent).
    pub fn coef(&self, var: VarId) -> f64 {
        self.coefs.get(var.index()).copied().unwrap_or(0.0)
    }

    /// Check if cut has valid coefficients (not all zeros, finite).
    pub fn is_valid(&self) -> bool {
        let has_nonzero = self.coefs.data().iter().any(|c| c.abs() > 1e-12);
        let all_finite = self.coefs.data().iter().all(|c| c.is_finite()) && self.rhs.is_finite();
        has_nonzero && all_finite
    }
}
