//! Convex objective term over a subset of the model variables.

use std::fmt;
use std::sync::Arc;

use crate::error::{OaError, OaResult};
use crate::host::VarId;

use super::{ConvexFunction, Evaluator, Gradient, ObjectiveFunction};

/// A convex function of some model variables, added to a minimization objective.
///
/// Immutable once built. `anchors` are points (ordered like `variables`) at
/// which the engine seeds a permanent tangent cut before the search starts.
#[derive(Clone)]
pub struct ConvexTerm {
    function: Arc<dyn ConvexFunction + Send + Sync>,
    variables: Vec<VarId>,
    anchors: Vec<Vec<f64>>,
}

impl ConvexTerm {
    /// Build a term from an objective closure and its gradient.
    ///
    /// Fails with [`OaError::ArityMismatch`] when the two callables take a
    /// different number of arguments.
    pub fn new(
        evaluate: Evaluator,
        gradient: Gradient,
        variables: Vec<VarId>,
        anchors: Vec<Vec<f64>>,
    ) -> OaResult<Self> {
        let function = ObjectiveFunction::new(evaluate, gradient)?;
        Self::with_function(function, variables, anchors)
    }

    /// Build a term from any [`ConvexFunction`].
    pub fn with_function(
        function: impl ConvexFunction + Send + Sync + 'static,
        variables: Vec<VarId>,
        anchors: Vec<Vec<f64>>,
    ) -> OaResult<Self> {
        let arity = function.arity();
        if variables.len() != arity {
            return Err(OaError::VariableCountMismatch {
                arity,
                variables: variables.len(),
            });
        }
        for (anchor, point) in anchors.iter().enumerate() {
            if point.len() != arity {
                return Err(OaError::AnchorLength {
                    anchor,
                    expected: arity,
                    got: point.len(),
                });
            }
        }

        Ok(Self {
            function: Arc::new(function),
            variables,
            anchors,
        })
    }

    /// Number of variables the term depends on.
    pub fn arity(&self) -> usize {
        self.variables.len()
    }

    /// Variables in argument order.
    pub fn variables(&self) -> &[VarId] {
        &self.variables
    }

    /// Starting-cut anchors.
    pub fn anchors(&self) -> &[Vec<f64>] {
        &self.anchors
    }

    /// Raw function value at `x`.
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        self.function.value(x)
    }

    /// Raw gradient at `x`.
    pub fn gradient(&self, x: &[f64]) -> Vec<f64> {
        self.function.gradient(x)
    }

    /// Function value at `x`, rejecting non-finite results.
    ///
    /// `term` is the term's index in the engine, used for diagnostics.
    pub fn checked_value(&self, term: usize, x: &[f64]) -> OaResult<f64> {
        self.check_point(term, x)?;
        let value = self.function.value(x);
        if !value.is_finite() {
            return Err(OaError::Evaluation {
                term,
                message: format!("value {} at {:?}", value, x),
            });
        }
        Ok(value)
    }

    /// Gradient at `x`, rejecting wrong lengths and non-finite entries.
    pub fn checked_gradient(&self, term: usize, x: &[f64]) -> OaResult<Vec<f64>> {
        self.check_point(term, x)?;
        let grad = self.function.gradient(x);
        if grad.len() != self.arity() {
            return Err(OaError::Evaluation {
                term,
                message: format!(
                    "gradient has {} entries, expected {}",
                    grad.len(),
                    self.arity()
                ),
            });
        }
        if let Some(bad) = grad.iter().find(|g| !g.is_finite()) {
            return Err(OaError::Evaluation {
                term,
                message: format!("gradient entry {} at {:?}", bad, x),
            });
        }
        Ok(grad)
    }

    fn check_point(&self, term: usize, x: &[f64]) -> OaResult<()> {
        if x.len() != self.arity() {
            return Err(OaError::Evaluation {
                term,
                message: format!("point has {} values, expected {}", x.len(), self.arity()),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for ConvexTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvexTerm")
            .field("variables", &self.variables)
            .field("anchors", &self.anchors)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(var: usize, anchors: Vec<Vec<f64>>) -> OaResult<ConvexTerm> {
        ConvexTerm::new(
            Evaluator::unary(|x| x * x),
            Gradient::unary(|x| vec![2.0 * x]),
            vec![VarId(var)],
            anchors,
        )
    }

    #[test]
    fn test_term_creation() {
        let term = square(3, vec![vec![1.0], vec![-2.0]]).unwrap();

        assert_eq!(term.arity(), 1);
        assert_eq!(term.variables(), &[VarId(3)]);
        assert_eq!(term.anchors().len(), 2);
        assert_eq!(term.evaluate(&[3.0]), 9.0);
        assert_eq!(term.gradient(&[3.0]), vec![6.0]);
    }

    #[test]
    fn test_arity_mismatch() {
        let err = ConvexTerm::new(
            Evaluator::binary(|x, y| x + y),
            Gradient::unary(|_| vec![1.0, 1.0]),
            vec![VarId(0), VarId(1)],
            vec![],
        )
        .unwrap_err();

        assert!(matches!(err, OaError::ArityMismatch { .. }));
    }

    #[test]
    fn test_variable_count_checked() {
        let err = ConvexTerm::new(
            Evaluator::unary(|x| x * x),
            Gradient::unary(|x| vec![2.0 * x]),
            vec![VarId(0), VarId(1)],
            vec![],
        )
        .unwrap_err();

        assert!(matches!(
            err,
            OaError::VariableCountMismatch {
                arity: 1,
                variables: 2
            }
        ));
    }

    #[test]
    fn test_anchor_length_checked() {
        let err = square(0, vec![vec![1.0], vec![1.0, 2.0]]).unwrap_err();
        assert!(matches!(
            err,
            OaError::AnchorLength {
                anchor: 1,
                expected: 1,
                got: 2
            }
        ));
    }

    #[test]
    fn test_checked_evaluation() {
        let log = ConvexTerm::new(
            Evaluator::unary(|x: f64| -x.ln()),
            Gradient::unary(|x| vec![-1.0 / x]),
            vec![VarId(0)],
            vec![],
        )
        .unwrap();

        assert!(log.checked_value(7, &[1.0]).is_ok());

        // -ln(0) = +inf
        match log.checked_value(7, &[0.0]) {
            Err(OaError::Evaluation { term, .. }) => assert_eq!(term, 7),
            other => panic!("expected evaluation error, got {:?}", other),
        }
        assert!(log.checked_gradient(7, &[0.0]).is_err());
        assert!(log.checked_value(7, &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_gradient_length_checked() {
        let term = ConvexTerm::new(
            Evaluator::unary(|x| x * x),
            Gradient::unary(|x| vec![2.0 * x, 0.0]),
            vec![VarId(0)],
            vec![],
        )
        .unwrap();

        assert!(term.checked_gradient(0, &[1.0]).is_err());
    }
}
