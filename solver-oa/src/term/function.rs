//! Objective and gradient callables.
//!
//! Closures passed through `unary`, `binary` or `ternary` carry their arity
//! in their signature; slice closures declare it explicitly with `vector`.
//! An [`ObjectiveFunction`] pairs the two and refuses pairs whose arities
//! disagree, which catches a gradient written for the wrong function.

use std::fmt;

use crate::error::{OaError, OaResult};

type ValueFn = Box<dyn Fn(&[f64]) -> f64 + Send + Sync>;
type GradientFn = Box<dyn Fn(&[f64]) -> Vec<f64> + Send + Sync>;

/// A convex function of a fixed number of arguments with a gradient.
///
/// Implement this directly for representations other than closure pairs
/// (symbolic expressions, automatic differentiation, ...).
pub trait ConvexFunction {
    /// Number of arguments.
    fn arity(&self) -> usize;

    /// Function value at `x` (`x.len() == arity()`).
    fn value(&self, x: &[f64]) -> f64;

    /// Partial derivatives at `x`, one per argument.
    fn gradient(&self, x: &[f64]) -> Vec<f64>;
}

/// Objective callable with a declared arity.
pub struct Evaluator {
    arity: usize,
    f: ValueFn,
}

impl Evaluator {
    /// Wrap a one-argument function.
    pub fn unary(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        Self::vector(1, move |x| f(x[0]))
    }

    /// Wrap a two-argument function.
    pub fn binary(f: impl Fn(f64, f64) -> f64 + Send + Sync + 'static) -> Self {
        Self::vector(2, move |x| f(x[0], x[1]))
    }

    /// Wrap a three-argument function.
    pub fn ternary(f: impl Fn(f64, f64, f64) -> f64 + Send + Sync + 'static) -> Self {
        Self::vector(3, move |x| f(x[0], x[1], x[2]))
    }

    /// Wrap a function of `arity` arguments passed as a slice.
    pub fn vector(arity: usize, f: impl Fn(&[f64]) -> f64 + Send + Sync + 'static) -> Self {
        Self {
            arity,
            f: Box::new(f),
        }
    }

    /// Declared number of arguments.
    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evaluator").field("arity", &self.arity).finish()
    }
}

/// Gradient callable with a declared arity.
pub struct Gradient {
    arity: usize,
    f: GradientFn,
}

impl Gradient {
    /// Wrap the gradient of a one-argument function.
    pub fn unary(f: impl Fn(f64) -> Vec<f64> + Send + Sync + 'static) -> Self {
        Self::vector(1, move |x| f(x[0]))
    }

    /// Wrap the gradient of a two-argument function.
    pub fn binary(f: impl Fn(f64, f64) -> Vec<f64> + Send + Sync + 'static) -> Self {
        Self::vector(2, move |x| f(x[0], x[1]))
    }

    /// Wrap the gradient of a three-argument function.
    pub fn ternary(f: impl Fn(f64, f64, f64) -> Vec<f64> + Send + Sync + 'static) -> Self {
        Self::vector(3, move |x| f(x[0], x[1], x[2]))
    }

    /// Wrap a gradient of `arity` arguments passed as a slice.
    pub fn vector(arity: usize, f: impl Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static) -> Self {
        Self {
            arity,
            f: Box::new(f),
        }
    }

    /// Declared number of arguments.
    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl fmt::Debug for Gradient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gradient").field("arity", &self.arity).finish()
    }
}

/// An objective callable together with its gradient.
#[derive(Debug)]
pub struct ObjectiveFunction {
    objective: Evaluator,
    gradient: Gradient,
}

impl ObjectiveFunction {
    /// Pair an objective with its gradient.
    ///
    /// Fails with [`OaError::ArityMismatch`] if they take different numbers
    /// of arguments. Whether `gradient` is really the gradient of
    /// `objective` is not checked.
    pub fn new(objective: Evaluator, gradient: Gradient) -> OaResult<Self> {
        if objective.arity() != gradient.arity() {
            return Err(OaError::ArityMismatch {
                objective: objective.arity(),
                gradient: gradient.arity(),
            });
        }
        Ok(Self {
            objective,
            gradient,
        })
    }
}

impl ConvexFunction for ObjectiveFunction {
    fn arity(&self) -> usize {
        self.objective.arity
    }

    fn value(&self, x: &[f64]) -> f64 {
        (self.objective.f)(x)
    }

    fn gradient(&self, x: &[f64]) -> Vec<f64> {
        (self.gradient.f)(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_arity_accepted() {
        let f = ObjectiveFunction::new(
            Evaluator::binary(|x, y| x + y),
            Gradient::binary(|_, _| vec![1.0, 1.0]),
        )
        .unwrap();

        assert_eq!(f.arity(), 2);
        assert_eq!(f.value(&[2.0, 3.0]), 5.0);
        assert_eq!(f.gradient(&[2.0, 3.0]), vec![1.0, 1.0]);
    }

    #[test]
    fn test_mismatched_arity_rejected() {
        let err = ObjectiveFunction::new(
            Evaluator::binary(|x, y| x + y),
            Gradient::unary(|_| vec![1.0, 1.0]),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            OaError::ArityMismatch {
                objective: 2,
                gradient: 1
            }
        ));
    }

    #[test]
    fn test_vector_arity_compared_with_fixed() {
        // Slice closures declare arity; it still has to agree.
        assert!(ObjectiveFunction::new(
            Evaluator::vector(3, |x| x.iter().map(|v| v * v).sum()),
            Gradient::ternary(|a, b, c| vec![2.0 * a, 2.0 * b, 2.0 * c]),
        )
        .is_ok());

        assert!(ObjectiveFunction::new(
            Evaluator::vector(4, |x| x.iter().sum()),
            Gradient::ternary(|_, _, _| vec![1.0; 3]),
        )
        .is_err());
    }
}
