//! Error types for the outer approximation engine.

use thiserror::Error;

use crate::host::CallbackReason;

/// Errors that can occur while building terms, emitting cuts or searching.
#[derive(Error, Debug)]
pub enum OaError {
    /// Objective and gradient callables declare different argument counts.
    #[error("Objective takes {objective} arguments but gradient takes {gradient}")]
    ArityMismatch {
        /// Arity of the objective callable.
        objective: usize,
        /// Arity of the gradient callable.
        gradient: usize,
    },

    /// Variable list does not match the function's arity.
    #[error("Function takes {arity} arguments but {variables} variables were given")]
    VariableCountMismatch {
        /// Arity of the function.
        arity: usize,
        /// Number of variables supplied.
        variables: usize,
    },

    /// Anchor point has the wrong length.
    #[error("Anchor {anchor} has {got} values, expected {expected}")]
    AnchorLength {
        /// Index of the anchor within the term.
        anchor: usize,
        /// Expected length (the term's arity).
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// A convex term returned an unusable value or gradient.
    #[error("Term {term} evaluation failed: {message}")]
    Evaluation {
        /// Index of the term in the engine.
        term: usize,
        /// What went wrong.
        message: String,
    },

    /// Value accessor dispatch received a reason it cannot serve.
    #[error("No value accessor for callback reason {0:?}")]
    UnsupportedCallbackReason(CallbackReason),

    /// The host rejected an operation.
    #[error("Host rejected operation: {0}")]
    Host(String),

    /// Model validation failed.
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// Sparse cut structure could not be built.
    #[error("Cut generation failed: {0}")]
    CutGeneration(String),

    /// A result was requested before any search finished.
    #[error("Model has not been solved")]
    NotSolved,

    /// The search was aborted because the callback failed.
    #[error("Search aborted by callback: {source}")]
    CallbackAborted {
        /// The callback's error.
        #[source]
        source: Box<OaError>,
    },

    /// Lazy cuts kept arriving at the same node or leaf.
    #[error("Cut loop did not settle after {rounds} rounds")]
    CutLoopLimit {
        /// Rounds performed.
        rounds: usize,
    },
}

/// Result type for outer approximation operations.
pub type OaResult<T> = Result<T, OaError>;
