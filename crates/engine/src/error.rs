//! Error types for evaluation and engine setup.

use routix_parser::RoutixError;
use thiserror::Error;

/// A failure while evaluating one expression.
///
/// Inside a workflow run these never escape: the rule engine records them in
/// the result's logs and treats the offending rule as not matching.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// The root of an identifier is not `case`, `agent`, or a parameter in scope.
    #[error("unbound name `{name}`")]
    UnboundName { name: String },

    /// A dot-path segment does not exist on the record (or value) it was applied to.
    #[error("missing field `{field}` in `{path}`")]
    MissingField { path: String, field: String },

    #[error("type mismatch in {operation}: expected {expected}, found {found}")]
    TypeMismatch {
        operation: String,
        expected: String,
        found: String,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("unknown function `{name}`")]
    UnknownFunction { name: String },

    #[error("function `{name}` expects {expected} argument(s), found {found}")]
    ArityMismatch {
        name: String,
        expected: String,
        found: usize,
    },

    #[error("recursion limit of {limit} exceeded calling `{name}`")]
    RecursionLimitExceeded { name: String, limit: usize },
}

impl EvalError {
    pub(crate) fn mismatch(
        operation: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        EvalError::TypeMismatch {
            operation: operation.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Failures outside of rule evaluation: loading configuration, looking up
/// workflows, or parsing text handed to the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid engine configuration: {0}")]
    Config(String),

    #[error("unknown workflow `{0}`")]
    UnknownWorkflow(String),

    #[error(transparent)]
    Parse(#[from] RoutixError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

pub type Result<T> = std::result::Result<T, EvalError>;
