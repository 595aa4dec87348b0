use thiserror::Error;

use crate::parse::ParseError;
use crate::{EvaluationError, FunctionError, TransformError};

/// Unified error type covering every stage of the pipeline.
///
/// Returned by [`Engine`](crate::Engine) and the crate-level
/// [`parse_and_compile`](crate::parse_and_compile) / [`evaluate`](crate::evaluate)
/// entry points. Function failures raised during evaluation surface as
/// [`EngineError::Function`] rather than as a wrapped evaluation error.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Evaluation(EvaluationError),

    #[error(transparent)]
    Function(#[from] FunctionError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}

impl From<EvaluationError> for EngineError {
    fn from(err: EvaluationError) -> Self {
        match err {
            EvaluationError::Function { source, .. } => EngineError::Function(source),
            other => EngineError::Evaluation(other),
        }
    }
}

impl EngineError {
    /// True for failures raised before evaluation: the source could not be
    /// parsed or transformed into an AST.
    #[must_use]
    pub fn is_compile_error(&self) -> bool {
        matches!(self, EngineError::Parse(_) | EngineError::Transform(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_failures_are_unwrapped() {
        let inner = FunctionError::Unknown {
            function_name: "nope".into(),
            arguments: vec![],
        };
        let err = EngineError::from(EvaluationError::Function {
            node: "function call",
            source: inner.clone(),
        });
        assert!(matches!(err, EngineError::Function(ref f) if *f == inner));
        assert_eq!(err.to_string(), "unknown function 'nope'");
    }

    #[test]
    fn other_evaluation_errors_pass_through() {
        let err = EngineError::from(EvaluationError::DivisionByZero { node: "arithmetic" });
        assert!(matches!(err, EngineError::Evaluation(_)));
        assert!(!err.is_compile_error());
    }
}
