use thiserror::Error;

use crate::functions::Arity;

use super::Value;

/// A parse tree shape the transformer cannot turn into an AST node.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("malformed {kind} node: {detail} in {tree}")]
    Malformed {
        kind: &'static str,
        detail: String,
        tree: String,
    },

    #[error("invalid literal {text}: {detail}")]
    InvalidLiteral { text: String, detail: String },

    #[error("unsupported construct: {detail}")]
    Unsupported { detail: String },
}

/// A failure raised by, or on the way into, a built-in function.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunctionError {
    #[error("unknown function '{function_name}'")]
    Unknown {
        function_name: String,
        arguments: Vec<Value>,
    },

    #[error(
        "function '{function_name}' expects {expected} argument(s), got {}",
        arguments.len()
    )]
    Arity {
        function_name: String,
        expected: Arity,
        arguments: Vec<Value>,
    },

    #[error("function '{function_name}': {detail}")]
    InvalidArgument {
        function_name: String,
        detail: String,
        arguments: Vec<Value>,
    },
}

impl FunctionError {
    #[must_use]
    pub fn function_name(&self) -> &str {
        match self {
            FunctionError::Unknown { function_name, .. }
            | FunctionError::Arity { function_name, .. }
            | FunctionError::InvalidArgument { function_name, .. } => function_name,
        }
    }

    #[must_use]
    pub fn arguments(&self) -> &[Value] {
        match self {
            FunctionError::Unknown { arguments, .. }
            | FunctionError::Arity { arguments, .. }
            | FunctionError::InvalidArgument { arguments, .. } => arguments,
        }
    }
}

/// A runtime failure. Every variant names the AST node tag that raised it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("{node}: expected {expected}, found {found}")]
    TypeMismatch {
        node: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{node}: cannot order {left} against {right}")]
    Incomparable {
        node: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("{node}: division by zero")]
    DivisionByZero { node: &'static str },

    #[error("{node}: {detail}")]
    InvalidOperation { node: &'static str, detail: String },

    #[error("{node}: expected boolean, found {found}")]
    NotBoolean {
        node: &'static str,
        found: &'static str,
    },

    #[error("{node}: evaluation depth limit of {limit} exceeded")]
    DepthExceeded { node: &'static str, limit: usize },

    #[error("{node}: {source}")]
    Function {
        node: &'static str,
        source: FunctionError,
    },
}

impl EvaluationError {
    /// Tag of the AST node whose evaluation failed.
    #[must_use]
    pub fn node(&self) -> &'static str {
        match self {
            EvaluationError::TypeMismatch { node, .. }
            | EvaluationError::Incomparable { node, .. }
            | EvaluationError::DivisionByZero { node }
            | EvaluationError::InvalidOperation { node, .. }
            | EvaluationError::NotBoolean { node, .. }
            | EvaluationError::DepthExceeded { node, .. }
            | EvaluationError::Function { node, .. } => node,
        }
    }
}
