mod cache;
pub mod condition;
mod engine;
mod error;
mod evaluate;
mod functions;
pub mod parse;
#[cfg(feature = "binary-cache")]
pub mod serial;
mod transform;
mod types;

use std::sync::OnceLock;

pub use cache::{CacheStats, ExpressionCache, DEFAULT_CACHE_CAPACITY};
pub use engine::{CompiledExpression, Engine, EngineBuilder};
pub use error::EngineError;
pub use evaluate::{Evaluator, DEFAULT_MAX_DEPTH};
pub use functions::{Arity, FunctionImpl, FunctionRegistry};
pub use parse::{ParseError, ParseTree, TreeKind};
pub use transform::to_ast;
pub use types::{
    ArithmeticOp, CompareOp, EvaluationContext, EvaluationError, FunctionError, Node, Number,
    Quantifier, RangeValue, TransformError, TypeName, Value,
};

fn default_engine() -> &'static Engine {
    static ENGINE: OnceLock<Engine> = OnceLock::new();
    ENGINE.get_or_init(Engine::new)
}

/// Parse and transform `source` using a process-wide default [`Engine`].
///
/// # Errors
///
/// See [`Engine::parse_and_compile`].
pub fn parse_and_compile(source: &str) -> Result<CompiledExpression, EngineError> {
    default_engine().parse_and_compile(source)
}

/// Evaluate a compiled expression with the built-in function library.
///
/// # Errors
///
/// See [`Engine::evaluate`].
pub fn evaluate(
    expression: &CompiledExpression,
    context: &EvaluationContext,
) -> Result<Value, EngineError> {
    default_engine().evaluate(expression, context)
}
