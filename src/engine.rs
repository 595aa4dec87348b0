use std::fmt;
use std::sync::Arc;

use crate::cache::{CacheStats, ExpressionCache, DEFAULT_CACHE_CAPACITY};
use crate::error::EngineError;
use crate::evaluate::{Evaluator, DEFAULT_MAX_DEPTH};
use crate::functions::{Arity, FunctionRegistry};
use crate::parse::parse;
#[cfg(feature = "binary-cache")]
use crate::serial::DeserializeError;
use crate::transform::to_ast;
use crate::{EvaluationContext, Node, Value};

/// A parsed and transformed expression, ready to evaluate any number of
/// times. Cheap to clone; the AST is shared.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    source: Arc<str>,
    ast: Arc<Node>,
}

impl CompiledExpression {
    pub(crate) fn new(source: &str, ast: Arc<Node>) -> Self {
        Self {
            source: Arc::from(source),
            ast,
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn ast(&self) -> &Node {
        &self.ast
    }
}

#[cfg(feature = "binary-cache")]
impl CompiledExpression {
    /// Serialize to the crate's binary format.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self)
    }

    /// Restore an expression written by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) for bad
    /// magic, a version mismatch, a checksum or digest failure, or a
    /// malformed payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }
}

impl fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse and transform `source` without touching any cache.
pub(crate) fn compile(source: &str) -> Result<Node, EngineError> {
    let tree = parse(source)?;
    Ok(to_ast(&tree)?)
}

/// Builder for configuring an [`Engine`].
///
/// # Example
///
/// ```
/// use feelin::{Arity, Engine, EvaluationContext, Value};
///
/// let engine = Engine::builder()
///     .cache_capacity(128)
///     .function(&["double"], Arity::Exact(1), |args, _| match &args[0] {
///         Value::Number(n) => Ok(Value::Number(n.mul(2_i64.into()))),
///         other => Err(format!("expected a number, found {}", other.kind())),
///     })
///     .build();
///
/// let value = engine
///     .evaluate_str("double(21)", &EvaluationContext::new())
///     .unwrap();
/// assert_eq!(value, Value::from(42_i64));
/// ```
#[derive(Debug)]
pub struct EngineBuilder {
    cache: bool,
    cache_capacity: usize,
    max_depth: usize,
    registry: FunctionRegistry,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            cache: true,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_depth: DEFAULT_MAX_DEPTH,
            registry: FunctionRegistry::with_builtins(),
        }
    }
}

impl EngineBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the expression cache. Enabled by default.
    #[must_use]
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    #[must_use]
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Maximum AST nesting depth evaluation will descend into.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Register an extra function, or replace a built-in of the same name.
    #[must_use]
    pub fn function<F>(mut self, names: &[&str], arity: Arity, f: F) -> Self
    where
        F: Fn(&[Value], &EvaluationContext) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.registry.register(names, arity, f);
        self
    }

    /// Replace the whole function table.
    #[must_use]
    pub fn registry(mut self, registry: FunctionRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn build(self) -> Engine {
        Engine {
            cache: self
                .cache
                .then(|| ExpressionCache::with_capacity(self.cache_capacity)),
            max_depth: self.max_depth,
            registry: self.registry,
        }
    }
}

/// Parses, caches and evaluates FEEL expressions.
///
/// Thread-safe and designed to live behind `Arc`: the only shared mutable
/// state is the expression cache.
#[derive(Debug)]
pub struct Engine {
    registry: FunctionRegistry,
    cache: Option<ExpressionCache>,
    max_depth: usize,
}

impl Default for Engine {
    fn default() -> Self {
        EngineBuilder::default().build()
    }
}

impl Engine {
    /// An engine with the built-in function library and default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Parse and transform `source`, consulting the cache first.
    ///
    /// # Errors
    ///
    /// [`EngineError::Parse`] for malformed source and
    /// [`EngineError::Transform`] for constructs the AST cannot represent.
    pub fn parse_and_compile(&self, source: &str) -> Result<CompiledExpression, EngineError> {
        let ast = match &self.cache {
            Some(cache) => cache.get_or_compile(source, compile)?,
            None => Arc::new(compile(source)?),
        };
        Ok(CompiledExpression::new(source, ast))
    }

    /// Evaluate a compiled expression against `context`.
    ///
    /// # Errors
    ///
    /// [`EngineError::Evaluation`] for runtime failures and
    /// [`EngineError::Function`] when a function call fails.
    pub fn evaluate(
        &self,
        expression: &CompiledExpression,
        context: &EvaluationContext,
    ) -> Result<Value, EngineError> {
        Ok(self.evaluator().evaluate(expression.ast(), context)?)
    }

    /// Compile (through the cache) and evaluate in one step.
    ///
    /// # Errors
    ///
    /// Any error from [`parse_and_compile`](Self::parse_and_compile) or
    /// [`evaluate`](Self::evaluate).
    pub fn evaluate_str(
        &self,
        source: &str,
        context: &EvaluationContext,
    ) -> Result<Value, EngineError> {
        let expression = self.parse_and_compile(source)?;
        self.evaluate(&expression, context)
    }

    /// Restore a serialized expression and seed the cache with it.
    ///
    /// The stored source is recompiled first; the blob is accepted only if it
    /// yields the stored AST, so the cache never holds an AST its key does
    /// not compile to. Use [`CompiledExpression::from_bytes`] to skip that
    /// check for blobs from a trusted store.
    ///
    /// # Errors
    ///
    /// [`EngineError::Deserialize`] if the bytes are not a valid encoding, or
    /// with [`DeserializeError::Validation`] if the source does not compile
    /// to the stored AST.
    #[cfg(feature = "binary-cache")]
    pub fn load(&self, bytes: &[u8]) -> Result<CompiledExpression, EngineError> {
        let expression = CompiledExpression::from_bytes(bytes)?;
        let recompiled = compile(expression.source()).map_err(|err| {
            DeserializeError::Validation(format!("stored source does not compile: {err}"))
        })?;
        if recompiled != *expression.ast() {
            return Err(DeserializeError::Validation(
                "stored AST does not match its source".to_owned(),
            )
            .into());
        }
        if let Some(cache) = &self.cache {
            cache.insert(expression.source(), Arc::clone(&expression.ast));
        }
        Ok(expression)
    }

    #[must_use]
    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(&self.registry).with_max_depth(self.max_depth)
    }

    #[must_use]
    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Counters for the expression cache, or `None` when caching is disabled.
    #[must_use]
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(ExpressionCache::stats)
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }
}
