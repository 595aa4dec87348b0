//! `{operator, value}` projection of single-cell decision table conditions.
//!
//! Older rule formats describe a condition as an operator plus an operand
//! rather than a full expression. [`project`] serves that view by running the
//! full engine pipeline and reading the operator off the AST shape;
//! [`interpret`] additionally degrades to the lossy [`heuristic`] matcher when
//! the text is not valid FEEL at all.

pub mod heuristic;

use std::fmt;

use thiserror::Error;
use tracing::debug;

pub use heuristic::HeuristicError;

use crate::error::EngineError;
use crate::{CompareOp, Engine, EvaluationContext, EvaluationError, Node, Value};

/// Condition operator as understood by the rule adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
    In,
    NotIn,
}

impl Operator {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Neq => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Between => "between",
            Operator::In => "in",
            Operator::NotIn => "not_in",
        }
    }
}

impl From<CompareOp> for Operator {
    fn from(op: CompareOp) -> Self {
        match op {
            CompareOp::Eq => Operator::Eq,
            CompareOp::Neq => Operator::Neq,
            CompareOp::Gt => Operator::Gt,
            CompareOp::Gte => Operator::Gte,
            CompareOp::Lt => Operator::Lt,
            CompareOp::Lte => Operator::Lte,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operator applied to the (implicit) input value.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub operator: Operator,
    pub value: Value,
}

impl Condition {
    #[must_use]
    pub fn new(operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            operator,
            value: value.into(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operator, self.value)
    }
}

/// Failure of [`interpret`]: either the full engine rejected the condition at
/// evaluation time, or it could not be parsed and the heuristic tier could
/// not make sense of it either.
#[derive(Debug, Error)]
pub enum ConditionError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Heuristic(#[from] HeuristicError),
}

// Two-character operators first so `>=` is not read as `>`.
const UNARY_PREFIXES: [(&str, CompareOp); 6] = [
    (">=", CompareOp::Gte),
    ("<=", CompareOp::Lte),
    ("!=", CompareOp::Neq),
    (">", CompareOp::Gt),
    ("<", CompareOp::Lt),
    ("=", CompareOp::Eq),
];

/// Project a condition cell onto an `{operator, value}` pair using the full
/// parser and evaluator.
///
/// Accepts unary tests (`< 5`, `!= "a"`), comparisons and `between`/`in`
/// tests against any left operand, `not(...)` around a literal or list,
/// range and list literals, and plain literals (equality).
///
/// # Errors
///
/// Parse and transform failures, evaluation failures of the operand, and
/// [`EvaluationError::InvalidOperation`] for any other expression shape.
pub fn project(engine: &Engine, text: &str) -> Result<Condition, EngineError> {
    let trimmed = text.trim();
    if let Some((op, rest)) = UNARY_PREFIXES
        .iter()
        .find_map(|(prefix, op)| trimmed.strip_prefix(prefix).map(|rest| (*op, rest)))
    {
        let value = engine.evaluate_str(rest, &EvaluationContext::new())?;
        return Ok(Condition::new(op.into(), value));
    }

    let expression = engine.parse_and_compile(trimmed)?;
    project_node(engine, expression.ast())
}

fn project_node(engine: &Engine, node: &Node) -> Result<Condition, EngineError> {
    let value = |node: &Node| -> Result<Value, EngineError> {
        Ok(engine
            .evaluator()
            .evaluate(node, &EvaluationContext::new())?)
    };

    match node {
        Node::Comparison { op, right, .. } => Ok(Condition::new((*op).into(), value(right)?)),
        Node::Between { min, max, .. } => Ok(Condition::new(
            Operator::Between,
            Value::List(vec![value(min)?, value(max)?]),
        )),
        Node::In { target, .. } => Ok(Condition::new(Operator::In, value(target)?)),
        Node::Range { .. } => Ok(Condition::new(Operator::Between, value(node)?)),
        Node::List(_) => Ok(Condition::new(Operator::In, value(node)?)),
        Node::Not(inner) => match inner.as_ref() {
            Node::List(_) | Node::Range { .. } => {
                Ok(Condition::new(Operator::NotIn, value(inner)?))
            }
            literal if literal.is_literal() => Ok(Condition::new(Operator::Neq, value(literal)?)),
            other => Err(unprojectable(other)),
        },
        literal if literal.is_literal() => Ok(Condition::new(Operator::Eq, value(literal)?)),
        other => Err(unprojectable(other)),
    }
}

fn unprojectable(node: &Node) -> EngineError {
    EvaluationError::InvalidOperation {
        node: node.tag(),
        detail: format!("'{node}' cannot be expressed as an operator and value"),
    }
    .into()
}

/// [`project`], falling back to [`heuristic::parse`] when the text does not
/// parse as FEEL.
///
/// Only parse and transform failures trigger the fallback; evaluation
/// failures are returned as-is.
///
/// # Errors
///
/// [`ConditionError::Engine`] for evaluation failures of valid FEEL and
/// [`ConditionError::Heuristic`] when both tiers reject the text.
pub fn interpret(engine: &Engine, text: &str) -> Result<Condition, ConditionError> {
    match project(engine, text) {
        Ok(condition) => Ok(condition),
        Err(err) if err.is_compile_error() => {
            debug!(text, error = %err, "falling back to heuristic condition parsing");
            Ok(heuristic::parse(text)?)
        }
        Err(err) => Err(err.into()),
    }
}
