mod arithmetic;
mod property;

use std::borrow::Cow;

use indexmap::IndexMap;

use crate::{
    CompareOp, EvaluationContext, EvaluationError, FunctionRegistry, Node, Quantifier, RangeValue,
    TypeName, Value,
};

/// Maximum nesting depth the evaluator descends before giving up. Sized so a
/// debug build stays within a 2 MiB thread stack.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Upper bound on the number of elements an integer range expands to when
/// iterated by `for`, `some` or `every`.
const MAX_RANGE_ITEMS: i64 = 1_000_000;

/// Name resolution chain. Inner scopes shadow outer ones; the root is the
/// caller's context, which is never mutated.
enum Scope<'a> {
    Root(&'a EvaluationContext),
    Binding {
        name: &'a str,
        value: &'a Value,
        parent: &'a Scope<'a>,
    },
    Entries {
        entries: &'a IndexMap<String, Value>,
        parent: &'a Scope<'a>,
    },
}

impl Scope<'_> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        match self {
            Scope::Root(context) => context.get(name),
            Scope::Binding {
                name: bound,
                value,
                parent,
            } => {
                if *bound == name {
                    Some(value)
                } else {
                    parent.lookup(name)
                }
            }
            Scope::Entries { entries, parent } => {
                entries.get(name).or_else(|| parent.lookup(name))
            }
        }
    }

    fn root(&self) -> &EvaluationContext {
        match self {
            Scope::Root(context) => context,
            Scope::Binding { parent, .. } | Scope::Entries { parent, .. } => parent.root(),
        }
    }
}

/// Tree-walking evaluator over [`Node`] ASTs.
///
/// An evaluator borrows its function registry and holds no other state, so a
/// single instance can serve concurrent evaluations.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'r> {
    registry: &'r FunctionRegistry,
    max_depth: usize,
}

impl<'r> Evaluator<'r> {
    #[must_use]
    pub fn new(registry: &'r FunctionRegistry) -> Self {
        Self {
            registry,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Evaluate `node` against `context`.
    ///
    /// Evaluation is pure: the same node and context always produce the same
    /// result, and the context is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an [`EvaluationError`] naming the node that failed: a wrong
    /// operand kind, an ordering across incomparable kinds, division by
    /// zero, a non-boolean where a boolean is required, a failing function
    /// call, or nesting beyond the depth limit.
    pub fn evaluate(
        &self,
        node: &Node,
        context: &EvaluationContext,
    ) -> Result<Value, EvaluationError> {
        self.eval(node, &Scope::Root(context), 0)
    }

    #[allow(clippy::too_many_lines)]
    fn eval(&self, node: &Node, scope: &Scope<'_>, depth: usize) -> Result<Value, EvaluationError> {
        if depth > self.max_depth {
            return Err(EvaluationError::DepthExceeded {
                node: node.tag(),
                limit: self.max_depth,
            });
        }
        let depth = depth + 1;

        match node {
            Node::Null => Ok(Value::Null),
            Node::Number(n) => Ok(Value::Number(*n)),
            Node::String(s) => Ok(Value::String(s.clone())),
            Node::Boolean(b) => Ok(Value::Boolean(*b)),
            Node::Field(name) => Ok(scope.lookup(name).cloned().unwrap_or(Value::Null)),

            Node::List(items) => items
                .iter()
                .map(|item| self.eval(item, scope, depth))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),

            Node::Context(entries) => {
                // Later entries may refer to earlier ones.
                let mut built = IndexMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let value = {
                        let inner = Scope::Entries {
                            entries: &built,
                            parent: scope,
                        };
                        self.eval(value, &inner, depth)?
                    };
                    built.insert(key.clone(), value);
                }
                Ok(Value::Context(built))
            }

            Node::Range {
                start,
                end,
                start_inclusive,
                end_inclusive,
            } => {
                let start = self.eval(start, scope, depth)?;
                let end = self.eval(end, scope, depth)?;
                let (left, right) = (start.kind(), end.kind());
                RangeValue::new(start, end, *start_inclusive, *end_inclusive)
                    .map(Value::Range)
                    .ok_or(EvaluationError::Incomparable {
                        node: node.tag(),
                        left,
                        right,
                    })
            }

            Node::Arithmetic { op, left, right } => {
                let left = self.eval(left, scope, depth)?;
                let right = self.eval(right, scope, depth)?;
                arithmetic::apply(*op, left, right)
            }

            Node::Negate(inner) => arithmetic::negate(self.eval(inner, scope, depth)?),

            Node::Comparison { op, left, right } => {
                let left = self.eval(left, scope, depth)?;
                let right = self.eval(right, scope, depth)?;
                left.compare(*op, &right)
                    .map(Value::Boolean)
                    .ok_or(EvaluationError::Incomparable {
                        node: node.tag(),
                        left: left.kind(),
                        right: right.kind(),
                    })
            }

            Node::And(left, right) => {
                if !self.eval_bool(left, scope, depth, node.tag())? {
                    return Ok(Value::Boolean(false));
                }
                self.eval_bool(right, scope, depth, node.tag()).map(Value::Boolean)
            }

            Node::Or(left, right) => {
                if self.eval_bool(left, scope, depth, node.tag())? {
                    return Ok(Value::Boolean(true));
                }
                self.eval_bool(right, scope, depth, node.tag()).map(Value::Boolean)
            }

            Node::Not(inner) => self
                .eval_bool(inner, scope, depth, node.tag())
                .map(|b| Value::Boolean(!b)),

            Node::Between { value, min, max } => {
                let value = self.eval(value, scope, depth)?;
                let min = self.eval(min, scope, depth)?;
                let max = self.eval(max, scope, depth)?;
                let ordered = |bound: &Value, op| {
                    value
                        .compare(op, bound)
                        .ok_or(EvaluationError::Incomparable {
                            node: "between",
                            left: value.kind(),
                            right: bound.kind(),
                        })
                };
                // Both bounds are checked even when the lower one already fails.
                let above_min = ordered(&min, CompareOp::Gte)?;
                let below_max = ordered(&max, CompareOp::Lte)?;
                Ok(Value::Boolean(above_min && below_max))
            }

            Node::In { value, target } => {
                let value = self.eval(value, scope, depth)?;
                match self.eval(target, scope, depth)? {
                    Value::List(items) => Ok(Value::Boolean(items.contains(&value))),
                    Value::Range(range) => range.contains(&value).map(Value::Boolean).ok_or(
                        EvaluationError::Incomparable {
                            node: node.tag(),
                            left: value.kind(),
                            right: range.start().kind(),
                        },
                    ),
                    other => Err(EvaluationError::TypeMismatch {
                        node: node.tag(),
                        expected: "list or range",
                        found: other.kind(),
                    }),
                }
            }

            Node::InstanceOf { value, type_name } => {
                let value = self.eval(value, scope, depth)?;
                Ok(Value::Boolean(instance_of(&value, *type_name)))
            }

            Node::PropertyAccess { object, property } => {
                property::access(&self.eval(object, scope, depth)?, property)
            }

            Node::FunctionCall { name, arguments } => {
                let arguments = arguments
                    .iter()
                    .map(|argument| self.eval(argument, scope, depth))
                    .collect::<Result<Vec<_>, _>>()?;
                self.registry
                    .call(name, &arguments, scope.root())
                    .map_err(|source| EvaluationError::Function {
                        node: node.tag(),
                        source,
                    })
            }

            Node::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if self.eval_bool(condition, scope, depth, node.tag())? {
                    self.eval(then, scope, depth)
                } else {
                    self.eval(otherwise, scope, depth)
                }
            }

            Node::Quantified {
                quantifier,
                variable,
                list,
                condition,
            } => {
                let list = self.eval(list, scope, depth)?;
                let items = iteration_items(&list, node.tag())?;
                for item in items.iter() {
                    let inner = Scope::Binding {
                        name: variable.as_str(),
                        value: item,
                        parent: scope,
                    };
                    let holds = self.eval_bool(condition, &inner, depth, node.tag())?;
                    match quantifier {
                        Quantifier::Some if holds => return Ok(Value::Boolean(true)),
                        Quantifier::Every if !holds => return Ok(Value::Boolean(false)),
                        _ => {}
                    }
                }
                Ok(Value::Boolean(matches!(quantifier, Quantifier::Every)))
            }

            Node::For {
                variable,
                list,
                body,
            } => {
                let list = self.eval(list, scope, depth)?;
                let items = iteration_items(&list, node.tag())?;
                items
                    .iter()
                    .map(|item| {
                        let inner = Scope::Binding {
                            name: variable.as_str(),
                            value: item,
                            parent: scope,
                        };
                        self.eval(body, &inner, depth)
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::List)
            }

            Node::Filter { list, condition } => {
                match self.eval(list, scope, depth)? {
                    Value::List(items) => self.filter(items, condition, scope, depth),
                    other => Err(EvaluationError::TypeMismatch {
                        node: node.tag(),
                        expected: "list",
                        found: other.kind(),
                    }),
                }
            }
        }
    }

    fn eval_bool(
        &self,
        node: &Node,
        scope: &Scope<'_>,
        depth: usize,
        owner: &'static str,
    ) -> Result<bool, EvaluationError> {
        let value = self.eval(node, scope, depth)?;
        value.as_bool().ok_or(EvaluationError::NotBoolean {
            node: owner,
            found: value.kind(),
        })
    }

    /// Each element is visible as `item`; context elements also expose their
    /// keys directly. A numeric condition selects by 1-based position
    /// (negative counts from the end) instead of filtering.
    ///
    /// An empty list has no element to decide the mode with, so the
    /// condition is tried once with `item` bound to null: a number means an
    /// out-of-range index (null), anything else an empty selection.
    fn filter(
        &self,
        items: Vec<Value>,
        condition: &Node,
        scope: &Scope<'_>,
        depth: usize,
    ) -> Result<Value, EvaluationError> {
        if items.is_empty() {
            let index = self.with_element(&Value::Null, scope, |inner| {
                self.eval(condition, inner, depth)
            });
            return Ok(match index {
                Ok(Value::Number(_)) => Value::Null,
                _ => Value::List(Vec::new()),
            });
        }

        let mut kept = Vec::new();
        for (position, item) in items.iter().enumerate() {
            let outcome = self.with_element(item, scope, |inner| self.eval(condition, inner, depth))?;
            match outcome {
                Value::Number(n) if position == 0 => {
                    let index = n.as_i64().ok_or_else(|| EvaluationError::InvalidOperation {
                        node: "filter",
                        detail: format!("list index must be an integer, found {n}"),
                    })?;
                    return Ok(select(&items, index));
                }
                Value::Boolean(true) => kept.push(item.clone()),
                Value::Boolean(false) | Value::Null => {}
                other => {
                    return Err(EvaluationError::NotBoolean {
                        node: "filter",
                        found: other.kind(),
                    })
                }
            }
        }
        Ok(Value::List(kept))
    }

    fn with_element<T>(
        &self,
        item: &Value,
        scope: &Scope<'_>,
        f: impl FnOnce(&Scope<'_>) -> T,
    ) -> T {
        let binding = Scope::Binding {
            name: "item",
            value: item,
            parent: scope,
        };
        match item {
            Value::Context(entries) => f(&Scope::Entries {
                entries,
                parent: &binding,
            }),
            _ => f(&binding),
        }
    }
}

fn select(items: &[Value], index: i64) -> Value {
    let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
    let position = match index {
        i if i > 0 && i <= len => i - 1,
        i if i < 0 && -i <= len => len + i,
        _ => return Value::Null,
    };
    usize::try_from(position)
        .ok()
        .and_then(|p| items.get(p))
        .cloned()
        .unwrap_or(Value::Null)
}

fn instance_of(value: &Value, type_name: TypeName) -> bool {
    matches!(
        (type_name, value),
        (TypeName::Number, Value::Number(_))
            | (TypeName::String, Value::String(_))
            | (TypeName::Boolean, Value::Boolean(_))
            | (TypeName::Date, Value::Date(_))
            | (TypeName::Time, Value::Time(_))
            | (TypeName::DateTime, Value::DateTime(_))
            | (TypeName::Duration, Value::Duration(_))
            | (TypeName::List, Value::List(_))
            | (TypeName::Context, Value::Context(_))
            | (TypeName::Range, Value::Range(_))
    )
}

/// Lists iterate as-is; ranges with integer endpoints expand to their members.
fn iteration_items<'v>(
    value: &'v Value,
    node: &'static str,
) -> Result<Cow<'v, [Value]>, EvaluationError> {
    match value {
        Value::List(items) => Ok(Cow::Borrowed(items)),
        Value::Range(range) => expand_range(range)
            .map(Cow::Owned)
            .map_err(|detail| EvaluationError::InvalidOperation { node, detail }),
        other => Err(EvaluationError::TypeMismatch {
            node,
            expected: "list",
            found: other.kind(),
        }),
    }
}

fn expand_range(range: &RangeValue) -> Result<Vec<Value>, String> {
    let endpoint = |v: &Value| v.as_number().and_then(crate::Number::as_i64);
    let (Some(start), Some(end)) = (endpoint(range.start()), endpoint(range.end())) else {
        return Err(format!("cannot iterate over range {range}"));
    };
    let first = if range.start_inclusive() { start } else { start.saturating_add(1) };
    let last = if range.end_inclusive() { end } else { end.saturating_sub(1) };
    if last < first {
        return Ok(Vec::new());
    }
    if last - first >= MAX_RANGE_ITEMS {
        return Err(format!("range {range} is too large to iterate"));
    }
    Ok((first..=last).map(Value::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse, transform::to_ast, FunctionError};

    fn eval_with(source: &str, context: &EvaluationContext) -> Result<Value, EvaluationError> {
        let tree = parse::parse(source).unwrap();
        let ast = to_ast(&tree).unwrap();
        let registry = FunctionRegistry::with_builtins();
        Evaluator::new(&registry).evaluate(&ast, context)
    }

    fn eval(source: &str) -> Result<Value, EvaluationError> {
        eval_with(source, &EvaluationContext::new())
    }

    #[test]
    fn missing_field_is_null() {
        assert_eq!(eval("unknown").unwrap(), Value::Null);
        assert_eq!(eval("unknown = null").unwrap(), Value::from(true));
    }

    #[test]
    fn and_short_circuits() {
        // The right operand would fail if evaluated.
        assert_eq!(eval("false and (1 / 0 > 1)").unwrap(), Value::from(false));
        assert_eq!(eval("true or (1 / 0 > 1)").unwrap(), Value::from(true));
    }

    #[test]
    fn logical_operands_must_be_boolean() {
        assert_eq!(
            eval("1 and true"),
            Err(EvaluationError::NotBoolean {
                node: "and",
                found: "number"
            })
        );
        assert!(matches!(
            eval("not(5)"),
            Err(EvaluationError::NotBoolean { node: "not", .. })
        ));
    }

    #[test]
    fn ordering_across_kinds_is_an_error() {
        assert_eq!(
            eval("\"a\" < 1"),
            Err(EvaluationError::Incomparable {
                node: "comparison",
                left: "string",
                right: "number"
            })
        );
        assert_eq!(eval("\"a\" = 1").unwrap(), Value::from(false));
    }

    #[test]
    fn between_is_inclusive() {
        assert_eq!(eval("5 between 1 and 5").unwrap(), Value::from(true));
        assert_eq!(eval("0 between 1 and 5").unwrap(), Value::from(false));
    }

    #[test]
    fn between_checks_both_bounds() {
        for source in ["0 between 1 and \"z\"", "5 between 1 and \"z\""] {
            assert_eq!(
                eval(source),
                Err(EvaluationError::Incomparable {
                    node: "between",
                    left: "number",
                    right: "string"
                }),
                "{source}"
            );
        }
        assert!(matches!(
            eval("9 between \"a\" and 5"),
            Err(EvaluationError::Incomparable { node: "between", .. })
        ));
    }

    #[test]
    fn membership_in_lists_and_ranges() {
        assert_eq!(eval("2 in [1, 2, 3]").unwrap(), Value::from(true));
        assert_eq!(eval("5 in [1..5)").unwrap(), Value::from(false));
        assert_eq!(eval("5 in [1..5]").unwrap(), Value::from(true));
        assert!(matches!(
            eval("1 in 5"),
            Err(EvaluationError::TypeMismatch { node: "in", .. })
        ));
    }

    #[test]
    fn conditional_requires_boolean() {
        assert_eq!(eval("if 1 < 2 then \"yes\" else \"no\"").unwrap(), Value::from("yes"));
        assert!(matches!(
            eval("if 1 then 2 else 3"),
            Err(EvaluationError::NotBoolean {
                node: "conditional",
                ..
            })
        ));
    }

    #[test]
    fn quantifiers() {
        assert_eq!(eval("some x in [1, 5, 9] satisfies x > 8").unwrap(), Value::from(true));
        assert_eq!(eval("every x in [1, 5, 9] satisfies x > 0").unwrap(), Value::from(true));
        assert_eq!(eval("every x in [] satisfies x > 0").unwrap(), Value::from(true));
        assert_eq!(eval("some x in [] satisfies x > 0").unwrap(), Value::from(false));
    }

    #[test]
    fn for_binds_and_shadows() {
        let ctx = EvaluationContext::new().set("x", 100_i64);
        assert_eq!(
            eval_with("for x in [1, 2, 3] return x * 2", &ctx).unwrap(),
            Value::List(vec![2_i64.into(), 4_i64.into(), 6_i64.into()])
        );
        assert_eq!(
            eval_with("for i in [1..3] return i + x", &ctx).unwrap(),
            Value::List(vec![101_i64.into(), 102_i64.into(), 103_i64.into()])
        );
    }

    #[test]
    fn filter_by_condition_and_index() {
        assert_eq!(
            eval("[1, 2, 3, 4][item > 2]").unwrap(),
            Value::List(vec![3_i64.into(), 4_i64.into()])
        );
        assert_eq!(eval("[10, 20, 30][1]").unwrap(), Value::from(10_i64));
        assert_eq!(eval("[10, 20, 30][-1]").unwrap(), Value::from(30_i64));
        assert_eq!(eval("[10, 20, 30][4]").unwrap(), Value::Null);
    }

    #[test]
    fn filter_on_empty_list() {
        assert_eq!(eval("[][1]").unwrap(), Value::Null);
        assert_eq!(eval("[][-1]").unwrap(), Value::Null);
        assert_eq!(eval("[][item > 1]").unwrap(), Value::List(Vec::new()));
        assert_eq!(eval("[][total > 100]").unwrap(), Value::List(Vec::new()));
        let ctx = EvaluationContext::new().set("i", 2_i64).set("xs", Value::List(Vec::new()));
        assert_eq!(eval_with("xs[i]", &ctx).unwrap(), Value::Null);
    }

    #[test]
    fn filter_exposes_context_keys() {
        let ctx = EvaluationContext::new().set(
            "orders",
            Value::List(vec![
                EvaluationContext::new().set("total", 50_i64).to_value(),
                EvaluationContext::new().set("total", 150_i64).to_value(),
            ]),
        );
        assert_eq!(
            eval_with("count(orders[total > 100])", &ctx).unwrap(),
            Value::from(1_i64)
        );
    }

    #[test]
    fn context_entries_see_earlier_entries() {
        assert_eq!(
            eval("{a: 2, b: a * 3}.b").unwrap(),
            Value::from(6_i64)
        );
    }

    #[test]
    fn nested_path_lookup() {
        let ctx = EvaluationContext::new().set("user.profile.age", 42_i64);
        assert_eq!(eval_with("user.profile.age", &ctx).unwrap(), Value::from(42_i64));
        assert_eq!(eval_with("user.missing.age", &ctx).unwrap(), Value::Null);
    }

    #[test]
    fn instance_of_checks_kind() {
        assert_eq!(eval("5 instance of number").unwrap(), Value::from(true));
        assert_eq!(eval("null instance of string").unwrap(), Value::from(false));
    }

    #[test]
    fn function_errors_are_wrapped() {
        let err = eval("nope(1)").unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::Function {
                node: "function call",
                source: FunctionError::Unknown { .. }
            }
        ));
    }

    #[test]
    fn depth_limit() {
        let registry = FunctionRegistry::with_builtins();
        let tree = parse::parse("((((1))))").unwrap();
        let ast = to_ast(&tree).unwrap();
        let mut deep = ast;
        for _ in 0..10 {
            deep = Node::Negate(Box::new(deep));
        }
        let err = Evaluator::new(&registry)
            .with_max_depth(5)
            .evaluate(&deep, &EvaluationContext::new())
            .unwrap_err();
        assert!(matches!(err, EvaluationError::DepthExceeded { limit: 5, .. }));
    }

    #[test]
    fn default_depth_limit_fits_a_small_stack() {
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                let registry = FunctionRegistry::with_builtins();
                let mut deep = Node::Number(1_i64.into());
                for _ in 0..4 * DEFAULT_MAX_DEPTH {
                    deep = Node::Negate(Box::new(deep));
                }
                Evaluator::new(&registry).evaluate(&deep, &EvaluationContext::new())
            })
            .unwrap();
        let err = handle.join().unwrap().unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::DepthExceeded { limit: DEFAULT_MAX_DEPTH, .. }
        ));
    }

    #[test]
    fn context_is_not_mutated() {
        let ctx = EvaluationContext::new().set("x", 1_i64);
        let before = ctx.clone();
        eval_with("for x in [5, 6] return x", &ctx).unwrap();
        assert_eq!(ctx, before);
    }
}
