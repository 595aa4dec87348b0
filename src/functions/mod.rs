//! Built-in function registry.
//!
//! Every built-in is registered under its canonical FEEL name and any short
//! aliases. Arity is checked by the registry before an implementation runs,
//! so implementations may index their arguments freely within the declared
//! bounds.

mod context;
mod list;
mod numeric;
mod string;
mod temporal;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::parse::is_function_name;
use crate::{EvaluationContext, FunctionError, Number, Value};

/// Accepted argument counts for a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Inclusive bounds.
    Between(usize, usize),
    AtLeast(usize),
}

impl Arity {
    #[must_use]
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::Between(min, max) => (min..=max).contains(&count),
            Arity::AtLeast(min) => count >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::Between(min, max) => write!(f, "{min} to {max}"),
            Arity::AtLeast(min) => write!(f, "at least {min}"),
        }
    }
}

/// Signature shared by all built-ins. A returned `Err` message becomes
/// [`FunctionError::InvalidArgument`].
pub type FunctionImpl =
    Arc<dyn Fn(&[Value], &EvaluationContext) -> Result<Value, String> + Send + Sync>;

#[derive(Clone)]
struct Registration {
    arity: Arity,
    implementation: FunctionImpl,
}

/// Name to implementation table consulted by the evaluator for every
/// function call. Holds no per-call state.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Registration>,
}

impl FunctionRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the full built-in library.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        string::register(&mut registry);
        numeric::register(&mut registry);
        list::register(&mut registry);
        temporal::register(&mut registry);
        context::register(&mut registry);
        registry
    }

    /// Register `f` under every name in `names`, replacing any earlier
    /// registration of those names.
    ///
    /// Runs of whitespace inside a name collapse to one space, matching how
    /// the parser reads `credit  score(...)`. A multi-word name FEEL source
    /// cannot spell as a call (one containing a reserved word such as `in`)
    /// is still registered for [`FunctionRegistry::call`], with a warning.
    pub fn register<F>(&mut self, names: &[&str], arity: Arity, f: F)
    where
        F: Fn(&[Value], &EvaluationContext) -> Result<Value, String> + Send + Sync + 'static,
    {
        let implementation: FunctionImpl = Arc::new(f);
        for name in names {
            let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
            if name.contains(' ') && !is_function_name(&name) {
                warn!(function = %name, "registered function cannot be called from FEEL source");
            }
            self.functions.insert(
                name,
                Registration {
                    arity,
                    implementation: Arc::clone(&implementation),
                },
            );
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    #[must_use]
    pub fn arity(&self, name: &str) -> Option<Arity> {
        self.functions.get(name).map(|r| r.arity)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Validate arity and invoke the function registered as `name`.
    ///
    /// # Errors
    ///
    /// [`FunctionError::Unknown`] for an unregistered name,
    /// [`FunctionError::Arity`] for a wrong argument count and
    /// [`FunctionError::InvalidArgument`] when the implementation rejects its
    /// arguments.
    pub fn call(
        &self,
        name: &str,
        arguments: &[Value],
        context: &EvaluationContext,
    ) -> Result<Value, FunctionError> {
        let registration =
            self.functions
                .get(name)
                .ok_or_else(|| FunctionError::Unknown {
                    function_name: name.to_owned(),
                    arguments: arguments.to_vec(),
                })?;
        if !registration.arity.accepts(arguments.len()) {
            return Err(FunctionError::Arity {
                function_name: name.to_owned(),
                expected: registration.arity,
                arguments: arguments.to_vec(),
            });
        }
        (registration.implementation)(arguments, context).map_err(|detail| {
            FunctionError::InvalidArgument {
                function_name: name.to_owned(),
                detail,
                arguments: arguments.to_vec(),
            }
        })
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("FunctionRegistry")
            .field("functions", &names)
            .finish()
    }
}

// -- Argument helpers shared by the built-in families -----------------------

fn mismatch(position: usize, expected: &str, found: &Value) -> String {
    format!(
        "argument {} must be {expected}, found {}",
        position + 1,
        found.kind()
    )
}

pub(crate) fn string_arg(args: &[Value], i: usize) -> Result<&str, String> {
    match &args[i] {
        Value::String(s) => Ok(s),
        other => Err(mismatch(i, "a string", other)),
    }
}

pub(crate) fn number_arg(args: &[Value], i: usize) -> Result<Number, String> {
    match &args[i] {
        Value::Number(n) => Ok(*n),
        other => Err(mismatch(i, "a number", other)),
    }
}

pub(crate) fn integer_arg(args: &[Value], i: usize) -> Result<i64, String> {
    number_arg(args, i)?
        .as_i64()
        .ok_or_else(|| format!("argument {} must be an integer", i + 1))
}

pub(crate) fn list_arg(args: &[Value], i: usize) -> Result<&[Value], String> {
    match &args[i] {
        Value::List(items) => Ok(items),
        other => Err(mismatch(i, "a list", other)),
    }
}

/// The single list argument, or all arguments when called variadically
/// (`max([1, 2])` and `max(1, 2)` are equivalent).
pub(crate) fn list_or_varargs(args: &[Value]) -> &[Value] {
    match args {
        [Value::List(items)] => items,
        _ => args,
    }
}

/// Optional trailing argument: absent and `null` are the same.
pub(crate) fn optional(args: &[Value], i: usize) -> Option<&Value> {
    args.get(i).filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::MULTI_WORD_FUNCTIONS;

    fn call(name: &str, args: Vec<Value>) -> Result<Value, FunctionError> {
        FunctionRegistry::with_builtins().call(name, &args, &EvaluationContext::new())
    }

    #[test]
    fn arity_accepts() {
        assert!(Arity::Exact(2).accepts(2));
        assert!(!Arity::Exact(2).accepts(1));
        assert!(Arity::Between(1, 3).accepts(3));
        assert!(!Arity::Between(1, 3).accepts(0));
        assert!(Arity::AtLeast(1).accepts(10));
    }

    #[test]
    fn unknown_function_names_itself() {
        let err = call("frobnicate", vec![]).unwrap_err();
        assert!(matches!(&err, FunctionError::Unknown { function_name, .. } if function_name == "frobnicate"));
    }

    #[test]
    fn wrong_arity_is_rejected_before_running() {
        let err = call("starts with", vec![Value::from("abc")]).unwrap_err();
        match err {
            FunctionError::Arity {
                function_name,
                expected,
                arguments,
            } => {
                assert_eq!(function_name, "starts with");
                assert_eq!(expected, Arity::Exact(2));
                assert_eq!(arguments, vec![Value::from("abc")]);
            }
            other => panic!("expected Arity, got {other:?}"),
        }
    }

    #[test]
    fn aliases_share_implementation() {
        let canonical = call("string length", vec![Value::from("hello")]).unwrap();
        let alias = call("length", vec![Value::from("hello")]).unwrap();
        assert_eq!(canonical, alias);
        assert_eq!(alias, Value::from(5_i64));
    }

    #[test]
    fn implementation_errors_become_invalid_argument() {
        let err = call("upper case", vec![Value::from(1_i64)]).unwrap_err();
        assert!(matches!(err, FunctionError::InvalidArgument { .. }));
        assert!(err.to_string().contains("must be a string"));
    }

    #[test]
    fn custom_registration_replaces_builtin() {
        let mut registry = FunctionRegistry::with_builtins();
        registry.register(&["abs"], Arity::Exact(1), |_, _| Ok(Value::from("custom")));
        let result = registry
            .call("abs", &[Value::from(-1_i64)], &EvaluationContext::new())
            .unwrap();
        assert_eq!(result, Value::from("custom"));
    }

    #[test]
    fn builtin_names_are_callable_from_source() {
        let registry = FunctionRegistry::with_builtins();
        for name in registry.names().filter(|n| *n != "not") {
            assert!(is_function_name(name), "grammar cannot call '{name}'");
        }
        for name in MULTI_WORD_FUNCTIONS {
            assert!(registry.contains(name), "'{name}' is not registered");
        }
    }

    #[test]
    fn registered_names_collapse_whitespace() {
        let mut registry = FunctionRegistry::new();
        registry.register(&["credit \t score"], Arity::Exact(0), |_, _| Ok(Value::from(1_i64)));
        assert!(registry.contains("credit score"));
        assert!(!registry.contains("credit \t score"));
    }

    #[test]
    fn not_is_reachable_through_the_registry() {
        let registry = FunctionRegistry::with_builtins();
        let result = registry
            .call("not", &[Value::from(false)], &EvaluationContext::new())
            .unwrap();
        assert_eq!(result, Value::from(true));
    }

    #[test]
    fn minimum_library_is_registered() {
        let registry = FunctionRegistry::with_builtins();
        for name in [
            "substring", "string length", "upper case", "lower case", "contains", "starts with",
            "ends with", "substring before", "substring after", "replace", "abs", "floor",
            "ceiling", "round", "sqrt", "modulo", "odd", "even", "count", "sum", "mean", "min",
            "max", "append", "reverse", "index of", "distinct values", "not", "all", "any",
            "date", "time", "date and time", "duration",
        ] {
            assert!(registry.contains(name), "missing built-in '{name}'");
        }
    }
}
