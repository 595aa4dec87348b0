use indexmap::IndexMap;

use super::Value;

/// Name-to-value bindings supplied to a single evaluation.
///
/// Dot-separated paths like `"user.profile.age"` given to [`set`](Self::set)
/// build nested FEEL contexts, so the expression `user.profile.age` resolves
/// through property access. The evaluator never mutates a context; scoped
/// bindings (quantifier, `for` and filter variables) shadow it instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationContext {
    data: IndexMap<String, Value>,
}

impl EvaluationContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value at a dot-separated path. Creates intermediate contexts as needed.
    #[must_use]
    pub fn set(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.insert(path, value.into());
        self
    }

    /// Insert a value at a dot-separated path (mutable reference version).
    pub fn insert(&mut self, path: &str, value: Value) {
        let segments: Vec<&str> = path.split('.').collect();
        Self::insert_recursive(&mut self.data, &segments, value);
    }

    /// Bind a single name verbatim, without splitting on dots.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.data.insert(name.into(), value);
    }

    /// Look up a top-level binding.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    /// Look up a value by dot-separated path through nested contexts.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        segments.try_fold(self.data.get(first)?, |current, segment| {
            current.as_context()?.get(segment)
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build a context from a FEEL context value. Returns `None` for any
    /// other kind of value.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Context(data) => Some(Self { data }),
            _ => None,
        }
    }

    /// The bindings as a FEEL context value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Context(self.data.clone())
    }

    fn insert_recursive(map: &mut IndexMap<String, Value>, segments: &[&str], value: Value) {
        match segments {
            [] => {}
            [last] => {
                map.insert((*last).to_owned(), value);
            }
            [first, rest @ ..] => {
                let entry = map
                    .entry((*first).to_owned())
                    .or_insert_with(|| Value::Context(IndexMap::new()));
                if !matches!(entry, Value::Context(_)) {
                    *entry = Value::Context(IndexMap::new());
                }
                if let Value::Context(nested) = entry {
                    Self::insert_recursive(nested, rest, value);
                }
            }
        }
    }
}

impl FromIterator<(String, Value)> for EvaluationContext {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_simple() {
        let ctx = EvaluationContext::new().set("name", "alice");
        assert_eq!(ctx.get("name"), Some(&Value::from("alice")));
    }

    #[test]
    fn set_and_get_nested() {
        let ctx = EvaluationContext::new().set("user.profile.age", 25_i64);
        assert_eq!(ctx.get_path("user.profile.age"), Some(&Value::from(25_i64)));
        assert!(matches!(ctx.get("user"), Some(Value::Context(_))));
    }

    #[test]
    fn get_missing_returns_none() {
        let ctx = EvaluationContext::new().set("user.age", 25_i64);
        assert_eq!(ctx.get_path("user.name"), None);
        assert_eq!(ctx.get("nonexistent"), None);
        assert_eq!(ctx.get_path("user.age.years"), None);
    }

    #[test]
    fn multiple_nested_fields_share_parent() {
        let ctx = EvaluationContext::new()
            .set("user.profile.age", 25_i64)
            .set("user.profile.name", "alice")
            .set("user.status", "active");

        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.get_path("user.profile.name"), Some(&Value::from("alice")));
        assert_eq!(ctx.get_path("user.status"), Some(&Value::from("active")));
    }

    #[test]
    fn overwrite_leaf_with_nested() {
        let ctx = EvaluationContext::new()
            .set("user", "old_value")
            .set("user.age", 30_i64);
        assert_eq!(ctx.get_path("user.age"), Some(&Value::from(30_i64)));
    }

    #[test]
    fn bind_keeps_dots_verbatim() {
        let mut ctx = EvaluationContext::new();
        ctx.bind("a.b", Value::from(1_i64));
        assert_eq!(ctx.get("a.b"), Some(&Value::from(1_i64)));
        assert_eq!(ctx.get_path("a.b"), None);
    }

    #[test]
    fn value_round_trip() {
        let ctx = EvaluationContext::new().set("x", 1_i64).set("y", true);
        let back = EvaluationContext::from_value(ctx.to_value()).unwrap();
        assert_eq!(back, ctx);
        assert!(EvaluationContext::from_value(Value::from(1_i64)).is_none());
    }
}
