use super::{string_arg, Arity, FunctionRegistry};
use crate::Value;

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(&["get value"], Arity::Exact(2), |args, _| {
        let key = string_arg(args, 1)?;
        match &args[0] {
            Value::Context(entries) => Ok(entries.get(key).cloned().unwrap_or(Value::Null)),
            other => Err(format!("argument 1 must be a context, found {}", other.kind())),
        }
    });

    registry.register(&["get entries"], Arity::Exact(1), |args, _| match &args[0] {
        Value::Context(entries) => Ok(Value::List(
            entries
                .iter()
                .map(|(key, value)| {
                    [
                        ("key".to_owned(), Value::from(key.as_str())),
                        ("value".to_owned(), value.clone()),
                    ]
                    .into_iter()
                    .collect()
                })
                .collect(),
        )),
        other => Err(format!("argument 1 must be a context, found {}", other.kind())),
    });
}

#[cfg(test)]
mod tests {
    use crate::{EvaluationContext, FunctionRegistry, Value};

    fn person() -> Value {
        EvaluationContext::new()
            .set("name", "Ann")
            .set("age", 30_i64)
            .to_value()
    }

    #[test]
    fn get_value_by_key() {
        let registry = FunctionRegistry::with_builtins();
        let ctx = EvaluationContext::new();
        assert_eq!(
            registry.call("get value", &[person(), "age".into()], &ctx).unwrap(),
            Value::from(30_i64)
        );
        assert_eq!(
            registry.call("get value", &[person(), "zip".into()], &ctx).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn get_entries_preserves_order() {
        let registry = FunctionRegistry::with_builtins();
        let entries = registry
            .call("get entries", &[person()], &EvaluationContext::new())
            .unwrap();
        let keys: Vec<Value> = entries
            .as_list()
            .unwrap()
            .iter()
            .map(|e| e.as_context().unwrap()["key"].clone())
            .collect();
        assert_eq!(keys, vec![Value::from("name"), Value::from("age")]);
    }
}
