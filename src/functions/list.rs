use std::cmp::Ordering;

use super::{integer_arg, list_arg, list_or_varargs, optional, Arity, FunctionRegistry};
use crate::{Number, Value};

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(&["count"], Arity::Exact(1), |args, _| {
        let len = list_arg(args, 0)?.len();
        Ok(Value::from(i64::try_from(len).map_err(|e| e.to_string())?))
    });

    registry.register(&["sum"], Arity::AtLeast(1), |args, _| {
        let numbers = numbers(list_or_varargs(args))?;
        Ok(Value::Number(
            numbers.into_iter().fold(Number::Int(0), Number::add),
        ))
    });

    registry.register(&["product"], Arity::AtLeast(1), |args, _| {
        let numbers = numbers(list_or_varargs(args))?;
        Ok(Value::Number(
            numbers.into_iter().fold(Number::Int(1), Number::mul),
        ))
    });

    registry.register(&["mean"], Arity::AtLeast(1), |args, _| {
        let numbers = numbers(list_or_varargs(args))?;
        let count = i64::try_from(numbers.len()).map_err(|e| e.to_string())?;
        let total = numbers.into_iter().fold(Number::Int(0), Number::add);
        Ok(total
            .div(Number::Int(count))
            .map_or(Value::Null, Value::Number))
    });

    registry.register(&["median"], Arity::AtLeast(1), |args, _| {
        let mut numbers = numbers(list_or_varargs(args))?;
        numbers.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let mid = numbers.len() / 2;
        Ok(match numbers.len() {
            0 => Value::Null,
            n if n % 2 == 1 => Value::Number(numbers[mid]),
            _ => numbers[mid - 1]
                .add(numbers[mid])
                .div(Number::Int(2))
                .map_or(Value::Null, Value::Number),
        })
    });

    registry.register(&["min"], Arity::AtLeast(1), |args, _| {
        extreme(list_or_varargs(args), Ordering::Less)
    });

    registry.register(&["max"], Arity::AtLeast(1), |args, _| {
        extreme(list_or_varargs(args), Ordering::Greater)
    });

    registry.register(&["append"], Arity::AtLeast(1), |args, _| {
        let mut items = list_arg(args, 0)?.to_vec();
        items.extend_from_slice(&args[1..]);
        Ok(Value::List(items))
    });

    registry.register(&["concatenate"], Arity::AtLeast(1), |args, _| {
        let mut items = Vec::new();
        for i in 0..args.len() {
            items.extend_from_slice(list_arg(args, i)?);
        }
        Ok(Value::List(items))
    });

    registry.register(&["reverse"], Arity::Exact(1), |args, _| {
        Ok(Value::List(list_arg(args, 0)?.iter().rev().cloned().collect()))
    });

    registry.register(&["index of", "index_of"], Arity::Exact(2), |args, _| {
        let needle = &args[1];
        let mut positions = Vec::new();
        for (i, item) in list_arg(args, 0)?.iter().enumerate() {
            if item == needle {
                positions.push(Value::from(i64::try_from(i + 1).map_err(|e| e.to_string())?));
            }
        }
        Ok(Value::List(positions))
    });

    registry.register(
        &["distinct values", "distinct"],
        Arity::Exact(1),
        |args, _| {
            let mut distinct: Vec<Value> = Vec::new();
            for item in list_arg(args, 0)? {
                if !distinct.contains(item) {
                    distinct.push(item.clone());
                }
            }
            Ok(Value::List(distinct))
        },
    );

    registry.register(&["list contains"], Arity::Exact(2), |args, _| {
        Ok(Value::Boolean(list_arg(args, 0)?.contains(&args[1])))
    });

    registry.register(&["flatten"], Arity::Exact(1), |args, _| {
        let mut flat = Vec::new();
        flatten_into(list_arg(args, 0)?, &mut flat);
        Ok(Value::List(flat))
    });

    registry.register(&["sublist"], Arity::Between(2, 3), |args, _| {
        let items = list_arg(args, 0)?;
        let begin = position(items.len(), integer_arg(args, 1)?)?;
        let end = match optional(args, 2) {
            Some(_) => {
                let length = usize::try_from(integer_arg(args, 2)?)
                    .map_err(|_| "length must not be negative".to_owned())?;
                begin.saturating_add(length).min(items.len())
            }
            None => items.len(),
        };
        Ok(Value::List(items[begin..end].to_vec()))
    });

    registry.register(&["remove"], Arity::Exact(2), |args, _| {
        let mut items = list_arg(args, 0)?.to_vec();
        let index = position(items.len(), integer_arg(args, 1)?)?;
        if index >= items.len() {
            return Err("position out of range".to_owned());
        }
        items.remove(index);
        Ok(Value::List(items))
    });

    registry.register(&["sort"], Arity::Exact(1), |args, _| {
        let mut items = list_arg(args, 0)?.to_vec();
        let mut incomparable = None;
        items.sort_by(|a, b| {
            a.partial_cmp_value(b).unwrap_or_else(|| {
                incomparable.get_or_insert((a.kind(), b.kind()));
                Ordering::Equal
            })
        });
        match incomparable {
            Some((a, b)) => Err(format!("cannot order {a} against {b}")),
            None => Ok(Value::List(items)),
        }
    });

    // -- Boolean ------------------------------------------------------------

    // Source text `not(x)` is always the unary operator; this entry serves
    // callers going through `FunctionRegistry::call` directly.
    registry.register(&["not"], Arity::Exact(1), |args, _| match &args[0] {
        Value::Boolean(b) => Ok(Value::Boolean(!b)),
        other => Err(format!("argument 1 must be a boolean, found {}", other.kind())),
    });

    registry.register(&["all"], Arity::AtLeast(1), |args, _| {
        let flags = booleans(list_or_varargs(args))?;
        Ok(Value::Boolean(flags.into_iter().all(|b| b)))
    });

    registry.register(&["any"], Arity::AtLeast(1), |args, _| {
        let flags = booleans(list_or_varargs(args))?;
        Ok(Value::Boolean(flags.into_iter().any(|b| b)))
    });
}

fn numbers(items: &[Value]) -> Result<Vec<Number>, String> {
    items
        .iter()
        .map(|item| {
            item.as_number()
                .ok_or_else(|| format!("expected a list of numbers, found {}", item.kind()))
        })
        .collect()
}

fn booleans(items: &[Value]) -> Result<Vec<bool>, String> {
    items
        .iter()
        .map(|item| {
            item.as_bool()
                .ok_or_else(|| format!("expected a list of booleans, found {}", item.kind()))
        })
        .collect()
}

/// Smallest (`Less`) or largest (`Greater`) element; null for an empty list.
fn extreme(items: &[Value], wanted: Ordering) -> Result<Value, String> {
    let mut best: Option<&Value> = None;
    for item in items {
        best = match best {
            None => Some(item),
            Some(current) => {
                let ordering = item.partial_cmp_value(current).ok_or_else(|| {
                    format!("cannot order {} against {}", item.kind(), current.kind())
                })?;
                Some(if ordering == wanted { item } else { current })
            }
        };
    }
    Ok(best.cloned().unwrap_or(Value::Null))
}

fn flatten_into(items: &[Value], out: &mut Vec<Value>) {
    for item in items {
        match item {
            Value::List(inner) => flatten_into(inner, out),
            other => out.push(other.clone()),
        }
    }
}

/// Zero-based index for a FEEL 1-based position; negative counts from the
/// end.
fn position(len: usize, position: i64) -> Result<usize, String> {
    let len_i = i64::try_from(len).map_err(|e| e.to_string())?;
    let index = match position {
        0 => return Err("position must not be 0".to_owned()),
        p if p > 0 => p - 1,
        p => len_i + p,
    };
    usize::try_from(index)
        .ok()
        .filter(|&i| i <= len)
        .ok_or_else(|| format!("position {position} out of range"))
}
