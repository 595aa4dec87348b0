use super::{integer_arg, number_arg, optional, string_arg, Arity, FunctionRegistry};
use crate::{Number, Value};

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(&["abs"], Arity::Exact(1), |args, _| {
        Ok(Value::Number(number_arg(args, 0)?.abs()))
    });

    registry.register(&["floor"], Arity::Exact(1), |args, _| {
        Ok(Value::Number(map_float(number_arg(args, 0)?, f64::floor)))
    });

    registry.register(&["ceiling"], Arity::Exact(1), |args, _| {
        Ok(Value::Number(map_float(number_arg(args, 0)?, f64::ceil)))
    });

    registry.register(&["round"], Arity::Between(1, 2), |args, _| {
        let n = number_arg(args, 0)?;
        let scale = scale_arg(args, 1)?;
        Ok(Value::Number(round_to(n, scale, f64::round)))
    });

    registry.register(&["decimal"], Arity::Exact(2), |args, _| {
        let n = number_arg(args, 0)?;
        let scale = scale_arg(args, 1)?;
        Ok(Value::Number(round_to(n, scale, f64::round_ties_even)))
    });

    registry.register(&["sqrt"], Arity::Exact(1), |args, _| {
        let n = number_arg(args, 0)?.as_f64();
        if n < 0.0 {
            return Err("cannot take the square root of a negative number".to_owned());
        }
        Ok(Value::Number(Number::Float(n.sqrt()).normalized()))
    });

    registry.register(&["exp"], Arity::Exact(1), |args, _| {
        Ok(Value::Number(Number::Float(number_arg(args, 0)?.as_f64().exp())))
    });

    registry.register(&["log"], Arity::Exact(1), |args, _| {
        let n = number_arg(args, 0)?.as_f64();
        if n <= 0.0 {
            return Err("logarithm is only defined for positive numbers".to_owned());
        }
        Ok(Value::Number(Number::Float(n.ln())))
    });

    registry.register(&["modulo"], Arity::Exact(2), |args, _| {
        number_arg(args, 0)?
            .rem(number_arg(args, 1)?)
            .map(Value::Number)
            .ok_or_else(|| "division by zero".to_owned())
    });

    registry.register(&["odd"], Arity::Exact(1), |args, _| {
        Ok(Value::Boolean(integer_arg(args, 0)? % 2 != 0))
    });

    registry.register(&["even"], Arity::Exact(1), |args, _| {
        Ok(Value::Boolean(integer_arg(args, 0)? % 2 == 0))
    });

    registry.register(&["number"], Arity::Exact(1), |args, _| match &args[0] {
        Value::Number(n) => Ok(Value::Number(*n)),
        Value::Null => Ok(Value::Null),
        _ => parse_number(string_arg(args, 0)?).map(Value::Number),
    });
}

fn scale_arg(args: &[Value], i: usize) -> Result<i32, String> {
    match optional(args, i) {
        None => Ok(0),
        Some(_) => i32::try_from(integer_arg(args, i)?)
            .map_err(|_| "scale out of range".to_owned()),
    }
}

/// Apply `f` to floats; integers are already whole and pass through.
fn map_float(n: Number, f: fn(f64) -> f64) -> Number {
    match n {
        Number::Int(_) => n,
        Number::Float(v) => Number::Float(f(v)).normalized(),
    }
}

/// Round to `scale` decimal places with the given rounding mode.
fn round_to(n: Number, scale: i32, mode: fn(f64) -> f64) -> Number {
    match n {
        Number::Int(_) if scale >= 0 => n,
        _ => {
            let factor = 10_f64.powi(scale);
            let rounded = mode(n.as_f64() * factor) / factor;
            if scale <= 0 {
                Number::Float(rounded).normalized()
            } else {
                Number::Float(rounded)
            }
        }
    }
}

fn parse_number(text: &str) -> Result<Number, String> {
    let trimmed = text.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(Number::Int(i));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Number::Float)
        .ok_or_else(|| format!("'{text}' is not a number"))
}
