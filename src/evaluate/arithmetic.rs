use chrono::{NaiveDate, TimeDelta};

use crate::{ArithmeticOp, EvaluationError, Number, Value};

const NODE: &str = "arithmetic";

/// Apply a binary arithmetic operator to two evaluated operands.
pub(super) fn apply(op: ArithmeticOp, left: Value, right: Value) -> Result<Value, EvaluationError> {
    match (op, left, right) {
        (_, Value::Number(a), Value::Number(b)) => numeric(op, a, b).map(Value::Number),

        (ArithmeticOp::Add, Value::String(mut a), Value::String(b)) => {
            a.push_str(&b);
            Ok(Value::String(a))
        }

        (ArithmeticOp::Add, Value::Duration(a), Value::Duration(b)) => {
            a.checked_add(&b).map(Value::Duration).ok_or_else(overflow)
        }
        (ArithmeticOp::Sub, Value::Duration(a), Value::Duration(b)) => {
            a.checked_sub(&b).map(Value::Duration).ok_or_else(overflow)
        }

        (ArithmeticOp::Add, Value::Date(d), Value::Duration(delta))
        | (ArithmeticOp::Add, Value::Duration(delta), Value::Date(d)) => shift_date(d, delta),
        (ArithmeticOp::Sub, Value::Date(d), Value::Duration(delta)) => shift_date(d, -delta),

        (ArithmeticOp::Add, Value::DateTime(dt), Value::Duration(delta))
        | (ArithmeticOp::Add, Value::Duration(delta), Value::DateTime(dt)) => dt
            .checked_add_signed(delta)
            .map(Value::DateTime)
            .ok_or_else(overflow),
        (ArithmeticOp::Sub, Value::DateTime(dt), Value::Duration(delta)) => dt
            .checked_sub_signed(delta)
            .map(Value::DateTime)
            .ok_or_else(overflow),

        // Times of day wrap around midnight.
        (ArithmeticOp::Add, Value::Time(t), Value::Duration(delta))
        | (ArithmeticOp::Add, Value::Duration(delta), Value::Time(t)) => {
            Ok(Value::Time(t.overflowing_add_signed(delta).0))
        }
        (ArithmeticOp::Sub, Value::Time(t), Value::Duration(delta)) => {
            Ok(Value::Time(t.overflowing_sub_signed(delta).0))
        }

        (ArithmeticOp::Sub, Value::Date(a), Value::Date(b)) => {
            Ok(Value::Duration(a.signed_duration_since(b)))
        }
        (ArithmeticOp::Sub, Value::DateTime(a), Value::DateTime(b)) => {
            Ok(Value::Duration(a.signed_duration_since(b)))
        }
        (ArithmeticOp::Sub, Value::Time(a), Value::Time(b)) => {
            Ok(Value::Duration(a.signed_duration_since(b)))
        }

        (ArithmeticOp::Mul, Value::Duration(d), Value::Number(n))
        | (ArithmeticOp::Mul, Value::Number(n), Value::Duration(d)) => {
            scale(d, n.as_f64()).map(Value::Duration)
        }
        (ArithmeticOp::Div, Value::Duration(d), Value::Number(n)) => {
            if n.as_f64() == 0.0 {
                return Err(EvaluationError::DivisionByZero { node: NODE });
            }
            scale(d, 1.0 / n.as_f64()).map(Value::Duration)
        }
        (ArithmeticOp::Div, Value::Duration(a), Value::Duration(b)) => {
            let divisor = nanos(b)?;
            if divisor == 0 {
                return Err(EvaluationError::DivisionByZero { node: NODE });
            }
            #[allow(clippy::cast_precision_loss)]
            Ok(Value::Number(Number::Float(nanos(a)? as f64 / divisor as f64)))
        }

        (op, left, right) => Err(EvaluationError::InvalidOperation {
            node: NODE,
            detail: format!("cannot apply '{op}' to {} and {}", left.kind(), right.kind()),
        }),
    }
}

fn numeric(op: ArithmeticOp, a: Number, b: Number) -> Result<Number, EvaluationError> {
    match op {
        ArithmeticOp::Add => Ok(a.add(b)),
        ArithmeticOp::Sub => Ok(a.sub(b)),
        ArithmeticOp::Mul => Ok(a.mul(b)),
        ArithmeticOp::Div => a.div(b).ok_or(EvaluationError::DivisionByZero { node: NODE }),
        ArithmeticOp::Mod => a.rem(b).ok_or(EvaluationError::DivisionByZero { node: NODE }),
        ArithmeticOp::Pow => Ok(a.pow(b)),
    }
}

/// Whole-day durations keep a date a date; anything finer yields a date and
/// time starting at midnight.
fn shift_date(date: NaiveDate, delta: TimeDelta) -> Result<Value, EvaluationError> {
    if delta.num_seconds() % 86_400 == 0 && delta.subsec_nanos() == 0 {
        return date
            .checked_add_signed(delta)
            .map(Value::Date)
            .ok_or_else(overflow);
    }
    date.and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.checked_add_signed(delta))
        .map(Value::DateTime)
        .ok_or_else(overflow)
}

fn nanos(delta: TimeDelta) -> Result<i64, EvaluationError> {
    delta.num_nanoseconds().ok_or_else(overflow)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn scale(delta: TimeDelta, factor: f64) -> Result<TimeDelta, EvaluationError> {
    let scaled = nanos(delta)? as f64 * factor;
    if !scaled.is_finite() || scaled.abs() >= i64::MAX as f64 {
        return Err(overflow());
    }
    Ok(TimeDelta::nanoseconds(scaled.round() as i64))
}

fn overflow() -> EvaluationError {
    EvaluationError::InvalidOperation {
        node: NODE,
        detail: "temporal value out of range".to_owned(),
    }
}

/// Unary minus.
pub(super) fn negate(value: Value) -> Result<Value, EvaluationError> {
    match value {
        Value::Number(n) => Ok(Value::Number(n.neg())),
        Value::Duration(d) => Ok(Value::Duration(-d)),
        other => Err(EvaluationError::TypeMismatch {
            node: "negate",
            expected: "number or duration",
            found: other.kind(),
        }),
    }
}
