use chrono::{Datelike, TimeDelta, Timelike};

use crate::{EvaluationError, Value};

const NODE: &str = "property access";

/// Resolve `value.name`.
///
/// Contexts look the key up (missing keys are null), lists project the
/// property over their elements, and temporal values and ranges expose their
/// components. A null object yields null.
pub(super) fn access(value: &Value, name: &str) -> Result<Value, EvaluationError> {
    let found = match value {
        Value::Null => Some(Value::Null),
        Value::Context(entries) => Some(entries.get(name).cloned().unwrap_or(Value::Null)),
        Value::List(items) => {
            return items
                .iter()
                .map(|item| access(item, name))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List);
        }
        Value::Date(d) => date_component(*d, name),
        Value::DateTime(dt) => {
            date_component(dt.date(), name).or_else(|| time_component(dt.time(), name))
        }
        Value::Time(t) => time_component(*t, name),
        Value::Duration(d) => duration_component(*d, name),
        Value::Range(range) => match name {
            "start" => Some(range.start().clone()),
            "end" => Some(range.end().clone()),
            _ => None,
        },
        _ => None,
    };
    found.ok_or_else(|| EvaluationError::InvalidOperation {
        node: NODE,
        detail: format!("{} has no property '{name}'", value.kind()),
    })
}

fn date_component(date: impl Datelike, name: &str) -> Option<Value> {
    Some(match name {
        "year" => Value::from(i64::from(date.year())),
        "month" => Value::from(i64::from(date.month())),
        "day" => Value::from(i64::from(date.day())),
        "weekday" => Value::from(i64::from(date.weekday().number_from_monday())),
        _ => return None,
    })
}

fn time_component(time: impl Timelike, name: &str) -> Option<Value> {
    Some(match name {
        "hour" => Value::from(i64::from(time.hour())),
        "minute" => Value::from(i64::from(time.minute())),
        "second" => Value::from(i64::from(time.second())),
        _ => return None,
    })
}

fn duration_component(delta: TimeDelta, name: &str) -> Option<Value> {
    Some(match name {
        "days" => Value::from(delta.num_days()),
        "hours" => Value::from(delta.num_hours() % 24),
        "minutes" => Value::from(delta.num_minutes() % 60),
        "seconds" => Value::from(delta.num_seconds() % 60),
        _ => return None,
    })
}
