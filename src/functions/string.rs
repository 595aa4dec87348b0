use regex::{Regex, RegexBuilder};

use super::{integer_arg, list_arg, optional, string_arg, Arity, FunctionRegistry};
use crate::types::temporal;
use crate::Value;

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(&["substring"], Arity::Between(2, 3), |args, _| {
        let text = string_arg(args, 0)?;
        let start = integer_arg(args, 1)?;
        let length = optional(args, 2)
            .map(|_| integer_arg(args, 2))
            .transpose()?;
        substring(text, start, length).map(Value::String)
    });

    registry.register(&["string length", "length"], Arity::Exact(1), |args, _| {
        let count = string_arg(args, 0)?.chars().count();
        Ok(Value::from(i64::try_from(count).map_err(|e| e.to_string())?))
    });

    registry.register(&["upper case", "upper"], Arity::Exact(1), |args, _| {
        Ok(Value::String(string_arg(args, 0)?.to_uppercase()))
    });

    registry.register(&["lower case", "lower"], Arity::Exact(1), |args, _| {
        Ok(Value::String(string_arg(args, 0)?.to_lowercase()))
    });

    registry.register(&["contains"], Arity::Exact(2), |args, _| {
        Ok(Value::Boolean(
            string_arg(args, 0)?.contains(string_arg(args, 1)?),
        ))
    });

    registry.register(&["starts with", "starts_with"], Arity::Exact(2), |args, _| {
        Ok(Value::Boolean(
            string_arg(args, 0)?.starts_with(string_arg(args, 1)?),
        ))
    });

    registry.register(&["ends with", "ends_with"], Arity::Exact(2), |args, _| {
        Ok(Value::Boolean(
            string_arg(args, 0)?.ends_with(string_arg(args, 1)?),
        ))
    });

    registry.register(
        &["substring before", "substring_before"],
        Arity::Exact(2),
        |args, _| {
            let text = string_arg(args, 0)?;
            let needle = string_arg(args, 1)?;
            Ok(Value::from(
                text.find(needle).map_or("", |i| &text[..i]),
            ))
        },
    );

    registry.register(
        &["substring after", "substring_after"],
        Arity::Exact(2),
        |args, _| {
            let text = string_arg(args, 0)?;
            let needle = string_arg(args, 1)?;
            Ok(Value::from(
                text.find(needle).map_or("", |i| &text[i + needle.len()..]),
            ))
        },
    );

    registry.register(&["replace"], Arity::Between(3, 4), |args, _| {
        let text = string_arg(args, 0)?;
        let pattern = compile(string_arg(args, 1)?, flags(args, 3)?)?;
        let replacement = string_arg(args, 2)?;
        Ok(Value::String(
            pattern.replace_all(text, replacement).into_owned(),
        ))
    });

    registry.register(&["matches"], Arity::Between(2, 3), |args, _| {
        let text = string_arg(args, 0)?;
        let pattern = compile(string_arg(args, 1)?, flags(args, 2)?)?;
        Ok(Value::Boolean(pattern.is_match(text)))
    });

    registry.register(&["split"], Arity::Exact(2), |args, _| {
        let text = string_arg(args, 0)?;
        let delimiter = compile(string_arg(args, 1)?, "")?;
        Ok(Value::List(
            delimiter.split(text).map(Value::from).collect(),
        ))
    });

    registry.register(&["string join"], Arity::Between(1, 2), |args, _| {
        let items = list_arg(args, 0)?;
        let delimiter = match optional(args, 1) {
            Some(_) => string_arg(args, 1)?,
            None => "",
        };
        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::String(s) => parts.push(s.as_str()),
                Value::Null => {}
                other => return Err(format!("cannot join {}", other.kind())),
            }
        }
        Ok(Value::String(parts.join(delimiter)))
    });

    registry.register(&["string"], Arity::Exact(1), |args, _| {
        Ok(to_feel_string(&args[0]).map_or(Value::Null, Value::String))
    });
}

/// FEEL `substring`: 1-based `start`, negative counts from the end.
fn substring(text: &str, start: i64, length: Option<i64>) -> Result<String, String> {
    let chars: Vec<char> = text.chars().collect();
    let len = i64::try_from(chars.len()).map_err(|e| e.to_string())?;
    let begin = match start {
        0 => return Err("start position must not be 0".to_owned()),
        s if s > 0 => s - 1,
        s => len + s,
    }
    .clamp(0, len);
    let end = match length {
        Some(l) if l < 0 => return Err("length must not be negative".to_owned()),
        Some(l) => begin.saturating_add(l).min(len),
        None => len,
    };
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    Ok(chars[begin as usize..end as usize].iter().collect())
}

fn flags(args: &[Value], i: usize) -> Result<&str, String> {
    match optional(args, i) {
        Some(_) => string_arg(args, i),
        None => Ok(""),
    }
}

fn compile(pattern: &str, flags: &str) -> Result<Regex, String> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            's' => builder.dot_matches_new_line(true),
            'm' => builder.multi_line(true),
            'x' => builder.ignore_whitespace(true),
            other => return Err(format!("unknown regex flag '{other}'")),
        };
    }
    builder
        .build()
        .map_err(|e| format!("invalid pattern '{pattern}': {e}"))
}

/// Plain-text rendering used by `string()`. `None` for null.
pub(crate) fn to_feel_string(value: &Value) -> Option<String> {
    Some(match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Date(d) => d.to_string(),
        Value::Time(t) => t.to_string(),
        Value::DateTime(dt) => temporal::format_date_time(dt),
        Value::Duration(d) => temporal::format_duration(d),
        other => other.to_string(),
    })
}
