//! Pattern-based fallback for condition text the FEEL grammar rejects.
//!
//! Recognises only equality, comparison prefixes, closed ranges `[a..b]` and
//! comma-separated membership lists. Operands are read as loose literals:
//! quoted strings, numbers, booleans, `null`, or else the bare text.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::{Condition, Operator};
use crate::{Number, Value};

/// The heuristic tier could not make sense of the condition either.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot interpret condition {text:?}: {reason}")]
pub struct HeuristicError {
    pub text: String,
    pub reason: String,
}

struct Patterns {
    closed_range: Regex,
    any_range: Regex,
    comparison: Regex,
    list: Regex,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    closed_range: Regex::new(r"^\[\s*(.+?)\s*\.\.\s*(.+?)\s*\]$").unwrap(),
    any_range: Regex::new(r"^[\[\(\]].*\.\..*[\]\)\[]$").unwrap(),
    comparison: Regex::new(r"^(>=|<=|!=|==|=|>|<)\s*(.+)$").unwrap(),
    list: Regex::new(r"^[^,]+(,[^,]+)+$").unwrap(),
});

/// Interpret `text` as a simplified condition.
///
/// # Errors
///
/// [`HeuristicError`] for empty text, half-open ranges and comparison
/// operators without an operand.
pub fn parse(text: &str) -> Result<Condition, HeuristicError> {
    let text = text.trim();
    let fail = |reason: &str| HeuristicError {
        text: text.to_owned(),
        reason: reason.to_owned(),
    };
    if text.is_empty() {
        return Err(fail("empty condition"));
    }

    let patterns = &*PATTERNS;
    if let Some(caps) = patterns.closed_range.captures(text) {
        return Ok(Condition::new(
            Operator::Between,
            Value::List(vec![literal(&caps[1]), literal(&caps[2])]),
        ));
    }
    if patterns.any_range.is_match(text) {
        return Err(fail("half-open ranges not yet supported"));
    }
    if let Some(caps) = patterns.comparison.captures(text) {
        let operator = match &caps[1] {
            ">=" => Operator::Gte,
            "<=" => Operator::Lte,
            "!=" => Operator::Neq,
            ">" => Operator::Gt,
            "<" => Operator::Lt,
            _ => Operator::Eq,
        };
        return Ok(Condition::new(operator, literal(&caps[2])));
    }
    if patterns.list.is_match(text) {
        return Ok(Condition::new(
            Operator::In,
            Value::List(text.split(',').map(literal).collect()),
        ));
    }
    if text.starts_with(['<', '>', '=', '!']) {
        return Err(fail("comparison operator without an operand"));
    }
    Ok(Condition::new(Operator::Eq, literal(text)))
}

fn literal(token: &str) -> Value {
    let token = token.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = token
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return Value::from(inner);
        }
    }
    match token {
        "true" => return Value::Boolean(true),
        "false" => return Value::Boolean(false),
        "null" => return Value::Null,
        _ => {}
    }
    if let Ok(i) = token.parse::<i64>() {
        return Value::Number(Number::Int(i));
    }
    match token.parse::<f64>() {
        Ok(f) if f.is_finite() => Value::Number(Number::Float(f)),
        _ => Value::from(token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_word_is_equality() {
        assert_eq!(parse("gold").unwrap(), Condition::new(Operator::Eq, "gold"));
    }

    #[test]
    fn comparison_prefixes() {
        assert_eq!(parse(">= 10").unwrap(), Condition::new(Operator::Gte, 10_i64));
        assert_eq!(parse("==yes").unwrap(), Condition::new(Operator::Eq, "yes"));
        assert_eq!(parse("< 2.5").unwrap(), Condition::new(Operator::Lt, 2.5));
    }

    #[test]
    fn closed_range() {
        assert_eq!(
            parse("[1..10]").unwrap(),
            Condition::new(
                Operator::Between,
                Value::List(vec![1_i64.into(), 10_i64.into()])
            )
        );
    }

    #[test]
    fn half_open_range_is_rejected() {
        for text in ["[1..10)", "(1..10]", "]1..10["] {
            let err = parse(text).unwrap_err();
            assert_eq!(err.reason, "half-open ranges not yet supported", "{text}");
        }
    }

    #[test]
    fn comma_list_is_membership() {
        assert_eq!(
            parse("\"a\", 'b', 3").unwrap(),
            Condition::new(
                Operator::In,
                Value::List(vec!["a".into(), "b".into(), 3_i64.into()])
            )
        );
    }

    #[test]
    fn dangling_operator_and_empty_text() {
        assert!(parse("  ").is_err());
        assert_eq!(
            parse("!").unwrap_err().to_string(),
            "cannot interpret condition \"!\": comparison operator without an operand"
        );
    }
}
