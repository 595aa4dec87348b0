use std::fmt;

use winnow::error::{ContextError, StrContext};

/// Malformed FEEL source.
///
/// `position` is the byte offset at which parsing gave up; `causes` lists,
/// innermost first, what the grammar was doing or expecting there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    expression: String,
    position: usize,
    line: usize,
    column: usize,
    causes: Vec<String>,
}

impl ParseError {
    pub(crate) fn new(expression: &str, position: usize, causes: Vec<String>) -> Self {
        let mut position = position.min(expression.len());
        while !expression.is_char_boundary(position) {
            position -= 1;
        }
        let before = &expression[..position];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        Self {
            expression: expression.to_owned(),
            position,
            line,
            column,
            causes,
        }
    }

    pub(crate) fn from_context(expression: &str, position: usize, error: &ContextError) -> Self {
        let mut causes: Vec<String> = error
            .context()
            .map(|ctx| match ctx {
                StrContext::Label(label) => format!("while parsing {label}"),
                StrContext::Expected(expected) => format!("expected {expected}"),
                _ => ctx.to_string(),
            })
            .collect();
        if causes.is_empty() {
            causes.push(if position >= expression.len() {
                "unexpected end of input".to_owned()
            } else {
                "unexpected input".to_owned()
            });
        }
        Self::new(expression, position, causes)
    }

    /// The source text that failed to parse.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Byte offset of the failure.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// 1-based line of the failure.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-based column (in characters) of the failure.
    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }

    #[must_use]
    pub fn causes(&self) -> &[String] {
        &self.causes
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parse error at {}:{} in {:?}: {}",
            self.line,
            self.column,
            self.expression,
            self.causes.join("; ")
        )
    }
}

impl std::error::Error for ParseError {}
