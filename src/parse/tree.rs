use std::fmt;

/// Grammar production that produced a [`ParseTree`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeKind {
    Conditional,
    /// `text` is `some` or `every`; children are the variable name, the
    /// list and the condition.
    Quantified,
    For,
    Disjunction,
    Conjunction,
    /// `text` is the operator symbol.
    Comparison,
    Between,
    In,
    /// `text` is the type name.
    InstanceOf,
    /// Operands interleaved with [`TreeKind::Operator`] leaves.
    Sum,
    Product,
    Power,
    Negation,
    Not,
    /// A primary followed by one or more suffixes.
    Postfix,
    Property,
    Arguments,
    FilterSuffix,
    Parenthesized,
    Name,
    Number,
    /// Raw literal text between the quotes, escapes not yet resolved.
    String,
    Boolean,
    Null,
    List,
    Context,
    ContextEntry,
    /// `text` holds the opening and closing bracket characters.
    Range,
    Operator,
}

impl TreeKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TreeKind::Conditional => "conditional",
            TreeKind::Quantified => "quantified",
            TreeKind::For => "for",
            TreeKind::Disjunction => "disjunction",
            TreeKind::Conjunction => "conjunction",
            TreeKind::Comparison => "comparison",
            TreeKind::Between => "between",
            TreeKind::In => "in",
            TreeKind::InstanceOf => "instance-of",
            TreeKind::Sum => "sum",
            TreeKind::Product => "product",
            TreeKind::Power => "power",
            TreeKind::Negation => "negation",
            TreeKind::Not => "not",
            TreeKind::Postfix => "postfix",
            TreeKind::Property => "property",
            TreeKind::Arguments => "arguments",
            TreeKind::FilterSuffix => "filter",
            TreeKind::Parenthesized => "parenthesized",
            TreeKind::Name => "name",
            TreeKind::Number => "number",
            TreeKind::String => "string",
            TreeKind::Boolean => "boolean",
            TreeKind::Null => "null",
            TreeKind::List => "list",
            TreeKind::Context => "context",
            TreeKind::ContextEntry => "entry",
            TreeKind::Range => "range",
            TreeKind::Operator => "operator",
        }
    }
}

/// Concrete syntax tree produced by the grammar, before normalization into
/// [`Node`](crate::Node).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTree {
    pub kind: TreeKind,
    pub text: Option<String>,
    pub children: Vec<ParseTree>,
}

impl ParseTree {
    pub(crate) fn leaf(kind: TreeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: Some(text.into()),
            children: Vec::new(),
        }
    }

    pub(crate) fn node(kind: TreeKind, children: Vec<ParseTree>) -> Self {
        Self {
            kind,
            text: None,
            children,
        }
    }

    pub(crate) fn with_text(kind: TreeKind, text: impl Into<String>, children: Vec<ParseTree>) -> Self {
        Self {
            kind,
            text: Some(text.into()),
            children,
        }
    }

    /// The token text, or `""` for nodes without one.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// S-expression rendering, e.g. `(comparison ">" (name "age") (number "18"))`.
impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.kind.as_str())?;
        if let Some(text) = &self.text {
            write!(f, " {text:?}")?;
        }
        for child in &self.children {
            write!(f, " {child}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_sexpr() {
        let tree = ParseTree::with_text(
            TreeKind::Comparison,
            ">",
            vec![
                ParseTree::leaf(TreeKind::Name, "age"),
                ParseTree::leaf(TreeKind::Number, "18"),
            ],
        );
        assert_eq!(
            tree.to_string(),
            r#"(comparison ">" (name "age") (number "18"))"#
        );
    }

    #[test]
    fn text_defaults_to_empty() {
        let tree = ParseTree::node(TreeKind::List, vec![]);
        assert_eq!(tree.text(), "");
        assert_eq!(tree.to_string(), "(list)");
    }
}
