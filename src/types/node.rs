use std::fmt;

use super::number::Number;
use super::value::{write_context_key, write_string_literal};

/// Comparison operators supported in expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "binary-cache",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub(crate) fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "=" => CompareOp::Eq,
            "!=" => CompareOp::Neq,
            ">" => CompareOp::Gt,
            ">=" => CompareOp::Gte,
            "<" => CompareOp::Lt,
            "<=" => CompareOp::Lte,
            _ => return None,
        })
    }
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "binary-cache",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl ArithmeticOp {
    pub(crate) fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => ArithmeticOp::Add,
            "-" => ArithmeticOp::Sub,
            "*" => ArithmeticOp::Mul,
            "/" => ArithmeticOp::Div,
            "%" => ArithmeticOp::Mod,
            "**" => ArithmeticOp::Pow,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "binary-cache",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Quantifier {
    Some,
    Every,
}

/// Type names accepted on the right of `instance of`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "binary-cache",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum TypeName {
    Number,
    String,
    Boolean,
    Date,
    Time,
    DateTime,
    Duration,
    List,
    Context,
    Range,
}

impl TypeName {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "number" => TypeName::Number,
            "string" => TypeName::String,
            "boolean" => TypeName::Boolean,
            "date" => TypeName::Date,
            "time" => TypeName::Time,
            "date and time" => TypeName::DateTime,
            "duration" => TypeName::Duration,
            "list" => TypeName::List,
            "context" => TypeName::Context,
            "range" => TypeName::Range,
            _ => return None,
        })
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TypeName::Number => "number",
            TypeName::String => "string",
            TypeName::Boolean => "boolean",
            TypeName::Date => "date",
            TypeName::Time => "time",
            TypeName::DateTime => "date and time",
            TypeName::Duration => "duration",
            TypeName::List => "list",
            TypeName::Context => "context",
            TypeName::Range => "range",
        }
    }
}

/// The FEEL abstract syntax tree.
///
/// Built once per distinct source string by the transformer and never
/// mutated afterwards. Every variant holds exactly the fields it needs, so
/// the evaluator's dispatch is exhaustive.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "binary-cache",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Node {
    Null,
    Number(Number),
    String(String),
    Boolean(bool),
    /// A name resolved against the evaluation context.
    Field(String),
    List(Vec<Node>),
    Context(Vec<(String, Node)>),
    Range {
        start: Box<Node>,
        end: Box<Node>,
        start_inclusive: bool,
        end_inclusive: bool,
    },
    Arithmetic {
        op: ArithmeticOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Unary arithmetic negation.
    Negate(Box<Node>),
    Comparison {
        op: CompareOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Not(Box<Node>),
    Between {
        value: Box<Node>,
        min: Box<Node>,
        max: Box<Node>,
    },
    In {
        value: Box<Node>,
        target: Box<Node>,
    },
    InstanceOf {
        value: Box<Node>,
        type_name: TypeName,
    },
    PropertyAccess {
        object: Box<Node>,
        property: String,
    },
    FunctionCall {
        name: String,
        arguments: Vec<Node>,
    },
    Conditional {
        condition: Box<Node>,
        then: Box<Node>,
        otherwise: Box<Node>,
    },
    Quantified {
        quantifier: Quantifier,
        variable: String,
        list: Box<Node>,
        condition: Box<Node>,
    },
    For {
        variable: String,
        list: Box<Node>,
        body: Box<Node>,
    },
    Filter {
        list: Box<Node>,
        condition: Box<Node>,
    },
}

impl Node {
    /// Short name of the variant, used to attribute evaluation errors.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Number(_) => "number",
            Node::String(_) => "string",
            Node::Boolean(_) => "boolean",
            Node::Field(_) => "field",
            Node::List(_) => "list",
            Node::Context(_) => "context",
            Node::Range { .. } => "range",
            Node::Arithmetic { .. } => "arithmetic",
            Node::Negate(_) => "negate",
            Node::Comparison { .. } => "comparison",
            Node::And(_, _) => "and",
            Node::Or(_, _) => "or",
            Node::Not(_) => "not",
            Node::Between { .. } => "between",
            Node::In { .. } => "in",
            Node::InstanceOf { .. } => "instance of",
            Node::PropertyAccess { .. } => "property access",
            Node::FunctionCall { .. } => "function call",
            Node::Conditional { .. } => "conditional",
            Node::Quantified { .. } => "quantified",
            Node::For { .. } => "for",
            Node::Filter { .. } => "filter",
        }
    }

    /// Whether the node is a literal constant.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Node::Null | Node::Number(_) | Node::String(_) | Node::Boolean(_)
        )
    }

    fn needs_parens_as_postfix_base(&self) -> bool {
        !matches!(
            self,
            Node::Field(_)
                | Node::PropertyAccess { .. }
                | Node::FunctionCall { .. }
                | Node::Filter { .. }
                | Node::List(_)
                | Node::Context(_)
        )
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "="),
            CompareOp::Neq => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
        }
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArithmeticOp::Add => write!(f, "+"),
            ArithmeticOp::Sub => write!(f, "-"),
            ArithmeticOp::Mul => write!(f, "*"),
            ArithmeticOp::Div => write!(f, "/"),
            ArithmeticOp::Mod => write!(f, "%"),
            ArithmeticOp::Pow => write!(f, "**"),
        }
    }
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantifier::Some => write!(f, "some"),
            Quantifier::Every => write!(f, "every"),
        }
    }
}

/// Renders fully parenthesized FEEL source that parses back to an equal
/// tree.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Null => write!(f, "null"),
            Node::Number(n) => write!(f, "{n}"),
            Node::String(s) => write_string_literal(f, s),
            Node::Boolean(b) => write!(f, "{b}"),
            Node::Field(name) => write!(f, "{name}"),
            Node::List(items) => {
                write!(f, "[")?;
                write_separated(f, items)?;
                write!(f, "]")
            }
            Node::Context(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_context_key(f, key)?;
                    write!(f, ": {value}")?;
                }
                write!(f, "}}")
            }
            Node::Range {
                start,
                end,
                start_inclusive,
                end_inclusive,
            } => {
                let open = if *start_inclusive { '[' } else { '(' };
                let close = if *end_inclusive { ']' } else { ')' };
                write!(f, "{open}{start}..{end}{close}")
            }
            Node::Arithmetic { op, left, right } => write!(f, "({left} {op} {right})"),
            Node::Negate(operand) => write!(f, "(-{operand})"),
            Node::Comparison { op, left, right } => write!(f, "({left} {op} {right})"),
            Node::And(a, b) => write!(f, "({a} and {b})"),
            Node::Or(a, b) => write!(f, "({a} or {b})"),
            Node::Not(inner) => write!(f, "(not {inner})"),
            Node::Between { value, min, max } => write!(f, "({value} between {min} and {max})"),
            Node::In { value, target } => write!(f, "({value} in {target})"),
            Node::InstanceOf { value, type_name } => {
                write!(f, "({value} instance of {})", type_name.as_str())
            }
            Node::PropertyAccess { object, property } => {
                write_postfix_base(f, object)?;
                write!(f, ".{property}")
            }
            Node::FunctionCall { name, arguments } => {
                write!(f, "{name}(")?;
                write_separated(f, arguments)?;
                write!(f, ")")
            }
            Node::Conditional {
                condition,
                then,
                otherwise,
            } => write!(f, "(if {condition} then {then} else {otherwise})"),
            Node::Quantified {
                quantifier,
                variable,
                list,
                condition,
            } => write!(f, "({quantifier} {variable} in {list} satisfies {condition})"),
            Node::For {
                variable,
                list,
                body,
            } => write!(f, "(for {variable} in {list} return {body})"),
            Node::Filter { list, condition } => {
                write_postfix_base(f, list)?;
                write!(f, "[{condition}]")
            }
        }
    }
}

fn write_separated(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{node}")?;
    }
    Ok(())
}

fn write_postfix_base(f: &mut fmt::Formatter<'_>, base: &Node) -> fmt::Result {
    if base.needs_parens_as_postfix_base() {
        write!(f, "({base})")
    } else {
        write!(f, "{base}")
    }
}
