use std::collections::HashSet;

use crate::parse::{ParseTree, TreeKind};
use crate::{ArithmeticOp, CompareOp, Node, Number, Quantifier, TransformError, TypeName};

/// Convert a concrete parse tree into the canonical AST.
///
/// Repeated `or`/`and` operands fold into left-deep binary chains, literal
/// tokens become typed nodes, `name(args)` becomes a function call and
/// postfix suffixes are applied to their base in encounter order.
///
/// # Errors
///
/// Returns [`TransformError`] for tree shapes that do not correspond to a
/// well-formed expression (missing operands, bad literals, duplicate context
/// keys, unknown `instance of` types, calls on non-name targets).
pub fn to_ast(tree: &ParseTree) -> Result<Node, TransformError> {
    match tree.kind {
        TreeKind::Null => Ok(Node::Null),
        TreeKind::Boolean => match tree.text() {
            "true" => Ok(Node::Boolean(true)),
            "false" => Ok(Node::Boolean(false)),
            other => Err(invalid_literal(other, "not a boolean")),
        },
        TreeKind::Number => number_literal(tree.text()).map(Node::Number),
        TreeKind::String => unescape(tree.text()).map(Node::String),
        TreeKind::Name => Ok(Node::Field(tree.text().to_owned())),
        TreeKind::List => Ok(Node::List(all(&tree.children)?)),
        TreeKind::Context => context(tree),
        TreeKind::Range => range(tree),
        TreeKind::Parenthesized => {
            let [inner] = children(tree)?;
            to_ast(inner)
        }
        TreeKind::Disjunction => fold_logical(tree, Node::Or),
        TreeKind::Conjunction => fold_logical(tree, Node::And),
        TreeKind::Comparison => {
            let op = CompareOp::from_symbol(tree.text())
                .ok_or_else(|| malformed(tree, format!("unknown operator '{}'", tree.text())))?;
            let [left, right] = children(tree)?;
            Ok(Node::Comparison {
                op,
                left: boxed(left)?,
                right: boxed(right)?,
            })
        }
        TreeKind::Between => {
            let [value, min, max] = children(tree)?;
            Ok(Node::Between {
                value: boxed(value)?,
                min: boxed(min)?,
                max: boxed(max)?,
            })
        }
        TreeKind::In => {
            let [value, target] = children(tree)?;
            Ok(Node::In {
                value: boxed(value)?,
                target: boxed(target)?,
            })
        }
        TreeKind::InstanceOf => {
            let type_name =
                TypeName::from_name(tree.text()).ok_or_else(|| TransformError::Unsupported {
                    detail: format!("unknown type '{}' in instance of", tree.text()),
                })?;
            let [value] = children(tree)?;
            Ok(Node::InstanceOf {
                value: boxed(value)?,
                type_name,
            })
        }
        TreeKind::Sum | TreeKind::Product => arithmetic_chain(tree),
        TreeKind::Power => {
            let [base, exponent] = children(tree)?;
            Ok(Node::Arithmetic {
                op: ArithmeticOp::Pow,
                left: boxed(base)?,
                right: boxed(exponent)?,
            })
        }
        TreeKind::Negation => {
            let [operand] = children(tree)?;
            Ok(match to_ast(operand)? {
                Node::Number(n) => Node::Number(n.neg()),
                other => Node::Negate(Box::new(other)),
            })
        }
        TreeKind::Not => {
            let [operand] = children(tree)?;
            Ok(Node::Not(boxed(operand)?))
        }
        TreeKind::Postfix => postfix(tree),
        TreeKind::Conditional => {
            let [condition, then, otherwise] = children(tree)?;
            Ok(Node::Conditional {
                condition: boxed(condition)?,
                then: boxed(then)?,
                otherwise: boxed(otherwise)?,
            })
        }
        TreeKind::Quantified => {
            let quantifier = match tree.text() {
                "some" => Quantifier::Some,
                "every" => Quantifier::Every,
                other => return Err(malformed(tree, format!("unknown quantifier '{other}'"))),
            };
            let [variable, list, condition] = children(tree)?;
            Ok(Node::Quantified {
                quantifier,
                variable: variable_name(tree, variable)?,
                list: boxed(list)?,
                condition: boxed(condition)?,
            })
        }
        TreeKind::For => {
            let [variable, list, body] = children(tree)?;
            Ok(Node::For {
                variable: variable_name(tree, variable)?,
                list: boxed(list)?,
                body: boxed(body)?,
            })
        }
        TreeKind::Property
        | TreeKind::Arguments
        | TreeKind::FilterSuffix
        | TreeKind::ContextEntry
        | TreeKind::Operator => Err(malformed(tree, "fragment outside of its parent")),
    }
}

fn malformed(tree: &ParseTree, detail: impl Into<String>) -> TransformError {
    TransformError::Malformed {
        kind: tree.kind.as_str(),
        detail: detail.into(),
        tree: tree.to_string(),
    }
}

fn invalid_literal(text: &str, detail: impl Into<String>) -> TransformError {
    TransformError::InvalidLiteral {
        text: text.to_owned(),
        detail: detail.into(),
    }
}

fn children<const N: usize>(tree: &ParseTree) -> Result<[&ParseTree; N], TransformError> {
    let refs: Vec<&ParseTree> = tree.children.iter().collect();
    <[&ParseTree; N]>::try_from(refs).map_err(|refs| {
        malformed(
            tree,
            format!("expected {N} operand(s), found {}", refs.len()),
        )
    })
}

fn boxed(tree: &ParseTree) -> Result<Box<Node>, TransformError> {
    to_ast(tree).map(Box::new)
}

fn all(trees: &[ParseTree]) -> Result<Vec<Node>, TransformError> {
    trees.iter().map(to_ast).collect()
}

fn variable_name(parent: &ParseTree, tree: &ParseTree) -> Result<String, TransformError> {
    match tree.kind {
        TreeKind::Name => Ok(tree.text().to_owned()),
        _ => Err(malformed(parent, format!("expected variable name, found {tree}"))),
    }
}

fn fold_logical(
    tree: &ParseTree,
    combine: fn(Box<Node>, Box<Node>) -> Node,
) -> Result<Node, TransformError> {
    let (first, rest) = tree
        .children
        .split_first()
        .ok_or_else(|| malformed(tree, "no operands"))?;
    rest.iter().try_fold(to_ast(first)?, |acc, operand| {
        Ok(combine(Box::new(acc), boxed(operand)?))
    })
}

fn arithmetic_chain(tree: &ParseTree) -> Result<Node, TransformError> {
    let mut parts = tree.children.iter();
    let first = parts
        .next()
        .ok_or_else(|| malformed(tree, "no operands"))?;
    let mut acc = to_ast(first)?;
    while let Some(op_tree) = parts.next() {
        let op = match op_tree.kind {
            TreeKind::Operator => ArithmeticOp::from_symbol(op_tree.text()),
            _ => None,
        }
        .ok_or_else(|| malformed(tree, format!("expected operator, found {op_tree}")))?;
        let operand = parts
            .next()
            .ok_or_else(|| malformed(tree, format!("operator '{op}' has no right operand")))?;
        acc = Node::Arithmetic {
            op,
            left: Box::new(acc),
            right: boxed(operand)?,
        };
    }
    Ok(acc)
}

fn postfix(tree: &ParseTree) -> Result<Node, TransformError> {
    let (base, suffixes) = tree
        .children
        .split_first()
        .ok_or_else(|| malformed(tree, "no base expression"))?;
    let mut acc = to_ast(base)?;
    for suffix in suffixes {
        acc = match suffix.kind {
            TreeKind::Property => Node::PropertyAccess {
                object: Box::new(acc),
                property: suffix.text().to_owned(),
            },
            TreeKind::FilterSuffix => {
                let [condition] = children(suffix)?;
                Node::Filter {
                    list: Box::new(acc),
                    condition: boxed(condition)?,
                }
            }
            TreeKind::Arguments => match acc {
                Node::Field(name) => Node::FunctionCall {
                    name,
                    arguments: all(&suffix.children)?,
                },
                other => {
                    return Err(TransformError::Unsupported {
                        detail: format!("cannot call {other}; only named functions are callable"),
                    })
                }
            },
            _ => return Err(malformed(tree, format!("unexpected suffix {suffix}"))),
        };
    }
    Ok(acc)
}

fn context(tree: &ParseTree) -> Result<Node, TransformError> {
    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(tree.children.len());
    for entry in &tree.children {
        if entry.kind != TreeKind::ContextEntry {
            return Err(malformed(tree, format!("expected context entry, found {entry}")));
        }
        let [key, value] = children(entry)?;
        let key = match key.kind {
            TreeKind::Name => key.text().to_owned(),
            TreeKind::String => unescape(key.text())?,
            _ => return Err(malformed(entry, format!("invalid context key {key}"))),
        };
        if !seen.insert(key.clone()) {
            return Err(malformed(tree, format!("duplicate context key '{key}'")));
        }
        entries.push((key, to_ast(value)?));
    }
    Ok(Node::Context(entries))
}

fn range(tree: &ParseTree) -> Result<Node, TransformError> {
    let mut brackets = tree.text().chars();
    let (start_inclusive, end_inclusive) = match (brackets.next(), brackets.next()) {
        (Some(open @ ('[' | '(' | ']')), Some(close @ (']' | ')' | '['))) => {
            (open == '[', close == ']')
        }
        _ => return Err(malformed(tree, format!("invalid brackets '{}'", tree.text()))),
    };
    let [start, end] = children(tree)?;
    Ok(Node::Range {
        start: boxed(start)?,
        end: boxed(end)?,
        start_inclusive,
        end_inclusive,
    })
}

/// Integer when the text has no decimal point and fits in an `i64`.
fn number_literal(text: &str) -> Result<Number, TransformError> {
    if !text.contains('.') {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Number::Int(i));
        }
    }
    text.parse::<f64>()
        .map(Number::Float)
        .map_err(|e| invalid_literal(text, e.to_string()))
}

/// Resolve backslash escapes. Unknown escapes are kept verbatim so regular
/// expression patterns like `"\d+"` survive.
fn unescape(raw: &str) -> Result<String, TransformError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let decoded = (hex.len() == 4)
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        invalid_literal(raw, format!("invalid unicode escape '\\u{hex}'"))
                    })?;
                out.push(decoded);
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => return Err(invalid_literal(raw, "dangling backslash")),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse;

    fn ast(source: &str) -> Node {
        to_ast(&parse(source).unwrap()).unwrap()
    }

    fn field(name: &str) -> Box<Node> {
        Box::new(Node::Field(name.to_owned()))
    }

    #[test]
    fn or_chain_folds_left_deep() {
        assert_eq!(
            ast("a or b or c"),
            Node::Or(Box::new(Node::Or(field("a"), field("b"))), field("c"))
        );
    }

    #[test]
    fn arithmetic_is_left_associative() {
        assert_eq!(ast("10 - 4 - 3").to_string(), "((10 - 4) - 3)");
        assert_eq!(ast("8 / 4 * 2").to_string(), "((8 / 4) * 2)");
    }

    #[test]
    fn number_literals_are_typed() {
        assert_eq!(ast("7"), Node::Number(Number::Int(7)));
        assert_eq!(ast("7.5"), Node::Number(Number::Float(7.5)));
        assert_eq!(ast("-7"), Node::Number(Number::Int(-7)));
        assert_eq!(
            ast("99999999999999999999"),
            Node::Number(Number::Float(1e20))
        );
    }

    #[test]
    fn negation_of_non_literal_is_kept() {
        assert_eq!(ast("-x"), Node::Negate(field("x")));
    }

    #[test]
    fn string_escapes_resolved() {
        assert_eq!(
            ast(r#""a\"b\\c\nA""#),
            Node::String("a\"b\\c\nA".to_owned())
        );
        assert_eq!(ast(r#""\d+""#), Node::String("\\d+".to_owned()));
    }

    #[test]
    fn bad_unicode_escape_rejected() {
        let tree = parse(r#""\u12""#).unwrap();
        assert!(matches!(
            to_ast(&tree),
            Err(TransformError::InvalidLiteral { .. })
        ));
    }

    #[test]
    fn call_on_name_becomes_function_call() {
        assert_eq!(
            ast("count([1, 2])"),
            Node::FunctionCall {
                name: "count".to_owned(),
                arguments: vec![Node::List(vec![
                    Node::Number(Number::Int(1)),
                    Node::Number(Number::Int(2)),
                ])],
            }
        );
        assert_eq!(ast("count"), Node::Field("count".to_owned()));
    }

    #[test]
    fn call_on_expression_is_unsupported() {
        let tree = parse("[1](2)").unwrap();
        assert!(matches!(
            to_ast(&tree),
            Err(TransformError::Unsupported { .. })
        ));
    }

    #[test]
    fn postfix_applies_in_order() {
        assert_eq!(ast("a.b[x > 1].c").to_string(), "a.b[(x > 1)].c");
    }

    #[test]
    fn range_inclusivity_from_brackets() {
        match ast("(1..5]") {
            Node::Range {
                start_inclusive,
                end_inclusive,
                ..
            } => {
                assert!(!start_inclusive);
                assert!(end_inclusive);
            }
            other => panic!("expected Range, got {other:?}"),
        }
        match ast("]1..5[") {
            Node::Range {
                start_inclusive,
                end_inclusive,
                ..
            } => {
                assert!(!start_inclusive);
                assert!(!end_inclusive);
            }
            other => panic!("expected Range, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_context_key_rejected() {
        let tree = parse("{a: 1, \"a\": 2}").unwrap();
        let err = to_ast(&tree).unwrap_err();
        assert!(err.to_string().contains("duplicate context key 'a'"));
    }

    #[test]
    fn between_missing_max_is_malformed() {
        let tree = ParseTree::node(
            TreeKind::Between,
            vec![
                ParseTree::leaf(TreeKind::Name, "x"),
                ParseTree::leaf(TreeKind::Number, "1"),
            ],
        );
        match to_ast(&tree) {
            Err(TransformError::Malformed { kind, detail, .. }) => {
                assert_eq!(kind, "between");
                assert!(detail.contains("expected 3"));
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn unknown_instance_type_rejected() {
        let tree = parse("x instance of widget").unwrap();
        assert!(matches!(
            to_ast(&tree),
            Err(TransformError::Unsupported { .. })
        ));
    }

    #[test]
    fn stray_fragment_is_malformed() {
        let tree = ParseTree::leaf(TreeKind::Operator, "+");
        assert!(matches!(
            to_ast(&tree),
            Err(TransformError::Malformed { .. })
        ));
    }

    #[test]
    fn display_round_trips_through_parser() {
        for source in [
            "if a > 1 then [1, 2] else {x: \"y\"}",
            "some x in xs satisfies x.price >= 10 and not x.sold",
            "for i in [1..3] return i ** 2 % 5",
            "string length(name) between 2 and 5",
            "-x.y[2] in (1..10]",
            "d instance of date and time",
        ] {
            let first = ast(source);
            let again = ast(&first.to_string());
            assert_eq!(first, again, "{source}");
        }
    }
}
