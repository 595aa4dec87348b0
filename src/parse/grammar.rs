use winnow::ascii::{digit1, till_line_ending};
use winnow::combinator::{
    alt, cut_err, fail, not, opt, peek, preceded, repeat, separated, terminated,
};
use winnow::error::{ContextError, ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::stream::{Stateful, Stream};
use winnow::token::{any, one_of, take_till, take_until, take_while};

use super::tree::{ParseTree, TreeKind};

/// Recursion budget shared by `expression`, `unary` and the right operand of
/// `**`. One parenthesized level spends two units.
const MAX_NESTING: usize = 64;

/// Current recursion depth of the parser.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Nesting(usize);

pub(crate) type Input<'i> = Stateful<&'i str, Nesting>;

pub(crate) fn input(source: &str) -> Input<'_> {
    Stateful {
        input: source,
        state: Nesting::default(),
    }
}

const RESERVED: &[&str] = &[
    "and", "or", "not", "in", "between", "instance", "of", "if", "then", "else", "some", "every",
    "for", "return", "satisfies", "true", "false", "null",
];

/// Built-in names containing reserved words. They are only recognized
/// directly in front of an argument list.
pub(crate) const MULTI_WORD_FUNCTIONS: &[&str] =
    &["date and time", "index of", "day of week", "month of year"];

fn expected(what: &'static str) -> StrContext {
    StrContext::Expected(StrContextValue::Description(what))
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_reserved(word: &str) -> bool {
    RESERVED.contains(&word)
}

pub(crate) fn is_plain_name(text: &str) -> bool {
    let mut chars = text.chars();
    matches!(chars.next(), Some(c) if is_name_start(c)) && chars.all(is_name_char) && !is_reserved(text)
}

/// Whether a call to `name` can be written in FEEL source: a plain name,
/// plain names joined by single spaces, or one of [`MULTI_WORD_FUNCTIONS`].
pub(crate) fn is_function_name(name: &str) -> bool {
    MULTI_WORD_FUNCTIONS.contains(&name) || name.split(' ').all(is_plain_name)
}

/// Run `parser` one nesting level deeper, failing without recursion once the
/// budget is spent.
fn nested<'i, O>(
    input: &mut Input<'i>,
    mut parser: impl Parser<Input<'i>, O, ErrMode<ContextError>>,
) -> ModalResult<O> {
    if input.state.0 >= MAX_NESTING {
        return cut_err(fail)
            .context(expected("at most 64 levels of nesting"))
            .parse_next(input);
    }
    input.state.0 += 1;
    let result = parser.parse_next(input);
    input.state.0 -= 1;
    result
}

// -- Whitespace & comments --------------------------------------------------

fn spaces(input: &mut Input<'_>) -> ModalResult<()> {
    take_while(1.., |c: char| c.is_ascii_whitespace())
        .void()
        .parse_next(input)
}

fn ws(input: &mut Input<'_>) -> ModalResult<()> {
    repeat(
        0..,
        alt((
            spaces,
            ("//", till_line_ending).void(),
            (
                "/*",
                cut_err((take_until(0.., "*/"), "*/")).context(expected("end of block comment")),
            )
                .void(),
        )),
    )
    .parse_next(input)
}

// -- Tokens -----------------------------------------------------------------

fn keyword<'i>(word: &'static str) -> impl Parser<Input<'i>, &'i str, ErrMode<ContextError>> {
    terminated(word, not(one_of(is_name_char)))
}

fn identifier<'i>(input: &mut Input<'i>) -> ModalResult<&'i str> {
    (one_of(is_name_start), take_while(0.., is_name_char))
        .take()
        .parse_next(input)
}

fn name<'i>(input: &mut Input<'i>) -> ModalResult<&'i str> {
    identifier
        .verify(|word: &str| !is_reserved(word))
        .parse_next(input)
}

fn number<'i>(input: &mut Input<'i>) -> ModalResult<&'i str> {
    (digit1, opt(('.', digit1))).take().parse_next(input)
}

/// A double-quoted string. Returns the raw text between the quotes; escape
/// sequences are resolved by the transformer.
fn string_literal<'i>(input: &mut Input<'i>) -> ModalResult<&'i str> {
    let body = repeat::<_, _, (), _, _>(
        0..,
        alt((
            preceded('\\', any).void(),
            take_till(1.., ['"', '\\']).void(),
        )),
    )
    .take();
    preceded(
        '"',
        cut_err(terminated(body, '"')).context(expected("closing quote")),
    )
    .parse_next(input)
}

/// One of [`MULTI_WORD_FUNCTIONS`] followed by `(`.
fn multi_word_function(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    for &function in MULTI_WORD_FUNCTIONS {
        let checkpoint = input.checkpoint();
        if words(input, function).is_ok() && peek((ws, '(')).parse_next(input).is_ok() {
            return Ok(ParseTree::leaf(TreeKind::Name, function));
        }
        input.reset(&checkpoint);
    }
    fail.parse_next(input)
}

/// Two or more plain names followed by `(`, for functions such as
/// `credit score(...)` that are not built in.
fn spaced_function(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    let first = name.parse_next(input)?;
    let rest: Vec<&str> = repeat(1.., preceded(spaces, name)).parse_next(input)?;
    peek((ws, '(')).parse_next(input)?;
    let mut function = first.to_owned();
    for word in rest {
        function.push(' ');
        function.push_str(word);
    }
    Ok(ParseTree::leaf(TreeKind::Name, function))
}

fn words(input: &mut Input<'_>, phrase: &'static str) -> ModalResult<()> {
    for (i, word) in phrase.split(' ').enumerate() {
        if i > 0 {
            spaces.parse_next(input)?;
        }
        keyword(word).parse_next(input)?;
    }
    Ok(())
}

fn type_name(input: &mut Input<'_>) -> ModalResult<String> {
    alt((
        (
            keyword("date"),
            spaces,
            keyword("and"),
            spaces,
            keyword("time"),
        )
            .map(|_| "date and time".to_owned()),
        identifier.map(str::to_owned),
    ))
    .parse_next(input)
}

// -- Primary ----------------------------------------------------------------

fn primary(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    ws.parse_next(input)?;
    alt((
        number.map(|n| ParseTree::leaf(TreeKind::Number, n)),
        string_literal.map(|s| ParseTree::leaf(TreeKind::String, s)),
        keyword("true").map(|_| ParseTree::leaf(TreeKind::Boolean, "true")),
        keyword("false").map(|_| ParseTree::leaf(TreeKind::Boolean, "false")),
        keyword("null").map(|_| ParseTree::node(TreeKind::Null, Vec::new())),
        multi_word_function,
        spaced_function,
        bracketed,
        context_literal,
        name.map(|n| ParseTree::leaf(TreeKind::Name, n)),
    ))
    .context(expected("expression"))
    .parse_next(input)
}

/// Everything that opens with `[`, `(` or `]`: lists, parenthesized
/// expressions and ranges. The first inner expression is parsed once and the
/// token after it decides which of the three this is.
fn bracketed(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    let open = one_of(['[', '(', ']']).parse_next(input)?;
    if open == '[' && opt((ws, ']')).parse_next(input)?.is_some() {
        return Ok(ParseTree::node(TreeKind::List, Vec::new()));
    }

    let first = cut_err(expression).parse_next(input)?;
    ws.parse_next(input)?;

    let is_range = if open == ']' {
        cut_err("..").context(expected("'..'")).parse_next(input)?;
        true
    } else {
        opt("..").parse_next(input)?.is_some()
    };

    if is_range {
        let end = cut_err(expression)
            .context(StrContext::Label("range"))
            .parse_next(input)?;
        ws.parse_next(input)?;
        let close = cut_err(one_of([']', ')', '[']))
            .context(StrContext::Label("range"))
            .context(expected("closing bracket"))
            .parse_next(input)?;
        return Ok(ParseTree::with_text(
            TreeKind::Range,
            format!("{open}{close}"),
            vec![first, end],
        ));
    }

    if open == '(' {
        cut_err(')').context(expected("')'")).parse_next(input)?;
        return Ok(ParseTree::node(TreeKind::Parenthesized, vec![first]));
    }

    let rest: Vec<ParseTree> =
        repeat(0.., preceded((ws, ','), cut_err(expression))).parse_next(input)?;
    cut_err((ws, ']'))
        .context(StrContext::Label("list"))
        .context(expected("',' or ']'"))
        .parse_next(input)?;
    let mut items = Vec::with_capacity(rest.len() + 1);
    items.push(first);
    items.extend(rest);
    Ok(ParseTree::node(TreeKind::List, items))
}

fn context_literal(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    '{'.parse_next(input)?;
    let entries: Vec<ParseTree> = cut_err(terminated(
        separated(0.., context_entry, (ws, ',')),
        (ws, '}'),
    ))
    .context(StrContext::Label("context"))
    .parse_next(input)?;
    Ok(ParseTree::node(TreeKind::Context, entries))
}

fn context_entry(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    ws.parse_next(input)?;
    let key = alt((
        string_literal.map(|s| ParseTree::leaf(TreeKind::String, s)),
        identifier.map(|n| ParseTree::leaf(TreeKind::Name, n)),
    ))
    .parse_next(input)?;
    cut_err((ws, ':')).context(expected("':'")).parse_next(input)?;
    let value = cut_err(expression).parse_next(input)?;
    Ok(ParseTree::node(TreeKind::ContextEntry, vec![key, value]))
}

// -- Postfix & unary --------------------------------------------------------

fn suffix(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    ws.parse_next(input)?;
    alt((
        preceded('.', identifier).map(|p| ParseTree::leaf(TreeKind::Property, p)),
        call_arguments,
        filter_suffix,
    ))
    .parse_next(input)
}

fn call_arguments(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    '('.parse_next(input)?;
    let arguments: Vec<ParseTree> = cut_err(terminated(
        separated(0.., expression, (ws, ',')),
        (ws, ')'),
    ))
    .context(StrContext::Label("function arguments"))
    .parse_next(input)?;
    Ok(ParseTree::node(TreeKind::Arguments, arguments))
}

fn filter_suffix(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    '['.parse_next(input)?;
    let condition = cut_err(terminated(expression, (ws, ']')))
        .context(StrContext::Label("filter"))
        .parse_next(input)?;
    Ok(ParseTree::node(TreeKind::FilterSuffix, vec![condition]))
}

fn postfix(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    let base = primary(input)?;
    let suffixes: Vec<ParseTree> = repeat(0.., suffix).parse_next(input)?;
    if suffixes.is_empty() {
        return Ok(base);
    }
    let mut children = Vec::with_capacity(suffixes.len() + 1);
    children.push(base);
    children.extend(suffixes);
    Ok(ParseTree::node(TreeKind::Postfix, children))
}

fn unary(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    nested(input, unary_inner)
}

fn unary_inner(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    ws.parse_next(input)?;
    if opt('-').parse_next(input)?.is_some() {
        let operand = cut_err(unary).parse_next(input)?;
        return Ok(ParseTree::node(TreeKind::Negation, vec![operand]));
    }
    if opt(keyword("not")).parse_next(input)?.is_some() {
        let operand = cut_err(unary).parse_next(input)?;
        return Ok(ParseTree::node(TreeKind::Not, vec![operand]));
    }
    postfix(input)
}

// -- Arithmetic (precedence: sum < product < power < unary) -----------------

fn power(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    let base = unary(input)?;
    match opt(preceded((ws, "**"), cut_err(exponent))).parse_next(input)? {
        Some(rhs) => Ok(ParseTree::node(TreeKind::Power, vec![base, rhs])),
        None => Ok(base),
    }
}

fn exponent(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    nested(input, power)
}

fn interleave(kind: TreeKind, first: ParseTree, rest: Vec<(&str, ParseTree)>) -> ParseTree {
    if rest.is_empty() {
        return first;
    }
    let mut children = Vec::with_capacity(rest.len() * 2 + 1);
    children.push(first);
    for (op, operand) in rest {
        children.push(ParseTree::leaf(TreeKind::Operator, op));
        children.push(operand);
    }
    ParseTree::node(kind, children)
}

fn multiplicative(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    let first = power(input)?;
    let rest: Vec<(&str, ParseTree)> = repeat(
        0..,
        (
            preceded(ws, alt((terminated("*", not('*')), "/", "%"))),
            cut_err(power),
        ),
    )
    .parse_next(input)?;
    Ok(interleave(TreeKind::Product, first, rest))
}

fn additive(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    let first = multiplicative(input)?;
    let rest: Vec<(&str, ParseTree)> = repeat(
        0..,
        (preceded(ws, alt(("+", "-"))), cut_err(multiplicative)),
    )
    .parse_next(input)?;
    Ok(interleave(TreeKind::Sum, first, rest))
}

// -- Comparison level (does not chain) --------------------------------------

fn compare_op<'i>(input: &mut Input<'i>) -> ModalResult<&'i str> {
    alt(("<=", ">=", "!=", "=", "<", ">")).parse_next(input)
}

fn comparison(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    let left = additive(input)?;
    let checkpoint = input.checkpoint();
    ws.parse_next(input)?;

    if let Some(op) = opt(compare_op).parse_next(input)? {
        let right = cut_err(additive).parse_next(input)?;
        return Ok(ParseTree::with_text(TreeKind::Comparison, op, vec![left, right]));
    }

    if opt(keyword("between")).parse_next(input)?.is_some() {
        let min = cut_err(additive).parse_next(input)?;
        cut_err((ws, keyword("and")))
            .context(expected("'and'"))
            .parse_next(input)?;
        let max = cut_err(additive).parse_next(input)?;
        return Ok(ParseTree::node(TreeKind::Between, vec![left, min, max]));
    }

    if opt(keyword("instance")).parse_next(input)?.is_some() {
        cut_err((ws, keyword("of"), ws))
            .context(expected("'of'"))
            .parse_next(input)?;
        let type_name = cut_err(type_name)
            .context(expected("type name"))
            .parse_next(input)?;
        return Ok(ParseTree::with_text(TreeKind::InstanceOf, type_name, vec![left]));
    }

    if opt(keyword("in")).parse_next(input)?.is_some() {
        let target = cut_err(additive).parse_next(input)?;
        return Ok(ParseTree::node(TreeKind::In, vec![left, target]));
    }

    input.reset(&checkpoint);
    Ok(left)
}

// -- Boolean connectives (precedence: or < and < comparison) ----------------

fn conjunction(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    let first = comparison(input)?;
    let rest: Vec<ParseTree> =
        repeat(0.., preceded((ws, keyword("and")), cut_err(comparison))).parse_next(input)?;
    if rest.is_empty() {
        return Ok(first);
    }
    let mut operands = vec![first];
    operands.extend(rest);
    Ok(ParseTree::node(TreeKind::Conjunction, operands))
}

fn disjunction(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    let first = conjunction(input)?;
    let rest: Vec<ParseTree> =
        repeat(0.., preceded((ws, keyword("or")), cut_err(conjunction))).parse_next(input)?;
    if rest.is_empty() {
        return Ok(first);
    }
    let mut operands = vec![first];
    operands.extend(rest);
    Ok(ParseTree::node(TreeKind::Disjunction, operands))
}

// -- Top-level forms --------------------------------------------------------

fn conditional(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    keyword("if").parse_next(input)?;
    let condition = cut_err(expression).parse_next(input)?;
    cut_err((ws, keyword("then")))
        .context(StrContext::Label("if expression"))
        .context(expected("'then'"))
        .parse_next(input)?;
    let then = cut_err(expression).parse_next(input)?;
    cut_err((ws, keyword("else")))
        .context(StrContext::Label("if expression"))
        .context(expected("'else'"))
        .parse_next(input)?;
    let otherwise = cut_err(expression).parse_next(input)?;
    Ok(ParseTree::node(
        TreeKind::Conditional,
        vec![condition, then, otherwise],
    ))
}

/// `<name> in <expression>`, shared by quantified and `for` expressions.
fn binding(input: &mut Input<'_>) -> ModalResult<(ParseTree, ParseTree)> {
    ws.parse_next(input)?;
    let variable = name.context(expected("variable name")).parse_next(input)?;
    (ws, keyword("in"))
        .context(expected("'in'"))
        .parse_next(input)?;
    let list = expression.parse_next(input)?;
    Ok((ParseTree::leaf(TreeKind::Name, variable), list))
}

fn quantified(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    let quantifier = alt((keyword("some"), keyword("every"))).parse_next(input)?;
    let (variable, list) = cut_err(binding)
        .context(StrContext::Label("quantified expression"))
        .parse_next(input)?;
    cut_err((ws, keyword("satisfies")))
        .context(StrContext::Label("quantified expression"))
        .context(expected("'satisfies'"))
        .parse_next(input)?;
    let condition = cut_err(expression).parse_next(input)?;
    Ok(ParseTree::with_text(
        TreeKind::Quantified,
        quantifier,
        vec![variable, list, condition],
    ))
}

fn iteration(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    keyword("for").parse_next(input)?;
    let (variable, list) = cut_err(binding)
        .context(StrContext::Label("for expression"))
        .parse_next(input)?;
    cut_err((ws, keyword("return")))
        .context(StrContext::Label("for expression"))
        .context(expected("'return'"))
        .parse_next(input)?;
    let body = cut_err(expression).parse_next(input)?;
    Ok(ParseTree::node(TreeKind::For, vec![variable, list, body]))
}

pub(crate) fn expression(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    nested(input, expression_inner)
}

fn expression_inner(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    ws.parse_next(input)?;
    alt((conditional, quantified, iteration, disjunction)).parse_next(input)
}

pub(crate) fn root(input: &mut Input<'_>) -> ModalResult<ParseTree> {
    terminated(expression, ws).parse_next(input)
}
