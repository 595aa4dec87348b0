mod error;
mod grammar;
mod tree;

pub use error::ParseError;
pub use tree::{ParseTree, TreeKind};

pub(crate) use grammar::{is_function_name, is_plain_name, MULTI_WORD_FUNCTIONS};

/// Parse FEEL source text into a [`ParseTree`].
///
/// # Errors
///
/// Returns [`ParseError`] with the failing position and the grammar's
/// explanation if the input is not a single well-formed expression.
pub fn parse(source: &str) -> Result<ParseTree, ParseError> {
    use winnow::Parser;
    grammar::root
        .parse(grammar::input(source))
        .map_err(|e| ParseError::from_context(source, e.offset(), e.inner()))
}
