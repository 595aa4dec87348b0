use feelin::{parse_and_compile, Engine, EngineError, TransformError};

fn parse_error(source: &str) -> feelin::ParseError {
    match parse_and_compile(source) {
        Err(EngineError::Parse(err)) => err,
        other => panic!("expected parse error for {source:?}, got {other:?}"),
    }
}

#[test]
fn dangling_operator_points_past_it() {
    let err = parse_error("1 + ");
    assert!(err.position() >= 2, "position {}", err.position());
    assert_eq!(err.expression(), "1 + ");
    assert!(!err.causes().is_empty());
}

#[test]
fn multi_line_source_reports_line_and_column() {
    let err = parse_error("a > 1 and\n  b <");
    assert_eq!(err.line(), 2);
    assert!(err.column() >= 4, "column {}", err.column());
    assert!(err.to_string().starts_with("parse error at 2:"));
}

#[test]
fn trailing_tokens_are_rejected() {
    let err = parse_error("1 2");
    assert_eq!(err.position(), 2);
}

#[test]
fn chained_comparisons_are_rejected() {
    parse_error("1 < 2 < 3");
}

#[test]
fn unbalanced_brackets() {
    for source in ["[1, 2", "(1 + 2", "{a: 1", "f(1,"] {
        parse_error(source);
    }
}

#[test]
fn reserved_words_cannot_be_names() {
    parse_error("if = 1");
}

#[test]
fn bad_unicode_escape_is_a_transform_error() {
    let err = parse_and_compile(r#""\u12""#).unwrap_err();
    assert!(err.is_compile_error());
    assert!(matches!(
        err,
        EngineError::Transform(TransformError::InvalidLiteral { .. })
    ));
}

#[test]
fn unknown_type_in_instance_of() {
    assert!(matches!(
        parse_and_compile("x instance of widget"),
        Err(EngineError::Transform(TransformError::Unsupported { .. }))
    ));
}

#[test]
fn compile_errors_are_not_cached() {
    let engine = Engine::new();
    assert!(engine.parse_and_compile("1 +").is_err());
    assert!(engine.parse_and_compile("1 +").is_err());
    let stats = engine.cache_stats().unwrap();
    assert_eq!(stats.entries, 0);
}
