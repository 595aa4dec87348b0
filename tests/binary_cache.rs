#![cfg(feature = "binary-cache")]

use feelin::serial::DeserializeError;
use feelin::{CompiledExpression, Engine, EngineError, EvaluationContext, Value};

const SOURCE: &str = "if applicant.age >= 18 and applicant.region in [\"eu\", \"us\"] \
                      then sum(applicant.scores[item > 50]) else 0";

fn ctx() -> EvaluationContext {
    EvaluationContext::new()
        .set("applicant.age", 30_i64)
        .set("applicant.region", "eu")
        .set(
            "applicant.scores",
            Value::List(vec![40_i64.into(), 60_i64.into(), 90_i64.into()]),
        )
}

// ---------------------------------------------------------------------------
// Round-trip
// ---------------------------------------------------------------------------

#[test]
fn round_trip_preserves_behaviour() {
    let engine = Engine::new();
    let original = engine.parse_and_compile(SOURCE).unwrap();
    let bytes = original.to_bytes().unwrap();
    let restored = CompiledExpression::from_bytes(&bytes).unwrap();

    assert_eq!(restored, original);
    assert_eq!(restored.source(), SOURCE);
    assert_eq!(
        engine.evaluate(&restored, &ctx()).unwrap(),
        Value::from(150_i64)
    );
}

#[test]
fn temporal_literals_survive() {
    let source = "date(\"2024-01-31\") + duration(\"P1DT2H\")";
    let engine = Engine::new();
    let original = engine.parse_and_compile(source).unwrap();
    let restored = CompiledExpression::from_bytes(&original.to_bytes().unwrap()).unwrap();
    let empty = EvaluationContext::new();
    assert_eq!(
        engine.evaluate(&restored, &empty).unwrap(),
        engine.evaluate(&original, &empty).unwrap()
    );
}

// ---------------------------------------------------------------------------
// Engine::load
// ---------------------------------------------------------------------------

#[test]
fn load_seeds_the_cache() {
    let bytes = Engine::new()
        .parse_and_compile(SOURCE)
        .unwrap()
        .to_bytes()
        .unwrap();

    let engine = Engine::new();
    let loaded = engine.load(&bytes).unwrap();
    assert_eq!(loaded.source(), SOURCE);

    engine.parse_and_compile(SOURCE).unwrap();
    let stats = engine.cache_stats().unwrap();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 0);
}

#[test]
fn load_without_cache_still_decodes() {
    let bytes = Engine::new()
        .parse_and_compile("1 + 1")
        .unwrap()
        .to_bytes()
        .unwrap();
    let engine = Engine::builder().cache(false).build();
    let loaded = engine.load(&bytes).unwrap();
    assert_eq!(
        engine.evaluate(&loaded, &EvaluationContext::new()).unwrap(),
        Value::from(2_i64)
    );
}

// ---------------------------------------------------------------------------
// Corruption
// ---------------------------------------------------------------------------

fn valid_bytes() -> Vec<u8> {
    Engine::new()
        .parse_and_compile(SOURCE)
        .unwrap()
        .to_bytes()
        .unwrap()
}

#[test]
fn flipped_payload_byte_fails_checksum() {
    let mut bytes = valid_bytes();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    assert!(matches!(
        CompiledExpression::from_bytes(&bytes),
        Err(DeserializeError::ChecksumMismatch)
    ));
}

#[test]
fn wrong_magic() {
    let mut bytes = valid_bytes();
    bytes[0] = b'X';
    assert!(matches!(
        CompiledExpression::from_bytes(&bytes),
        Err(DeserializeError::BadMagic)
    ));
}

#[test]
fn future_format_version() {
    let mut bytes = valid_bytes();
    bytes[4..6].copy_from_slice(&99_u16.to_le_bytes());
    assert!(matches!(
        CompiledExpression::from_bytes(&bytes),
        Err(DeserializeError::IncompatibleVersion { blob: 99, .. })
    ));
}

#[test]
fn truncated_blob() {
    let bytes = valid_bytes();
    assert!(matches!(
        CompiledExpression::from_bytes(&bytes[..bytes.len() - 3]),
        Err(DeserializeError::LengthMismatch { .. })
    ));
    assert!(matches!(
        CompiledExpression::from_bytes(&bytes[..10]),
        Err(DeserializeError::LengthMismatch { .. })
    ));
}

#[test]
fn engine_load_wraps_decode_errors() {
    let engine = Engine::new();
    let err = engine.load(b"definitely not an expression blob").unwrap_err();
    assert!(matches!(err, EngineError::Deserialize(DeserializeError::BadMagic)));
    assert!(!err.is_compile_error());
}
