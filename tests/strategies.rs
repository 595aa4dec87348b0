#![allow(dead_code)]

use feelin::{EvaluationContext, Number, RangeValue, Value};
use indexmap::IndexMap;
use proptest::prelude::*;

// --- Fixed field schema ---
// user.age    : number (0..=120)
// user.status : string, one of {"active", "inactive", "suspended"}
// user.banned : boolean
// user.region : string, one of {"us-east", "us-west", "eu", "ap"}

pub const STATUSES: &[&str] = &["active", "inactive", "suspended"];
pub const REGIONS: &[&str] = &["us-east", "us-west", "eu", "ap"];

/// One generated input row for the fixed schema.
#[derive(Debug, Clone)]
pub struct Sample {
    pub age: i64,
    pub status: &'static str,
    pub banned: bool,
    pub region: &'static str,
}

impl Sample {
    #[must_use]
    pub fn context(&self) -> EvaluationContext {
        EvaluationContext::new()
            .set("user.age", self.age)
            .set("user.status", self.status)
            .set("user.banned", self.banned)
            .set("user.region", self.region)
    }
}

pub fn arb_sample() -> impl Strategy<Value = Sample> {
    (
        0_i64..=120,
        prop::sample::select(STATUSES),
        any::<bool>(),
        prop::sample::select(REGIONS),
    )
        .prop_map(|(age, status, banned, region)| Sample {
            age,
            status,
            banned,
            region,
        })
}

/// A boolean FEEL expression over the fixed schema, paired with a direct
/// Rust oracle for its value.
#[derive(Debug, Clone)]
pub enum GenExpr {
    Age(&'static str, i64),
    AgeBetween(i64, i64),
    Status(bool, &'static str),
    Banned(bool),
    RegionIn(Vec<&'static str>),
    And(Box<GenExpr>, Box<GenExpr>),
    Or(Box<GenExpr>, Box<GenExpr>),
    Not(Box<GenExpr>),
}

impl GenExpr {
    /// FEEL source text for this expression.
    #[must_use]
    pub fn source(&self) -> String {
        match self {
            GenExpr::Age(op, v) => format!("user.age {op} {v}"),
            GenExpr::AgeBetween(lo, hi) => format!("user.age between {lo} and {hi}"),
            GenExpr::Status(true, s) => format!("user.status = \"{s}\""),
            GenExpr::Status(false, s) => format!("user.status != \"{s}\""),
            GenExpr::Banned(b) => format!("user.banned = {b}"),
            GenExpr::RegionIn(regions) => {
                let items: Vec<String> = regions.iter().map(|r| format!("\"{r}\"")).collect();
                format!("user.region in [{}]", items.join(", "))
            }
            GenExpr::And(a, b) => format!("({}) and ({})", a.source(), b.source()),
            GenExpr::Or(a, b) => format!("({}) or ({})", a.source(), b.source()),
            GenExpr::Not(inner) => format!("not({})", inner.source()),
        }
    }

    /// Expected result for `sample`.
    #[must_use]
    pub fn holds(&self, sample: &Sample) -> bool {
        match self {
            GenExpr::Age(op, v) => match *op {
                "=" => sample.age == *v,
                "!=" => sample.age != *v,
                ">" => sample.age > *v,
                ">=" => sample.age >= *v,
                "<" => sample.age < *v,
                _ => sample.age <= *v,
            },
            GenExpr::AgeBetween(lo, hi) => (*lo..=*hi).contains(&sample.age),
            GenExpr::Status(is_eq, s) => (sample.status == *s) == *is_eq,
            GenExpr::Banned(b) => sample.banned == *b,
            GenExpr::RegionIn(regions) => regions.contains(&sample.region),
            GenExpr::And(a, b) => a.holds(sample) && b.holds(sample),
            GenExpr::Or(a, b) => a.holds(sample) || b.holds(sample),
            GenExpr::Not(inner) => !inner.holds(sample),
        }
    }
}

fn arb_leaf_expr() -> impl Strategy<Value = GenExpr> {
    prop_oneof![
        (
            prop::sample::select(&["=", "!=", ">", ">=", "<", "<="][..]),
            0_i64..=120
        )
            .prop_map(|(op, v)| GenExpr::Age(op, v)),
        (0_i64..=120, 0_i64..=60).prop_map(|(lo, span)| GenExpr::AgeBetween(lo, lo + span)),
        (any::<bool>(), prop::sample::select(STATUSES))
            .prop_map(|(is_eq, s)| GenExpr::Status(is_eq, s)),
        any::<bool>().prop_map(GenExpr::Banned),
        prop::sample::subsequence(REGIONS, 0..=REGIONS.len()).prop_map(GenExpr::RegionIn),
    ]
}

/// Composite boolean expression (and/or/not of leaves), bounded depth.
pub fn arb_expr(max_depth: u32) -> impl Strategy<Value = GenExpr> {
    arb_leaf_expr().prop_recursive(max_depth, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| GenExpr::And(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| GenExpr::Or(Box::new(a), Box::new(b))),
            inner.prop_map(|e| GenExpr::Not(Box::new(e))),
        ]
    })
}

// --- Literal values whose rendering re-parses to an equal value ---

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Boolean),
        (-1_000_000_000_i64..1_000_000_000).prop_map(Value::from),
        (-1.0e6_f64..1.0e6).prop_map(|f| Value::Number(Number::Float(f))),
        "[a-zA-Z0-9 _\"\\\\]{0,12}".prop_map(Value::String),
    ]
}

fn arb_range() -> impl Strategy<Value = Value> {
    (-1000_i64..1000, 1_i64..1000, any::<bool>(), any::<bool>()).prop_filter_map(
        "range endpoints are comparable",
        |(start, span, si, ei)| {
            RangeValue::new(start.into(), (start + span).into(), si, ei).map(Value::Range)
        },
    )
}

/// Any literal class: scalar, list, context or range.
pub fn arb_literal() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![4 => arb_scalar(), 1 => arb_range()];
    leaf.prop_recursive(2, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::btree_map("[a-z][a-z0-9_]{0,5}", inner, 0..4).prop_map(|entries| {
                Value::Context(entries.into_iter().collect::<IndexMap<_, _>>())
            }),
        ]
    })
}

// --- Inputs aimed at the edges of the numeric and recursion limits ---

/// Duration strings, many with digit runs long enough to overflow.
pub fn arb_duration_text() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "-?P([0-9]{1,40}[WD])?(T([0-9]{1,40}H)?([0-9]{1,40}M)?([0-9]{1,30}(\\.[0-9]{1,12})?S)?)?",
        1 => "[-PTWDHMS0-9.]{0,24}",
    ]
}

/// One opener repeated `depth` times around `1`, closed when it needs to be.
pub fn arb_nested_source() -> impl Strategy<Value = (String, usize)> {
    (
        prop::sample::select(&["(", "[", "-", "not ", "f(", "{a: ", "1 + ("][..]),
        1_usize..300,
    )
        .prop_map(|(open, depth)| {
            let close = match open {
                "(" | "f(" | "1 + (" => ")",
                "[" => "]",
                "{a: " => "}",
                _ => "",
            };
            (format!("{}1{}", open.repeat(depth), close.repeat(depth)), depth)
        })
}
