use feelin::condition::interpret;
use feelin::{Engine, EvaluationContext, Value};

/// Input cells of a small risk table, one row per outcome.
const ROWS: &[(&str, &str, &str)] = &[
    ("< 18", "-", "declined"),
    ("[18..25)", "> 2", "high"),
    ("[18..65]", "[0..2]", "standard"),
    ("> 65", "-", "review"),
];

fn main() {
    let engine = Engine::new();

    for (age, claims, outcome) in ROWS {
        for cell in [age, claims] {
            match interpret(&engine, cell) {
                Ok(condition) => println!("{cell:>10} => {condition}"),
                Err(err) => println!("{cell:>10} => {err}"),
            }
        }
        println!("{:>10} -> {outcome}", "");
    }

    // Whole rows can also be written as a single FEEL expression.
    let ctx = EvaluationContext::new()
        .set("applicant.age", 22_i64)
        .set("applicant.claims", 3_i64);
    let row = r#"if applicant.age in [18..25) and applicant.claims > 2 then "high" else "standard""#;
    match engine.evaluate_str(row, &ctx) {
        Ok(Value::String(outcome)) => println!("applicant is {outcome}"),
        Ok(other) => println!("unexpected result {other}"),
        Err(err) => println!("evaluation failed: {err}"),
    }
}
