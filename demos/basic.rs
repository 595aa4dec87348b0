use feelin::{Engine, EvaluationContext};

fn main() {
    let engine = Engine::new();

    let expression = engine
        .parse_and_compile(r#"user.age >= 18 and user.status = "active""#)
        .expect("failed to compile expression");

    println!("{expression}");
    println!("{}", expression.ast());

    let ctx = EvaluationContext::new()
        .set("user.age", 25_i64)
        .set("user.status", "active");

    match engine.evaluate(&expression, &ctx) {
        Ok(value) => println!("Result: {value}"),
        Err(err) => println!("Evaluation failed: {err}"),
    }

    // A missing field evaluates to null rather than failing.
    let empty = EvaluationContext::new();
    match engine.evaluate_str("user.nickname", &empty) {
        Ok(value) => println!("Missing field: {value}"),
        Err(err) => println!("Evaluation failed: {err}"),
    }
}
