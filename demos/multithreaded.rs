use std::sync::Arc;
use std::thread;

use feelin::{Engine, EvaluationContext};

fn main() {
    let engine = Arc::new(Engine::new());
    let expression = Arc::new(
        engine
            .parse_and_compile(r#"user.age >= 18 and user.status = "active""#)
            .expect("failed to compile expression"),
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engine);
            let expression = Arc::clone(&expression);
            thread::spawn(move || {
                let ctx = EvaluationContext::new()
                    .set("user.age", 16_i64 + i64::from(i))
                    .set("user.status", "active");

                let result = engine.evaluate(&expression, &ctx);
                println!("Thread {i}: {result:?}");
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    if let Some(stats) = engine.cache_stats() {
        println!("cache: {} entries, {} hits, {} misses", stats.entries, stats.hits, stats.misses);
    }
}
