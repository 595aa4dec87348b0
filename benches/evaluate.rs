use criterion::{black_box, criterion_group, criterion_main, Criterion};
use feelin::{Engine, EvaluationContext, Value};

/// An expression ANDing `n` comparisons over distinct fields, plus a
/// context in which every comparison holds.
fn build_expression(n: usize) -> (String, EvaluationContext) {
    let mut ctx = EvaluationContext::new();
    let mut terms = Vec::with_capacity(n);
    for i in 0..n {
        terms.push(format!("f{i} >= 1"));
        ctx = ctx.set(&format!("f{i}"), 10_i64);
    }
    (terms.join(" and "), ctx)
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_eval");
    let engine = Engine::new();

    for &n in &[5, 20, 50] {
        let (source, ctx) = build_expression(n);
        let compiled = engine.parse_and_compile(&source).unwrap();
        group.bench_function(&format!("{n}_comparisons_compiled"), |b| {
            b.iter(|| engine.evaluate(black_box(&compiled), black_box(&ctx)));
        });
        group.bench_function(&format!("{n}_comparisons_cached_source"), |b| {
            b.iter(|| engine.evaluate_str(black_box(&source), black_box(&ctx)));
        });
    }

    group.finish();
}

fn bench_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("iteration");
    let engine = Engine::new();

    for &n in &[10_i64, 100, 1000] {
        let orders: Vec<Value> = (0..n)
            .map(|i| {
                EvaluationContext::new()
                    .set("id", i)
                    .set("total", i * 7 % 500)
                    .to_value()
            })
            .collect();
        let ctx = EvaluationContext::new().set("orders", Value::List(orders));
        let filter = engine
            .parse_and_compile("sum(orders[total >= 100].total)")
            .unwrap();
        let quantifier = engine
            .parse_and_compile("every o in orders satisfies o.total < 500")
            .unwrap();

        group.bench_function(&format!("filter_sum_{n}"), |b| {
            b.iter(|| engine.evaluate(black_box(&filter), black_box(&ctx)));
        });
        group.bench_function(&format!("every_{n}"), |b| {
            b.iter(|| engine.evaluate(black_box(&quantifier), black_box(&ctx)));
        });
    }

    group.finish();
}

fn bench_compilation(c: &mut Criterion) {
    let mut group = c.benchmark_group("compilation");
    let uncached = Engine::builder().cache(false).build();

    for &n in &[5, 20, 50] {
        let (source, _) = build_expression(n);
        group.bench_function(&format!("{n}_comparisons"), |b| {
            b.iter(|| black_box(uncached.parse_and_compile(black_box(&source)).unwrap()));
        });
    }

    let nested = "if applicant.age >= 18 then \
                  for s in applicant.scores return round(s * 1.1, 2) \
                  else [date(\"2024-01-01\") + duration(\"P1D\")]";
    group.bench_function("mixed_constructs", |b| {
        b.iter(|| black_box(uncached.parse_and_compile(black_box(nested)).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_iteration, bench_compilation);
criterion_main!(benches);
