//! Criterion benchmarks for the term evaluator.
//!
//! Measures the cost split the design banks on: literal terms are
//! precomputed at construction (eval is a clone of an Rc handle), while
//! constructor and json terms pay per evaluation.
//!
//! Run:
//!   cargo bench
//!   cargo bench -- literal_reuse   # one group

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use termeval::{build, datum, Env, TermTree};

// ── Tree builders ────────────────────────────────────────────────────────────

/// Array-constructor tree over n numeric literals.
fn array_tree(n: usize) -> TermTree {
    TermTree::make_array((0..n).map(|i| TermTree::datum(i as f64)).collect())
}

/// Object-constructor tree with n distinct keys.
fn object_tree(n: usize) -> TermTree {
    TermTree::make_obj(
        (0..n)
            .map(|i| (format!("key{}", i), TermTree::datum(i as f64)))
            .collect(),
    )
}

/// json("[0,1,...,n-1]") tree.
fn json_tree(n: usize) -> TermTree {
    let elems: Vec<String> = (0..n).map(|i| i.to_string()).collect();
    TermTree::json(TermTree::datum(format!("[{}]", elems.join(","))))
}

// ── Benchmarks ───────────────────────────────────────────────────────────────

fn literal_reuse(c: &mut Criterion) {
    // a large literal: eval cost should not scale with its size
    let big = datum!({"rows": [1i64, 2i64, 3i64], "name": "payload"});
    let term = build(&TermTree::datum(big)).expect("literal binds");
    let env = Env::new();

    c.bench_function("literal_reuse", |b| {
        b.iter(|| black_box(term.eval(&env).unwrap()))
    });
}

fn array_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("array_construction");
    for n in [8usize, 64, 512] {
        let term = build(&array_tree(n)).expect("array binds");
        let env = Env::new();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(term.eval(&env).unwrap()))
        });
    }
    group.finish();
}

fn object_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("object_construction");
    for n in [8usize, 64] {
        let term = build(&object_tree(n)).expect("object binds");
        let env = Env::new();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(term.eval(&env).unwrap()))
        });
    }
    group.finish();
}

fn json_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("json_parse");
    for n in [8usize, 512] {
        let term = build(&json_tree(n)).expect("json binds");
        let env = Env::new();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(term.eval(&env).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    literal_reuse,
    array_construction,
    object_construction,
    json_parse
);
criterion_main!(benches);
