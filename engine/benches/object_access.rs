#[macro_use]
extern crate criterion;

use criterion::{black_box, Criterion};
use vela_engine::{forward, Context};

static MONOMORPHIC_PROPERTY_ACCESS: &str = r#"
function Point(x, y) {
    this.x = x;
    this.y = y;
}
let sum = 0;
for (let i = 0; i < 1000; i++) {
    let p = new Point(i, i + 1);
    sum += p.x + p.y;
}
sum;
"#;

static POLYMORPHIC_PROPERTY_ACCESS: &str = r#"
let sum = 0;
for (let i = 0; i < 1000; i++) {
    let o = {};
    o.a = i;
    if (i % 2 === 0) {
        o.b = i;
    } else {
        o.c = i;
    }
    sum += o.a;
}
sum;
"#;

static SHAPE_TRANSITION_CHAIN: &str = r#"
for (let i = 0; i < 200; i++) {
    let o = {};
    o.p0 = 0; o.p1 = 1; o.p2 = 2; o.p3 = 3; o.p4 = 4;
    o.p5 = 5; o.p6 = 6; o.p7 = 7; o.p8 = 8; o.p9 = 9;
}
"#;

static OVERFLOW_SPILL: &str = r#"
let o = {};
for (let i = 0; i < 64; i++) {
    o["p" + i] = i;
}
o.p63;
"#;

fn context_creation(c: &mut Criterion) {
    c.bench_function("Context::new", move |b| b.iter(Context::new));
}

fn monomorphic_access(c: &mut Criterion) {
    c.bench_function("Monomorphic property access", move |b| {
        b.iter(|| forward(&mut Context::new(), black_box(MONOMORPHIC_PROPERTY_ACCESS)))
    });
}

fn polymorphic_access(c: &mut Criterion) {
    c.bench_function("Polymorphic property access", move |b| {
        b.iter(|| forward(&mut Context::new(), black_box(POLYMORPHIC_PROPERTY_ACCESS)))
    });
}

fn shape_transitions(c: &mut Criterion) {
    c.bench_function("Shape transition chain", move |b| {
        b.iter(|| forward(&mut Context::new(), black_box(SHAPE_TRANSITION_CHAIN)))
    });
}

fn overflow_spill(c: &mut Criterion) {
    c.bench_function("Overflow map spill past inline capacity", move |b| {
        b.iter(|| forward(&mut Context::new(), black_box(OVERFLOW_SPILL)))
    });
}

criterion_group!(
    benches,
    context_creation,
    monomorphic_access,
    polymorphic_access,
    shape_transitions,
    overflow_spill,
);
criterion_main!(benches);
