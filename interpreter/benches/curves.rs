use criterion::{criterion_group, criterion_main, Criterion};
use interpreter::{Canvas, Options, Parser};

struct Sink;

impl Canvas for Sink {
    fn point(&mut self, _x: f64, _y: f64) {}
}

fn benchmark(c: &mut Criterion) {
    let src = "\
        ORIGIN IS (300, 300);\n\
        SCALE IS (100, 100);\n\
        ROT IS PI/6;\n\
        FOR T FROM -PI TO PI STEP PI/5000 DRAW (COS(T), SIN(T));";

    c.bench_function("circle 10k points", |b| {
        b.iter(|| {
            let mut sink = Sink;
            Parser::new(src, &mut sink, Options::default())
                .parse()
                .unwrap();
        })
    });
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
