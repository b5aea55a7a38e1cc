use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jsonrepair::{repair, Options};

const ALREADY_VALID: &str = r#"{"id":1,"name":"widget","tags":["a","b","c"],"active":true}"#;
const NEEDS_REPAIR: &str = r#"{name: 'widget', id: 1, tags: [a, b, c,], active: True,}"#;
const FENCED: &str = "```json\n{\"id\":1,\"name\":\"widget\"}\n```";

fn bench_fast_path(c: &mut Criterion) {
    let opts = Options::default();
    c.bench_function("repair_fast_path_already_valid", |b| {
        b.iter(|| repair(black_box(ALREADY_VALID), &opts).unwrap())
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let opts = Options::default();
    c.bench_function("repair_full_pipeline", |b| {
        b.iter(|| repair(black_box(NEEDS_REPAIR), &opts).unwrap())
    });
}

fn bench_fenced_input(c: &mut Criterion) {
    let opts = Options::default();
    c.bench_function("repair_fenced_input", |b| {
        b.iter(|| repair(black_box(FENCED), &opts).unwrap())
    });
}

criterion_group!(benches, bench_fast_path, bench_full_pipeline, bench_fenced_input);
criterion_main!(benches);
