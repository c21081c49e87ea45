use criterion::{criterion_group, criterion_main};

mod system;

criterion_group!(
    benches,
    system::command::bench_classify,
    system::command::bench_dispatch
);
criterion_main!(benches);
