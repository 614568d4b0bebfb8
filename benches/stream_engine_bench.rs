use criterion::{black_box, criterion_group, criterion_main, Criterion};
use streamline::flavors::HotInput;

fn map_filter_chain_benchmark(c: &mut Criterion) {
    c.bench_function("map+filter chain push", |b| {
        let input: HotInput<i64, String> = HotInput::new("bench-input");
        let chain = input
            .stream()
            .map(|v| v * 2)
            .filter(|v| v % 3 != 0)
            .map(|v| v + 1);
        let mut n = 0i64;
        b.iter(|| {
            n += 1;
            input.push(black_box(n));
            chain.last_value()
        });
    });
}

fn fan_out_benchmark(c: &mut Criterion) {
    c.bench_function("fan out to 16 children", |b| {
        let input: HotInput<i64, String> = HotInput::new("bench-fanout");
        let children: Vec<_> = (0..16).map(|i| input.stream().map(move |v| v + i)).collect();
        let mut n = 0i64;
        b.iter(|| {
            n += 1;
            input.push(black_box(n));
            for child in &children {
                black_box(child.last_value());
            }
        });
    });
}

fn merge_benchmark(c: &mut Criterion) {
    c.bench_function("merge two hot streams", |b| {
        let left: HotInput<i64, String> = HotInput::new("bench-left");
        let right: HotInput<i64, String> = HotInput::new("bench-right");
        let merged = streamline::merge(&left.stream(), &right.stream());
        let mut n = 0i64;
        b.iter(|| {
            n += 1;
            left.push(black_box(n));
            right.push(black_box(-n));
            merged.last_value()
        });
    });
}

criterion_group!(benches, map_filter_chain_benchmark, fan_out_benchmark, merge_benchmark);
criterion_main!(benches);
