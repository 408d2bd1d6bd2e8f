//! Benchmarks for column type decisions and the full dump.

use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use csv2sql::engines::postgresql;
use csv2sql::inference::{compile_patterns, decide_types, DecideOptions};
use csv2sql::pipeline::{dump_all, DumpConfig};

fn generate_rows(count: usize) -> Vec<Vec<String>> {
    (0..count)
        .map(|i| {
            vec![
                format!("key-{i}"),
                i.to_string(),
                format!("{}.{}", i / 7, i % 7),
                if i % 10 == 0 { String::new() } else { format!("{:05}", i) },
            ]
        })
        .collect()
}

fn to_csv(rows: &[Vec<String>]) -> String {
    let mut text = String::from("key,int,float,padded\n");
    for row in rows {
        text.push_str(&row.join(","));
        text.push('\n');
    }
    text
}

fn bench_decide_types(c: &mut Criterion) {
    let patterns = compile_patterns(&postgresql::type_patterns()).unwrap();
    let columns = ["key", "int", "float", "padded"];

    let mut group = c.benchmark_group("decide_types");
    group.measurement_time(Duration::from_secs(10));
    for count in [1_000, 10_000] {
        let rows = generate_rows(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("default_pattern", count), &rows, |b, rows| {
            b.iter(|| {
                decide_types(
                    black_box(&patterns),
                    rows.iter(),
                    &columns,
                    &DecideOptions::default(),
                )
                .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_dump_all(c: &mut Criterion) {
    let input = to_csv(&generate_rows(10_000));
    let config = DumpConfig::builder("bench")
        .lines_for_inference(0)
        .build()
        .unwrap();

    let mut group = c.benchmark_group("dump_all");
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("10k_rows", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(input.len() * 2);
            dump_all(&config, black_box(input.as_bytes()), &mut out).unwrap();
            out
        })
    });
    group.finish();
}

criterion_group!(benches, bench_decide_types, bench_dump_all);
criterion_main!(benches);
