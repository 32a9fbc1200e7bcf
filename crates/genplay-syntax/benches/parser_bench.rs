//! Parser performance benchmarks.
//!
//! Run with: cargo bench -p genplay-syntax

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use genplay_syntax::{format_source, normalize_key, parse};

/// Generate a synthetic source file with N types of a few methods each.
fn generate_source(num_types: usize) -> String {
    let mut lines = Vec::new();
    for i in 0..num_types {
        lines.push(format!("type Service{i} : IService {{"));
        lines.push("    static let created = 0;".to_string());
        lines.push(format!("    fn Name() -> String {{ return \"Service{i}\"; }}"));
        lines.push("    fn Run(items) {".to_string());
        lines.push("        let total = 0;".to_string());
        lines.push("        for item in items {".to_string());
        lines.push(format!("            if item % {} == 0 {{ total = total + item; }}", i % 7 + 2));
        lines.push("        }".to_string());
        lines.push("        return total;".to_string());
        lines.push("    }".to_string());
        lines.push("}".to_string());
        lines.push(String::new());
    }
    lines.join("\n")
}

fn bench_parse(c: &mut Criterion) {
    let source = generate_source(100);

    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("100_types", |b| {
        b.iter(|| parse(black_box(&source)));
    });
    group.finish();
}

fn bench_normalize_and_format(c: &mut Criterion) {
    let source = generate_source(100);

    let mut group = c.benchmark_group("normalize");
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("normalize_key", |b| {
        b.iter(|| normalize_key(black_box(&source)));
    });
    group.bench_function("format_source", |b| {
        b.iter(|| format_source(black_box(&source)));
    });
    group.finish();
}

fn bench_parse_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_scaling");

    for size in [10, 50, 100, 500] {
        let source = generate_source(size);
        group.throughput(Throughput::Bytes(source.len() as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &source, |b, source| {
            b.iter(|| parse(black_box(source)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_normalize_and_format,
    bench_parse_scaling
);
criterion_main!(benches);
