//! End-to-end pipeline benchmarks.
//!
//! Run with: cargo bench -p genplay

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use genplay::{BundledSamples, Runner, RunnerConfig, SampleCatalog};

/// A generator emitting one accessor type per program type.
const ACCESSORS: &str = r#"
type Accessors : Generator {
    fn Execute(context) {
        for info in context.Compilation.Types() {
            if !info.IsStatic && !info.IsCapability {
                context.AddSource(info.Name + "Info",
                    "static type " + info.Name + "Info { static fn Name() { return \"" + info.Name + "\"; } }");
            }
        }
    }
}
"#;

fn generate_program(num_types: usize) -> String {
    let mut source = String::new();
    for i in 0..num_types {
        source.push_str(&format!(
            "type Model{i} {{\n    let value;\n    fn init(value) {{ self.value = value; }}\n    fn Twice() {{ return value * 2; }}\n}}\n\n"
        ));
    }
    source.push_str("type Program {\n    static fn Main() {\n        let total = 0;\n");
    for i in 0..num_types {
        source.push_str(&format!("        total = total + new Model{i}({i}).Twice();\n"));
    }
    source.push_str("        Console.WriteLine(total);\n    }\n}\n");
    source
}

fn bench_samples(c: &mut Criterion) {
    let runner = Runner::default();
    let mut group = c.benchmark_group("samples");

    for name in BundledSamples.list_sample_names() {
        let Some((program, plugin)) = BundledSamples.load_sample(&name) else {
            continue;
        };
        group.bench_function(&name, |b| {
            b.iter(|| runner.run(black_box(&program), black_box(&plugin)));
        });
    }
    group.finish();
}

fn bench_program_scaling(c: &mut Criterion) {
    let runner = Runner::default();
    let mut group = c.benchmark_group("program_scaling");

    for size in [10, 50, 200] {
        let program = generate_program(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &program, |b, program| {
            b.iter(|| runner.run(black_box(program), ACCESSORS));
        });
    }
    group.finish();
}

fn bench_plugin_cache(c: &mut Criterion) {
    let program = generate_program(10);
    let mut group = c.benchmark_group("plugin_cache");

    let warm = Runner::default();
    group.bench_function("hit", |b| {
        b.iter(|| warm.run(black_box(&program), ACCESSORS));
    });

    let cold = Runner::new(RunnerConfig {
        plugin_cache_capacity: 0,
        ..RunnerConfig::default()
    });
    group.bench_function("miss", |b| {
        b.iter(|| cold.run(black_box(&program), ACCESSORS));
    });
    group.finish();
}

criterion_group!(benches, bench_samples, bench_program_scaling, bench_plugin_cache);
criterion_main!(benches);
