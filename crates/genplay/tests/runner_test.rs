//! Integration tests for the full pipeline.

use genplay::{BundledSamples, RunResult, Runner, RunnerConfig, SampleCatalog};
use genplay_plugin::NO_SOURCE;
use genplay_runtime::NO_OUTPUT;
use std::sync::{Arc, OnceLock};

fn runner() -> &'static Runner {
    static RUNNER: OnceLock<Runner> = OnceLock::new();
    RUNNER.get_or_init(Runner::default)
}

fn run(program: &str, plugin: &str) -> RunResult {
    runner().run(program, plugin)
}

const QUIET: &str = "type Quiet : Generator { fn Execute(context) { } }";

const GREETER: &str = r#"
type GreeterGenerator : Generator {
    fn Execute(context) {
        context.AddSource("ServiceLocator", @"
static type ServiceLocator {
    static fn Greeting() {
        return ""Hello, generated world!"";
    }
}");
    }
}
"#;

// ============================================================================
// Inputs and placeholders
// ============================================================================

#[test]
fn test_blank_inputs_need_more_input() {
    let program = "type Program { static fn Main() { } }";
    for (program, plugin) in [("", QUIET), (" \n\t", QUIET), (program, ""), (program, "  \n"), ("", "")] {
        let result = run(program, plugin);
        assert!(result.error.contains("need more input"), "{}", result.error);
        assert!(result.generated_source.is_empty());
        assert!(result.program_output.is_empty());
    }
}

#[test]
fn test_blank_program_wins_over_plugin_failures() {
    let runner = Runner::default();
    let plugins = [
        "type Broken {",
        "type Helper { }",
        "type G : Generator { fn Execute(context) { nope; } }",
        "type G : Generator { fn Execute(context) { throw \"no\"; } }",
    ];
    for plugin in plugins {
        for program in ["", "   ", "\n\t"] {
            let result = runner.run(program, plugin);
            assert_eq!(
                result.error, "Cannot run yet, need more input for the program code.",
                "{plugin:?}"
            );
            assert!(result.generated_source.is_empty());
        }
    }
    assert_eq!(runner.plugin_compiler().compile_count(), 0);
}

#[test]
fn test_no_generated_source_placeholder() {
    let result = run(r#"type Program { static fn Main() { Console.Write("x"); } }"#, QUIET);
    assert!(result.is_success(), "{}", result.error);
    assert_eq!(result.generated_source, NO_SOURCE);
}

#[test]
fn test_no_program_output_placeholder() {
    let result = run("type Program { static fn Main() { } }", QUIET);
    assert!(result.is_success(), "{}", result.error);
    assert_eq!(result.program_output, NO_OUTPUT);
}

#[test]
fn test_main_with_one_parameter_gets_null() {
    let result = run(
        r#"type Program { static fn Main(args) { Console.Write(args == null); } }"#,
        QUIET,
    );
    assert_eq!(result.program_output, "true");
}

// ============================================================================
// Idempotence and caching
// ============================================================================

#[test]
fn test_repeated_runs_are_identical() {
    let program = r#"
type Program {
    static let Count = 0;
    static fn Main() {
        Count = Count + 1;
        Console.WriteLine("run " + Count);
    }
}
"#;
    let first = run(program, QUIET);
    let second = run(program, QUIET);
    assert_eq!(first, second);
    assert_eq!(first.program_output, "run 1\n");
}

#[test]
fn test_reformatted_plugin_is_not_recompiled() {
    let runner = Runner::default();
    let program = "type Program { static fn Main() { } }";
    runner.run(program, "type A : Generator { fn Execute(context) { } }");
    runner.run(
        program,
        "type A : Generator\n{\n    fn Execute( context )\n    {\n    }\n}\n",
    );
    assert_eq!(runner.plugin_compiler().compile_count(), 1);

    runner.run(program, "type B : Generator { fn Execute(context) { } }");
    assert_eq!(runner.plugin_compiler().compile_count(), 2);
}

#[test]
fn test_least_recently_used_plugin_is_evicted() {
    let runner = Runner::new(RunnerConfig {
        plugin_cache_capacity: 2,
        ..RunnerConfig::default()
    });
    let program = "type Program { static fn Main() { } }";
    let plugin = |name: &str| format!("type {name} : Generator {{ fn Execute(context) {{ }} }}");

    runner.run(program, &plugin("P1"));
    runner.run(program, &plugin("P2"));
    runner.run(program, &plugin("P1"));
    runner.run(program, &plugin("P3"));
    assert_eq!(runner.plugin_compiler().compile_count(), 3);
    assert_eq!(runner.plugin_compiler().cache().len(), 2);

    // P2 was least recently used, so P1 is still cached.
    runner.run(program, &plugin("P1"));
    assert_eq!(runner.plugin_compiler().compile_count(), 3);
    runner.run(program, &plugin("P2"));
    assert_eq!(runner.plugin_compiler().compile_count(), 4);
}

#[test]
fn test_failed_plugin_compile_does_not_poison_the_cache() {
    let runner = Runner::default();
    let program = "type Program { static fn Main() { } }";
    let broken = runner.run(program, "type G : Generator { fn Execute(context) { nope; } }");
    assert!(broken.error.starts_with("Error(s) compiling generator:"));
    let again = runner.run(program, "type G : Generator { fn Execute(context) { nope; } }");
    assert_eq!(broken, again);
    assert!(runner.plugin_compiler().cache().is_empty());
}

#[test]
fn test_concurrent_runs_share_one_runner() {
    let runner = Arc::new(Runner::default());
    runner.run("type Program { static fn Main() { } }", QUIET);
    let handles: Vec<_> = (0..4)
        .map(|n| {
            let runner = Arc::clone(&runner);
            std::thread::spawn(move || {
                runner.run(
                    &format!("type Program {{ static fn Main() {{ Console.Write({n}); }} }}"),
                    QUIET,
                )
            })
        })
        .collect();
    for (n, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap().program_output, n.to_string());
    }
    assert_eq!(runner.plugin_compiler().compile_count(), 1);
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_generated_locator_is_called() {
    let result = run(
        r#"
type Program {
    static fn Main() {
        Console.Write(ServiceLocator.Greeting());
    }
}
"#,
        GREETER,
    );
    assert!(result.is_success(), "{}", result.error);
    assert!(result.generated_source.contains("static type ServiceLocator"));
    assert_eq!(result.program_output, "Hello, generated world!");
}

#[test]
fn test_program_syntax_error_is_a_compile_failure() {
    let result = run(
        r#"type Program { static fn Main() { Console.Write("x"); }"#,
        QUIET,
    );
    assert!(result.error.starts_with("Error(s) compiling program:\n\n"), "{}", result.error);
    assert!(result.error.contains(": error "));
    assert!(result.program_output.is_empty());
    assert_eq!(result.generated_source, NO_SOURCE);
}

#[test]
fn test_plugin_without_generator_lists_types() {
    let result = run(
        "type Program { static fn Main() { } }",
        "type Helper { } static type Tools { }",
    );
    assert_eq!(
        result.error,
        "Could not instantiate source generator. Types in module:\n\nHelper\nTools"
    );
    assert!(result.generated_source.is_empty());
}

#[test]
fn test_exception_keeps_partial_output() {
    let result = run(
        r#"
type Program {
    static fn Main() {
        Console.WriteLine("partial-line");
        throw new Exception("boom");
    }
}
"#,
        QUIET,
    );
    assert!(result.program_output.is_empty());
    assert!(result
        .error
        .starts_with("partial-line\n\nError executing program:\n\nException: boom"));
    assert_eq!(result.generated_source, NO_SOURCE);
}

#[test]
fn test_generator_error_keeps_generated_source() {
    let result = run(
        "type Program { static fn Main() { } }",
        r#"
type Picky : Generator {
    fn Execute(context) {
        context.AddSource("Half", "type Half { }");
        context.ReportDiagnostic(DiagnosticSeverity.Error, "PICKY1", "not today");
    }
}
"#,
    );
    assert_eq!(result.error, "Error(s) running generator:\n\nerror PICKY1: not today");
    assert_eq!(result.generated_source, "type Half {}");
    assert!(result.program_output.is_empty());
}

#[test]
fn test_missing_entry_point_is_a_shape_error() {
    let result = run("type Other { static fn Main() { } }", QUIET);
    assert_eq!(
        result.error,
        "Error executing program:\n\nCould not find type \"Program\" in program."
    );
}

// ============================================================================
// Reference libraries
// ============================================================================

#[test]
fn test_directory_library_is_referenced() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("Extras.gen"),
        r#"static type Shout { static fn Loud(text) { return text + "!"; } }"#,
    )
    .unwrap();
    let runner = Runner::new(RunnerConfig {
        library_dir: Some(dir.path().to_path_buf()),
        ..RunnerConfig::default()
    });
    let result = runner.run(
        r#"type Program { static fn Main() { Console.Write(Shout.Loud("hey")); } }"#,
        QUIET,
    );
    assert!(result.is_success(), "{}", result.error);
    assert_eq!(result.program_output, "hey!");
}

#[test]
fn test_reference_failure_is_reported_and_retried() {
    let dir = tempfile::tempdir().unwrap();
    let libs = dir.path().join("libs");
    let runner = Runner::new(RunnerConfig {
        library_dir: Some(libs.clone()),
        ..RunnerConfig::default()
    });
    let program = "type Program { static fn Main() { Console.Write(1); } }";

    let failed = runner.run(program, QUIET);
    assert!(failed.error.starts_with("Error(s) resolving references:"), "{}", failed.error);

    std::fs::create_dir(&libs).unwrap();
    let result = runner.run(program, QUIET);
    assert!(result.is_success(), "{}", result.error);
    assert_eq!(result.program_output, "1");
}

// ============================================================================
// Bundled samples
// ============================================================================

fn run_sample(name: &str) -> RunResult {
    let (program, plugin) = BundledSamples.load_sample(name).unwrap();
    run(&program, &plugin)
}

#[test]
fn test_hello_sample() {
    let result = run_sample("hello");
    assert!(result.is_success(), "{}", result.error);
    assert_eq!(result.program_output, "Hello from generated code!\n");
}

#[test]
fn test_dependency_injection_sample() {
    let result = run_sample("dependency-injection");
    assert!(result.is_success(), "{}", result.error);
    assert!(result
        .generated_source
        .contains("return new Greeter(new FixedClock());"));
    assert_eq!(result.program_output, "Good morning Ada, it is 09:00.\n");
}

#[test]
fn test_describe_sample() {
    let result = run_sample("describe");
    assert!(result.is_success(), "{}", result.error);
    assert!(result.program_output.contains("type Square: init/1, Area/0"));
    assert!(result.program_output.ends_with("shape with area 9\n"));
}

#[test]
fn test_every_sample_runs() {
    for name in BundledSamples.list_sample_names() {
        let result = run_sample(&name);
        assert!(result.is_success(), "{name}: {}", result.error);
    }
}
