//! Integration tests for plugin compilation and the transformation driver.

use genplay_compiler::{Compilation, CompileOptions, ReferenceSet, ReferenceSetProvider};
use genplay_core::{CancellationToken, Cancelled, Severity, SourceUnit};
use genplay_plugin::{PluginCompiler, PluginSet, StageError, Transformation, TransformationDriver, NO_SOURCE};
use genplay_runtime::ConsoleCapture;
use std::sync::{Arc, OnceLock};

fn references() -> Arc<ReferenceSet> {
    static REFERENCES: OnceLock<Arc<ReferenceSet>> = OnceLock::new();
    Arc::clone(REFERENCES.get_or_init(|| {
        ReferenceSetProvider::bundled()
            .get_or_resolve(&CancellationToken::new())
            .expect("bundled libraries compile")
    }))
}

fn plugins(source: &str) -> Arc<PluginSet> {
    PluginCompiler::default()
        .compile(source, &references(), &CancellationToken::new())
        .unwrap()
}

fn program(source: &str) -> Compilation {
    Compilation::create(
        "Program",
        vec![SourceUnit::new("Program.gen", source)],
        references(),
        CompileOptions::library(),
        &CancellationToken::new(),
    )
    .unwrap()
}

fn transform(generator: &str, source: &str) -> Transformation {
    TransformationDriver::default()
        .run(&program(source), &plugins(generator), &CancellationToken::new())
        .unwrap()
}

fn generated_text(transformation: &Transformation, name: &str) -> String {
    transformation
        .generated
        .iter()
        .find(|unit| unit.name == name)
        .map(|unit| unit.text.to_string())
        .unwrap_or_else(|| panic!("no unit named {name}"))
}

const EMPTY_MAIN: &str = "type Program { static fn Main() { } }";

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn test_every_concrete_generator_is_discovered() {
    let set = plugins(
        r#"
abstract type Base : Generator { }
type Open<T> : Generator { fn Execute(context) { } }
type First : Generator { fn Execute(context) { } }
type Helper { }
type Second : Base { fn Execute(context) { } }
"#,
    );
    assert_eq!(set.names(), vec!["First", "Second"]);
}

#[test]
fn test_generator_failing_to_activate_is_skipped() {
    let set = plugins(
        r#"
type Needy : Generator { fn init(value) { } fn Execute(context) { } }
type Fine : Generator { fn Execute(context) { } }
"#,
    );
    assert_eq!(set.names(), vec!["Fine"]);
}

#[test]
fn test_only_unactivatable_generators_is_instantiation_error() {
    let err = PluginCompiler::default()
        .compile(
            "type Needy : Generator { fn init(value) { } fn Execute(context) { } }",
            &references(),
            &CancellationToken::new(),
        )
        .unwrap_err();
    assert!(matches!(err, StageError::Instantiation { ref types } if types == &["Needy"]));
}

// ============================================================================
// Generated sources
// ============================================================================

#[test]
fn test_no_generated_source_placeholder() {
    let result = transform("type Quiet : Generator { fn Execute(context) { } }", EMPTY_MAIN);
    assert!(result.generated.is_empty());
    assert_eq!(result.report(), NO_SOURCE);
    assert!(result.augmented.is_some());
}

#[test]
fn test_units_are_named_by_generator_and_sorted() {
    let result = transform(
        r#"
type Zed : Generator {
    fn Execute(context) { context.AddSource("B", "type B { }"); context.AddSource("A.gen", "type A { }"); }
}
type Alpha : Generator {
    fn Execute(context) { context.AddSource("C", "type C { }"); }
}
"#,
        EMPTY_MAIN,
    );
    let names: Vec<_> = result.generated.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha/C.gen", "Zed/A.gen", "Zed/B.gen"]);
    assert!(!result.augmented.unwrap().has_errors());
}

#[test]
fn test_generators_see_only_the_original_program() {
    let result = transform(
        r#"
type Adds : Generator {
    fn Execute(context) { context.AddSource("Extra", "type Extra { }"); }
}
type Counts : Generator {
    fn Execute(context) {
        let names = [];
        for t in context.Compilation.Types() { names.Add(t.Name); }
        context.AddSource("Names.txt", names.Join(","));
    }
}
"#,
        "type Program { static fn Main() { } } type Widget { }",
    );
    assert_eq!(generated_text(&result, "Counts/Names.txt"), "Program,Widget");
}

#[test]
fn test_duplicate_hint_fails_the_generator() {
    let result = transform(
        r#"
type Twice : Generator {
    fn Execute(context) { context.AddSource("A", "type A { }"); context.AddSource("A", "type A { }"); }
}
"#,
        EMPTY_MAIN,
    );
    assert!(result.augmented.is_none());
    let errors = result.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, "GEN0001");
    assert!(errors[0].message.starts_with("Generator 'Twice' failed to generate source: ArgumentException"));
}

// ============================================================================
// Semantic model views
// ============================================================================

#[test]
fn test_type_views_describe_the_program() {
    let result = transform(
        r#"
type Describe : Generator {
    fn Execute(context) {
        let t = context.Compilation.GetType("Service");
        let text = t.Name + " abstract=" + t.IsAbstract + " bases=" + t.Bases.Join("|");
        for m in t.Methods {
            text = text + " " + m.Name + "(" + m.Parameters.Count + ")";
        }
        for p in t.ConstructorParameters { text = text + " ctor:" + p.Name; }
        text = text + " fields=" + t.Fields.Join("|");
        text = text + " missing=" + (context.Compilation.GetType("Nope") == null);
        context.AddSource("Out.txt", text);
    }
}
"#,
        r#"
capability IService { fn Run(); }
type Service : IService {
    let name;
    fn init(name) { self.name = name; }
    fn Run() { }
    static fn Make(a, b) { return new Service(a); }
}
type Program { static fn Main() { } }
"#,
    );
    assert_eq!(
        generated_text(&result, "Describe/Out.txt"),
        "Service abstract=false bases=IService init(1) Run(0) Make(2) ctor:name fields=name missing=true"
    );
}

#[test]
fn test_implementations_and_invocations() {
    let result = transform(
        r#"
type Registry : Generator {
    fn Execute(context) {
        let text = "";
        for t in context.Compilation.Implementations("IPlugin") { text = text + t.Name + ";"; }
        for call in context.Compilation.Invocations() {
            if call.Method == "Register" {
                text = text + call.Type + "." + call.Method + "(" + call.Arguments[0] + ") in " + call.Caller + " line " + call.Line + ";";
            }
        }
        context.AddSource("Out.txt", text);
    }
}
"#,
        r#"
capability IPlugin { }
type A : IPlugin { }
abstract type B : IPlugin { }
type Hub { static fn Register(name) { } }
type Program {
    static fn Main() {
        Hub.Register("first");
    }
}
"#,
    );
    assert_eq!(
        generated_text(&result, "Registry/Out.txt"),
        "A;Hub.Register(first) in Program.Main line 8;"
    );
}

#[test]
fn test_source_files_view() {
    let result = transform(
        r#"
type Echo : Generator {
    fn Execute(context) {
        for file in context.Compilation.SourceFiles() { context.AddSource("Echo.txt", file.Name + ":" + file.Text.Length); }
    }
}
"#,
        EMPTY_MAIN,
    );
    assert_eq!(
        generated_text(&result, "Echo/Echo.txt"),
        format!("Program.gen:{}", EMPTY_MAIN.len())
    );
}

// ============================================================================
// Diagnostics and failures
// ============================================================================

#[test]
fn test_reported_diagnostics_keep_severity() {
    let result = transform(
        r#"
type Lint : Generator {
    fn Execute(context) {
        context.ReportDiagnostic(DiagnosticSeverity.Warning, "LINT01", "looks odd");
        context.ReportDiagnostic(DiagnosticSeverity.Info, "LINT02", "fyi");
    }
}
"#,
        EMPTY_MAIN,
    );
    let severities: Vec<_> = result.diagnostics.iter().map(|d| d.severity).collect();
    assert_eq!(severities, vec![Severity::Warning, Severity::Info]);
    assert!(!result.has_errors());
    assert!(result.augmented.is_some());
}

#[test]
fn test_reported_error_blocks_recompilation() {
    let result = transform(
        r#"
type Strict : Generator {
    fn Execute(context) {
        context.AddSource("Partial", "type Partial { }");
        context.ReportDiagnostic(DiagnosticSeverity.Error, "STRICT", "no");
    }
}
"#,
        EMPTY_MAIN,
    );
    assert!(result.augmented.is_none());
    assert_eq!(result.generated.len(), 1);
    assert_eq!(result.errors()[0].to_string(), "error STRICT: no");
}

#[test]
fn test_exception_becomes_generator_diagnostic() {
    let result = transform(
        r#"
type Broken : Generator {
    fn Execute(context) {
        throw new Exception("generator exploded");
    }
}
"#,
        EMPTY_MAIN,
    );
    let errors = result.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0]
        .message
        .starts_with("Generator 'Broken' failed to generate source: Exception: generator exploded"));
}

// ============================================================================
// Isolation
// ============================================================================

#[test]
fn test_each_execution_gets_fresh_statics() {
    let set = plugins(
        r#"
type Counter : Generator {
    static let Runs = 0;
    fn Execute(context) {
        Runs = Runs + 1;
        context.AddSource("Runs.txt", "" + Runs);
    }
}
"#,
    );
    let compilation = program(EMPTY_MAIN);
    for _ in 0..3 {
        let result = TransformationDriver::default()
            .run(&compilation, &set, &CancellationToken::new())
            .unwrap();
        assert_eq!(generated_text(&result, "Counter/Runs.txt"), "1");
    }
}

#[test]
fn test_generator_console_output_is_not_captured() {
    let set = plugins(
        r#"
type Chatty : Generator {
    fn Execute(context) { Console.WriteLine("from generator"); }
}
"#,
    );
    let compilation = program(EMPTY_MAIN);
    let capture = ConsoleCapture::begin();
    TransformationDriver::new(false)
        .run(&compilation, &set, &CancellationToken::new())
        .unwrap();
    assert_eq!(capture.take(), "");
}

#[test]
fn test_cancelled_run_stops() {
    let set = plugins("type Quiet : Generator { fn Execute(context) { } }");
    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = TransformationDriver::default().run(&program(EMPTY_MAIN), &set, &cancel);
    assert!(matches!(result, Err(Cancelled)));
}

#[test]
fn test_parallel_and_sequential_agree() {
    let generator = r#"
type One : Generator { fn Execute(context) { context.AddSource("One", "type One { }"); } }
type Two : Generator { fn Execute(context) { context.AddSource("Two", "type Two { }"); } }
type Three : Generator { fn Execute(context) { context.ReportDiagnostic("Info", "T3", "three"); } }
"#;
    let set = plugins(generator);
    let compilation = program(EMPTY_MAIN);
    let parallel = TransformationDriver::new(true)
        .run(&compilation, &set, &CancellationToken::new())
        .unwrap();
    let sequential = TransformationDriver::new(false)
        .run(&compilation, &set, &CancellationToken::new())
        .unwrap();
    assert_eq!(parallel.generated, sequential.generated);
    assert_eq!(parallel.diagnostics, sequential.diagnostics);
}
