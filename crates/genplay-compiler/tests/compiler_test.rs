//! Integration tests for compilations against the bundled references.

use genplay_compiler::ir::{Expr, ReturnShape, StmtKind};
use genplay_compiler::{
    Compilation, CompileOptions, DirectoryLibraries, EmitError, ModuleImage, ReferenceError,
    ReferenceSet, ReferenceSetProvider,
};
use genplay_core::{CancellationToken, Cancelled, LibraryIdentity, SourceUnit};
use std::sync::{Arc, OnceLock};

fn references() -> Arc<ReferenceSet> {
    static REFERENCES: OnceLock<Arc<ReferenceSet>> = OnceLock::new();
    Arc::clone(REFERENCES.get_or_init(|| {
        ReferenceSetProvider::bundled()
            .get_or_resolve(&CancellationToken::new())
            .expect("bundled libraries compile")
    }))
}

fn compile(source: &str, options: CompileOptions) -> Compilation {
    Compilation::create(
        "Program",
        vec![SourceUnit::new("Program.gen", source)],
        references(),
        options,
        &CancellationToken::new(),
    )
    .unwrap()
}

fn messages(compilation: &Compilation) -> Vec<String> {
    compilation
        .diagnostics()
        .iter()
        .map(ToString::to_string)
        .collect()
}

// ============================================================================
// Executables
// ============================================================================

#[test]
fn test_hello_world_emits() {
    let c = compile(
        r#"
type Program {
    static fn Main() {
        Console.WriteLine("Hello");
    }
}
"#,
        CompileOptions::executable(),
    );
    assert!(c.diagnostics().is_empty(), "{:?}", messages(&c));

    let bytes = c.emit().unwrap();
    let image = ModuleImage::decode(&bytes).unwrap();
    assert_eq!(image.type_names(), vec!["Program"]);
    assert_eq!(
        image.references,
        vec![LibraryIdentity::new("System"), LibraryIdentity::new("Generation")]
    );

    let main = image.find_type("Program").unwrap().find_method("Main").unwrap();
    assert_eq!(main.shape, ReturnShape::Void);
    let body = main.body.as_ref().unwrap();
    assert_eq!(body[0].line, 4);
    match &body[0].kind {
        StmtKind::Expr(Expr::StaticCall { owner, method, .. }) => {
            assert_eq!(owner.name, "Console");
            assert_eq!(owner.library, Some(LibraryIdentity::new("System")));
            assert_eq!(method, "WriteLine");
        }
        other => panic!("unexpected statement {other:?}"),
    }
}

#[test]
fn test_missing_entry_point_is_a_warning() {
    let c = compile("type Helper {}", CompileOptions::executable());
    assert!(!c.has_errors());
    assert_eq!(
        messages(&c),
        vec!["warning W0303: Program does not contain a static 'Main' method suitable for an entry point"]
    );
    assert!(c.emit().is_ok());
}

#[test]
fn test_return_shapes() {
    let c = compile(
        r"
type Program {
    static async fn A() { }
    static fn B() -> Task { return Tasks.FromResult(1); }
    static fn C() -> Int { return 1; }
    static fn D() -> void { }
}
",
        CompileOptions::library(),
    );
    assert!(!c.has_errors(), "{:?}", messages(&c));
    let image = c.image();
    let program = image.find_type("Program").unwrap();
    let shapes: Vec<_> = program.methods.iter().map(|m| m.shape).collect();
    assert_eq!(
        shapes,
        vec![
            ReturnShape::Awaitable,
            ReturnShape::Awaitable,
            ReturnShape::Value,
            ReturnShape::Void
        ]
    );
}

// ============================================================================
// Errors and emission
// ============================================================================

#[test]
fn test_syntax_error_is_located() {
    let c = compile(
        "type Program {\n    static fn Main() {\n        Console.WriteLine(\"x\");\n",
        CompileOptions::executable(),
    );
    assert!(c.has_errors());
    let first = c.errors().next().unwrap();
    assert!(first.code.starts_with('P'), "{first}");
    assert!(matches!(c.emit(), Err(EmitError::HasErrors(_))));
}

#[test]
fn test_clash_with_library_type() {
    let c = compile("type Console {}", CompileOptions::library());
    assert_eq!(
        messages(&c),
        vec!["Program.gen(1,6): error E0101: The type 'Console' conflicts with a type of the same name in library 'System'"]
    );
}

#[test]
fn test_extern_rejected_in_user_code() {
    let c = compile("type T { extern fn Native(); }", CompileOptions::library());
    let codes: Vec<_> = c.diagnostics().iter().map(|d| d.code.as_str()).collect();
    assert_eq!(codes, vec!["E0108"]);
}

#[test]
fn test_cancelled_compilation() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = Compilation::create(
        "Program",
        vec![SourceUnit::new("Program.gen", "type Program {}")],
        references(),
        CompileOptions::library(),
        &cancel,
    );
    assert_eq!(result.unwrap_err(), Cancelled);
}

// ============================================================================
// Semantic model
// ============================================================================

#[test]
fn test_semantic_model_survives_errors() {
    let c = compile(
        r#"
capability IGreeter { fn Greet(); }
type Greeter : IGreeter { fn Greet() { Console.WriteLine("hi"); } }
abstract type Partial : IGreeter {}
type Program {
    static fn Main() {
        let greeter = ServiceLocator.GetService("IGreeter");
        greeter.Greet();
    }
}
"#,
        CompileOptions::library(),
    );
    assert!(c.has_errors());

    let model = c.semantic_model();
    let implementations: Vec<_> = model
        .implementations("IGreeter")
        .iter()
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(implementations, vec!["Greeter"]);

    let lookup = model
        .invocations()
        .iter()
        .find(|i| i.method == "GetService")
        .unwrap();
    assert_eq!(lookup.type_name.as_deref(), Some("ServiceLocator"));
    assert_eq!(lookup.caller, "Program.Main");
    assert_eq!(lookup.line, 7);
    assert!(model.get_type("Console").is_some());
    assert_eq!(model.source_files().len(), 1);
}

#[test]
fn test_with_units_adds_generated_source() {
    let program = compile(
        r#"
type Program {
    static fn Main() { Console.WriteLine(Locator.Get()); }
}
"#,
        CompileOptions::library(),
    );
    assert!(program.has_errors());

    let generated = SourceUnit::new(
        "Gen/Locator.gen",
        r#"static type Locator { static fn Get() { return "hello"; } }"#,
    );
    let augmented = program
        .with_units(
            vec![generated],
            CompileOptions::executable(),
            &CancellationToken::new(),
        )
        .unwrap();
    assert!(augmented.diagnostics().is_empty(), "{:?}", messages(&augmented));
    assert_eq!(augmented.units().len(), 2);
    assert_eq!(augmented.image().type_names(), vec!["Program", "Locator"]);
}

// ============================================================================
// Directory libraries
// ============================================================================

#[test]
fn test_directory_library_extends_references() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("Greetings.gen"),
        r#"static type Greetings { static fn Hello() -> String { return "hello"; } }"#,
    )
    .unwrap();

    let provider = ReferenceSetProvider::bundled().with_source(DirectoryLibraries::new(dir.path()));
    let set = provider.get_or_resolve(&CancellationToken::new()).unwrap();
    assert!(set.contains(&LibraryIdentity::new("Greetings")));

    let c = Compilation::create(
        "Program",
        vec![SourceUnit::new(
            "Program.gen",
            "type Program { static fn Main() { Console.WriteLine(Greetings.Hello()); } }",
        )],
        set,
        CompileOptions::executable(),
        &CancellationToken::new(),
    )
    .unwrap();
    assert!(c.diagnostics().is_empty(), "{:?}", messages(&c));
}

#[test]
fn test_broken_directory_library_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Bad.gen"), "type Bad {").unwrap();

    let provider = ReferenceSetProvider::bundled().with_source(DirectoryLibraries::new(dir.path()));
    let err = provider.get_or_resolve(&CancellationToken::new()).unwrap_err();
    match err {
        ReferenceError::Compile { library, diagnostics } => {
            assert_eq!(library, LibraryIdentity::new("Bad"));
            assert!(!diagnostics.is_empty());
        }
        other => panic!("unexpected error {other:?}"),
    }
}
