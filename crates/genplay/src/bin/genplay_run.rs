//! genplay-run - Run a program through a source generator.
//!
//! Compiles the generator, applies it to the program, then compiles and
//! executes the augmented program.

fn main() -> std::process::ExitCode {
    genplay::cmd::run::main()
}
