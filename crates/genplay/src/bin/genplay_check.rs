//! genplay-check - Check Gen source files.

fn main() -> std::process::ExitCode {
    genplay::cmd::check::main()
}
