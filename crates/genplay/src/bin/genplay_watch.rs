//! genplay-watch - Re-run a program and generator on every edit.

fn main() -> std::process::ExitCode {
    genplay::cmd::watch::main()
}
