//! augur CLI binary
//!
//! All logic is in the library; main.rs only invokes `cli::run()`.

fn main() {
    // cli::run() prints its own errors
    if let Err(code) = augur::cli::run() {
        std::process::exit(code.as_i32());
    }
}
