//! Terminal status output.
//!
//! Headers and errors are highlighted with ANSI background colors; under CI
//! the escapes are replaced with plain markers so logs stay readable.

use std::env;

/// True when running under CI (`CI=true`), which disables ANSI color.
pub fn is_ci() -> bool {
    env::var("CI").map(|v| v == "true").unwrap_or(false)
}

/// Print a highlighted section header.
pub fn header(msg: &str) {
    if is_ci() {
        println!("\n{msg}\n");
    } else {
        println!("\n\x1b[44m{msg}\x1b[0m\n");
    }
}

/// Print a highlighted error message.
pub fn error(msg: &str) {
    if is_ci() {
        eprintln!("\n ! {msg}\n");
    } else {
        eprintln!("\n\x1b[41m{msg}\x1b[0m\n");
    }
}
