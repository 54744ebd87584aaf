//! Rust cross-compilation.
//!
//! One cargo invocation per architecture, strictly sequential. A failed
//! architecture aborts the whole build; the remaining entries are not
//! attempted.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::build::arch::{self, ANDROID_API};
use crate::build::RUST_TARGETS;
use crate::config::BuildConfig;
use crate::sdk::Sdk;
use crate::util::exec::Exec;
use crate::util::fs as fsutil;

/// Cross-build the requested crates for every architecture and relocate the
/// static libraries into the per-architecture staging directories under the
/// stable `lib<crate>-rs.a` name.
pub fn build(config: &BuildConfig, sdk: &Sdk, requested: &[&str]) -> Result<()> {
    let crates: Vec<&str> = RUST_TARGETS
        .iter()
        .copied()
        .filter(|t| requested.contains(t))
        .collect();

    let mut base_args: Vec<String> = vec![
        "build".to_string(),
        "-Z".to_string(),
        "build-std=std,panic_abort".to_string(),
        "-Z".to_string(),
        "build-std-features=panic_immediate_abort".to_string(),
    ];
    for krate in &crates {
        base_args.push("-p".to_string());
        base_args.push((*krate).to_string());
    }
    if config.release {
        base_args.push("-r".to_string());
    }
    if !config.verbose {
        base_args.push("-q".to_string());
    }

    for arch in arch::ALL {
        let rust_triple = arch.rust_triple();
        Exec::new(sdk.cargo())
            .args(&base_args)
            .args(["--target", rust_triple])
            .current_dir("native/rust")
            .env("CARGO_BUILD_RUSTC", sdk.rustc())
            .env("TARGET_CC", sdk.clang())
            .env("RUSTFLAGS", "-Clinker-plugin-lto")
            .env(
                "TARGET_CFLAGS",
                format!("--target={}{}", arch.triple(), ANDROID_API),
            )
            .run()
            .context("Build binary failed!")?;

        let out = arch.out_dir();
        fs::create_dir_all(&out)?;
        for krate in &crates {
            let source = Path::new("native/rust/target")
                .join(rust_triple)
                .join(config.profile())
                .join(format!("lib{krate}.a"));
            fsutil::mv(&source, &out.join(format!("lib{krate}-rs.a")))?;
        }
    }
    Ok(())
}
