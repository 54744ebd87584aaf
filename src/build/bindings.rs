//! C++ FFI binding generation.
//!
//! Runs `cxxbridge` over each Rust bridge module and routes the generated
//! source/header pair through the content cache, so an unchanged interface
//! leaves file timestamps alone and the ndk-build dependency graph idle.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::BuildConfig;
use crate::sdk::Sdk;
use crate::util::exec::Exec;
use crate::util::fs::write_if_changed;

/// Directory holding all generated sources and headers.
pub const GEN_DIR: &str = "native/out/generated";

/// Rust crates exposing a cxx bridge, in generation order.
const BRIDGE_MODULES: &[&str] = &["base", "boot", "core", "init", "sepolicy"];

/// Install cxxbridge into a repo-local cargo root and regenerate the
/// bindings for every bridge module. Must complete before any compiler
/// pass; the generated files are compilation inputs.
pub fn generate(config: &BuildConfig, sdk: &Sdk) -> Result<()> {
    let cargo_root = Path::new("native/out/.cargo");
    fs::create_dir_all(cargo_root)?;

    let mut install = Exec::new(sdk.cargo())
        .args(["install", "--root"])
        .arg(cargo_root)
        .arg("cxxbridge-cmd")
        .env("CARGO_BUILD_RUSTC", sdk.rustc());
    if !config.verbose {
        install = install.arg("-q");
    }
    install.run().context("cxxbridge-cmd installation failed!")?;

    let cxxbridge = cxxbridge_bin(cargo_root)?;
    let gen_dir = Path::new(GEN_DIR);
    fs::create_dir_all(gen_dir)?;

    for module in BRIDGE_MODULES {
        let lib = format!("{module}/src/lib.rs");
        let source = Exec::new(&cxxbridge)
            .arg(&lib)
            .current_dir("native/rust")
            .read()?;
        write_if_changed(&gen_dir.join(format!("{module}-rs.cpp")), source.as_bytes())?;

        let header = Exec::new(&cxxbridge)
            .arg("--header")
            .arg(&lib)
            .current_dir("native/rust")
            .read()?;
        write_if_changed(&gen_dir.join(format!("{module}-rs.hpp")), header.as_bytes())?;
    }
    Ok(())
}

/// Absolute path of the installed cxxbridge binary. The generation step
/// runs with the Rust workspace as the working directory, so a path
/// relative to the repo root would no longer resolve once the child
/// process changes directory.
fn cxxbridge_bin(cargo_root: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(cargo_root)?.join("bin/cxxbridge"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cxxbridge_path_is_absolute() {
        let path = cxxbridge_bin(Path::new("native/out/.cargo")).unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("bin/cxxbridge"));
    }

    #[cfg(unix)]
    #[test]
    fn test_tool_spawns_from_a_different_working_directory() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let bin_dir = tmp.path().join("out/.cargo/bin");
        fs::create_dir_all(&bin_dir).unwrap();
        let tool = bin_dir.join("cxxbridge");
        fs::write(&tool, "#!/bin/sh\necho generated\n").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
        let workdir = tmp.path().join("rust");
        fs::create_dir(&workdir).unwrap();

        let resolved = cxxbridge_bin(&tmp.path().join("out/.cargo")).unwrap();
        let out = Exec::new(&resolved).current_dir(&workdir).read().unwrap();
        assert_eq!(out, "generated");
    }
}
