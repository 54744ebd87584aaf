//! APK builds.
//!
//! The app and stub modules are built by the external gradle build system;
//! this only invokes it and relocates the output into the staging tree.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::BuildConfig;
use crate::sdk;
use crate::util::console;
use crate::util::exec::Exec;
use crate::util::fs as fsutil;

fn build_apk(config: &BuildConfig, module: &str) -> Result<()> {
    let build_type = if config.release { "Release" } else { "Debug" };

    Exec::new(sdk::gradlew())
        .arg(format!("{module}:assemble{build_type}"))
        .arg(format!("-PconfigPath={}", config.config_path.display()))
        .quiet(!config.verbose)
        .run()
        .with_context(|| format!("Build {module} failed!"))?;

    let apk = format!("{}-{}.apk", module, config.profile());
    let source = Path::new(module)
        .join("build/outputs/apk")
        .join(config.profile())
        .join(&apk);
    let target = config.outdir.join(&apk);
    fsutil::mv(&source, &target)?;
    console::header(&format!("Output: {}", target.display()));
    Ok(())
}

pub fn build_app(config: &BuildConfig) -> Result<()> {
    console::header("* Building the Magisk app");
    build_apk(config, "app")
}

pub fn build_stub(config: &BuildConfig) -> Result<()> {
    console::header("* Building the stub app");
    build_apk(config, "stub")
}
