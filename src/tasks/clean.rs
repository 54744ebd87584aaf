//! Build output cleanup.
//!
//! Staging-tree inconsistencies from a failed run are cleaned here
//! explicitly rather than auto-healed by the build stages.

use anyhow::Result;
use std::path::Path;

use crate::config::BuildConfig;
use crate::sdk;
use crate::util::console;
use crate::util::exec::Exec;
use crate::util::fs as fsutil;

const CLEAN_TARGETS: &[&str] = &["native", "java"];

pub fn clean(config: &BuildConfig, requested: &[String]) -> Result<()> {
    let targets: Vec<&str> = if requested.is_empty() {
        CLEAN_TARGETS.to_vec()
    } else {
        CLEAN_TARGETS
            .iter()
            .copied()
            .filter(|t| requested.iter().any(|r| r == t))
            .collect()
    };

    if targets.contains(&"native") {
        console::header("* Cleaning native");
        fsutil::rm_rf(Path::new("native/out"));
        fsutil::rm_rf(Path::new("native/libs"));
        fsutil::rm_rf(Path::new("native/obj"));
        fsutil::rm_rf(Path::new("native/rust/target"));
    }

    if targets.contains(&"java") {
        console::header("* Cleaning java");
        Exec::new(sdk::gradlew())
            .args(["app:clean", "app:shared:clean", "stub:clean"])
            .quiet(!config.verbose)
            .run()?;
    }

    Ok(())
}
