//! C/C++ cross-compilation via ndk-build, plus ELF postprocessing.

use anyhow::{Context, Result};
use std::fs;
use std::num::NonZero;
use std::path::Path;

use crate::build::arch;
use crate::config::BuildConfig;
use crate::sdk::Sdk;
use crate::util::exec::Exec;
use crate::util::fs as fsutil;

/// Every binary an ndk-build pass may emit per architecture. Relocation of
/// outputs the current flag set did not produce is skipped.
const NATIVE_OUTPUTS: &[&str] = &[
    "magisk",
    "magiskinit",
    "magiskboot",
    "magiskpolicy",
    "busybox",
    "resetprop",
    "test",
    "libpreload.so",
];

/// Run ndk-build once with the given feature flags. The build system fans
/// out over all four architectures internally; afterwards every produced
/// binary is moved from the toolchain layout into the staging tree.
pub fn build(config: &BuildConfig, sdk: &Sdk, flags: &[&str]) -> Result<()> {
    let jobs = std::thread::available_parallelism()
        .map(NonZero::get)
        .unwrap_or(1);

    Exec::new(sdk.ndk_build())
        .args(flags)
        .arg(format!("-j{jobs}"))
        .current_dir("native")
        .quiet(!config.verbose)
        .run()
        .context("Build binary failed!")?;

    for arch in arch::ALL {
        let out = arch.out_dir();
        fs::create_dir_all(&out)?;
        for name in NATIVE_OUTPUTS {
            let source = Path::new("native/libs").join(arch.abi()).join(name);
            fsutil::mv(&source, &out.join(name))?;
        }
    }
    Ok(())
}

/// Strip version symbol metadata so the binaries load on older Android
/// linkers. Builds termux-elf-cleaner from the vendored source on first
/// use; missing input binaries are skipped by the tool itself.
pub fn clean_elf(config: &BuildConfig) -> Result<()> {
    let cleaner = Path::new("native/out/elf-cleaner");
    if !cleaner.exists() {
        Exec::new("g++")
            .args([
                "-std=c++11",
                "tools/termux-elf-cleaner/termux-elf-cleaner.cpp",
                "-o",
            ])
            .arg(cleaner)
            .run()
            .context("Failed to build elf-cleaner")?;
    }

    let mut cmd = Exec::new(cleaner);
    for arch in arch::ALL {
        for bin in ["magisk", "magiskpolicy"] {
            cmd = cmd.arg(arch.out_dir().join(bin));
        }
    }
    cmd.quiet(!config.verbose).run_unchecked()?;
    Ok(())
}
