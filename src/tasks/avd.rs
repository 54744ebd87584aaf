//! Emulator provisioning.
//!
//! Both flows push freshly built debug binaries plus the setup scripts to
//! the device and hand control to the scripts; the scripts themselves are
//! external collaborators.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::BuildConfig;
use crate::sdk::Sdk;
use crate::util::console;
use crate::util::exec::Exec;
use crate::util::fs as fsutil;

/// ABI reported by the connected device/emulator.
fn device_abi(sdk: &Sdk) -> Result<String> {
    Exec::new(sdk.adb())
        .args(["shell", "getprop", "ro.product.cpu.abi"])
        .read()
        .context("Failed to query device ABI")
}

pub fn setup_avd(config: &BuildConfig, sdk: &Sdk, skip: bool) -> Result<()> {
    if !skip {
        crate::app::build_all(config, sdk)?;
    }

    console::header("* Setting up emulator");

    let abi = device_abi(sdk)?;
    Exec::new(sdk.adb())
        .arg("push")
        .arg(Path::new("native/out").join(&abi).join("busybox"))
        .arg(config.outdir.join("app-debug.apk"))
        .arg("scripts/avd_magisk.sh")
        .arg("/data/local/tmp")
        .quiet(!config.verbose)
        .run()
        .context("adb push failed!")?;

    Exec::new(sdk.adb())
        .args(["shell", "sh", "/data/local/tmp/avd_magisk.sh"])
        .quiet(!config.verbose)
        .run()
        .context("avd_magisk.sh failed!")?;

    Ok(())
}

pub fn patch_avd_ramdisk(
    config: &BuildConfig,
    sdk: &Sdk,
    ramdisk: &Path,
    skip: bool,
) -> Result<()> {
    if !skip {
        crate::app::build_all(config, sdk)?;
    }

    console::header("* Patching emulator ramdisk.img");

    // Keep a pristine copy around so reruns never patch a patched image.
    let backup = PathBuf::from(format!("{}.bak", ramdisk.display()));
    if !backup.exists() {
        fsutil::cp(ramdisk, &backup)?;
    }

    // The emulator must not boot with system-as-root for the patch to hold.
    let ini = ramdisk
        .parent()
        .unwrap_or(Path::new("."))
        .join("advancedFeatures.ini");
    let features = fs::read_to_string(&ini)
        .with_context(|| format!("Failed to read {}", ini.display()))?;
    if features.contains("SystemAsRoot = on") {
        fsutil::cp(&ini, &PathBuf::from(format!("{}.bak", ini.display())))?;
        fs::write(&ini, features.replace("SystemAsRoot = on", "SystemAsRoot = off"))
            .with_context(|| format!("Failed to write {}", ini.display()))?;
    }

    let abi = device_abi(sdk)?;
    Exec::new(sdk.adb())
        .arg("push")
        .arg(Path::new("native/out").join(&abi).join("busybox"))
        .arg(config.outdir.join("app-debug.apk"))
        .arg("scripts/avd_patch.sh")
        .arg("/data/local/tmp")
        .quiet(!config.verbose)
        .run()
        .context("adb push failed!")?;

    Exec::new(sdk.adb())
        .arg("push")
        .arg(&backup)
        .arg("/data/local/tmp/ramdisk.cpio.tmp")
        .quiet(!config.verbose)
        .run()
        .context("adb push failed!")?;

    Exec::new(sdk.adb())
        .args(["shell", "sh", "/data/local/tmp/avd_patch.sh"])
        .quiet(!config.verbose)
        .run()
        .context("avd_patch.sh failed!")?;

    Exec::new(sdk.adb())
        .args(["pull", "/data/local/tmp/ramdisk.cpio.gz"])
        .arg(ramdisk)
        .quiet(!config.verbose)
        .run()
        .context("adb pull failed!")?;

    Ok(())
}
