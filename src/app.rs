use anyhow::Result;

use crate::cli::{Cli, Cmd};
use crate::config::BuildConfig;
use crate::sdk::Sdk;

pub fn run(cli: Cli) -> Result<()> {
    let sdk = Sdk::locate()?;
    crate::sdk::check_javac()?;

    // Emulator flows always build and push debug binaries.
    let release = match cli.cmd {
        Cmd::Emulator { .. } | Cmd::AvdPatch { .. } => false,
        _ => cli.release,
    };
    let config = BuildConfig::load(&cli.config, release, cli.verbose)?;

    match cli.cmd {
        Cmd::All => build_all(&config, &sdk),
        Cmd::Binary { target } => crate::build::build_binary(&config, &sdk, &target),
        Cmd::App => crate::tasks::apk::build_app(&config),
        Cmd::Stub => crate::tasks::apk::build_stub(&config),
        Cmd::Emulator { skip } => crate::tasks::avd::setup_avd(&config, &sdk, skip),
        Cmd::AvdPatch { ramdisk, skip } => {
            crate::tasks::avd::patch_avd_ramdisk(&config, &sdk, &ramdisk, skip)
        }
        Cmd::Clean { target } => crate::tasks::clean::clean(&config, &target),
        Cmd::Ndk => crate::tasks::ndk::setup_ndk(&config, &sdk),
    }
}

/// Full build: stub APK first (magiskinit embeds it), then the native
/// binaries, then the app.
pub fn build_all(config: &BuildConfig, sdk: &Sdk) -> Result<()> {
    crate::tasks::apk::build_stub(config)?;
    crate::build::build_binary(config, sdk, &[])?;
    crate::tasks::apk::build_app(config)
}
