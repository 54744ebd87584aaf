use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "magisk-build")]
#[command(about = "Magisk build orchestrator")]
pub struct Cli {
    /// Compile in release mode
    #[arg(short, long, global = true)]
    pub release: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Custom config file
    #[arg(short, long, global = true, default_value = "config.prop")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Build everything (stub + binaries + app)
    All,

    /// Build native binaries
    Binary {
        /// magisk, magiskinit, magiskboot, magiskpolicy, busybox, resetprop,
        /// test, or empty for defaults
        target: Vec<String>,
    },

    /// Build the Magisk app
    App,

    /// Build the stub app
    Stub,

    /// Set up AVD for development
    Emulator {
        /// Skip building binaries and the app
        #[arg(short, long)]
        skip: bool,
    },

    /// Patch AVD ramdisk.img
    #[command(name = "avd_patch")]
    AvdPatch {
        /// Path to ramdisk.img
        ramdisk: PathBuf,

        /// Skip building binaries and the app
        #[arg(short, long)]
        skip: bool,
    },

    /// Remove build output
    Clean {
        /// native, java, or empty to clean both
        target: Vec<String>,
    },

    /// Set up the Magisk NDK
    Ndk,
}
