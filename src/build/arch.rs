//! The architecture matrix.
//!
//! Four Android ABIs, each with a fixed clang triple. ndk-build fans out
//! over all of them in one invocation; the cargo cross build iterates them
//! one at a time.

use std::path::{Path, PathBuf};

/// Minimum Android platform API level for all native code.
pub const ANDROID_API: u32 = 21;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arch {
    Armv7,
    X86,
    Arm64,
    X86_64,
}

pub const ALL: [Arch; 4] = [Arch::Armv7, Arch::X86, Arch::Arm64, Arch::X86_64];

impl Arch {
    /// ABI directory name used by the NDK output layout.
    pub fn abi(self) -> &'static str {
        match self {
            Arch::Armv7 => "armeabi-v7a",
            Arch::X86 => "x86",
            Arch::Arm64 => "arm64-v8a",
            Arch::X86_64 => "x86_64",
        }
    }

    /// Clang target triple.
    pub fn triple(self) -> &'static str {
        match self {
            Arch::Armv7 => "armv7a-linux-androideabi",
            Arch::X86 => "i686-linux-android",
            Arch::Arm64 => "aarch64-linux-android",
            Arch::X86_64 => "x86_64-linux-android",
        }
    }

    /// Triple handed to cargo. 32-bit ARM builds with the NEON thumb
    /// variant; every other architecture reuses the clang triple.
    pub fn rust_triple(self) -> &'static str {
        match self {
            Arch::Armv7 => "thumbv7neon-linux-androideabi",
            other => other.triple(),
        }
    }

    /// Per-architecture staging directory for relocated artifacts.
    pub fn out_dir(self) -> PathBuf {
        Path::new("native/out").join(self.abi())
    }
}
