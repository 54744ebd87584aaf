//! SDK and NDK toolchain locations, derived once from `ANDROID_SDK_ROOT`.

use anyhow::Result;
use std::env;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::errors::BuildError;

pub struct Sdk {
    pub sdk_root: PathBuf,
    /// `<sdk>/ndk`, the parent of all installed NDK versions.
    pub ndk_root: PathBuf,
    /// `<sdk>/ndk/magisk`, the pinned ONDK install.
    pub ndk_path: PathBuf,
}

impl Sdk {
    pub fn locate() -> Result<Self> {
        let sdk_root = env::var_os("ANDROID_SDK_ROOT")
            .map(PathBuf::from)
            .ok_or_else(|| {
                BuildError::Environment(
                    "Please add Android SDK path to ANDROID_SDK_ROOT environment variable!"
                        .to_string(),
                )
            })?;
        let ndk_root = sdk_root.join("ndk");
        let ndk_path = ndk_root.join("magisk");
        Ok(Self {
            sdk_root,
            ndk_root,
            ndk_path,
        })
    }

    pub fn ndk_build(&self) -> PathBuf {
        self.ndk_path.join("ndk-build")
    }

    pub fn cargo(&self) -> PathBuf {
        self.ndk_path.join("toolchains/rust/bin/cargo")
    }

    pub fn rustc(&self) -> PathBuf {
        self.ndk_path.join("toolchains/rust/bin/rustc")
    }

    pub fn clang(&self) -> PathBuf {
        self.ndk_path
            .join(format!("toolchains/llvm/prebuilt/{}-x86_64/bin/clang", host_os()))
    }

    pub fn adb(&self) -> PathBuf {
        self.sdk_root.join("platform-tools/adb")
    }
}

/// Host OS name as used by NDK prebuilt directories and ONDK archives.
pub fn host_os() -> &'static str {
    if cfg!(target_os = "macos") {
        "darwin"
    } else {
        "linux"
    }
}

/// The gradle wrapper at the repository root.
pub fn gradlew() -> PathBuf {
    PathBuf::from("./gradlew")
}

/// The JDK must be installed with `javac` on PATH before any gradle build.
pub fn check_javac() -> Result<()> {
    Command::new("javac")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|_| {
            BuildError::Environment(
                "Please install JDK and make sure 'javac' is available in PATH".to_string(),
            )
        })?;
    Ok(())
}
