//! ONDK installation.
//!
//! Downloads the pinned ONDK release, extracts it under the SDK with a
//! path-traversal guard, and overlays the patched API-21 static stubs over
//! the toolchain sysroot.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Component, Path};
use tar::Archive;

use crate::build::arch::ANDROID_API;
use crate::config::BuildConfig;
use crate::errors::BuildError;
use crate::sdk::{self, Sdk};
use crate::util::console;
use crate::util::exec::Exec;
use crate::util::fs as fsutil;

const ONDK_RELEASE_URL: &str = "https://github.com/topjohnwu/ondk/releases/download";

/// Triples whose sysroot static libs get replaced by the patched copies
/// vendored under `tools/ndk-bins`.
const PATCH_TRIPLES: &[&str] = &[
    "aarch64-linux-android",
    "arm-linux-androideabi",
    "i686-linux-android",
    "x86_64-linux-android",
];

pub fn setup_ndk(config: &BuildConfig, sdk: &Sdk) -> Result<()> {
    let ver = config.get("ondkVersion").ok_or_else(|| {
        BuildError::Config("\"ondkVersion\" is required to set up the NDK".to_string())
    })?;
    let os = sdk::host_os();
    let archive_name = format!("ondk-{ver}-{os}.tar.gz");
    let url = format!("{ONDK_RELEASE_URL}/{ver}/{archive_name}");

    console::header(&format!("* Downloading and extracting {archive_name}"));

    fs::create_dir_all(&sdk.ndk_root)?;
    let archive = config.outdir.join(&archive_name);
    Exec::new("curl")
        .args(["-L", "-f", "-o"])
        .arg(&archive)
        .arg(&url)
        .quiet(!config.verbose)
        .run()
        .with_context(|| format!("Failed to download {url}"))?;

    extract_tar_gz(&archive, &sdk.ndk_root)?;
    fsutil::rm(&archive)?;

    fsutil::rm_rf(&sdk.ndk_path);
    fs::rename(sdk.ndk_root.join(format!("ondk-{ver}")), &sdk.ndk_path)
        .context("Failed to move extracted NDK into place")?;

    console::header("* Patching static libs");
    for &triple in PATCH_TRIPLES {
        let arch = triple.split('-').next().unwrap_or(triple);
        let lib_dir = sdk.ndk_path.join(format!(
            "toolchains/llvm/prebuilt/{os}-x86_64/sysroot/usr/lib/{triple}/{ANDROID_API}"
        ));
        if !lib_dir.exists() {
            continue;
        }
        let src_dir = Path::new("tools/ndk-bins")
            .join(ANDROID_API.to_string())
            .join(arch);
        fsutil::rm(&src_dir.join(".DS_Store"))?;
        fsutil::copy_dir(&src_dir, &lib_dir)?;
    }

    Ok(())
}

/// Unpack a gzipped tarball into `dest`. Every entry is validated first;
/// one entry resolving outside the destination fails the whole archive
/// before anything is written.
fn extract_tar_gz(archive: &Path, dest: &Path) -> Result<()> {
    let mut tar = open_archive(archive)?;
    for entry in tar.entries()? {
        let entry = entry?;
        let path = entry.path()?;
        if !is_safe_entry(&path) {
            return Err(BuildError::PathTraversal(path.display().to_string()).into());
        }
    }

    let mut tar = open_archive(archive)?;
    tar.unpack(dest)
        .with_context(|| format!("Failed to extract {}", archive.display()))?;
    Ok(())
}

fn open_archive(archive: &Path) -> Result<Archive<GzDecoder<BufReader<File>>>> {
    let file =
        File::open(archive).with_context(|| format!("Failed to open {}", archive.display()))?;
    Ok(Archive::new(GzDecoder::new(BufReader::new(file))))
}

/// An entry is safe when its path is relative and never walks above the
/// extraction root.
fn is_safe_entry(path: &Path) -> bool {
    let mut depth: i32 = 0;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_tar_gz(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let gz = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        let mut builder = tar::Builder::new(gz);
        for (name, data) in entries {
            let mut header = tar::Header::new_gnu();
            // Write the name bytes directly; Header::set_path refuses `..`
            // components, which the guard tests need to produce.
            header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append(&header, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn test_safe_entry_accepts_nested_paths() {
        assert!(is_safe_entry(Path::new("ondk-r1/bin/cargo")));
        assert!(is_safe_entry(Path::new("./a/../b")));
    }

    #[test]
    fn test_safe_entry_rejects_escapes() {
        assert!(!is_safe_entry(Path::new("../evil")));
        assert!(!is_safe_entry(Path::new("a/../../evil")));
        assert!(!is_safe_entry(Path::new("/etc/passwd")));
    }

    #[test]
    fn test_extract_rejects_traversal_and_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("evil.tar.gz");
        write_tar_gz(
            &archive,
            &[("ok.txt", b"fine" as &[u8]), ("../evil.txt", b"bad")],
        );

        let dest = tmp.path().join("dest");
        fs::create_dir(&dest).unwrap();
        let err = extract_tar_gz(&archive, &dest).unwrap_err();

        assert!(err.to_string().contains("escapes"));
        assert!(!dest.join("ok.txt").exists());
        assert!(!tmp.path().join("evil.txt").exists());
    }

    #[test]
    fn test_extract_unpacks_clean_archive() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("ondk.tar.gz");
        write_tar_gz(
            &archive,
            &[("ondk-r1/ONDK_VERSION", b"r1" as &[u8]), ("ondk-r1/bin/cc", b"\x7fELF")],
        );

        let dest = tmp.path().join("dest");
        fs::create_dir(&dest).unwrap();
        extract_tar_gz(&archive, &dest).unwrap();

        assert_eq!(fs::read(dest.join("ondk-r1/ONDK_VERSION")).unwrap(), b"r1");
        assert!(dest.join("ondk-r1/bin/cc").exists());
    }

    #[test]
    fn test_gz_roundtrip_helper() {
        // Guards the test fixture itself: the builder must produce archives
        // tar can read back.
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("t.tar.gz");
        write_tar_gz(&archive, &[("file", b"data" as &[u8])]);
        let mut tar = open_archive(&archive).unwrap();
        let names: Vec<String> = tar
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().display().to_string())
            .collect();
        assert_eq!(names, vec!["file"]);
    }
}
