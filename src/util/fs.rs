//! Filesystem helpers for the staging tree.
//!
//! Artifact relocation is lenient about missing sources (a binary not
//! requested by the current flag set legitimately does not exist), but any
//! other I/O failure propagates.

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Write `content` to `path` only when it differs from the file's current
/// bytes. Skipping identical writes preserves the modification time, so
/// mtime-triggered downstream build systems see no change. Returns whether
/// a write happened. An unreadable existing file counts as different.
pub fn write_if_changed(path: &Path, content: &[u8]) -> Result<bool> {
    if let Ok(existing) = fs::read(path) {
        if existing == content {
            return Ok(false);
        }
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

/// Move `source` to `target`. A missing source is not an error; returns
/// whether a move happened. Falls back to copy+remove for files when a
/// rename is not possible.
pub fn mv(source: &Path, target: &Path) -> Result<bool> {
    if !source.exists() {
        return Ok(false);
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    if fs::rename(source, target).is_err() {
        if source.is_dir() {
            return Err(anyhow::anyhow!(
                "Failed to move {} -> {}",
                source.display(),
                target.display()
            ));
        }
        fs::copy(source, target)
            .with_context(|| format!("Failed to copy {}", source.display()))?;
        fs::remove_file(source)
            .with_context(|| format!("Failed to remove {}", source.display()))?;
    }
    Ok(true)
}

/// Copy a file. A missing source is not an error; returns whether a copy
/// happened.
pub fn cp(source: &Path, target: &Path) -> Result<bool> {
    if !source.exists() {
        return Ok(false);
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, target)
        .with_context(|| format!("Failed to copy {}", source.display()))?;
    Ok(true)
}

/// Remove a file; already-absent files are fine.
pub fn rm(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

/// Remove a directory tree; already-absent trees are fine.
pub fn rm_rf(path: &Path) {
    let _ = fs::remove_dir_all(path);
}

/// Recursively copy `src` into `dst`, overwriting existing files.
pub fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_if_changed_skips_identical_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gen.h");
        fs::write(&path, b"content").unwrap();
        let mtime = fs::metadata(&path).unwrap().modified().unwrap();

        let wrote = write_if_changed(&path, b"content").unwrap();

        assert!(!wrote);
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), mtime);
    }

    #[test]
    fn test_write_if_changed_writes_on_difference() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gen.h");
        fs::write(&path, b"old").unwrap();

        let wrote = write_if_changed(&path, b"new").unwrap();

        assert!(wrote);
        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn test_write_if_changed_creates_missing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sub/dir/gen.h");

        let wrote = write_if_changed(&path, b"fresh").unwrap();

        assert!(wrote);
        assert_eq!(fs::read(&path).unwrap(), b"fresh");
    }

    #[test]
    fn test_second_regeneration_is_a_no_op() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("module-rs.hpp");

        assert!(write_if_changed(&path, b"bindings").unwrap());
        let mtime = fs::metadata(&path).unwrap().modified().unwrap();
        assert!(!write_if_changed(&path, b"bindings").unwrap());
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), mtime);
    }

    #[test]
    fn test_mv_missing_source_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let moved = mv(&tmp.path().join("absent"), &tmp.path().join("dest")).unwrap();
        assert!(!moved);
    }

    #[test]
    fn test_mv_relocates_file() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("libmagisk.a");
        let target = tmp.path().join("out/libmagisk-rs.a");
        fs::write(&source, b"archive").unwrap();

        assert!(mv(&source, &target).unwrap());
        assert!(!source.exists());
        assert_eq!(fs::read(&target).unwrap(), b"archive");
    }

    #[test]
    fn test_cp_missing_source_is_ignored() {
        let tmp = TempDir::new().unwrap();
        let copied = cp(&tmp.path().join("absent"), &tmp.path().join("dest")).unwrap();
        assert!(!copied);
    }

    #[test]
    fn test_rm_missing_file_is_ok() {
        let tmp = TempDir::new().unwrap();
        rm(&tmp.path().join("absent")).unwrap();
    }
}
