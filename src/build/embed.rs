//! Payload embedding and the build flags header.
//!
//! Prebuilt binaries (the stub APK and the per-architecture preload
//! library) are LZMA-compressed and emitted as C byte arrays so magiskinit
//! can statically link them. All generated headers go through the content
//! cache to keep unchanged regenerations timestamp-neutral.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use xz2::stream::{Check, Stream};
use xz2::write::XzEncoder;

use crate::build::arch;
use crate::build::bindings::GEN_DIR;
use crate::config::BuildConfig;
use crate::util::fs::write_if_changed;

/// Compress with LZMA preset 9 and no integrity check. The outer build is
/// assumed deterministic, so the checksum would only add payload bytes.
fn xz(data: &[u8]) -> Result<Vec<u8>> {
    let stream =
        Stream::new_easy_encoder(9, Check::None).context("Failed to create lzma encoder")?;
    let mut encoder = XzEncoder::new_stream(Vec::new(), stream);
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Render compressed payload bytes as a C array declaration, 16 encoded
/// bytes per line for readable diffs and bounded line length.
fn binary_dump(data: &[u8], var_name: &str) -> Result<String> {
    let mut out = format!("constexpr unsigned char {var_name}[] = {{");
    for (i, byte) in xz(data)?.iter().enumerate() {
        if i % 16 == 0 {
            out.push('\n');
        }
        out.push_str(&format!("0x{byte:02X},"));
    }
    out.push_str("\n};\n");
    Ok(out)
}

/// Path of the stub APK produced by the external gradle build. Payload
/// embedding requires it to exist; the stage runner checks before entry.
pub fn stub_apk(config: &BuildConfig) -> PathBuf {
    config.outdir.join(format!("stub-{}.apk", config.profile()))
}

/// Embed the stub APK (architecture-independent) and each architecture's
/// preload library into generated headers.
pub fn dump_bin_headers(config: &BuildConfig) -> Result<()> {
    let gen_dir = Path::new(GEN_DIR);
    fs::create_dir_all(gen_dir)?;

    let stub = stub_apk(config);
    let data =
        fs::read(&stub).with_context(|| format!("Failed to read {}", stub.display()))?;
    write_if_changed(
        &gen_dir.join("binaries.h"),
        binary_dump(&data, "manager_xz")?.as_bytes(),
    )?;

    for arch in arch::ALL {
        let preload = arch.out_dir().join("libpreload.so");
        let data = fs::read(&preload)
            .with_context(|| format!("Failed to read {}", preload.display()))?;
        write_if_changed(
            &gen_dir.join(format!("{}_binaries.h", arch.abi())),
            binary_dump(&data, "preload_xz")?.as_bytes(),
        )?;
    }
    Ok(())
}

/// Render the version/flag macro header consumed by all native code.
fn render_flags(version: &str, version_code: i64, release: bool) -> String {
    let mut flags = String::from(
        "#pragma once\n\
         #define quote(s)            #s\n\
         #define str(s)              quote(s)\n\
         #define MAGISK_FULL_VER     MAGISK_VERSION \"(\" str(MAGISK_VER_CODE) \")\"\n\
         #define NAME_WITH_VER(name) str(name) \" \" MAGISK_FULL_VER\n",
    );
    flags.push_str(&format!("#define MAGISK_VERSION      \"{version}\"\n"));
    flags.push_str(&format!("#define MAGISK_VER_CODE     {version_code}\n"));
    flags.push_str(&format!(
        "#define MAGISK_DEBUG        {}\n",
        if release { 0 } else { 1 }
    ));
    flags
}

/// Write the flags header through the content cache.
pub fn dump_flag_header(config: &BuildConfig) -> Result<()> {
    let flags = render_flags(&config.version, config.version_code, config.release);
    fs::create_dir_all(GEN_DIR)?;
    write_if_changed(&Path::new(GEN_DIR).join("flags.h"), flags.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn dump_payload(dump: &str) -> Vec<u8> {
        // Recover the compressed bytes from the generated array text.
        let mut bytes = Vec::new();
        for line in dump.lines().skip(1) {
            for value in line.split(',') {
                if let Some(hex) = value.trim().strip_prefix("0x") {
                    bytes.push(u8::from_str_radix(hex, 16).unwrap());
                }
            }
        }
        bytes
    }

    #[test]
    fn test_payload_round_trips_through_lzma() {
        let payload: Vec<u8> = (0..2048u32).map(|i| (i % 251) as u8).collect();
        let dump = binary_dump(&payload, "manager_xz").unwrap();

        let compressed = dump_payload(&dump);
        let mut decoded = Vec::new();
        xz2::read::XzDecoder::new(&compressed[..])
            .read_to_end(&mut decoded)
            .unwrap();

        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_dump_declaration_and_line_width() {
        let payload = vec![0u8; 4096];
        let dump = binary_dump(&payload, "preload_xz").unwrap();
        let mut lines = dump.lines();

        assert_eq!(
            lines.next().unwrap(),
            "constexpr unsigned char preload_xz[] = {"
        );

        let body: Vec<&str> = dump
            .lines()
            .skip(1)
            .filter(|l| l.starts_with("0x"))
            .collect();
        assert!(!body.is_empty());
        // Every full line carries exactly 16 two-digit uppercase hex literals.
        for line in &body[..body.len() - 1] {
            assert_eq!(line.matches("0x").count(), 16);
            for hex in line.split(',').filter_map(|v| v.strip_prefix("0x")) {
                assert_eq!(hex.len(), 2);
                assert_eq!(hex.to_uppercase(), hex);
            }
        }
        assert!(dump.ends_with("\n};\n"));
    }

    #[test]
    fn test_flags_header_defines_version_macros() {
        let flags = render_flags("a1b2c3d4", 100, false);
        assert!(flags.starts_with("#pragma once\n"));
        assert!(flags.contains("#define MAGISK_VERSION      \"a1b2c3d4\"\n"));
        assert!(flags.contains("#define MAGISK_VER_CODE     100\n"));
        assert!(flags.contains("#define MAGISK_DEBUG        1\n"));
    }

    #[test]
    fn test_release_flags_header_disables_debug() {
        let flags = render_flags("27.0", 27000, true);
        assert!(flags.contains("#define MAGISK_DEBUG        0\n"));
    }

    #[test]
    fn test_compression_is_deterministic() {
        let payload = b"deterministic input".repeat(64);
        assert_eq!(xz(&payload).unwrap(), xz(&payload).unwrap());
    }
}
