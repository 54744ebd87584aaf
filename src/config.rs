//! Build configuration.
//!
//! Assembled once at process start from defaults, the config prop file and
//! the `magisk.`-prefixed keys of `gradle.properties`, then passed by
//! reference into every stage. Never mutated afterwards.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::BuildError;
use crate::util::exec::Exec;

pub struct BuildConfig {
    pub version: String,
    pub version_code: i64,
    pub outdir: PathBuf,
    /// Absolute path of the config file, forwarded to the gradle build.
    pub config_path: PathBuf,
    pub release: bool,
    pub verbose: bool,
    props: HashMap<String, String>,
}

impl BuildConfig {
    pub fn load(config_path: &Path, release: bool, verbose: bool) -> Result<Self> {
        let mut props = HashMap::new();
        props.insert("version".to_string(), git_short_rev());
        props.insert("outdir".to_string(), "out".to_string());

        if config_path.exists() {
            let text = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            props.extend(parse_props(&text));
        }
        if let Ok(text) = fs::read_to_string("gradle.properties") {
            merge_prefixed(&mut props, &text, "magisk.");
        }

        let version_code = parse_version_code(&props)?;

        let outdir = PathBuf::from(&props["outdir"]);
        fs::create_dir_all(&outdir)
            .with_context(|| format!("Failed to create {}", outdir.display()))?;

        Ok(Self {
            version: props["version"].clone(),
            version_code,
            outdir,
            config_path: std::path::absolute(config_path)?,
            release,
            verbose,
            props,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.props.get(key).map(String::as_str)
    }

    /// Profile name shared by the cargo output directory and APK naming.
    pub fn profile(&self) -> &'static str {
        if self.release {
            "release"
        } else {
            "debug"
        }
    }
}

/// Parse a line-oriented `key=value` prop file. Blank lines and `#` comments
/// are ignored, lines with more than one `=` are skipped, and empty values
/// are dropped.
fn parse_props(text: &str) -> Vec<(String, String)> {
    let mut props = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(3, '=');
        let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        props.push((key.trim().to_string(), value.to_string()));
    }
    props
}

/// The `versionCode` prop is mandatory and must parse as an integer.
fn parse_version_code(props: &HashMap<String, String>) -> Result<i64> {
    props
        .get("versionCode")
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or_else(|| {
            BuildError::Config("\"versionCode\" is required to be an integer".to_string()).into()
        })
}

/// Merge prop entries whose keys carry `prefix`, with the prefix stripped.
fn merge_prefixed(props: &mut HashMap<String, String>, text: &str, prefix: &str) {
    for (key, value) in parse_props(text) {
        if let Some(stripped) = key.strip_prefix(prefix) {
            props.insert(stripped.to_string(), value);
        }
    }
}

/// Short revision id of the current checkout; empty outside a git tree.
fn git_short_rev() -> String {
    Exec::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .read()
        .unwrap_or_default()
}
