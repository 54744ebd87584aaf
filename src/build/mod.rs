//! The binary build pipeline.
//!
//! Stage order:
//! 1. NDK version check
//! 2. FFI binding generation + Rust cross compile (per architecture)
//! 3. Flags header
//! 4. ndk-build pass 1 (aggregated flags for all non-init targets)
//! 5. ELF cleanup
//! 6. magiskinit only: payload embedding, then ndk-build pass 2 (`B_INIT=1`)
//! 7. busybox only: ndk-build pass 3 (`B_BB=1`)
//!
//! The sequence is expressed as an explicit stage list with declared input
//! preconditions so the ordering invariants are checked, not implied.

pub mod arch;
pub mod bindings;
pub mod cargo;
pub mod embed;
pub mod ndk;

use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::config::BuildConfig;
use crate::errors::BuildError;
use crate::sdk::Sdk;
use crate::util::console;

/// Targets built when none are named on the command line.
pub const DEFAULT_TARGETS: &[&str] =
    &["magisk", "magiskinit", "magiskboot", "magiskpolicy", "busybox"];

/// All buildable targets. Requests are intersected with this set; anything
/// else is silently dropped.
pub const SUPPORT_TARGETS: &[&str] = &[
    "magisk",
    "magiskinit",
    "magiskboot",
    "magiskpolicy",
    "busybox",
    "resetprop",
    "test",
];

/// The subset backed by Rust crates.
pub const RUST_TARGETS: &[&str] = &["magisk", "magiskinit", "magiskboot", "magiskpolicy"];

/// ndk-build feature flag contributed by each target. The flag values are a
/// contract of the native build system and are preserved as given. magiskinit
/// contributes the preload library here; the init binary itself compiles in
/// its own later pass, and busybox never shares a pass with anything.
const TARGET_FLAGS: &[(&str, &str)] = &[
    ("magisk", "B_MAGISK=1"),
    ("magiskpolicy", "B_POLICY=1"),
    ("test", "B_TEST=1"),
    ("magiskinit", "B_PRELOAD=1"),
    ("resetprop", "B_PROP=1"),
    ("magiskboot", "B_BOOT=1"),
];

/// One step of the pipeline. `requires` names artifacts from earlier or
/// external stages that must exist before this stage may run.
struct Stage<'a> {
    name: &'static str,
    requires: Vec<PathBuf>,
    run: Box<dyn FnOnce() -> Result<()> + 'a>,
}

fn run_stages(stages: Vec<Stage>) -> Result<()> {
    for stage in stages {
        for input in &stage.requires {
            if !input.exists() {
                return Err(BuildError::Precondition(format!(
                    "{} requires {}, which has not been built",
                    stage.name,
                    input.display()
                ))
                .into());
            }
        }
        (stage.run)()?;
    }
    Ok(())
}

/// Intersect the requested target names with the supported set, in the
/// supported order. An empty request selects the defaults.
fn resolve_targets(requested: &[String]) -> Vec<&'static str> {
    if requested.is_empty() {
        return DEFAULT_TARGETS.to_vec();
    }
    SUPPORT_TARGETS
        .iter()
        .copied()
        .filter(|t| requested.iter().any(|r| r == t))
        .collect()
}

/// Aggregate the pass-1 flags for the requested targets, in table order.
fn aggregate_flags(targets: &[&str]) -> Vec<&'static str> {
    TARGET_FLAGS
        .iter()
        .filter(|(target, _)| targets.contains(target))
        .map(|(_, flag)| *flag)
        .collect()
}

/// The pinned NDK install must match the configured ONDK version.
fn check_ndk_version(config: &BuildConfig, sdk: &Sdk) -> Result<()> {
    let installed = fs::read_to_string(sdk.ndk_path.join("ONDK_VERSION"))
        .map(|v| v.trim().to_string())
        .unwrap_or_default();
    if config.get("ondkVersion") != Some(installed.as_str()) || installed.is_empty() {
        return Err(BuildError::Environment(
            "Unmatched NDK. Please install/upgrade NDK with \"magisk-build ndk\"".to_string(),
        )
        .into());
    }
    Ok(())
}

/// Build the requested native binaries. A request fully disjoint from the
/// supported set is a no-op, not an error.
pub fn build_binary(config: &BuildConfig, sdk: &Sdk, requested: &[String]) -> Result<()> {
    check_ndk_version(config, sdk)?;

    let targets = resolve_targets(requested);
    if targets.is_empty() {
        return Ok(());
    }
    console::header(&format!("* Building binaries: {}", targets.join(" ")));

    let mut stages: Vec<Stage> = vec![
        Stage {
            name: "binding generation",
            requires: vec![],
            run: Box::new(|| bindings::generate(config, sdk)),
        },
        Stage {
            name: "rust cross compile",
            requires: vec![],
            run: Box::new(|| cargo::build(config, sdk, &targets)),
        },
        Stage {
            name: "flags header",
            requires: vec![],
            run: Box::new(|| embed::dump_flag_header(config)),
        },
    ];

    let flags = aggregate_flags(&targets);
    if !flags.is_empty() {
        stages.push(Stage {
            name: "native compile",
            requires: vec![PathBuf::from(bindings::GEN_DIR).join("flags.h")],
            run: Box::new(move || {
                ndk::build(config, sdk, &flags)?;
                ndk::clean_elf(config)
            }),
        });
    }

    if targets.contains(&"magiskinit") {
        // The init binary statically links the payload headers generated
        // right before its pass, so it cannot join the first compile.
        stages.push(Stage {
            name: "payload embedding",
            requires: std::iter::once(embed::stub_apk(config))
                .chain(arch::ALL.iter().map(|a| a.out_dir().join("libpreload.so")))
                .collect(),
            run: Box::new(|| embed::dump_bin_headers(config)),
        });
        stages.push(Stage {
            name: "magiskinit compile",
            requires: vec![PathBuf::from(bindings::GEN_DIR).join("binaries.h")],
            run: Box::new(|| ndk::build(config, sdk, &["B_INIT=1"])),
        });
    }

    if targets.contains(&"busybox") {
        stages.push(Stage {
            name: "busybox compile",
            requires: vec![],
            run: Box::new(|| ndk::build(config, sdk, &["B_BB=1"])),
        });
    }

    run_stages(stages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_request_selects_defaults() {
        assert_eq!(resolve_targets(&[]), DEFAULT_TARGETS);
    }

    #[test]
    fn test_disjoint_request_resolves_empty() {
        let requested = vec!["frobnicator".to_string(), "gadget".to_string()];
        assert!(resolve_targets(&requested).is_empty());
    }

    #[test]
    fn test_unknown_names_are_dropped_from_mixed_requests() {
        let requested = vec!["magiskboot".to_string(), "frobnicator".to_string()];
        assert_eq!(resolve_targets(&requested), vec!["magiskboot"]);
    }

    #[test]
    fn test_flag_aggregation() {
        assert_eq!(
            aggregate_flags(&["magisk", "magiskpolicy"]),
            vec!["B_MAGISK=1", "B_POLICY=1"]
        );
        assert_eq!(aggregate_flags(&["resetprop"]), vec!["B_PROP=1"]);
    }

    #[test]
    fn test_busybox_contributes_no_shared_flag() {
        assert!(aggregate_flags(&["busybox"]).is_empty());
    }

    #[test]
    fn test_stage_with_missing_input_fails_before_running() {
        let mut ran = false;
        let stage = Stage {
            name: "payload embedding",
            requires: vec![PathBuf::from("/nonexistent/stub-debug.apk")],
            run: Box::new(|| {
                ran = true;
                Ok(())
            }),
        };
        let err = run_stages(vec![stage]).unwrap_err();
        assert!(err.to_string().contains("stub-debug.apk"));
        assert!(!ran);
    }

    #[test]
    fn test_stages_run_in_declared_order() {
        let order = std::cell::RefCell::new(Vec::new());
        let stages = vec![
            Stage {
                name: "first",
                requires: vec![],
                run: Box::new(|| {
                    order.borrow_mut().push("first");
                    Ok(())
                }),
            },
            Stage {
                name: "second",
                requires: vec![],
                run: Box::new(|| {
                    order.borrow_mut().push("second");
                    Ok(())
                }),
            },
        ];
        run_stages(stages).unwrap();
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }
}
