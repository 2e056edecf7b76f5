//! Resolve command implementation.
//!
//! Dry-runs a strategy file against a captured metadata dump, reporting per
//! strategy which tier matched. This is how a fallback chain is checked
//! against a newly captured build before shipping it.

use std::path::Path;

use anyhow::{Context, Result, bail};
use graft_core::{
    BuildVersion, ProbeLog, ResolutionStrategy, RoutineResolver, load_dump, load_strategies,
};
use tracing::warn;

pub fn run(
    dump_path: &Path,
    strategies_path: &Path,
    name: Option<&str>,
    owner_override: &[String],
    probe: bool,
    strict_version: bool,
) -> Result<()> {
    let dump = load_dump(dump_path)
        .with_context(|| format!("Failed to load metadata dump {}", dump_path.display()))?;
    let set = load_strategies(strategies_path)
        .with_context(|| format!("Failed to load strategy set {}", strategies_path.display()))?;

    if !versions_match(&dump.version, &set.version) {
        if strict_version {
            return Err(graft_core::Error::VersionMismatch {
                expected: dump.version.clone(),
                actual: set.version.clone(),
            }
            .into());
        }
        warn!(
            "Dump version {} differs from strategy version {}",
            dump.version, set.version
        );
    }

    let selected: Vec<&ResolutionStrategy> = match name {
        Some(name) => vec![
            set.strategy(name)
                .with_context(|| format!("No strategy named '{}' in the set", name))?,
        ],
        None => set.strategies.iter().collect(),
    };

    let probe_log = ProbeLog::new();
    if probe {
        probe_log.set_probe_mode(true);
    }
    let resolver = RoutineResolver::with_probe(&dump, probe_log.clone());

    let mut failed = 0usize;
    for strategy in &selected {
        let owners: Vec<&str> = if owner_override.is_empty() {
            strategy.owners.iter().map(String::as_str).collect()
        } else {
            owner_override.iter().map(String::as_str).collect()
        };
        if owners.is_empty() {
            println!("{}: SKIPPED (no owners recorded, pass --owner)", strategy.name);
            continue;
        }

        match resolver.resolve_any(&owners, strategy) {
            Ok(descriptor) => println!("{}: OK -> {}", strategy.name, descriptor),
            Err(e) => {
                failed += 1;
                println!("{}: FAILED ({})", strategy.name, e);
            }
        }
    }

    if probe {
        println!();
        println!("{}", probe_log.summary());
    }

    if failed > 0 {
        bail!("{} of {} strategies failed to resolve", failed, selected.len());
    }
    Ok(())
}

fn versions_match(dump: &str, strategies: &str) -> bool {
    if dump.is_empty() || strategies.is_empty() {
        return true;
    }
    match (
        dump.parse::<BuildVersion>(),
        strategies.parse::<BuildVersion>(),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => dump == strategies,
    }
}
