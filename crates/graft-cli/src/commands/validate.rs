//! Validate command implementation.
//!
//! Lints a strategy file. The engine deliberately does not police fallback
//! chains at resolution time, so misordered tiers would otherwise only
//! surface as wrong-routine hooks on some vendor build in the field.

use std::path::Path;

use anyhow::{Context, Result, bail};
use graft_core::{ParamPredicate, ResolutionStrategy, SignaturePattern, StrategySet, load_strategies};

pub fn run(strategies_path: &Path) -> Result<()> {
    let set = load_strategies(strategies_path)
        .with_context(|| format!("Failed to load strategy set {}", strategies_path.display()))?;

    let issues = lint_set(&set);
    if issues.is_empty() {
        println!(
            "OK: {} strategies, no issues",
            set.strategies.len()
        );
        return Ok(());
    }

    for issue in &issues {
        println!("{}", issue);
    }
    bail!("{} issue(s) found", issues.len());
}

fn lint_set(set: &StrategySet) -> Vec<String> {
    let mut issues = Vec::new();
    for strategy in &set.strategies {
        lint_strategy(strategy, &mut issues);
    }
    issues
}

fn lint_strategy(strategy: &ResolutionStrategy, issues: &mut Vec<String>) {
    if strategy.is_empty() {
        issues.push(format!("{}: empty fallback chain", strategy.name));
        return;
    }
    if strategy.owners.is_empty() {
        issues.push(format!("{}: no owner types recorded", strategy.name));
    }

    for (i, earlier) in strategy.patterns.iter().enumerate() {
        for (j, later) in strategy.patterns.iter().enumerate().skip(i + 1) {
            if earlier == later {
                issues.push(format!(
                    "{}: tier {} duplicates tier {}",
                    strategy.name,
                    j + 1,
                    i + 1
                ));
            } else if tightens(earlier, later) {
                issues.push(format!(
                    "{}: tier {} is stricter than tier {} (chains must relax, not tighten)",
                    strategy.name,
                    j + 1,
                    i + 1
                ));
            }
        }
    }
}

/// True when `later` accepts strictly fewer shapes than `earlier`.
///
/// Only comparable when the tiers target the same name, kind and arity:
/// tiers with different arities are alternate shapes, not relaxations
/// (e.g. an 8-arg and a 9-arg form of the same constructor).
fn tightens(earlier: &SignaturePattern, later: &SignaturePattern) -> bool {
    if earlier.name != later.name || earlier.kind != later.kind || earlier.arity != later.arity {
        return false;
    }
    let positions = earlier.positions.len().max(later.positions.len());
    let mut strict_somewhere = false;
    for i in 0..positions {
        let ep = earlier.positions.get(i).unwrap_or(&ParamPredicate::Any);
        let lp = later.positions.get(i).unwrap_or(&ParamPredicate::Any);
        if !ep.is_no_stricter_than(lp) {
            // later is looser here, so it is not a pure tightening
            return false;
        }
        if !lp.is_no_stricter_than(ep) {
            strict_somewhere = true;
        }
    }
    strict_somewhere
}
