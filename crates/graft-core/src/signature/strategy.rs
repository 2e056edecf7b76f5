use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::signature::SignaturePattern;

/// Ordered fallback chain of signature patterns, strict-to-loose.
///
/// The engine tries patterns in order and stops at the first unique match.
/// Keeping later tiers no stricter than earlier ones is the caller's job;
/// a misordered chain is not rejected here (the CLI `validate` command
/// lints for it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionStrategy {
    pub name: String,
    /// Candidate owning types, most likely first. Discovery may override
    /// these at runtime; recorded here so strategy files are self-contained.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<String>,
    pub patterns: Vec<SignaturePattern>,
}

impl ResolutionStrategy {
    pub fn new(name: impl Into<String>, patterns: Vec<SignaturePattern>) -> Self {
        Self {
            name: name.into(),
            owners: Vec::new(),
            patterns,
        }
    }

    /// Single-tier strategy, for targets with a stable shape.
    pub fn single(name: impl Into<String>, pattern: SignaturePattern) -> Self {
        Self::new(name, vec![pattern])
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owners.push(owner.into());
        self
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Versioned collection of named strategies, stored as one JSON file per
/// target build family.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategySet {
    pub version: String,
    pub strategies: Vec<ResolutionStrategy>,
}

impl StrategySet {
    pub fn strategy(&self, name: &str) -> Option<&ResolutionStrategy> {
        self.strategies
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }
}

pub fn load_strategies<P: AsRef<Path>>(path: P) -> Result<StrategySet> {
    let content = fs::read_to_string(&path)?;
    let data = serde_json::from_str(&content)?;
    Ok(data)
}

pub fn save_strategies<P: AsRef<Path>>(path: P, set: &StrategySet) -> Result<()> {
    let content = serde_json::to_string_pretty(set)?;
    fs::write(path, content)?;
    Ok(())
}
