//! Feature-flag configuration
//!
//! A flat key → bool/string map handed to the engine once at initialization
//! by whatever owns preference storage. The engine never persists or watches
//! it; changing a flag means re-initializing the consumers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Str(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    #[serde(flatten)]
    values: HashMap<String, ConfigValue>,
}

impl FeatureConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: HashMap<String, ConfigValue>) -> Self {
        Self { values }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.values.insert(key.into(), ConfigValue::Bool(value));
    }

    pub fn set_str(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .insert(key.into(), ConfigValue::Str(value.into()));
    }

    /// Boolean flag with a default for absent or non-boolean entries.
    pub fn flag(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(ConfigValue::Bool(b)) => *b,
            _ => default,
        }
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(ConfigValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
