//! Captured metadata dumps
//!
//! A dump is a JSON snapshot of a target build's type surface (types and
//! their declared routines), recorded once on a device and replayed through
//! the [`MetadataProvider`] interface for offline strategy work.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::metadata::{MetadataProvider, RoutineMetadata};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeMetadata {
    pub name: String,
    #[serde(default)]
    pub routines: Vec<RoutineMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataDump {
    /// Target build version the dump was captured from (e.g. "11.6.0936").
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub types: Vec<TypeMetadata>,
}

impl MetadataDump {
    pub fn type_metadata(&self, name: &str) -> Option<&TypeMetadata> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.name.as_str())
    }
}

impl MetadataProvider for MetadataDump {
    fn type_exists(&self, owner: &str) -> bool {
        self.type_metadata(owner).is_some()
    }

    fn list_routines(&self, owner: &str) -> Result<Vec<RoutineMetadata>> {
        self.type_metadata(owner)
            .map(|t| t.routines.clone())
            .ok_or_else(|| Error::TypeNotFound(owner.to_string()))
    }
}

pub fn load_dump<P: AsRef<Path>>(path: P) -> Result<MetadataDump> {
    let content = fs::read_to_string(&path)?;
    let dump = serde_json::from_str(&content)?;
    Ok(dump)
}

pub fn save_dump<P: AsRef<Path>>(path: P, dump: &MetadataDump) -> Result<()> {
    let content = serde_json::to_string_pretty(dump)?;
    fs::write(path, content)?;
    Ok(())
}
