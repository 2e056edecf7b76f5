//! Dotted build-version ordering, for gating strategy sets on the target
//! build a metadata dump was captured from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BuildVersion {
    parts: Vec<u32>,
}

impl BuildVersion {
    pub fn is_at_least(&self, other: &BuildVersion) -> bool {
        self >= other
    }
}

impl FromStr for BuildVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidVersion(s.to_string()));
        }
        let mut parts = trimmed
            .split('.')
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| Error::InvalidVersion(s.to_string()))
            })
            .collect::<Result<Vec<u32>, Error>>()?;
        // Normalize so "1.2" and "1.2.0" compare equal
        while parts.len() > 1 && parts.last() == Some(&0) {
            parts.pop();
        }
        Ok(Self { parts })
    }
}

impl TryFrom<String> for BuildVersion {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<BuildVersion> for String {
    fn from(v: BuildVersion) -> Self {
        v.to_string()
    }
}

impl fmt::Display for BuildVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self
            .parts
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{}", parts)
    }
}
