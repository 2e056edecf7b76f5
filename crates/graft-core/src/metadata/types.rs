use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::Result;

/// Parameter type of a routine, as reported by the host environment.
///
/// Named types are carried by their fully qualified name; the engine never
/// inspects them beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Bool,
    Int,
    Long,
    Float,
    Double,
    Object(String),
}

impl ParamType {
    pub fn object(name: impl Into<String>) -> Self {
        ParamType::Object(name.into())
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, ParamType::Object(_))
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Bool => write!(f, "bool"),
            ParamType::Int => write!(f, "int"),
            ParamType::Long => write!(f, "long"),
            ParamType::Float => write!(f, "float"),
            ParamType::Double => write!(f, "double"),
            ParamType::Object(name) => write!(f, "{}", name),
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    Display,
)]
#[serde(rename_all = "lowercase")]
pub enum RoutineKind {
    #[strum(serialize = "method")]
    Method,
    #[strum(serialize = "constructor")]
    Constructor,
}

/// Opaque per-routine identity handed out by the host environment.
///
/// Tokens are only compared for equality and used as registry keys; the
/// engine attaches no meaning to the value itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoutineToken(pub u64);

impl fmt::Display for RoutineToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One declared routine of an owning type, as listed by a [`MetadataProvider`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineMetadata {
    pub token: RoutineToken,
    pub kind: RoutineKind,
    /// Routine name; absent for constructors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub params: Vec<ParamType>,
}

impl RoutineMetadata {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Human-readable signature, e.g. `powerPress(long, int, bool)`.
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        match (&self.kind, &self.name) {
            (RoutineKind::Constructor, _) => format!("new({})", params),
            (RoutineKind::Method, Some(name)) => format!("{}({})", name, params),
            (RoutineKind::Method, None) => format!("?({})", params),
        }
    }
}

/// A concrete routine picked by resolution.
///
/// Only the resolver produces these; holding one means the routine was
/// uniquely matched against live metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutineDescriptor {
    owner: String,
    routine: RoutineMetadata,
}

impl RoutineDescriptor {
    pub(crate) fn new(owner: impl Into<String>, routine: RoutineMetadata) -> Self {
        Self {
            owner: owner.into(),
            routine,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn routine(&self) -> &RoutineMetadata {
        &self.routine
    }

    pub fn token(&self) -> RoutineToken {
        self.routine.token
    }
}

impl fmt::Display for RoutineDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.owner, self.routine.signature())
    }
}

/// Capability-bounded view of the host's loaded routine metadata.
///
/// The host (or a captured dump of it) implements this; the engine performs
/// no scanning or I/O of its own. `list_routines` fails with
/// [`crate::Error::TypeNotFound`] when the owning type cannot be located.
pub trait MetadataProvider {
    fn type_exists(&self, owner: &str) -> bool;

    fn list_routines(&self, owner: &str) -> Result<Vec<RoutineMetadata>>;
}
