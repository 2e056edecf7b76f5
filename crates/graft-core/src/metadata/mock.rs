//! Test helpers for building in-memory metadata providers.

use crate::metadata::{
    MetadataDump, ParamType, RoutineKind, RoutineMetadata, RoutineToken, TypeMetadata,
};

/// Builds a [`MetadataDump`] routine by routine, assigning tokens
/// sequentially so tests can refer to them by insertion order.
pub struct MockMetadataBuilder {
    dump: MetadataDump,
    next_token: u64,
}

impl MockMetadataBuilder {
    pub fn new() -> Self {
        Self {
            dump: MetadataDump::default(),
            next_token: 1,
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.dump.version = version.to_string();
        self
    }

    pub fn method(self, owner: &str, name: &str, params: &[ParamType]) -> Self {
        self.push(owner, RoutineKind::Method, Some(name.to_string()), params)
    }

    pub fn constructor(self, owner: &str, params: &[ParamType]) -> Self {
        self.push(owner, RoutineKind::Constructor, None, params)
    }

    fn push(
        mut self,
        owner: &str,
        kind: RoutineKind,
        name: Option<String>,
        params: &[ParamType],
    ) -> Self {
        let routine = RoutineMetadata {
            token: RoutineToken(self.next_token),
            kind,
            name,
            params: params.to_vec(),
        };
        self.next_token += 1;

        match self.dump.types.iter_mut().find(|t| t.name == owner) {
            Some(t) => t.routines.push(routine),
            None => self.dump.types.push(TypeMetadata {
                name: owner.to_string(),
                routines: vec![routine],
            }),
        }
        self
    }

    pub fn build(self) -> MetadataDump {
        self.dump
    }
}

impl Default for MockMetadataBuilder {
    fn default() -> Self {
        Self::new()
    }
}
