pub mod dump;
mod types;

#[cfg(test)]
pub mod mock;

pub use dump::{MetadataDump, TypeMetadata, load_dump, save_dump};
pub use types::{
    MetadataProvider, ParamType, RoutineDescriptor, RoutineKind, RoutineMetadata, RoutineToken,
};

#[cfg(test)]
pub use mock::MockMetadataBuilder;
