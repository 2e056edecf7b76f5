//! # graft-core
//!
//! Core library for the graft interception toolkit.
//!
//! This crate provides:
//! - Signature patterns and strict-to-loose resolution strategies
//! - Routine resolution against a host-supplied metadata provider
//! - Hook installation, priority-ordered before/after dispatch, and
//!   idempotent revocation
//! - Shared coordination state for interceptors
//! - A bounded probe log of resolution and hook lifecycle events
//!
//! The engine never scans or mutates the target itself: discovery hands it
//! type identifiers, a [`MetadataProvider`] lists live routine metadata, and
//! the host routes intercepted invocations through
//! [`HookRegistry::dispatch`]. Every failure is recovered at the lowest
//! boundary so a missing or ambiguous routine disables one capability
//! instead of crashing the host.

pub mod config;
pub mod error;
pub mod hook;
pub mod metadata;
pub mod probe;
pub mod resolve;
pub mod signature;
pub mod state;
pub mod version;

pub use config::{ConfigValue, FeatureConfig};
pub use error::{Error, Result};
pub use hook::{
    CallContext, HookHandle, HookRegistry, InterceptionCallback, Interceptor, PRIORITY_DEFAULT,
    PRIORITY_HIGHEST, PRIORITY_LOWEST, Value,
};
pub use metadata::{
    MetadataDump, MetadataProvider, ParamType, RoutineDescriptor, RoutineKind, RoutineMetadata,
    RoutineToken, TypeMetadata, load_dump, save_dump,
};
pub use probe::{ProbeEntry, ProbeKind, ProbeLog};
pub use resolve::RoutineResolver;
pub use signature::{
    Arity, ParamPredicate, ResolutionStrategy, SignaturePattern, StrategySet, load_strategies,
    save_strategies,
};
pub use state::SharedStateStore;
pub use version::BuildVersion;
