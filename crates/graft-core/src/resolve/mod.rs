//! Routine resolution against live metadata
//!
//! Walks a strategy's fallback chain strict-to-loose and stops at the first
//! pattern with exactly one match. Ambiguity at any tier fails immediately:
//! a looser tier can only be more ambiguous, and guessing between candidates
//! would hook the wrong routine on some builds.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::metadata::{MetadataProvider, RoutineDescriptor};
use crate::probe::{ProbeKind, ProbeLog};
use crate::signature::ResolutionStrategy;

pub struct RoutineResolver<'a, P: MetadataProvider> {
    provider: &'a P,
    probe: ProbeLog,
}

impl<'a, P: MetadataProvider> RoutineResolver<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            probe: ProbeLog::new(),
        }
    }

    /// Share a probe log with other components (typically the registry's).
    pub fn with_probe(provider: &'a P, probe: ProbeLog) -> Self {
        Self { provider, probe }
    }

    pub fn probe(&self) -> &ProbeLog {
        &self.probe
    }

    /// Resolve a unique routine of `owner` using the strategy's fallback
    /// chain. Read-only: the target's metadata is never mutated.
    pub fn resolve(
        &self,
        owner: &str,
        strategy: &ResolutionStrategy,
    ) -> Result<RoutineDescriptor> {
        let routines = match self.provider.list_routines(owner) {
            Ok(routines) => {
                self.probe
                    .record(ProbeKind::TypeLookup, owner, &strategy.name, true, None);
                routines
            }
            Err(e) => {
                warn!("{}: owning type not found: {}", strategy.name, e);
                self.probe.record(
                    ProbeKind::TypeLookup,
                    owner,
                    &strategy.name,
                    false,
                    Some(e.to_string()),
                );
                return Err(e);
            }
        };

        debug!(
            "{}: resolving against {} ({} routines, {} patterns)",
            strategy.name,
            owner,
            routines.len(),
            strategy.len()
        );

        for (index, pattern) in strategy.patterns.iter().enumerate() {
            let matched: Vec<_> = routines.iter().filter(|r| pattern.matches(r)).collect();
            match matched.len() {
                0 => {
                    debug!(
                        "{}: pattern {}/{} [{}] matched nothing",
                        strategy.name,
                        index + 1,
                        strategy.len(),
                        pattern.describe()
                    );
                }
                1 => {
                    let routine = matched[0].clone();
                    debug!(
                        "{}: pattern {}/{} [{}] matched {}",
                        strategy.name,
                        index + 1,
                        strategy.len(),
                        pattern.describe(),
                        routine.signature()
                    );
                    self.probe.record(
                        ProbeKind::RoutineLookup,
                        owner,
                        &routine.signature(),
                        true,
                        None,
                    );
                    return Ok(RoutineDescriptor::new(owner, routine));
                }
                count => {
                    // Do not fall through: a looser tier will be at least as
                    // ambiguous, and an under-specified pattern needs fixing.
                    warn!(
                        "{}: pattern {}/{} [{}] is ambiguous, {} candidates in {}",
                        strategy.name,
                        index + 1,
                        strategy.len(),
                        pattern.describe(),
                        count,
                        owner
                    );
                    let err = Error::AmbiguousRoutine {
                        owner: owner.to_string(),
                        pattern: index,
                        count,
                    };
                    self.probe.record(
                        ProbeKind::RoutineLookup,
                        owner,
                        &strategy.name,
                        false,
                        Some(err.to_string()),
                    );
                    return Err(err);
                }
            }
        }

        debug!(
            "{}: no pattern matched any routine of {}",
            strategy.name, owner
        );
        let err = Error::RoutineNotFound {
            owner: owner.to_string(),
            tried: strategy.len(),
        };
        self.probe.record(
            ProbeKind::RoutineLookup,
            owner,
            &strategy.name,
            false,
            Some(err.to_string()),
        );
        Err(err)
    }

    /// Resolve against the first owner that yields a match.
    ///
    /// Vendor forks move routines between related types, so a site may have
    /// to probe several owners. A missing owner or an empty match advances
    /// to the next candidate; ambiguity stops the search like in
    /// [`resolve`](Self::resolve).
    pub fn resolve_any(
        &self,
        owners: &[&str],
        strategy: &ResolutionStrategy,
    ) -> Result<RoutineDescriptor> {
        for owner in owners {
            if !self.provider.type_exists(owner) {
                debug!("{}: candidate owner {} not present", strategy.name, owner);
                continue;
            }
            match self.resolve(owner, strategy) {
                Ok(descriptor) => return Ok(descriptor),
                Err(Error::RoutineNotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(Error::TypeNotFound(owners.join(", ")))
    }
}
