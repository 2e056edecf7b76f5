use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::hook::registry::RegistryShared;
use crate::metadata::RoutineToken;
use crate::probe::ProbeKind;

/// Revocable token for one installed interception.
///
/// Clones share the same underlying hook, so a callback can capture a clone
/// of its own handle and unhook from inside dispatch. Revocation is one-way:
/// once revoked a handle never dispatches again.
#[derive(Clone)]
pub struct HookHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    id: u64,
    token: RoutineToken,
    owner: String,
    routine: String,
    revoked: AtomicBool,
    registry: Weak<RegistryShared>,
}

impl HookHandle {
    pub(crate) fn new(
        id: u64,
        token: RoutineToken,
        owner: &str,
        routine: &str,
        registry: Weak<RegistryShared>,
    ) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id,
                token,
                owner: owner.to_string(),
                routine: routine.to_string(),
                revoked: AtomicBool::new(false),
                registry,
            }),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn is_active(&self) -> bool {
        !self.inner.revoked.load(Ordering::SeqCst)
    }

    /// Remove this interception. Idempotent and callable from any thread,
    /// including from inside one of the hook's own callbacks; a dispatch
    /// already in flight finishes normally.
    pub fn unhook(&self) {
        if self.inner.revoked.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("Unhooked {}", self.inner.routine);
        if let Some(registry) = self.inner.registry.upgrade() {
            registry.remove(self.inner.token, self.inner.id);
            registry.probe.record(
                ProbeKind::HookRemove,
                &self.inner.owner,
                &self.inner.routine,
                true,
                None,
            );
        }
    }
}

impl fmt::Debug for HookHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookHandle")
            .field("id", &self.inner.id)
            .field("routine", &self.inner.routine)
            .field("active", &self.is_active())
            .finish()
    }
}
