use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::hook::{CallContext, HookHandle, InterceptionCallback, Value};
use crate::metadata::{RoutineDescriptor, RoutineToken};
use crate::probe::{ProbeKind, ProbeLog};

#[derive(Clone)]
struct InstalledHook {
    handle: HookHandle,
    callback: InterceptionCallback,
}

pub(crate) struct RegistryShared {
    hooks: Mutex<HashMap<RoutineToken, Vec<InstalledHook>>>,
    next_id: AtomicU64,
    pub(crate) probe: ProbeLog,
}

impl RegistryShared {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<RoutineToken, Vec<InstalledHook>>> {
        self.hooks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn remove(&self, token: RoutineToken, id: u64) {
        let mut hooks = self.lock();
        if let Some(list) = hooks.get_mut(&token) {
            list.retain(|h| h.handle.id() != id);
            if list.is_empty() {
                hooks.remove(&token);
            }
        }
    }
}

/// Process-wide table of installed interceptions.
///
/// Constructed once at startup and passed to whatever installs or dispatches
/// hooks. Install runs on the initializing thread; dispatch runs on
/// arbitrary host threads. The registry lock is never held while callbacks
/// execute, so a callback may install or unhook without deadlocking.
pub struct HookRegistry {
    shared: Arc<RegistryShared>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::with_probe(ProbeLog::new())
    }

    pub fn with_probe(probe: ProbeLog) -> Self {
        Self {
            shared: Arc::new(RegistryShared {
                hooks: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                probe,
            }),
        }
    }

    pub fn probe(&self) -> &ProbeLog {
        &self.shared.probe
    }

    /// Install one interception on a resolved routine.
    ///
    /// Multiple interceptions coexist on the same routine, ordered by
    /// priority; installing a second one at an already-taken priority fails
    /// rather than silently replacing it.
    pub fn install(
        &self,
        descriptor: &RoutineDescriptor,
        callback: InterceptionCallback,
    ) -> Result<HookHandle> {
        let token = descriptor.token();
        let priority = callback.priority();

        let mut hooks = self.shared.lock();
        let list = hooks.entry(token).or_default();
        if list.iter().any(|h| h.callback.priority() == priority) {
            drop(hooks);
            warn!(
                "Refusing duplicate hook on {} at priority {}",
                descriptor, priority
            );
            let err = Error::DuplicateHook {
                routine: descriptor.to_string(),
                priority,
            };
            self.shared.probe.record(
                ProbeKind::HookInstall,
                descriptor.owner(),
                &descriptor.routine().signature(),
                false,
                Some(err.to_string()),
            );
            return Err(err);
        }

        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        let handle = HookHandle::new(
            id,
            token,
            descriptor.owner(),
            &descriptor.to_string(),
            Arc::downgrade(&self.shared),
        );
        let position = list.partition_point(|h| h.callback.priority() <= priority);
        list.insert(
            position,
            InstalledHook {
                handle: handle.clone(),
                callback,
            },
        );
        drop(hooks);

        debug!("Installed hook on {} at priority {}", descriptor, priority);
        self.shared.probe.record(
            ProbeKind::HookInstall,
            descriptor.owner(),
            &descriptor.routine().signature(),
            true,
            None,
        );
        Ok(handle)
    }

    /// Remove every active hook, for feature-disable or re-initialization.
    pub fn uninstall_all(&self) {
        let drained: Vec<InstalledHook> = {
            let mut hooks = self.shared.lock();
            hooks.drain().flat_map(|(_, list)| list).collect()
        };
        let count = drained.len();
        for hook in drained {
            hook.handle.unhook();
        }
        if count > 0 {
            info!("Uninstalled {} hook(s)", count);
        }
    }

    /// Number of currently installed hooks across all routines.
    pub fn active_hooks(&self) -> usize {
        self.shared.lock().values().map(Vec::len).sum()
    }

    /// Number of hooks installed on one routine.
    pub fn hooks_on(&self, token: RoutineToken) -> usize {
        self.shared.lock().get(&token).map_or(0, Vec::len)
    }

    /// Run one intercepted invocation through the callback pipeline.
    ///
    /// The host calls this in place of the routine, supplying a closure
    /// that performs the real call. Before-callbacks run lowest-priority
    /// first and see each other's argument mutations; an abort skips the
    /// original and the remaining before-callbacks. After-callbacks run in
    /// reverse order and may replace the result. The returned value is what
    /// the original caller receives.
    pub fn dispatch<F>(
        &self,
        descriptor: &RoutineDescriptor,
        receiver: Option<Value>,
        args: Vec<Value>,
        original: F,
    ) -> Value
    where
        F: FnOnce(Option<&Value>, &[Value]) -> Value,
    {
        let hooks: Vec<InstalledHook> = self
            .shared
            .lock()
            .get(&descriptor.token())
            .cloned()
            .unwrap_or_default();

        let mut ctx = CallContext::new(receiver, args);

        if hooks.is_empty() {
            return original(ctx.receiver(), ctx.args());
        }

        for hook in &hooks {
            if ctx.is_aborted() {
                break;
            }
            if !hook.handle.is_active() {
                continue;
            }
            self.run_guarded(descriptor, hook, Phase::Before, &mut ctx);
        }

        if ctx.is_aborted() {
            debug!("{}: call aborted by before-callback", descriptor);
        } else {
            let result = original(ctx.receiver(), ctx.args());
            ctx.set_result(result);
        }

        for hook in hooks.iter().rev() {
            if !hook.handle.is_active() {
                continue;
            }
            self.run_guarded(descriptor, hook, Phase::After, &mut ctx);
        }

        ctx.take_result().unwrap_or(Value::Null)
    }

    /// Run one callback phase against a scratch copy of the context,
    /// committing only on success. A fault (error or panic) is logged and
    /// discarded with all of the callback's partial mutations; it never
    /// reaches the host's call stack.
    fn run_guarded(
        &self,
        descriptor: &RoutineDescriptor,
        hook: &InstalledHook,
        phase: Phase,
        ctx: &mut CallContext,
    ) {
        let mut scratch = ctx.clone();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match phase {
            Phase::Before => hook.callback.run_before(&mut scratch),
            Phase::After => hook.callback.run_after(&mut scratch),
        }));

        let fault = match outcome {
            Ok(Ok(())) => {
                *ctx = scratch;
                return;
            }
            Ok(Err(e)) => e.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };

        error!(
            "{}: {} callback at priority {} faulted: {}",
            descriptor,
            phase,
            hook.callback.priority(),
            fault
        );
        self.shared.probe.record(
            ProbeKind::CallbackFault,
            descriptor.owner(),
            &format!("{} priority {}", phase, hook.callback.priority()),
            false,
            Some(fault),
        );
    }
}

impl Default for HookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Before,
    After,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Before => write!(f, "before"),
            Phase::After => write!(f, "after"),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::{InterceptionCallback, PRIORITY_DEFAULT};
    use crate::metadata::{MockMetadataBuilder, ParamType};
    use crate::resolve::RoutineResolver;
    use crate::signature::{Arity, ResolutionStrategy, SignaturePattern};
    use std::sync::OnceLock;
    use std::sync::atomic::AtomicUsize;

    const PWM: &str = "com.android.server.policy.PhoneWindowManager";

    fn power_press_descriptor() -> RoutineDescriptor {
        let dump = MockMetadataBuilder::new()
            .method(PWM, "powerPress", &[ParamType::Long, ParamType::Int, ParamType::Bool])
            .build();
        let strategy = ResolutionStrategy::single(
            "powerPress",
            SignaturePattern::method("powerPress").arity(Arity::Exact(3)),
        );
        RoutineResolver::new(&dump).resolve(PWM, &strategy).unwrap()
    }

    fn original_counter() -> (Arc<AtomicUsize>, impl Fn(Option<&Value>, &[Value]) -> Value) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        (calls, move |_recv: Option<&Value>, args: &[Value]| {
            calls2.fetch_add(1, Ordering::SeqCst);
            args.first().cloned().unwrap_or(Value::Null)
        })
    }

    #[test]
    fn test_dispatch_without_hooks_passes_through() {
        let registry = HookRegistry::new();
        let descriptor = power_press_descriptor();
        let result = registry.dispatch(&descriptor, None, vec![Value::Int(42)], |_, args| {
            args[0].clone()
        });
        assert_eq!(result, Value::Int(42));
    }

    #[test]
    fn test_before_mutations_visible_to_later_priorities() {
        let registry = HookRegistry::new();
        let descriptor = power_press_descriptor();

        let observed: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
        let observed2 = Arc::clone(&observed);

        registry
            .install(
                &descriptor,
                InterceptionCallback::before(10, |ctx| {
                    ctx.set_arg(0, 7);
                    Ok(())
                }),
            )
            .unwrap();
        registry
            .install(
                &descriptor,
                InterceptionCallback::before(20, move |ctx| {
                    *observed2.lock().unwrap() = ctx.arg(0).cloned();
                    Ok(())
                }),
            )
            .unwrap();

        let result = registry.dispatch(&descriptor, None, vec![Value::Int(5)], |_, args| {
            args[0].clone()
        });

        assert_eq!(*observed.lock().unwrap(), Some(Value::Int(7)));
        assert_eq!(result, Value::Int(7));
    }

    #[test]
    fn test_install_order_does_not_beat_priority() {
        let registry = HookRegistry::new();
        let descriptor = power_press_descriptor();
        let order: Arc<Mutex<Vec<i32>>> = Arc::new(Mutex::new(Vec::new()));

        for priority in [30, 10, 20] {
            let order2 = Arc::clone(&order);
            registry
                .install(
                    &descriptor,
                    InterceptionCallback::before(priority, move |_| {
                        order2.lock().unwrap().push(priority);
                        Ok(())
                    }),
                )
                .unwrap();
        }

        registry.dispatch(&descriptor, None, vec![], |_, _| Value::Null);
        assert_eq!(*order.lock().unwrap(), vec![10, 20, 30]);
    }

    #[test]
    fn test_after_callbacks_run_in_reverse_priority() {
        let registry = HookRegistry::new();
        let descriptor = power_press_descriptor();
        let order: Arc<Mutex<Vec<i32>>> = Arc::new(Mutex::new(Vec::new()));

        for priority in [10, 20] {
            let order2 = Arc::clone(&order);
            registry
                .install(
                    &descriptor,
                    InterceptionCallback::after(priority, move |_| {
                        order2.lock().unwrap().push(priority);
                        Ok(())
                    }),
                )
                .unwrap();
        }

        registry.dispatch(&descriptor, None, vec![], |_, _| Value::Null);
        assert_eq!(*order.lock().unwrap(), vec![20, 10]);
    }

    #[test]
    fn test_abort_skips_original_and_remaining_befores() {
        let registry = HookRegistry::new();
        let descriptor = power_press_descriptor();
        let (calls, original) = original_counter();
        let late_ran = Arc::new(AtomicUsize::new(0));
        let late_ran2 = Arc::clone(&late_ran);

        registry
            .install(
                &descriptor,
                InterceptionCallback::before(10, |ctx| {
                    ctx.abort_with(true);
                    Ok(())
                }),
            )
            .unwrap();
        registry
            .install(
                &descriptor,
                InterceptionCallback::before(20, move |_| {
                    late_ran2.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            )
            .unwrap();

        let result = registry.dispatch(&descriptor, None, vec![Value::Int(1)], original);

        assert_eq!(result, Value::Bool(true));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(late_ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_after_callback_sees_and_replaces_override() {
        let registry = HookRegistry::new();
        let descriptor = power_press_descriptor();
        let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
        let seen2 = Arc::clone(&seen);

        registry
            .install(
                &descriptor,
                InterceptionCallback::before(PRIORITY_DEFAULT, |ctx| {
                    ctx.abort_with(5);
                    Ok(())
                }),
            )
            .unwrap();
        registry
            .install(
                &descriptor,
                InterceptionCallback::after(60, move |ctx| {
                    *seen2.lock().unwrap() = ctx.result().cloned();
                    ctx.set_result(6);
                    Ok(())
                }),
            )
            .unwrap();

        let result = registry.dispatch(&descriptor, None, vec![], |_, _| Value::Null);

        assert_eq!(*seen.lock().unwrap(), Some(Value::Int(5)));
        assert_eq!(result, Value::Int(6));
    }

    #[test]
    fn test_faulting_callback_mutations_are_rolled_back() {
        let registry = HookRegistry::new();
        let descriptor = power_press_descriptor();

        registry
            .install(
                &descriptor,
                InterceptionCallback::before(PRIORITY_DEFAULT, |ctx| {
                    ctx.set_arg(0, 999);
                    Err(Error::callback("flag store unavailable"))
                }),
            )
            .unwrap();

        // Invocation N: result equals the original's, unmutated
        let result = registry.dispatch(&descriptor, None, vec![Value::Int(5)], |_, args| {
            args[0].clone()
        });
        assert_eq!(result, Value::Int(5));

        // Invocation N+1 still dispatches normally
        let result = registry.dispatch(&descriptor, None, vec![Value::Int(8)], |_, args| {
            args[0].clone()
        });
        assert_eq!(result, Value::Int(8));
    }

    #[test]
    fn test_panicking_callback_is_contained() {
        let registry = HookRegistry::new();
        let descriptor = power_press_descriptor();

        registry
            .install(
                &descriptor,
                InterceptionCallback::before(PRIORITY_DEFAULT, |_| panic!("boom")),
            )
            .unwrap();

        let result = registry.dispatch(&descriptor, None, vec![Value::Int(3)], |_, args| {
            args[0].clone()
        });
        assert_eq!(result, Value::Int(3));

        let faults = registry.probe().entries();
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].kind, ProbeKind::CallbackFault);
        assert_eq!(faults[0].error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_unhook_is_idempotent() {
        let registry = HookRegistry::new();
        let descriptor = power_press_descriptor();
        let (calls, _) = original_counter();
        let calls2 = Arc::clone(&calls);

        let handle = registry
            .install(
                &descriptor,
                InterceptionCallback::before(PRIORITY_DEFAULT, move |_| {
                    calls2.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            )
            .unwrap();
        assert_eq!(registry.active_hooks(), 1);

        handle.unhook();
        handle.unhook();
        handle.unhook();

        assert!(!handle.is_active());
        assert_eq!(registry.active_hooks(), 0);

        registry.dispatch(&descriptor, None, vec![], |_, _| Value::Null);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_duplicate_priority_rejected() {
        let registry = HookRegistry::new();
        let descriptor = power_press_descriptor();

        registry
            .install(
                &descriptor,
                InterceptionCallback::before(PRIORITY_DEFAULT, |_| Ok(())),
            )
            .unwrap();
        let err = registry
            .install(
                &descriptor,
                InterceptionCallback::before(PRIORITY_DEFAULT, |_| Ok(())),
            )
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateHook { priority, .. } if priority == PRIORITY_DEFAULT));

        // Freed priority can be reused
        registry.uninstall_all();
        registry
            .install(
                &descriptor,
                InterceptionCallback::before(PRIORITY_DEFAULT, |_| Ok(())),
            )
            .unwrap();
        assert_eq!(registry.active_hooks(), 1);
    }

    #[test]
    fn test_uninstall_all_revokes_handles() {
        let registry = HookRegistry::new();
        let descriptor = power_press_descriptor();

        let h1 = registry
            .install(&descriptor, InterceptionCallback::before(10, |_| Ok(())))
            .unwrap();
        let h2 = registry
            .install(&descriptor, InterceptionCallback::before(20, |_| Ok(())))
            .unwrap();
        assert_eq!(registry.hooks_on(descriptor.token()), 2);

        registry.uninstall_all();
        assert_eq!(registry.active_hooks(), 0);
        assert!(!h1.is_active());
        assert!(!h2.is_active());
    }

    #[test]
    fn test_self_unhook_makes_one_shot_hook() {
        let registry = HookRegistry::new();
        let descriptor = power_press_descriptor();
        let fired = Arc::new(AtomicUsize::new(0));
        let fired2 = Arc::clone(&fired);

        let slot: Arc<OnceLock<HookHandle>> = Arc::new(OnceLock::new());
        let slot2 = Arc::clone(&slot);
        let handle = registry
            .install(
                &descriptor,
                InterceptionCallback::before(PRIORITY_DEFAULT, move |_| {
                    fired2.fetch_add(1, Ordering::SeqCst);
                    if let Some(own) = slot2.get() {
                        own.unhook();
                    }
                    Ok(())
                }),
            )
            .unwrap();
        let _ = slot.set(handle);

        registry.dispatch(&descriptor, None, vec![], |_, _| Value::Null);
        registry.dispatch(&descriptor, None, vec![], |_, _| Value::Null);

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(registry.active_hooks(), 0);
    }
}
