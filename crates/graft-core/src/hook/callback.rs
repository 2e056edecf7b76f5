use std::sync::Arc;

use crate::error::Result;
use crate::hook::CallContext;

/// Runs first among before-callbacks (and last among after-callbacks).
pub const PRIORITY_LOWEST: i32 = -10000;
pub const PRIORITY_DEFAULT: i32 = 50;
/// Runs last among before-callbacks (and first among after-callbacks).
pub const PRIORITY_HIGHEST: i32 = 10000;

/// Before/after contract of one interception.
///
/// Both phases default to no-ops so implementors override only what they
/// need. Callbacks run on whatever host thread invokes the routine and must
/// not block; a returned error (or a panic) is contained at the dispatch
/// boundary and the invocation proceeds as if the callback were absent.
pub trait Interceptor: Send + Sync {
    fn before(&self, _ctx: &mut CallContext) -> Result<()> {
        Ok(())
    }

    fn after(&self, _ctx: &mut CallContext) -> Result<()> {
        Ok(())
    }
}

type HookFn = dyn Fn(&mut CallContext) -> Result<()> + Send + Sync;

struct ClosureInterceptor {
    before: Option<Box<HookFn>>,
    after: Option<Box<HookFn>>,
}

impl Interceptor for ClosureInterceptor {
    fn before(&self, ctx: &mut CallContext) -> Result<()> {
        match &self.before {
            Some(f) => f(ctx),
            None => Ok(()),
        }
    }

    fn after(&self, ctx: &mut CallContext) -> Result<()> {
        match &self.after {
            Some(f) => f(ctx),
            None => Ok(()),
        }
    }
}

/// One interception to install: an [`Interceptor`] plus its priority.
///
/// Lower priorities run earlier in the before phase; the after phase runs in
/// reverse, so a low-priority guard brackets the whole chain.
#[derive(Clone)]
pub struct InterceptionCallback {
    priority: i32,
    interceptor: Arc<dyn Interceptor>,
}

impl InterceptionCallback {
    pub fn new(priority: i32, interceptor: impl Interceptor + 'static) -> Self {
        Self {
            priority,
            interceptor: Arc::new(interceptor),
        }
    }

    pub fn before(
        priority: i32,
        f: impl Fn(&mut CallContext) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self::new(
            priority,
            ClosureInterceptor {
                before: Some(Box::new(f)),
                after: None,
            },
        )
    }

    pub fn after(
        priority: i32,
        f: impl Fn(&mut CallContext) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self::new(
            priority,
            ClosureInterceptor {
                before: None,
                after: Some(Box::new(f)),
            },
        )
    }

    pub fn around(
        priority: i32,
        before: impl Fn(&mut CallContext) -> Result<()> + Send + Sync + 'static,
        after: impl Fn(&mut CallContext) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self::new(
            priority,
            ClosureInterceptor {
                before: Some(Box::new(before)),
                after: Some(Box::new(after)),
            },
        )
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub(crate) fn run_before(&self, ctx: &mut CallContext) -> Result<()> {
        self.interceptor.before(ctx)
    }

    pub(crate) fn run_after(&self, ctx: &mut CallContext) -> Result<()> {
        self.interceptor.after(ctx)
    }
}
