mod callback;
mod context;
mod handle;
mod registry;

pub use callback::{
    InterceptionCallback, Interceptor, PRIORITY_DEFAULT, PRIORITY_HIGHEST, PRIORITY_LOWEST,
};
pub use context::{CallContext, Value};
pub use handle::HookHandle;
pub use registry::HookRegistry;
