//! Process plumbing shared by the status services: tracing setup, typed
//! environment lookups, listener binding and shutdown signalling.

mod env;
mod logging;
mod net;

pub use env::{env_flag, env_opt, env_or};
pub use logging::{init_tracing, TracingGuards};
pub use net::{bind_listener, shutdown_signal};
