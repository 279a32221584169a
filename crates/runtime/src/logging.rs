//! Logging setup for C hosts
//!
//! hstack-core emits `tracing` events (table growth and release at `debug`,
//! allocation fallbacks at `warn`, push/pop at `trace`). Nothing is printed
//! until a subscriber is installed; C programs without their own Rust
//! subscriber call `hstack_init_logging` once at startup.
//!
//! ## Configuration (Environment Variables)
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `HSTACK_LOG` | unset | `EnvFilter` directives, e.g. `hstack_core=debug` |
//! | `RUST_LOG` | unset | Used when `HSTACK_LOG` is not set |
//!
//! With neither set, only warnings are shown.

use tracing_subscriber::EnvFilter;

pub const ENV_LOG: &str = "HSTACK_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

/// Build the filter from `HSTACK_LOG`, then `RUST_LOG`, then the default
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(ENV_LOG)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install a stderr fmt subscriber
///
/// Returns false if a global subscriber was already set (by an earlier call
/// or by the host); calling it again is harmless.
pub fn init_logging() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

/// Install the stderr subscriber (FFI-safe, idempotent)
///
/// Returns true if this call installed it.
#[unsafe(no_mangle)]
pub extern "C" fn hstack_init_logging() -> bool {
    init_logging()
}
