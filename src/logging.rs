//! Logging setup
//!
//! Logs go to stderr only; stdout carries the protocol response.
//!
//! Filter priority:
//! 1. **`SNAPCODE_LOG`** - snapcode-specific filter
//! 2. **`RUST_LOG`** - standard tracing filter
//! 3. **Default** - `warn`

use std::env;

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";

fn create_filter() -> EnvFilter {
    let directives = env::var("SNAPCODE_LOG").or_else(|_| env::var("RUST_LOG"));
    match directives {
        Ok(directives) => {
            EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
        }
        Err(_) => EnvFilter::new(DEFAULT_FILTER),
    }
}

/// Install the stderr subscriber
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(create_filter())
        .with_target(false)
        .try_init();
}
