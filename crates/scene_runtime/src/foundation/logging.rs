//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from the `RUST_LOG` environment variable.
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system, ignoring a second initialization attempt.
///
/// Useful for tools and tests that cannot guarantee a single entry point.
pub fn try_init() {
    let _ = env_logger::try_init();
}
