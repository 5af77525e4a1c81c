//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system with `RUST_LOG`, falling back to `info`
pub fn init() {
    init_with_level("info");
}

/// Initialize the logging system with a default filter.
///
/// `RUST_LOG` still wins when it is set. Calling this twice is harmless; the
/// second initialization is ignored.
pub fn init_with_level(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    if env_logger::Builder::from_env(env).try_init().is_err() {
        log::debug!("Logger already initialized, keeping existing configuration");
    }
}
