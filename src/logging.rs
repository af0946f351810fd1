//! Tracing setup.
//!
//! The library only emits `tracing` events; applications and tests opt in
//! to output by installing a subscriber.

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the `EnvFilter` directive.
pub const LOG_ENV: &str = "USD_SCENE_LOG";

/// Install a fmt subscriber filtered by [`LOG_ENV`] (default `warn`).
///
/// Returns false if a global subscriber was already installed.
pub fn init_tracing() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true));

    tracing::subscriber::set_global_default(subscriber).is_ok()
}
