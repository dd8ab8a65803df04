//! Logging Setup
//!
//! Installs the `tracing` subscriber for the binary. Library code only emits
//! events; it never installs a subscriber itself.

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `default_level` applies to this
/// workspace's crates and `warn` to everything else.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,aspirepath={lvl},aspirepath_client={lvl},aspirepath_core={lvl}",
            lvl = default_level
        ))
    });

    // A subscriber may already be installed (tests, embedding hosts).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
