//! Log output setup
//!
//! Every crate logs through `tracing` under the `tessera::*` targets
//! (`tessera::uow`, `tessera::dialect`, `tessera::config`). Applications
//! normally install their own subscriber; these helpers exist for binaries and
//! tests that have none.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "warn,tessera=info";

/// Install a global fmt subscriber honouring `RUST_LOG`, falling back to
/// `default_filter`.
///
/// Returns false if a global subscriber was already installed.
pub fn init(default_filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .try_init()
        .is_ok()
}

/// Install a subscriber writing through the test harness' captured output.
///
/// Safe to call from every test; only the first call installs it.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tessera=debug")),
        )
        .with_test_writer()
        .try_init();
}
