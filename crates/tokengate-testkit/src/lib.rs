//! tokengate testing infrastructure
//!
//! An in-memory world engine, seeded factories and proptest strategies shared
//! by the tokengate test suites.
//!
//! ```toml
//! [dev-dependencies]
//! tokengate-testkit = { workspace = true }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod factories;
pub mod strategies;
pub mod world;

pub use factories::*;
pub use world::MockWorld;

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber for tests, filtered by `RUST_LOG`
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
