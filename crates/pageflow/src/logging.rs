//! Subscriber setup for harness logs.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! caller's choice. `RUST_LOG` wins over the default directive, e.g.
//! `RUST_LOG=pageflow=debug` shows every resolve, action and wait.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install a human-readable subscriber.
///
/// Returns `false` if a global subscriber was already set.
pub fn init_logging(default_directive: &str) -> bool {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter(default_directive))
        .try_init()
        .is_ok()
}

/// Install a JSON-lines subscriber, one object per event.
///
/// Returns `false` if a global subscriber was already set.
pub fn init_json_logging(default_directive: &str) -> bool {
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(filter(default_directive))
        .try_init()
        .is_ok()
}
