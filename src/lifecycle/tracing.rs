//! # Observability & Tracing
//!
//! Logging for the console is plain `tracing` with structured fields. Engine events carry
//! `resource` (the entity label) and `key` (e.g. `delete:t_7`); transport events carry
//! `status` and `url`; client wrappers open one span per call.
//!
//! ## Levels
//!
//! - `info`: actor lifecycle, saved downloads, console startup and shutdown
//! - `warn`: failed commands, expired session
//! - `debug`: dispatches, stale list discards, raw responses
//!
//! ```bash
//! RUST_LOG=debug cargo run
//! RUST_LOG=compliance_console=debug,resource_sync=info cargo run
//! ```
//!
//! Without `RUST_LOG`, only `info` and above are shown.

use tracing_subscriber::EnvFilter;

pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false) // resource fields identify the source
        .compact()
        .try_init();
}
