//! Startup, wiring and shutdown of the console runtime.
//!
//! - [`ConsoleSystem`] builds the transport, spawns one resource actor per console table
//!   and hands out the typed clients.
//! - [`setup_tracing`] initializes logging.

pub mod console_system;
pub mod tracing;

pub use console_system::*;
pub use tracing::*;
