//! Pre-fork HTTP server with per-status-code response counting.
//!
//! The coordinating process allocates the shared counter segment, forks the
//! worker processes, and supervises them; each worker serves HTTP on a
//! shared-port listener and tallies every response it completes. The report
//! endpoint renders the table on demand.

pub mod banner;
pub mod config;
pub mod http;
pub mod logging;
pub mod signal;
pub mod workers;

pub use config::Config;
