//! Signal handling for coordinated shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Install SIGINT/SIGTERM handlers in the coordinating process.
///
/// Returns a flag that flips to `true` on the first signal; a second signal
/// exits immediately. Must be installed after the workers are forked so the
/// children keep their default dispositions and die on the master's SIGTERM.
pub fn install_signal_handler() -> Arc<AtomicBool> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();

    ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            tracing::warn!("second shutdown signal, exiting immediately");
            std::process::exit(1);
        }
        tracing::info!("shutdown signal received");
    })
    .expect("failed to install signal handler");

    shutdown
}
