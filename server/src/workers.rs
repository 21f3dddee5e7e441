//! Worker process management.
//!
//! Workers are forked from the coordinating process after the shared counter
//! segment exists, so every child inherits the same mapping. The master never
//! serves traffic itself; it supervises the children, forwards shutdown, and
//! reaps them as they exit.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Handle to a forked worker process.
#[derive(Debug)]
pub struct WorkerProcess {
    /// OS process id
    pub pid: libc::pid_t,
    /// The worker ID (0-indexed)
    pub worker_id: usize,
}

/// Fork `count` worker processes.
///
/// Each child runs `worker_fn(worker_id)` and then exits; it never returns
/// to the caller's stack. If a fork fails partway, the already-spawned
/// workers are terminated and reaped before the error is returned.
pub fn spawn_workers<F>(count: usize, worker_fn: F) -> io::Result<Vec<WorkerProcess>>
where
    F: Fn(usize),
{
    let mut workers = Vec::with_capacity(count);

    for worker_id in 0..count {
        match unsafe { libc::fork() } {
            -1 => {
                let err = io::Error::last_os_error();
                terminate_workers(&workers);
                for worker in &workers {
                    reap_blocking(worker);
                }
                return Err(err);
            }
            0 => {
                worker_fn(worker_id);
                std::process::exit(0);
            }
            pid => {
                tracing::info!(worker_id, pid, "worker forked");
                workers.push(WorkerProcess { pid, worker_id });
            }
        }
    }

    Ok(workers)
}

/// Supervise forked workers until they have all exited.
///
/// When the shutdown flag flips, every remaining worker is sent SIGTERM
/// once; exited workers are reaped continuously either way. A worker that
/// dies without a shutdown request is logged and not respawned.
pub fn supervise(mut workers: Vec<WorkerProcess>, shutdown: &AtomicBool) {
    let mut signalled = false;

    while !workers.is_empty() {
        if shutdown.load(Ordering::Relaxed) && !signalled {
            tracing::info!(remaining = workers.len(), "stopping workers");
            terminate_workers(&workers);
            signalled = true;
        }

        workers.retain(|worker| match try_reap(worker) {
            Some(status) => {
                if signalled || status == 0 {
                    tracing::info!(
                        worker_id = worker.worker_id,
                        pid = worker.pid,
                        "worker exited"
                    );
                } else {
                    tracing::warn!(
                        worker_id = worker.worker_id,
                        pid = worker.pid,
                        status,
                        "worker exited unexpectedly"
                    );
                }
                false
            }
            None => true,
        });

        if !workers.is_empty() {
            std::thread::sleep(Duration::from_millis(100));
        }
    }
}

/// Send SIGTERM to every listed worker.
pub fn terminate_workers(workers: &[WorkerProcess]) {
    for worker in workers {
        let rc = unsafe { libc::kill(worker.pid, libc::SIGTERM) };
        if rc != 0 {
            tracing::warn!(pid = worker.pid, "failed to signal worker");
        }
    }
}

/// Non-blocking reap. Returns the raw wait status once the worker has exited.
fn try_reap(worker: &WorkerProcess) -> Option<i32> {
    let mut status: libc::c_int = 0;
    let rc = unsafe { libc::waitpid(worker.pid, &mut status, libc::WNOHANG) };
    match rc {
        0 => None,
        rc if rc == worker.pid => Some(status),
        // ECHILD or another wait failure; the worker is gone either way
        _ => Some(-1),
    }
}

/// Blocking reap, retried across signal interruptions.
fn reap_blocking(worker: &WorkerProcess) {
    let mut status: libc::c_int = 0;
    loop {
        let rc = unsafe { libc::waitpid(worker.pid, &mut status, 0) };
        if rc == worker.pid {
            return;
        }
        if rc == -1 && io::Error::last_os_error().raw_os_error() != Some(libc::EINTR) {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_and_supervise() {
        // Workers that return immediately; supervise must reap both and
        // terminate promptly with shutdown already requested.
        let workers = spawn_workers(2, |_| {}).unwrap();
        assert_eq!(workers.len(), 2);
        assert_ne!(workers[0].pid, workers[1].pid);

        let shutdown = AtomicBool::new(true);
        supervise(workers, &shutdown);
    }
}
