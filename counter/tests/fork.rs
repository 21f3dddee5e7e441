//! Cross-process visibility of the shared counter segment.
//!
//! Forks real child processes that increment through the inherited mapping
//! and verifies the parent observes every update. Children call nothing but
//! the increment path and `_exit`, so forking from the test harness is safe.

#![cfg(unix)]

use counter::{SharedCounterSegment, StatusRange};

fn wait_for(pid: libc::pid_t) -> i32 {
    let mut status: libc::c_int = 0;
    loop {
        let rc = unsafe { libc::waitpid(pid, &mut status, 0) };
        if rc == pid {
            return status;
        }
        if rc == -1 && std::io::Error::last_os_error().raw_os_error() != Some(libc::EINTR) {
            panic!("waitpid failed: {}", std::io::Error::last_os_error());
        }
    }
}

#[test]
fn increments_from_forked_workers_are_shared() {
    const WORKERS: usize = 4;
    const PER_WORKER: u64 = 10_000;

    let segment = SharedCounterSegment::allocate(StatusRange::DEFAULT).unwrap();

    let mut children = Vec::with_capacity(WORKERS);
    for _ in 0..WORKERS {
        match unsafe { libc::fork() } {
            -1 => panic!("fork failed: {}", std::io::Error::last_os_error()),
            0 => {
                for _ in 0..PER_WORKER {
                    segment.record(204);
                }
                segment.record(404);
                unsafe { libc::_exit(0) };
            }
            pid => children.push(pid),
        }
    }

    for pid in children {
        let status = wait_for(pid);
        assert!(libc::WIFEXITED(status) && libc::WEXITSTATUS(status) == 0);
    }

    // Every child wrote through its inherited view of the same region.
    assert_eq!(segment.load(204).unwrap(), WORKERS as u64 * PER_WORKER);
    assert_eq!(segment.load(404).unwrap(), WORKERS as u64);
    assert_eq!(segment.load(200).unwrap(), 0);
}

#[test]
fn out_of_range_increments_in_children_change_nothing() {
    let segment = SharedCounterSegment::allocate(StatusRange::DEFAULT).unwrap();

    match unsafe { libc::fork() } {
        -1 => panic!("fork failed: {}", std::io::Error::last_os_error()),
        0 => {
            segment.record(199);
            segment.record(508);
            segment.record(0);
            unsafe { libc::_exit(0) };
        }
        pid => {
            let status = wait_for(pid);
            assert!(libc::WIFEXITED(status) && libc::WEXITSTATUS(status) == 0);
        }
    }

    assert_eq!(segment.snapshot().nonzero().count(), 0);
}
