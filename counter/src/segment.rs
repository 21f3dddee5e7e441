//! Process-shared counter storage.
//!
//! The coordinating process maps one `MAP_SHARED | MAP_ANONYMOUS` region
//! before forking workers; every worker inherits the mapping, so the same
//! physical counters back each process's view. Slots are `AtomicU64` and the
//! only mutation is a relaxed fetch-add, so the table carries no lock.

use crate::range::StatusRange;
use crate::report::Snapshot;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};

/// Failure to create the shared region.
///
/// Fatal at startup: the caller aborts bringing the server up instead of
/// retrying.
#[derive(Debug, thiserror::Error)]
#[error("shared counter region allocation failed: {0}")]
pub struct AllocationError(#[from] std::io::Error);

/// A status code outside the tracked range was passed to a bounds-checked
/// lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("status code {code} is outside the tracked range {range}")]
pub struct OutOfRange {
    /// The rejected code.
    pub code: u16,
    /// The range the segment was sized for.
    pub range: StatusRange,
}

/// One cross-process block of atomic counters, one slot per tracked status
/// code.
///
/// Allocate exactly once, in the coordinating process, before any worker
/// exists. Counters start at zero and only ever grow. Dropping the segment
/// unmaps the calling process's view; the shared backing pages persist until
/// the last mapping (master or worker) is gone, so the master releases the
/// region by dropping its handle after all workers have exited.
pub struct SharedCounterSegment {
    ptr: NonNull<AtomicU64>,
    range: StatusRange,
    mapped_len: usize,
}

// Safety: the region is plain atomic integers and all access goes through
// `&AtomicU64`, which is Sync. The raw pointer is never handed out.
unsafe impl Send for SharedCounterSegment {}
unsafe impl Sync for SharedCounterSegment {}

impl SharedCounterSegment {
    /// Map a shared, zero-filled region with one counter per tracked code.
    ///
    /// Must run before workers are forked so the mapping is inherited by
    /// every worker.
    pub fn allocate(range: StatusRange) -> Result<Self, AllocationError> {
        let mapped_len = range.len() * std::mem::size_of::<AtomicU64>();

        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                mapped_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(AllocationError(std::io::Error::last_os_error()));
        }

        // mmap returns zero-filled pages, which is already a valid all-zero
        // counter table.
        Ok(SharedCounterSegment {
            ptr: unsafe { NonNull::new_unchecked(ptr as *mut AtomicU64) },
            range,
            mapped_len,
        })
    }

    /// The tracked range this segment was sized for.
    pub fn range(&self) -> StatusRange {
        self.range
    }

    fn slots(&self) -> &[AtomicU64] {
        // Safety: the mapping is live while &self is, holds exactly
        // `range.len()` slots, and mmap guarantees page alignment.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.range.len()) }
    }

    /// Counter slot for `code`.
    ///
    /// Administrative callers should propagate the `OutOfRange` error; the
    /// completion path uses [`record`](Self::record), which drops untracked
    /// codes silently.
    pub fn counter_for(&self, code: u16) -> Result<&AtomicU64, OutOfRange> {
        match self.range.offset(code) {
            Some(offset) => Ok(&self.slots()[offset]),
            None => Err(OutOfRange {
                code,
                range: self.range,
            }),
        }
    }

    /// Record one completed response.
    ///
    /// In-range codes get a single relaxed fetch-add; anything else is a
    /// deliberate no-op, neither logged nor counted elsewhere. Runs on the
    /// per-request completion path: never allocates, blocks, or fails.
    #[inline]
    pub fn record(&self, code: u16) {
        if let Some(offset) = self.range.offset(code) {
            self.slots()[offset].fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Current value of the counter for `code`.
    pub fn load(&self, code: u16) -> Result<u64, OutOfRange> {
        self.counter_for(code)
            .map(|counter| counter.load(Ordering::Relaxed))
    }

    /// Copy every counter into a private buffer, ascending code order.
    ///
    /// Each element is read with one independent atomic load; elements may
    /// reflect different instants when increments race with the copy.
    pub fn snapshot(&self) -> Snapshot {
        let counts = self
            .slots()
            .iter()
            .map(|slot| slot.load(Ordering::Relaxed))
            .collect();
        Snapshot::new(self.range, counts)
    }
}

impl Drop for SharedCounterSegment {
    fn drop(&mut self) {
        // Unmaps this process's view only; the shared backing survives until
        // every mapping is gone.
        unsafe {
            let result = libc::munmap(self.ptr.as_ptr() as *mut libc::c_void, self.mapped_len);
            debug_assert_eq!(result, 0, "munmap failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_starts_at_zero() {
        let segment = SharedCounterSegment::allocate(StatusRange::DEFAULT).unwrap();
        for (_, count) in segment.snapshot().nonzero() {
            panic!("fresh segment has nonzero counter {}", count);
        }
        assert_eq!(segment.load(200).unwrap(), 0);
        assert_eq!(segment.load(507).unwrap(), 0);
    }

    #[test]
    fn test_record_increments() {
        let segment = SharedCounterSegment::allocate(StatusRange::DEFAULT).unwrap();
        segment.record(200);
        segment.record(200);
        segment.record(404);
        assert_eq!(segment.load(200).unwrap(), 2);
        assert_eq!(segment.load(404).unwrap(), 1);
        assert_eq!(segment.load(500).unwrap(), 0);
    }

    #[test]
    fn test_out_of_range_record_is_a_no_op() {
        let segment = SharedCounterSegment::allocate(StatusRange::DEFAULT).unwrap();
        segment.record(100);
        segment.record(199);
        segment.record(508);
        segment.record(0);
        segment.record(u16::MAX);
        assert_eq!(segment.snapshot().nonzero().count(), 0);
    }

    #[test]
    fn test_counter_for_bounds() {
        let segment = SharedCounterSegment::allocate(StatusRange::new(200, 300)).unwrap();
        assert!(segment.counter_for(200).is_ok());
        assert!(segment.counter_for(299).is_ok());

        let err = segment.counter_for(300).unwrap_err();
        assert_eq!(err.code, 300);
        assert_eq!(err.range, StatusRange::new(200, 300));
        assert!(segment.counter_for(199).is_err());
    }

    #[test]
    fn test_no_lost_updates_under_contention() {
        const THREADS: usize = 8;
        const PER_THREAD: u64 = 10_000;

        let segment = Arc::new(SharedCounterSegment::allocate(StatusRange::DEFAULT).unwrap());

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let segment = segment.clone();
                std::thread::spawn(move || {
                    for _ in 0..PER_THREAD {
                        segment.record(200);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(segment.load(200).unwrap(), THREADS as u64 * PER_THREAD);
    }

    #[test]
    fn test_snapshot_idempotent_without_traffic() {
        let segment = SharedCounterSegment::allocate(StatusRange::DEFAULT).unwrap();
        segment.record(204);
        segment.record(301);

        let first = segment.snapshot();
        let second = segment.snapshot();
        assert_eq!(first, second);
        assert_eq!(first.render(1).unwrap(), second.render(1).unwrap());
    }
}
