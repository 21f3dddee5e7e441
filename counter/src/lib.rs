//! Process-shared HTTP status code counters.
//!
//! This crate provides [`SharedCounterSegment`], a single block of
//! process-shared memory holding one atomic counter per tracked HTTP status
//! code, plus [`Snapshot`] for rendering the current tally as a small plain
//! text report.
//!
//! # Overview
//!
//! The coordinating process maps the segment before any worker process is
//! forked; every worker inherits the mapping and shares the same physical
//! counters. The hot path is [`SharedCounterSegment::record`]: one relaxed
//! atomic add per completed response, with no lock, allocation, or visible
//! failure. Reporting is [`SharedCounterSegment::snapshot`] followed by
//! [`Snapshot::render`]: a private per-element copy of the table, sized and
//! formatted without touching the live counters again.
//!
//! # Example
//!
//! ```
//! use counter::{SharedCounterSegment, StatusRange};
//!
//! let segment = SharedCounterSegment::allocate(StatusRange::DEFAULT).unwrap();
//!
//! // Hot path: one call per completed response
//! segment.record(200);
//! segment.record(200);
//! segment.record(404);
//! segment.record(1000); // outside the tracked range, silently dropped
//!
//! let report = segment.snapshot().render(std::process::id()).unwrap();
//! assert!(report.ends_with("200 2\n404 1\n"));
//! ```
//!
//! # Consistency
//!
//! Increments to a single counter are linearizable: K concurrent increments
//! always net exactly +K. A snapshot reads each element independently, so
//! under concurrent traffic it may combine values from different instants.
//! The table is a monitoring aggregate, not a transactional ledger, and
//! accepts this trade-off rather than adding cross-counter locking.

mod range;
mod report;
mod segment;

pub use range::StatusRange;
pub use report::Snapshot;
pub use segment::{AllocationError, OutOfRange, SharedCounterSegment};
