//! Tracked status code range.

use std::fmt;

/// Closed-open interval `[low, high)` of HTTP status codes tracked by the
/// counter table.
///
/// The range is fixed when the segment is allocated and is immutable for the
/// lifetime of the process. Slot offsets are `code - low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRange {
    low: u16,
    high: u16,
}

impl StatusRange {
    /// Default tracked range: 200 (OK) up to, but not including, 508.
    pub const DEFAULT: StatusRange = StatusRange::new(200, 508);

    /// Create a range tracking codes in `[low, high)`.
    ///
    /// # Panics
    ///
    /// Panics if `low >= high`.
    pub const fn new(low: u16, high: u16) -> Self {
        assert!(low < high, "status range must be non-empty");
        StatusRange { low, high }
    }

    /// Lowest tracked code.
    pub const fn low(&self) -> u16 {
        self.low
    }

    /// First code above the tracked range.
    pub const fn high(&self) -> u16 {
        self.high
    }

    /// Number of tracked codes.
    pub const fn len(&self) -> usize {
        (self.high - self.low) as usize
    }

    /// Always false; construction rejects empty ranges.
    pub const fn is_empty(&self) -> bool {
        self.low >= self.high
    }

    /// Whether `code` falls inside the tracked range.
    pub const fn contains(&self, code: u16) -> bool {
        code >= self.low && code < self.high
    }

    /// Slot offset for `code`, or `None` when it is not tracked.
    pub const fn offset(&self, code: u16) -> Option<usize> {
        if self.contains(code) {
            Some((code - self.low) as usize)
        } else {
            None
        }
    }

    /// Status code stored at slot `offset`.
    ///
    /// Callers only pass offsets produced by iterating `0..len()`.
    pub const fn code_at(&self, offset: usize) -> u16 {
        self.low + offset as u16
    }
}

impl fmt::Display for StatusRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.low, self.high)
    }
}
