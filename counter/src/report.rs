//! Point-in-time snapshots and plain-text report rendering.

use crate::range::StatusRange;
use std::collections::TryReserveError;
use std::fmt::Write;

/// Fixed label line between the pid line and the per-code lines.
const REPORT_LABEL: &str = "HTTP status code counts:\n";

const PID_PREFIX: &str = "Pid: ";

/// Private copy of the counter table at (roughly) one instant.
///
/// Each element was read atomically, but the copy as a whole is not atomic
/// across elements: a racing increment may land between two loads, so the
/// combination of values may match no single true instant. The report is a
/// monitoring aggregate and accepts this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    range: StatusRange,
    counts: Vec<u64>,
}

impl Snapshot {
    pub(crate) fn new(range: StatusRange, counts: Vec<u64>) -> Self {
        debug_assert_eq!(counts.len(), range.len());
        Snapshot { range, counts }
    }

    /// The range the snapshot covers.
    pub fn range(&self) -> StatusRange {
        self.range
    }

    /// Codes with at least one recorded response, in ascending code order.
    pub fn nonzero(&self) -> impl Iterator<Item = (u16, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(offset, count)| (self.range.code_at(offset), *count))
    }

    /// Upper bound on the rendered report length.
    ///
    /// Sized from this snapshot, not from the live table: lines are emitted
    /// for exactly the nonzero entries counted here, so the bound cannot be
    /// undercut by concurrent traffic. Digit widths assume the widest
    /// tracked code and a full-width `u64` count, so the actual rendering
    /// may come in shorter, never longer.
    fn rendered_len_bound(&self) -> usize {
        let lines = self.nonzero().count();
        let line_bound = decimal_digits(self.range.high() as u64 - 1)
            + 1
            + decimal_digits(u64::MAX)
            + 1;
        let header_bound = PID_PREFIX.len() + decimal_digits(u32::MAX as u64) + 1;
        header_bound + REPORT_LABEL.len() + lines * line_bound
    }

    /// Render the report body.
    ///
    /// Output is the pid line, the label line, then one `<code> <count>` line
    /// per nonzero counter in ascending code order. Zero counters are omitted
    /// entirely, so a zero-traffic report is exactly the two header lines.
    ///
    /// The buffer is reserved once, sized by the snapshot. A failed
    /// reservation is returned to the caller instead of aborting, so a
    /// handler can answer with an internal error while the live table stays
    /// untouched.
    pub fn render(&self, pid: u32) -> Result<String, TryReserveError> {
        let bound = self.rendered_len_bound();

        let mut out = String::new();
        out.try_reserve_exact(bound)?;

        writeln!(out, "{}{}", PID_PREFIX, pid).unwrap();
        out.push_str(REPORT_LABEL);
        for (code, count) in self.nonzero() {
            writeln!(out, "{} {}", code, count).unwrap();
        }

        debug_assert!(out.len() <= bound);
        Ok(out)
    }
}

/// Number of decimal digits needed to print `n`.
const fn decimal_digits(mut n: u64) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}
