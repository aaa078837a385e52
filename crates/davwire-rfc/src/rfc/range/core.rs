//! Byte range values.
//!
//! A [`ByteRange`] is what the client asked for, with the wire
//! `last-byte-pos` kept as written (inclusive). A [`ResolvedInterval`] is that
//! request clamped against a concrete resource length, stored half-open
//! (`start..end`) so lengths are a plain subtraction.

use std::fmt;

use davwire_core::constants::{BYTES_UNIT, BYTES_UNIT_PREFIX};

use super::error::{RangeError, RangeResult};

/// A parsed single `bytes=` range.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    /// First byte requested.
    pub start: Option<u64>,
    /// Last byte requested, inclusive.
    pub end: Option<u64>,
}

impl ByteRange {
    /// ## Summary
    /// Creates a range from optional bounds.
    ///
    /// ## Errors
    /// `RangeError::Syntax` when neither bound is present,
    /// `RangeError::NotSatisfiable` when `start > end`.
    pub fn new(start: Option<u64>, end: Option<u64>) -> RangeResult<Self> {
        match (start, end) {
            (None, None) => Err(RangeError::syntax("range has neither start nor end")),
            (Some(s), Some(e)) if s > e => Err(RangeError::not_satisfiable(
                format!("start {s} is after end {e}"),
                None,
            )),
            _ => Ok(Self { start, end }),
        }
    }

    /// ## Summary
    /// Clamps the range against a resource of `total_length` bytes.
    ///
    /// The start defaults to `0`, the end to the resource length. An explicit
    /// end is inclusive and clamped to the last byte of the resource.
    ///
    /// ## Errors
    /// `RangeError::NotSatisfiable` when the start lies beyond the resource.
    pub fn resolve(&self, total_length: u64) -> RangeResult<ResolvedInterval> {
        let start = self.start.unwrap_or(0);
        if start > total_length {
            tracing::debug!(start, total_length, "Range start beyond resource length");
            return Err(RangeError::not_satisfiable(
                format!("start {start} is beyond resource length {total_length}"),
                Some(total_length),
            ));
        }

        let end = self
            .end
            .map_or(total_length, |last| last.saturating_add(1).min(total_length));

        Ok(ResolvedInterval {
            start,
            end: end.max(start),
            total_length,
            partial: true,
        })
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{BYTES_UNIT}=")?;
        if let Some(start) = self.start {
            write!(f, "{start}")?;
        }
        f.write_str("-")?;
        if let Some(end) = self.end {
            write!(f, "{end}")?;
        }
        Ok(())
    }
}

/// A byte interval of a concrete resource, ready to be streamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedInterval {
    /// First byte to send.
    pub start: u64,
    /// One past the last byte to send.
    pub end: u64,
    /// Length of the whole resource.
    pub total_length: u64,
    /// Whether this answers a `Range` request (206) rather than a plain GET.
    pub partial: bool,
}

impl ResolvedInterval {
    /// The whole resource, as served without a `Range` header.
    #[must_use]
    pub const fn full(total_length: u64) -> Self {
        Self {
            start: 0,
            end: total_length,
            total_length,
            partial: false,
        }
    }

    /// Number of bytes in the interval, i.e. the `Content-Length`.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Inclusive position of the last byte, `None` for an empty interval.
    #[must_use]
    pub const fn last_byte(&self) -> Option<u64> {
        if self.is_empty() {
            None
        } else {
            Some(self.end - 1)
        }
    }

    /// `Content-Range` header value for this interval.
    #[must_use]
    pub fn content_range(&self) -> String {
        match self.last_byte() {
            Some(last) => format!(
                "{BYTES_UNIT_PREFIX}{}-{last}/{}",
                self.start, self.total_length
            ),
            None => unsatisfied_content_range(self.total_length),
        }
    }
}

/// `Content-Range` value sent with a 416, or for an empty interval.
#[must_use]
pub fn unsatisfied_content_range(total_length: u64) -> String {
    format!("{BYTES_UNIT_PREFIX}*/{total_length}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: Option<u64>, end: Option<u64>) -> ByteRange {
        ByteRange::new(start, end).unwrap()
    }

    #[test]
    fn bounded_range_within_length() {
        let interval = range(Some(2), Some(5)).resolve(100).unwrap();
        assert_eq!(interval.start, 2);
        assert_eq!(interval.last_byte(), Some(5));
        assert_eq!(interval.len(), 4);
        assert!(interval.partial);
        assert_eq!(interval.content_range(), "bytes 2-5/100");
    }

    #[test]
    fn open_end_runs_to_total_length() {
        let interval = range(Some(40), None).resolve(100).unwrap();
        assert_eq!(interval.start, 40);
        assert_eq!(interval.end, 100);
        assert_eq!(interval.content_range(), "bytes 40-99/100");
    }

    #[test]
    fn missing_start_is_a_prefix() {
        let interval = range(None, Some(9)).resolve(100).unwrap();
        assert_eq!(interval.start, 0);
        assert_eq!(interval.end, 10);

        let clamped = range(None, Some(500)).resolve(100).unwrap();
        assert_eq!(clamped.start, 0);
        assert_eq!(clamped.end, 100);
    }

    #[test]
    fn end_is_clamped_to_resource() {
        let interval = range(Some(90), Some(1_000)).resolve(100).unwrap();
        assert_eq!(interval.end, 100);
        assert_eq!(interval.len(), 10);
    }

    #[test]
    fn whole_resource_by_explicit_bounds_is_still_partial() {
        let interval = range(Some(0), Some(99)).resolve(100).unwrap();
        assert_eq!(interval.len(), 100);
        assert!(interval.partial);
    }

    #[test]
    fn start_beyond_length_is_unsatisfiable() {
        let err = range(Some(101), None).resolve(100).unwrap_err();
        assert_eq!(
            err,
            RangeError::not_satisfiable("start 101 is beyond resource length 100", Some(100))
        );
        assert_eq!(err.status_code(), salvo::http::StatusCode::RANGE_NOT_SATISFIABLE);
    }

    #[test]
    fn start_at_length_is_empty() {
        let interval = range(Some(100), None).resolve(100).unwrap();
        assert!(interval.is_empty());
        assert_eq!(interval.last_byte(), None);
        assert_eq!(interval.content_range(), "bytes */100");
    }

    #[test]
    fn inverted_bounds_rejected_at_construction() {
        let err = ByteRange::new(Some(10), Some(5)).unwrap_err();
        assert!(matches!(err, RangeError::NotSatisfiable { total_length: None, .. }));
    }

    #[test]
    fn no_bounds_is_a_syntax_error() {
        assert!(matches!(
            ByteRange::new(None, None),
            Err(RangeError::Syntax(_))
        ));
    }

    #[test]
    fn huge_end_does_not_overflow() {
        let interval = range(Some(0), Some(u64::MAX)).resolve(7).unwrap();
        assert_eq!(interval.end, 7);
    }

    #[test]
    fn full_interval_is_not_partial() {
        let interval = ResolvedInterval::full(12);
        assert!(!interval.partial);
        assert_eq!(interval.len(), 12);
    }

    #[test]
    fn display_round_trips_header_form() {
        assert_eq!(range(Some(3), None).to_string(), "bytes=3-");
        assert_eq!(range(None, Some(8)).to_string(), "bytes=-8");
    }
}
