//! `Range` request header parsing.

use davwire_core::constants::BYTES_UNIT;

use super::core::ByteRange;
use super::error::{RangeError, RangeResult};

/// Parses a single-range `Range` header value.
///
/// ## Summary
/// Accepts `bytes=<start>?-<end>?`, ignoring ASCII case of the unit and any
/// whitespace around the tokens. At least one bound must be present.
///
/// ## Errors
/// `RangeError::Syntax` if the value does not match the grammar (including
/// multi-range sets and bounds that overflow `u64`), and
/// `RangeError::NotSatisfiable` if both bounds are given and `start > end`.
#[tracing::instrument(level = "debug")]
pub fn parse_range(header: &str) -> RangeResult<ByteRange> {
    let rest = header.trim_start();
    let unit = rest
        .get(..BYTES_UNIT.len())
        .filter(|unit| unit.eq_ignore_ascii_case(BYTES_UNIT))
        .ok_or_else(|| RangeError::syntax(format!("expected '{BYTES_UNIT}' unit")))?;

    let rest = rest[unit.len()..].trim_start();
    let rest = rest
        .strip_prefix('=')
        .ok_or_else(|| RangeError::syntax("expected '=' after range unit"))?;

    let (start, end) = rest
        .split_once('-')
        .ok_or_else(|| RangeError::syntax("expected '-' between range bounds"))?;

    let start = parse_bound(start)?;
    let end = parse_bound(end)?;

    ByteRange::new(start, end)
}

/// Parses one side of the range. Empty (after trimming) means absent.
fn parse_bound(raw: &str) -> RangeResult<Option<u64>> {
    let digits = raw.trim();
    if digits.is_empty() {
        return Ok(None);
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeError::syntax(format!("invalid range bound '{digits}'")));
    }

    digits.parse::<u64>().map(Some).map_err(|err| {
        tracing::debug!(error = %err, bound = %digits, "Range bound out of range");
        RangeError::syntax(format!("range bound '{digits}' is too large"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_bounds() {
        assert_eq!(
            parse_range("bytes=2-5").unwrap(),
            ByteRange {
                start: Some(2),
                end: Some(5)
            }
        );
    }

    #[test]
    fn open_ended_bounds() {
        let from = parse_range("bytes=10-").unwrap();
        assert_eq!((from.start, from.end), (Some(10), None));

        let to = parse_range("bytes=-20").unwrap();
        assert_eq!((to.start, to.end), (None, Some(20)));
    }

    #[test]
    fn tolerates_case_and_whitespace() {
        let range = parse_range("  BYTES = 1 - 3 ").unwrap();
        assert_eq!((range.start, range.end), (Some(1), Some(3)));

        let range = parse_range("Bytes=\t7-").unwrap();
        assert_eq!(range.start, Some(7));
    }

    #[test]
    fn empty_bounds_are_syntax_errors() {
        assert!(matches!(parse_range("bytes="), Err(RangeError::Syntax(_))));
        assert!(matches!(parse_range("bytes=-"), Err(RangeError::Syntax(_))));
        assert!(matches!(parse_range("bytes= - "), Err(RangeError::Syntax(_))));
    }

    #[test]
    fn garbage_is_a_syntax_error() {
        for header in [
            "",
            "items=1-2",
            "bytes 1-2",
            "bytes=a-b",
            "bytes=1-2,4-5",
            "bytes=-1-2",
            "bytes=+1-2",
            "bytes=99999999999999999999-",
        ] {
            let err = parse_range(header).unwrap_err();
            assert!(matches!(err, RangeError::Syntax(_)), "{header}: {err:?}");
            assert_eq!(err.status_code(), salvo::http::StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn inverted_bounds_are_unsatisfiable() {
        let err = parse_range("bytes=10-5").unwrap_err();
        assert!(matches!(err, RangeError::NotSatisfiable { .. }));
        assert_eq!(
            err.status_code(),
            salvo::http::StatusCode::RANGE_NOT_SATISFIABLE
        );
    }

    #[test]
    fn single_byte_range() {
        let range = parse_range("bytes=0-0").unwrap();
        let interval = range.resolve(10).unwrap();
        assert_eq!(interval.len(), 1);
    }
}
