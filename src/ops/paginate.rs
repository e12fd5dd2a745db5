//! Pagination
//!
//! Turns a [`RangeScanner`] into one capped page plus a `more` flag.
//!
//! Without an end bound the page is simply the first `max_count` records and
//! `more` is always false; there is no look-ahead. With an end bound every
//! key is classified against it, and once the page is full the next key
//! decides whether anything within range was cut off.

use std::cmp::Ordering;

use crate::engine::Engine;
use crate::error::Result;

use super::{Direction, Entry, RangeScanner, ScanBound, ScanRequest, ScanResult, ABS_MAX};

/// Where a key stands relative to the end bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Position {
    /// The key belongs in the page
    valid: bool,
    /// Keys after this one may still belong in the page
    keep_going: bool,
}

fn classify(key: &[u8], end: &ScanBound, direction: Direction) -> Position {
    match (key.cmp(&end.key), direction) {
        (Ordering::Equal, _) => Position {
            valid: end.inclusive,
            keep_going: false,
        },
        (Ordering::Greater, Direction::Forward) | (Ordering::Less, Direction::Backward) => {
            Position {
                valid: false,
                keep_going: false,
            }
        }
        _ => Position {
            valid: true,
            keep_going: true,
        },
    }
}

/// Produce one page for `request`
pub fn paginate(engine: &Engine, request: &ScanRequest) -> Result<ScanResult> {
    let scanner = RangeScanner::new(engine, request.start.clone(), request.direction);
    page(scanner, request)
}

/// Produce one page from an already opened scanner
pub fn page(scanner: RangeScanner, request: &ScanRequest) -> Result<ScanResult> {
    let max = request.max_count.min(ABS_MAX);
    let entry = |(key, value): (Vec<u8>, Vec<u8>)| {
        if request.include_values {
            Entry::Pair { key, value }
        } else {
            Entry::Key(key)
        }
    };

    let mut result = ScanResult::default();

    let Some(end) = &request.end else {
        for record in scanner.take(max) {
            result.data.push(entry(record?));
        }
        return Ok(result);
    };

    for record in scanner {
        let record = record?;
        let position = classify(&record.0, end, request.direction);

        if result.data.len() >= max {
            result.more = position.valid;
            break;
        }

        if !position.valid {
            break;
        }

        result.data.push(entry(record));

        if !position.keep_going {
            break;
        }
    }

    Ok(result)
}
