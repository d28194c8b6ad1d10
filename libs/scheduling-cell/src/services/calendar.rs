// libs/scheduling-cell/src/services/calendar.rs
//
// Pure interval math. Everything here is side-effect free and total over
// well-formed intervals; `Interval::new` keeps malformed ones out.

use chrono::Duration;

use crate::models::{Interval, SchedulingError};

/// Two half-open intervals overlap iff `a.start < b.end && b.start < a.end`.
pub fn overlaps(a: &Interval, b: &Interval) -> bool {
    a.start() < b.end() && b.start() < a.end()
}

pub fn intersect(a: &Interval, b: &Interval) -> Option<Interval> {
    let start = a.start().max(b.start());
    let end = a.end().min(b.end());
    if start < end {
        Some(Interval::from_parts(start, end))
    } else {
        None
    }
}

/// Remove every blocked interval from `interval`, returning the remaining
/// sub-intervals in chronological order. Touching or overlapping blocks are
/// merged before subtraction.
pub fn subtract(interval: &Interval, blocked: &[Interval]) -> Vec<Interval> {
    let relevant: Vec<Interval> = blocked
        .iter()
        .filter(|block| overlaps(interval, block))
        .copied()
        .collect();

    if relevant.is_empty() {
        return vec![*interval];
    }

    let merged = merge(relevant);

    let mut remaining = Vec::new();
    let mut cursor = interval.start();
    for block in merged {
        if block.start() > cursor {
            remaining.push(Interval::from_parts(cursor, block.start().min(interval.end())));
        }
        cursor = cursor.max(block.end());
        if cursor >= interval.end() {
            break;
        }
    }
    if cursor < interval.end() {
        remaining.push(Interval::from_parts(cursor, interval.end()));
    }

    remaining
}

/// Chop an interval into consecutive fixed-size blocks. A trailing partial
/// block shorter than `block_minutes` is discarded.
pub fn split_into_blocks(
    interval: &Interval,
    block_minutes: i64,
) -> Result<Vec<Interval>, SchedulingError> {
    if block_minutes <= 0 {
        return Err(SchedulingError::InvalidInterval(format!(
            "block size must be positive, got {} minutes",
            block_minutes
        )));
    }

    let step = Duration::minutes(block_minutes);
    let mut blocks = Vec::new();
    let mut cursor = interval.start();
    while cursor + step <= interval.end() {
        blocks.push(Interval::from_parts(cursor, cursor + step));
        cursor += step;
    }
    Ok(blocks)
}

/// Merge overlapping or touching intervals into a minimal sorted cover.
fn merge(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort_by_key(|interval| interval.start());

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        match merged.last_mut() {
            Some(last) if interval.start() <= last.end() => {
                if interval.end() > last.end() {
                    *last = Interval::from_parts(last.start(), interval.end());
                }
            }
            _ => merged.push(interval),
        }
    }
    merged
}
