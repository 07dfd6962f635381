//! Circular time-interval containment
//!
//! The broadcast timeline is a 24 hour circle. An interval whose end is
//! earlier than its start is taken to cross midnight.

use crate::timecode::TimeCode;

/// Whether `requested` lies within `[start, end]` on the 24 hour circle
///
/// Rules, evaluated on millisecond values:
/// 1. `start == end`: only `requested == start` is inside.
/// 2. `end > start`: inclusive same-day range.
/// 3. `end < start` (crosses midnight): when `requested > start` the result
///    is `requested >= end`, otherwise it is `requested <= end`.
///
/// Rule 3 is asymmetric: a `requested` later than `start` is only inside
/// once it reaches `end` again on the numeric scale.
///
/// # Examples
///
/// ```rust
/// use bac_common::interval::is_between;
/// use bac_common::timecode::{FrameRate, TimeCode};
///
/// let t = |s| TimeCode::from_seconds(s, FrameRate::Fps25);
/// assert!(is_between(t(5), t(0), t(10)));
/// assert!(!is_between(t(11), t(0), t(10)));
/// assert!(is_between(t(7), t(7), t(7)));
/// ```
pub fn is_between(requested: TimeCode, start: TimeCode, end: TimeCode) -> bool {
    let requested = requested.to_millis();
    let start = start.to_millis();
    let end = end.to_millis();

    if start == end {
        return requested == start;
    }

    if end > start {
        return start <= requested && requested <= end;
    }

    if requested > start {
        requested >= end
    } else {
        requested <= end
    }
}
