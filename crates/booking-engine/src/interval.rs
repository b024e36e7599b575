//! Half-open time intervals within a single calendar day.
//!
//! `TimeInterval` is the value type every overlap check in the engine is built
//! on. Intervals are `[start, end)`: two intervals overlap iff
//! `a.start < b.end && b.start < a.end`, so an interval ending exactly when
//! another starts is NOT an overlap — adjacent slots are allowed.

use std::fmt;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};

/// A validated `[start, end)` time range on one date.
///
/// Construction rejects inverted and zero-length ranges, and deserialization
/// goes through the same check, so an existing `TimeInterval` always satisfies
/// `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInterval", into = "RawInterval")]
pub struct TimeInterval {
    start: NaiveTime,
    end: NaiveTime,
}

/// Unvalidated serde mirror of [`TimeInterval`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawInterval {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeInterval {
    /// Create an interval, rejecting `start >= end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if start >= end {
            return Err(BookingError::Validation(format!(
                "interval start {start} must be before end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// True iff the two half-open ranges share at least one instant.
    ///
    /// `a.end == b.start` is adjacency, not overlap.
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

impl TryFrom<RawInterval> for TimeInterval {
    type Error = BookingError;

    fn try_from(raw: RawInterval) -> Result<Self> {
        TimeInterval::new(raw.start, raw.end)
    }
}

impl From<TimeInterval> for RawInterval {
    fn from(iv: TimeInterval) -> Self {
        RawInterval {
            start: iv.start,
            end: iv.end,
        }
    }
}
