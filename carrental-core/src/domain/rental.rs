//! Rental domain model

use std::fmt;

use chrono::{Duration, NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::result::{Error, Result};

/// Canonical timestamp format used for storage and display
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Input formats accepted by [`parse_timestamp`], tried in order
const INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// A car rental booked by a customer
///
/// `end` is `None` while the car is still out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rental {
    /// Assigned by the store; 0 until persisted
    pub id: i64,
    pub car_id: i64,
    pub customer_id: i64,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    /// Derived from the car's hourly rate, never entered directly
    pub total_cost: Decimal,
}

impl Rental {
    /// Create an unsaved rental with zero cost
    pub fn new(
        car_id: i64,
        customer_id: i64,
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            id: 0,
            car_id,
            customer_id,
            start,
            end,
            total_cost: Decimal::ZERO,
        }
    }

    pub fn status(&self) -> RentalStatus {
        match self.end {
            Some(_) => RentalStatus::Closed,
            None => RentalStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.end.is_none()
    }

    pub fn interval(&self) -> RentalInterval {
        RentalInterval {
            start: self.start,
            end: self.end,
        }
    }
}

/// Observable rental states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    /// Car still checked out (no return time)
    Active,
    /// Car returned
    Closed,
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RentalStatus::Active => write!(f, "active"),
            RentalStatus::Closed => write!(f, "closed"),
        }
    }
}

/// A half-open time interval `[start, end)`
///
/// A missing end means the interval is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalInterval {
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
}

impl RentalInterval {
    /// Build an interval, rejecting an end that precedes the start
    pub fn new(start: NaiveDateTime, end: Option<NaiveDateTime>) -> Result<Self> {
        if let Some(end) = end {
            if start > end {
                return Err(Error::InvalidInterval {
                    start: start.format(TIMESTAMP_FORMAT).to_string(),
                    end: end.format(TIMESTAMP_FORMAT).to_string(),
                });
            }
        }
        Ok(Self { start, end })
    }

    /// Half-open overlap: `a.start < b.end && b.start < a.end`
    pub fn overlaps(&self, other: &RentalInterval) -> bool {
        let starts_before_other_ends = other.end.map_or(true, |end| self.start < end);
        let other_starts_before_end = self.end.map_or(true, |end| other.start < end);
        starts_before_other_ends && other_starts_before_end
    }

    pub fn duration(&self) -> Option<Duration> {
        self.end.map(|end| end - self.start)
    }
}

/// Parse a user-supplied timestamp
///
/// Accepts `YYYY-MM-DD HH:MM[:SS]` with either a space or `T` separator.
/// Sub-second digits are accepted and truncated.
pub fn parse_timestamp(input: &str) -> Result<NaiveDateTime> {
    let trimmed = input.trim();
    for format in INPUT_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(truncate_to_seconds(parsed));
        }
    }
    Err(Error::validation(format!(
        "Invalid datetime '{}'. Use YYYY-MM-DD HH:MM:SS",
        trimmed
    )))
}

/// Format a timestamp the way it is stored
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Drop sub-second precision
pub fn truncate_to_seconds(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(0).unwrap_or(ts)
}
