use chrono::{Datelike, NaiveDate};

use crate::limits::*;
use crate::model::*;

use super::EngineError;

/// Build an inclusive range, rejecting inverted, out-of-era, or overly wide ranges.
pub(crate) fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<DateRange, EngineError> {
    let range = DateRange::checked(start, end).ok_or(EngineError::InvalidRange { start, end })?;
    if start.year() < MIN_VALID_YEAR || end.year() > MAX_VALID_YEAR {
        return Err(EngineError::LimitExceeded("date out of range"));
    }
    if range.day_count() > MAX_RANGE_DAYS {
        return Err(EngineError::LimitExceeded("range too wide"));
    }
    Ok(range)
}

pub(crate) fn validate_hours(hours: Hours) -> Result<(), EngineError> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(EngineError::InvalidHours(hours));
    }
    if hours > MAX_HOURS_PER_DAY {
        return Err(EngineError::LimitExceeded("hours per day above 24"));
    }
    Ok(())
}

pub(crate) fn validate_text(value: &str, max: usize, what: &'static str) -> Result<(), EngineError> {
    if value.len() > max {
        tracing::warn!(len = value.len(), max, "{what}");
        return Err(EngineError::LimitExceeded(what));
    }
    Ok(())
}

/// Overlapping pair whose combined daily hours exceed the quota.
pub fn pair_conflict(a1: &Assignment, a2: &Assignment) -> Option<Conflict> {
    let overlap = a1.range.intersect(&a2.range)?;
    let combined_hours = a1.hours_per_day + a2.hours_per_day;
    (combined_hours > DAILY_QUOTA_HOURS).then_some(Conflict {
        user_id: a1.user_id,
        first: a1.id,
        second: a2.id,
        overlap,
        combined_hours,
    })
}

/// True on the first conflicting pair. Pairwise only: three overlapping 4h bookings on one day
/// are not reported even though they add up to 12h.
pub fn has_conflict(assignments: &[&Assignment]) -> bool {
    for (i, a1) in assignments.iter().enumerate() {
        for a2 in &assignments[i + 1..] {
            if pair_conflict(a1, a2).is_some() {
                return true;
            }
        }
    }
    false
}

/// Every conflicting pair, in booking order.
pub fn find_conflicts(assignments: &[&Assignment]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for (i, a1) in assignments.iter().enumerate() {
        for a2 in &assignments[i + 1..] {
            if let Some(c) = pair_conflict(a1, a2) {
                conflicts.push(c);
            }
        }
    }
    conflicts
}
