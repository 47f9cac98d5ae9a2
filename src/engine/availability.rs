use chrono::NaiveDate;

use crate::model::*;

// ── Availability Algorithm ────────────────────────────────────────

/// Hours booked on `day` across the given assignments. Overlapping bookings add up.
pub fn booked_hours<'a>(assignments: impl IntoIterator<Item = &'a Assignment>, day: NaiveDate) -> Hours {
    assignments
        .into_iter()
        .filter(|a| a.range.contains(day))
        .map(|a| a.hours_per_day)
        .sum()
}

/// Availability of one day against the fixed daily quota. Weekends get the same quota; the
/// calendar decides whether to show them.
pub fn day_availability<'a>(
    assignments: impl IntoIterator<Item = &'a Assignment>,
    day: NaiveDate,
) -> DayAvailability {
    let booked = booked_hours(assignments, day);
    DayAvailability {
        date: day,
        available: DAILY_QUOTA_HOURS,
        booked,
        remaining: DAILY_QUOTA_HOURS - booked,
    }
}

/// One `DayAvailability` per calendar day of `range`.
pub fn availability_series(assignments: &[&Assignment], range: &DateRange) -> Vec<DayAvailability> {
    // Only bookings touching the window can contribute.
    let relevant: Vec<&Assignment> = assignments
        .iter()
        .copied()
        .filter(|a| a.range.overlaps(range))
        .collect();
    range
        .days()
        .map(|day| day_availability(relevant.iter().copied(), day))
        .collect()
}

/// Merge ranges sorted by start into disjoint ranges. Adjacent days merge too, since the
/// ranges are inclusive.
pub fn merge_overlapping(sorted: &[DateRange]) -> Vec<DateRange> {
    let mut merged: Vec<DateRange> = Vec::new();
    for &range in sorted {
        if let Some(last) = merged.last_mut()
            && (range.start <= last.end || last.end.succ_opt() == Some(range.start)) {
                last.end = last.end.max(range.end);
                continue;
            }
        merged.push(range);
    }
    merged
}
