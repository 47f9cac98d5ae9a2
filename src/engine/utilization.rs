use ulid::Ulid;

use crate::model::*;

use super::availability::merge_overlapping;

/// Load of one user over `range`: every working day of the window has an 8h capacity, and each
/// booking contributes its daily hours for every working day it shares with the window.
/// Overlapping bookings are counted additively.
pub fn user_load<'a>(
    user_id: Ulid,
    assignments: impl IntoIterator<Item = &'a Assignment>,
    range: DateRange,
) -> UserLoad {
    let working_days = range.working_day_count();
    let allocated_hours: Hours = assignments
        .into_iter()
        .filter_map(|a| {
            a.range
                .intersect(&range)
                .map(|shared| shared.working_day_count() as Hours * a.hours_per_day)
        })
        .sum();
    UserLoad {
        user_id,
        range,
        working_days,
        capacity_hours: working_days as Hours * DAILY_QUOTA_HOURS,
        allocated_hours,
    }
}

/// Share of a project's calendar days covered by at least one of its bookings. Hours do not
/// matter here, only presence.
pub fn project_coverage<'a>(
    project: &Project,
    assignments: impl IntoIterator<Item = &'a Assignment>,
) -> u8 {
    let total_days = project.range.day_count();
    if total_days <= 0 {
        return 0;
    }
    let mut covered: Vec<DateRange> = assignments
        .into_iter()
        .filter_map(|a| a.range.intersect(&project.range))
        .collect();
    covered.sort_by_key(|r| r.start);
    let assigned_days: i64 = merge_overlapping(&covered)
        .iter()
        .map(DateRange::day_count)
        .sum();
    clamped_percent(assigned_days as Hours, total_days as Hours)
}

/// Rounded mean of several percentages; 0 for none.
pub fn mean_percent(values: impl IntoIterator<Item = u8>) -> u8 {
    let (sum, count) = values
        .into_iter()
        .fold((0u32, 0u32), |(sum, count), v| (sum + v as u32, count + 1));
    if count == 0 {
        return 0;
    }
    (sum as f64 / count as f64).round() as u8
}
