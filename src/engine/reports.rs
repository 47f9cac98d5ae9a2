use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Days, NaiveDate};
use ulid::Ulid;

use crate::limits::MAX_TREND_WEEKS;
use crate::model::*;
use crate::observability::CONFLICTED_USERS;

use super::conflict::validate_range;
use super::queries::conflicted_users;
use super::utilization::{mean_percent, user_load};
use super::{Engine, EngineError, Snapshot};

const OUT_OF_RANGE: EngineError = EngineError::LimitExceeded("date out of range");

/// Monday starts of the last `n` weeks, oldest first, ending with the week that contains `today`.
pub fn trend_weeks(today: NaiveDate, n: usize) -> Result<Vec<NaiveDate>, EngineError> {
    if n > MAX_TREND_WEEKS {
        return Err(EngineError::LimitExceeded("too many trend weeks"));
    }
    let monday = today
        .checked_sub_days(Days::new(today.weekday().num_days_from_monday() as u64))
        .ok_or(OUT_OF_RANGE)?;
    (0..n as u64)
        .rev()
        .map(|back| monday.checked_sub_days(Days::new(back * 7)).ok_or(OUT_OF_RANGE))
        .collect()
}

fn days_after(day: NaiveDate, n: u64) -> Result<NaiveDate, EngineError> {
    day.checked_add_days(Days::new(n)).ok_or(OUT_OF_RANGE)
}

/// Rounded mean utilization of `users` over `range`; 0 when there are none.
fn mean_utilization(s: &Snapshot, users: &[Ulid], range: DateRange) -> u8 {
    mean_percent(
        users
            .iter()
            .map(|&id| user_load(id, s.user_assignments(id), range).percent()),
    )
}

impl Engine {
    /// Mean of every user's utilization over `[start, end]`.
    pub fn team_utilization(&self, start: NaiveDate, end: NaiveDate) -> Result<u8, EngineError> {
        let range = validate_range(start, end)?;
        let s = self.snapshot();
        let users: Vec<Ulid> = s.users().map(|u| u.id).collect();
        Ok(mean_utilization(&s, &users, range))
    }

    /// Per department (sorted by name), the mean utilization of its members for each week
    /// starting on the given days. Each week spans seven calendar days.
    pub fn department_utilization(
        &self,
        week_starts: &[NaiveDate],
    ) -> Result<Vec<DepartmentUtilization>, EngineError> {
        if week_starts.len() > MAX_TREND_WEEKS {
            return Err(EngineError::LimitExceeded("too many trend weeks"));
        }
        let weeks = week_starts
            .iter()
            .map(|&start| validate_range(start, days_after(start, 6)?))
            .collect::<Result<Vec<DateRange>, EngineError>>()?;

        let s = self.snapshot();
        let mut departments: BTreeMap<&str, Vec<Ulid>> = BTreeMap::new();
        for user in s.users() {
            departments.entry(user.department.as_str()).or_default().push(user.id);
        }

        Ok(departments
            .into_iter()
            .map(|(department, members)| DepartmentUtilization {
                department: department.to_string(),
                weeks: weeks
                    .iter()
                    .map(|&week| WeeklyUtilization {
                        week_start: week.start,
                        utilization: mean_utilization(&s, &members, week),
                    })
                    .collect(),
            })
            .collect())
    }

    /// Headline numbers as of `today`. Deadlines look `horizon_days` ahead, bookings seven days,
    /// and team utilization covers `[today, today + 6]`.
    pub fn dashboard_summary(
        &self,
        today: NaiveDate,
        horizon_days: u32,
    ) -> Result<DashboardSummary, EngineError> {
        let deadline_horizon = validate_range(today, days_after(today, horizon_days as u64)?)?;
        let next_week = validate_range(today, days_after(today, 6)?)?;
        let booking_horizon = days_after(today, 7)?;

        let s = self.snapshot();
        let users: Vec<Ulid> = s.users().map(|u| u.id).collect();
        let departments: BTreeSet<&str> = s.users().map(|u| u.department.as_str()).collect();
        let resource_conflicts = conflicted_users(&s);
        metrics::gauge!(CONFLICTED_USERS).set(resource_conflicts as f64);

        let summary = DashboardSummary {
            as_of: today,
            team_members: s.user_count(),
            departments: departments.len(),
            active_projects: s
                .projects()
                .filter(|p| p.status == ProjectStatus::Active)
                .count(),
            total_projects: s.project_count(),
            upcoming_deadlines: s
                .projects()
                .filter(|p| deadline_horizon.contains(p.range.end))
                .count(),
            upcoming_assignments: s
                .assignments()
                .filter(|a| a.range.start <= booking_horizon && a.range.end >= today)
                .count(),
            resource_conflicts,
            team_utilization: mean_utilization(&s, &users, next_week),
        };
        tracing::debug!(
            as_of = %today,
            conflicts = summary.resource_conflicts,
            utilization = summary.team_utilization,
            "dashboard summary"
        );
        Ok(summary)
    }
}
