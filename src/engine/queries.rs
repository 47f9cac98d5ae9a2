use chrono::NaiveDate;
use ulid::Ulid;

use crate::model::*;

use super::availability::{availability_series, day_availability};
use super::conflict::{self, validate_range};
use super::utilization::{self, project_coverage};
use super::{Engine, EngineError, Snapshot};

/// The user's bookings, in booking order. `NotFound` for unknown users.
fn bookings_of(s: &Snapshot, user_id: Ulid) -> Result<Vec<&Assignment>, EngineError> {
    if !s.contains_user(&user_id) {
        return Err(EngineError::NotFound(user_id));
    }
    Ok(s.user_assignments(user_id).collect())
}

fn load_in(
    s: &Snapshot,
    user_id: Ulid,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<UserLoad, EngineError> {
    let range = validate_range(start, end)?;
    let bookings = bookings_of(s, user_id)?;
    let load = utilization::user_load(user_id, bookings, range);
    if load.working_days == 0 {
        return Err(EngineError::EmptyRange { start, end });
    }
    Ok(load)
}

/// Users with at least one conflicting pair of bookings.
pub(super) fn conflicted_users(s: &Snapshot) -> usize {
    s.users()
        .filter(|u| {
            let bookings: Vec<&Assignment> = s.user_assignments(u.id).collect();
            conflict::has_conflict(&bookings)
        })
        .count()
}

impl Engine {
    // ── Entities ─────────────────────────────────────────────

    pub fn get_user(&self, id: Ulid) -> Result<UserInfo, EngineError> {
        let s = self.snapshot();
        let user = s.user(&id).ok_or(EngineError::NotFound(id))?;
        Ok(UserInfo {
            user: user.clone(),
            assignments: s.user_assignment_ids(&id).to_vec(),
        })
    }

    pub fn list_users(&self) -> Vec<User> {
        self.snapshot().users().cloned().collect()
    }

    /// Derived back-reference list, in booking order.
    pub fn user_assignment_ids(&self, user_id: Ulid) -> Result<Vec<Ulid>, EngineError> {
        let s = self.snapshot();
        if !s.contains_user(&user_id) {
            return Err(EngineError::NotFound(user_id));
        }
        Ok(s.user_assignment_ids(&user_id).to_vec())
    }

    pub fn get_project(&self, id: Ulid) -> Result<Project, EngineError> {
        self.snapshot()
            .project(&id)
            .cloned()
            .ok_or(EngineError::NotFound(id))
    }

    pub fn list_projects(&self) -> Vec<Project> {
        self.snapshot().projects().cloned().collect()
    }

    pub fn get_task(&self, id: Ulid) -> Result<Task, EngineError> {
        self.snapshot()
            .task(&id)
            .cloned()
            .ok_or(EngineError::NotFound(id))
    }

    /// Tasks of a project ordered by start date.
    pub fn get_project_tasks(&self, project_id: Ulid) -> Result<Vec<Task>, EngineError> {
        let s = self.snapshot();
        if !s.contains_project(&project_id) {
            return Err(EngineError::NotFound(project_id));
        }
        let mut tasks: Vec<Task> = s.project_tasks(project_id).cloned().collect();
        tasks.sort_by_key(|t| (t.range.start, t.id));
        Ok(tasks)
    }

    pub fn get_user_time_off(&self, user_id: Ulid) -> Result<Vec<TimeOff>, EngineError> {
        let s = self.snapshot();
        if !s.contains_user(&user_id) {
            return Err(EngineError::NotFound(user_id));
        }
        let mut entries: Vec<TimeOff> = s.user_time_off(user_id).cloned().collect();
        entries.sort_by_key(|t| (t.range.start, t.id));
        Ok(entries)
    }

    // ── Bookings ─────────────────────────────────────────────

    pub fn get_booking_by_id(&self, id: Ulid) -> Result<Assignment, EngineError> {
        self.snapshot()
            .assignment(&id)
            .cloned()
            .ok_or(EngineError::NotFound(id))
    }

    /// Bookings of a user overlapping `[start, end]`, ordered by start date.
    pub fn get_user_bookings(
        &self,
        user_id: Ulid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Assignment>, EngineError> {
        let window = validate_range(start, end)?;
        let s = self.snapshot();
        let mut bookings: Vec<Assignment> = bookings_of(&s, user_id)?
            .into_iter()
            .filter(|a| a.range.overlaps(&window))
            .cloned()
            .collect();
        bookings.sort_by_key(|a| (a.range.start, a.id));
        Ok(bookings)
    }

    pub fn get_project_assignments(&self, project_id: Ulid) -> Result<Vec<Assignment>, EngineError> {
        let s = self.snapshot();
        if !s.contains_project(&project_id) {
            return Err(EngineError::NotFound(project_id));
        }
        Ok(s.project_assignments(project_id).cloned().collect())
    }

    // ── Availability ─────────────────────────────────────────

    pub fn get_user_availability(
        &self,
        user_id: Ulid,
        day: NaiveDate,
    ) -> Result<DayAvailability, EngineError> {
        let s = self.snapshot();
        let bookings = bookings_of(&s, user_id)?;
        Ok(day_availability(bookings, day))
    }

    /// One entry per calendar day of `[start, end]`, weekends included.
    pub fn get_user_availability_range(
        &self,
        user_id: Ulid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DayAvailability>, EngineError> {
        let window = validate_range(start, end)?;
        let s = self.snapshot();
        let bookings = bookings_of(&s, user_id)?;
        Ok(availability_series(&bookings, &window))
    }

    // ── Utilization ──────────────────────────────────────────

    /// Hours behind the utilization figure. `EmptyRange` when the window has no working day.
    pub fn user_load(
        &self,
        user_id: Ulid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<UserLoad, EngineError> {
        load_in(&self.snapshot(), user_id, start, end)
    }

    /// Rounded, clamped utilization in percent. A window without working days yields 0.
    pub fn get_user_utilization(
        &self,
        user_id: Ulid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u8, EngineError> {
        match load_in(&self.snapshot(), user_id, start, end) {
            Ok(load) => Ok(load.percent()),
            Err(EngineError::EmptyRange { .. }) => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// Share of the project's calendar days covered by at least one booking.
    pub fn get_project_utilization(&self, project_id: Ulid) -> Result<u8, EngineError> {
        let s = self.snapshot();
        let project = s.project(&project_id).ok_or(EngineError::NotFound(project_id))?;
        Ok(project_coverage(project, s.project_assignments(project_id)))
    }

    // ── Conflicts ────────────────────────────────────────────

    pub fn has_conflict(&self, user_id: Ulid) -> Result<bool, EngineError> {
        let s = self.snapshot();
        let bookings = bookings_of(&s, user_id)?;
        Ok(conflict::has_conflict(&bookings))
    }

    /// Every conflicting pair of the user's bookings.
    pub fn user_conflicts(&self, user_id: Ulid) -> Result<Vec<Conflict>, EngineError> {
        let s = self.snapshot();
        let bookings = bookings_of(&s, user_id)?;
        Ok(conflict::find_conflicts(&bookings))
    }

    pub fn conflict_count(&self) -> usize {
        conflicted_users(&self.snapshot())
    }
}
