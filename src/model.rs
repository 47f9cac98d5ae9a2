use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Booked or available time, in hours.
pub type Hours = f64;

/// Fixed per-day quota used by every availability, utilization and conflict calculation.
/// Independent of `User::capacity`.
pub const DAILY_QUOTA_HOURS: Hours = 8.0;

/// Saturday and Sunday are never working days. Holidays and time off are not considered.
pub fn is_working_day(day: NaiveDate) -> bool {
    !matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Inclusive calendar range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(start <= end, "DateRange start must not be after end");
        Self { start, end }
    }

    /// `None` when `start > end`.
    pub fn checked(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    /// Number of calendar days, both ends included.
    pub fn day_count(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    pub fn intersect(&self, other: &DateRange) -> Option<DateRange> {
        DateRange::checked(self.start.max(other.start), self.end.min(other.end))
    }

    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        self.start
            .iter_days()
            .take(self.day_count().max(0) as usize)
    }

    pub fn working_days(self) -> impl Iterator<Item = NaiveDate> {
        self.days().filter(|d| is_working_day(*d))
    }

    pub fn working_day_count(&self) -> u32 {
        self.working_days().count() as u32
    }

    /// Move both bounds by the same signed number of days. `None` on calendar overflow.
    pub fn shift(&self, days: i64) -> Option<DateRange> {
        let step = |d: NaiveDate| {
            if days >= 0 {
                d.checked_add_days(Days::new(days as u64))
            } else {
                d.checked_sub_days(Days::new(days.unsigned_abs()))
            }
        };
        Some(DateRange {
            start: step(self.start)?,
            end: step(self.end)?,
        })
    }
}

// ── Entities ─────────────────────────────────────────────────────

/// A person whose time gets booked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Ulid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub department: String,
    pub avatar: Option<String>,
    /// Hours per week. Shown and validated, not used by the utilization formulas.
    pub capacity: u32,
}

impl User {
    /// Daily ceiling a booking form should offer for this user: `min(8, capacity / 5)`.
    pub fn suggested_max_hours_per_day(&self) -> Hours {
        (self.capacity as Hours / 5.0).min(DAILY_QUOTA_HOURS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Planned,
    Active,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub hours: Hours,
    pub used: Hours,
}

impl Budget {
    /// `round(used / hours * 100)`, unclamped since a project can overrun its budget.
    pub fn burn_percent(&self) -> Option<u32> {
        if self.hours <= 0.0 {
            return None;
        }
        Some((self.used / self.hours * 100.0).round().max(0.0) as u32)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Ulid,
    pub name: String,
    pub client: String,
    pub range: DateRange,
    pub status: ProjectStatus,
    pub color: String,
    pub budget: Option<Budget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
}

/// Organizational grouping inside a project. Never load-bearing for utilization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Ulid,
    pub project_id: Ulid,
    pub name: String,
    pub range: DateRange,
    pub status: TaskStatus,
}

/// A booking of one user's time to one project over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Ulid,
    pub user_id: Ulid,
    pub project_id: Ulid,
    pub task_id: Option<Ulid>,
    pub range: DateRange,
    pub hours_per_day: Hours,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOffKind {
    Vacation,
    Sick,
    Holiday,
    Other,
}

/// Recorded absence. Carried in the model but not subtracted from availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOff {
    pub id: Ulid,
    pub user_id: Ulid,
    pub range: DateRange,
    pub kind: TimeOffKind,
    pub approved: bool,
}

// ── Partial updates ──────────────────────────────────────────────
//
// `None` leaves a field untouched. Nested options clear an optional field with `Some(None)`.

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub avatar: Option<Option<String>>,
    pub capacity: Option<u32>,
}

impl UserPatch {
    pub fn apply_to(self, user: &mut User) {
        if let Some(v) = self.name {
            user.name = v;
        }
        if let Some(v) = self.email {
            user.email = v;
        }
        if let Some(v) = self.role {
            user.role = v;
        }
        if let Some(v) = self.department {
            user.department = v;
        }
        if let Some(v) = self.avatar {
            user.avatar = v;
        }
        if let Some(v) = self.capacity {
            user.capacity = v;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub client: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub status: Option<ProjectStatus>,
    pub color: Option<String>,
    pub budget: Option<Option<Budget>>,
}

impl ProjectPatch {
    /// Returns the patched dates unvalidated so the caller can reject `start > end`.
    pub fn apply_to(self, project: &mut Project) -> (NaiveDate, NaiveDate) {
        if let Some(v) = self.name {
            project.name = v;
        }
        if let Some(v) = self.client {
            project.client = v;
        }
        if let Some(v) = self.status {
            project.status = v;
        }
        if let Some(v) = self.color {
            project.color = v;
        }
        if let Some(v) = self.budget {
            project.budget = v;
        }
        (
            self.start.unwrap_or(project.range.start),
            self.end.unwrap_or(project.range.end),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    pub fn apply_to(self, task: &mut Task) -> (NaiveDate, NaiveDate) {
        if let Some(v) = self.name {
            task.name = v;
        }
        if let Some(v) = self.status {
            task.status = v;
        }
        (
            self.start.unwrap_or(task.range.start),
            self.end.unwrap_or(task.range.end),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentPatch {
    pub user_id: Option<Ulid>,
    pub project_id: Option<Ulid>,
    pub task_id: Option<Option<Ulid>>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub hours_per_day: Option<Hours>,
    pub notes: Option<Option<String>>,
}

impl AssignmentPatch {
    pub fn apply_to(self, assignment: &mut Assignment) -> (NaiveDate, NaiveDate) {
        if let Some(v) = self.user_id {
            assignment.user_id = v;
        }
        if let Some(v) = self.project_id {
            assignment.project_id = v;
        }
        if let Some(v) = self.task_id {
            assignment.task_id = v;
        }
        if let Some(v) = self.hours_per_day {
            assignment.hours_per_day = v;
        }
        if let Some(v) = self.notes {
            assignment.notes = v;
        }
        (
            self.start.unwrap_or(assignment.range.start),
            self.end.unwrap_or(assignment.range.end),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimeOffPatch {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub kind: Option<TimeOffKind>,
    pub approved: Option<bool>,
}

impl TimeOffPatch {
    pub fn apply_to(self, time_off: &mut TimeOff) -> (NaiveDate, NaiveDate) {
        if let Some(v) = self.kind {
            time_off.kind = v;
        }
        if let Some(v) = self.approved {
            time_off.approved = v;
        }
        (
            self.start.unwrap_or(time_off.range.start),
            self.end.unwrap_or(time_off.range.end),
        )
    }
}

/// Change events, flat with no nesting. Every command is expressed as one or more of these and
/// applied to the next snapshot in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    UserAdded {
        user: User,
    },
    UserUpdated {
        user: User,
    },
    UserRemoved {
        id: Ulid,
    },
    ProjectAdded {
        project: Project,
    },
    ProjectUpdated {
        project: Project,
    },
    ProjectRemoved {
        id: Ulid,
    },
    TaskAdded {
        task: Task,
    },
    TaskUpdated {
        task: Task,
    },
    TaskRemoved {
        id: Ulid,
        project_id: Ulid,
    },
    AssignmentAdded {
        assignment: Assignment,
    },
    AssignmentUpdated {
        previous_user_id: Ulid,
        previous_project_id: Ulid,
        assignment: Assignment,
    },
    AssignmentRemoved {
        id: Ulid,
        user_id: Ulid,
        project_id: Ulid,
    },
    TimeOffAdded {
        time_off: TimeOff,
    },
    TimeOffUpdated {
        time_off: TimeOff,
    },
    TimeOffRemoved {
        id: Ulid,
        user_id: Ulid,
    },
}

impl Event {
    /// Every entity id a subscriber might be watching for this change.
    pub fn topics(&self) -> Vec<Ulid> {
        match self {
            Event::UserAdded { user } | Event::UserUpdated { user } => vec![user.id],
            Event::UserRemoved { id } | Event::ProjectRemoved { id } => vec![*id],
            Event::ProjectAdded { project } | Event::ProjectUpdated { project } => {
                vec![project.id]
            }
            Event::TaskAdded { task } | Event::TaskUpdated { task } => {
                vec![task.id, task.project_id]
            }
            Event::TaskRemoved { id, project_id } => vec![*id, *project_id],
            Event::AssignmentAdded { assignment } => {
                vec![assignment.id, assignment.user_id, assignment.project_id]
            }
            Event::AssignmentUpdated {
                previous_user_id,
                previous_project_id,
                assignment,
            } => {
                let mut topics = vec![assignment.id, assignment.user_id, assignment.project_id];
                if *previous_user_id != assignment.user_id {
                    topics.push(*previous_user_id);
                }
                if *previous_project_id != assignment.project_id {
                    topics.push(*previous_project_id);
                }
                topics
            }
            Event::AssignmentRemoved {
                id,
                user_id,
                project_id,
            } => vec![*id, *user_id, *project_id],
            Event::TimeOffAdded { time_off } | Event::TimeOffUpdated { time_off } => {
                vec![time_off.id, time_off.user_id]
            }
            Event::TimeOffRemoved { id, user_id } => vec![*id, *user_id],
        }
    }
}

// ── Query result types ───────────────────────────────────────────

/// A user together with the derived list of its assignment ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserInfo {
    #[serde(flatten)]
    pub user: User,
    pub assignments: Vec<Ulid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub available: Hours,
    pub booked: Hours,
    /// `available - booked`; negative when over-allocated.
    pub remaining: Hours,
}

impl DayAvailability {
    pub fn is_overallocated(&self) -> bool {
        self.booked > self.available
    }

    /// Share of the daily quota already booked, clamped to `0..=100`.
    pub fn booked_percent(&self) -> u8 {
        clamped_percent(self.booked, self.available)
    }
}

/// Utilization detail behind a user's percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UserLoad {
    pub user_id: Ulid,
    pub range: DateRange,
    pub working_days: u32,
    pub capacity_hours: Hours,
    pub allocated_hours: Hours,
}

impl UserLoad {
    pub fn percent(&self) -> u8 {
        clamped_percent(self.allocated_hours, self.capacity_hours)
    }
}

/// Two overlapping bookings of one user whose combined daily hours exceed the quota.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Conflict {
    pub user_id: Ulid,
    pub first: Ulid,
    pub second: Ulid,
    pub overlap: DateRange,
    pub combined_hours: Hours,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklyUtilization {
    pub week_start: NaiveDate,
    pub utilization: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentUtilization {
    pub department: String,
    pub weeks: Vec<WeeklyUtilization>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub as_of: NaiveDate,
    pub team_members: usize,
    pub departments: usize,
    pub active_projects: usize,
    pub total_projects: usize,
    pub upcoming_deadlines: usize,
    pub upcoming_assignments: usize,
    pub resource_conflicts: usize,
    pub team_utilization: u8,
}

/// `round(min(100, part / whole * 100))`, and 0 when there is no whole.
pub fn clamped_percent(part: Hours, whole: Hours) -> u8 {
    if whole <= 0.0 || !part.is_finite() {
        return 0;
    }
    (part / whole * 100.0).clamp(0.0, 100.0).round() as u8
}
