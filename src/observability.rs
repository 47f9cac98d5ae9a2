use crate::model::Event;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: commands executed. Labels: command, status (`ok` | `rejected`).
pub const COMMANDS_TOTAL: &str = "allot_commands_total";

/// Histogram: command latency in seconds, lock wait included. Labels: command.
pub const COMMAND_DURATION_SECONDS: &str = "allot_command_duration_seconds";

/// Counter: change events applied to the store. Labels: event.
pub const EVENTS_APPLIED_TOTAL: &str = "allot_events_applied_total";

/// Counter: dependents removed by a user/project cascade. Labels: entity.
pub const CASCADE_REMOVED_TOTAL: &str = "allot_cascade_removed_total";

// ── Derived state ───────────────────────────────────────────────

/// Gauge: users with at least one conflicting booking pair, as of the last dashboard summary.
pub const CONFLICTED_USERS: &str = "allot_conflicted_users";

/// Map an Event variant to a short label for metrics.
pub fn event_label(event: &Event) -> &'static str {
    match event {
        Event::UserAdded { .. } => "user_added",
        Event::UserUpdated { .. } => "user_updated",
        Event::UserRemoved { .. } => "user_removed",
        Event::ProjectAdded { .. } => "project_added",
        Event::ProjectUpdated { .. } => "project_updated",
        Event::ProjectRemoved { .. } => "project_removed",
        Event::TaskAdded { .. } => "task_added",
        Event::TaskUpdated { .. } => "task_updated",
        Event::TaskRemoved { .. } => "task_removed",
        Event::AssignmentAdded { .. } => "assignment_added",
        Event::AssignmentUpdated { .. } => "assignment_updated",
        Event::AssignmentRemoved { .. } => "assignment_removed",
        Event::TimeOffAdded { .. } => "time_off_added",
        Event::TimeOffUpdated { .. } => "time_off_updated",
        Event::TimeOffRemoved { .. } => "time_off_removed",
    }
}
