mod availability;
mod conflict;
mod error;
mod mutations;
mod queries;
mod reports;
mod reschedule;
mod store;
mod utilization;

pub use availability::{availability_series, booked_hours, day_availability, merge_overlapping};
pub use conflict::{find_conflicts, has_conflict, pair_conflict};
pub use error::EngineError;
pub use reports::trend_weeks;
pub use store::Snapshot;
pub use utilization::{mean_percent, project_coverage, user_load};

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use ulid::Ulid;

use crate::model::Event;
use crate::notify::NotifyHub;
use crate::observability::{
    COMMAND_DURATION_SECONDS, COMMANDS_TOTAL, EVENTS_APPLIED_TOTAL, event_label,
};

/// The allocation engine. Owns the current snapshot; every command swaps in a new one, every
/// query reads whichever snapshot was current when it started.
pub struct Engine {
    state: RwLock<Arc<Snapshot>>,
    pub notify: Arc<NotifyHub>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Arc::new(NotifyHub::new()))
    }
}

impl Engine {
    pub fn new(notify: Arc<NotifyHub>) -> Self {
        Self {
            state: RwLock::new(Arc::new(Snapshot::new())),
            notify,
        }
    }

    /// The current snapshot. Cheap; the lock is held only for the `Arc` clone.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.state.read().clone()
    }

    /// Change events touching `topic` (a user, project, task, booking or time-off id).
    /// Unknown ids are `NotFound`. The read lock is held so a concurrent removal cannot
    /// slip in between the check and the subscription.
    pub fn subscribe(&self, topic: Ulid) -> Result<broadcast::Receiver<Event>, EngineError> {
        let guard = self.state.read();
        if !guard.contains(&topic) {
            return Err(EngineError::NotFound(topic));
        }
        Ok(self.notify.subscribe(topic))
    }

    /// Validate + apply + notify in one call.
    ///
    /// `build` sees the current snapshot under the write lock and returns the command's result
    /// plus the events that realize it. On `Err` nothing changes. On `Ok` the events are applied
    /// in order to a copy of the snapshot, which then replaces the current one in a single swap.
    /// An empty event list leaves the current snapshot in place.
    pub(super) fn commit<T>(
        &self,
        command: &'static str,
        build: impl FnOnce(&Snapshot) -> Result<(T, Vec<Event>), EngineError>,
    ) -> Result<T, EngineError> {
        let started = Instant::now();
        let mut guard = self.state.write();

        let (value, events) = match build(&guard) {
            Ok(built) => built,
            Err(e) => {
                drop(guard);
                record_command(command, "rejected", started);
                tracing::debug!(command, error = %e, "command rejected");
                return Err(e);
            }
        };

        if !events.is_empty() {
            let mut next = Snapshot::clone(&guard);
            for event in &events {
                next.apply(event);
                metrics::counter!(EVENTS_APPLIED_TOTAL, "event" => event_label(event)).increment(1);
            }
            *guard = Arc::new(next);

            // Published under the lock so subscribers see events in commit order.
            for event in &events {
                self.notify.publish(event);
                if let Some(gone) = removed_entity(event) {
                    self.notify.remove(&gone);
                }
            }
        }
        drop(guard);

        record_command(command, "ok", started);
        tracing::debug!(command, events = events.len(), "command applied");
        Ok(value)
    }
}

fn record_command(command: &'static str, status: &'static str, started: Instant) {
    metrics::counter!(COMMANDS_TOTAL, "command" => command, "status" => status).increment(1);
    metrics::histogram!(COMMAND_DURATION_SECONDS, "command" => command)
        .record(started.elapsed().as_secs_f64());
}

/// The id whose topic closes once this event has been delivered.
fn removed_entity(event: &Event) -> Option<Ulid> {
    match event {
        Event::UserRemoved { id }
        | Event::ProjectRemoved { id }
        | Event::TaskRemoved { id, .. }
        | Event::AssignmentRemoved { id, .. }
        | Event::TimeOffRemoved { id, .. } => Some(*id),
        _ => None,
    }
}
