use chrono::NaiveDate;
use ulid::Ulid;

use crate::model::*;

use super::conflict::validate_range;
use super::{Engine, EngineError};

impl Engine {
    /// Replace both dates of a booking. Keeping the duration is the caller's concern. The new
    /// range must be ordered (`InvalidRange`) and within the stored-range limits: supported years
    /// and `MAX_RANGE_DAYS` (`LimitExceeded`). Unchanged dates emit nothing.
    pub fn move_booking(
        &self,
        id: Ulid,
        new_start: NaiveDate,
        new_end: NaiveDate,
    ) -> Result<Assignment, EngineError> {
        self.commit("move_booking", move |s| {
            let range = validate_range(new_start, new_end)?;
            let current = s.assignment(&id).ok_or(EngineError::NotFound(id))?;
            reschedule(current, range)
        })
    }

    /// Shift a booking by a signed number of days. Duration and hours are preserved.
    pub fn move_booking_by(&self, id: Ulid, delta_days: i64) -> Result<Assignment, EngineError> {
        self.commit("move_booking_by", move |s| {
            let current = s.assignment(&id).ok_or(EngineError::NotFound(id))?;
            let shifted = current
                .range
                .shift(delta_days)
                .ok_or(EngineError::LimitExceeded("date out of range"))?;
            let range = validate_range(shifted.start, shifted.end)?;
            reschedule(current, range)
        })
    }
}

fn reschedule(
    current: &Assignment,
    range: DateRange,
) -> Result<(Assignment, Vec<Event>), EngineError> {
    if current.range == range {
        return Ok((current.clone(), vec![]));
    }
    let moved = Assignment {
        range,
        ..current.clone()
    };
    tracing::debug!(
        assignment_id = %moved.id,
        from = %current.range.start,
        to = %range.start,
        "booking moved"
    );
    let event = Event::AssignmentUpdated {
        previous_user_id: current.user_id,
        previous_project_id: current.project_id,
        assignment: moved.clone(),
    };
    Ok((moved, vec![event]))
}
