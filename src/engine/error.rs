use chrono::NaiveDate;
use ulid::Ulid;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(Ulid),
    #[error("already exists: {0}")]
    AlreadyExists(Ulid),
    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
    #[error("range [{start}, {end}] has no working days")]
    EmptyRange { start: NaiveDate, end: NaiveDate },
    #[error("hours per day must be positive and finite, got {0}")]
    InvalidHours(f64),
    #[error("task {task_id} does not belong to project {project_id}")]
    TaskProjectMismatch { task_id: Ulid, project_id: Ulid },
    #[error("limit exceeded: {0}")]
    LimitExceeded(&'static str),
}
