use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::observability::CASCADE_REMOVED_TOTAL;

use super::conflict::{validate_hours, validate_range, validate_text};
use super::{Engine, EngineError, Snapshot};

fn check_room(count: usize, what: &'static str) -> Result<(), EngineError> {
    if count >= MAX_ENTITIES_PER_COLLECTION {
        tracing::warn!(count, "{what}");
        return Err(EngineError::LimitExceeded(what));
    }
    Ok(())
}

fn validate_user(user: &User) -> Result<(), EngineError> {
    validate_text(&user.name, MAX_NAME_LEN, "user name too long")?;
    validate_text(&user.email, MAX_NAME_LEN, "email too long")?;
    validate_text(&user.role, MAX_NAME_LEN, "role too long")?;
    validate_text(&user.department, MAX_NAME_LEN, "department too long")?;
    if let Some(avatar) = &user.avatar {
        validate_text(avatar, MAX_NOTES_LEN, "avatar too long")?;
    }
    if user.capacity > MAX_WEEKLY_CAPACITY {
        return Err(EngineError::LimitExceeded("weekly capacity above 168 hours"));
    }
    Ok(())
}

fn validate_project(project: &Project) -> Result<(), EngineError> {
    validate_text(&project.name, MAX_NAME_LEN, "project name too long")?;
    validate_text(&project.client, MAX_NAME_LEN, "client name too long")?;
    validate_text(&project.color, MAX_NAME_LEN, "color too long")?;
    validate_range(project.range.start, project.range.end)?;
    if let Some(budget) = &project.budget {
        for hours in [budget.hours, budget.used] {
            if !hours.is_finite() || hours < 0.0 {
                return Err(EngineError::InvalidHours(hours));
            }
        }
    }
    Ok(())
}

fn validate_task(s: &Snapshot, task: &Task) -> Result<(), EngineError> {
    validate_text(&task.name, MAX_NAME_LEN, "task name too long")?;
    validate_range(task.range.start, task.range.end)?;
    if !s.contains_project(&task.project_id) {
        return Err(EngineError::NotFound(task.project_id));
    }
    Ok(())
}

fn validate_assignment(s: &Snapshot, a: &Assignment) -> Result<(), EngineError> {
    validate_range(a.range.start, a.range.end)?;
    validate_hours(a.hours_per_day)?;
    if let Some(notes) = &a.notes {
        validate_text(notes, MAX_NOTES_LEN, "notes too long")?;
    }
    if !s.contains_user(&a.user_id) {
        return Err(EngineError::NotFound(a.user_id));
    }
    if !s.contains_project(&a.project_id) {
        return Err(EngineError::NotFound(a.project_id));
    }
    if let Some(task_id) = a.task_id {
        let task = s.task(&task_id).ok_or(EngineError::NotFound(task_id))?;
        if task.project_id != a.project_id {
            return Err(EngineError::TaskProjectMismatch {
                task_id,
                project_id: a.project_id,
            });
        }
    }
    Ok(())
}

fn validate_time_off(s: &Snapshot, t: &TimeOff) -> Result<(), EngineError> {
    validate_range(t.range.start, t.range.end)?;
    if !s.contains_user(&t.user_id) {
        return Err(EngineError::NotFound(t.user_id));
    }
    Ok(())
}

impl Engine {
    // ── Users ────────────────────────────────────────────────

    pub fn add_user(&self, user: User) -> Result<Ulid, EngineError> {
        self.commit("add_user", move |s| {
            check_room(s.user_count(), "too many users")?;
            if s.contains_user(&user.id) {
                return Err(EngineError::AlreadyExists(user.id));
            }
            validate_user(&user)?;
            Ok((user.id, vec![Event::UserAdded { user }]))
        })
    }

    pub fn update_user(&self, id: Ulid, patch: UserPatch) -> Result<User, EngineError> {
        self.commit("update_user", move |s| {
            let current = s.user(&id).ok_or(EngineError::NotFound(id))?;
            let mut user = current.clone();
            patch.apply_to(&mut user);
            if user == *current {
                return Ok((user, vec![]));
            }
            validate_user(&user)?;
            Ok((user.clone(), vec![Event::UserUpdated { user }]))
        })
    }

    /// Removes the user along with every assignment and time-off entry that references it.
    pub fn remove_user(&self, id: Ulid) -> Result<(), EngineError> {
        self.commit("remove_user", move |s| {
            if !s.contains_user(&id) {
                return Err(EngineError::NotFound(id));
            }
            let mut events: Vec<Event> = s
                .user_assignments(id)
                .map(|a| Event::AssignmentRemoved {
                    id: a.id,
                    user_id: a.user_id,
                    project_id: a.project_id,
                })
                .collect();
            let assignments = events.len();
            events.extend(s.user_time_off(id).map(|t| Event::TimeOffRemoved {
                id: t.id,
                user_id: t.user_id,
            }));
            let time_off = events.len() - assignments;
            if assignments + time_off > 0 {
                metrics::counter!(CASCADE_REMOVED_TOTAL, "entity" => "assignment")
                    .increment(assignments as u64);
                metrics::counter!(CASCADE_REMOVED_TOTAL, "entity" => "time_off")
                    .increment(time_off as u64);
                tracing::info!(user_id = %id, assignments, time_off, "removing user with dependents");
            }
            events.push(Event::UserRemoved { id });
            Ok(((), events))
        })
    }

    // ── Projects ─────────────────────────────────────────────

    pub fn add_project(&self, project: Project) -> Result<Ulid, EngineError> {
        self.commit("add_project", move |s| {
            check_room(s.project_count(), "too many projects")?;
            if s.contains_project(&project.id) {
                return Err(EngineError::AlreadyExists(project.id));
            }
            validate_project(&project)?;
            Ok((project.id, vec![Event::ProjectAdded { project }]))
        })
    }

    pub fn update_project(&self, id: Ulid, patch: ProjectPatch) -> Result<Project, EngineError> {
        self.commit("update_project", move |s| {
            let current = s.project(&id).ok_or(EngineError::NotFound(id))?;
            let mut project = current.clone();
            let (start, end) = patch.apply_to(&mut project);
            project.range = validate_range(start, end)?;
            if project == *current {
                return Ok((project, vec![]));
            }
            validate_project(&project)?;
            Ok((project.clone(), vec![Event::ProjectUpdated { project }]))
        })
    }

    /// Removes the project along with its assignments and tasks.
    pub fn remove_project(&self, id: Ulid) -> Result<(), EngineError> {
        self.commit("remove_project", move |s| {
            if !s.contains_project(&id) {
                return Err(EngineError::NotFound(id));
            }
            let mut events: Vec<Event> = s
                .project_assignments(id)
                .map(|a| Event::AssignmentRemoved {
                    id: a.id,
                    user_id: a.user_id,
                    project_id: a.project_id,
                })
                .collect();
            let assignments = events.len();
            events.extend(s.project_tasks(id).map(|t| Event::TaskRemoved {
                id: t.id,
                project_id: t.project_id,
            }));
            let tasks = events.len() - assignments;
            if assignments + tasks > 0 {
                metrics::counter!(CASCADE_REMOVED_TOTAL, "entity" => "assignment")
                    .increment(assignments as u64);
                metrics::counter!(CASCADE_REMOVED_TOTAL, "entity" => "task")
                    .increment(tasks as u64);
                tracing::info!(project_id = %id, assignments, tasks, "removing project with dependents");
            }
            events.push(Event::ProjectRemoved { id });
            Ok(((), events))
        })
    }

    // ── Tasks ────────────────────────────────────────────────

    pub fn add_task(&self, task: Task) -> Result<Ulid, EngineError> {
        self.commit("add_task", move |s| {
            check_room(s.task_count(), "too many tasks")?;
            if s.task(&task.id).is_some() {
                return Err(EngineError::AlreadyExists(task.id));
            }
            validate_task(s, &task)?;
            Ok((task.id, vec![Event::TaskAdded { task }]))
        })
    }

    pub fn update_task(&self, id: Ulid, patch: TaskPatch) -> Result<Task, EngineError> {
        self.commit("update_task", move |s| {
            let current = s.task(&id).ok_or(EngineError::NotFound(id))?;
            let mut task = current.clone();
            let (start, end) = patch.apply_to(&mut task);
            task.range = validate_range(start, end)?;
            if task == *current {
                return Ok((task, vec![]));
            }
            validate_task(s, &task)?;
            Ok((task.clone(), vec![Event::TaskUpdated { task }]))
        })
    }

    /// Removes the task. Assignments that referenced it stay, without a task.
    pub fn remove_task(&self, id: Ulid) -> Result<(), EngineError> {
        self.commit("remove_task", move |s| {
            let task = s.task(&id).ok_or(EngineError::NotFound(id))?;
            let mut events: Vec<Event> = s
                .task_assignments(id)
                .map(|a| Event::AssignmentUpdated {
                    previous_user_id: a.user_id,
                    previous_project_id: a.project_id,
                    assignment: Assignment {
                        task_id: None,
                        ..a.clone()
                    },
                })
                .collect();
            if !events.is_empty() {
                tracing::info!(task_id = %id, detached = events.len(), "detaching task from assignments");
            }
            events.push(Event::TaskRemoved {
                id,
                project_id: task.project_id,
            });
            Ok(((), events))
        })
    }

    // ── Assignments ──────────────────────────────────────────

    pub fn add_assignment(&self, assignment: Assignment) -> Result<Ulid, EngineError> {
        self.commit("add_assignment", move |s| {
            check_room(s.assignment_count(), "too many assignments")?;
            if s.assignment(&assignment.id).is_some() {
                return Err(EngineError::AlreadyExists(assignment.id));
            }
            validate_assignment(s, &assignment)?;
            Ok((assignment.id, vec![Event::AssignmentAdded { assignment }]))
        })
    }

    /// Partial update. Changing the user moves the booking between back-reference lists;
    /// changing the project while keeping a task of the old project is rejected.
    pub fn update_assignment(
        &self,
        id: Ulid,
        patch: AssignmentPatch,
    ) -> Result<Assignment, EngineError> {
        self.commit("update_assignment", move |s| {
            let current = s.assignment(&id).ok_or(EngineError::NotFound(id))?;
            let mut assignment = current.clone();
            let (start, end) = patch.apply_to(&mut assignment);
            assignment.range = validate_range(start, end)?;
            if assignment == *current {
                return Ok((assignment, vec![]));
            }
            validate_assignment(s, &assignment)?;
            let event = Event::AssignmentUpdated {
                previous_user_id: current.user_id,
                previous_project_id: current.project_id,
                assignment: assignment.clone(),
            };
            Ok((assignment, vec![event]))
        })
    }

    pub fn remove_assignment(&self, id: Ulid) -> Result<(), EngineError> {
        self.commit("remove_assignment", move |s| {
            let a = s.assignment(&id).ok_or(EngineError::NotFound(id))?;
            let event = Event::AssignmentRemoved {
                id,
                user_id: a.user_id,
                project_id: a.project_id,
            };
            Ok(((), vec![event]))
        })
    }

    // ── Time off ─────────────────────────────────────────────

    pub fn add_time_off(&self, time_off: TimeOff) -> Result<Ulid, EngineError> {
        self.commit("add_time_off", move |s| {
            check_room(s.time_off_count(), "too many time-off entries")?;
            if s.time_off(&time_off.id).is_some() {
                return Err(EngineError::AlreadyExists(time_off.id));
            }
            validate_time_off(s, &time_off)?;
            Ok((time_off.id, vec![Event::TimeOffAdded { time_off }]))
        })
    }

    pub fn update_time_off(&self, id: Ulid, patch: TimeOffPatch) -> Result<TimeOff, EngineError> {
        self.commit("update_time_off", move |s| {
            let current = s.time_off(&id).ok_or(EngineError::NotFound(id))?;
            let mut time_off = current.clone();
            let (start, end) = patch.apply_to(&mut time_off);
            time_off.range = validate_range(start, end)?;
            if time_off == *current {
                return Ok((time_off, vec![]));
            }
            Ok((time_off.clone(), vec![Event::TimeOffUpdated { time_off }]))
        })
    }

    pub fn remove_time_off(&self, id: Ulid) -> Result<(), EngineError> {
        self.commit("remove_time_off", move |s| {
            let t = s.time_off(&id).ok_or(EngineError::NotFound(id))?;
            let event = Event::TimeOffRemoved {
                id,
                user_id: t.user_id,
            };
            Ok(((), vec![event]))
        })
    }
}
