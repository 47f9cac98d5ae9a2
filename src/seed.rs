//! Demo team used by the `allot` binary and the bench. Dates are relative to a reference day.

use chrono::NaiveDate;
use ulid::Ulid;

use crate::engine::{Engine, EngineError};
use crate::model::*;

const USERS: [(&str, &str, &str, &str, u32); 6] = [
    ("Alex Johnson", "alex@example.com", "Frontend Developer", "Engineering", 40),
    ("Jamie Smith", "jamie@example.com", "Backend Developer", "Engineering", 40),
    ("Morgan Lee", "morgan@example.com", "UX Designer", "Design", 32),
    ("Taylor Kim", "taylor@example.com", "Product Manager", "Product", 40),
    ("Jordan Patel", "jordan@example.com", "DevOps Engineer", "Engineering", 40),
    ("Casey Rivera", "casey@example.com", "UI Designer", "Design", 40),
];

// (name, client, color, start, end, status, budget hours, budget used)
const PROJECTS: [(&str, &str, &str, i64, i64, ProjectStatus, f64, f64); 5] = [
    ("Website Redesign", "Acme Corp", "project-blue", -30, 60, ProjectStatus::Active, 400.0, 180.0),
    ("Mobile App Development", "TechStart", "project-green", -15, 75, ProjectStatus::Active, 600.0, 120.0),
    ("E-commerce Platform", "ShopEasy", "project-purple", 10, 100, ProjectStatus::Planned, 800.0, 0.0),
    ("Internal Dashboard", "In-house", "project-orange", -60, -5, ProjectStatus::Completed, 300.0, 320.0),
    ("API Integration", "DataSync", "project-red", -10, 20, ProjectStatus::Active, 160.0, 60.0),
];

// (project, name, start, end, status)
const TASKS: [(usize, &str, i64, i64, TaskStatus); 8] = [
    (0, "Homepage Design", -20, -10, TaskStatus::Completed),
    (0, "Frontend Implementation", -8, 5, TaskStatus::InProgress),
    (0, "Backend API Development", -5, 10, TaskStatus::InProgress),
    (1, "App Wireframes", -15, -5, TaskStatus::Completed),
    (1, "UI Design", -5, 10, TaskStatus::InProgress),
    (1, "React Native Development", 5, 25, TaskStatus::Todo),
    (4, "API Integration", -10, 5, TaskStatus::InProgress),
    (4, "Testing & QA", 5, 20, TaskStatus::Todo),
];

// (user, project, task, start, end, hours per day, notes)
const BOOKINGS: [(usize, usize, Option<usize>, i64, i64, Hours, &str); 13] = [
    (0, 0, Some(1), -8, 5, 6.0, "Implementing homepage components"),
    (0, 4, Some(6), -3, 2, 4.0, "Working on API integration"),
    (1, 0, Some(2), -5, 10, 6.0, "Building backend APIs"),
    (1, 4, Some(6), -2, 3, 4.0, "API integration support"),
    (2, 0, Some(0), -20, -10, 6.0, "Creating homepage designs"),
    (2, 1, Some(3), -15, -5, 4.0, "Mobile app wireframes"),
    (2, 1, Some(4), -5, 10, 6.0, "Mobile app UI design"),
    (3, 0, None, -30, 60, 2.0, "Project management"),
    (3, 1, None, -15, 75, 3.0, "Product management"),
    (4, 0, None, 10, 20, 2.0, "Deployment setup"),
    (4, 4, None, -10, 20, 6.0, "API infrastructure"),
    (5, 1, Some(4), -5, 10, 8.0, "UI design support"),
    (5, 2, None, 10, 30, 4.0, "E-commerce UI design"),
];

// (user, start, end, kind, approved)
const TIME_OFF: [(usize, i64, i64, TimeOffKind, bool); 4] = [
    (0, 20, 24, TimeOffKind::Vacation, true),
    (2, 15, 19, TimeOffKind::Vacation, true),
    (4, 5, 5, TimeOffKind::Sick, true),
    (1, 25, 35, TimeOffKind::Vacation, false),
];

/// Company-wide holiday, recorded for every user.
const HOLIDAY_OFFSET: i64 = 40;

fn span(today: NaiveDate, start: i64, end: i64) -> Result<DateRange, EngineError> {
    let out = EngineError::LimitExceeded("date out of range");
    let start = DateRange::single(today).shift(start).ok_or(out.clone())?.start;
    let end = DateRange::single(today).shift(end).ok_or(out)?.start;
    DateRange::checked(start, end).ok_or(EngineError::InvalidRange { start, end })
}

/// Load the demo team into `engine`: six people in three departments, five projects with tasks,
/// thirteen bookings (several of them conflicting) and some time off.
pub fn sample_team(engine: &Engine, today: NaiveDate) -> Result<(), EngineError> {
    let mut users = Vec::with_capacity(USERS.len());
    for (name, email, role, department, capacity) in USERS {
        users.push(engine.add_user(User {
            id: Ulid::new(),
            name: name.into(),
            email: email.into(),
            role: role.into(),
            department: department.into(),
            avatar: None,
            capacity,
        })?);
    }

    let mut projects = Vec::with_capacity(PROJECTS.len());
    for (name, client, color, start, end, status, hours, used) in PROJECTS {
        projects.push(engine.add_project(Project {
            id: Ulid::new(),
            name: name.into(),
            client: client.into(),
            range: span(today, start, end)?,
            status,
            color: color.into(),
            budget: Some(Budget { hours, used }),
        })?);
    }

    let mut tasks = Vec::with_capacity(TASKS.len());
    for (project, name, start, end, status) in TASKS {
        tasks.push(engine.add_task(Task {
            id: Ulid::new(),
            project_id: projects[project],
            name: name.into(),
            range: span(today, start, end)?,
            status,
        })?);
    }

    for (user, project, task, start, end, hours_per_day, notes) in BOOKINGS {
        engine.add_assignment(Assignment {
            id: Ulid::new(),
            user_id: users[user],
            project_id: projects[project],
            task_id: task.map(|t| tasks[t]),
            range: span(today, start, end)?,
            hours_per_day,
            notes: Some(notes.into()),
        })?;
    }

    for (user, start, end, kind, approved) in TIME_OFF {
        engine.add_time_off(TimeOff {
            id: Ulid::new(),
            user_id: users[user],
            range: span(today, start, end)?,
            kind,
            approved,
        })?;
    }
    for &user_id in &users {
        engine.add_time_off(TimeOff {
            id: Ulid::new(),
            user_id,
            range: span(today, HOLIDAY_OFFSET, HOLIDAY_OFFSET)?,
            kind: TimeOffKind::Holiday,
            approved: true,
        })?;
    }

    tracing::info!(
        %today,
        users = users.len(),
        projects = projects.len(),
        bookings = BOOKINGS.len(),
        "sample team loaded"
    );
    Ok(())
}
