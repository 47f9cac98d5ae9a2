use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use allot::engine::{Engine, trend_weeks};
use allot::model::{DashboardSummary, DepartmentUtilization, ProjectStatus};

#[derive(Serialize)]
struct Report {
    summary: DashboardSummary,
    department_trend: Vec<DepartmentUtilization>,
    people: Vec<PersonRow>,
    projects: Vec<ProjectRow>,
}

#[derive(Serialize)]
struct PersonRow {
    name: String,
    department: String,
    week_utilization: u8,
    suggested_max_hours_per_day: f64,
    conflicts: usize,
    time_off_entries: usize,
}

#[derive(Serialize)]
struct ProjectRow {
    name: String,
    client: String,
    status: ProjectStatus,
    coverage: u8,
    budget_burn: Option<u32>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "allot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let today: NaiveDate = std::env::var("ALLOT_TODAY")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let trend: usize = std::env::var("ALLOT_TREND_WEEKS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(6);
    let horizon_days: u32 = std::env::var("ALLOT_HORIZON_DAYS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30);

    info!("allot report as of {today}");
    info!("  trend weeks: {trend}");
    info!("  deadline horizon: {horizon_days} days");

    let engine = Engine::default();
    allot::seed::sample_team(&engine, today)?;

    let weeks = trend_weeks(today, trend)?;
    let this_week = trend_weeks(today, 1)?;
    let week_start = this_week.first().copied().unwrap_or(today);
    let week_end = week_start
        .checked_add_days(Days::new(6))
        .ok_or("week end out of range")?;

    let mut people = Vec::new();
    for user in engine.list_users() {
        people.push(PersonRow {
            week_utilization: engine.get_user_utilization(user.id, week_start, week_end)?,
            suggested_max_hours_per_day: user.suggested_max_hours_per_day(),
            conflicts: engine.user_conflicts(user.id)?.len(),
            time_off_entries: engine.get_user_time_off(user.id)?.len(),
            name: user.name,
            department: user.department,
        });
    }

    let mut projects = Vec::new();
    for project in engine.list_projects() {
        projects.push(ProjectRow {
            coverage: engine.get_project_utilization(project.id)?,
            budget_burn: project.budget.and_then(|b| b.burn_percent()),
            name: project.name,
            client: project.client,
            status: project.status,
        });
    }

    let report = Report {
        summary: engine.dashboard_summary(today, horizon_days)?,
        department_trend: engine.department_utilization(&weeks)?,
        people,
        projects,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
