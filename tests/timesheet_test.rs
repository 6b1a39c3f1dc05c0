//! Timesheet views over a stored task log.

use chrono::{DateTime, Duration, FixedOffset, Utc};

use taskshot::timesheet::{self, CSV_HEADERS, DateRange, TimeSummary, merge_stored_tasks};
use taskshot::{MemoryTaskStore, Project, Task, TaskStore};

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn logged(name: &str, project: &str, end: &str, minutes: i64, billable: bool) -> Task {
    let end = at(end);
    let mut task = Task::manual(name, project, "Research", end - Duration::minutes(minutes), end)
        .with_billable(billable);
    task.timestamp = end;
    task
}

fn log() -> Vec<Task> {
    vec![
        logged("Old work", "p1", "2026-02-01T10:00:00Z", 60, true),
        logged("Yesterday", "p1", "2026-03-09T16:00:00Z", 30, true),
        logged("Morning", "p1", "2026-03-10T09:30:00Z", 90, true),
        logged("Admin", "p2", "2026-03-10T11:00:00Z", 45, false),
    ]
}

#[test]
fn today_summary() {
    let now = at("2026-03-10T17:00:00Z");
    let tasks = log();
    let today = DateRange::Today.filter(&tasks, &now);
    let summary = TimeSummary::from_tasks(today);

    assert_eq!(summary.total_minutes, 135);
    assert_eq!(summary.billable_minutes, 90);
    assert_eq!(summary.total_hours(), 2.3);
    assert_eq!(summary.billable_hours(), 1.5);
    let per_project: Vec<(&str, f64)> = summary.project_hours().collect();
    assert_eq!(per_project, [("p1", 1.5), ("p2", 0.8)]);
}

#[test]
fn ranges_respect_local_midnight() {
    // 01:00 on the 10th in UTC+2 is 23:00 on the 9th in UTC.
    let tz = FixedOffset::east_opt(2 * 3600).unwrap();
    let now = at("2026-03-10T12:00:00Z").with_timezone(&tz);
    let late_evening_utc = at("2026-03-09T23:00:00Z");
    assert!(DateRange::Today.contains(late_evening_utc, &now));
    assert!(!DateRange::Yesterday.contains(late_evening_utc, &now));
}

#[test]
fn week_and_month_filters() {
    let now = at("2026-03-10T17:00:00Z");
    let tasks = log();
    assert_eq!(DateRange::Week.filter(&tasks, &now).len(), 3);
    assert_eq!(DateRange::Month.filter(&tasks, &now).len(), 3);
    assert_eq!(DateRange::All.filter(&tasks, &now).len(), 4);
    assert_eq!(DateRange::Yesterday.filter(&tasks, &now)[0].name, "Yesterday");
}

#[test]
fn csv_export_uses_project_names_and_quotes() {
    let mut tasks = log();
    tasks[3].description = "Invoices, \"urgent\"".to_string();
    let projects = vec![Project::with_id("p1", "Acme"), Project::with_id("p2", "Internal")];

    let csv = timesheet::to_csv(&tasks[2..], &projects, &Utc);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], CSV_HEADERS.join(","));
    assert!(lines[1].contains(",2026-03-10,08:00,09:30,90,Acme,Research,Morning,,Yes,1"));
    assert!(lines[2].ends_with(",Internal,Research,Admin,\"Invoices, \"\"urgent\"\"\",No,1"));
}

#[tokio::test]
async fn merging_stored_tasks() {
    let store = MemoryTaskStore::new();
    let tasks = log();
    for task in &tasks {
        store.add_task(task).await.unwrap();
    }

    let merged = merge_stored_tasks(&store, &tasks[1..3]).await.unwrap();
    assert_eq!(merged.name, "Yesterday");
    assert_eq!(merged.start_time, at("2026-03-09T15:30:00Z"));
    assert_eq!(merged.end_time, at("2026-03-10T09:30:00Z"));
    assert_eq!(merged.confidence, 1.0);

    let remaining: Vec<String> = store.all().into_iter().map(|t| t.name).collect();
    assert_eq!(remaining, ["Old work", "Admin", "Yesterday"]);
}
