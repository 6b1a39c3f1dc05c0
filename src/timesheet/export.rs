use std::borrow::Cow;

use chrono::{DateTime, NaiveDate, TimeZone};

use crate::types::{Project, Task};

/// Column order of the exported timesheet.
pub const CSV_HEADERS: [&str; 11] = [
    "UUID",
    "Date",
    "Start Time",
    "End Time",
    "Duration",
    "Project",
    "Category",
    "Task",
    "Description",
    "Billable",
    "Confidence",
];

/// `taskshot_timesheet_<YYYY-MM-DD>.csv`
pub fn default_filename(date: NaiveDate) -> String {
    format!("taskshot_timesheet_{}.csv", date.format("%Y-%m-%d"))
}

/// Render tasks as CSV in `tz` local time.
///
/// Projects are shown by name when found in `projects`, by id otherwise.
/// Rows end with `\n`; there is no trailing newline after the last row.
pub fn to_csv<Tz>(tasks: &[Task], projects: &[Project], tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut rows = Vec::with_capacity(tasks.len() + 1);
    rows.push(CSV_HEADERS.join(","));
    for task in tasks {
        let start: DateTime<Tz> = task.start_time.with_timezone(tz);
        let end: DateTime<Tz> = task.end_time.with_timezone(tz);
        let project = projects
            .iter()
            .find(|p| p.id == task.project)
            .map_or(task.project.as_str(), |p| p.name.as_str());
        let cells = [
            escape(&task.uuid),
            Cow::Owned(start.format("%Y-%m-%d").to_string()),
            Cow::Owned(start.format("%H:%M").to_string()),
            Cow::Owned(end.format("%H:%M").to_string()),
            Cow::Owned(task.duration.to_string()),
            escape(project),
            escape(&task.category),
            escape(&task.name),
            escape(&task.description),
            Cow::Borrowed(if task.billable { "Yes" } else { "No" }),
            Cow::Owned(task.confidence.to_string()),
        ];
        rows.push(cells.join(","));
    }
    rows.join("\n")
}

/// Quote a cell containing a comma, quote or newline; double inner quotes.
fn escape(cell: &str) -> Cow<'_, str> {
    if cell.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", cell.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn escapes_special_cells() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn renders_rows() {
        let mut task = Task::manual(
            "Fix bug",
            "p1",
            "Development - Debugging",
            at("2026-03-10T09:00:00Z"),
            at("2026-03-10T09:30:00Z"),
        )
        .with_description("Stack trace, then fix")
        .with_billable(true);
        task.uuid = "u-1".into();
        let projects = vec![Project::with_id("p1", "Website")];

        let csv = to_csv(&[task], &projects, &Utc);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADERS.join(","));
        assert_eq!(
            lines[1],
            "u-1,2026-03-10,09:00,09:30,30,Website,Development - Debugging,Fix bug,\"Stack trace, then fix\",Yes,1"
        );
    }

    #[test]
    fn filename_uses_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        assert_eq!(default_filename(date), "taskshot_timesheet_2026-03-10.csv");
    }
}
