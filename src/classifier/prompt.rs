//! Prompt construction for text classification.

use std::collections::BTreeSet;

use chrono::Local;

use crate::types::{Project, Task};

/// Categories offered to the model unless configured otherwise.
pub const TASK_CATEGORIES: &[&str] = &[
    "Development - Coding",
    "Development - Debugging",
    "Documentation",
    "Email Communication",
    "Meeting - Video Conference",
    "Meeting - In Person",
    "Research",
    "Design Work",
    "Project Management",
    "Break Time",
];

/// Recent task names listed per project.
const RECENT_NAMES_PER_PROJECT: usize = 5;

/// One paragraph per project: identity, billing, categories and how the
/// project shows up in `recent_tasks`.
pub fn build_project_info(catalog: &[Project], recent_tasks: &[Task]) -> String {
    catalog
        .iter()
        .map(|project| project_block(project, recent_tasks))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn project_block(project: &Project, recent_tasks: &[Task]) -> String {
    let project_tasks: Vec<&Task> = recent_tasks
        .iter()
        .filter(|t| t.project == project.id)
        .collect();

    let recent_names = project_tasks
        .iter()
        .take(RECENT_NAMES_PER_PROJECT)
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>();

    // Most frequent first; ties keep first-seen order.
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for task in &project_tasks {
        match counts.iter_mut().find(|(c, _)| *c == task.category) {
            Some((_, n)) => *n += 1,
            None => counts.push((task.category.as_str(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    let common = counts.iter().map(|(c, _)| *c).collect::<Vec<_>>();

    let description = if project.description.trim().is_empty() {
        "No description provided"
    } else {
        project.description.as_str()
    };
    let kind = if project.default_billable {
        "Billable Work"
    } else {
        "Non-billable Work"
    };
    let rate = if project.billable_rate > 0.0 {
        format!("${}/hour", project.billable_rate)
    } else {
        "Non-billable".to_string()
    };

    format!(
        "Project: {name} (ID: {id})\n\
         Description: {description}\n\
         Type: {kind}\n\
         Rate: {rate}\n\
         Supported Categories: {supported}\n\
         Common Task Categories: {common}\n\
         Recent Tasks: {recent}\n\
         Task Count: {count} tasks in the last {window} entries",
        name = project.name,
        id = project.id,
        supported = join_or(&project.categories, "All Categories"),
        common = join_list_or(&common, "None"),
        recent = join_list_or(&recent_names, "None"),
        count = project_tasks.len(),
        window = recent_tasks.len(),
    )
}

/// `time: name (Project: id, Category: category)` lines, newest first.
pub fn build_task_history(recent_tasks: &[Task], lines: usize) -> String {
    let mut tasks: Vec<&Task> = recent_tasks.iter().collect();
    tasks.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    tasks
        .into_iter()
        .take(lines)
        .map(|t| {
            format!(
                "{}: {} (Project: {}, Category: {})",
                t.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                t.name,
                t.project,
                t.category
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The full classification prompt.
pub fn build_prompt(
    description: &str,
    categories: &[String],
    project_info: &str,
    task_history: &str,
) -> String {
    format!(
        r#"Analyze this task description and provide the following:
1. Classify it into exactly one of these categories: {categories}
2. Suggest which project it belongs to based on the following project information:

{project_info}

Recent Task History:
{task_history}

Consider:
- Project descriptions and their relevance to the task
- Supported and commonly used categories
- Similar tasks from project history
- Project type (billable vs non-billable)
- Recent task patterns and context

Return only a JSON object in this format: {{
    "task": "category",
    "project": "project_id",
    "confidence": 0.XX,
    "description": "brief explanation of why this project was chosen, including which factors were most influential"
}}

Note: Use the project ID from the parentheses, not the project name.
If unsure about the project, use "default". Description: {description}"#,
        categories = categories.join(", "),
    )
}

fn join_or(set: &BTreeSet<String>, empty: &str) -> String {
    if set.is_empty() {
        empty.to_string()
    } else {
        set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    }
}

fn join_list_or(items: &[&str], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn task(name: &str, project: &str, category: &str, minutes_ago: i64) -> Task {
        let end = Utc::now() - Duration::minutes(minutes_ago);
        let mut t = Task::manual(name, project, category, end - Duration::minutes(5), end);
        t.timestamp = end;
        t
    }

    #[test]
    fn project_block_lists_history() {
        let project = Project::with_id("p1", "Acme")
            .description("Client portal rebuild")
            .category("Development - Coding")
            .billable(120.0);
        let tasks = vec![
            task("Fix login", "p1", "Development - Debugging", 5),
            task("Write API", "p1", "Development - Coding", 10),
            task("Fix logout", "p1", "Development - Debugging", 15),
            task("Lunch", "other", "Break Time", 20),
        ];
        let info = build_project_info(&[project], &tasks);
        assert!(info.contains("Project: Acme (ID: p1)"));
        assert!(info.contains("Type: Billable Work"));
        assert!(info.contains("Rate: $120/hour"));
        assert!(info.contains(
            "Common Task Categories: Development - Debugging, Development - Coding"
        ));
        assert!(info.contains("Recent Tasks: Fix login, Write API, Fix logout"));
        assert!(info.contains("Task Count: 3 tasks in the last 4 entries"));
    }

    #[test]
    fn empty_project_fields_get_placeholders() {
        let info = build_project_info(&[Project::with_id("p2", "Internal")], &[]);
        assert!(info.contains("Description: No description provided"));
        assert!(info.contains("Supported Categories: All Categories"));
        assert!(info.contains("Recent Tasks: None"));
        assert!(info.contains("Rate: Non-billable"));
    }

    #[test]
    fn history_is_newest_first_and_limited() {
        let tasks = vec![
            task("old", "p1", "Research", 30),
            task("newest", "p1", "Research", 1),
            task("middle", "p1", "Research", 10),
        ];
        let history = build_task_history(&tasks, 2);
        let lines: Vec<&str> = history.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("newest (Project: p1, Category: Research)"));
        assert!(lines[1].contains("middle"));
    }

    #[test]
    fn prompt_names_categories_and_format() {
        let categories: Vec<String> = TASK_CATEGORIES.iter().map(|c| c.to_string()).collect();
        let prompt = build_prompt("editor open", &categories, "INFO", "HISTORY");
        assert!(prompt.contains("Development - Debugging, Documentation"));
        assert!(prompt.contains("INFO"));
        assert!(prompt.contains("HISTORY"));
        assert!(prompt.contains(r#""project": "project_id""#));
        assert!(prompt.contains(r#"use "default""#));
        assert!(prompt.ends_with("Description: editor open"));
    }
}
