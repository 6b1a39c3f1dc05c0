//! Projects tasks are billed against.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Id used when no project catalog exists at all.
pub const DEFAULT_PROJECT_ID: &str = "default";

/// A project in the user's catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Categories this project supports. Empty means "all categories".
    #[serde(default)]
    pub categories: BTreeSet<String>,
    /// Hourly rate; `0.0` for non-billable work.
    #[serde(default)]
    pub billable_rate: f64,
    #[serde(default)]
    pub default_billable: bool,
    /// At most one project in a catalog carries this flag.
    #[serde(default)]
    pub is_default_project: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Project {
    /// Create a project with a fresh v4 id.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), name)
    }

    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            categories: BTreeSet::new(),
            billable_rate: 0.0,
            default_billable: false,
            is_default_project: false,
            color: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.categories.insert(category.into());
        self
    }

    pub fn billable(mut self, rate: f64) -> Self {
        self.billable_rate = rate;
        self.default_billable = true;
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default_project = true;
        self
    }

    /// The project seeded into an empty catalog.
    pub fn seed_default() -> Self {
        let mut project = Self::new("Default")
            .description("Default project for unclassified tasks")
            .category("Development")
            .category("Research")
            .category("Meeting")
            .category("Planning")
            .as_default();
        project.default_billable = true;
        project.color = Some("#3498db".to_string());
        project
    }
}
