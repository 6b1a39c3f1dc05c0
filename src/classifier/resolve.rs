//! Project resolution against the catalog.
//!
//! Every place that needs "the project to fall back to" goes through
//! [`resolve_default_project`], so the fallback rule lives in one spot.

use tracing::warn;

use crate::types::{DEFAULT_PROJECT_ID, Project};

/// The designated default project: the one flagged `is_default_project`,
/// else the first project in the catalog.
///
/// More than one flagged project violates the catalog invariant; the first
/// flagged one wins and a warning is logged.
pub fn resolve_default_project(catalog: &[Project]) -> Option<&Project> {
    let mut flagged = catalog.iter().filter(|p| p.is_default_project);
    match flagged.next() {
        Some(first) => {
            if flagged.next().is_some() {
                warn!(
                    chosen = %first.id,
                    "more than one project is flagged as default"
                );
            }
            Some(first)
        }
        None => catalog.first(),
    }
}

/// Id of the designated default project, or [`DEFAULT_PROJECT_ID`] for an
/// empty catalog.
pub fn default_project_id(catalog: &[Project]) -> String {
    resolve_default_project(catalog)
        .map(|p| p.id.clone())
        .unwrap_or_else(|| DEFAULT_PROJECT_ID.to_string())
}

/// Map a model-supplied project reference onto a catalog id.
///
/// `"default"` (any case) and unknown ids resolve to the designated
/// default; a catalog id is returned unchanged.
pub fn resolve_project_id(catalog: &[Project], candidate: &str) -> String {
    let candidate = candidate.trim();
    if candidate.eq_ignore_ascii_case(DEFAULT_PROJECT_ID) {
        return default_project_id(catalog);
    }
    if catalog.iter().any(|p| p.id == candidate) {
        return candidate.to_string();
    }
    warn!(project_id = candidate, "model returned unknown project id");
    default_project_id(catalog)
}
