//! Catalog operations that enforce the single-default-project invariant.

use tracing::info;

use super::traits::ProjectStore;
use crate::Result;
use crate::types::Project;

/// Add or update `project`.
///
/// If it is flagged as the default, the flag is cleared on every other
/// project first, so the catalog never holds two defaults.
pub async fn save_project(store: &dyn ProjectStore, project: &Project) -> Result<()> {
    let existing = store.get_all_projects().await?;

    if project.is_default_project {
        for other in existing
            .iter()
            .filter(|p| p.is_default_project && p.id != project.id)
        {
            let mut cleared = other.clone();
            cleared.is_default_project = false;
            store.update_project(&cleared).await?;
        }
    }

    if existing.iter().any(|p| p.id == project.id) {
        store.update_project(project).await
    } else {
        store.add_project(project).await
    }
}

/// Seed the "Default" project into an empty catalog. Returns the catalog.
pub async fn ensure_default_project(store: &dyn ProjectStore) -> Result<Vec<Project>> {
    let projects = store.get_all_projects().await?;
    if !projects.is_empty() {
        return Ok(projects);
    }
    let project = Project::seed_default();
    store.add_project(&project).await?;
    info!(project = %project.id, "created default project");
    Ok(vec![project])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryProjectStore;

    #[tokio::test]
    async fn saving_a_default_clears_the_others() {
        let store = MemoryProjectStore::with_projects([
            Project::with_id("a", "A").as_default(),
            Project::with_id("b", "B"),
        ]);
        save_project(&store, &Project::with_id("c", "C").as_default())
            .await
            .unwrap();

        let defaults: Vec<String> = store
            .get_all_projects()
            .await
            .unwrap()
            .into_iter()
            .filter(|p| p.is_default_project)
            .map(|p| p.id)
            .collect();
        assert_eq!(defaults, vec!["c".to_string()]);
    }

    #[tokio::test]
    async fn existing_project_is_updated() {
        let store = MemoryProjectStore::with_projects([Project::with_id("a", "A")]);
        save_project(&store, &Project::with_id("a", "Renamed"))
            .await
            .unwrap();
        let all = store.get_all_projects().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Renamed");
    }

    #[tokio::test]
    async fn seed_only_into_empty_catalog() {
        let store = MemoryProjectStore::new();
        let seeded = ensure_default_project(&store).await.unwrap();
        assert_eq!(seeded.len(), 1);
        assert!(seeded[0].is_default_project);
        assert!(seeded[0].default_billable);

        let again = ensure_default_project(&store).await.unwrap();
        assert_eq!(again, seeded);
    }
}
