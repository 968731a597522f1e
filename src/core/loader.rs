//! Entity loading utilities
//!
//! Generic helpers for reading entities out of a project's directories,
//! reducing boilerplate in command implementations. Lookups accept full
//! IDs or unambiguous prefixes of one.

use miette::{IntoDiagnostic, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::PathBuf;

use crate::core::identity::EntityPrefix;
use crate::core::project::Project;

/// Load every entity of one type from the project.
///
/// Files that fail to parse are skipped here; `metria validate` is the
/// place that reports them.
pub fn load_all<T: DeserializeOwned + 'static>(project: &Project, prefix: EntityPrefix) -> Result<Vec<T>> {
    let dir = project.entity_dir(prefix);
    let mut entities = Vec::new();

    if !dir.exists() {
        return Ok(entities);
    }

    for entry in fs::read_dir(&dir).into_diagnostic()? {
        let entry = entry.into_diagnostic()?;
        let path = entry.path();

        if path.to_string_lossy().ends_with(".metria.yaml") {
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(entity) = serde_yml::from_str::<T>(&content) {
                    entities.push(entity);
                }
            }
        }
    }

    Ok(entities)
}

/// Find an entity file by ID or ID fragment
pub fn find_entity_file(project: &Project, prefix: EntityPrefix, id: &str) -> Option<PathBuf> {
    let dir = project.entity_dir(prefix);
    if !dir.exists() {
        return None;
    }

    for entry in fs::read_dir(&dir).ok()? {
        let entry = entry.ok()?;
        let path = entry.path();

        if path.to_string_lossy().ends_with(".metria.yaml") {
            let filename = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
            if filename.starts_with(id) || filename.contains(id) {
                return Some(path);
            }
        }
    }

    None
}

/// Load a single entity by ID, returning the path it lives at alongside
pub fn load_entity<T: DeserializeOwned + 'static>(
    project: &Project,
    prefix: EntityPrefix,
    id: &str,
) -> Result<Option<(PathBuf, T)>> {
    if let Some(path) = find_entity_file(project, prefix, id) {
        let content = fs::read_to_string(&path).into_diagnostic()?;
        let entity: T = serde_yml::from_str(&content).into_diagnostic()?;
        return Ok(Some((path, entity)));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn test_project() -> (tempfile::TempDir, Project) {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        (tmp, project)
    }

    #[test]
    fn test_load_all_empty_project() {
        let (_tmp, project) = test_project();
        let result: Vec<serde_json::Value> = load_all(&project, EntityPrefix::Est).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_load_all_skips_non_entity_files() {
        let (_tmp, project) = test_project();
        fs::write(project.entity_dir(EntityPrefix::Est).join("notes.yaml"), "a: 1").unwrap();
        fs::write(
            project.entity_dir(EntityPrefix::Est).join("EST-X.metria.yaml"),
            "a: 1",
        )
        .unwrap();

        let result: Vec<serde_json::Value> = load_all(&project, EntityPrefix::Est).unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_find_entity_file_missing() {
        let (_tmp, project) = test_project();
        assert!(find_entity_file(&project, EntityPrefix::Est, "EST-123").is_none());
    }

    #[test]
    fn test_find_entity_file_by_fragment() {
        let (_tmp, project) = test_project();
        let path = project
            .entity_dir(EntityPrefix::Cmp)
            .join("CMP-01J123456789ABCDEF.metria.yaml");
        fs::write(&path, "id: CMP-01J123456789ABCDEF").unwrap();

        let found = find_entity_file(&project, EntityPrefix::Cmp, "CMP-01J123456789ABCDEF");
        assert_eq!(found, Some(path.clone()));

        let found = find_entity_file(&project, EntityPrefix::Cmp, "01J12345");
        assert_eq!(found, Some(path));
    }
}
