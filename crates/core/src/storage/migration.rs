use serde_json::Value;

use crate::errors::CoreError;

/// Current schema version of the stored documents.
///
/// History:
/// - `1`: projects carry a single optional `tag` string.
/// - `2`: projects carry a `tags` array.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Version assumed when no `schema_version` document exists.
pub const LEGACY_SCHEMA_VERSION: u32 = 1;

/// Check that documents written at `version` can be upgraded by this build.
pub fn check_version(version: u32) -> Result<(), CoreError> {
    if version == 0 || version > CURRENT_SCHEMA_VERSION {
        return Err(CoreError::UnsupportedSchemaVersion(version));
    }
    Ok(())
}

/// Parse a stored `schema_version` document. Absent means legacy.
pub fn parse_version(doc: Option<&Value>) -> Result<u32, CoreError> {
    match doc {
        None | Some(Value::Null) => Ok(LEGACY_SCHEMA_VERSION),
        Some(v) => v
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| {
                CoreError::Deserialization(format!("Invalid schema_version document: {v}"))
            }),
    }
}

/// v1 → v2 for a single project object: fold `tag` into `tags`.
/// Returns `true` if the value was changed.
pub fn migrate_project(project: &mut Value) -> bool {
    let Some(obj) = project.as_object_mut() else {
        return false;
    };
    let Some(legacy) = obj.remove("tag") else {
        if obj.contains_key("tags") {
            return false;
        }
        obj.insert("tags".into(), Value::Array(Vec::new()));
        return true;
    };

    let mut tags: Vec<Value> = match obj.remove("tags") {
        Some(Value::Array(existing)) => existing,
        _ => Vec::new(),
    };
    if let Value::String(tag) = legacy {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !tags.iter().any(|t| t.as_str() == Some(tag.as_str())) {
            tags.push(Value::String(tag));
        }
    }
    obj.insert("tags".into(), Value::Array(tags));
    true
}

/// v1 → v2 for the `projects` document (an array of projects).
pub fn migrate_projects_document(doc: &mut Value) -> bool {
    let Some(projects) = doc.as_array_mut() else {
        return false;
    };
    let mut changed = false;
    for project in projects {
        changed |= migrate_project(project);
    }
    changed
}

/// v1 → v2 for a stored snapshot: migrate its embedded projects.
pub fn migrate_snapshot_document(doc: &mut Value) -> bool {
    match doc.get_mut("projects") {
        Some(projects) => migrate_projects_document(projects),
        None => false,
    }
}
