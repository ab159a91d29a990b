use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A crypto project the user is following (research notes, links, tags).
///
/// Embedded in every snapshot so the research context travels with the numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub note: String,
    /// Lowercased, deduplicated, insertion-ordered
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into().trim().to_string(),
            url: None,
            note: String::new(),
            tags: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Add a tag. Returns `false` if it was blank or already present.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = normalize_tag(tag);
        if tag.is_empty() || self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Remove a tag. Returns `false` if the project did not carry it.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let tag = normalize_tag(tag);
        let before = self.tags.len();
        self.tags.retain(|t| *t != tag);
        self.tags.len() != before
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&normalize_tag(tag))
    }
}

pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}
