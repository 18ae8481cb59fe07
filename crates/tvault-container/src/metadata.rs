//! Plaintext JSON metadata stored between the header and the ciphertext.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment written when the caller supplies none.
pub const DEFAULT_COMMENT: &str = "created by trust vault core";

/// Arbitrary container metadata, readable without any key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Display name; defaults to the container file stem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "default_comment")]
    pub comment: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_comment() -> String {
    DEFAULT_COMMENT.to_owned()
}

impl Metadata {
    /// Metadata for a freshly sealed container.
    pub fn new(name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            name,
            created_at: now,
            updated_at: now,
            comment: default_comment(),
            tags: Vec::new(),
        }
    }

    /// Applies reseal-time overrides: `created_at` is preserved,
    /// `updated_at` bumps to now, and the remaining fields change only
    /// when the caller passed a non-empty replacement.
    pub fn apply_update(
        &mut self,
        name: Option<&str>,
        comment: Option<&str>,
        tags: Option<Vec<String>>,
    ) {
        self.updated_at = Utc::now();
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            self.name = Some(name.to_owned());
        }
        if let Some(comment) = comment.filter(|c| !c.is_empty()) {
            self.comment = comment.to_owned();
        }
        if let Some(tags) = tags.filter(|t| !t.is_empty()) {
            self.tags = tags;
        }
    }
}
