//! Workspace records and slug handling

use serde::{Deserialize, Serialize};

use crate::model::{Timestamp, WorkspaceId};

/// A workspace is the tenant boundary for the whole content pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    /// Unique identifier
    pub id: WorkspaceId,

    /// Human-readable name
    pub name: String,

    /// URL-safe unique slug, derived from the name at creation
    pub slug: String,

    /// When the workspace was created
    pub created_at: Timestamp,

    /// Last time workspace metadata was updated
    pub updated_at: Timestamp,
}

impl Workspace {
    /// Create a new workspace with a slug derived from its name
    pub fn new(name: String) -> Self {
        let now = Timestamp::now();
        let slug = slugify(&name);

        Workspace {
            id: WorkspaceId::generate(),
            name,
            slug,
            created_at: now,
            updated_at: now,
        }
    }
}

/// How a request names its target workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceSelector {
    /// By opaque id
    Id(WorkspaceId),

    /// By URL slug
    Slug(String),
}

/// Validate a workspace name
pub fn validate_workspace_name(name: &str) -> Result<(), WorkspaceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(WorkspaceError::InvalidName(
            "Name must not be empty".to_string(),
        ));
    }
    if name.len() > 100 {
        return Err(WorkspaceError::InvalidName(
            "Name must be at most 100 characters".to_string(),
        ));
    }
    Ok(())
}

/// Derive a URL-safe slug from a workspace name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true; // suppress leading dash

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        slug.push_str("workspace");
    }

    slug
}

/// Append a short random suffix, used when a slug is already taken
pub fn slug_with_suffix(slug: &str) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    const SUFFIX_LEN: usize = 4;

    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect();

    format!("{}-{}", slug, suffix)
}

/// Workspace operation errors
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("Workspace not found")]
    NotFound,

    #[error("Invalid workspace name: {0}")]
    InvalidName(String),

    #[error("Could not allocate a unique slug")]
    SlugExhausted,

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StoreError),
}
