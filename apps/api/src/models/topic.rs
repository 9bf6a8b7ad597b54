use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A subject area that drives idea generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub keywords: Vec<String>,
    pub related_topics: Vec<String>,
    pub priority: i32,
    /// Requested ideas per generation. Values <= 0 fall back to the configured default.
    pub ideas_count: i32,
    /// Name of the prompt this topic prefers, looked up before the active-kind fallback.
    pub prompt_name: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Topic {
    pub fn new(user_id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            description: None,
            category: None,
            keywords: Vec::new(),
            related_topics: Vec::new(),
            priority: 5,
            ideas_count: 0,
            prompt_name: None,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
