use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which generation workflow a prompt template feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    Ideas,
    Drafts,
}

impl PromptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptKind::Ideas => "ideas",
            PromptKind::Drafts => "drafts",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ideas" => Some(PromptKind::Ideas),
            "drafts" => Some(PromptKind::Drafts),
            _ => None,
        }
    }
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-owned instruction template. `name` is unique per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub kind: PromptKind,
    pub template: String,
    pub active: bool,
    pub style: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prompt {
    pub fn new(user_id: Uuid, name: impl Into<String>, kind: PromptKind, template: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            kind,
            template: template.into(),
            active: true,
            style: None,
            created_at: now,
            updated_at: now,
        }
    }
}
