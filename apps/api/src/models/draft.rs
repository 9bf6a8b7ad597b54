use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftType {
    Post,
    Article,
}

impl DraftType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftType::Post => "post",
            DraftType::Article => "article",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "post" => Some(DraftType::Post),
            "article" => Some(DraftType::Article),
            _ => None,
        }
    }
}

impl fmt::Display for DraftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a draft: `draft → refined → published | failed`.
///
/// `published` and `failed` are terminal. `failed` is reachable from any
/// non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    Draft,
    Refined,
    Published,
    Failed,
}

impl DraftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::Draft => "draft",
            DraftStatus::Refined => "refined",
            DraftStatus::Published => "published",
            DraftStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(DraftStatus::Draft),
            "refined" => Some(DraftStatus::Refined),
            "published" => Some(DraftStatus::Published),
            "failed" => Some(DraftStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DraftStatus::Published | DraftStatus::Failed)
    }

    /// Whether a draft in this status may be sent through another refinement round.
    pub fn is_refinable(&self) -> bool {
        !self.is_terminal()
    }

    /// Manual status changes. `refined` is never a target here: only a committed
    /// refinement, which also appends history, moves a draft there.
    pub fn can_transition_to(&self, next: DraftStatus) -> bool {
        use DraftStatus::*;
        matches!(
            (self, next),
            (Draft | Refined, Published) | (Draft | Refined, Failed)
        )
    }
}

impl fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One refinement round. `version` starts at 1 and increases by one per round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementEntry {
    pub prompt: String,
    pub content: String,
    pub version: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishMetadata {
    pub external_post_id: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub id: Uuid,
    pub user_id: Uuid,
    pub idea_id: Uuid,
    pub draft_type: DraftType,
    pub content: String,
    pub status: DraftStatus,
    pub refinement_history: Vec<RefinementEntry>,
    pub publish: Option<PublishMetadata>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Draft {
    pub fn new(user_id: Uuid, idea_id: Uuid, draft_type: DraftType, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            idea_id,
            draft_type,
            content,
            status: DraftStatus::Draft,
            refinement_history: Vec::new(),
            publish: None,
            created_at: now,
            updated_at: now,
        }
    }
}
