//! Storage ports consumed by the generation core.
//!
//! The orchestrator only sees these traits. `postgres` holds the production
//! adapter; `memory` is an in-process adapter used by the workflow tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::draft::{Draft, DraftStatus, PublishMetadata, RefinementEntry};
use crate::models::idea::Idea;
use crate::models::prompt::{Prompt, PromptKind};
use crate::models::topic::Topic;
use crate::models::user::UserProfile;

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Record not found: {0}")]
    NotFound(String),

    /// A conditional write lost against a concurrent writer, or a uniqueness rule was hit.
    #[error("Conflicting write: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(db.message().to_string())
            }
            other => RepositoryError::Database(other.to_string()),
        }
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait PromptRepository: Send + Sync {
    async fn find_by_id(&self, prompt_id: Uuid) -> RepoResult<Option<Prompt>>;

    async fn find_by_name(&self, user_id: Uuid, name: &str) -> RepoResult<Option<Prompt>>;

    async fn find_active_by_kind(&self, user_id: Uuid, kind: PromptKind) -> RepoResult<Vec<Prompt>>;

    /// Fails with `Conflict` when the user already owns a prompt with the same name.
    async fn create(&self, prompt: &Prompt) -> RepoResult<()>;

    async fn update(&self, prompt: &Prompt) -> RepoResult<()>;
}

#[async_trait]
pub trait TopicRepository: Send + Sync {
    async fn find_by_id(&self, topic_id: Uuid) -> RepoResult<Option<Topic>>;

    async fn create(&self, topic: &Topic) -> RepoResult<()>;
}

#[async_trait]
pub trait IdeaRepository: Send + Sync {
    /// All-or-nothing insert of a generated batch.
    async fn create_batch(&self, ideas: &[Idea]) -> RepoResult<()>;

    async fn find_by_id(&self, idea_id: Uuid) -> RepoResult<Option<Idea>>;

    async fn find_by_user(&self, user_id: Uuid) -> RepoResult<Vec<Idea>>;

    /// Compare-and-set `used: false → true`.
    ///
    /// Returns `Conflict` when the idea was already used, `NotFound` when it does not exist.
    async fn mark_used(&self, idea_id: Uuid) -> RepoResult<()>;

    async fn clear_by_user(&self, user_id: Uuid) -> RepoResult<u64>;
}

#[async_trait]
pub trait DraftRepository: Send + Sync {
    /// All-or-nothing insert of a generated batch.
    async fn create_batch(&self, drafts: &[Draft]) -> RepoResult<()>;

    async fn find_by_id(&self, draft_id: Uuid) -> RepoResult<Option<Draft>>;

    async fn find_by_idea(&self, idea_id: Uuid) -> RepoResult<Vec<Draft>>;

    /// Replaces the content, appends `entry` to the history and sets status `refined`
    /// in one write. The write only applies while the stored history still has
    /// `expected_history_len` entries and the draft is refinable; otherwise `Conflict`.
    async fn append_refinement(
        &self,
        draft_id: Uuid,
        expected_history_len: usize,
        entry: &RefinementEntry,
    ) -> RepoResult<()>;

    /// Conditional status write: applies only while the stored status equals `from`.
    async fn update_status(
        &self,
        draft_id: Uuid,
        from: DraftStatus,
        to: DraftStatus,
        publish: Option<&PublishMetadata>,
    ) -> RepoResult<()>;

    /// Compensation for batches written by a request that later lost a race.
    async fn delete_batch(&self, draft_ids: &[Uuid]) -> RepoResult<u64>;
}

#[async_trait]
pub trait UserProfileProvider: Send + Sync {
    async fn find_by_id(&self, user_id: Uuid) -> RepoResult<Option<UserProfile>>;
}
