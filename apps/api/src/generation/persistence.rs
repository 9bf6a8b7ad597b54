//! Persistence Coordinator: ordered, checked writes.
//!
//! A dependent write (idea marked used, refinement appended, status finalized)
//! is only issued once the artifact it depends on is durable. There are no
//! distributed transactions: when the dependent write fails after the artifact
//! was saved, the outcome says so explicitly instead of rolling back.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::GenerationError;
use crate::generation::cancellation::RequestContext;
use crate::models::draft::{Draft, DraftStatus, PublishMetadata, RefinementEntry};
use crate::models::idea::Idea;
use crate::repository::{DraftRepository, IdeaRepository, RepositoryError};

/// Result of a successful draft batch write.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DraftBatchOutcome {
    /// Drafts saved and the source idea marked used.
    Complete { drafts: Vec<Draft> },
    /// Drafts saved, but the idea could not be marked used. Retry only the marking.
    PartialSuccess {
        drafts: Vec<Draft>,
        idea_id: Uuid,
        reason: String,
    },
}

impl DraftBatchOutcome {
    pub fn drafts(&self) -> &[Draft] {
        match self {
            DraftBatchOutcome::Complete { drafts } => drafts,
            DraftBatchOutcome::PartialSuccess { drafts, .. } => drafts,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, DraftBatchOutcome::Complete { .. })
    }
}

#[derive(Clone)]
pub struct PersistenceCoordinator {
    ideas: Arc<dyn IdeaRepository>,
    drafts: Arc<dyn DraftRepository>,
}

impl PersistenceCoordinator {
    pub fn new(ideas: Arc<dyn IdeaRepository>, drafts: Arc<dyn DraftRepository>) -> Self {
        Self { ideas, drafts }
    }

    pub async fn save_ideas(
        &self,
        ctx: &RequestContext,
        ideas: Vec<Idea>,
    ) -> Result<Vec<Idea>, GenerationError> {
        ctx.check()?;
        self.ideas
            .create_batch(&ideas)
            .await
            .map_err(|e| GenerationError::PersistenceFailed(e.to_string()))?;
        info!("Persisted {} ideas", ideas.len());
        Ok(ideas)
    }

    /// Saves the batch, then marks the idea used.
    ///
    /// The idea is re-read first so a concurrent request that already spent it
    /// is caught before anything is written. If the final compare-and-set still
    /// loses, the just-written drafts are deleted again.
    pub async fn save_drafts_then_mark_used(
        &self,
        ctx: &RequestContext,
        idea_id: Uuid,
        drafts: Vec<Draft>,
    ) -> Result<DraftBatchOutcome, GenerationError> {
        let current = ctx
            .guard(self.ideas.find_by_id(idea_id))
            .await?
            .ok_or_else(|| GenerationError::not_found("idea", idea_id))?;
        if current.used {
            return Err(GenerationError::ConcurrentModification(format!(
                "idea {idea_id} was used by another request"
            )));
        }

        ctx.check()?;
        self.drafts
            .create_batch(&drafts)
            .await
            .map_err(|e| GenerationError::PersistenceFailed(e.to_string()))?;
        info!("Persisted {} drafts for idea {idea_id}", drafts.len());

        // Drafts are durable from here on: nothing below may turn into a plain error
        // except a lost race, which is compensated.
        if let Err(err) = ctx.check() {
            warn!("Not marking idea {idea_id} used: {err}");
            return Ok(DraftBatchOutcome::PartialSuccess {
                drafts,
                idea_id,
                reason: err.to_string(),
            });
        }

        match self.ideas.mark_used(idea_id).await {
            Ok(()) => Ok(DraftBatchOutcome::Complete { drafts }),
            Err(RepositoryError::Conflict(msg)) => {
                warn!("Idea {idea_id} was spent concurrently, removing duplicate drafts");
                let ids: Vec<Uuid> = drafts.iter().map(|d| d.id).collect();
                if let Err(e) = self.drafts.delete_batch(&ids).await {
                    error!("Failed to remove drafts {ids:?} for idea {idea_id}: {e}");
                }
                Err(GenerationError::ConcurrentModification(msg))
            }
            Err(err) => {
                warn!("Drafts saved but idea {idea_id} could not be marked used: {err}");
                Ok(DraftBatchOutcome::PartialSuccess {
                    drafts,
                    idea_id,
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Idempotent bookkeeping retry after a `PartialSuccess`.
    ///
    /// Refuses when the idea has no drafts, since then there is nothing the
    /// marking would depend on.
    pub async fn retry_mark_used(
        &self,
        ctx: &RequestContext,
        idea: Idea,
    ) -> Result<Idea, GenerationError> {
        let drafts = ctx.guard(self.drafts.find_by_idea(idea.id)).await?;
        if drafts.is_empty() {
            return Err(GenerationError::not_found("draft batch for idea", idea.id));
        }
        if idea.used {
            return Ok(idea);
        }

        ctx.check()?;
        match self.ideas.mark_used(idea.id).await {
            Ok(()) | Err(RepositoryError::Conflict(_)) => Ok(Idea { used: true, ..idea }),
            Err(err) => Err(err.into()),
        }
    }

    /// Content replacement, history append and status change commit as one write.
    pub async fn commit_refinement(
        &self,
        ctx: &RequestContext,
        draft: Draft,
        entry: RefinementEntry,
    ) -> Result<Draft, GenerationError> {
        ctx.check()?;
        self.drafts
            .append_refinement(draft.id, draft.refinement_history.len(), &entry)
            .await?;

        let mut refined = draft;
        refined.content = entry.content.clone();
        refined.refinement_history.push(entry);
        refined.status = DraftStatus::Refined;
        refined.updated_at = Utc::now();
        Ok(refined)
    }

    pub async fn transition_status(
        &self,
        ctx: &RequestContext,
        draft: Draft,
        to: DraftStatus,
        publish: Option<PublishMetadata>,
    ) -> Result<Draft, GenerationError> {
        if !draft.status.can_transition_to(to) {
            return Err(GenerationError::InvalidTransition {
                from: draft.status,
                to,
            });
        }

        ctx.check()?;
        self.drafts
            .update_status(draft.id, draft.status, to, publish.as_ref())
            .await?;
        info!("Draft {} moved from {} to {to}", draft.id, draft.status);

        let mut updated = draft;
        updated.status = to;
        if publish.is_some() {
            updated.publish = publish;
        }
        updated.updated_at = Utc::now();
        Ok(updated)
    }
}
