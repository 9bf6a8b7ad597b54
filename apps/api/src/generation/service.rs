//! Generation Orchestrator entry point.
//!
//! `GenerationService` owns the collaborators every workflow needs. The three
//! generation workflows live in `ideas`, `drafts` and `refinement` as further
//! `impl GenerationService` blocks; this file holds construction and the small
//! housekeeping operations.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::GenerationError;
use crate::generation::cancellation::RequestContext;
use crate::generation::persistence::PersistenceCoordinator;
use crate::generation::resolver::{PromptCache, PromptResolver};
use crate::generation::validator::validate_topic;
use crate::llm_client::LlmProvider;
use crate::models::draft::{Draft, DraftStatus, PublishMetadata};
use crate::models::idea::Idea;
use crate::models::topic::Topic;
use crate::repository::{
    DraftRepository, IdeaRepository, PromptRepository, TopicRepository, UserProfileProvider,
};

/// Default number of ideas when a topic does not ask for a specific count.
pub const DEFAULT_IDEA_COUNT: usize = 2;
pub const DEFAULT_IDEA_TTL_DAYS: i64 = 30;

/// Storage ports, one handle per entity.
#[derive(Clone)]
pub struct Repositories {
    pub prompts: Arc<dyn PromptRepository>,
    pub topics: Arc<dyn TopicRepository>,
    pub ideas: Arc<dyn IdeaRepository>,
    pub drafts: Arc<dyn DraftRepository>,
    pub users: Arc<dyn UserProfileProvider>,
}

impl Repositories {
    /// All ports backed by one store.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: PromptRepository
            + TopicRepository
            + IdeaRepository
            + DraftRepository
            + UserProfileProvider
            + 'static,
    {
        Self {
            prompts: store.clone(),
            topics: store.clone(),
            ideas: store.clone(),
            drafts: store.clone(),
            users: store,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub default_idea_count: usize,
    /// `None` means generated ideas never expire.
    pub idea_ttl: Option<chrono::Duration>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            default_idea_count: DEFAULT_IDEA_COUNT,
            idea_ttl: Some(chrono::Duration::days(DEFAULT_IDEA_TTL_DAYS)),
        }
    }
}

#[derive(Clone)]
pub struct GenerationService {
    pub(super) repos: Repositories,
    pub(super) llm: Arc<dyn LlmProvider>,
    pub(super) resolver: PromptResolver,
    pub(super) persistence: PersistenceCoordinator,
    pub(super) settings: GenerationSettings,
}

impl GenerationService {
    pub fn new(
        repos: Repositories,
        llm: Arc<dyn LlmProvider>,
        cache: Option<Arc<PromptCache>>,
        settings: GenerationSettings,
    ) -> Self {
        let resolver = PromptResolver::new(repos.prompts.clone(), cache);
        let persistence = PersistenceCoordinator::new(repos.ideas.clone(), repos.drafts.clone());
        Self {
            repos,
            llm,
            resolver,
            persistence,
            settings,
        }
    }

    /// Sends one prompt, abandoning the call if the request dies while it is in flight.
    pub(super) async fn invoke_llm(
        &self,
        ctx: &RequestContext,
        prompt: &str,
        system: &str,
    ) -> Result<String, GenerationError> {
        debug!("Sending prompt to LLM ({} chars)", prompt.len());
        let response = ctx.guard(self.llm.send(prompt, system)).await?;
        debug!("LLM responded ({} chars)", response.len());
        Ok(response)
    }

    pub async fn create_topic(
        &self,
        ctx: &RequestContext,
        topic: Topic,
    ) -> Result<Topic, GenerationError> {
        validate_topic(&topic)?;
        ctx.check()?;
        self.repos.topics.create(&topic).await?;
        info!("Created topic '{}' for user {}", topic.name, topic.user_id);
        Ok(topic)
    }

    pub async fn list_ideas(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
    ) -> Result<Vec<Idea>, GenerationError> {
        ctx.guard(self.repos.ideas.find_by_user(user_id)).await
    }

    pub async fn clear_ideas(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
    ) -> Result<u64, GenerationError> {
        ctx.check()?;
        let deleted = self.repos.ideas.clear_by_user(user_id).await?;
        info!("Cleared {deleted} ideas for user {user_id}");
        Ok(deleted)
    }

    /// Marks an idea used after a draft batch reported `PartialSuccess`. Safe to repeat.
    pub async fn retry_mark_idea_used(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        idea_id: Uuid,
    ) -> Result<Idea, GenerationError> {
        let idea = ctx
            .guard(self.repos.ideas.find_by_id(idea_id))
            .await?
            .ok_or_else(|| GenerationError::not_found("idea", idea_id))?;
        if idea.user_id != user_id {
            return Err(GenerationError::OwnershipMismatch);
        }
        self.persistence.retry_mark_used(ctx, idea).await
    }

    pub async fn transition_draft_status(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        draft_id: Uuid,
        to: DraftStatus,
        publish: Option<PublishMetadata>,
    ) -> Result<Draft, GenerationError> {
        let draft = ctx
            .guard(self.repos.drafts.find_by_id(draft_id))
            .await?
            .ok_or_else(|| GenerationError::not_found("draft", draft_id))?;
        if draft.user_id != user_id {
            return Err(GenerationError::OwnershipMismatch);
        }
        self.persistence
            .transition_status(ctx, draft, to, publish)
            .await
    }
}
