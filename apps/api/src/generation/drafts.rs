//! Draft Generation workflow.
//!
//! LoadIdea → CheckEligibility → ResolvePrompt → BuildContext → InvokeLLM →
//! ValidateCounts → PersistDrafts → MarkIdeaUsed.
//!
//! Eligibility is settled before any LLM call. The batch is fixed at five posts
//! and one article; one bad unit fails the whole batch.

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::GenerationError;
use crate::generation::cancellation::RequestContext;
use crate::generation::parsing::{parse_draft_batch, DraftPayload};
use crate::generation::persistence::DraftBatchOutcome;
use crate::generation::service::GenerationService;
use crate::generation::template::{self, Bindings};
use crate::generation::validator::validate_draft_content;
use crate::llm_client::prompts::DRAFTS_SYSTEM;
use crate::models::draft::{Draft, DraftType};
use crate::models::idea::Idea;
use crate::models::prompt::PromptKind;
use crate::models::user::UserProfile;

pub const POSTS_PER_BATCH: usize = 5;
pub const ARTICLES_PER_BATCH: usize = 1;

impl GenerationService {
    pub async fn generate_drafts(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        idea_id: Uuid,
    ) -> Result<DraftBatchOutcome, GenerationError> {
        let idea = ctx
            .guard(self.repos.ideas.find_by_id(idea_id))
            .await?
            .ok_or_else(|| GenerationError::not_found("idea", idea_id))?;
        check_eligibility(&idea, user_id, Utc::now())?;

        let prompt = ctx
            .guard(self.resolver.resolve(user_id, PromptKind::Drafts, None))
            .await?;
        info!("Generating drafts for idea {idea_id} with prompt '{}'", prompt.name);

        let profile = ctx.guard(self.repos.users.find_by_id(user_id)).await?;
        if profile.is_none() {
            warn!("No profile for user {user_id}, generating drafts without user context");
        }

        let bindings = Bindings::new()
            .scalar("content", idea.content.as_str())
            .scalar("topic_name", idea.topic_name.as_str())
            .scalar("user_context", build_user_context(profile.as_ref()));
        let rendered = template::resolve(&prompt.template, PromptKind::Drafts, &bindings)?;

        let response = self.invoke_llm(ctx, &rendered, DRAFTS_SYSTEM).await?;
        let payload = parse_draft_batch(&response)?;
        let drafts = build_batch(user_id, idea.id, payload)?;

        let outcome = self
            .persistence
            .save_drafts_then_mark_used(ctx, idea.id, drafts)
            .await?;
        match &outcome {
            DraftBatchOutcome::Complete { drafts } => {
                info!("Generated {} drafts for idea {idea_id}", drafts.len())
            }
            DraftBatchOutcome::PartialSuccess { reason, .. } => {
                warn!("Drafts for idea {idea_id} saved, idea not marked used: {reason}")
            }
        }
        Ok(outcome)
    }
}

/// Ownership, then usage, then expiry. Each failure is its own error kind.
pub fn check_eligibility(
    idea: &Idea,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<(), GenerationError> {
    if idea.user_id != user_id {
        return Err(GenerationError::OwnershipMismatch);
    }
    if idea.used {
        return Err(GenerationError::IdeaAlreadyUsed(idea.id));
    }
    if idea.is_expired(now) {
        return Err(GenerationError::IdeaExpired(idea.id));
    }
    Ok(())
}

/// Profile fields as a labelled block. Missing fields render empty.
pub fn build_user_context(profile: Option<&UserProfile>) -> String {
    let (name, expertise, tone) = match profile {
        Some(p) => (p.name.as_deref(), p.expertise.as_deref(), p.tone.as_deref()),
        None => (None, None, None),
    };
    format!(
        "Name: {}\nExpertise: {}\nTone: {}",
        name.unwrap_or_default(),
        expertise.unwrap_or_default(),
        tone.unwrap_or_default(),
    )
}

fn build_batch(
    user_id: Uuid,
    idea_id: Uuid,
    payload: DraftPayload,
) -> Result<Vec<Draft>, GenerationError> {
    let DraftPayload { posts, articles } = payload;
    if posts.len() != POSTS_PER_BATCH || articles.len() != ARTICLES_PER_BATCH {
        return Err(GenerationError::InsufficientDrafts {
            posts: posts.len(),
            articles: articles.len(),
        });
    }

    let typed = posts
        .into_iter()
        .map(|text| (DraftType::Post, text))
        .chain(articles.into_iter().map(|text| (DraftType::Article, text)));

    let mut drafts = Vec::with_capacity(POSTS_PER_BATCH + ARTICLES_PER_BATCH);
    for (index, (draft_type, text)) in typed.enumerate() {
        let text = text.trim().to_string();
        validate_draft_content(draft_type, &text).map_err(|source| {
            GenerationError::DraftValidationFailed {
                draft_type: draft_type.as_str(),
                index,
                source,
            }
        })?;
        drafts.push(Draft::new(user_id, idea_id, draft_type, text));
    }
    Ok(drafts)
}
