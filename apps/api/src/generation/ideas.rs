//! Idea Generation workflow.
//!
//! ResolvePrompt → BuildPrompt → InvokeLLM → ParseAndValidate → Persist.
//! Invalid candidates are dropped one by one; only an empty result fails.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::GenerationError;
use crate::generation::cancellation::RequestContext;
use crate::generation::parsing::parse_idea_candidates;
use crate::generation::service::GenerationService;
use crate::generation::template::{self, Bindings};
use crate::generation::validator::{normalize_idea, validate_idea_content, MAX_IDEAS_COUNT};
use crate::llm_client::prompts::IDEAS_SYSTEM;
use crate::models::idea::Idea;
use crate::models::prompt::PromptKind;
use crate::models::topic::Topic;

impl GenerationService {
    pub async fn generate_ideas(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        topic_id: Uuid,
    ) -> Result<Vec<Idea>, GenerationError> {
        let topic = ctx
            .guard(self.repos.topics.find_by_id(topic_id))
            .await?
            .ok_or_else(|| GenerationError::not_found("topic", topic_id))?;
        if topic.user_id != user_id {
            return Err(GenerationError::OwnershipMismatch);
        }

        let prompt = ctx
            .guard(
                self.resolver
                    .resolve(user_id, PromptKind::Ideas, topic.prompt_name.as_deref()),
            )
            .await?;
        info!("Generating ideas for topic '{}' with prompt '{}'", topic.name, prompt.name);

        let profile = ctx
            .guard(self.repos.users.find_by_id(user_id))
            .await?
            .ok_or_else(|| GenerationError::not_found("user", user_id))?;

        let count = target_count(&topic, self.settings.default_idea_count);
        let bindings = idea_bindings(&topic, count, &profile.language);
        let rendered = template::resolve(&prompt.template, PromptKind::Ideas, &bindings)?;

        let response = self.invoke_llm(ctx, &rendered, IDEAS_SYSTEM).await?;
        let candidates = parse_idea_candidates(&response)?;
        let total = candidates.len();

        let accepted = accept_candidates(candidates, count);
        if accepted.is_empty() {
            warn!("All {total} idea candidates for topic '{}' were rejected", topic.name);
            return Err(GenerationError::NoValidIdeas);
        }
        info!("Accepted {} of {total} idea candidates", accepted.len());

        let now = Utc::now();
        let expires_at = self.settings.idea_ttl.map(|ttl| now + ttl);
        let ideas = accepted
            .into_iter()
            .map(|content| Idea {
                id: Uuid::new_v4(),
                user_id,
                topic_id: topic.id,
                topic_name: topic.name.clone(),
                content,
                used: false,
                expires_at,
                created_at: now,
            })
            .collect();

        self.persistence.save_ideas(ctx, ideas).await
    }
}

/// The topic's own count when set, otherwise `default`. Never above `MAX_IDEAS_COUNT`.
fn target_count(topic: &Topic, default: usize) -> usize {
    let count = if topic.ideas_count > 0 {
        topic.ideas_count as usize
    } else {
        default
    };
    count.clamp(1, MAX_IDEAS_COUNT as usize)
}

fn idea_bindings(topic: &Topic, count: usize, language: &str) -> Bindings {
    Bindings::new()
        .scalar("count", count.to_string())
        .scalar("name", topic.name.as_str())
        .scalar("language", language)
        .list("keywords", topic.keywords.iter().cloned())
        .list("related_topics", topic.related_topics.iter().cloned())
}

/// Trim, truncate to the maximum, drop what is still too short. Keeps model order
/// and stops at `limit`.
fn accept_candidates(candidates: Vec<String>, limit: usize) -> Vec<String> {
    candidates
        .iter()
        .filter_map(|candidate| normalize_idea(candidate))
        .filter(|idea| match validate_idea_content(idea) {
            Ok(()) => true,
            Err(e) => {
                warn!("Dropping idea candidate: {e}");
                false
            }
        })
        .take(limit)
        .collect()
}
