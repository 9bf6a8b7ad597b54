//! Draft Refinement workflow.
//!
//! LoadDraft → CheckStatus → CheckRefinementLimit → InvokeLLM → ValidateContent →
//! AppendHistory + UpdateStatus (one write).

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::errors::GenerationError;
use crate::generation::cancellation::RequestContext;
use crate::generation::parsing::parse_refinement;
use crate::generation::prompts::REFINEMENT_PROMPT_TEMPLATE;
use crate::generation::service::GenerationService;
use crate::generation::template::fill;
use crate::generation::validator::{truncate_chars, validate_draft_content, ValidationError};
use crate::llm_client::prompts::REFINEMENT_SYSTEM;
use crate::models::draft::{Draft, RefinementEntry};

pub const MAX_REFINEMENTS: usize = 5;

impl GenerationService {
    pub async fn refine_draft(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        draft_id: Uuid,
        instruction: &str,
    ) -> Result<Draft, GenerationError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(ValidationError::TooShort {
                field: "instruction",
                min: 1,
                actual: 0,
            }
            .into());
        }

        let draft = ctx
            .guard(self.repos.drafts.find_by_id(draft_id))
            .await?
            .ok_or_else(|| GenerationError::not_found("draft", draft_id))?;
        if draft.user_id != user_id {
            return Err(GenerationError::OwnershipMismatch);
        }
        if !draft.status.is_refinable() {
            return Err(GenerationError::CannotRefine {
                status: draft.status,
            });
        }
        if draft.refinement_history.len() >= MAX_REFINEMENTS {
            return Err(GenerationError::RefinementLimitExceeded {
                limit: MAX_REFINEMENTS,
            });
        }

        let prompt = build_refinement_prompt(&draft, instruction);
        let response = self.invoke_llm(ctx, &prompt, REFINEMENT_SYSTEM).await?;
        let refined = parse_refinement(&response)?;
        validate_draft_content(draft.draft_type, &refined)
            .map_err(GenerationError::RefinedContentInvalid)?;

        let entry = RefinementEntry {
            prompt: instruction.to_string(),
            content: refined,
            version: draft.refinement_history.len() as u32 + 1,
            created_at: Utc::now(),
        };
        let version = entry.version;
        let refined = self.persistence.commit_refinement(ctx, draft, entry).await?;
        info!("Draft {draft_id} refined to version {version}");
        Ok(refined)
    }
}

/// Past versions are shown shortened; only the current version is sent in full.
const HISTORY_EXCERPT_CHARS: usize = 280;

fn excerpt(content: &str) -> String {
    let content = content.trim();
    let short = truncate_chars(content, HISTORY_EXCERPT_CHARS);
    if short.len() < content.len() {
        format!("{}...", short.trim_end())
    } else {
        short.to_string()
    }
}

fn build_refinement_prompt(draft: &Draft, instruction: &str) -> String {
    let history = if draft.refinement_history.is_empty() {
        "(none)".to_string()
    } else {
        draft
            .refinement_history
            .iter()
            .map(|entry| {
                format!(
                    "{}. Request: {}\n   Result: {}",
                    entry.version,
                    entry.prompt,
                    excerpt(&entry.content)
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    fill(
        REFINEMENT_PROMPT_TEMPLATE,
        &[
            ("draft_type", draft.draft_type.as_str()),
            ("content", draft.content.as_str()),
            ("history", history.as_str()),
            ("instruction", instruction),
        ],
    )
}
