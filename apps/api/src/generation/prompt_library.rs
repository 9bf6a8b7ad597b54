//! Prompt library: the write side of user prompts.
//!
//! Every write re-validates the template against its kind and drops the cached
//! entry so the resolver never serves a stale template.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::GenerationError;
use crate::generation::prompts::{DEFAULT_DRAFTS_TEMPLATE, DEFAULT_IDEAS_TEMPLATE};
use crate::generation::resolver::PromptCache;
use crate::generation::validator::{validate_prompt_template, ValidationError};
use crate::models::prompt::{Prompt, PromptKind};
use crate::repository::{PromptRepository, RepositoryError};

/// Fields a prompt update may change. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptChanges {
    pub name: Option<String>,
    pub template: Option<String>,
    pub style: Option<String>,
}

#[derive(Clone)]
pub struct PromptLibrary {
    prompts: Arc<dyn PromptRepository>,
    cache: Option<Arc<PromptCache>>,
}

impl PromptLibrary {
    pub fn new(prompts: Arc<dyn PromptRepository>, cache: Option<Arc<PromptCache>>) -> Self {
        Self { prompts, cache }
    }

    pub async fn create_prompt(
        &self,
        user_id: Uuid,
        name: &str,
        kind: PromptKind,
        template: &str,
    ) -> Result<Prompt, GenerationError> {
        let name = validate_name(name)?;
        validate_prompt_template(template, kind)?;

        if self.prompts.find_by_name(user_id, name).await?.is_some() {
            return Err(duplicate_name(name));
        }

        let prompt = Prompt::new(user_id, name, kind, template);
        self.prompts
            .create(&prompt)
            .await
            .map_err(|e| map_name_conflict(e, name))?;
        self.invalidate(user_id, name);
        info!("Created {kind} prompt '{name}' for user {user_id}");
        Ok(prompt)
    }

    pub async fn update_prompt(
        &self,
        user_id: Uuid,
        prompt_id: Uuid,
        changes: PromptChanges,
    ) -> Result<Prompt, GenerationError> {
        let mut prompt = self.load_owned(user_id, prompt_id).await?;
        let previous_name = prompt.name.clone();

        if let Some(name) = changes.name.as_deref() {
            let name = validate_name(name)?;
            if name != prompt.name {
                if self.prompts.find_by_name(user_id, name).await?.is_some() {
                    return Err(duplicate_name(name));
                }
                prompt.name = name.to_string();
            }
        }
        if let Some(template) = changes.template {
            prompt.template = template;
        }
        if changes.style.is_some() {
            prompt.style = changes.style;
        }
        validate_prompt_template(&prompt.template, prompt.kind)?;
        prompt.updated_at = Utc::now();

        let name = prompt.name.clone();
        self.prompts
            .update(&prompt)
            .await
            .map_err(|e| map_name_conflict(e, &name))?;
        self.invalidate(user_id, &previous_name);
        self.invalidate(user_id, &prompt.name);
        info!("Updated prompt {prompt_id} ('{}')", prompt.name);
        Ok(prompt)
    }

    /// Soft delete: the row stays, the resolver stops picking it.
    pub async fn deactivate_prompt(
        &self,
        user_id: Uuid,
        prompt_id: Uuid,
    ) -> Result<Prompt, GenerationError> {
        let mut prompt = self.load_owned(user_id, prompt_id).await?;
        if !prompt.active {
            return Ok(prompt);
        }
        prompt.active = false;
        prompt.updated_at = Utc::now();
        self.prompts.update(&prompt).await?;
        self.invalidate(user_id, &prompt.name);
        info!("Deactivated prompt {prompt_id} ('{}')", prompt.name);
        Ok(prompt)
    }

    /// Gives a user one active prompt per kind they have none of. Returns the
    /// prompts that were created or reactivated.
    pub async fn seed_default_prompts(&self, user_id: Uuid) -> Result<Vec<Prompt>, GenerationError> {
        let mut seeded = Vec::new();
        for (kind, name, template) in [
            (PromptKind::Ideas, "default-ideas", DEFAULT_IDEAS_TEMPLATE),
            (PromptKind::Drafts, "default-drafts", DEFAULT_DRAFTS_TEMPLATE),
        ] {
            if !self.prompts.find_active_by_kind(user_id, kind).await?.is_empty() {
                continue;
            }

            let prompt = match self.prompts.find_by_name(user_id, name).await? {
                // A deactivated default keeps its row; bring it back with the current template.
                Some(mut existing) => {
                    existing.active = true;
                    existing.kind = kind;
                    existing.template = template.to_string();
                    existing.updated_at = Utc::now();
                    self.prompts.update(&existing).await?;
                    existing
                }
                None => {
                    let prompt = Prompt::new(user_id, name, kind, template);
                    self.prompts.create(&prompt).await?;
                    prompt
                }
            };
            self.invalidate(user_id, name);
            seeded.push(prompt);
        }

        if !seeded.is_empty() {
            info!("Seeded {} default prompts for user {user_id}", seeded.len());
        }
        Ok(seeded)
    }

    async fn load_owned(&self, user_id: Uuid, prompt_id: Uuid) -> Result<Prompt, GenerationError> {
        let prompt = self
            .prompts
            .find_by_id(prompt_id)
            .await?
            .ok_or_else(|| GenerationError::not_found("prompt", prompt_id))?;
        if prompt.user_id != user_id {
            return Err(GenerationError::OwnershipMismatch);
        }
        Ok(prompt)
    }

    fn invalidate(&self, user_id: Uuid, name: &str) {
        if let Some(cache) = &self.cache {
            cache.invalidate(user_id, name);
            debug!("Prompt cache now holds {} entries", cache.len());
        }
    }
}

fn validate_name(name: &str) -> Result<&str, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::TooShort {
            field: "prompt name",
            min: 1,
            actual: 0,
        });
    }
    Ok(name)
}

fn duplicate_name(name: &str) -> GenerationError {
    ValidationError::AlreadyExists {
        field: "prompt name",
        value: name.to_string(),
    }
    .into()
}

/// A uniqueness conflict from storage is the same user error as the pre-check.
fn map_name_conflict(err: RepositoryError, name: &str) -> GenerationError {
    match err {
        RepositoryError::Conflict(_) => duplicate_name(name),
        other => other.into(),
    }
}
