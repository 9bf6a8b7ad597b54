//! In-process adapter for workflow tests. Writes are all-or-nothing per call,
//! and individual writes can be told to fail.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::draft::{Draft, DraftStatus, PublishMetadata, RefinementEntry};
use crate::models::idea::Idea;
use crate::models::prompt::{Prompt, PromptKind};
use crate::models::topic::Topic;
use crate::models::user::UserProfile;
use crate::repository::{
    DraftRepository, IdeaRepository, PromptRepository, RepoResult, RepositoryError,
    TopicRepository, UserProfileProvider,
};

#[derive(Default)]
pub struct MemoryStore {
    prompts: Mutex<HashMap<Uuid, Prompt>>,
    topics: Mutex<HashMap<Uuid, Topic>>,
    ideas: Mutex<HashMap<Uuid, Idea>>,
    drafts: Mutex<HashMap<Uuid, Draft>>,
    users: Mutex<HashMap<Uuid, UserProfile>>,
    prompt_reads: Mutex<usize>,
    pub fail_idea_batch: AtomicBool,
    pub fail_draft_batch: AtomicBool,
    pub fail_mark_used: AtomicBool,
    pub fail_refinement: AtomicBool,
    /// Flips `used` on the idea right before `mark_used` runs, as a racing request would.
    pub race_mark_used: AtomicBool,
    /// Fired once a draft batch has been stored, as a client hanging up mid-request would.
    cancel_after_draft_batch: Mutex<Option<CancellationToken>>,
    mark_used_calls: AtomicUsize,
}

fn injected(what: &str) -> RepositoryError {
    RepositoryError::Database(format!("injected failure: {what}"))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_prompt(&self, prompt: Prompt) {
        self.prompts.lock().unwrap().insert(prompt.id, prompt);
    }

    pub fn insert_topic(&self, topic: Topic) {
        self.topics.lock().unwrap().insert(topic.id, topic);
    }

    pub fn insert_idea(&self, idea: Idea) {
        self.ideas.lock().unwrap().insert(idea.id, idea);
    }

    pub fn insert_draft(&self, draft: Draft) {
        self.drafts.lock().unwrap().insert(draft.id, draft);
    }

    pub fn insert_user(&self, user: UserProfile) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn idea(&self, id: Uuid) -> Option<Idea> {
        self.ideas.lock().unwrap().get(&id).cloned()
    }

    pub fn draft(&self, id: Uuid) -> Option<Draft> {
        self.drafts.lock().unwrap().get(&id).cloned()
    }

    pub fn all_ideas(&self) -> Vec<Idea> {
        self.ideas.lock().unwrap().values().cloned().collect()
    }

    pub fn all_drafts(&self) -> Vec<Draft> {
        self.drafts.lock().unwrap().values().cloned().collect()
    }

    /// Number of `find_by_name` calls that reached the store.
    pub fn cancel_after_draft_batch(&self, token: CancellationToken) {
        *self.cancel_after_draft_batch.lock().unwrap() = Some(token);
    }

    pub fn mark_used_calls(&self) -> usize {
        self.mark_used_calls.load(Ordering::SeqCst)
    }

    pub fn prompt_reads(&self) -> usize {
        *self.prompt_reads.lock().unwrap()
    }
}

#[async_trait]
impl PromptRepository for MemoryStore {
    async fn find_by_id(&self, prompt_id: Uuid) -> RepoResult<Option<Prompt>> {
        Ok(self.prompts.lock().unwrap().get(&prompt_id).cloned())
    }

    async fn find_by_name(&self, user_id: Uuid, name: &str) -> RepoResult<Option<Prompt>> {
        *self.prompt_reads.lock().unwrap() += 1;
        Ok(self
            .prompts
            .lock()
            .unwrap()
            .values()
            .find(|p| p.user_id == user_id && p.name == name)
            .cloned())
    }

    async fn find_active_by_kind(&self, user_id: Uuid, kind: PromptKind) -> RepoResult<Vec<Prompt>> {
        Ok(self
            .prompts
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.user_id == user_id && p.kind == kind && p.active)
            .cloned()
            .collect())
    }

    async fn create(&self, prompt: &Prompt) -> RepoResult<()> {
        let mut prompts = self.prompts.lock().unwrap();
        if prompts
            .values()
            .any(|p| p.user_id == prompt.user_id && p.name == prompt.name)
        {
            return Err(RepositoryError::Conflict(format!(
                "prompt name '{}' already exists",
                prompt.name
            )));
        }
        prompts.insert(prompt.id, prompt.clone());
        Ok(())
    }

    async fn update(&self, prompt: &Prompt) -> RepoResult<()> {
        let mut prompts = self.prompts.lock().unwrap();
        if prompts
            .values()
            .any(|p| p.id != prompt.id && p.user_id == prompt.user_id && p.name == prompt.name)
        {
            return Err(RepositoryError::Conflict(format!(
                "prompt name '{}' already exists",
                prompt.name
            )));
        }
        match prompts.get_mut(&prompt.id) {
            Some(existing) => {
                *existing = prompt.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(format!("prompt {}", prompt.id))),
        }
    }
}

#[async_trait]
impl TopicRepository for MemoryStore {
    async fn find_by_id(&self, topic_id: Uuid) -> RepoResult<Option<Topic>> {
        Ok(self.topics.lock().unwrap().get(&topic_id).cloned())
    }

    async fn create(&self, topic: &Topic) -> RepoResult<()> {
        self.topics.lock().unwrap().insert(topic.id, topic.clone());
        Ok(())
    }
}

#[async_trait]
impl IdeaRepository for MemoryStore {
    async fn create_batch(&self, ideas: &[Idea]) -> RepoResult<()> {
        if self.fail_idea_batch.load(Ordering::SeqCst) {
            return Err(injected("idea batch"));
        }
        let mut stored = self.ideas.lock().unwrap();
        for idea in ideas {
            stored.insert(idea.id, idea.clone());
        }
        Ok(())
    }

    async fn find_by_id(&self, idea_id: Uuid) -> RepoResult<Option<Idea>> {
        Ok(self.ideas.lock().unwrap().get(&idea_id).cloned())
    }

    async fn find_by_user(&self, user_id: Uuid) -> RepoResult<Vec<Idea>> {
        let mut ideas: Vec<Idea> = self
            .ideas
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        ideas.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ideas)
    }

    async fn mark_used(&self, idea_id: Uuid) -> RepoResult<()> {
        self.mark_used_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_mark_used.load(Ordering::SeqCst) {
            return Err(injected("mark used"));
        }
        let mut ideas = self.ideas.lock().unwrap();
        let idea = ideas
            .get_mut(&idea_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("idea {idea_id}")))?;
        if self.race_mark_used.load(Ordering::SeqCst) {
            idea.used = true;
        }
        if idea.used {
            return Err(RepositoryError::Conflict(format!("idea {idea_id} is already used")));
        }
        idea.used = true;
        Ok(())
    }

    async fn clear_by_user(&self, user_id: Uuid) -> RepoResult<u64> {
        let mut ideas = self.ideas.lock().unwrap();
        let before = ideas.len();
        ideas.retain(|_, idea| idea.user_id != user_id);
        Ok((before - ideas.len()) as u64)
    }
}

#[async_trait]
impl DraftRepository for MemoryStore {
    async fn create_batch(&self, drafts: &[Draft]) -> RepoResult<()> {
        if self.fail_draft_batch.load(Ordering::SeqCst) {
            return Err(injected("draft batch"));
        }
        {
            let mut stored = self.drafts.lock().unwrap();
            for draft in drafts {
                stored.insert(draft.id, draft.clone());
            }
        }
        if let Some(token) = self.cancel_after_draft_batch.lock().unwrap().take() {
            token.cancel();
        }
        Ok(())
    }

    async fn find_by_id(&self, draft_id: Uuid) -> RepoResult<Option<Draft>> {
        Ok(self.drafts.lock().unwrap().get(&draft_id).cloned())
    }

    async fn find_by_idea(&self, idea_id: Uuid) -> RepoResult<Vec<Draft>> {
        Ok(self
            .drafts
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.idea_id == idea_id)
            .cloned()
            .collect())
    }

    async fn append_refinement(
        &self,
        draft_id: Uuid,
        expected_history_len: usize,
        entry: &RefinementEntry,
    ) -> RepoResult<()> {
        if self.fail_refinement.load(Ordering::SeqCst) {
            return Err(injected("refinement"));
        }
        let mut drafts = self.drafts.lock().unwrap();
        let draft = drafts
            .get_mut(&draft_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("draft {draft_id}")))?;
        if draft.refinement_history.len() != expected_history_len || !draft.status.is_refinable() {
            return Err(RepositoryError::Conflict(format!(
                "draft {draft_id} changed while it was being refined"
            )));
        }
        draft.content = entry.content.clone();
        draft.refinement_history.push(entry.clone());
        draft.status = DraftStatus::Refined;
        draft.updated_at = Utc::now();
        Ok(())
    }

    async fn update_status(
        &self,
        draft_id: Uuid,
        from: DraftStatus,
        to: DraftStatus,
        publish: Option<&PublishMetadata>,
    ) -> RepoResult<()> {
        let mut drafts = self.drafts.lock().unwrap();
        let draft = drafts
            .get_mut(&draft_id)
            .ok_or_else(|| RepositoryError::NotFound(format!("draft {draft_id}")))?;
        if draft.status != from {
            return Err(RepositoryError::Conflict(format!(
                "draft {draft_id} is no longer in status '{from}'"
            )));
        }
        draft.status = to;
        if let Some(publish) = publish {
            draft.publish = Some(publish.clone());
        }
        draft.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_batch(&self, draft_ids: &[Uuid]) -> RepoResult<u64> {
        let mut drafts = self.drafts.lock().unwrap();
        let mut deleted = 0;
        for id in draft_ids {
            if drafts.remove(id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

#[async_trait]
impl UserProfileProvider for MemoryStore {
    async fn find_by_id(&self, user_id: Uuid) -> RepoResult<Option<UserProfile>> {
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }
}
