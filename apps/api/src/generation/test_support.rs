//! Shared fixtures for workflow tests: an in-memory store, a scripted LLM and a
//! service wired to both.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::generation::resolver::PromptCache;
use crate::generation::service::{GenerationService, GenerationSettings, Repositories};
use crate::llm_client::scripted::ScriptedLlm;
use crate::models::draft::{Draft, DraftStatus, DraftType};
use crate::models::idea::Idea;
use crate::models::prompt::{Prompt, PromptKind};
use crate::models::topic::Topic;
use crate::models::user::UserProfile;
use crate::repository::memory::MemoryStore;

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub llm: Arc<ScriptedLlm>,
    pub service: GenerationService,
    pub user_id: Uuid,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let llm = Arc::new(ScriptedLlm::new());
        let service = GenerationService::new(
            Repositories::from_store(store.clone()),
            llm.clone(),
            Some(Arc::new(PromptCache::new())),
            GenerationSettings::default(),
        );
        let user_id = Uuid::new_v4();
        store.insert_user(UserProfile {
            id: user_id,
            language: "es".to_string(),
            name: Some("Lucía Fernández".to_string()),
            expertise: Some("Marketing B2B".to_string()),
            tone: Some("cercano".to_string()),
        });
        Self {
            store,
            llm,
            service,
            user_id,
        }
    }

    pub fn reply(&self, response: impl Into<String>) {
        self.llm.push(response);
    }

    pub fn prompt(&self, name: &str, kind: PromptKind, template: &str) -> Prompt {
        let prompt = Prompt::new(self.user_id, name, kind, template);
        self.store.insert_prompt(prompt.clone());
        prompt
    }

    pub fn topic(&self, name: &str, ideas_count: i32, prompt_name: Option<&str>) -> Topic {
        let mut topic = Topic::new(self.user_id, name);
        topic.ideas_count = ideas_count;
        topic.prompt_name = prompt_name.map(str::to_string);
        self.store.insert_topic(topic.clone());
        topic
    }

    pub fn idea(&self, topic: &Topic, used: bool) -> Idea {
        let idea = Idea {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            topic_id: topic.id,
            topic_name: topic.name.clone(),
            content: "Cómo medir el retorno real de una campaña en LinkedIn".to_string(),
            used,
            expires_at: Some(Utc::now() + Duration::days(30)),
            created_at: Utc::now(),
        };
        self.store.insert_idea(idea.clone());
        idea
    }

    /// An idea owned by somebody else.
    pub fn foreign_idea(&self) -> Idea {
        let other = Topic::new(Uuid::new_v4(), "Ventas");
        let idea = Idea {
            id: Uuid::new_v4(),
            user_id: other.user_id,
            topic_id: other.id,
            topic_name: other.name.clone(),
            content: "Prospección en frío que no suena a spam".to_string(),
            used: false,
            expires_at: None,
            created_at: Utc::now(),
        };
        self.store.insert_idea(idea.clone());
        idea
    }

    pub fn draft(&self, idea: &Idea, draft_type: DraftType, status: DraftStatus) -> Draft {
        let mut draft = Draft::new(self.user_id, idea.id, draft_type, post_text(0));
        draft.status = status;
        self.store.insert_draft(draft.clone());
        draft
    }
}

/// A post body comfortably inside the post bounds.
pub fn post_text(n: usize) -> String {
    format!("Post número {n}: la mayoría de equipos mide clics, pero lo que importa es la conversación que empieza después.")
}

/// An article body comfortably inside the article bounds.
pub fn article_text() -> String {
    "Medir el retorno de LinkedIn exige separar visibilidad de impacto. ".repeat(8)
}

/// A draft batch response with `posts` posts and `articles` articles.
pub fn draft_batch_response(posts: usize, articles: usize) -> String {
    let posts: Vec<String> = (0..posts).map(post_text).collect();
    let articles: Vec<String> = (0..articles).map(|_| article_text()).collect();
    serde_json::json!({ "posts": posts, "articles": articles }).to_string()
}
