//! PostgreSQL adapter implementing every storage port with `sqlx`.
//!
//! Schema: `migrations/0001_content.sql`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::draft::{Draft, DraftStatus, DraftType, PublishMetadata, RefinementEntry};
use crate::models::idea::Idea;
use crate::models::prompt::{Prompt, PromptKind};
use crate::models::topic::Topic;
use crate::models::user::UserProfile;
use crate::repository::{
    DraftRepository, IdeaRepository, PromptRepository, RepoResult, RepositoryError,
    TopicRepository, UserProfileProvider,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, table: &'static str, id: Uuid) -> RepoResult<bool> {
        let query = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1)");
        Ok(sqlx::query_scalar(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Row types
// ────────────────────────────────────────────────────────────────────────────

fn corrupt(column: &str, value: &str) -> RepositoryError {
    RepositoryError::Database(format!("unexpected value '{value}' in column {column}"))
}

#[derive(FromRow)]
struct PromptRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    kind: String,
    template: String,
    active: bool,
    style: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PromptRow {
    fn into_domain(self) -> RepoResult<Prompt> {
        let kind = PromptKind::parse(&self.kind).ok_or_else(|| corrupt("prompts.kind", &self.kind))?;
        Ok(Prompt {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            kind,
            template: self.template,
            active: self.active,
            style: self.style,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct TopicRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    description: Option<String>,
    category: Option<String>,
    keywords: Vec<String>,
    related_topics: Vec<String>,
    priority: i32,
    ideas_count: i32,
    prompt_name: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TopicRow> for Topic {
    fn from(row: TopicRow) -> Self {
        Topic {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            description: row.description,
            category: row.category,
            keywords: row.keywords,
            related_topics: row.related_topics,
            priority: row.priority,
            ideas_count: row.ideas_count,
            prompt_name: row.prompt_name,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct IdeaRow {
    id: Uuid,
    user_id: Uuid,
    topic_id: Uuid,
    topic_name: String,
    content: String,
    used: bool,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<IdeaRow> for Idea {
    fn from(row: IdeaRow) -> Self {
        Idea {
            id: row.id,
            user_id: row.user_id,
            topic_id: row.topic_id,
            topic_name: row.topic_name,
            content: row.content,
            used: row.used,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct DraftRow {
    id: Uuid,
    user_id: Uuid,
    idea_id: Uuid,
    draft_type: String,
    content: String,
    status: String,
    refinement_history: Json<Vec<RefinementEntry>>,
    external_post_id: Option<String>,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DraftRow {
    fn into_domain(self) -> RepoResult<Draft> {
        let draft_type = DraftType::parse(&self.draft_type)
            .ok_or_else(|| corrupt("drafts.draft_type", &self.draft_type))?;
        let status =
            DraftStatus::parse(&self.status).ok_or_else(|| corrupt("drafts.status", &self.status))?;
        let publish = match (self.external_post_id, self.published_at) {
            (None, None) => None,
            (external_post_id, published_at) => Some(PublishMetadata {
                external_post_id,
                published_at,
            }),
        };
        Ok(Draft {
            id: self.id,
            user_id: self.user_id,
            idea_id: self.idea_id,
            draft_type,
            content: self.content,
            status,
            refinement_history: self.refinement_history.0,
            publish,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct UserProfileRow {
    id: Uuid,
    language: String,
    name: Option<String>,
    expertise: Option<String>,
    tone: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Prompts
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl PromptRepository for PgStore {
    async fn find_by_id(&self, prompt_id: Uuid) -> RepoResult<Option<Prompt>> {
        sqlx::query_as::<_, PromptRow>("SELECT * FROM prompts WHERE id = $1")
            .bind(prompt_id)
            .fetch_optional(&self.pool)
            .await?
            .map(PromptRow::into_domain)
            .transpose()
    }

    async fn find_by_name(&self, user_id: Uuid, name: &str) -> RepoResult<Option<Prompt>> {
        sqlx::query_as::<_, PromptRow>("SELECT * FROM prompts WHERE user_id = $1 AND name = $2")
            .bind(user_id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .map(PromptRow::into_domain)
            .transpose()
    }

    async fn find_active_by_kind(&self, user_id: Uuid, kind: PromptKind) -> RepoResult<Vec<Prompt>> {
        sqlx::query_as::<_, PromptRow>(
            r#"
            SELECT * FROM prompts
            WHERE user_id = $1 AND kind = $2 AND active
            ORDER BY updated_at DESC, id ASC
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(PromptRow::into_domain)
        .collect()
    }

    async fn create(&self, prompt: &Prompt) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO prompts
                (id, user_id, name, kind, template, active, style, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(prompt.id)
        .bind(prompt.user_id)
        .bind(&prompt.name)
        .bind(prompt.kind.as_str())
        .bind(&prompt.template)
        .bind(prompt.active)
        .bind(&prompt.style)
        .bind(prompt.created_at)
        .bind(prompt.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, prompt: &Prompt) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE prompts
            SET name = $2, kind = $3, template = $4, active = $5, style = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(prompt.id)
        .bind(&prompt.name)
        .bind(prompt.kind.as_str())
        .bind(&prompt.template)
        .bind(prompt.active)
        .bind(&prompt.style)
        .bind(prompt.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("prompt {}", prompt.id)));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Topics
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl TopicRepository for PgStore {
    async fn find_by_id(&self, topic_id: Uuid) -> RepoResult<Option<Topic>> {
        Ok(
            sqlx::query_as::<_, TopicRow>("SELECT * FROM topics WHERE id = $1")
                .bind(topic_id)
                .fetch_optional(&self.pool)
                .await?
                .map(Topic::from),
        )
    }

    async fn create(&self, topic: &Topic) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO topics
                (id, user_id, name, description, category, keywords, related_topics,
                 priority, ideas_count, prompt_name, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(topic.id)
        .bind(topic.user_id)
        .bind(&topic.name)
        .bind(&topic.description)
        .bind(&topic.category)
        .bind(&topic.keywords)
        .bind(&topic.related_topics)
        .bind(topic.priority)
        .bind(topic.ideas_count)
        .bind(&topic.prompt_name)
        .bind(topic.active)
        .bind(topic.created_at)
        .bind(topic.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Ideas
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl IdeaRepository for PgStore {
    async fn create_batch(&self, ideas: &[Idea]) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;
        for idea in ideas {
            sqlx::query(
                r#"
                INSERT INTO ideas
                    (id, user_id, topic_id, topic_name, content, used, expires_at, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(idea.id)
            .bind(idea.user_id)
            .bind(idea.topic_id)
            .bind(&idea.topic_name)
            .bind(&idea.content)
            .bind(idea.used)
            .bind(idea.expires_at)
            .bind(idea.created_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, idea_id: Uuid) -> RepoResult<Option<Idea>> {
        Ok(
            sqlx::query_as::<_, IdeaRow>("SELECT * FROM ideas WHERE id = $1")
                .bind(idea_id)
                .fetch_optional(&self.pool)
                .await?
                .map(Idea::from),
        )
    }

    async fn find_by_user(&self, user_id: Uuid) -> RepoResult<Vec<Idea>> {
        Ok(sqlx::query_as::<_, IdeaRow>(
            "SELECT * FROM ideas WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Idea::from)
        .collect())
    }

    async fn mark_used(&self, idea_id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("UPDATE ideas SET used = TRUE WHERE id = $1 AND used = FALSE")
            .bind(idea_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }
        if self.exists("ideas", idea_id).await? {
            Err(RepositoryError::Conflict(format!("idea {idea_id} is already used")))
        } else {
            Err(RepositoryError::NotFound(format!("idea {idea_id}")))
        }
    }

    async fn clear_by_user(&self, user_id: Uuid) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM ideas WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Drafts
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl DraftRepository for PgStore {
    async fn create_batch(&self, drafts: &[Draft]) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;
        for draft in drafts {
            sqlx::query(
                r#"
                INSERT INTO drafts
                    (id, user_id, idea_id, draft_type, content, status, refinement_history,
                     created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(draft.id)
            .bind(draft.user_id)
            .bind(draft.idea_id)
            .bind(draft.draft_type.as_str())
            .bind(&draft.content)
            .bind(draft.status.as_str())
            .bind(Json(&draft.refinement_history))
            .bind(draft.created_at)
            .bind(draft.updated_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, draft_id: Uuid) -> RepoResult<Option<Draft>> {
        sqlx::query_as::<_, DraftRow>("SELECT * FROM drafts WHERE id = $1")
            .bind(draft_id)
            .fetch_optional(&self.pool)
            .await?
            .map(DraftRow::into_domain)
            .transpose()
    }

    async fn find_by_idea(&self, idea_id: Uuid) -> RepoResult<Vec<Draft>> {
        sqlx::query_as::<_, DraftRow>(
            "SELECT * FROM drafts WHERE idea_id = $1 ORDER BY draft_type DESC, created_at",
        )
        .bind(idea_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(DraftRow::into_domain)
        .collect()
    }

    async fn append_refinement(
        &self,
        draft_id: Uuid,
        expected_history_len: usize,
        entry: &RefinementEntry,
    ) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE drafts
            SET content = $2,
                refinement_history = refinement_history || $3,
                status = 'refined',
                updated_at = now()
            WHERE id = $1
              AND jsonb_array_length(refinement_history) = $4
              AND status IN ('draft', 'refined')
            "#,
        )
        .bind(draft_id)
        .bind(&entry.content)
        .bind(Json(vec![entry.clone()]))
        .bind(expected_history_len as i32)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }
        if self.exists("drafts", draft_id).await? {
            Err(RepositoryError::Conflict(format!(
                "draft {draft_id} changed while it was being refined"
            )))
        } else {
            Err(RepositoryError::NotFound(format!("draft {draft_id}")))
        }
    }

    async fn update_status(
        &self,
        draft_id: Uuid,
        from: DraftStatus,
        to: DraftStatus,
        publish: Option<&PublishMetadata>,
    ) -> RepoResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE drafts
            SET status = $3,
                external_post_id = COALESCE($4, external_post_id),
                published_at = COALESCE($5, published_at),
                updated_at = now()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(draft_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(publish.and_then(|p| p.external_post_id.clone()))
        .bind(publish.and_then(|p| p.published_at))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }
        if self.exists("drafts", draft_id).await? {
            Err(RepositoryError::Conflict(format!(
                "draft {draft_id} is no longer in status '{from}'"
            )))
        } else {
            Err(RepositoryError::NotFound(format!("draft {draft_id}")))
        }
    }

    async fn delete_batch(&self, draft_ids: &[Uuid]) -> RepoResult<u64> {
        let result = sqlx::query("DELETE FROM drafts WHERE id = ANY($1)")
            .bind(draft_ids)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// User profiles
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl UserProfileProvider for PgStore {
    async fn find_by_id(&self, user_id: Uuid) -> RepoResult<Option<UserProfile>> {
        Ok(sqlx::query_as::<_, UserProfileRow>(
            "SELECT id, language, name, expertise, tone FROM user_profiles WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| UserProfile {
            id: row.id,
            language: row.language,
            name: row.name,
            expertise: row.expertise,
            tone: row.tone,
        }))
    }
}
