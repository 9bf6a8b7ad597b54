//! Prompt Resolver. Picks the template a generation request runs with.
//!
//! Fallback chain:
//! 1. explicit name (a topic's prompt reference), if it names an active prompt of the right kind
//! 2. the user's most recently updated active prompt of the kind
//!    (tie-break: smallest id)
//! 3. `PromptNotFound`, carrying the attempted name
//!
//! `PromptCache` only short-circuits step 1 reads; results are identical without it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::GenerationError;
use crate::models::prompt::{Prompt, PromptKind};
use crate::repository::PromptRepository;

const CACHE_MAX_ENTRIES: u64 = 10_000;
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Read-through cache of prompts keyed by (user, name).
///
/// Fills are fenced by an invalidation counter: a caller takes `generation()`
/// before reading storage and hands it back to `put`. A fill that overlaps any
/// invalidation is dropped, so an entry read before a write never outlives it.
pub struct PromptCache {
    entries: Cache<(Uuid, String), Prompt>,
    invalidations: AtomicU64,
}

impl PromptCache {
    pub fn new() -> Self {
        Self::with_limits(CACHE_MAX_ENTRIES, CACHE_TTL)
    }

    pub fn with_limits(max_entries: u64, ttl: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();
        Self {
            entries,
            invalidations: AtomicU64::new(0),
        }
    }

    pub fn get(&self, user_id: Uuid, name: &str) -> Option<Prompt> {
        self.entries.get(&(user_id, name.to_string()))
    }

    /// Current invalidation count. Take it before reading the repository.
    pub fn generation(&self) -> u64 {
        self.invalidations.load(Ordering::SeqCst)
    }

    /// Stores `prompt` unless an invalidation happened since `seen` was taken.
    /// Returns whether the entry was kept.
    pub fn put(&self, prompt: &Prompt, seen: u64) -> bool {
        if self.generation() != seen {
            return false;
        }
        let key = (prompt.user_id, prompt.name.clone());
        self.entries.insert(key.clone(), prompt.clone());
        // An invalidation racing the insert may have removed the key before it landed.
        if self.generation() != seen {
            self.entries.invalidate(&key);
            return false;
        }
        true
    }

    pub fn invalidate(&self, user_id: Uuid, name: &str) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        self.entries.invalidate(&(user_id, name.to_string()));
    }

    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }
}

impl Default for PromptCache {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct PromptResolver {
    prompts: Arc<dyn PromptRepository>,
    cache: Option<Arc<PromptCache>>,
}

impl PromptResolver {
    pub fn new(prompts: Arc<dyn PromptRepository>, cache: Option<Arc<PromptCache>>) -> Self {
        Self { prompts, cache }
    }

    pub async fn resolve(
        &self,
        user_id: Uuid,
        kind: PromptKind,
        explicit_name: Option<&str>,
    ) -> Result<Prompt, GenerationError> {
        let explicit_name = explicit_name.map(str::trim).filter(|n| !n.is_empty());

        if let Some(name) = explicit_name {
            match self.find_by_name(user_id, name).await? {
                Some(prompt) if prompt.active && prompt.kind == kind => {
                    debug!("Resolved {kind} prompt '{name}' by explicit reference");
                    return Ok(prompt);
                }
                Some(prompt) => info!(
                    "Prompt '{name}' is not usable for {kind} (kind={}, active={}), falling back",
                    prompt.kind, prompt.active
                ),
                None => info!("Prompt '{name}' not found for user {user_id}, falling back"),
            }
        }

        let candidates = self.prompts.find_active_by_kind(user_id, kind).await?;
        match pick_most_recent(&candidates, kind) {
            Some(prompt) => {
                debug!("Resolved {kind} prompt '{}' by active fallback", prompt.name);
                Ok(prompt.clone())
            }
            None => Err(GenerationError::PromptNotFound {
                name: explicit_name.map(str::to_string),
                kind,
            }),
        }
    }

    async fn find_by_name(&self, user_id: Uuid, name: &str) -> Result<Option<Prompt>, GenerationError> {
        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(user_id, name)) {
            return Ok(Some(cached));
        }

        let seen = self.cache.as_ref().map(|c| c.generation());
        let found = self.prompts.find_by_name(user_id, name).await?;
        if let (Some(cache), Some(seen), Some(prompt)) = (&self.cache, seen, &found) {
            if !cache.put(prompt, seen) {
                debug!("Skipped caching prompt '{name}': invalidated during read");
            }
        }
        Ok(found)
    }
}

/// Most recently updated active prompt of `kind`; ties go to the smallest id.
pub fn pick_most_recent(candidates: &[Prompt], kind: PromptKind) -> Option<&Prompt> {
    candidates
        .iter()
        .filter(|p| p.active && p.kind == kind)
        .min_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.id.cmp(&b.id))
        })
}
