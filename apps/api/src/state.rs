use std::sync::Arc;

use crate::config::Config;
use crate::generation::cancellation::RequestContext;
use crate::generation::prompt_library::PromptLibrary;
use crate::generation::resolver::PromptCache;
use crate::generation::service::{GenerationService, Repositories};
use crate::llm_client::LlmProvider;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub generation: GenerationService,
    pub prompts: PromptLibrary,
}

impl AppState {
    pub fn new(config: Config, repos: Repositories, llm: Arc<dyn LlmProvider>) -> Self {
        // Resolver and library must share one cache so writes invalidate what reads see.
        let cache = config
            .prompt_cache_enabled
            .then(|| Arc::new(PromptCache::new()));
        let prompts = PromptLibrary::new(repos.prompts.clone(), cache.clone());
        let generation =
            GenerationService::new(repos, llm, cache, config.generation_settings());
        Self {
            config,
            generation,
            prompts,
        }
    }

    /// Fresh per-request context carrying the configured generation deadline.
    pub fn request_context(&self) -> RequestContext {
        RequestContext::default().with_timeout(self.config.generation_timeout)
    }
}
