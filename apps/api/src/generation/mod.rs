// Content generation core: prompt resolution, template rendering, validation,
// the idea/draft/refinement workflows and their ordered persistence.
// All LLM calls go through the `LlmProvider` seam in llm_client.

pub mod cancellation;
pub mod drafts;
pub mod handlers;
pub mod ideas;
pub mod parsing;
pub mod persistence;
pub mod prompt_library;
pub mod prompts;
pub mod refinement;
pub mod resolver;
pub mod service;
pub mod template;
pub mod validator;

#[cfg(test)]
pub mod test_support;
