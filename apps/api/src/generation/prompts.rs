// Built-in prompt templates.
// The defaults are stored as ordinary prompt rows by `seed_default_prompts` and go
// through the same template rules as user prompts. The refinement template is
// internal and filled with `template::fill`.

/// Default `ideas` template seeded for new users.
pub const DEFAULT_IDEAS_TEMPLATE: &str = "Generate {count} LinkedIn post ideas about {name}.

Write every idea in this language: {language}.
Keywords to draw from: {[keywords]}
Related topics worth connecting: {[related_topics]}

Each idea must be one concrete, specific sentence a professional could turn into a post. \
Avoid generic advice and avoid repeating the same angle twice.";

/// Default `drafts` template seeded for new users.
pub const DEFAULT_DRAFTS_TEMPLATE: &str = "Turn the following idea into LinkedIn content.

TOPIC: {topic_name}
IDEA: {content}

ABOUT THE AUTHOR:
{user_context}

Write 5 distinct short posts, each with its own hook, and 1 long-form article that develops \
the idea in depth. Match the author's tone and expertise. Write in the same language as the idea.";

/// Refinement request. Filled with `draft_type`, `content`, `history` and `instruction`.
pub const REFINEMENT_PROMPT_TEMPLATE: &str = "Refine this LinkedIn {draft_type}.

CURRENT VERSION:
{content}

PREVIOUS REFINEMENTS (oldest first, each request with the version it produced):
{history}

NEW REQUEST:
{instruction}

Apply the new request to the current version and return the complete rewritten {draft_type}.";
