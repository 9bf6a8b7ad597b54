//! Parsers for raw LLM responses. The LLM client returns one string per call;
//! everything about its shape is decided here.

use serde::Deserialize;

use crate::errors::GenerationError;
use crate::llm_client::strip_json_fences;

#[derive(Deserialize)]
#[serde(untagged)]
enum IdeaItem {
    Text(String),
    Object {
        #[serde(alias = "idea", alias = "text")]
        content: String,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdeaPayload {
    List(Vec<IdeaItem>),
    Wrapped { ideas: Vec<IdeaItem> },
}

/// Candidate idea strings, in the order the model produced them. Not yet trimmed or validated.
pub fn parse_idea_candidates(response: &str) -> Result<Vec<String>, GenerationError> {
    let text = strip_json_fences(response);
    if text.is_empty() {
        return Err(GenerationError::LlmResponseInvalid("empty response".to_string()));
    }

    let payload: IdeaPayload = serde_json::from_str(text).map_err(|e| {
        GenerationError::LlmResponseInvalid(format!("could not parse idea list: {e}"))
    })?;

    let items = match payload {
        IdeaPayload::List(items) | IdeaPayload::Wrapped { ideas: items } => items,
    };
    if items.is_empty() {
        return Err(GenerationError::LlmResponseInvalid(
            "response contained no ideas".to_string(),
        ));
    }

    Ok(items
        .into_iter()
        .map(|item| match item {
            IdeaItem::Text(text) => text,
            IdeaItem::Object { content } => content,
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftPayload {
    pub posts: Vec<String>,
    pub articles: Vec<String>,
}

#[derive(Deserialize)]
struct RawDraftPayload {
    #[serde(default)]
    posts: Vec<String>,
    #[serde(default)]
    articles: Vec<String>,
    #[serde(default)]
    article: Option<String>,
}

/// Accepts `{"posts": [...], "articles": [...]}` and the singular `"article": "..."` form.
/// Counts are not checked here.
pub fn parse_draft_batch(response: &str) -> Result<DraftPayload, GenerationError> {
    let text = strip_json_fences(response);
    if text.is_empty() {
        return Err(GenerationError::LlmResponseInvalid("empty response".to_string()));
    }

    let raw: RawDraftPayload = serde_json::from_str(text).map_err(|e| {
        GenerationError::LlmResponseInvalid(format!("could not parse draft batch: {e}"))
    })?;

    let mut articles = raw.articles;
    articles.extend(raw.article);

    if raw.posts.is_empty() && articles.is_empty() {
        return Err(GenerationError::LlmResponseInvalid(
            "response contained no drafts".to_string(),
        ));
    }

    Ok(DraftPayload {
        posts: raw.posts,
        articles,
    })
}

#[derive(Deserialize)]
struct RawRefinement {
    content: String,
}

/// Refined content, either as `{"content": "..."}` or as the bare text.
pub fn parse_refinement(response: &str) -> Result<String, GenerationError> {
    let text = strip_json_fences(response);
    if text.is_empty() {
        return Err(GenerationError::LlmResponseInvalid("empty response".to_string()));
    }

    let content = if text.starts_with('{') {
        serde_json::from_str::<RawRefinement>(text)
            .map_err(|e| {
                GenerationError::LlmResponseInvalid(format!("could not parse refinement: {e}"))
            })?
            .content
    } else {
        text.to_string()
    };

    let content = content.trim();
    if content.is_empty() {
        return Err(GenerationError::LlmResponseInvalid(
            "refinement was empty".to_string(),
        ));
    }
    Ok(content.to_string())
}
