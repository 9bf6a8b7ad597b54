//! Content Validator: length, count and syntax rules for generated units,
//! prompt templates and topics.
//!
//! All lengths are counted in Unicode scalar values, never bytes: most content
//! is Spanish and routinely carries accents and emoji.

use thiserror::Error;

use crate::generation::template::{is_supported, scan, Segment};
use crate::models::draft::DraftType;
use crate::models::prompt::PromptKind;
use crate::models::topic::Topic;

pub const MIN_IDEA_LEN: usize = 10;
pub const MAX_IDEA_LEN: usize = 200;

pub const MIN_TEMPLATE_LEN: usize = 10;
pub const MAX_TEMPLATE_LEN: usize = 5000;

pub const MIN_POST_LEN: usize = 50;
pub const MAX_POST_LEN: usize = 3000;
pub const MIN_ARTICLE_LEN: usize = 300;
pub const MAX_ARTICLE_LEN: usize = 110_000;

pub const MIN_TOPIC_NAME_LEN: usize = 2;
pub const MAX_TOPIC_NAME_LEN: usize = 100;
pub const MAX_KEYWORDS: usize = 10;
pub const MAX_RELATED_TOPICS: usize = 10;
pub const MIN_PRIORITY: i32 = 1;
pub const MAX_PRIORITY: i32 = 10;
pub const MAX_IDEAS_COUNT: i32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is too short: {actual} characters (minimum {min})")]
    TooShort {
        field: &'static str,
        min: usize,
        actual: usize,
    },

    #[error("{field} is too long: {actual} characters (maximum {max})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("template has an unclosed '{{' at byte {position}")]
    UnclosedDelimiter { position: usize },

    #[error("template references unknown variable '{name}' for {kind} prompts")]
    UnknownVariable { name: String, kind: PromptKind },

    #[error("{field} must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: &'static str,
        min: i32,
        max: i32,
        actual: i32,
    },

    #[error("{field} has {actual} entries (maximum {max})")]
    TooMany {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("{field} '{value}' already exists")]
    AlreadyExists { field: &'static str, value: String },
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn check_length(field: &'static str, text: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let actual = char_len(text.trim());
    if actual < min {
        return Err(ValidationError::TooShort { field, min, actual });
    }
    if actual > max {
        return Err(ValidationError::TooLong { field, max, actual });
    }
    Ok(())
}

/// Cuts `text` to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

pub fn validate_idea_content(text: &str) -> Result<(), ValidationError> {
    check_length("idea", text, MIN_IDEA_LEN, MAX_IDEA_LEN)
}

/// Trim-then-truncate policy for generated ideas.
///
/// Returns `None` for candidates that are blank. The result is never longer
/// than `MAX_IDEA_LEN`; it may still be too short and must go through
/// `validate_idea_content`.
pub fn normalize_idea(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(truncate_chars(trimmed, MAX_IDEA_LEN).trim_end().to_string())
}

pub fn validate_draft_content(draft_type: DraftType, text: &str) -> Result<(), ValidationError> {
    match draft_type {
        DraftType::Post => check_length("post", text, MIN_POST_LEN, MAX_POST_LEN),
        DraftType::Article => check_length("article", text, MIN_ARTICLE_LEN, MAX_ARTICLE_LEN),
    }
}

/// Length bounds, balanced `{`/`}` and known variables only.
pub fn validate_prompt_template(text: &str, kind: PromptKind) -> Result<(), ValidationError> {
    check_length("template", text, MIN_TEMPLATE_LEN, MAX_TEMPLATE_LEN)?;

    let mut open = Vec::new();
    for (position, ch) in text.char_indices() {
        match ch {
            '{' => open.push(position),
            '}' => {
                open.pop();
            }
            _ => {}
        }
    }
    if let Some(&position) = open.first() {
        return Err(ValidationError::UnclosedDelimiter { position });
    }

    for segment in scan(text) {
        if let Segment::Reference { name, .. } = segment {
            if !is_supported(kind, name) {
                return Err(ValidationError::UnknownVariable {
                    name: name.to_string(),
                    kind,
                });
            }
        }
    }
    Ok(())
}

pub fn validate_topic(topic: &Topic) -> Result<(), ValidationError> {
    check_length("topic name", &topic.name, MIN_TOPIC_NAME_LEN, MAX_TOPIC_NAME_LEN)?;

    if topic.keywords.len() > MAX_KEYWORDS {
        return Err(ValidationError::TooMany {
            field: "keywords",
            max: MAX_KEYWORDS,
            actual: topic.keywords.len(),
        });
    }
    if topic.related_topics.len() > MAX_RELATED_TOPICS {
        return Err(ValidationError::TooMany {
            field: "related_topics",
            max: MAX_RELATED_TOPICS,
            actual: topic.related_topics.len(),
        });
    }
    if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&topic.priority) {
        return Err(ValidationError::OutOfRange {
            field: "priority",
            min: MIN_PRIORITY,
            max: MAX_PRIORITY,
            actual: topic.priority,
        });
    }
    // <= 0 means "use the default count"
    if topic.ideas_count > MAX_IDEAS_COUNT {
        return Err(ValidationError::OutOfRange {
            field: "ideas_count",
            min: 0,
            max: MAX_IDEAS_COUNT,
            actual: topic.ideas_count,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_idea_within_bounds_passes() {
        assert!(validate_idea_content("Cómo medir el ROI de tus campañas en LinkedIn").is_ok());
    }

    #[test]
    fn test_idea_too_short_after_trim() {
        let err = validate_idea_content("   corto   ").unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooShort {
                field: "idea",
                min: MIN_IDEA_LEN,
                actual: 5
            }
        );
    }

    #[test]
    fn test_idea_too_long() {
        let err = validate_idea_content(&"a".repeat(MAX_IDEA_LEN + 1)).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { actual: 201, .. }));
    }

    #[test]
    fn test_length_counts_chars_not_bytes() {
        // 200 two-byte chars: 400 bytes, still within the limit
        let text = "ñ".repeat(MAX_IDEA_LEN);
        assert_eq!(text.len(), 400);
        assert!(validate_idea_content(&text).is_ok());
    }

    #[test]
    fn test_emoji_counted_as_single_chars() {
        let text = "🚀".repeat(MIN_IDEA_LEN);
        assert!(validate_idea_content(&text).is_ok());
    }

    #[test]
    fn test_normalize_truncates_to_exact_limit() {
        let text = "á".repeat(241);
        let normalized = normalize_idea(&text).unwrap();
        assert_eq!(char_len(&normalized), MAX_IDEA_LEN);
        assert!(validate_idea_content(&normalized).is_ok());
    }

    #[test]
    fn test_normalize_drops_blank_candidates() {
        assert_eq!(normalize_idea("   \n\t "), None);
        assert_eq!(normalize_idea(""), None);
    }

    #[test]
    fn test_normalize_keeps_short_candidates_for_validation() {
        let normalized = normalize_idea("  hola  ").unwrap();
        assert_eq!(normalized, "hola");
        assert!(validate_idea_content(&normalized).is_err());
    }

    #[test]
    fn test_normalized_output_never_exceeds_limit() {
        let samples = [
            "Cinco errores comunes al delegar en equipos remotos".to_string(),
            "x".repeat(1000),
            format!("  {}  ", "palabra ".repeat(60)),
            "🎯 ".repeat(150),
        ];
        for sample in samples {
            let normalized = normalize_idea(&sample).unwrap();
            assert!(char_len(&normalized) <= MAX_IDEA_LEN);
            if char_len(sample.trim()) >= MIN_IDEA_LEN {
                assert!(validate_idea_content(&normalized).is_ok(), "{sample:?}");
            }
        }
    }

    #[test]
    fn test_truncate_chars_on_char_boundary() {
        assert_eq!(truncate_chars("añob", 2), "añ");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_post_bounds() {
        assert!(validate_draft_content(DraftType::Post, &"p".repeat(MIN_POST_LEN)).is_ok());
        assert!(validate_draft_content(DraftType::Post, &"p".repeat(MIN_POST_LEN - 1)).is_err());
        assert!(validate_draft_content(DraftType::Post, &"p".repeat(MAX_POST_LEN + 1)).is_err());
    }

    #[test]
    fn test_article_needs_long_form_minimum() {
        let post_sized = "a".repeat(MIN_POST_LEN);
        assert!(matches!(
            validate_draft_content(DraftType::Article, &post_sized),
            Err(ValidationError::TooShort { field: "article", .. })
        ));
        assert!(validate_draft_content(DraftType::Article, &"a".repeat(MIN_ARTICLE_LEN)).is_ok());
    }

    #[test]
    fn test_template_with_known_variables_passes() {
        assert!(validate_prompt_template(
            "Genera {count} ideas sobre {name} usando {[keywords]}",
            PromptKind::Ideas
        )
        .is_ok());
    }

    #[test]
    fn test_template_with_unclosed_delimiter_fails() {
        let err = validate_prompt_template("Genera {count ideas sobre algo", PromptKind::Ideas)
            .unwrap_err();
        assert_eq!(err, ValidationError::UnclosedDelimiter { position: 7 });
    }

    #[test]
    fn test_template_with_unknown_variable_fails() {
        let err =
            validate_prompt_template("Escribe sobre {topic_name}", PromptKind::Ideas).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownVariable { ref name, .. } if name == "topic_name"));
    }

    #[test]
    fn test_template_with_json_example_passes() {
        let template = r#"Idea: {content}. Responde {"posts": ["..."], "articles": ["..."]}"#;
        assert!(validate_prompt_template(template, PromptKind::Drafts).is_ok());
    }

    #[test]
    fn test_template_length_bounds() {
        assert!(matches!(
            validate_prompt_template("{name}", PromptKind::Ideas),
            Err(ValidationError::TooShort { .. })
        ));
        assert!(matches!(
            validate_prompt_template(&"x".repeat(MAX_TEMPLATE_LEN + 1), PromptKind::Ideas),
            Err(ValidationError::TooLong { .. })
        ));
    }

    fn topic() -> Topic {
        let mut topic = Topic::new(Uuid::new_v4(), "Marketing Digital");
        topic.keywords = vec!["SEO".into(), "SEM".into()];
        topic
    }

    #[test]
    fn test_valid_topic_passes() {
        assert!(validate_topic(&topic()).is_ok());
    }

    #[test]
    fn test_topic_name_bounds() {
        let mut t = topic();
        t.name = "a".into();
        assert!(matches!(validate_topic(&t), Err(ValidationError::TooShort { .. })));
        t.name = "a".repeat(MAX_TOPIC_NAME_LEN + 1);
        assert!(matches!(validate_topic(&t), Err(ValidationError::TooLong { .. })));
    }

    #[test]
    fn test_topic_keyword_limit() {
        let mut t = topic();
        t.keywords = (0..=MAX_KEYWORDS).map(|i| format!("k{i}")).collect();
        assert!(matches!(
            validate_topic(&t),
            Err(ValidationError::TooMany { field: "keywords", .. })
        ));
    }

    #[test]
    fn test_topic_priority_range() {
        let mut t = topic();
        t.priority = 0;
        assert!(matches!(
            validate_topic(&t),
            Err(ValidationError::OutOfRange { field: "priority", .. })
        ));
        t.priority = MAX_PRIORITY;
        assert!(validate_topic(&t).is_ok());
    }

    #[test]
    fn test_topic_zero_ideas_count_means_default() {
        let mut t = topic();
        t.ideas_count = 0;
        assert!(validate_topic(&t).is_ok());
        t.ideas_count = MAX_IDEAS_COUNT + 1;
        assert!(validate_topic(&t).is_err());
    }
}
