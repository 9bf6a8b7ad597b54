//! Template Processor: substitutes typed bindings into a prompt template.
//!
//! # Syntax
//!
//! - `{name}`: scalar reference
//! - `{[keywords]}`: array reference, rendered as `a, b, c`
//!
//! An identifier is ASCII letters, digits and `_`, not starting with a digit.
//! Anything else between braces (JSON examples, `{}`) and an opening `{` with
//! no closing `}` are copied through untouched.
//!
//! Missing scalar bindings and empty arrays render as the empty string.
//! Referencing a variable outside the kind's supported set is the only failure.

use std::collections::HashMap;

use thiserror::Error;

use crate::models::prompt::PromptKind;

const IDEA_VARIABLES: &[&str] = &["count", "name", "language", "keywords", "related_topics"];
const DRAFT_VARIABLES: &[&str] = &["content", "topic_name", "user_context"];

const LIST_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown variable '{name}' for {kind} templates")]
    UnknownVariable { name: String, kind: PromptKind },
}

/// Variables a template of `kind` may reference.
pub fn supported_variables(kind: PromptKind) -> &'static [&'static str] {
    match kind {
        PromptKind::Ideas => IDEA_VARIABLES,
        PromptKind::Drafts => DRAFT_VARIABLES,
    }
}

pub fn is_supported(kind: PromptKind, name: &str) -> bool {
    supported_variables(kind).contains(&name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Scalar(String),
    List(Vec<String>),
}

impl Binding {
    fn render(&self) -> String {
        match self {
            Binding::Scalar(value) => value.clone(),
            Binding::List(items) => items.join(LIST_SEPARATOR),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    values: HashMap<String, Binding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalar(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), Binding::Scalar(value.into()));
        self
    }

    pub fn list<I, S>(mut self, name: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = items.into_iter().map(Into::into).collect();
        self.values.insert(name.into(), Binding::List(items));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.values.get(name)
    }
}

/// A piece of a scanned template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Reference {
        name: &'a str,
        array: bool,
        /// Byte offset of the opening `{`.
        position: usize,
    },
}

/// Splits a template into literal text and variable references in one pass.
pub fn scan(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(offset) = template[cursor..].find('{') {
        let open = cursor + offset;
        let Some(close_offset) = template[open + 1..].find('}') else {
            break;
        };
        let close = open + 1 + close_offset;

        match parse_reference(&template[open + 1..close]) {
            Some((name, array)) => {
                if literal_start < open {
                    segments.push(Segment::Text(&template[literal_start..open]));
                }
                segments.push(Segment::Reference {
                    name,
                    array,
                    position: open,
                });
                literal_start = close + 1;
                cursor = close + 1;
            }
            // Not a reference: keep the brace as text and rescan after it, so
            // `{ {count}` still finds `{count}`.
            None => cursor = open + 1,
        }
    }

    if literal_start < template.len() {
        segments.push(Segment::Text(&template[literal_start..]));
    }
    segments
}

fn parse_reference(inner: &str) -> Option<(&str, bool)> {
    let (name, array) = match inner.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some(name) => (name, true),
        None => (inner, false),
    };
    is_identifier(name).then_some((name, array))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Resolves every reference in `template` against `bindings`.
///
/// Pure: identical inputs always produce identical output.
pub fn resolve(
    template: &str,
    kind: PromptKind,
    bindings: &Bindings,
) -> Result<String, TemplateError> {
    let mut rendered = String::with_capacity(template.len());

    for segment in scan(template) {
        match segment {
            Segment::Text(text) => rendered.push_str(text),
            Segment::Reference { name, .. } => {
                if !is_supported(kind, name) {
                    return Err(TemplateError::UnknownVariable {
                        name: name.to_string(),
                        kind,
                    });
                }
                if let Some(binding) = bindings.get(name) {
                    rendered.push_str(&binding.render());
                }
            }
        }
    }

    Ok(rendered)
}

/// Fills a fixed internal template from `values` in a single pass.
///
/// Unlike `resolve` there is no kind check: references without a value are
/// written back as they appeared. Inserted values are never rescanned, so user
/// text containing `{...}` cannot pull in other values.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut rendered = String::with_capacity(template.len());

    for segment in scan(template) {
        match segment {
            Segment::Text(text) => rendered.push_str(text),
            Segment::Reference { name, array, .. } => {
                match values.iter().find(|(key, _)| *key == name) {
                    Some((_, value)) => rendered.push_str(value),
                    None if array => {
                        rendered.push_str("{[");
                        rendered.push_str(name);
                        rendered.push_str("]}");
                    }
                    None => {
                        rendered.push('{');
                        rendered.push_str(name);
                        rendered.push('}');
                    }
                }
            }
        }
    }

    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idea_bindings() -> Bindings {
        Bindings::new()
            .scalar("count", "3")
            .scalar("name", "Marketing Digital")
            .scalar("language", "es")
            .list("keywords", ["SEO", "SEM", "Analytics"])
            .list("related_topics", Vec::<String>::new())
    }

    #[test]
    fn test_scalar_substitution() {
        let out = resolve(
            "Genera {count} ideas sobre {name}",
            PromptKind::Ideas,
            &idea_bindings(),
        )
        .unwrap();
        assert_eq!(out, "Genera 3 ideas sobre Marketing Digital");
    }

    #[test]
    fn test_array_reference_joins_in_order() {
        let out = resolve("Keywords: {[keywords]}", PromptKind::Ideas, &idea_bindings()).unwrap();
        assert_eq!(out, "Keywords: SEO, SEM, Analytics");
    }

    #[test]
    fn test_plain_reference_to_list_also_joins() {
        let out = resolve("{keywords}", PromptKind::Ideas, &idea_bindings()).unwrap();
        assert_eq!(out, "SEO, SEM, Analytics");
    }

    #[test]
    fn test_empty_array_renders_empty() {
        let out = resolve("[{[related_topics]}]", PromptKind::Ideas, &idea_bindings()).unwrap();
        assert_eq!(out, "[]");
    }

    #[test]
    fn test_single_element_array_has_no_separator() {
        let bindings = Bindings::new().list("keywords", ["Rust"]);
        let out = resolve("{[keywords]}", PromptKind::Ideas, &bindings).unwrap();
        assert_eq!(out, "Rust");
    }

    #[test]
    fn test_missing_scalar_renders_empty() {
        let out = resolve("Idioma: {language}.", PromptKind::Ideas, &Bindings::new()).unwrap();
        assert_eq!(out, "Idioma: .");
    }

    #[test]
    fn test_unknown_variable_fails() {
        let err = resolve("Hola {content}", PromptKind::Ideas, &idea_bindings()).unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnknownVariable {
                name: "content".to_string(),
                kind: PromptKind::Ideas
            }
        );
    }

    #[test]
    fn test_draft_kind_rejects_idea_variables() {
        let err = resolve("{count}", PromptKind::Drafts, &Bindings::new()).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownVariable { .. }));
    }

    #[test]
    fn test_unclosed_brace_left_untouched() {
        let out = resolve("Genera {count ideas", PromptKind::Ideas, &idea_bindings()).unwrap();
        assert_eq!(out, "Genera {count ideas");
    }

    #[test]
    fn test_non_identifier_braces_left_untouched() {
        let template = r#"Return {"ideas": ["..."]} about {name}"#;
        let out = resolve(template, PromptKind::Ideas, &idea_bindings()).unwrap();
        assert_eq!(out, r#"Return {"ideas": ["..."]} about Marketing Digital"#);
    }

    #[test]
    fn test_reference_after_stray_open_brace_is_found() {
        let out = resolve("{ {count}", PromptKind::Ideas, &idea_bindings()).unwrap();
        assert_eq!(out, "{ 3");
    }

    #[test]
    fn test_empty_braces_and_digit_names_are_text() {
        let out = resolve("{} {1st}", PromptKind::Ideas, &idea_bindings()).unwrap();
        assert_eq!(out, "{} {1st}");
    }

    #[test]
    fn test_non_ascii_text_is_preserved() {
        let out = resolve(
            "¿Qué opinas de {name}? 🚀",
            PromptKind::Ideas,
            &idea_bindings(),
        )
        .unwrap();
        assert_eq!(out, "¿Qué opinas de Marketing Digital? 🚀");
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let template = "Genera {count} ideas sobre {name} ({[keywords]}) en {language}";
        let bindings = idea_bindings();
        let first = resolve(template, PromptKind::Ideas, &bindings).unwrap();
        let second = resolve(template, PromptKind::Ideas, &bindings).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fill_does_not_rescan_inserted_values() {
        let out = fill(
            "Draft: {content}\nInstruction: {instruction}",
            &[("content", "uses {instruction} literally"), ("instruction", "shorter")],
        );
        assert_eq!(out, "Draft: uses {instruction} literally\nInstruction: shorter");
    }

    #[test]
    fn test_fill_keeps_references_without_values() {
        assert_eq!(fill("{a} {[b]} {c}", &[("c", "x")]), "{a} {[b]} x");
    }

    #[test]
    fn test_scan_reports_reference_positions() {
        let segments = scan("ab{name}c{[keywords]}");
        assert_eq!(
            segments,
            vec![
                Segment::Text("ab"),
                Segment::Reference {
                    name: "name",
                    array: false,
                    position: 2
                },
                Segment::Text("c"),
                Segment::Reference {
                    name: "keywords",
                    array: true,
                    position: 9
                },
            ]
        );
    }
}
