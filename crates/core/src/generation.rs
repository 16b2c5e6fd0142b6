//! Instruction templates for idiom content generation and validation of the
//! structured responses returned by the language model.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    Assistant,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// A provider-agnostic chat completion request (model is chosen by the client).
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    /// Ask the provider to constrain output to a JSON object.
    pub json_response: bool,
}

impl ChatPrompt {
    pub fn new(temperature: f32) -> Self {
        Self {
            messages: Vec::new(),
            temperature,
            json_response: true,
        }
    }

    pub fn message(mut self, role: ChatRole, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role,
            content: content.into(),
        });
        self
    }

    fn system_lines(self, lines: &[&str]) -> Self {
        lines
            .iter()
            .fold(self, |prompt, line| prompt.message(ChatRole::System, *line))
    }
}

const TUTOR_PERSONA: &[&str] = &[
    "You are an experienced English tutor writing material for learners whose first language is not English.",
    "Your answers must be original, natural and usable in real life.",
    "Prefer active voice and concrete, specific situations over abstract ones.",
];

/// `{"idiom": ..., "meaning": ...}` as embedded in user messages.
fn idiom_context(idiom: &str, meaning: &str) -> String {
    serde_json::json!({ "idiom": idiom, "meaning": meaning }).to_string()
}

/// Prompt used by the background queue: meanings, description and examples
/// for a brand-new idiom.
pub fn new_idiom_prompt(idiom: &str, meaning_hint: &str) -> ChatPrompt {
    ChatPrompt::new(0.8)
        .system_lines(TUTOR_PERSONA)
        .system_lines(&[
            "Your tasks: write a brief meaning, a full meaning, a description of a situation using the idiom, and 10 example sentences.",
            "The brief meaning should be about 120 letters.",
            "The full meaning should be about 1000 letters.",
            "The description should be about 300 letters.",
            "Each example sentence should be about 250 letters.",
            r#"Respond with JSON: {"idiom": string, "meaningBrief": string, "meaningFull": string, "description": string, "examples": [string]}"#,
        ])
        .message(
            ChatRole::User,
            format!(
                "Create a brief meaning, a full meaning, a description and 10 example sentences for this idiom: {}",
                idiom_context(idiom, meaning_hint)
            ),
        )
}

/// Prompt used to regenerate meanings and examples of an existing idiom.
pub fn examples_prompt(idiom: &str, meaning_hint: &str) -> ChatPrompt {
    ChatPrompt::new(1.4)
        .system_lines(TUTOR_PERSONA)
        .system_lines(&[
            "Your tasks: write a brief meaning, a full meaning with an exemplary situation, and 10 example sentences.",
            "Examples may be academic, casual or businesslike, like those in a good dictionary.",
            r#"Respond with JSON: {"idiom": string, "meaningBrief": string, "meaningFull": string, "examples": [string]}"#,
        ])
        .message(
            ChatRole::User,
            format!(
                "Create a brief meaning, a full meaning and 10 example sentences for {}",
                idiom_context(idiom, meaning_hint)
            ),
        )
}

/// Prompt used to write the situational description of an existing idiom.
pub fn description_prompt(idiom: &str, meaning_brief: &str) -> ChatPrompt {
    ChatPrompt::new(1.0)
        .system_lines(TUTOR_PERSONA)
        .system_lines(&[
            "Your task: write a description explaining a specific situation where this idiom is used.",
            "The description should be between 300 and 400 letters; every sentence under 20 words.",
            r#"Respond with JSON: {"description": string}"#,
        ])
        .message(
            ChatRole::User,
            format!(
                "Describe a situation suited to this idiom: {}",
                idiom_context(idiom, meaning_brief)
            ),
        )
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GenerationParseError {
    #[error("generated content is not valid JSON: {0}")]
    Malformed(String),

    #[error("generated content is missing `{0}`")]
    MissingField(&'static str),

    #[error("generated content has no examples")]
    NoExamples,
}

/// Content produced for one idiom.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedIdiom {
    #[serde(default)]
    pub idiom: String,
    #[serde(default)]
    pub meaning_brief: String,
    #[serde(default)]
    pub meaning_full: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratedDescription {
    #[serde(default)]
    pub description: String,
}

/// Remove a surrounding Markdown code fence (```` ```json ... ``` ````) if present.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn require(value: &str, field: &'static str) -> Result<(), GenerationParseError> {
    if value.trim().is_empty() {
        Err(GenerationParseError::MissingField(field))
    } else {
        Ok(())
    }
}

/// Parse and validate a generated idiom.
///
/// Blank example sentences are discarded; at least one must remain.
/// `require_description` is set for the queue variant, which publishes the
/// idiom straight away.
pub fn parse_generated_idiom(
    content: &str,
    require_description: bool,
) -> Result<GeneratedIdiom, GenerationParseError> {
    let mut generated: GeneratedIdiom = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| GenerationParseError::Malformed(e.to_string()))?;

    require(&generated.idiom, "idiom")?;
    require(&generated.meaning_brief, "meaningBrief")?;
    require(&generated.meaning_full, "meaningFull")?;
    if require_description {
        require(generated.description.as_deref().unwrap_or_default(), "description")?;
    }

    generated.examples.retain(|example| !example.trim().is_empty());
    if generated.examples.is_empty() {
        return Err(GenerationParseError::NoExamples);
    }
    Ok(generated)
}

pub fn parse_generated_description(content: &str) -> Result<String, GenerationParseError> {
    let generated: GeneratedDescription = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| GenerationParseError::Malformed(e.to_string()))?;
    require(&generated.description, "description")?;
    Ok(generated.description)
}
