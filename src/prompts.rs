use std::fs;

use serde::Deserialize;
use tracing::{error, warn};

const DEFAULT_SYSTEM_PROMPT: &str =
    "Tu es un assistant virtuel représentant Lucas Bometon.";

const DEFAULT_RESPONSE_INSTRUCTIONS: &str =
    "Fournir des réponses courtes et concises.";

pub const OFF_TOPIC_RESPONSE: &str =
    "Je suis l'assistant virtuel de Lucas Bometon. Je suis désolé mais je ne suis \
     pas habilité à répondre à ce genre de question.";

pub const TECHNICAL_DIFFICULTY_RESPONSE: &str =
    "Je rencontre une difficulté technique. Merci de reformuler votre question.";

#[derive(Debug, Clone, Deserialize)]
struct PromptFile {
    #[serde(default)]
    system_prompt: String,
    #[serde(default)]
    response_instructions: String,
}

/// System prompt material for the single-agent responder.
#[derive(Debug, Clone)]
pub struct SystemPrompts {
    pub system_prompt: String,
    pub response_instructions: String,
}

impl SystemPrompts {
    /// Load from the JSON prompt file, falling back to built-in defaults
    /// when the file is missing or unreadable.
    pub fn load(path: &str) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<PromptFile>(&content) {
                Ok(file) => Self {
                    system_prompt: non_empty(file.system_prompt, DEFAULT_SYSTEM_PROMPT),
                    response_instructions: non_empty(
                        file.response_instructions,
                        DEFAULT_RESPONSE_INSTRUCTIONS,
                    ),
                },
                Err(e) => {
                    error!("Failed to parse prompt file {}: {}", path, e);
                    Self::default()
                }
            },
            Err(_) => {
                warn!("Prompt file not found at {}, using defaults", path);
                Self::default()
            }
        }
    }
}

impl Default for SystemPrompts {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            response_instructions: DEFAULT_RESPONSE_INSTRUCTIONS.to_string(),
        }
    }
}

fn non_empty(value: String, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let prompts = SystemPrompts::load("/nonexistent/system_prompt.json");
        assert_eq!(prompts.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_loads_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system_prompt.json");
        let mut f = fs::File::create(&path).unwrap();
        write!(
            f,
            r#"{{"system_prompt": "Prompt perso.", "response_instructions": "Sois bref."}}"#
        )
        .unwrap();
        drop(f);

        let prompts = SystemPrompts::load(path.to_str().unwrap());
        assert_eq!(prompts.system_prompt, "Prompt perso.");
        assert_eq!(prompts.response_instructions, "Sois bref.");
    }

    #[test]
    fn test_empty_fields_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system_prompt.json");
        fs::write(&path, r#"{"system_prompt": ""}"#).unwrap();

        let prompts = SystemPrompts::load(path.to_str().unwrap());
        assert_eq!(prompts.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(prompts.response_instructions, DEFAULT_RESPONSE_INSTRUCTIONS);
    }
}
