use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::llm::{ChatMessage, LlmClient};
use crate::memory::SessionStore;
use crate::prompts::{OFF_TOPIC_RESPONSE, TECHNICAL_DIFFICULTY_RESPONSE};
use crate::utils::sanitizer::clean_response;

use super::descriptors::{descriptor_for, AgentKind};
use super::router::{route, Route};

const CALENDLY_URL: &str = "https://calendly.com/lbometon2/30min?month=2025-04";

/// Number of prior session turns replayed into the prompt.
const HISTORY_TURNS: u32 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    pub url: String,
    pub metadata: serde_json::Value,
}

impl Action {
    fn calendly() -> Self {
        Self {
            kind: "calendly".to_string(),
            label: "Prendre rendez-vous".to_string(),
            url: CALENDLY_URL.to_string(),
            metadata: serde_json::json!({
                "duration": "30min",
                "type": "consultation",
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseEnvelope {
    pub response: String,
    pub context: String,
    pub session_id: Option<String>,
    pub actions: Vec<Action>,
}

/// The agent team: routes each query to a persona, runs the model with
/// that persona's prompt (plus knowledge context and session history),
/// and cleans the output before it leaves the service.
pub struct PortfolioTeam {
    llm: Arc<dyn LlmClient>,
    store: Arc<SessionStore>,
}

impl PortfolioTeam {
    pub fn new(llm: Arc<dyn LlmClient>, store: Arc<SessionStore>) -> Self {
        Self { llm, store }
    }

    /// Generate a response envelope for one user query.
    ///
    /// Model failures never escape: they degrade to the canned
    /// technical-difficulty envelope.
    pub async fn generate_response(
        &self,
        query: &str,
        context: &str,
        session_id: Option<String>,
    ) -> ResponseEnvelope {
        info!("Team query: '{}'", query);

        let continues_session = match session_id.as_deref() {
            Some(id) => self.store.has_messages(id).await,
            None => false,
        };

        let (kind, tagged_query) = match route(query, continues_session) {
            Route::OffTopic => {
                info!("Query classified off-topic");
                return ResponseEnvelope {
                    response: OFF_TOPIC_RESPONSE.to_string(),
                    context: context.to_string(),
                    session_id,
                    actions: Vec::new(),
                };
            }
            Route::Agent { kind, tagged_query } => (kind, tagged_query),
        };

        let descriptor = descriptor_for(kind);
        info!("Routing query to {} ({})", descriptor.name, descriptor.role);

        // Memory-enabled agents always run under a session.
        let session_id = if descriptor.uses_memory {
            Some(session_id.unwrap_or_else(|| Uuid::new_v4().to_string()))
        } else {
            session_id
        };

        let mut messages = Vec::new();
        if !context.is_empty() {
            messages.push(ChatMessage::system(format!(
                "Contexte pertinent pour la question : {}",
                context
            )));
        }

        if descriptor.uses_memory {
            if let Some(id) = session_id.as_deref() {
                match self.store.history(id, HISTORY_TURNS).await {
                    Ok(history) => {
                        for msg in history {
                            messages.push(match msg.role.as_str() {
                                "assistant" => ChatMessage::assistant(msg.content),
                                _ => ChatMessage::user(msg.content),
                            });
                        }
                    }
                    Err(e) => warn!("Failed to load session history for {}: {}", id, e),
                }
            }
        }

        messages.push(ChatMessage::user(tagged_query));

        let system = descriptor.full_system_prompt();
        let raw = match self.llm.chat(messages, Some(&system)).await {
            Ok(raw) => raw,
            Err(e) => {
                error!("Model call failed for {}: {}", descriptor.name, e);
                return ResponseEnvelope {
                    response: TECHNICAL_DIFFICULTY_RESPONSE.to_string(),
                    context: context.to_string(),
                    session_id,
                    actions: Vec::new(),
                };
            }
        };

        let response = clean_response(&raw, query);

        if descriptor.uses_memory {
            if let Some(id) = session_id.as_deref() {
                if let Err(e) = self.store.append(id, "user", query).await {
                    warn!("Failed to save user message: {}", e);
                }
                if let Err(e) = self.store.append(id, "assistant", &response).await {
                    warn!("Failed to save assistant message: {}", e);
                }
            }
        }

        let mut actions = Vec::new();
        if kind == AgentKind::Commercial || query.to_lowercase().contains("rdv") {
            actions.push(Action::calendly());
        }

        ResponseEnvelope {
            response,
            context: context.to_string(),
            session_id,
            actions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use dashmap::DashMap;

    struct FixedLlm {
        reply: String,
    }

    #[async_trait]
    impl LlmClient for FixedLlm {
        async fn chat(&self, _messages: Vec<ChatMessage>, _system: Option<&str>) -> Result<String> {
            Ok(self.reply.clone())
        }
    }

    struct RecordingLlm {
        seen: std::sync::Mutex<Vec<ChatMessage>>,
    }

    #[async_trait]
    impl LlmClient for RecordingLlm {
        async fn chat(&self, messages: Vec<ChatMessage>, _system: Option<&str>) -> Result<String> {
            *self.seen.lock().unwrap() = messages;
            Ok("Réponse enregistrée pour le test.".to_string())
        }
    }

    struct FailingLlm;

    #[async_trait]
    impl LlmClient for FailingLlm {
        async fn chat(&self, _messages: Vec<ChatMessage>, _system: Option<&str>) -> Result<String> {
            Err(anyhow::anyhow!("connection refused"))
        }
    }

    fn team_with(llm: Arc<dyn LlmClient>) -> PortfolioTeam {
        PortfolioTeam::new(llm, Arc::new(SessionStore::Memory(DashMap::new())))
    }

    #[tokio::test]
    async fn test_off_topic_short_circuits() {
        let team = team_with(Arc::new(FixedLlm { reply: "ne devrait pas être appelé".into() }));
        let envelope = team
            .generate_response("quelle est la distance Terre-Lune", "", None)
            .await;
        assert_eq!(envelope.response, OFF_TOPIC_RESPONSE);
        assert!(envelope.actions.is_empty());
    }

    #[tokio::test]
    async fn test_commercial_gets_session_and_action() {
        let team = team_with(Arc::new(FixedLlm {
            reply: "Quel est le périmètre de votre projet ?".into(),
        }));
        let envelope = team
            .generate_response("j'ai un projet de chatbot", "", None)
            .await;
        assert!(envelope.session_id.is_some());
        assert_eq!(envelope.actions.len(), 1);
        assert_eq!(envelope.actions[0].kind, "calendly");
        assert!(envelope.response.contains("périmètre"));
    }

    #[tokio::test]
    async fn test_commercial_persists_turns() {
        let store = Arc::new(SessionStore::Memory(DashMap::new()));
        let team = PortfolioTeam::new(
            Arc::new(FixedLlm { reply: "Pouvez-vous préciser le budget envisagé ?".into() }),
            store.clone(),
        );

        let envelope = team
            .generate_response("j'ai un projet d'application IA", "", None)
            .await;
        let session_id = envelope.session_id.unwrap();

        let history = store.history(&session_id, 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[1].role, "assistant");

        // Same session continues with the commercial agent regardless of wording.
        let followup = team
            .generate_response("plutôt en septembre", "", Some(session_id.clone()))
            .await;
        assert_eq!(followup.session_id.as_deref(), Some(session_id.as_str()));
        assert_eq!(followup.actions.len(), 1);
    }

    #[tokio::test]
    async fn test_history_replay_preserves_roles() {
        let store = Arc::new(SessionStore::Memory(DashMap::new()));
        store.append("s-1", "user", "j'ai un projet").await.unwrap();
        store.append("s-1", "assistant", "Quel budget ?").await.unwrap();

        let llm = Arc::new(RecordingLlm { seen: std::sync::Mutex::new(Vec::new()) });
        let team = PortfolioTeam::new(llm.clone(), store);
        team.generate_response("on vise octobre", "", Some("s-1".to_string()))
            .await;

        let seen = llm.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].role, "user");
        assert_eq!(seen[0].content, "j'ai un projet");
        assert_eq!(seen[1].role, "assistant");
        assert_eq!(seen[1].content, "Quel budget ?");
        assert_eq!(seen[2].role, "user");
    }

    #[tokio::test]
    async fn test_model_failure_degrades_to_canned_response() {
        let team = team_with(Arc::new(FailingLlm));
        let envelope = team.generate_response("bonjour", "", None).await;
        assert_eq!(envelope.response, TECHNICAL_DIFFICULTY_RESPONSE);
    }

    #[tokio::test]
    async fn test_response_has_no_calendly_link_but_action_does() {
        let team = team_with(Arc::new(FixedLlm {
            reply: "Discutons-en. [Prendre rendez-vous](https://calendly.com/lbometon2/30min) \
                    Je reste disponible."
                .into(),
        }));
        let envelope = team.generate_response("besoin d'un rdv", "", None).await;
        assert!(!envelope.response.contains("calendly.com"));
        assert_eq!(envelope.actions[0].url, CALENDLY_URL);
    }

    #[tokio::test]
    async fn test_context_is_echoed() {
        let team = team_with(Arc::new(FixedLlm { reply: "Réponse suffisamment longue.".into() }));
        let envelope = team
            .generate_response("bonjour", "Lucas est Lead IA Designer.", None)
            .await;
        assert_eq!(envelope.context, "Lucas est Lead IA Designer.");
    }
}
