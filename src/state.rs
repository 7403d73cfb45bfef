use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::knowledge::KnowledgeBase;
use crate::llm::{LlmClient, OpenAiClient};
use crate::memory::SessionStore;
use crate::prompts::SystemPrompts;
use crate::team::PortfolioTeam;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub llm: Arc<dyn LlmClient>,
    pub team: Arc<PortfolioTeam>,
    pub knowledge: Arc<RwLock<KnowledgeBase>>,
    pub prompts: Arc<SystemPrompts>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let llm: Arc<dyn LlmClient> = Arc::new(OpenAiClient::new(
            config.openai.api_key.clone(),
            config.openai.base_url.clone(),
            config.openai.model.clone(),
            config.openai.temperature,
            config.openai.max_tokens,
        )?);

        let knowledge = Arc::new(RwLock::new(KnowledgeBase::load(&[
            config.portfolio_dir.as_str(),
            config.documentation_dir.as_str(),
        ])));

        let sessions = Arc::new(SessionStore::connect(config.database_url.as_deref()).await);
        tracing::info!("Session memory backend: {}", sessions.backend_name());

        let team = Arc::new(PortfolioTeam::new(llm.clone(), sessions));

        let prompts = Arc::new(SystemPrompts::load(&config.prompts_path));

        Ok(Self {
            config,
            llm,
            team,
            knowledge,
            prompts,
        })
    }
}
