use anyhow::Result;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub openai: OpenAiConfig,
    pub database_url: Option<String>,
    pub upload_dir: String,
    pub portfolio_dir: String,
    pub documentation_dir: String,
    pub articles_dir: String,
    pub prompts_path: String,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Build the configuration from environment variables.
    /// Everything has a default except the API key, which may be empty
    /// (model calls then fail at request time, not at startup).
    pub fn from_env() -> Result<Self> {
        let api_key = env_or("OPENAI_API_KEY", "");
        if api_key.is_empty() {
            warn!("OPENAI_API_KEY is not set, model calls will fail");
        }

        let port: u16 = env_or("PORT", "5003")
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid PORT: {}", e))?;

        Ok(Self {
            host: env_or("HOST", "0.0.0.0"),
            port,
            openai: OpenAiConfig {
                api_key,
                base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com"),
                model: env_or("OPENAI_MODEL", "gpt-4o"),
                temperature: 0.7,
                max_tokens: 200,
            },
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            upload_dir: env_or("UPLOAD_DIR", "uploads"),
            portfolio_dir: env_or("PORTFOLIO_DIR", "portfolio"),
            documentation_dir: env_or("DOCUMENTATION_DIR", "documentation"),
            articles_dir: env_or("ARTICLES_DIR", "articles"),
            prompts_path: env_or("PROMPTS_PATH", "prompts/system_prompt.json"),
        })
    }
}
