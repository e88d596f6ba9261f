use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::analysis::pipeline::{
    PipelineConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_QUESTION_COUNT, DEFAULT_RETRY_BACKOFF,
    DEFAULT_STAGE_TIMEOUT,
};
use crate::llm_client::{ModelConfig, DEFAULT_API_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub anthropic_api_url: String,
    pub llm_model: String,
    pub llm_max_tokens: u32,
    pub port: u16,
    pub rust_log: String,
    pub question_count: usize,
    /// Zero disables the per-stage deadline.
    pub stage_timeout_secs: u64,
    pub stage_max_attempts: u32,
    pub retry_backoff_ms: u64,
    pub max_upload_bytes: usize,
    pub disable_api: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            anthropic_api_url: std::env::var("ANTHROPIC_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            llm_max_tokens: parse_env("LLM_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            question_count: parse_env("QUESTION_COUNT", DEFAULT_QUESTION_COUNT)?,
            stage_timeout_secs: parse_env("STAGE_TIMEOUT_SECS", DEFAULT_STAGE_TIMEOUT.as_secs())?,
            stage_max_attempts: parse_env("STAGE_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
            retry_backoff_ms: parse_env(
                "RETRY_BACKOFF_MS",
                DEFAULT_RETRY_BACKOFF.as_millis() as u64,
            )?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            disable_api: parse_env("DISABLE_API", false)?,
        })
    }

    /// Orchestrator settings derived from the environment.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            question_count: self.question_count.max(1),
            stage_timeout: (self.stage_timeout_secs > 0)
                .then(|| Duration::from_secs(self.stage_timeout_secs)),
            max_attempts: self.stage_max_attempts.max(1),
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            api_url: self.anthropic_api_url.clone(),
            model: self.llm_model.clone(),
            max_tokens: self.llm_max_tokens,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} must be a valid {}", std::any::type_name::<T>()))
}
