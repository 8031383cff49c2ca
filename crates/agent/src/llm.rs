use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::{json, Value};

use leadline_core::config::{LlmConfig, LlmProvider};

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Hosted-model client. Speaks the OpenAI-compatible chat endpoint for
/// `openai` and `ollama`, and the messages endpoint for `anthropic`.
pub struct ChatCompletionClient {
    http: reqwest::Client,
    provider: LlmProvider,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatCompletionClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("building llm http client")?;

        let base_url = match (&config.base_url, config.provider) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, LlmProvider::OpenAi) => "https://api.openai.com".to_string(),
            (None, LlmProvider::Anthropic) => "https://api.anthropic.com".to_string(),
            (None, LlmProvider::Ollama) => "http://localhost:11434".to_string(),
        };

        Ok(Self {
            http,
            provider: config.provider,
            base_url,
            api_key: config.api_key.as_ref().map(|key| key.expose_secret().to_string()),
            model: config.model.clone(),
        })
    }

    async fn complete_chat(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0,
        });

        let mut request = self.http.post(&url).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.context("llm request failed")?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("llm endpoint returned status {status}"));
        }

        let payload: Value = response.json().await.context("llm response was not json")?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("llm response missing message content"))
    }

    async fn complete_messages(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = json!({
            "model": self.model,
            "max_tokens": 512,
            "messages": [{"role": "user", "content": prompt}],
        });

        let mut request = self
            .http
            .post(&url)
            .header("anthropic-version", "2023-06-01")
            .json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.header("x-api-key", api_key);
        }

        let response = request.send().await.context("llm request failed")?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("llm endpoint returned status {status}"));
        }

        let payload: Value = response.json().await.context("llm response was not json")?;
        payload["content"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("llm response missing text content"))
    }
}

#[async_trait]
impl LlmClient for ChatCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        match self.provider {
            LlmProvider::OpenAi | LlmProvider::Ollama => self.complete_chat(prompt).await,
            LlmProvider::Anthropic => self.complete_messages(prompt).await,
        }
    }
}
