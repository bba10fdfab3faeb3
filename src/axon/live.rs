//! HTTP client for a running AXON backend.
//!
//! The backend speaks an OpenAI-style chat-completions envelope for both chat
//! and analysis; this module normalizes it into the crate's own response
//! types. Failures are reported once and never retried here.

use super::scrub::{api_error, sanitize_api_error};
use super::traits::CompletionProvider;
use super::types::{
    AnalysisRequest, AnalysisResponse, AxonHealth, ChatMessage, ChatRequest, ChatResponse,
    MessageRole, Usage,
};
use crate::error::ProviderError;
use anyhow::Context;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use url::Url;

const PROVIDER_NAME: &str = "axon";

pub struct LiveProvider {
    base_url: String,
    /// Pre-computed endpoint URLs (avoids `format!` per request).
    cached_health_url: String,
    cached_chat_url: String,
    cached_analyze_url: String,
    /// Pre-computed `"Bearer <key>"` header value.
    cached_auth_header: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct CompletionEnvelope {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    created: Option<i64>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
    /// Some analysis deployments answer with a bare `content` field.
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    role: Option<MessageRole>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: Option<u64>,
}

impl From<WireUsage> for Usage {
    fn from(wire: WireUsage) -> Self {
        let mut usage = Usage::new(wire.prompt_tokens, wire.completion_tokens);
        if let Some(total) = wire.total_tokens {
            usage.total_tokens = total;
        }
        usage
    }
}

fn build_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(4)
        .build()
        .unwrap_or_else(|_| Client::new())
}

impl LiveProvider {
    pub fn new(base_url: &str, api_key: Option<&str>, timeout_secs: u64) -> anyhow::Result<Self> {
        let parsed =
            Url::parse(base_url).with_context(|| format!("invalid AXON base URL: {base_url}"))?;
        anyhow::ensure!(
            matches!(parsed.scheme(), "http" | "https"),
            "AXON base URL must be http(s), got {}",
            parsed.scheme()
        );

        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self {
            cached_health_url: format!("{base_url}/health"),
            cached_chat_url: format!("{base_url}/v1/chat/completions"),
            cached_analyze_url: format!("{base_url}/v1/analyze"),
            cached_auth_header: api_key
                .filter(|key| !key.is_empty())
                .map(|key| format!("Bearer {key}")),
            base_url,
            client: build_client(timeout_secs),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn apply_auth_header(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.cached_auth_header {
            Some(value) => req.header("Authorization", value),
            None => req,
        }
    }

    fn request_error(err: &reqwest::Error) -> ProviderError {
        ProviderError::Request {
            provider: PROVIDER_NAME.to_string(),
            message: sanitize_api_error(&err.to_string()),
        }
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
        response.json().await.map_err(|err| ProviderError::Decode {
            provider: PROVIDER_NAME.to_string(),
            message: sanitize_api_error(&err.to_string()),
        })
    }

    async fn fetch_health(&self) -> Result<AxonHealth, ProviderError> {
        let response = self
            .apply_auth_header(self.client.get(&self.cached_health_url))
            .send()
            .await
            .map_err(|err| Self::request_error(&err))?;

        if !response.status().is_success() {
            return Err(api_error(PROVIDER_NAME, response).await);
        }

        Self::decode(response).await
    }

    async fn post_completion<B: serde::Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<CompletionEnvelope, ProviderError> {
        let response = self
            .apply_auth_header(self.client.post(url).json(body))
            .send()
            .await
            .map_err(|err| Self::request_error(&err))?;

        if !response.status().is_success() {
            return Err(api_error(PROVIDER_NAME, response).await);
        }

        Self::decode(response).await
    }

    fn normalize_chat(envelope: CompletionEnvelope) -> Result<ChatResponse, ProviderError> {
        let choice = envelope
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::EmptyResponse {
                provider: PROVIDER_NAME.to_string(),
            })?;
        let content = choice
            .message
            .content
            .ok_or_else(|| ProviderError::EmptyResponse {
                provider: PROVIDER_NAME.to_string(),
            })?;

        Ok(ChatResponse {
            id: envelope
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            message: ChatMessage {
                role: choice.message.role.unwrap_or(MessageRole::Assistant),
                content,
            },
            usage: envelope.usage.map(Usage::from).unwrap_or_default(),
            model: envelope.model,
        })
    }

    fn normalize_analysis(envelope: CompletionEnvelope) -> Result<AnalysisResponse, ProviderError> {
        let content = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .or(envelope.content)
            .ok_or_else(|| ProviderError::EmptyResponse {
                provider: PROVIDER_NAME.to_string(),
            })?;

        Ok(AnalysisResponse {
            id: envelope
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            created_at: envelope
                .created
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .unwrap_or_else(Utc::now),
            content,
            usage: envelope.usage.map(Usage::from),
            model: envelope.model,
        })
    }
}

impl CompletionProvider for LiveProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn health(&self) -> Pin<Box<dyn Future<Output = AxonHealth> + Send + '_>> {
        Box::pin(async move {
            match self.fetch_health().await {
                Ok(health) => health,
                Err(err) => {
                    tracing::warn!(provider = PROVIDER_NAME, "AXON health check failed: {err}");
                    AxonHealth::unavailable(err.to_string())
                }
            }
        })
    }

    fn analyze<'a>(
        &'a self,
        request: &'a AnalysisRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AnalysisResponse, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            let envelope = self
                .post_completion(&self.cached_analyze_url, request)
                .await?;
            Self::normalize_analysis(envelope)
        })
    }

    fn chat<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChatResponse, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            let envelope = self.post_completion(&self.cached_chat_url, request).await?;
            Self::normalize_chat(envelope)
        })
    }
}
