use super::health_cache::HealthCache;
use super::traits::CompletionProvider;
use super::types::{AnalysisRequest, AnalysisResponse, AxonHealth, ChatRequest, ChatResponse};
use crate::config::AxonMode;
use crate::error::ProviderError;
use tokio::sync::Mutex;

/// Single entry point for AXON calls.
///
/// Callers never choose between live and mock: the provider handed in at
/// construction already encodes that decision (see
/// [`create_adapter`](super::factory::create_adapter)). The adapter adds the
/// time-boxed health cache on top.
pub struct AxonAdapter {
    provider: Box<dyn CompletionProvider>,
    mode: AxonMode,
    /// Held across the refresh so concurrent callers share one probe.
    health_cache: Mutex<HealthCache>,
}

impl AxonAdapter {
    pub fn new(
        provider: Box<dyn CompletionProvider>,
        mode: AxonMode,
        health_cache: HealthCache,
    ) -> Self {
        Self {
            provider,
            mode,
            health_cache: Mutex::new(health_cache),
        }
    }

    pub fn mode(&self) -> AxonMode {
        self.mode
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn health(&self) -> AxonHealth {
        let mut cache = self.health_cache.lock().await;
        if let Some(health) = cache.get() {
            tracing::debug!(provider = self.provider.name(), "AXON health served from cache");
            return health.clone();
        }

        let health = self.provider.health().await;
        tracing::debug!(
            provider = self.provider.name(),
            ok = health.ok,
            "AXON health refreshed"
        );
        cache.store(health.clone());
        health
    }

    /// Forget the cached health report; the next `health()` probes again.
    pub async fn invalidate_health(&self) {
        self.health_cache.lock().await.invalidate();
    }

    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResponse, ProviderError> {
        tracing::debug!(
            provider = self.provider.name(),
            mode = %request.mode,
            project_id = request.project_id.as_str(),
            "AXON analyze"
        );
        self.provider.analyze(request).await
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        tracing::debug!(
            provider = self.provider.name(),
            messages = request.messages.len(),
            project_id = request.project_id.as_str(),
            "AXON chat"
        );
        self.provider.chat(request).await
    }
}
