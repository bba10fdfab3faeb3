use super::traits::CompletionProvider;
use super::types::{AnalysisRequest, AnalysisResponse, AxonHealth, ChatRequest, ChatResponse};
use crate::error::ProviderError;
use std::future::Future;
use std::pin::Pin;

/// Provider wrapper that answers from `secondary` whenever `primary` fails.
///
/// One attempt per provider, no retries. The primary's error is logged and
/// dropped; callers see the secondary's answer (or its error).
pub struct FallbackProvider {
    primary: Box<dyn CompletionProvider>,
    secondary: Box<dyn CompletionProvider>,
}

impl FallbackProvider {
    pub fn new(
        primary: Box<dyn CompletionProvider>,
        secondary: Box<dyn CompletionProvider>,
    ) -> Self {
        Self { primary, secondary }
    }
}

impl CompletionProvider for FallbackProvider {
    fn name(&self) -> &str {
        self.primary.name()
    }

    fn health(&self) -> Pin<Box<dyn Future<Output = AxonHealth> + Send + '_>> {
        Box::pin(async move {
            let health = self.primary.health().await;
            if health.ok {
                return health;
            }

            tracing::warn!(
                primary = self.primary.name(),
                secondary = self.secondary.name(),
                error = health.error().unwrap_or("unknown"),
                "Primary provider unhealthy, reporting fallback health"
            );
            self.secondary.health().await
        })
    }

    fn analyze<'a>(
        &'a self,
        request: &'a AnalysisRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AnalysisResponse, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            match self.primary.analyze(request).await {
                Ok(response) => Ok(response),
                Err(err) => {
                    tracing::warn!(
                        primary = self.primary.name(),
                        secondary = self.secondary.name(),
                        "Analysis failed, switching to fallback provider: {err}"
                    );
                    self.secondary.analyze(request).await
                }
            }
        })
    }

    fn chat<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChatResponse, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            match self.primary.chat(request).await {
                Ok(response) => Ok(response),
                Err(err) => {
                    tracing::warn!(
                        primary = self.primary.name(),
                        secondary = self.secondary.name(),
                        "Chat failed, switching to fallback provider: {err}"
                    );
                    self.secondary.chat(request).await
                }
            }
        })
    }
}
