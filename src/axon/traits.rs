use super::types::{AnalysisRequest, AnalysisResponse, AxonHealth, ChatRequest, ChatResponse};
use crate::error::ProviderError;
use std::future::Future;
use std::pin::Pin;

/// A source of AXON completions: the live backend, the local mock, or a
/// composition of both.
///
/// `health` never fails; an unreachable backend reports `ok: false` with the
/// cause under `details.error`. `analyze` and `chat` surface failures to the
/// caller, which decides whether to fall back.
pub trait CompletionProvider: Send + Sync {
    /// Provider identifier used in logs (e.g. "axon", "axon-mock").
    fn name(&self) -> &str;

    fn health(&self) -> Pin<Box<dyn Future<Output = AxonHealth> + Send + '_>>;

    fn analyze<'a>(
        &'a self,
        request: &'a AnalysisRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AnalysisResponse, ProviderError>> + Send + 'a>>;

    fn chat<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChatResponse, ProviderError>> + Send + 'a>>;
}
