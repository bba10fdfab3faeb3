// ── Infrastructure ───────────────────────────────────────────────────────────
pub mod health_cache;
pub mod scrub;
pub mod traits;
pub mod types;

// ── Providers ───────────────────────────────────────────────────────────────
pub mod fallback;
pub mod live;
pub mod mock;

// ── Facade ──────────────────────────────────────────────────────────────────
pub mod adapter;
pub mod factory;

pub use adapter::AxonAdapter;
pub use factory::{create_adapter, create_adapter_with_clock, create_provider};
pub use fallback::FallbackProvider;
pub use health_cache::{Clock, DEFAULT_HEALTH_TTL, HealthCache, ManualClock, SystemClock};
pub use live::LiveProvider;
pub use mock::MockProvider;
pub use scrub::{api_error, sanitize_api_error, scrub_secret_patterns};
pub use traits::CompletionProvider;
pub use types::{
    AnalysisMode, AnalysisRequest, AnalysisResponse, AxonHealth, ChatMessage, ChatRequest,
    ChatResponse, MessageRole, Usage,
};
