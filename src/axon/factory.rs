use super::adapter::AxonAdapter;
use super::fallback::FallbackProvider;
use super::health_cache::{Clock, HealthCache, SystemClock};
use super::live::LiveProvider;
use super::mock::MockProvider;
use super::traits::CompletionProvider;
use crate::config::{AxonConfig, AxonMode};
use std::sync::Arc;
use std::time::Duration;

/// Build the provider selected by `config.mode`.
///
/// `auto` wraps the live backend in a [`FallbackProvider`] so every call has
/// a mock answer behind it; `live` exposes backend failures directly.
pub fn create_provider(config: &AxonConfig) -> anyhow::Result<Box<dyn CompletionProvider>> {
    let provider: Box<dyn CompletionProvider> = match config.mode {
        AxonMode::Mock => Box::new(MockProvider::new()),
        AxonMode::Live => Box::new(live_provider(config)?),
        AxonMode::Auto => Box::new(FallbackProvider::new(
            Box::new(live_provider(config)?),
            Box::new(MockProvider::new()),
        )),
    };
    Ok(provider)
}

fn live_provider(config: &AxonConfig) -> anyhow::Result<LiveProvider> {
    LiveProvider::new(
        &config.base_url,
        config.api_key.as_deref(),
        config.timeout_secs,
    )
}

pub fn create_adapter(config: &AxonConfig) -> anyhow::Result<AxonAdapter> {
    create_adapter_with_clock(config, Arc::new(SystemClock))
}

pub fn create_adapter_with_clock(
    config: &AxonConfig,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<AxonAdapter> {
    let provider = create_provider(config)?;
    tracing::info!(
        mode = %config.mode,
        provider = provider.name(),
        base_url = config.base_url.as_str(),
        "AXON adapter ready"
    );
    let cache = HealthCache::new(Duration::from_secs(config.health_ttl_secs), clock);
    Ok(AxonAdapter::new(provider, config.mode, cache))
}
