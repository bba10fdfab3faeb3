use axon_console::Config;
use axon_console::axon::AxonHealth;

pub fn render_health(health: &AxonHealth) -> String {
    let mut lines = vec![format!(
        "{} {} {}",
        if health.ok { "✓" } else { "✗" },
        health.service.as_deref().unwrap_or("axon"),
        health.version.as_deref().unwrap_or("")
    )
    .trim_end()
    .to_string()];
    if let Some(error) = health.error() {
        lines.push(format!("  error       {error}"));
    }
    if let Some(uptime) = health.uptime {
        lines.push(format!("  uptime      {uptime:.0}s"));
    }
    if let Some(timestamp) = &health.timestamp {
        lines.push(format!("  checked     {timestamp}"));
    }
    lines.join("\n")
}

pub fn render_status(config: &Config, provider: &str, health: &AxonHealth) -> String {
    let mut lines = vec![
        "◆ AXON console".to_string(),
        String::new(),
        format!("Version     {}", env!("CARGO_PKG_VERSION")),
        format!("Config      {}", config.config_path.display()),
        format!("Database    {}", config.db_path().display()),
        String::new(),
        format!("  Mode        {}", config.axon.mode),
        format!("  Provider    {provider}"),
        format!("  Base URL    {}", config.axon.base_url),
        format!(
            "  API key     {}",
            if config.axon.api_key.is_some() {
                "set"
            } else {
                "not set"
            }
        ),
        format!(
            "  Model       {}",
            config.axon.model.as_deref().unwrap_or("(backend default)")
        ),
        format!("  Language    {}", config.axon.language),
        format!("  Health TTL  {}s", config.axon.health_ttl_secs),
        String::new(),
        format!("  Project     {}", config.debate.project_id),
        format!("  Rounds      {} (default)", config.debate.default_rounds),
        String::new(),
    ];
    lines.push(render_health(health));
    lines.join("\n")
}
