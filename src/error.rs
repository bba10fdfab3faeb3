use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for the AXON console.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; application glue continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum AxonConsoleError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── AXON provider ───────────────────────────────────────────────────
    #[error("provider: {0}")]
    Provider(#[from] ProviderError),

    // ── Debate validation ───────────────────────────────────────────────
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),

    // ── Persistence ─────────────────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── AXON provider errors ───────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {message}")]
    Request { provider: String, message: String },

    #[error("{provider} API error ({status}): {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} response decode failed: {message}")]
    Decode { provider: String, message: String },

    #[error("no response from {provider}")]
    EmptyResponse { provider: String },
}

// ─── Debate validation errors ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("a debate needs at least 2 participants (got {count})")]
    TooFewParticipants { count: usize },

    #[error("a debate needs a title")]
    MissingTitle,

    #[error("max rounds must be at least 1 (got {0})")]
    InvalidMaxRounds(u32),

    #[error("participant #{position} has a blank name")]
    BlankParticipant { position: usize },

    #[error("participant {name:?} appears more than once")]
    DuplicateParticipant { name: String },
}

// ─── Store errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("debate {0} not found")]
    NotFound(String),

    #[error("schema: {0}")]
    Schema(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, AxonConsoleError>;
