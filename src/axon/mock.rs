//! Deterministic stand-in for the AXON backend.
//!
//! Output depends only on the request, so the same prompt always yields the
//! same text, id and confidence figure. No network access.

use super::traits::CompletionProvider;
use super::types::{
    AnalysisMode, AnalysisRequest, AnalysisResponse, AxonHealth, ChatMessage, ChatRequest,
    ChatResponse, MessageRole, Usage,
};
use crate::error::ProviderError;
use chrono::Utc;
use std::fmt::Write as _;
use std::future::Future;
use std::pin::Pin;

const PROVIDER_NAME: &str = "axon-mock";
const MOCK_MODEL: &str = "axon-mock-1";
const EXCERPT_CHARS: usize = 80;

#[derive(Debug, Clone, Copy, Default)]
pub struct MockProvider;

impl MockProvider {
    pub fn new() -> Self {
        Self
    }
}

/// FNV-1a; stable across builds and platforms.
fn stable_hash(parts: &[&str]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for part in parts {
        for byte in part.bytes().chain(std::iter::once(0xff)) {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
    }
    hash
}

fn word_count(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// Confidence in `[0.55, 0.94]`, two decimals.
fn confidence(hash: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let spread = (hash % 40) as f64;
    (55.0 + spread) / 100.0
}

fn render_analysis(request: &AnalysisRequest, hash: u64) -> String {
    let subject = excerpt(&request.prompt);
    let mut out = String::new();
    match request.mode {
        AnalysisMode::Ikr => {
            let _ = writeln!(out, "## IKR analysis: {subject}");
            let _ = writeln!(
                out,
                "- Intelligence: signals relevant to \"{subject}\" were collected."
            );
            let _ = writeln!(out, "- Knowledge: established facts were mapped against the signals.");
            let _ = writeln!(out, "- Reasoning: the strongest inference is flagged for review.");
        }
        AnalysisMode::Kipling => {
            let _ = writeln!(out, "## Kipling analysis: {subject}");
            for question in ["Who", "What", "When", "Where", "Why", "How"] {
                let _ = writeln!(out, "- {question}: to be confirmed against project data.");
            }
        }
        AnalysisMode::General => {
            let _ = writeln!(out, "## Analysis: {subject}");
            let _ = writeln!(
                out,
                "- Insight 1: the request touches {} key terms.",
                word_count(&request.prompt)
            );
            let _ = writeln!(out, "- Insight 2: no live backend was consulted.");
        }
    }
    let _ = write!(
        out,
        "Confidence: {:.2} (mock, language={})",
        confidence(hash),
        request.language
    );
    out
}

impl CompletionProvider for MockProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn health(&self) -> Pin<Box<dyn Future<Output = AxonHealth> + Send + '_>> {
        Box::pin(async move {
            AxonHealth {
                ok: true,
                service: Some(PROVIDER_NAME.to_string()),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
                uptime: None,
                timestamp: Some(Utc::now().to_rfc3339()),
                details: Some(serde_json::json!({ "mode": "mock" })),
            }
        })
    }

    fn analyze<'a>(
        &'a self,
        request: &'a AnalysisRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AnalysisResponse, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            let mode = request.mode.to_string();
            let hash = stable_hash(&[
                request.project_id.as_str(),
                mode.as_str(),
                request.prompt.as_str(),
            ]);
            let content = render_analysis(request, hash);
            let usage = Usage::new(word_count(&request.prompt), word_count(&content));

            Ok(AnalysisResponse {
                id: format!("mock-an-{hash:016x}"),
                created_at: Utc::now(),
                content,
                usage: Some(usage),
                model: Some(MOCK_MODEL.to_string()),
            })
        })
    }

    fn chat<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ChatResponse, ProviderError>> + Send + 'a>> {
        Box::pin(async move {
            let prior_replies = request
                .messages
                .iter()
                .filter(|message| message.role == MessageRole::Assistant)
                .count();
            let prompt = request.last_user_message().unwrap_or("(no prompt)");
            let content = format!(
                "(mock reply #{}) Responding to \"{}\": this point deserves a closer look.",
                prior_replies + 1,
                excerpt(prompt)
            );

            let contents: Vec<&str> = request
                .messages
                .iter()
                .map(|message| message.content.as_str())
                .collect();
            let hash = stable_hash(&contents);
            let prompt_tokens = contents.iter().map(|text| word_count(text)).sum();

            Ok(ChatResponse {
                id: format!("mock-chat-{hash:016x}"),
                usage: Usage::new(prompt_tokens, word_count(&content)),
                message: ChatMessage::assistant(content),
                model: Some(MOCK_MODEL.to_string()),
            })
        })
    }
}
