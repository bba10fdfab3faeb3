use super::machine::{DebateEvent, IgnoredReason, Transition, apply};
use super::prompt::turn_messages;
use super::types::{DebateMessage, DebateSession, DebateStatus};
use super::view::DebateView;
use crate::axon::{AxonAdapter, ChatRequest};
use crate::error::ProviderError;
use chrono::Utc;
use std::sync::Arc;

/// Result of a control action on a view.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Applied,
    Ignored(IgnoredReason),
}

impl StepOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Result of asking for the next turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The new message now at the end of the log.
    Spoke(DebateMessage),
    Skipped(IgnoredReason),
}

/// Drives debates through the AXON adapter.
///
/// Every method takes the view by `&mut`, so at most one turn per session is
/// in flight. The session is only replaced after the reply arrives; a failed
/// chat call leaves it untouched.
pub struct DebateRunner {
    adapter: Arc<AxonAdapter>,
    project_id: String,
    model: Option<String>,
    language: Option<String>,
}

impl DebateRunner {
    pub fn new(adapter: Arc<AxonAdapter>, project_id: impl Into<String>) -> Self {
        Self {
            adapter,
            project_id: project_id.into(),
            model: None,
            language: None,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }

    pub fn adapter(&self) -> &AxonAdapter {
        &self.adapter
    }

    pub fn start(&self, view: &mut DebateView) -> StepOutcome {
        step(view, DebateEvent::Start)
    }

    pub fn pause(&self, view: &mut DebateView) -> StepOutcome {
        step(view, DebateEvent::Pause)
    }

    pub fn resume(&self, view: &mut DebateView) -> StepOutcome {
        step(view, DebateEvent::Resume)
    }

    pub fn stop(&self, view: &mut DebateView) -> StepOutcome {
        step(view, DebateEvent::Stop)
    }

    /// Ask the next speaker for a reply and append it.
    ///
    /// Returns `Skipped` without calling AXON when the view is read-only or
    /// the session cannot take a turn.
    pub async fn generate_turn(&self, view: &mut DebateView) -> Result<TurnOutcome, ProviderError> {
        let Some(session) = view.session_mut() else {
            tracing::debug!("Turn skipped: read-only session");
            return Ok(TurnOutcome::Skipped(IgnoredReason::ReadOnly));
        };
        let Some(speaker) = session.next_speaker().cloned() else {
            let reason = if session.status == DebateStatus::Active {
                IgnoredReason::Exhausted
            } else {
                IgnoredReason::WrongStatus {
                    event: "turn_completed",
                    status: session.status,
                }
            };
            tracing::debug!(debate = session.id.as_str(), %reason, "Turn skipped");
            return Ok(TurnOutcome::Skipped(reason));
        };

        let request = ChatRequest::new(
            self.project_id.clone(),
            turn_messages(session, &speaker, self.language.as_deref()),
        )
        .with_model(self.model.clone())
        .with_language(self.language.clone());

        tracing::info!(
            debate = session.id.as_str(),
            round = session.current_round,
            speaker = speaker.name.as_str(),
            "Generating debate turn"
        );
        let reply = self.adapter.chat(&request).await.inspect_err(|e| {
            tracing::warn!(debate = session.id.as_str(), error = %e, "Debate turn failed");
        })?;

        let event = DebateEvent::TurnCompleted {
            speaker: speaker.name,
            reply,
        };
        match commit(session, event) {
            StepOutcome::Applied => match session.messages.last() {
                Some(message) => Ok(TurnOutcome::Spoke(message.clone())),
                None => Ok(TurnOutcome::Skipped(IgnoredReason::Exhausted)),
            },
            StepOutcome::Ignored(reason) => Ok(TurnOutcome::Skipped(reason)),
        }
    }

    /// Generate turns until the debate stops accepting them.
    ///
    /// Returns the number of turns produced.
    pub async fn run_to_end(&self, view: &mut DebateView) -> Result<usize, ProviderError> {
        let mut produced = 0;
        while let TurnOutcome::Spoke(_) = self.generate_turn(view).await? {
            produced += 1;
        }
        Ok(produced)
    }
}

fn step(view: &mut DebateView, event: DebateEvent) -> StepOutcome {
    match view.session_mut() {
        Some(session) => commit(session, event),
        None => {
            tracing::debug!(event = event.name(), "Ignoring event on read-only session");
            StepOutcome::Ignored(IgnoredReason::ReadOnly)
        }
    }
}

fn commit(session: &mut DebateSession, event: DebateEvent) -> StepOutcome {
    let name = event.name();
    match apply(session, event, Utc::now()) {
        Transition::Applied(next) => {
            tracing::debug!(
                debate = next.id.as_str(),
                event = name,
                status = %next.status,
                round = next.current_round,
                "Debate transition"
            );
            *session = next;
            StepOutcome::Applied
        }
        Transition::Ignored(reason) => {
            tracing::debug!(debate = session.id.as_str(), event = name, %reason, "Debate event ignored");
            StepOutcome::Ignored(reason)
        }
    }
}
