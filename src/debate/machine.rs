//! Debate lifecycle as a pure transition function.
//!
//! `apply` never mutates its input: it returns either the next session or the
//! reason the event was dropped. Illegal events are not errors; callers log the
//! [`Ignored`](Transition::Ignored) reason and keep the session they had.
//!
//! ```text
//! Setup  --Start-->  Active  --Pause-->  Paused  --Resume-->  Active
//! Setup|Active|Paused  --Stop-->  Stopped
//! Active  --TurnCompleted (final seat of final round)-->  Completed
//! ```

use super::prompt::framing_message;
use super::types::{DebateMessage, DebateSession, DebateStatus};
use crate::axon::{ChatResponse, MessageRole};
use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum DebateEvent {
    Start,
    /// A reply arrived for `speaker`.
    TurnCompleted {
        speaker: String,
        reply: ChatResponse,
    },
    Pause,
    Resume,
    Stop,
}

impl DebateEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::TurnCompleted { .. } => "turn_completed",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoredReason {
    /// The event is not allowed from this status.
    WrongStatus {
        event: &'static str,
        status: DebateStatus,
    },
    /// Every seat of the final round has spoken.
    Exhausted,
    /// The reply belongs to someone other than the current speaker.
    OutOfTurn { expected: String, got: String },
    /// The session was opened from a share link.
    ReadOnly,
}

impl fmt::Display for IgnoredReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongStatus { event, status } => write!(f, "{event} is not allowed while {status}"),
            Self::Exhausted => write!(f, "all rounds are complete"),
            Self::OutOfTurn { expected, got } => {
                write!(f, "reply from {got} but it is {expected}'s turn")
            }
            Self::ReadOnly => write!(f, "session is read-only"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Applied(DebateSession),
    Ignored(IgnoredReason),
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Status `event` moves a `from` debate to, or `None` when `from` refuses it.
///
/// This is the whole status graph. `TurnCompleted` keeps the debate active;
/// filling the final seat of the final round completes it in `record_turn`.
pub fn status_after(from: DebateStatus, event: &DebateEvent) -> Option<DebateStatus> {
    use DebateStatus::{Active, Paused, Setup, Stopped};
    match (from, event) {
        (Setup, DebateEvent::Start) => Some(Active),
        (Active, DebateEvent::TurnCompleted { .. }) => Some(Active),
        (Active, DebateEvent::Pause) => Some(Paused),
        (Paused, DebateEvent::Resume) => Some(Active),
        (status, DebateEvent::Stop) if !status.is_terminal() => Some(Stopped),
        _ => None,
    }
}

pub fn apply(session: &DebateSession, event: DebateEvent, now: DateTime<Utc>) -> Transition {
    let Some(target) = status_after(session.status, &event) else {
        return Transition::Ignored(IgnoredReason::WrongStatus {
            event: event.name(),
            status: session.status,
        });
    };

    match event {
        DebateEvent::Start => {
            let mut next = with_status(session, target, now);
            next.current_round = 1;
            next.turns_in_round = 0;
            next.messages.push(DebateMessage {
                id: uuid::Uuid::new_v4().to_string(),
                round: 1,
                turn: 0,
                speaker: None,
                role: MessageRole::System,
                content: framing_message(session),
                model: None,
                usage: None,
                created_at: now,
            });
            Transition::Applied(next)
        }

        DebateEvent::TurnCompleted { speaker, reply } => {
            let Some(expected) = session.next_speaker() else {
                return Transition::Ignored(IgnoredReason::Exhausted);
            };
            if expected.name != speaker {
                return Transition::Ignored(IgnoredReason::OutOfTurn {
                    expected: expected.name.clone(),
                    got: speaker,
                });
            }
            Transition::Applied(record_turn(session, speaker, reply, now))
        }

        DebateEvent::Pause | DebateEvent::Resume | DebateEvent::Stop => {
            Transition::Applied(with_status(session, target, now))
        }
    }
}

fn with_status(session: &DebateSession, status: DebateStatus, now: DateTime<Utc>) -> DebateSession {
    let mut next = session.clone();
    next.status = status;
    next.updated_at = now;
    next
}

/// Append the reply and advance the round counters.
///
/// Filling a non-final round rolls over to the next one. Filling the final
/// round leaves `turns_in_round` at the seat count and completes the debate.
fn record_turn(
    session: &DebateSession,
    speaker: String,
    reply: ChatResponse,
    now: DateTime<Utc>,
) -> DebateSession {
    let mut next = session.clone();
    let turn = next.turns_in_round + 1;

    next.messages.push(DebateMessage {
        id: uuid::Uuid::new_v4().to_string(),
        round: next.current_round,
        turn,
        speaker: Some(speaker),
        role: MessageRole::Assistant,
        content: reply.message.content,
        model: reply.model,
        usage: Some(reply.usage),
        created_at: now,
    });
    next.turns_in_round = turn;

    if next.turns_in_round >= next.seats() {
        if next.current_round < next.max_rounds {
            next.current_round += 1;
            next.turns_in_round = 0;
        } else {
            next.status = DebateStatus::Completed;
        }
    }
    next.updated_at = now;
    next
}
