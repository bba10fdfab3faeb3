use super::types::{DebateSession, DebateStatus};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Editable,
    /// Opened from a share link; nothing may change it.
    ReadOnly,
}

/// Which debate controls are usable right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub start: bool,
    pub next_turn: bool,
    pub pause: bool,
    pub resume: bool,
    pub stop: bool,
}

impl Controls {
    pub fn none_enabled(self) -> bool {
        self == Self::default()
    }
}

/// A session plus how it was opened.
#[derive(Debug, Clone)]
pub struct DebateView {
    session: DebateSession,
    access: Access,
}

impl DebateView {
    pub fn editable(session: DebateSession) -> Self {
        Self {
            session,
            access: Access::Editable,
        }
    }

    pub fn read_only(session: DebateSession) -> Self {
        Self {
            session,
            access: Access::ReadOnly,
        }
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn is_read_only(&self) -> bool {
        self.access == Access::ReadOnly
    }

    pub fn session(&self) -> &DebateSession {
        &self.session
    }

    /// Mutable access, refused for read-only views.
    pub fn session_mut(&mut self) -> Option<&mut DebateSession> {
        match self.access {
            Access::Editable => Some(&mut self.session),
            Access::ReadOnly => None,
        }
    }

    pub fn into_session(self) -> DebateSession {
        self.session
    }

    pub fn controls(&self) -> Controls {
        if self.is_read_only() {
            return Controls::default();
        }
        let status = self.session.status;
        Controls {
            start: status == DebateStatus::Setup,
            next_turn: self.session.can_generate_turn(),
            pause: status == DebateStatus::Active,
            resume: status == DebateStatus::Paused,
            stop: !status.is_terminal(),
        }
    }

    pub fn round_display(&self) -> String {
        format!(
            "Round: {}/{}",
            self.session.current_round, self.session.max_rounds
        )
    }

    /// Plain-text rendering of the header and log.
    pub fn render(&self) -> String {
        let s = &self.session;
        let mut out = String::new();
        let _ = writeln!(out, "{} [{}]", s.title, s.status);
        let _ = writeln!(out, "Topic: {}", s.topic);
        let _ = writeln!(out, "{}", self.round_display());
        if self.is_read_only() {
            let _ = writeln!(out, "(read-only)");
        } else if let Some(next) = s.next_speaker() {
            let _ = writeln!(out, "Next: {}", next.name);
        }
        for message in &s.messages {
            let _ = writeln!(out);
            match &message.speaker {
                Some(name) => {
                    let _ = writeln!(out, "[{}.{}] {name}:", message.round, message.turn);
                }
                None => {
                    let _ = writeln!(out, "[brief]");
                }
            }
            let _ = writeln!(out, "{}", message.content);
        }
        out
    }
}
