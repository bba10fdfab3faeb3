use crate::axon::{MessageRole, Usage};
use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DebateStatus {
    #[default]
    Setup,
    Active,
    Paused,
    Stopped,
    Completed,
}

impl DebateStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Completed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    /// Position the participant argues, folded into its system prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stance: Option<String>,
}

impl Participant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stance: None,
        }
    }

    pub fn with_stance(mut self, stance: impl Into<String>) -> Self {
        self.stance = Some(stance.into());
        self
    }

    /// Parse the CLI form `Name` or `Name: stance`.
    pub fn parse(input: &str) -> Self {
        match input.split_once(':') {
            Some((name, stance)) if !stance.trim().is_empty() => {
                Self::new(name.trim()).with_stance(stance.trim())
            }
            Some((name, _)) => Self::new(name.trim()),
            None => Self::new(input.trim()),
        }
    }
}

/// What the user fills in before a debate exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateConfig {
    pub title: String,
    pub topic: String,
    #[serde(default)]
    pub description: String,
    pub participants: Vec<Participant>,
    pub max_rounds: u32,
}

impl DebateConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if self.participants.len() < 2 {
            return Err(ValidationError::TooFewParticipants {
                count: self.participants.len(),
            });
        }
        if self.max_rounds < 1 {
            return Err(ValidationError::InvalidMaxRounds(self.max_rounds));
        }

        let mut seen = HashSet::with_capacity(self.participants.len());
        for (index, participant) in self.participants.iter().enumerate() {
            let name = participant.name.trim();
            if name.is_empty() {
                return Err(ValidationError::BlankParticipant {
                    position: index + 1,
                });
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(ValidationError::DuplicateParticipant {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// One entry of the append-only debate log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateMessage {
    pub id: String,
    pub round: u32,
    /// 1-based position within the round; 0 for the framing message.
    pub turn: u32,
    /// `None` for the framing message.
    pub speaker: Option<String>,
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateSession {
    pub id: String,
    pub title: String,
    pub topic: String,
    pub description: String,
    pub participants: Vec<Participant>,
    pub max_rounds: u32,
    /// 0 until the debate starts, then 1-based.
    pub current_round: u32,
    pub turns_in_round: u32,
    pub messages: Vec<DebateMessage>,
    pub status: DebateStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DebateSession {
    /// Validate `config` and open a new session in `Setup`.
    pub fn create(config: DebateConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: config.title.trim().to_string(),
            topic: config.topic.trim().to_string(),
            description: config.description.trim().to_string(),
            participants: config
                .participants
                .into_iter()
                .map(|p| Participant {
                    name: p.name.trim().to_string(),
                    stance: p.stance,
                })
                .collect(),
            max_rounds: config.max_rounds,
            current_round: 0,
            turns_in_round: 0,
            messages: Vec::new(),
            status: DebateStatus::Setup,
            created_at: now,
            updated_at: now,
        })
    }

    /// Number of turns that make up one round.
    pub fn seats(&self) -> u32 {
        u32::try_from(self.participants.len()).unwrap_or(u32::MAX)
    }

    /// The final round is full; no further turns will be issued.
    pub fn is_exhausted(&self) -> bool {
        self.current_round >= self.max_rounds && self.turns_in_round >= self.seats()
    }

    pub fn can_generate_turn(&self) -> bool {
        self.status == DebateStatus::Active && !self.is_exhausted()
    }

    /// Who speaks next, if a turn can be generated at all.
    pub fn next_speaker(&self) -> Option<&Participant> {
        if !self.can_generate_turn() {
            return None;
        }
        let seat = self.turns_in_round.checked_rem(self.seats())?;
        self.participants.get(seat as usize)
    }

    /// Participant contributions, without the framing message.
    pub fn turns(&self) -> impl Iterator<Item = &DebateMessage> {
        self.messages.iter().filter(|m| m.speaker.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn config(names: &[&str], max_rounds: u32) -> DebateConfig {
        DebateConfig {
            title: "Cars in cities".into(),
            topic: "Should city centres ban private cars?".into(),
            description: String::new(),
            participants: names.iter().map(|n| Participant::new(*n)).collect(),
            max_rounds,
        }
    }

    #[test]
    fn zero_or_one_participant_is_rejected() {
        assert_eq!(
            DebateSession::create(config(&[], 1)).unwrap_err(),
            ValidationError::TooFewParticipants { count: 0 }
        );
        assert_eq!(
            DebateSession::create(config(&["Ada"], 1)).unwrap_err(),
            ValidationError::TooFewParticipants { count: 1 }
        );
    }

    #[test]
    fn two_participants_open_in_setup() {
        let session = DebateSession::create(config(&["Ada", "Grace"], 2)).unwrap();
        assert_eq!(session.status, DebateStatus::Setup);
        assert_eq!(session.current_round, 0);
        assert_eq!(session.turns_in_round, 0);
        assert!(session.messages.is_empty());
        assert!(session.next_speaker().is_none());
    }

    #[test]
    fn blank_title_and_zero_rounds_are_rejected() {
        let mut cfg = config(&["Ada", "Grace"], 1);
        cfg.title = "   ".into();
        assert_eq!(cfg.validate(), Err(ValidationError::MissingTitle));

        let cfg = config(&["Ada", "Grace"], 0);
        assert_eq!(cfg.validate(), Err(ValidationError::InvalidMaxRounds(0)));
    }

    #[test]
    fn participant_names_must_be_present_and_unique() {
        let cfg = config(&["Ada", " "], 1);
        assert_eq!(
            cfg.validate(),
            Err(ValidationError::BlankParticipant { position: 2 })
        );

        let cfg = config(&["Ada", "ada"], 1);
        assert!(matches!(
            cfg.validate(),
            Err(ValidationError::DuplicateParticipant { .. })
        ));
    }

    #[test]
    fn participant_parse_splits_stance() {
        assert_eq!(
            Participant::parse("Ada: pro ban"),
            Participant::new("Ada").with_stance("pro ban")
        );
        assert_eq!(Participant::parse(" Grace "), Participant::new("Grace"));
        assert_eq!(Participant::parse("Linus:"), Participant::new("Linus"));
    }

    #[test]
    fn active_session_without_seats_has_no_speaker() {
        let mut session = DebateSession::create(config(&["Ada", "Grace"], 2)).unwrap();
        session.status = DebateStatus::Active;
        session.current_round = 1;
        session.participants.clear();
        assert!(session.next_speaker().is_none());
    }

    #[test]
    fn status_terminality() {
        assert!(DebateStatus::Stopped.is_terminal());
        assert!(DebateStatus::Completed.is_terminal());
        assert!(!DebateStatus::Paused.is_terminal());
        assert_eq!(DebateStatus::Completed.to_string(), "completed");
    }
}
