use super::types::{DebateSession, Participant};
use crate::axon::{ChatMessage, MessageRole};
use std::fmt::Write;

/// The system entry appended when a debate starts.
pub fn framing_message(session: &DebateSession) -> String {
    let mut text = format!("Debate: {}\nTopic: {}\n", session.title, session.topic);
    if !session.description.is_empty() {
        let _ = writeln!(text, "{}", session.description);
    }
    let _ = writeln!(text, "Participants:");
    for participant in &session.participants {
        match &participant.stance {
            Some(stance) => {
                let _ = writeln!(text, "- {} ({stance})", participant.name);
            }
            None => {
                let _ = writeln!(text, "- {}", participant.name);
            }
        }
    }
    let _ = write!(text, "Rounds: {}", session.max_rounds);
    text
}

/// System prompt for one participant's turn.
pub fn speaker_instructions(
    session: &DebateSession,
    speaker: &Participant,
    language: Option<&str>,
) -> String {
    let others: Vec<&str> = session
        .participants
        .iter()
        .filter(|p| p.name != speaker.name)
        .map(|p| p.name.as_str())
        .collect();

    let mut text = format!(
        "You are {}, taking part in the debate \"{}\" with {}.\nTopic: {}",
        speaker.name,
        session.title,
        others.join(", "),
        session.topic
    );
    if let Some(stance) = &speaker.stance {
        let _ = write!(text, "\nYour position: {stance}");
    }
    text.push_str(
        "\n\nMake one focused contribution. Engage with what the others have said; \
         agree, disagree, or add a new angle. Do not speak for other participants.",
    );
    if let Some(language) = language.filter(|l| !l.is_empty()) {
        let _ = write!(text, "\nRespond in language: {language}.");
    }
    text
}

/// Chat history as seen by `speaker`.
///
/// The speaker's own earlier turns come back as `assistant` messages; everyone
/// else's arrive as `user` messages prefixed with their name. The last message
/// is always the cue for this turn.
pub fn turn_messages(
    session: &DebateSession,
    speaker: &Participant,
    language: Option<&str>,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(session.messages.len() + 2);
    messages.push(ChatMessage::system(speaker_instructions(
        session, speaker, language,
    )));

    for entry in &session.messages {
        match (&entry.speaker, entry.role) {
            (None, MessageRole::System) => messages.push(ChatMessage::user(format!(
                "Debate brief:\n{}",
                entry.content
            ))),
            (Some(name), _) if *name == speaker.name => {
                messages.push(ChatMessage::assistant(entry.content.clone()));
            }
            (Some(name), _) => {
                messages.push(ChatMessage::user(format!("{name}: {}", entry.content)));
            }
            (None, _) => messages.push(ChatMessage::user(entry.content.clone())),
        }
    }

    messages.push(ChatMessage::user(format!(
        "Round {} of {}. It is your turn, {}.",
        session.current_round, session.max_rounds, speaker.name
    )));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axon::ChatRequest;
    use crate::debate::types::{DebateConfig, DebateMessage, DebateStatus};
    use chrono::Utc;

    fn session() -> DebateSession {
        let mut session = DebateSession::create(DebateConfig {
            title: "Nuclear power".into(),
            topic: "Should nuclear replace coal?".into(),
            description: "Energy policy round table".into(),
            participants: vec![
                Participant::new("Ada").with_stance("for"),
                Participant::new("Grace"),
            ],
            max_rounds: 2,
        })
        .unwrap();
        session.status = DebateStatus::Active;
        session.current_round = 1;
        session
    }

    fn push(session: &mut DebateSession, speaker: Option<&str>, role: MessageRole, text: &str) {
        session.messages.push(DebateMessage {
            id: text.into(),
            round: 1,
            turn: 0,
            speaker: speaker.map(str::to_string),
            role,
            content: text.into(),
            model: None,
            usage: None,
            created_at: Utc::now(),
        });
    }

    #[test]
    fn framing_lists_participants_with_stances() {
        let text = framing_message(&session());
        assert!(text.starts_with("Debate: Nuclear power\nTopic: Should nuclear replace coal?"));
        assert!(text.contains("- Ada (for)"));
        assert!(text.contains("- Grace\n"));
        assert!(text.ends_with("Rounds: 2"));
    }

    #[test]
    fn instructions_name_opponents_and_language() {
        let s = session();
        let text = speaker_instructions(&s, &s.participants[0], Some("de"));
        assert!(text.starts_with("You are Ada"));
        assert!(text.contains("with Grace"));
        assert!(text.contains("Your position: for"));
        assert!(text.contains("language: de"));
    }

    #[test]
    fn history_maps_roles_from_the_speakers_point_of_view() {
        let mut s = session();
        push(&mut s, None, MessageRole::System, "brief");
        push(&mut s, Some("Ada"), MessageRole::Assistant, "opening");
        push(&mut s, Some("Grace"), MessageRole::Assistant, "rebuttal");

        let ada = s.participants[0].clone();
        let messages = turn_messages(&s, &ada, None);
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[1].content, "Debate brief:\nbrief");
        assert_eq!(messages[2], ChatMessage::assistant("opening"));
        assert_eq!(messages[3], ChatMessage::user("Grace: rebuttal"));

        let request = ChatRequest::new("p", messages);
        assert_eq!(
            request.last_user_message(),
            Some("Round 1 of 2. It is your turn, Ada.")
        );
    }
}
