use super::responder::{AnswerSource, Reply};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
    /// Set for assistant turns only.
    pub source: Option<AnswerSource>,
}

/// In-memory transcript of the running session.
#[derive(Debug, Default)]
pub struct Session {
    turns: Vec<ConversationTurn>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_question(&mut self, text: &str) {
        self.turns.push(ConversationTurn {
            role: Role::User,
            text: text.to_string(),
            source: None,
        });
    }

    pub fn push_reply(&mut self, reply: &Reply) {
        self.turns.push(ConversationTurn {
            role: Role::Assistant,
            text: reply.text.clone(),
            source: Some(reply.source),
        });
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// The most recent `n` turns, oldest first.
    pub fn last(&self, n: usize) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{Role, Session};
    use crate::assistant::responder::{AnswerSource, Reply};

    fn reply(text: &str, source: AnswerSource) -> Reply {
        Reply {
            text: text.to_string(),
            source,
            best_score: 0.0,
            context_entries: 0,
            failure: None,
        }
    }

    #[test]
    fn turns_keep_arrival_order_and_sources() {
        let mut session = Session::new();
        session.push_question("What does EVA do?");
        session.push_reply(&reply(
            "EVA verifies eligibility.",
            AnswerSource::Knowledge { score: 0.77 },
        ));

        let turns = session.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].source, None);
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(
            turns[1].source,
            Some(AnswerSource::Knowledge { score: 0.77 })
        );
    }

    #[test]
    fn last_returns_tail_and_tolerates_large_counts() {
        let mut session = Session::new();
        for question in ["one", "two", "three"] {
            session.push_question(question);
        }

        let tail = session
            .last(2)
            .iter()
            .map(|turn| turn.text.as_str())
            .collect::<Vec<_>>();
        assert_eq!(tail, vec!["two", "three"]);
        assert_eq!(session.last(10).len(), 3);
        assert!(session.last(0).is_empty());
    }

    #[test]
    fn clear_empties_transcript() {
        let mut session = Session::new();
        session.push_question("hello");
        session.push_reply(&reply("hi", AnswerSource::Generated));
        assert_eq!(session.len(), 2);

        session.clear();
        assert!(session.is_empty());
    }
}
