//! Conversation session state

use docent_domain::{Role, SessionId, Turn};

/// Ordered turn history for one conversation
///
/// Turns are only ever appended, a user turn followed by its assistant
/// turn. With a cap set, whole exchanges are evicted from the front.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    turns: Vec<Turn>,
    max_turns: Option<usize>,
}

impl Session {
    /// Start an unbounded session
    pub fn new() -> Self {
        Self::with_max_turns(None)
    }

    /// Start a session that keeps at most `max_turns` entries
    pub fn with_max_turns(max_turns: Option<usize>) -> Self {
        Self {
            id: SessionId::new(),
            turns: Vec::new(),
            max_turns,
        }
    }

    /// Session identifier
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// History in submission order
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of retained turns
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether nothing has been said yet
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Retention cap
    pub fn max_turns(&self) -> Option<usize> {
        self.max_turns
    }

    /// Most recent assistant reply
    pub fn last_reply(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == Role::Assistant)
            .map(|t| t.content.as_str())
    }

    pub(crate) fn record_exchange(&mut self, question: &str, reply: String) {
        self.turns.push(Turn::user(question));
        self.turns.push(Turn::assistant(reply));

        if let Some(max) = self.max_turns {
            let overflow = self.turns.len().saturating_sub(max);
            // Round up so user/assistant pairs leave together
            let evict = (overflow + 1) / 2 * 2;
            self.turns.drain(..evict.min(self.turns.len()));
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
