//! Bounded per-session conversation history.
//!
//! Sessions are caller-supplied identifiers; history lives for the process
//! lifetime and is trimmed from the oldest end when it exceeds the
//! configured number of exchanges. There is no internal per-session mutual
//! exclusion: callers must not issue concurrent queries against the same
//! session id.

use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Default number of retained exchanges (user/assistant pairs).
pub const DEFAULT_MAX_TURNS: usize = 2;

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Assistant,
}

/// One message in a session history.
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

/// In-memory store of rolling conversation histories keyed by session id.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Vec<Turn>>>,
    /// Retained exchanges per session; each exchange is two turns.
    max_turns: usize,
}

impl SessionStore {
    /// Create a store retaining `max_turns` exchanges per session.
    pub fn new(max_turns: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_turns,
        }
    }

    /// Generate a fresh session id.
    pub fn create_session(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().unwrap();
        sessions.insert(id.clone(), Vec::new());
        id
    }

    /// Get the history for a session, oldest first. Unknown ids yield an
    /// empty history.
    pub fn get_history(&self, session_id: &str) -> Vec<Turn> {
        let sessions = self.sessions.read().unwrap();
        sessions.get(session_id).cloned().unwrap_or_default()
    }

    /// Append a completed exchange, creating the session lazily and
    /// trimming the oldest turns past the retention limit.
    pub fn append(&self, session_id: &str, user_text: &str, assistant_text: &str) {
        let mut sessions = self.sessions.write().unwrap();
        let turns = sessions.entry(session_id.to_string()).or_default();

        turns.push(Turn {
            role: TurnRole::User,
            content: user_text.to_string(),
        });
        turns.push(Turn {
            role: TurnRole::Assistant,
            content: assistant_text.to_string(),
        });

        let max_messages = self.max_turns * 2;
        if turns.len() > max_messages {
            turns.drain(0..turns.len() - max_messages);
        }
    }

    /// Drop a session's history.
    pub fn clear_session(&self, session_id: &str) {
        let mut sessions = self.sessions.write().unwrap();
        sessions.remove(session_id);
    }

    /// Render a session's history as prompt text, or `None` when empty.
    pub fn format_history(&self, session_id: &str) -> Option<String> {
        let turns = self.get_history(session_id);
        if turns.is_empty() {
            return None;
        }

        let lines: Vec<String> = turns
            .iter()
            .map(|turn| match turn.role {
                TurnRole::User => format!("User: {}", turn.content),
                TurnRole::Assistant => format!("Assistant: {}", turn.content),
            })
            .collect();

        Some(lines.join("\n"))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}
