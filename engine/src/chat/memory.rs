//! Conversation Memory
//!
//! Bounded, ordered log of user/bot turns for one chat session. The budget
//! is measured in serialized bytes: each turn costs the length of its
//! compact JSON form (`{"user":"…","bot":"…"}`). After every append, turns
//! are evicted from the front until the total is within budget again, so
//! the oldest context is always the first to go.

use sdk::types::Turn;
use std::collections::VecDeque;

/// Default budget for retained turns, in serialized bytes
pub const DEFAULT_MAX_HISTORY_CHARS: usize = 10_000;

/// Header line of the rendered context block
const CONTEXT_HEADER: &str = "Conversation History:\n";

#[derive(Debug, Clone)]
pub struct ConversationMemory {
    turns: VecDeque<Turn>,

    /// Maximum cumulative serialized size
    max_chars: usize,

    /// Current cumulative serialized size
    size: usize,
}

impl ConversationMemory {
    /// Create an empty memory with the default budget
    pub fn new() -> Self {
        Self::with_budget(DEFAULT_MAX_HISTORY_CHARS)
    }

    /// Create an empty memory with a specific budget
    pub fn with_budget(max_chars: usize) -> Self {
        Self {
            turns: VecDeque::new(),
            max_chars,
            size: 0,
        }
    }

    /// Serialized size of a single turn
    pub fn turn_size(turn: &Turn) -> usize {
        // Serializing two strings cannot fail; fall back to a conservative
        // estimate that still counts every content byte.
        serde_json::to_string(turn)
            .map(|s| s.len())
            .unwrap_or_else(|_| turn.user.len() + turn.bot.len() + 20)
    }

    /// Append a turn, evicting the oldest turns while over budget.
    ///
    /// A single turn larger than the whole budget is evicted as well, leaving
    /// the memory empty rather than over budget.
    pub fn append(&mut self, user: impl Into<String>, bot: impl Into<String>) {
        let turn = Turn::new(user, bot);
        self.size += Self::turn_size(&turn);
        self.turns.push_back(turn);
        self.evict_to_budget();
    }

    /// Overwrite the log with caller-held history, then enforce the budget
    pub fn replace(&mut self, turns: Vec<Turn>) {
        self.size = turns.iter().map(Self::turn_size).sum();
        self.turns = turns.into();
        self.evict_to_budget();
    }

    fn evict_to_budget(&mut self) {
        while self.size > self.max_chars {
            match self.turns.pop_front() {
                Some(evicted) => {
                    self.size = self.size.saturating_sub(Self::turn_size(&evicted));
                }
                None => {
                    self.size = 0;
                    break;
                }
            }
        }
    }

    /// Render every retained turn as "User: …" / "Bot: …" lines, oldest first
    pub fn render(&self) -> String {
        let mut context = String::from(CONTEXT_HEADER);
        for turn in &self.turns {
            context.push_str("User: ");
            context.push_str(&turn.user);
            context.push('\n');
            context.push_str("Bot: ");
            context.push_str(&turn.bot);
            context.push('\n');
        }
        context
    }

    /// Snapshot of the retained turns, oldest first
    pub fn turns(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Current cumulative serialized size
    pub fn serialized_size(&self) -> usize {
        self.size
    }

    pub fn budget(&self) -> usize {
        self.max_chars
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.size = 0;
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_memory() {
        let memory = ConversationMemory::new();
        assert!(memory.is_empty());
        assert_eq!(memory.serialized_size(), 0);
        assert_eq!(memory.budget(), DEFAULT_MAX_HISTORY_CHARS);
    }

    #[test]
    fn test_turn_size_is_json_length() {
        let turn = Turn::new("hi", "hello");
        assert_eq!(
            ConversationMemory::turn_size(&turn),
            r#"{"user":"hi","bot":"hello"}"#.len()
        );
    }

    #[test]
    fn test_append_tracks_size() {
        let mut memory = ConversationMemory::new();
        memory.append("hi", "hello");
        memory.append("menu?", "burgers and fries");

        let expected: usize = memory.turns().iter().map(ConversationMemory::turn_size).sum();
        assert_eq!(memory.len(), 2);
        assert_eq!(memory.serialized_size(), expected);
    }

    #[test]
    fn test_eviction_removes_oldest_first() {
        let one = ConversationMemory::turn_size(&Turn::new("q0", "a0"));
        let mut memory = ConversationMemory::with_budget(one * 3);

        for i in 0..5 {
            memory.append(format!("q{}", i), format!("a{}", i));
        }

        let users: Vec<String> = memory.turns().into_iter().map(|t| t.user).collect();
        assert_eq!(users, vec!["q2", "q3", "q4"]);
        assert!(memory.serialized_size() <= memory.budget());
    }

    #[test]
    fn test_oversized_turn_leaves_memory_empty() {
        let mut memory = ConversationMemory::with_budget(30);
        memory.append("short", "ok");
        memory.append("x".repeat(100), "y");

        assert!(memory.is_empty());
        assert_eq!(memory.serialized_size(), 0);
    }

    #[test]
    fn test_render_format() {
        let mut memory = ConversationMemory::new();
        memory.append("I'd like fries", "Large or small?");
        memory.append("Large", "Added large fries");

        assert_eq!(
            memory.render(),
            "Conversation History:\n\
             User: I'd like fries\nBot: Large or small?\n\
             User: Large\nBot: Added large fries\n"
        );
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut memory = ConversationMemory::new();
        memory.append("a", "b");
        assert_eq!(memory.render(), memory.render());
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(ConversationMemory::new().render(), "Conversation History:\n");
    }

    #[test]
    fn test_replace_enforces_budget() {
        let one = ConversationMemory::turn_size(&Turn::new("q0", "a0"));
        let mut memory = ConversationMemory::with_budget(one * 2);
        memory.append("old", "old");

        memory.replace(vec![
            Turn::new("q0", "a0"),
            Turn::new("q1", "a1"),
            Turn::new("q2", "a2"),
        ]);

        let users: Vec<String> = memory.turns().into_iter().map(|t| t.user).collect();
        assert_eq!(users, vec!["q1", "q2"]);
    }

    #[test]
    fn test_clear() {
        let mut memory = ConversationMemory::new();
        memory.append("a", "b");
        memory.clear();
        assert!(memory.is_empty());
        assert_eq!(memory.serialized_size(), 0);
    }
}
