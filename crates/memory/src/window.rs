//! Bounded, insertion-ordered window of recent turns.

use mathwise_core::message::{Message, Role};
use serde::Serialize;
use std::collections::VecDeque;

/// Turns marked as recent in the debug view.
const RECENT_MARK: usize = 4;

/// Characters of content shown per turn in the debug view.
const PREVIEW_CHARS: usize = 40;

/// The most recent `capacity` turns of a conversation.
///
/// Eviction is strict FIFO over individual turns: a user message and the
/// assistant reply to it count as two turns and may be evicted separately.
#[derive(Debug, Clone)]
pub struct MemoryWindow {
    capacity: usize,
    turns: VecDeque<Message>,
}

/// One row of the memory debug view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryDebugLine {
    /// Among the last few turns
    pub recent: bool,
    pub role: Role,
    /// Content cut to a fixed number of characters, with `...` when cut
    pub preview: String,
}

impl std::fmt::Display for MemoryDebugLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mark = if self.recent { "✓" } else { " " };
        write!(f, "{mark} {}: {}", self.role, self.preview)
    }
}

impl MemoryWindow {
    /// A window holding at most `capacity` turns. A capacity of zero is
    /// raised to one so the current exchange is never lost.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            turns: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Append a turn, evicting the oldest ones past capacity.
    pub fn append(&mut self, turn: Message) {
        self.turns.push_back(turn);
        while self.turns.len() > self.capacity {
            if let Some(evicted) = self.turns.pop_front() {
                tracing::trace!(role = %evicted.role, "Evicted turn from memory window");
            }
        }
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// The current turns, oldest first.
    pub fn snapshot(&self) -> Vec<Message> {
        self.turns.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// A compact listing of the window for debugging.
    pub fn debug_view(&self) -> Vec<MemoryDebugLine> {
        let recent_from = self.turns.len().saturating_sub(RECENT_MARK);
        self.turns
            .iter()
            .enumerate()
            .map(|(i, turn)| MemoryDebugLine {
                recent: i >= recent_from,
                role: turn.role,
                preview: preview(&turn.content),
            })
            .collect()
    }
}

fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(window: &mut MemoryWindow, pairs: usize) {
        for i in 0..pairs {
            window.append(Message::user(format!("q{i}")));
            window.append(Message::assistant(format!("a{i}")));
        }
    }

    fn contents(window: &MemoryWindow) -> Vec<String> {
        window.snapshot().into_iter().map(|m| m.content).collect()
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut window = MemoryWindow::new(3);
        for i in 0..50 {
            window.append(Message::user(i.to_string()));
            assert!(window.len() <= 3);
        }
    }

    #[test]
    fn twelve_pairs_keep_last_ten_turns_in_order() {
        let mut window = MemoryWindow::new(10);
        numbered(&mut window, 12);

        let kept = contents(&window);
        assert_eq!(kept.len(), 10);
        assert_eq!(
            kept,
            vec!["q7", "a7", "q8", "a8", "q9", "a9", "q10", "a10", "q11", "a11"]
        );
    }

    #[test]
    fn eviction_is_fifo_per_turn() {
        let mut window = MemoryWindow::new(3);
        numbered(&mut window, 2);
        // q0 a0 q1 a1 -> q0 evicted on its own
        assert_eq!(contents(&window), vec!["a0", "q1", "a1"]);
    }

    #[test]
    fn clear_empties_window() {
        let mut window = MemoryWindow::new(10);
        numbered(&mut window, 3);
        window.clear();
        assert!(window.is_empty());
        assert!(window.snapshot().is_empty());
        assert_eq!(window.capacity(), 10);
    }

    #[test]
    fn zero_capacity_holds_one_turn() {
        let mut window = MemoryWindow::new(0);
        numbered(&mut window, 2);
        assert_eq!(contents(&window), vec!["a1"]);
    }

    #[test]
    fn debug_view_marks_last_four_and_truncates() {
        let mut window = MemoryWindow::new(10);
        window.append(Message::user("Find the derivative of f(x) = x³ - 4x² + 7x - 9 please"));
        numbered(&mut window, 2);

        let view = window.debug_view();
        assert_eq!(view.len(), 5);
        assert!(!view[0].recent);
        assert!(view[1..].iter().all(|l| l.recent));
        assert_eq!(view[0].preview.chars().count(), 43);
        assert!(view[0].preview.ends_with("..."));
        assert_eq!(view[1].preview, "q0");
        assert_eq!(view[4].to_string(), "✓ assistant: a1");
    }

    #[test]
    fn preview_keeps_exactly_forty_chars() {
        let forty = "x".repeat(40);
        assert_eq!(preview(&forty), forty);
        assert_eq!(preview(&"y".repeat(41)), format!("{}...", "y".repeat(40)));
    }
}
