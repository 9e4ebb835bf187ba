//! The conversation as shown to the user.

use mathwise_core::message::Message;

/// Every turn displayed in the chat, oldest first. Unlike the memory window
/// nothing is evicted; the only way to shrink it is [`ChatHistory::reset`].
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    messages: Vec<Message>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A history that starts with a single assistant greeting.
    pub fn with_greeting(text: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::assistant(text)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Drop everything and leave only the given assistant message.
    pub fn reset(&mut self, text: impl Into<String>) {
        self.messages.clear();
        self.messages.push(Message::assistant(text));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
