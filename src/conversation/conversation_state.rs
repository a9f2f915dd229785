use super::error::ChatError;
use super::message::Message;
use super::transcript::{self, Turn};

/// Ordered message log of one session.
///
/// The log is the only place conversation data is stored. The window handed
/// to the model is its newest `window_size` entries, and the display
/// transcript is the whole log paired into turns.
#[derive(Debug, Clone)]
pub struct ConversationState {
    messages: Vec<Message>,
    window_size: usize,
}

impl ConversationState {
    /// `window_size` counts messages, so it is twice the number of turns the
    /// model gets to see.
    pub fn new(window_size: usize) -> Self {
        Self {
            messages: Vec::new(),
            window_size,
        }
    }

    /// Records a completed turn. Both sides must carry text; otherwise the
    /// log is left untouched.
    pub fn append_turn(&mut self, user_text: &str, assistant_text: &str) -> Result<(), ChatError> {
        if user_text.trim().is_empty() || assistant_text.trim().is_empty() {
            return Err(ChatError::EmptyInput);
        }

        self.messages.push(Message::user(user_text));
        self.messages.push(Message::assistant(assistant_text));
        Ok(())
    }

    /// The newest messages, at most `window_size` of them, oldest first.
    pub fn window(&self) -> &[Message] {
        let start = self.messages.len().saturating_sub(self.window_size);
        &self.messages[start..]
    }

    pub fn transcript(&self) -> Vec<Turn<'_>> {
        transcript::turns(&self.messages)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
