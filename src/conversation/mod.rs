pub mod assembler;
pub mod conversation_state;
pub mod error;
pub mod message;
pub mod persona;
pub mod session;
pub mod transcript;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

pub use assembler::{PromptAssembler, Sampling};
pub use error::ChatError;
pub use message::Message;
pub use session::{Session, SessionHandle, SessionStore};
pub use transcript::Turn;

use crate::groq_client::{ClientError, CompletionProvider};

/// Runs chat turns: validates input, asks the provider, records the result.
pub struct ChatService {
    assembler: PromptAssembler,
    provider: Arc<dyn CompletionProvider>,
    timeout: Duration,
}

impl ChatService {
    pub fn new(assembler: PromptAssembler, provider: Arc<dyn CompletionProvider>, timeout: Duration) -> Self {
        Self {
            assembler,
            provider,
            timeout,
        }
    }

    /// Sends `input` with the session's window and records the turn.
    ///
    /// The session is only modified once a reply has arrived, so a failed or
    /// timed out call leaves no partial turn behind.
    pub async fn submit(&self, session: &mut Session, input: &str) -> Result<String, ChatError> {
        let request = match self.assembler.assemble(session.state().window(), input) {
            Ok(request) => request,
            Err(e) => {
                warn!(session = %session.id(), "Ignoring empty message");
                return Err(e);
            }
        };

        debug!(
            session = %session.id(),
            context_messages = request.messages.len(),
            "Requesting completion"
        );

        let reply = match tokio::time::timeout(self.timeout, self.provider.generate(&request)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                warn!(session = %session.id(), error = %e, "Completion failed");
                return Err(e.into());
            }
            Err(_) => {
                warn!(session = %session.id(), timeout = ?self.timeout, "Completion timed out");
                return Err(ClientError::Timeout(self.timeout).into());
            }
        };

        session.state_mut().append_turn(input.trim(), &reply)?;

        info!(
            session = %session.id(),
            messages = session.state().len(),
            window = session.state().window().len(),
            "Recorded turn"
        );

        Ok(reply)
    }
}
