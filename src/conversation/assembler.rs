use super::error::ChatError;
use super::message::Message;
use crate::groq_client::ChatRequest;

/// Sampling options copied into every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Builds provider requests from the persona, the session window and the
/// newest user message.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    persona: String,
    model: String,
    sampling: Sampling,
}

impl PromptAssembler {
    pub fn new(persona: impl Into<String>, model: impl Into<String>, sampling: Sampling) -> Self {
        Self {
            persona: persona.into(),
            model: model.into(),
            sampling,
        }
    }

    /// Produces `[persona, ...window, user_input]`.
    pub fn assemble(&self, window: &[Message], user_input: &str) -> Result<ChatRequest, ChatError> {
        let user_input = user_input.trim();
        if user_input.is_empty() {
            return Err(ChatError::EmptyInput);
        }

        let mut messages = Vec::with_capacity(window.len() + 2);
        messages.push(Message::system(self.persona.as_str()));
        messages.extend_from_slice(window);
        messages.push(Message::user(user_input));

        Ok(ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: self.sampling.temperature,
            max_tokens: self.sampling.max_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::message::Role;

    fn assembler() -> PromptAssembler {
        PromptAssembler::new(
            "persona",
            "llama3-8b-8192",
            Sampling {
                temperature: 0.5,
                max_tokens: 1024,
            },
        )
    }

    #[test]
    fn request_is_persona_then_history_then_input() {
        let window = vec![Message::user("febre"), Message::assistant("Há quanto tempo?")];

        let request = assembler().assemble(&window, "dois dias").unwrap();

        let roles: Vec<Role> = request.messages.iter().map(Message::role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(request.messages[0].content(), "persona");
        assert_eq!(request.messages[1].content(), "febre");
        assert_eq!(request.messages[3].content(), "dois dias");
        assert_eq!(request.model, "llama3-8b-8192");
        assert_eq!(request.max_tokens, 1024);
    }

    #[test]
    fn first_turn_has_only_persona_and_input() {
        let request = assembler().assemble(&[], "  tosse  ").unwrap();

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[1], Message::user("tosse"));
    }

    #[test]
    fn blank_input_is_rejected() {
        assert!(matches!(assembler().assemble(&[], ""), Err(ChatError::EmptyInput)));
        assert!(matches!(assembler().assemble(&[], " \n\t"), Err(ChatError::EmptyInput)));
    }
}
