pub mod prompt;

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use color_print::cformat;
use eyre::Result;
use prompt::generate_prompt;
use rustyline::error::ReadlineError;
use tracing::debug;
use uuid::Uuid;

use crate::conversation::{ChatError, ChatService, Session, Turn};

const WELCOME_TEXT: &str = "
Seja bem-vindo ao MedIA!

Sou um sistema de inteligência artificial treinado para auxiliar na análise de sintomas
e direcionar você para o caminho certo. Baseado em suas respostas, tentarei traçar um
panorama do que pode estar acontecendo.

/help         Mostrar a ajuda
/quit         Sair do aplicativo
";

const HELP_TEXT: &str = "
MedIA

/clear        Iniciar uma nova conversa
/history      Mostrar a conversa até agora
/help         Mostrar esta ajuda
/quit         Sair do aplicativo
";

/// Terminal front end driving a single session.
pub struct ChatContext {
    output: Box<dyn Write>,
    input: Option<String>,
    interactive: bool,
    chat: Arc<ChatService>,
    session: Session,
}

impl ChatContext {
    pub fn new(
        output: Box<dyn Write>,
        input: Option<String>,
        interactive: bool,
        chat: Arc<ChatService>,
        window_size: usize,
    ) -> Self {
        Self {
            output,
            input,
            interactive,
            chat,
            session: Session::new(Uuid::new_v4(), window_size),
        }
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        // Handle non-interactive mode (single query)
        if let Some(input) = self.input.take() {
            return Ok(if self.run_single(&input).await? {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            });
        }

        if self.interactive {
            self.print_welcome()?;
            self.run_interactive().await?;
        }

        Ok(ExitCode::SUCCESS)
    }

    /// Answers one message; returns whether a reply was produced.
    async fn run_single(&mut self, input: &str) -> Result<bool> {
        match self.process_chat_input(input).await {
            Ok(answered) => Ok(answered),
            Err(e) => {
                writeln!(self.output, "{}", cformat!("<red>Erro:</red> {}", e))?;
                Ok(false)
            }
        }
    }

    fn print_welcome(&mut self) -> Result<()> {
        writeln!(self.output, "{}", WELCOME_TEXT)?;
        Ok(())
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut rl = prompt::rl()?;
        let history = prompt::history_path();
        if let Some(path) = &history {
            if rl.load_history(path).is_err() {
                debug!("No readline history at {}", path.display());
            }
        }

        loop {
            let prompt_text = generate_prompt(self.session.state().transcript().len());

            match rl.readline(&prompt_text) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    rl.add_history_entry(line.as_str());

                    if line.trim() == "/quit" {
                        break;
                    }

                    if let Err(e) = self.handle_input(&line).await {
                        writeln!(self.output, "{}", cformat!("<red>Erro:</red> {}", e))?;
                    }
                }
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => {
                    writeln!(self.output, "Erro: {}", e)?;
                    break;
                }
            }
        }

        if let Some(path) = &history {
            if let Err(e) = rl.save_history(path) {
                debug!("Failed to save readline history: {}", e);
            }
        }

        Ok(())
    }

    async fn handle_input(&mut self, input: &str) -> Result<()> {
        match input.trim() {
            "/help" => {
                writeln!(self.output, "{}", HELP_TEXT)?;
            }
            "/clear" => {
                if self.session.state().is_empty() {
                    writeln!(self.output, "Nada para apagar.")?;
                } else {
                    self.session.state_mut().clear();
                    writeln!(self.output, "Conversa apagada.")?;
                }
            }
            "/history" => {
                let rendered = render_transcript(&self.session.state().transcript());
                writeln!(self.output, "{}", rendered)?;
            }
            _ => {
                self.process_chat_input(input).await?;
            }
        }

        Ok(())
    }

    /// Returns `false` when the message was rejected locally.
    async fn process_chat_input(&mut self, input: &str) -> Result<bool> {
        match self.chat.submit(&mut self.session, input).await {
            Ok(reply) => {
                writeln!(self.output, "{}\n", cformat!("<green><bold>MedIA:</bold></green> {}", reply))?;
                Ok(true)
            }
            Err(ChatError::EmptyInput) => {
                writeln!(
                    self.output,
                    "{}",
                    cformat!("<yellow>Por favor, digite seus sintomas antes de enviar.</yellow>")
                )?;
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Plain-text rendering of a transcript for the terminal.
pub fn render_transcript(transcript: &[Turn<'_>]) -> String {
    if transcript.is_empty() {
        return "Nenhuma mensagem ainda.".to_string();
    }

    transcript
        .iter()
        .map(|turn| format!("Você: {}\nMedIA: {}", turn.user, turn.assistant))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;
    use crate::conversation::tests::{service, ScriptedProvider};
    use crate::groq_client::ClientError;

    /// Writer that keeps everything written to it.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn context(provider: ScriptedProvider, input: Option<&str>) -> (ChatContext, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let chat = Arc::new(service(Arc::new(provider), Duration::from_secs(5)));
        let context = ChatContext::new(
            Box::new(buffer.clone()),
            input.map(str::to_string),
            false,
            chat,
            10,
        );
        (context, buffer)
    }

    #[tokio::test]
    async fn single_shot_prints_reply() {
        let (mut ctx, out) = context(ScriptedProvider::replying(&["Há quanto tempo?"]), Some("febre"));

        ctx.run().await.unwrap();

        assert!(ctx.input.is_none());
        assert!(out.contents().contains("Há quanto tempo?"));
        assert_eq!(ctx.session.state().len(), 2);
    }

    #[tokio::test]
    async fn single_shot_empty_input_warns() {
        let (mut ctx, out) = context(ScriptedProvider::replying(&["unused"]), None);

        assert!(!ctx.run_single("  ").await.unwrap());
        assert!(out.contents().contains("digite seus sintomas"));
        assert!(ctx.session.state().is_empty());
    }

    #[tokio::test]
    async fn single_shot_provider_failure_is_reported() {
        let provider = ScriptedProvider::new(vec![Err(ClientError::Network("connection refused".into()))]);
        let (mut ctx, out) = context(provider, None);

        assert!(!ctx.run_single("febre").await.unwrap());
        assert!(out.contents().contains("connection refused"));
        assert!(ctx.session.state().is_empty());
    }

    #[tokio::test]
    async fn commands_show_and_clear_history() {
        let (mut ctx, out) = context(ScriptedProvider::replying(&["Tem tosse?"]), None);

        ctx.handle_input("febre").await.unwrap();
        ctx.handle_input("/history").await.unwrap();
        assert!(out.contents().contains("Você: febre\nMedIA: Tem tosse?"));

        ctx.handle_input("/clear").await.unwrap();
        assert!(ctx.session.state().is_empty());
        assert!(out.contents().contains("Conversa apagada."));

        ctx.handle_input("/clear").await.unwrap();
        assert!(out.contents().contains("Nada para apagar."));
    }

    #[tokio::test]
    async fn help_and_failures_are_in_portuguese() {
        let provider = ScriptedProvider::new(vec![Err(ClientError::Network("connection refused".into()))]);
        let (mut ctx, out) = context(provider, None);

        ctx.handle_input("/help").await.unwrap();
        ctx.run_single("febre").await.unwrap();

        let text = out.contents();
        assert!(text.contains("Iniciar uma nova conversa"));
        assert!(text.contains("Sair do aplicativo"));
        assert!(text.contains("Erro:"));
        assert!(!text.contains("Show"));
        assert!(!text.contains("Error:"));
    }

    #[test]
    fn empty_transcript_renders_placeholder() {
        assert_eq!(render_transcript(&[]), "Nenhuma mensagem ainda.");
    }
}
