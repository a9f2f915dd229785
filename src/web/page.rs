//! Server-side rendering of the chat page.

use std::fmt::Write;

use crate::conversation::Turn;

/// Notice shown above the input bar after a submission that was not recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    Warning(String),
    Error(String),
}

pub const EMPTY_INPUT_WARNING: &str = "Por favor, digite seus sintomas antes de enviar.";

const WELCOME: &str = "Seja bem-vindo ao MedIA!<br><br>\
Sou um sistema de inteligência artificial treinado para auxiliar na análise de sintomas \
e direcionar você para o caminho certo. Baseado em suas respostas, tentarei traçar um \
panorama do que pode estar acontecendo.";

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 0 auto; max-width: 60rem; padding: 0 1rem; }
.chat-input-container {
    position: fixed;
    bottom: 0;
    left: 50%;
    transform: translateX(-50%);
    width: 60%;
    z-index: 1000;
    background-color: #f0f2f6;
    padding: 10px;
    border-top: 1px solid #ddd;
    display: flex;
    gap: 8px;
}
.chat-input-container input[type=text] { flex: 1; padding: 8px; }
#chat-history {
    height: calc(100vh - 150px);
    overflow-y: auto;
    padding-bottom: 60px;
    display: flex;
    flex-direction: column;
}
.message { white-space: pre-wrap; padding: 4px 0; }
.banner { padding: 8px; margin: 8px 0; border-radius: 4px; }
.banner.warning { background: #fff3cd; }
.banner.error { background: #f8d7da; }
"#;

const SCROLL_SCRIPT: &str = r#"
document.addEventListener('DOMContentLoaded', function() {
    const chatHistory = document.getElementById('chat-history');
    if (!chatHistory) { return; }
    const observer = new MutationObserver(() => {
        chatHistory.scrollTop = chatHistory.scrollHeight;
    });
    observer.observe(chatHistory, { childList: true });
    chatHistory.scrollTop = chatHistory.scrollHeight;
});
"#;

/// Renders the whole page for a session's transcript.
pub fn render_page(transcript: &[Turn<'_>], banner: Option<&Banner>) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>MedIA</title>\n<style>");
    html.push_str(STYLE);
    html.push_str("</style>\n</head>\n<body>\n<h1>MedIA</h1>\n<p>");
    html.push_str(WELCOME);
    html.push_str("</p>\n<h3>Respostas do MedIA</h3>\n");

    if !transcript.is_empty() {
        html.push_str("<div id=\"chat-history\">\n");
        html.push_str(&render_transcript(transcript));
        html.push_str("\n</div>\n");
    }

    if let Some(banner) = banner {
        let (class, text) = match banner {
            Banner::Warning(text) => ("warning", text),
            Banner::Error(text) => ("error", text),
        };
        let _ = writeln!(html, "<div class=\"banner {class}\">{}</div>", escape_html(text));
    }

    html.push_str(concat!(
        "<form class=\"chat-input-container\" method=\"post\" action=\"/chat\">",
        "<input type=\"text\" name=\"message\" placeholder=\"Digite seus sintomas\" autofocus autocomplete=\"off\">",
        "<button type=\"submit\">Enviar</button>",
        "<button type=\"submit\" formaction=\"/reset\">Nova conversa</button>",
        "</form>\n<script>"
    ));
    html.push_str(SCROLL_SCRIPT);
    html.push_str("</script>\n</body>\n</html>\n");
    html
}

/// Message blocks for each turn, turns separated by `<hr>`.
pub fn render_transcript(transcript: &[Turn<'_>]) -> String {
    transcript
        .iter()
        .map(|turn| {
            format!(
                "<div class='message user-message'><strong>Você:</strong> {}</div>\
                 <div class='message ai-message'><strong>MedIA:</strong> {}</div>",
                escape_html(turn.user),
                escape_html(turn.assistant)
            )
        })
        .collect::<Vec<_>>()
        .join("<hr>")
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_transcript_has_no_history_block() {
        let html = render_page(&[], None);
        assert!(html.contains("<title>MedIA</title>"));
        assert!(html.contains("Digite seus sintomas"));
        assert!(!html.contains("id=\"chat-history\""));
    }

    #[test]
    fn turns_are_labelled_and_separated() {
        let transcript = [
            Turn { user: "febre", assistant: "Há quanto tempo?" },
            Turn { user: "dois dias", assistant: "Tem tosse?" },
        ];

        let rendered = render_transcript(&transcript);

        assert_eq!(rendered.matches("<hr>").count(), 1);
        assert!(rendered.contains("<strong>Você:</strong> febre"));
        assert!(rendered.contains("<strong>MedIA:</strong> Tem tosse?"));
        assert!(rendered.find("febre").unwrap() < rendered.find("dois dias").unwrap());
    }

    #[test]
    fn user_and_model_text_is_escaped() {
        let transcript = [Turn {
            user: "<script>alert('x')</script>",
            assistant: "a & b",
        }];

        let html = render_page(&transcript, None);

        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(html.contains("a &amp; b"));
    }

    #[test]
    fn banner_is_rendered_with_its_kind() {
        let html = render_page(&[], Some(&Banner::Warning(EMPTY_INPUT_WARNING.to_string())));
        assert!(html.contains("banner warning"));
        assert!(html.contains(EMPTY_INPUT_WARNING));
    }
}
