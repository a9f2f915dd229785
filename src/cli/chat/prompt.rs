use std::path::PathBuf;

use rustyline::{Config, Editor, Result};

const HISTORY_FILE: &str = ".media_chat_history";

/// Prompt shown before each line, numbered by the turn about to be sent.
pub fn generate_prompt(completed_turns: usize) -> String {
    format!("[{}] Você > ", completed_turns + 1)
}

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .history_ignore_dups(true)
        .max_history_size(1000)
        .auto_add_history(false)
        .build();
    Editor::with_config(config)
}

pub fn history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(HISTORY_FILE))
}
