use serde::Serialize;

use super::message::{Message, Role};

/// One rendered exchange of the display transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Turn<'a> {
    pub user: &'a str,
    pub assistant: &'a str,
}

/// Pairs a message log into turns.
///
/// Logs are appended a turn at a time, so every user message is followed by
/// its reply. A trailing unanswered message is not shown.
pub fn turns(messages: &[Message]) -> Vec<Turn<'_>> {
    messages
        .chunks_exact(2)
        .filter_map(|pair| match (pair[0].role(), pair[1].role()) {
            (Role::User, Role::Assistant) => Some(Turn {
                user: pair[0].content(),
                assistant: pair[1].content(),
            }),
            _ => None,
        })
        .collect()
}
