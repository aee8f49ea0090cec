//! # Transcript Export
//!
//! Plain-text export of a conversation:
//!
//! ```text
//! Conversation: <title>
//! Created: <local datetime>
//!
//! [<local datetime>] USER: <content>
//!
//! [<local datetime>] ASSISTANT: <content>
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use log::info;

use crate::core::conversation::{Conversation, ConversationStore};

#[derive(Debug)]
pub enum ExportError {
    NoActiveConversation,
    Io(io::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::NoActiveConversation => write!(f, "no active conversation"),
            ExportError::Io(e) => write!(f, "export I/O error: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}

fn format_datetime(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%m/%d/%Y, %I:%M:%S %p")
        .to_string()
}

pub fn transcript_file_name(id: &str) -> String {
    format!("conversation-{id}.txt")
}

pub fn render_transcript(conversation: &Conversation) -> String {
    let mut out = format!(
        "Conversation: {}\nCreated: {}\n\n",
        conversation.title,
        format_datetime(conversation.created_at)
    );
    for message in &conversation.messages {
        out.push_str(&format!(
            "[{}] {}: {}\n\n",
            format_datetime(message.timestamp),
            message.sender.label().to_uppercase(),
            message.content
        ));
    }
    out
}

/// Write the active conversation's transcript into `dir`, returning the file path.
pub fn export_active(store: &ConversationStore, dir: &Path) -> Result<PathBuf, ExportError> {
    let conversation = store.active().ok_or(ExportError::NoActiveConversation)?;
    fs::create_dir_all(dir).map_err(ExportError::Io)?;
    let path = dir.join(transcript_file_name(&conversation.id));
    fs::write(&path, render_transcript(conversation)).map_err(ExportError::Io)?;
    info!("Exported conversation {} to {}", conversation.id, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::conversation::Message;
    use crate::core::storage::MemoryStore;

    fn two_message_conversation() -> Conversation {
        let mut conversation = Conversation::new();
        conversation.title = "VPN drops".to_string();
        conversation.messages.push(Message::user("My VPN keeps dropping"));
        conversation.messages.push(Message::assistant("Let's check the client version."));
        conversation
    }

    #[test]
    fn test_transcript_has_one_line_per_message_in_order() {
        let transcript = render_transcript(&two_message_conversation());
        let sender_lines: Vec<&str> = transcript
            .lines()
            .filter(|l| l.contains("USER:") || l.contains("ASSISTANT:"))
            .collect();
        assert_eq!(sender_lines.len(), 2);
        assert!(sender_lines[0].ends_with("USER: My VPN keeps dropping"));
        assert!(sender_lines[1].ends_with("ASSISTANT: Let's check the client version."));
    }

    #[test]
    fn test_transcript_header() {
        let transcript = render_transcript(&two_message_conversation());
        let mut lines = transcript.lines();
        assert_eq!(lines.next(), Some("Conversation: VPN drops"));
        assert!(lines.next().unwrap().starts_with("Created: "));
        assert_eq!(lines.next(), Some(""));
        assert!(lines.next().unwrap().starts_with('['));
    }

    #[test]
    fn test_export_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ConversationStore::open(Arc::new(MemoryStore::default()));
        store.create();
        store.append(Message::user("My VPN keeps dropping"));
        store.append(Message::assistant("Let's check the client version."));

        let path = export_active(&store, dir.path()).unwrap();
        let active = store.active().unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            format!("conversation-{}.txt", active.id)
        );
        let written = fs::read_to_string(path).unwrap();
        assert_eq!(written, render_transcript(active));
    }

    #[test]
    fn test_export_without_active_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConversationStore::open(Arc::new(MemoryStore::default()));
        assert!(matches!(
            export_active(&store, dir.path()),
            Err(ExportError::NoActiveConversation)
        ));
    }
}
