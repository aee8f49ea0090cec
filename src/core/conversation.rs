//! # Conversations
//!
//! The ordered list of conversations and the active-conversation pointer.
//!
//! ```text
//! ConversationStore
//! ├── conversations: Vec<Conversation>   // newest first
//! ├── active_id: Option<String>          // the conversation new messages go to
//! └── storage: Arc<dyn KeyValueStore>    // written in full on every mutation
//! ```
//!
//! The store is pure state plus persistence. View side effects (sidebar
//! refresh, message replay) are driven by the controller.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::core::storage::{self, KeyValueStore};

/// Title shown until the first user message names the conversation.
pub const DEFAULT_TITLE: &str = "New Conversation";

/// Titles are cut to this many characters.
pub const TITLE_MAX_CHARS: usize = 50;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant", alias = "bot")]
    Assistant,
}

impl Sender {
    pub fn label(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

/// A single chat message. Immutable once appended.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(sender: Sender, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sender,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Sender::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, content)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: new_conversation_id(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a new UUID v4 conversation ID.
pub fn new_conversation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Derive a title from the first user message: the first 50 characters,
/// followed by "..." only when something was cut off.
pub fn derive_title(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

pub struct ConversationStore {
    conversations: Vec<Conversation>,
    active_id: Option<String>,
    storage: Arc<dyn KeyValueStore>,
}

impl ConversationStore {
    /// Load the persisted list. Nothing is active until the caller picks.
    pub fn open(storage: Arc<dyn KeyValueStore>) -> Self {
        let conversations = storage::load_conversations(storage.as_ref());
        debug!("Loaded {} conversations", conversations.len());
        Self {
            conversations,
            active_id: None,
            storage,
        }
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&Conversation> {
        let id = self.active_id.as_deref()?;
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Insert a new empty conversation at the front and make it active.
    pub fn create(&mut self) -> &Conversation {
        let conversation = Conversation::new();
        self.active_id = Some(conversation.id.clone());
        self.conversations.insert(0, conversation);
        self.persist();
        &self.conversations[0]
    }

    /// Make `id` active. Returns `None` (state unchanged) if it doesn't exist.
    /// Read-only: nothing is persisted.
    pub fn load(&mut self, id: &str) -> Option<&Conversation> {
        let index = self.conversations.iter().position(|c| c.id == id)?;
        self.active_id = Some(id.to_string());
        Some(&self.conversations[index])
    }

    /// Append to the active conversation. Silently ignored (returns false)
    /// when nothing is active.
    pub fn append(&mut self, message: Message) -> bool {
        let Some(id) = self.active_id.as_deref() else {
            debug!("append ignored: no active conversation");
            return false;
        };
        let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == id) else {
            warn!("append ignored: active conversation {} is missing", id);
            return false;
        };

        conversation.updated_at = Utc::now();
        let names_conversation = conversation.messages.is_empty() && message.sender == Sender::User;
        if names_conversation {
            conversation.title = derive_title(&message.content);
        }
        conversation.messages.push(message);

        self.persist();
        true
    }

    /// Erase every conversation. Only acts when `confirmed`; returns whether
    /// anything happened.
    pub fn delete_all(&mut self, confirmed: bool) -> bool {
        if !confirmed {
            return false;
        }
        self.conversations.clear();
        self.active_id = None;
        self.persist();
        true
    }

    /// Full rewrite of the list. Failures are logged, never raised.
    fn persist(&self) {
        if let Err(e) = storage::save_conversations(self.storage.as_ref(), &self.conversations) {
            warn!("Failed to save conversations: {}", e);
        }
    }
}
