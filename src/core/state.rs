//! # Session Context
//!
//! Everything one chat session owns, passed explicitly to every operation
//! instead of living in globals.
//!
//! ```text
//! SessionContext
//! ├── store: ConversationStore       // conversation list + active pointer
//! ├── staging: AttachmentStaging     // the one pending attachment
//! ├── devices: CaptureDevices        // camera / screen / microphone sessions
//! ├── dialogs: DialogManager         // the one open modal
//! ├── preferences: Preferences       // read at start-up, never written
//! ├── export_dir: PathBuf            // where transcripts land
//! ├── composing: bool                // "assistant is composing" shown
//! └── latest_request: u64            // sequence number of the newest send
//! ```
//!
//! State changes only happen through the controller and `update()` in
//! action.rs.

use std::path::PathBuf;
use std::sync::Arc;

use crate::core::attachment::AttachmentStaging;
use crate::core::conversation::ConversationStore;
use crate::core::dialog::DialogManager;
use crate::core::storage::{self, KeyValueStore, Preferences};
use crate::devices::CaptureDevices;

pub struct SessionContext {
    pub store: ConversationStore,
    pub staging: AttachmentStaging,
    pub devices: CaptureDevices,
    pub dialogs: DialogManager,
    pub preferences: Preferences,
    pub export_dir: PathBuf,
    pub composing: bool,
    latest_request: u64,
}

impl SessionContext {
    pub fn new(storage: Arc<dyn KeyValueStore>, export_dir: impl Into<PathBuf>) -> Self {
        let preferences = storage::load_preferences(storage.as_ref());
        Self {
            store: ConversationStore::open(storage),
            staging: AttachmentStaging::default(),
            devices: CaptureDevices::default(),
            dialogs: DialogManager::default(),
            preferences,
            export_dir: export_dir.into(),
            composing: false,
            latest_request: 0,
        }
    }

    /// Stamp a new outgoing request. Sequence numbers start at 1.
    pub fn next_request(&mut self) -> u64 {
        self.latest_request += 1;
        self.latest_request
    }

    pub fn is_latest(&self, seq: u64) -> bool {
        seq == self.latest_request
    }
}
