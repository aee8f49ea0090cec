//! # TUI Components
//!
//! This module contains all UI components for the terminal interface.
//!
//! ## Component Architecture
//!
//! Components in this directory follow two patterns:
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! Simple display components that receive all data as struct fields:
//! - `TitleBar`: active conversation, server, composing marker
//! - `StatusBar`: attachment chip and the newest toast
//!
//! ### Stateful Components (Event-Driven)
//!
//! Components that manage local state and emit events:
//! - `Composer`: text input with the character counter
//! - `Sidebar`: conversation list, emits `Load(id)` on Up/Down
//! - `MessageList`: scrollable conversation, pinned to the bottom
//! - `DialogOverlay`: modal for capture devices, upload, confirm, help;
//!   emits core `Action`s directly
//!
//! ### Co-location of Concerns
//!
//! Each component file holds its state type, event type, rendering,
//! event handling and tests.
//!
//! ### Props-Based Data Flow
//!
//! Components receive external data as props, never by reaching into the
//! session context themselves:
//!
//! ```rust,ignore
//! let mut status = StatusBar {
//!     attachment: ctx.staging.current(),
//!     toast: tui.view.current_toast(now),
//! };
//! status.render(frame, area);
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! components/
//! ├── mod.rs           (this file)
//! ├── title_bar.rs     (top status line)
//! ├── sidebar.rs       (conversation list)
//! ├── message_list.rs  (scrollable conversation)
//! ├── status_bar.rs    (attachment chip + toast)
//! ├── composer.rs      (message input)
//! └── dialog.rs        (modal overlay)
//! ```

mod composer;
mod dialog;
mod message_list;
mod sidebar;
mod status_bar;
mod title_bar;

pub use composer::{Composer, ComposerEvent};
pub use dialog::{DialogOverlay, DialogState};
pub use message_list::{MessageList, MessageListState};
pub use sidebar::{Sidebar, SidebarEvent, SidebarState};
pub use status_bar::StatusBar;
pub use title_bar::TitleBar;
