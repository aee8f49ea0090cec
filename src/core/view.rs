//! # View Port
//!
//! The controller drives the screen only through `ChatView`, so the core
//! never depends on a particular UI. The TUI implements it for real; tests
//! implement it with a recorder.

use crate::core::conversation::Conversation;
use crate::core::render::DisplayOp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A transient, user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: ToastLevel::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: ToastLevel::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: ToastLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: ToastLevel::Error, message: message.into() }
    }
}

pub trait ChatView {
    /// Apply one display operation from the message renderer.
    fn apply(&mut self, op: DisplayOp);

    /// Drop every rendered message except the standing welcome message.
    fn clear_messages(&mut self);

    /// Redraw the conversation list.
    fn refresh_sidebar(&mut self, conversations: &[Conversation], active_id: Option<&str>);

    /// Show or hide the "assistant is composing" indicator.
    fn set_composing(&mut self, visible: bool);

    fn notify(&mut self, toast: Toast);
}
