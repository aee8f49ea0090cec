//! The terminal's implementation of the core `ChatView` port.
//!
//! The controller pushes display operations and notifications in here;
//! the components read them back out at draw time.

use std::time::{Duration, Instant};

use log::debug;

use crate::core::conversation::{Conversation, Sender};
use crate::core::render::{DisplayOp, MarkupSpan, MessageAction};
use crate::core::view::{ChatView, Toast};

/// How long a freshly arrived message stays highlighted.
const FRESH_FOR: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone)]
pub struct RenderedMessage {
    pub sender: Sender,
    pub body: Vec<MarkupSpan>,
    pub timestamp: String,
    pub actions: Vec<MessageAction>,
    arrived: Option<Instant>,
}

impl RenderedMessage {
    pub fn is_fresh(&self, now: Instant) -> bool {
        self.arrived.is_some_and(|t| now.duration_since(t) < FRESH_FOR)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarEntry {
    pub id: String,
    pub title: String,
    pub message_count: usize,
    pub active: bool,
}

pub struct TuiView {
    pub messages: Vec<RenderedMessage>,
    pub sidebar: Vec<SidebarEntry>,
    pub composing: bool,
    toasts: Vec<(Toast, Instant)>,
    toast_ttl: Duration,
    /// Bumped whenever the message list changes, so the list can re-pin.
    pub revision: u64,
}

impl TuiView {
    pub fn new(toast_seconds: u64) -> Self {
        Self {
            messages: Vec::new(),
            sidebar: Vec::new(),
            composing: false,
            toasts: Vec::new(),
            toast_ttl: Duration::from_secs(toast_seconds),
            revision: 0,
        }
    }

    /// Newest toast that has not expired yet.
    pub fn current_toast(&self, now: Instant) -> Option<&Toast> {
        self.toasts
            .iter()
            .rev()
            .find(|(_, at)| now.duration_since(*at) < self.toast_ttl)
            .map(|(toast, _)| toast)
    }

    /// Drop expired toasts. Returns true when something was removed.
    pub fn prune_toasts(&mut self, now: Instant) -> bool {
        let before = self.toasts.len();
        let ttl = self.toast_ttl;
        self.toasts.retain(|(_, at)| now.duration_since(*at) < ttl);
        self.toasts.len() != before
    }

    pub fn active_index(&self) -> Option<usize> {
        self.sidebar.iter().position(|entry| entry.active)
    }
}

impl ChatView for TuiView {
    fn apply(&mut self, op: DisplayOp) {
        self.revision += 1;
        if let DisplayOp::Begin { sender, animate } = op {
            self.messages.push(RenderedMessage {
                sender,
                body: Vec::new(),
                timestamp: String::new(),
                actions: Vec::new(),
                arrived: animate.then(Instant::now),
            });
            return;
        }
        let Some(message) = self.messages.last_mut() else {
            debug!("Display op without an open message: {:?}", op);
            return;
        };
        match op {
            DisplayOp::Body(spans) => message.body = spans,
            DisplayOp::Timestamp(time) => message.timestamp = time,
            DisplayOp::Actions(actions) => message.actions = actions,
            DisplayOp::Begin { .. } | DisplayOp::End => {}
        }
    }

    fn clear_messages(&mut self) {
        self.messages.clear();
        self.revision += 1;
    }

    fn refresh_sidebar(&mut self, conversations: &[Conversation], active_id: Option<&str>) {
        self.sidebar = conversations
            .iter()
            .map(|c| SidebarEntry {
                id: c.id.clone(),
                title: c.title.clone(),
                message_count: c.messages.len(),
                active: Some(c.id.as_str()) == active_id,
            })
            .collect();
    }

    fn set_composing(&mut self, visible: bool) {
        self.composing = visible;
        self.revision += 1;
    }

    fn notify(&mut self, toast: Toast) {
        debug!("Toast ({:?}): {}", toast.level, toast.message);
        self.toasts.push((toast, Instant::now()));
    }
}
