use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};
use log::{debug, warn};

/// TUI-specific input events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    // Global shortcuts (turned into core actions by the loop)
    Quit,
    Submit,
    NewConversation,
    Export,
    DeleteAll,
    AttachFile,
    OpenCamera,
    OpenScreen,
    OpenMicrophone,
    CopyLastReply,
    ClearAttachment,
    Help,
    Escape,

    // TUI-local events (editing, focus, scrolling)
    InputChar(char),
    Paste(String), // Bracketed paste - preserves newlines
    Backspace,
    Delete,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    CursorUp,
    CursorDown,
    ToggleFocus,
    ScrollPageUp,
    ScrollPageDown,
    ScrollUp,
    ScrollDown,
    Resize,
}

/// Poll for an event without blocking (returns immediately)
pub fn poll_event_immediate() -> Option<TuiEvent> {
    poll_event_timeout(Duration::ZERO)
}

/// Wait up to `timeout` for the next event. Terminal read errors are logged
/// and treated as "no event".
pub fn poll_event_timeout(timeout: Duration) -> Option<TuiEvent> {
    match event::poll(timeout) {
        Ok(true) => {}
        Ok(false) => return None,
        Err(e) => {
            warn!("Failed to poll terminal events: {}", e);
            return None;
        }
    }
    let event = match event::read() {
        Ok(event) => event,
        Err(e) => {
            warn!("Failed to read terminal event: {}", e);
            return None;
        }
    };
    match event {
        Event::Key(key_event) if key_event.kind != KeyEventKind::Release => {
            debug!("Key event: {:?} with modifiers {:?}", key_event.code, key_event.modifiers);
            map_key(key_event.modifiers, key_event.code)
        }
        Event::Mouse(mouse_event) => match mouse_event.kind {
            MouseEventKind::ScrollUp => Some(TuiEvent::ScrollUp),
            MouseEventKind::ScrollDown => Some(TuiEvent::ScrollDown),
            _ => None,
        },
        Event::Paste(data) => Some(TuiEvent::Paste(data)),
        Event::Resize(_, _) => Some(TuiEvent::Resize),
        _ => None,
    }
}

pub fn map_key(modifiers: KeyModifiers, code: KeyCode) -> Option<TuiEvent> {
    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(TuiEvent::Quit),
            // Ctrl+J inserts newline (ASCII LF; Ctrl+Enter sends this in most terminals)
            KeyCode::Char('j') | KeyCode::Enter => Some(TuiEvent::InputChar('\n')),
            KeyCode::Char('n') => Some(TuiEvent::NewConversation),
            KeyCode::Char('e') => Some(TuiEvent::Export),
            KeyCode::Char('d') => Some(TuiEvent::DeleteAll),
            KeyCode::Char('u') => Some(TuiEvent::AttachFile),
            KeyCode::Char('k') => Some(TuiEvent::OpenCamera),
            KeyCode::Char('s') => Some(TuiEvent::OpenScreen),
            KeyCode::Char('r') => Some(TuiEvent::OpenMicrophone),
            KeyCode::Char('y') => Some(TuiEvent::CopyLastReply),
            KeyCode::Char('x') => Some(TuiEvent::ClearAttachment),
            _ => None,
        };
    }
    match code {
        KeyCode::Char(c) => Some(TuiEvent::InputChar(c)),
        KeyCode::Enter => Some(TuiEvent::Submit),
        KeyCode::Backspace => Some(TuiEvent::Backspace),
        KeyCode::Delete => Some(TuiEvent::Delete),
        KeyCode::Left => Some(TuiEvent::CursorLeft),
        KeyCode::Right => Some(TuiEvent::CursorRight),
        KeyCode::Home => Some(TuiEvent::CursorHome),
        KeyCode::End => Some(TuiEvent::CursorEnd),
        KeyCode::Up => Some(TuiEvent::CursorUp),
        KeyCode::Down => Some(TuiEvent::CursorDown),
        KeyCode::Tab | KeyCode::BackTab => Some(TuiEvent::ToggleFocus),
        KeyCode::PageUp => Some(TuiEvent::ScrollPageUp),
        KeyCode::PageDown => Some(TuiEvent::ScrollPageDown),
        KeyCode::F(1) => Some(TuiEvent::Help),
        KeyCode::Esc => Some(TuiEvent::Escape),
        _ => None,
    }
}
