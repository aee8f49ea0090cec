//! # Sidebar Component
//!
//! Conversation list on the left. Tab moves focus here; Up/Down then switch
//! the active conversation directly.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `SidebarState` lives in `TuiState`
//! - `Sidebar` is created each frame with borrowed state and entries

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Padding, Paragraph};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;
use crate::tui::view::SidebarEntry;

#[derive(Default)]
pub struct SidebarState {
    pub focused: bool,
    list_state: ListState,
}

/// Events emitted by the sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarEvent {
    Load(String),
}

pub struct Sidebar<'a> {
    state: &'a mut SidebarState,
    entries: &'a [SidebarEntry],
}

impl<'a> Sidebar<'a> {
    pub fn new(state: &'a mut SidebarState, entries: &'a [SidebarEntry]) -> Self {
        Self { state, entries }
    }

    fn active(&self) -> Option<usize> {
        self.entries.iter().position(|e| e.active)
    }
}

impl EventHandler for Sidebar<'_> {
    type Event = SidebarEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        if self.entries.is_empty() {
            return None;
        }
        let current = self.active().unwrap_or(0);
        let target = match event {
            TuiEvent::CursorUp => current.saturating_sub(1),
            TuiEvent::CursorDown => (current + 1).min(self.entries.len() - 1),
            _ => return None,
        };
        (target != current || self.active().is_none())
            .then(|| SidebarEvent::Load(self.entries[target].id.clone()))
    }
}

impl Component for Sidebar<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let border = if self.state.focused { Color::Green } else { Color::DarkGray };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(" Conversations ")
            .padding(Padding::horizontal(1));

        if self.entries.is_empty() {
            let empty = Paragraph::new("No conversations yet")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let inner_width = area.width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = self
            .entries
            .iter()
            .map(|entry| {
                let style = if entry.active {
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD | Modifier::REVERSED)
                } else {
                    Style::default().fg(Color::Gray)
                };
                let title = truncate_str(&entry.title, inner_width);
                let pad = inner_width.saturating_sub(title.width());
                ListItem::new(vec![
                    Line::from(Span::styled(format!("{title}{}", " ".repeat(pad)), style)),
                    Line::from(Span::styled(
                        format!("{} msgs", entry.message_count),
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
            })
            .collect();

        self.state.list_state.select(self.active());
        frame.render_stateful_widget(List::new(items).block(block), area, &mut self.state.list_state);
    }
}

/// Truncate to `max_width` chars, adding "..." if needed.
/// Cut `s` to at most `max_width` terminal columns, ending in "..." when shortened.
fn truncate_str(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }
    let budget = max_width - 3;
    let mut used = 0;
    let mut kept = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        kept.push(c);
    }
    format!("{kept}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(active: usize) -> Vec<SidebarEntry> {
        (0..3)
            .map(|i| SidebarEntry {
                id: format!("c{i}"),
                title: format!("Chat {i}"),
                message_count: i,
                active: i == active,
            })
            .collect()
    }

    #[test]
    fn test_down_loads_next_conversation() {
        let mut state = SidebarState::default();
        let list = entries(0);
        let mut sidebar = Sidebar::new(&mut state, &list);
        assert_eq!(
            sidebar.handle_event(&TuiEvent::CursorDown),
            Some(SidebarEvent::Load("c1".into()))
        );
    }

    #[test]
    fn test_up_at_top_does_nothing() {
        let mut state = SidebarState::default();
        let list = entries(0);
        let mut sidebar = Sidebar::new(&mut state, &list);
        assert_eq!(sidebar.handle_event(&TuiEvent::CursorUp), None);
    }

    #[test]
    fn test_empty_list_ignores_keys() {
        let mut state = SidebarState::default();
        let mut sidebar = Sidebar::new(&mut state, &[]);
        assert_eq!(sidebar.handle_event(&TuiEvent::CursorDown), None);
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("a long conversation title", 10), "a long ...");
        assert_eq!(truncate_str("abcdef", 2), "..");
        // Wide glyphs count two columns each
        assert_eq!(truncate_str("打印机坏了怎么办", 9), "打印机...");
    }
}
