//! # MessageList Component
//!
//! The scrollable conversation. A standing welcome message sits on top and
//! survives every clear; below it come the rendered messages and, while a
//! reply is outstanding, the composing indicator.
//!
//! ## Scrolling
//!
//! Scroll position is kept as a distance from the bottom, so a list that
//! is pinned (`scroll_from_bottom == 0`) follows new messages. Any change
//! to the message list re-pins it.

use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::core::conversation::Sender;
use crate::core::render::MessageAction;
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;
use crate::tui::markdown;
use crate::tui::view::RenderedMessage;

pub const WELCOME: &str = "Hello! I'm your support assistant. Ask me anything, attach a file \
(Ctrl+U), or share your camera (Ctrl+K), screen (Ctrl+S) or voice (Ctrl+R). Press F1 for help.";

const PAGE: u16 = 10;

#[derive(Default)]
pub struct MessageListState {
    scroll_from_bottom: u16,
    seen_revision: u64,
    /// Largest useful `scroll_from_bottom`, from the last render
    max_scroll: u16,
}

impl MessageListState {
    /// Re-pin to the bottom when the list has changed since the last frame.
    pub fn sync(&mut self, revision: u64) {
        if revision != self.seen_revision {
            self.seen_revision = revision;
            self.scroll_from_bottom = 0;
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.scroll_from_bottom == 0
    }
}

pub struct MessageList<'a> {
    state: &'a mut MessageListState,
    messages: &'a [RenderedMessage],
    composing: bool,
    now: Instant,
}

impl<'a> MessageList<'a> {
    pub fn new(
        state: &'a mut MessageListState,
        messages: &'a [RenderedMessage],
        composing: bool,
        now: Instant,
    ) -> Self {
        Self { state, messages, composing, now }
    }

    fn text(&self) -> Text<'static> {
        let mut text = Text::default();
        push_header(&mut text, Sender::Assistant, "", false, false);
        text.lines.push(Line::styled(WELCOME, Style::default().fg(Color::Green)));

        for message in self.messages {
            text.lines.push(Line::default());
            let copyable = message.actions.contains(&MessageAction::Copy);
            push_header(
                &mut text,
                message.sender,
                &message.timestamp,
                copyable,
                message.is_fresh(self.now),
            );
            let body = markdown::render(&message.body, role_color(message.sender));
            text.lines.extend(body.lines);
        }

        if self.composing {
            text.lines.push(Line::default());
            text.lines.push(Line::styled(
                "Assistant is typing...",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            ));
        }
        text
    }
}

fn role_color(sender: Sender) -> Color {
    match sender {
        Sender::User => Color::Cyan,
        Sender::Assistant => Color::Green,
    }
}

fn push_header(text: &mut Text<'static>, sender: Sender, time: &str, copyable: bool, fresh: bool) {
    let mut style = Style::default().fg(role_color(sender)).add_modifier(Modifier::BOLD);
    if fresh {
        style = style.add_modifier(Modifier::REVERSED);
    }
    let name = match sender {
        Sender::User => "You",
        Sender::Assistant => "Assistant",
    };
    let mut spans = vec![Span::styled(name, style)];
    if !time.is_empty() {
        spans.push(Span::styled(format!("  {time}"), Style::default().fg(Color::DarkGray)));
    }
    if copyable {
        spans.push(Span::styled("  [Ctrl+Y copy]", Style::default().fg(Color::DarkGray)));
    }
    text.lines.push(Line::from(spans));
}

impl Component for MessageList<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::TOP | Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(self.text()).wrap(Wrap { trim: false });

        let inner_height = area.height.saturating_sub(2);
        let total = paragraph.line_count(area.width) as u16;
        let max_scroll = total.saturating_sub(inner_height);
        self.state.max_scroll = max_scroll;
        self.state.scroll_from_bottom = self.state.scroll_from_bottom.min(max_scroll);

        let offset = max_scroll - self.state.scroll_from_bottom;
        let block = if self.state.is_pinned() {
            block
        } else {
            block.title_bottom(Line::styled(" ↓ more ", Style::default().fg(Color::Yellow)).right_aligned())
        };
        frame.render_widget(paragraph.block(block).scroll((offset, 0)), area);
    }
}

impl EventHandler for MessageList<'_> {
    type Event = ();

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        let state = &mut *self.state;
        let before = state.scroll_from_bottom;
        state.scroll_from_bottom = match event {
            TuiEvent::ScrollUp => before.saturating_add(1),
            TuiEvent::ScrollDown => before.saturating_sub(1),
            TuiEvent::ScrollPageUp => before.saturating_add(PAGE),
            TuiEvent::ScrollPageDown => before.saturating_sub(PAGE),
            _ => return None,
        }
        .min(state.max_scroll);
        (state.scroll_from_bottom != before).then_some(())
    }
}
