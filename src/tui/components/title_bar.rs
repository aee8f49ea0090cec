//! # TitleBar Component
//!
//! Top status line: the active conversation's title, the server it talks
//! to, and a "composing" marker while a reply is outstanding.
//!
//! Stateless. Every field is a prop set by the parent each frame:
//!
//! ```rust,ignore
//! let mut title_bar = TitleBar {
//!     title: "Printer setup".to_string(),
//!     server: "http://localhost:5000".to_string(),
//!     composing: true,
//! };
//! title_bar.render(frame, area);
//! ```

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::tui::component::Component;

pub struct TitleBar {
    pub title: String,
    pub server: String,
    pub composing: bool,
}

impl TitleBar {
    fn line(&self) -> Line<'static> {
        let mut spans = vec![
            Span::styled("Confab", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw(" | "),
            Span::raw(self.title.clone()),
            Span::styled(format!(" ({})", self.server), Style::default().fg(Color::DarkGray)),
        ];
        if self.composing {
            spans.push(Span::styled(
                " | Assistant is typing...",
                Style::default().fg(Color::Yellow),
            ));
        }
        Line::from(spans)
    }
}

impl Component for TitleBar {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(self.line(), area);
    }
}
