//! # StatusBar Component
//!
//! One line above the composer: the staged attachment chip on the left,
//! the newest unexpired toast on the right.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::core::attachment::Attachment;
use crate::core::view::{Toast, ToastLevel};
use crate::tui::component::Component;

pub struct StatusBar<'a> {
    pub attachment: Option<&'a Attachment>,
    pub toast: Option<&'a Toast>,
}

impl StatusBar<'_> {
    fn chip(&self) -> Line<'static> {
        match self.attachment {
            Some(attachment) => Line::from(vec![
                Span::styled(
                    format!(" 📎 {} ({}) ", attachment.label(), attachment.display_size()),
                    Style::default().fg(Color::Black).bg(Color::Cyan),
                ),
                Span::styled(" Ctrl+X remove", Style::default().fg(Color::DarkGray)),
            ]),
            None => Line::default(),
        }
    }

    fn toast_line(&self) -> Line<'static> {
        let Some(toast) = self.toast else {
            return Line::default();
        };
        let color = match toast.level {
            ToastLevel::Info => Color::Blue,
            ToastLevel::Success => Color::Green,
            ToastLevel::Warning => Color::Yellow,
            ToastLevel::Error => Color::Red,
        };
        Line::styled(
            toast.message.clone(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )
        .right_aligned()
    }
}

impl Component for StatusBar<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let [left, right] =
            Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)]).areas(area);
        frame.render_widget(self.chip(), left);
        frame.render_widget(self.toast_line(), right);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attachment::ImageOrigin;

    #[test]
    fn test_chip_shows_label_and_size() {
        let data = format!("data:image/png;base64,{}", "A".repeat(4096));
        let attachment = Attachment::InlineImage { data, origin: ImageOrigin::Camera };
        let bar = StatusBar { attachment: Some(&attachment), toast: None };
        let text: String = bar.chip().spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("Camera photo (3 KB)"));
    }

    #[test]
    fn test_no_attachment_no_chip() {
        let bar = StatusBar { attachment: None, toast: None };
        assert!(bar.chip().spans.is_empty());
        assert!(bar.toast_line().spans.is_empty());
    }

    #[test]
    fn test_error_toast_is_red() {
        let toast = Toast::error("Failed to send message. Please try again.");
        let bar = StatusBar { attachment: None, toast: Some(&toast) };
        let line = bar.toast_line();
        assert_eq!(line.style.fg, Some(Color::Red));
    }
}
