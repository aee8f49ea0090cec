//! # Composer Component
//!
//! The message input at the bottom of the screen.
//!
//! ## Responsibilities
//!
//! - Capture text input and paste
//! - Editing (backspace, delete, cursor movement within the line)
//! - Submission (Enter); Ctrl+J inserts a newline instead
//! - Character counter that turns yellow past 70% and red past 90% of the
//!   soft limit
//!
//! The buffer is internal state. The limit is a prop from configuration and
//! is never enforced, only shown.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Paragraph};

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Border (2) + padding (2) consumed horizontally by the bordered block
const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders consumed vertically
const VERTICAL_OVERHEAD: u16 = 2;
/// Maximum visible content lines before internal scrolling kicks in
const MAX_VISIBLE_LINES: u16 = 5;
const BORDER_OFFSET: u16 = 1;

#[derive(Debug, Clone, PartialEq)]
pub enum ComposerEvent {
    /// Enter pressed. The text may be blank when only an attachment is sent.
    Submit(String),
    ContentChanged,
}

pub struct Composer {
    pub buffer: String,
    /// Soft character limit (Prop)
    pub max_chars: usize,
    /// Whether keystrokes currently go here (Prop)
    pub focused: bool,
    /// Byte offset of the cursor in `buffer`
    pos: usize,
    scroll_offset: u16,
}

impl Composer {
    pub fn new(max_chars: usize) -> Self {
        Self {
            buffer: String::new(),
            max_chars,
            focused: true,
            pos: 0,
            scroll_offset: 0,
        }
    }

    pub fn char_count(&self) -> usize {
        self.buffer.chars().count()
    }

    /// Counter colour: gray, then yellow past 70%, red past 90%.
    pub fn counter_color(&self) -> Color {
        let count = self.char_count() as f64;
        let max = self.max_chars as f64;
        if count > max * 0.9 {
            Color::Red
        } else if count > max * 0.7 {
            Color::Yellow
        } else {
            Color::DarkGray
        }
    }

    /// Required height for the current buffer, clamped to the viewport limit.
    pub fn calculate_height(&self, content_width: u16) -> u16 {
        let lines = wrap_line_count(&self.buffer, inner_width(content_width));
        lines.min(MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }

    fn cursor_line(&self, width: u16) -> u16 {
        if width == 0 {
            return 0;
        }
        let before = &self.buffer[..self.pos];
        let lines = textwrap::wrap(before, wrap_options(width));
        let mut line = lines.len().saturating_sub(1) as u16;
        if before.ends_with('\n') && !lines.last().is_some_and(|l| l.is_empty()) {
            line += 1;
        }
        line
    }

    fn cursor_column(&self, width: u16) -> u16 {
        let before = &self.buffer[..self.pos];
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let logical = &before[line_start..];
        // textwrap trims trailing spaces, so count chars instead of measuring segments
        let segments = textwrap::wrap(logical, wrap_options(width.max(1)));
        let consumed: usize = segments
            .iter()
            .take(segments.len().saturating_sub(1))
            .map(|seg| seg.chars().count())
            .sum();
        logical.chars().count().saturating_sub(consumed) as u16
    }

    fn update_scroll_offset(&mut self, width: u16) {
        let total = wrap_line_count(&self.buffer, width);
        if total <= MAX_VISIBLE_LINES {
            self.scroll_offset = 0;
            return;
        }
        let line = self.cursor_line(width);
        if line < self.scroll_offset {
            self.scroll_offset = line;
        } else if line >= self.scroll_offset + MAX_VISIBLE_LINES {
            self.scroll_offset = line.saturating_sub(MAX_VISIBLE_LINES - 1);
        }
    }

    fn visible_text(&self, width: u16) -> String {
        if self.scroll_offset == 0 || width == 0 {
            return self.buffer.clone();
        }
        let lines = textwrap::wrap(&self.buffer, wrap_options(width));
        let start = (self.scroll_offset as usize).min(lines.len());
        let end = (start + MAX_VISIBLE_LINES as usize).min(lines.len());
        lines[start..end].join("\n")
    }
}

impl Component for Composer {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let width = inner_width(area.width);
        self.update_scroll_offset(width);

        let counter = Line::styled(
            format!(" {}/{} ", self.char_count(), self.max_chars),
            Style::default().fg(self.counter_color()),
        )
        .right_aligned();
        let border = if self.focused { Color::Green } else { Color::DarkGray };
        let block = Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border))
            .title(" Message ")
            .title_bottom(counter);

        let input = Paragraph::new(self.visible_text(width))
            .block(block)
            .style(Style::default().fg(Color::White));
        frame.render_widget(input, area);

        if self.focused {
            let row = self.cursor_line(width).saturating_sub(self.scroll_offset);
            let col = if width == 0 { 0 } else { self.cursor_column(width) };
            frame.set_cursor_position((area.x + BORDER_OFFSET + col, area.y + BORDER_OFFSET + row));
        }
    }
}

impl EventHandler for Composer {
    type Event = ComposerEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.insert(self.pos, *c);
                self.pos += c.len_utf8();
                Some(ComposerEvent::ContentChanged)
            }
            TuiEvent::Paste(text) => {
                self.buffer.insert_str(self.pos, text);
                self.pos += text.len();
                Some(ComposerEvent::ContentChanged)
            }
            TuiEvent::Backspace => (self.pos > 0).then(|| {
                let prev = prev_char_boundary(&self.buffer, self.pos);
                self.buffer.drain(prev..self.pos);
                self.pos = prev;
                ComposerEvent::ContentChanged
            }),
            TuiEvent::Delete => (self.pos < self.buffer.len()).then(|| {
                let next = next_char_boundary(&self.buffer, self.pos);
                self.buffer.drain(self.pos..next);
                ComposerEvent::ContentChanged
            }),
            TuiEvent::CursorLeft => (self.pos > 0).then(|| {
                self.pos = prev_char_boundary(&self.buffer, self.pos);
                ComposerEvent::ContentChanged
            }),
            TuiEvent::CursorRight => (self.pos < self.buffer.len()).then(|| {
                self.pos = next_char_boundary(&self.buffer, self.pos);
                ComposerEvent::ContentChanged
            }),
            TuiEvent::CursorHome => {
                let line_start = self.buffer[..self.pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
                (self.pos != line_start).then(|| {
                    self.pos = line_start;
                    ComposerEvent::ContentChanged
                })
            }
            TuiEvent::CursorEnd => {
                let line_end = self.buffer[self.pos..]
                    .find('\n')
                    .map(|i| self.pos + i)
                    .unwrap_or(self.buffer.len());
                (self.pos != line_end).then(|| {
                    self.pos = line_end;
                    ComposerEvent::ContentChanged
                })
            }
            TuiEvent::Submit => {
                let text = std::mem::take(&mut self.buffer);
                self.pos = 0;
                self.scroll_offset = 0;
                Some(ComposerEvent::Submit(text))
            }
            _ => None,
        }
    }
}

fn wrap_options(inner_width: u16) -> textwrap::Options<'static> {
    textwrap::Options::new(inner_width as usize)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
}

fn inner_width(content_width: u16) -> u16 {
    content_width.saturating_sub(HORIZONTAL_OVERHEAD)
}

fn wrap_line_count(text: &str, width: u16) -> u16 {
    if width == 0 || text.is_empty() {
        return 1;
    }
    let lines = textwrap::wrap(text, wrap_options(width));
    let mut count = (lines.len() as u16).max(1);
    // textwrap doesn't always produce an empty trailing line for a trailing newline
    if text.ends_with('\n') && !lines.last().is_some_and(|l| l.is_empty()) {
        count += 1;
    }
    count
}

fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos].char_indices().next_back().map(|(i, _)| i).unwrap_or(0)
}

fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..].char_indices().nth(1).map(|(i, _)| pos + i).unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn typed(text: &str) -> Composer {
        let mut composer = Composer::new(4000);
        composer.handle_event(&TuiEvent::Paste(text.to_string()));
        composer
    }

    #[test]
    fn test_typing_and_backspace() {
        let mut composer = Composer::new(4000);
        composer.handle_event(&TuiEvent::InputChar('a'));
        composer.handle_event(&TuiEvent::InputChar('é'));
        assert_eq!(composer.buffer, "aé");
        assert_eq!(
            composer.handle_event(&TuiEvent::Backspace),
            Some(ComposerEvent::ContentChanged)
        );
        assert_eq!(composer.buffer, "a");
    }

    #[test]
    fn test_backspace_at_start_is_ignored() {
        let mut composer = Composer::new(4000);
        assert_eq!(composer.handle_event(&TuiEvent::Backspace), None);
    }

    #[test]
    fn test_submit_takes_buffer() {
        let mut composer = typed("hello");
        assert_eq!(
            composer.handle_event(&TuiEvent::Submit),
            Some(ComposerEvent::Submit("hello".into()))
        );
        assert!(composer.buffer.is_empty());
        composer.handle_event(&TuiEvent::InputChar('x'));
        assert_eq!(composer.buffer, "x");
    }

    #[test]
    fn test_insert_in_middle() {
        let mut composer = typed("ac");
        composer.handle_event(&TuiEvent::CursorLeft);
        composer.handle_event(&TuiEvent::InputChar('b'));
        assert_eq!(composer.buffer, "abc");
        composer.handle_event(&TuiEvent::CursorHome);
        composer.handle_event(&TuiEvent::Delete);
        assert_eq!(composer.buffer, "bc");
    }

    #[test]
    fn test_counter_thresholds() {
        let mut composer = Composer::new(10);
        assert_eq!(composer.counter_color(), Color::DarkGray);
        composer.buffer = "x".repeat(7);
        assert_eq!(composer.counter_color(), Color::DarkGray);
        composer.buffer = "x".repeat(8);
        assert_eq!(composer.counter_color(), Color::Yellow);
        composer.buffer = "x".repeat(10);
        assert_eq!(composer.counter_color(), Color::Red);
    }

    #[test]
    fn test_height_grows_with_lines_and_clamps() {
        let composer = typed("one\ntwo\nthree");
        assert_eq!(composer.calculate_height(40), 3 + VERTICAL_OVERHEAD);
        let tall = typed(&"line\n".repeat(20));
        assert_eq!(tall.calculate_height(40), MAX_VISIBLE_LINES + VERTICAL_OVERHEAD);
    }

    #[test]
    fn test_render_shows_counter() {
        let backend = TestBackend::new(40, 3);
        let mut terminal = Terminal::new(backend).unwrap();
        let mut composer = typed("hi");
        terminal
            .draw(|f| {
                let area = f.area();
                composer.render(f, area)
            })
            .unwrap();

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("2/4000"));
    }
}
