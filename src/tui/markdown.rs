//! Markup spans → ratatui `Text`.
//!
//! The core already parsed assistant replies into `MarkupSpan`s; this just
//! decides how each one looks in the terminal. Code blocks get their own
//! lines with a gutter, links show the URL after the text.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

use crate::core::render::MarkupSpan;

pub fn render(spans: &[MarkupSpan], base_fg: Color) -> Text<'static> {
    let mut w = Writer::new(base_fg);
    for span in spans {
        w.handle(span);
    }
    w.text
}

// ── Writer ──────────────────────────────────────────────────────────────────

struct Writer {
    text: Text<'static>,
    base: Style,
    /// Set after a code block so following inline text starts a new line.
    after_block: bool,
}

impl Writer {
    fn new(base_fg: Color) -> Self {
        Self {
            text: Text::default(),
            base: Style::default().fg(base_fg),
            after_block: false,
        }
    }

    fn push_line(&mut self, line: Line<'static>) {
        self.text.lines.push(line);
    }

    fn push_span(&mut self, span: Span<'static>) {
        if self.after_block {
            self.after_block = false;
            self.push_line(Line::default());
        }
        if let Some(line) = self.text.lines.last_mut() {
            line.push_span(span);
        } else {
            self.push_line(Line::from(vec![span]));
        }
    }

    fn handle(&mut self, span: &MarkupSpan) {
        match span {
            MarkupSpan::Text(text) => self.push_span(Span::styled(text.clone(), self.base)),
            MarkupSpan::Strong(text) => self.push_span(Span::styled(
                text.clone(),
                self.base.add_modifier(Modifier::BOLD),
            )),
            MarkupSpan::Emphasis(text) => self.push_span(Span::styled(
                text.clone(),
                self.base.add_modifier(Modifier::ITALIC),
            )),
            MarkupSpan::Code(code) => self.push_span(Span::styled(
                code.clone(),
                Style::default().fg(Color::Yellow),
            )),
            MarkupSpan::Link { text, url } => {
                self.push_span(Span::styled(
                    text.clone(),
                    self.base.fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
                ));
                self.push_span(Span::styled(
                    format!(" ({url})"),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            MarkupSpan::LineBreak => {
                self.after_block = false;
                self.push_line(Line::default());
            }
            MarkupSpan::CodeBlock { language, code } => self.code_block(language.as_deref(), code),
        }
    }

    fn code_block(&mut self, language: Option<&str>, code: &str) {
        let gutter = Style::default().fg(Color::DarkGray);
        let body = Style::default().fg(Color::Yellow);
        if let Some(lang) = language {
            self.push_line(Line::from(Span::styled(format!("┌ {lang}"), gutter)));
        }
        for line in code.lines() {
            self.push_line(Line::from(vec![
                Span::styled("│ ", gutter),
                Span::styled(line.to_string(), body),
            ]));
        }
        self.after_block = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render::render_markup;

    fn plain(text: &Text) -> Vec<String> {
        text.lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_bold_is_styled() {
        let text = render(&render_markup("Hello **world**"), Color::Green);
        let bold = text.lines[0]
            .spans
            .iter()
            .find(|s| s.content == "world")
            .map(|s| s.style);
        assert!(bold.is_some_and(|style| style.add_modifier.contains(Modifier::BOLD)));
    }

    #[test]
    fn test_line_breaks_start_new_lines() {
        let spans = vec![
            MarkupSpan::Text("one".into()),
            MarkupSpan::LineBreak,
            MarkupSpan::Text("two".into()),
        ];
        assert_eq!(plain(&render(&spans, Color::White)), vec!["one", "two"]);
    }

    #[test]
    fn test_code_block_gets_gutter_and_own_lines() {
        let spans = vec![
            MarkupSpan::Text("Try:".into()),
            MarkupSpan::CodeBlock {
                language: Some("rust".into()),
                code: "let a = 1;\nlet b = 2;".into(),
            },
            MarkupSpan::Text("done".into()),
        ];
        assert_eq!(
            plain(&render(&spans, Color::White)),
            vec!["Try:", "┌ rust", "│ let a = 1;", "│ let b = 2;", "done"]
        );
    }

    #[test]
    fn test_link_shows_url() {
        let spans = vec![MarkupSpan::Link {
            text: "docs".into(),
            url: "https://example.com".into(),
        }];
        assert_eq!(plain(&render(&spans, Color::White)), vec!["docs (https://example.com)"]);
    }
}
