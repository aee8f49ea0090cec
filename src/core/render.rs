//! # Message Renderer
//!
//! Turns a stored message into a lazy sequence of display operations that
//! any view can apply in order:
//!
//! ```text
//! Begin { sender, animate }
//! Body(spans)            // user text verbatim, assistant text as light markup
//! Timestamp("02:15 PM")
//! Actions([Copy])       // assistant only
//! End
//! ```
//!
//! Markup is parsed with `pulldown_cmark` into a flat list of `MarkupSpan`s.
//! Views decide how each span looks.

use chrono::{DateTime, Local, Utc};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::core::conversation::{Message, Sender};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupSpan {
    Text(String),
    Strong(String),
    Emphasis(String),
    Code(String),
    CodeBlock { language: Option<String>, code: String },
    Link { text: String, url: String },
    LineBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageAction {
    Copy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayOp {
    Begin { sender: Sender, animate: bool },
    Body(Vec<MarkupSpan>),
    Timestamp(String),
    Actions(Vec<MessageAction>),
    End,
}

/// Lazily yields the display operations for one message.
pub fn display_ops(message: &Message, animate: bool) -> impl Iterator<Item = DisplayOp> + '_ {
    let mut step = 0u8;
    std::iter::from_fn(move || {
        loop {
            if step > 5 {
                return None;
            }
            step += 1;
            let op = match step {
                1 => Some(DisplayOp::Begin {
                    sender: message.sender,
                    animate,
                }),
                2 => Some(DisplayOp::Body(match message.sender {
                    Sender::User => plain_spans(&message.content),
                    Sender::Assistant => render_markup(&message.content),
                })),
                3 => Some(DisplayOp::Timestamp(format_time(message.timestamp))),
                4 => match message.sender {
                    Sender::Assistant => Some(DisplayOp::Actions(vec![MessageAction::Copy])),
                    Sender::User => None,
                },
                5 => Some(DisplayOp::End),
                _ => return None,
            };
            if op.is_some() {
                return op;
            }
        }
    })
}

/// Local wall-clock time, `hh:mm AM/PM`.
pub fn format_time(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%I:%M %p").to_string()
}

/// User text is never interpreted: lines become text separated by breaks.
fn plain_spans(content: &str) -> Vec<MarkupSpan> {
    let mut spans = Vec::new();
    for (i, line) in content.split('\n').enumerate() {
        if i > 0 {
            spans.push(MarkupSpan::LineBreak);
        }
        if !line.is_empty() {
            spans.push(MarkupSpan::Text(line.to_string()));
        }
    }
    spans
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Inline {
    Plain,
    Strong,
    Emphasis,
}

/// Parse lightweight markup (bold, italic, code, fenced code, links, line
/// breaks) into spans. Anything else degrades to plain text.
pub fn render_markup(content: &str) -> Vec<MarkupSpan> {
    let mut spans: Vec<MarkupSpan> = Vec::new();
    let mut inline = vec![Inline::Plain];
    let mut link: Option<(String, String)> = None;
    let mut code_block: Option<(Option<String>, String)> = None;
    let mut paragraphs = 0usize;

    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);

    for event in Parser::new_ext(content, opts) {
        match event {
            Event::Start(Tag::Paragraph) => {
                if paragraphs > 0 {
                    spans.push(MarkupSpan::LineBreak);
                    spans.push(MarkupSpan::LineBreak);
                }
                paragraphs += 1;
            }
            Event::Start(Tag::Strong) => inline.push(Inline::Strong),
            Event::Start(Tag::Emphasis) => inline.push(Inline::Emphasis),
            Event::End(TagEnd::Strong) | Event::End(TagEnd::Emphasis) => {
                inline.pop();
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                link = Some((String::new(), dest_url.to_string()));
            }
            Event::End(TagEnd::Link) => {
                if let Some((text, url)) = link.take() {
                    spans.push(MarkupSpan::Link { text, url });
                }
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                };
                code_block = Some((language, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((language, code)) = code_block.take() {
                    spans.push(MarkupSpan::CodeBlock {
                        language,
                        code: code.trim_end_matches('\n').to_string(),
                    });
                }
            }
            Event::Start(Tag::Item) => {
                if !spans.is_empty() {
                    spans.push(MarkupSpan::LineBreak);
                }
                spans.push(MarkupSpan::Text("• ".to_string()));
            }
            Event::Text(text) => {
                if let Some((_, code)) = code_block.as_mut() {
                    code.push_str(&text);
                } else if let Some((link_text, _)) = link.as_mut() {
                    link_text.push_str(&text);
                } else {
                    push_text(&mut spans, *inline.last().unwrap_or(&Inline::Plain), &text);
                }
            }
            Event::Code(code) => {
                if let Some((link_text, _)) = link.as_mut() {
                    link_text.push_str(&code);
                } else {
                    spans.push(MarkupSpan::Code(code.to_string()));
                }
            }
            Event::SoftBreak | Event::HardBreak => spans.push(MarkupSpan::LineBreak),
            _ => {}
        }
    }
    spans
}

/// Append text, merging with the previous span when the style matches.
fn push_text(spans: &mut Vec<MarkupSpan>, style: Inline, text: &str) {
    match (style, spans.last_mut()) {
        (Inline::Plain, Some(MarkupSpan::Text(prev)))
        | (Inline::Strong, Some(MarkupSpan::Strong(prev)))
        | (Inline::Emphasis, Some(MarkupSpan::Emphasis(prev))) => prev.push_str(text),
        (Inline::Plain, _) => spans.push(MarkupSpan::Text(text.to_string())),
        (Inline::Strong, _) => spans.push(MarkupSpan::Strong(text.to_string())),
        (Inline::Emphasis, _) => spans.push(MarkupSpan::Emphasis(text.to_string())),
    }
}

/// Flatten spans back to plain text (clipboard, transcript previews).
pub fn spans_to_plain(spans: &[MarkupSpan]) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            MarkupSpan::Text(t)
            | MarkupSpan::Strong(t)
            | MarkupSpan::Emphasis(t)
            | MarkupSpan::Code(t) => out.push_str(t),
            MarkupSpan::CodeBlock { code, .. } => {
                out.push_str(code);
            }
            MarkupSpan::Link { text, url } => {
                out.push_str(text);
                out.push_str(" (");
                out.push_str(url);
                out.push(')');
            }
            MarkupSpan::LineBreak => out.push('\n'),
        }
    }
    out
}
