//! # Dialog Overlay
//!
//! Centered modal for whichever dialog the core's `DialogManager` has open:
//! the three capture devices, the upload path prompt, the delete-all
//! confirmation and the shortcut help.
//!
//! Follows the persistent state + transient wrapper pattern:
//! - `DialogState` (the typed upload path) lives in `TuiState`
//! - `DialogOverlay` is created each frame with borrowed state and the
//!   capture session it is showing

use std::path::PathBuf;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap};

use crate::core::action::Action;
use crate::core::attachment::{MAX_UPLOAD_BYTES, format_file_size};
use crate::core::dialog::DialogKind;
use crate::devices::{Artifact, CaptureSession, CaptureState, DeviceKind};
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

const HELP: &[(&str, &str)] = &[
    ("Enter", "Send message"),
    ("Ctrl+J", "New line"),
    ("Ctrl+N", "New conversation"),
    ("Tab", "Focus conversation list"),
    ("Up/Down", "Switch conversation (list focused)"),
    ("PgUp/PgDn", "Scroll messages"),
    ("Ctrl+U", "Attach file"),
    ("Ctrl+K", "Camera"),
    ("Ctrl+S", "Share screen"),
    ("Ctrl+R", "Voice recording"),
    ("Ctrl+X", "Remove attachment"),
    ("Ctrl+Y", "Copy last reply"),
    ("Ctrl+E", "Export conversation"),
    ("Ctrl+D", "Delete all conversations"),
    ("Esc", "Close dialog"),
    ("Ctrl+C", "Quit"),
];

/// Persistent state for the overlay.
#[derive(Default)]
pub struct DialogState {
    pub path_input: String,
}

pub struct DialogOverlay<'a> {
    state: &'a mut DialogState,
    kind: DialogKind,
    session: Option<&'a CaptureSession>,
}

impl<'a> DialogOverlay<'a> {
    pub fn new(
        state: &'a mut DialogState,
        kind: DialogKind,
        session: Option<&'a CaptureSession>,
    ) -> Self {
        Self { state, kind, session }
    }

    fn capture_state(&self) -> CaptureState {
        self.session.map(|s| s.state()).unwrap_or(CaptureState::Idle)
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let hint = Style::default().fg(Color::DarkGray);
        match self.kind {
            DialogKind::Camera | DialogKind::Screen | DialogKind::Microphone => {
                let kind = self.kind.device().unwrap_or(DeviceKind::Camera);
                self.device_lines(kind)
            }
            DialogKind::Upload => vec![
                Line::from(vec![
                    Span::raw("Path: "),
                    Span::styled(self.state.path_input.clone(), Style::default().fg(Color::White)),
                    Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
                ]),
                Line::styled(
                    format!("Files up to {} are accepted.", format_file_size(MAX_UPLOAD_BYTES)),
                    hint,
                ),
            ],
            DialogKind::ConfirmDeleteAll => vec![
                Line::raw("Are you sure you want to delete all conversations?"),
                Line::styled("This cannot be undone.", Style::default().fg(Color::Red)),
            ],
            DialogKind::Help => HELP
                .iter()
                .map(|(key, what)| {
                    Line::from(vec![
                        Span::styled(format!("{key:<12}"), Style::default().fg(Color::Cyan)),
                        Span::raw(*what),
                    ])
                })
                .collect(),
        }
    }

    fn device_lines(&self, kind: DeviceKind) -> Vec<Line<'static>> {
        let name = device_name(kind);
        let live = Style::default().fg(Color::Red).add_modifier(Modifier::BOLD);
        match self.capture_state() {
            CaptureState::Idle | CaptureState::Sent => vec![Line::raw(format!("{name} is off."))],
            CaptureState::Acquiring => vec![Line::raw(format!("{name}: requesting access..."))],
            CaptureState::Active if kind.is_video() => {
                vec![Line::styled(format!("● {name} is live"), live)]
            }
            CaptureState::Active => {
                let bytes = self.session.map(|s| s.recorded_bytes()).unwrap_or(0);
                vec![Line::styled(
                    format!("● Recording... {} captured", format_file_size(bytes as u64)),
                    live,
                )]
            }
            CaptureState::Paused => vec![Line::styled(
                "Recording paused",
                Style::default().fg(Color::Yellow),
            )],
            CaptureState::Captured => {
                let (what, size) = match self.session.and_then(|s| s.artifact()) {
                    Some(Artifact::Image(image)) => ("Image", image.bytes.len()),
                    Some(Artifact::Audio(clip)) => ("Recording", clip.bytes.len()),
                    None => ("Capture", 0),
                };
                vec![Line::styled(
                    format!("{what} ready ({})", format_file_size(size as u64)),
                    Style::default().fg(Color::Green),
                )]
            }
        }
    }

    fn help_bar(&self) -> &'static str {
        match (self.kind, self.capture_state()) {
            (DialogKind::Microphone, CaptureState::Active) => " p Pause  s Stop  Esc Cancel ",
            (DialogKind::Microphone, CaptureState::Paused) => " p Resume  s Stop  Esc Cancel ",
            (DialogKind::Microphone, CaptureState::Captured) => " Enter Send  Esc Discard ",
            (DialogKind::Camera | DialogKind::Screen, CaptureState::Active) => {
                " Enter Capture  Esc Cancel "
            }
            (DialogKind::Camera | DialogKind::Screen, CaptureState::Captured) => {
                " Enter Use  r Retake  Esc Discard "
            }
            (DialogKind::Upload, _) => " Enter Upload  Esc Cancel ",
            (DialogKind::ConfirmDeleteAll, _) => " y Delete all  n Cancel ",
            _ => " Esc Close ",
        }
    }
}

impl Component for DialogOverlay<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let height = match self.kind {
            DialogKind::Help => HELP.len() as u16 + 6,
            _ => 8,
        };
        let overlay = centered_rect(60, height, area);
        frame.render_widget(Clear, overlay);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", self.kind.title()))
            .title_alignment(Alignment::Left)
            .title_bottom(Line::from(self.help_bar()).centered())
            .padding(Padding::uniform(1));

        let body = Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(body, overlay);
    }
}

impl EventHandler for DialogOverlay<'_> {
    type Event = Action;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        if *event == TuiEvent::Escape {
            return Some(match self.kind {
                DialogKind::ConfirmDeleteAll => Action::DeleteAll { confirmed: false },
                _ => Action::CloseDialog,
            });
        }
        match self.kind {
            DialogKind::Camera | DialogKind::Screen => {
                let kind = self.kind.device()?;
                match (self.capture_state(), event) {
                    (CaptureState::Active, TuiEvent::Submit | TuiEvent::InputChar('c' | ' ')) => {
                        Some(Action::Capture(kind))
                    }
                    (CaptureState::Captured, TuiEvent::Submit) => Some(Action::Commit(kind)),
                    (CaptureState::Captured, TuiEvent::InputChar('r')) => Some(Action::Retake(kind)),
                    _ => None,
                }
            }
            DialogKind::Microphone => match (self.capture_state(), event) {
                (
                    CaptureState::Active | CaptureState::Paused,
                    TuiEvent::InputChar('p' | ' '),
                ) => Some(Action::TogglePause),
                (
                    CaptureState::Active | CaptureState::Paused,
                    TuiEvent::InputChar('s') | TuiEvent::Submit,
                ) => Some(Action::StopRecording),
                (CaptureState::Captured, TuiEvent::Submit) => {
                    Some(Action::Commit(DeviceKind::Microphone))
                }
                _ => None,
            },
            DialogKind::Upload => match event {
                TuiEvent::InputChar(c) => {
                    self.state.path_input.push(*c);
                    None
                }
                TuiEvent::Paste(text) => {
                    self.state.path_input.push_str(text.trim());
                    None
                }
                TuiEvent::Backspace => {
                    self.state.path_input.pop();
                    None
                }
                TuiEvent::Submit => {
                    let typed = std::mem::take(&mut self.state.path_input);
                    let typed = typed.trim();
                    (!typed.is_empty()).then(|| Action::AttachFile(expand_home(typed)))
                }
                _ => None,
            },
            DialogKind::ConfirmDeleteAll => match event {
                TuiEvent::InputChar('y' | 'Y') => Some(Action::DeleteAll { confirmed: true }),
                TuiEvent::InputChar('n' | 'N') => Some(Action::DeleteAll { confirmed: false }),
                _ => None,
            },
            DialogKind::Help => match event {
                TuiEvent::Submit | TuiEvent::Help => Some(Action::CloseDialog),
                _ => None,
            },
        }
    }
}

fn device_name(kind: DeviceKind) -> &'static str {
    match kind {
        DeviceKind::Camera => "Camera",
        DeviceKind::Screen => "Screen share",
        DeviceKind::Microphone => "Microphone",
    }
}

/// `~/x` → `$HOME/x`
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// A rect `percent_x` wide and `height` rows tall, centered in `outer`.
fn centered_rect(percent_x: u16, height: u16, outer: Rect) -> Rect {
    let [_, center_v, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(outer.height)),
        Constraint::Fill(1),
    ])
    .areas(outer);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(center_v);
    center
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedBackend;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_escape_on_confirm_declines() {
        let mut state = DialogState::default();
        let mut overlay = DialogOverlay::new(&mut state, DialogKind::ConfirmDeleteAll, None);
        assert!(matches!(
            overlay.handle_event(&TuiEvent::Escape),
            Some(Action::DeleteAll { confirmed: false })
        ));
        assert!(matches!(
            overlay.handle_event(&TuiEvent::InputChar('y')),
            Some(Action::DeleteAll { confirmed: true })
        ));
    }

    #[test]
    fn test_upload_prompt_collects_path() {
        let mut state = DialogState::default();
        let mut overlay = DialogOverlay::new(&mut state, DialogKind::Upload, None);
        for c in "notes.txx".chars() {
            overlay.handle_event(&TuiEvent::InputChar(c));
        }
        overlay.handle_event(&TuiEvent::Backspace);
        overlay.handle_event(&TuiEvent::InputChar('t'));
        match overlay.handle_event(&TuiEvent::Submit) {
            Some(Action::AttachFile(path)) => assert_eq!(path, PathBuf::from("notes.txt")),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(state.path_input.is_empty());
    }

    #[test]
    fn test_empty_path_is_ignored() {
        let mut state = DialogState::default();
        let mut overlay = DialogOverlay::new(&mut state, DialogKind::Upload, None);
        assert!(overlay.handle_event(&TuiEvent::Submit).is_none());
    }

    #[tokio::test]
    async fn test_camera_keys_follow_capture_state() {
        let backend = ScriptedBackend::new();
        let mut session = CaptureSession::new(DeviceKind::Camera);
        session.open(&backend).await.unwrap();

        let mut state = DialogState::default();
        let mut overlay = DialogOverlay::new(&mut state, DialogKind::Camera, Some(&session));
        assert!(matches!(
            overlay.handle_event(&TuiEvent::Submit),
            Some(Action::Capture(DeviceKind::Camera))
        ));
        assert!(overlay.handle_event(&TuiEvent::InputChar('r')).is_none());

        session.capture().unwrap();
        let mut overlay = DialogOverlay::new(&mut state, DialogKind::Camera, Some(&session));
        assert!(matches!(
            overlay.handle_event(&TuiEvent::InputChar('r')),
            Some(Action::Retake(DeviceKind::Camera))
        ));
        assert!(matches!(
            overlay.handle_event(&TuiEvent::Submit),
            Some(Action::Commit(DeviceKind::Camera))
        ));
    }

    #[test]
    fn test_help_lists_shortcuts() {
        let mut state = DialogState::default();
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                DialogOverlay::new(&mut state, DialogKind::Help, None).render(f, area)
            })
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Keyboard Shortcuts"));
        assert!(text.contains("Voice recording"));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/tmp/a"), PathBuf::from("/tmp/a"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/a.txt"), home.join("a.txt"));
        }
    }
}
