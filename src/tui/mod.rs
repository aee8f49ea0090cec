//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Background Work
//!
//! `core::action::update` never blocks. When it returns an `Effect` that
//! needs I/O (a chat request, a device acquisition, an upload), the loop
//! spawns a tokio task for it. The task reports back by sending an
//! `Action` over a channel, which the loop drains every iteration:
//!
//! ```text
//! key ─► Action ─► update() ─► Effect ─► tokio::spawn ─► Action ─► update()
//! ```
//!
//! ## Redraw Strategy
//!
//! Draws only when something changed: an input event, a drained action,
//! an expiring toast, or a running recording (whose byte counter moves).
//!
//! A `SteadyBlock` cursor style is used instead of a blinking cursor because
//! ratatui's `set_cursor_position` resets the terminal's blink timer on every
//! `draw()` call.

mod clipboard;
mod component;
mod components;
mod event;
pub mod markdown;
mod ui;
pub mod view;

use std::any::Any;
use std::future::Future;
use std::io::stdout;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use futures::FutureExt;
use log::{debug, error, info, warn};

use crate::api::{ApiError, ChatClient, ChatService};
use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::controller::{self, PendingSend, PendingUpload};
use crate::core::conversation::Sender;
use crate::core::dialog::DialogKind;
use crate::core::state::SessionContext;
use crate::core::storage::{FileStore, KeyValueStore, MemoryStore};
use crate::core::view::{ChatView, Toast};
use crate::devices::{CaptureState, DeviceError, DeviceKind, DirectoryBackend, MediaBackend};
use crate::tui::component::EventHandler;
use crate::tui::components::{
    Composer, ComposerEvent, DialogOverlay, DialogState, MessageList, MessageListState, Sidebar,
    SidebarEvent, SidebarState,
};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};
use crate::tui::view::TuiView;

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub view: TuiView,
    // Persistent component states
    pub composer: Composer,
    pub sidebar: SidebarState,
    pub messages: MessageListState,
    pub dialog: DialogState,
    pub server: String,
}

impl TuiState {
    pub fn new(server: impl Into<String>, max_input_chars: usize, toast_seconds: u64) -> Self {
        Self {
            view: TuiView::new(toast_seconds),
            composer: Composer::new(max_input_chars),
            sidebar: SidebarState::default(),
            messages: MessageListState::default(),
            dialog: DialogState::default(),
            server: server.into(),
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // Kitty keyboard protocol lets Ctrl+Enter and friends through; terminals
        // without it ignore the request
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor, keyboard enhancement)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(
            stdout(),
            PopKeyboardEnhancementFlags,
            DisableMouseCapture,
            DisableBracketedPaste,
            Hide
        );
    }
}

/// Conversation storage under the configured directory. Falls back to an
/// in-memory store (nothing survives a restart) when the directory can't
/// be created.
fn open_storage(config: &ResolvedConfig) -> Arc<dyn KeyValueStore> {
    match FileStore::open(&config.storage_dir) {
        Ok(store) => {
            info!("Storing conversations in {}", store.dir().display());
            Arc::new(store)
        }
        Err(e) => {
            warn!(
                "Cannot open storage at {}: {}; conversations will not be saved",
                config.storage_dir.display(),
                e
            );
            Arc::new(MemoryStore::default())
        }
    }
}

/// Text of a caught panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs effects returned by `update()` on background tasks.
///
/// Each task ends by sending exactly one `Action`. A task that panics sends
/// the failure variant built by `on_fault` instead, so whatever the loop is
/// waiting on (the composing indicator, an acquiring device) gets resolved.
struct Spawner {
    service: Arc<dyn ChatService>,
    backend: Arc<dyn MediaBackend>,
    tx: mpsc::Sender<Action>,
}

impl Spawner {
    /// Start whatever I/O `effect` asks for. Returns true on `Effect::Quit`.
    fn start(&self, effect: Effect) -> bool {
        match effect {
            Effect::None => {}
            Effect::Quit => return true,
            Effect::SendChat(pending) => self.spawn_chat(pending),
            Effect::AcquireDevice(kind) => self.spawn_acquire(kind),
            Effect::UploadFile(path) => self.spawn_upload(path),
            Effect::UploadRecording(upload) => self.spawn_recording_upload(upload),
        }
        false
    }

    fn spawn_reporting<F, G>(&self, task: String, work: F, on_fault: G)
    where
        F: Future<Output = Action> + Send + 'static,
        G: FnOnce(String) -> Action + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let action = match AssertUnwindSafe(work).catch_unwind().await {
                Ok(action) => action,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!("Task '{}' panicked: {}", task, message);
                    on_fault(message)
                }
            };
            if tx.send(action).is_err() {
                warn!("Failed to deliver result of '{}': receiver dropped", task);
            }
        });
    }

    fn spawn_chat(&self, pending: PendingSend) {
        let service = Arc::clone(&self.service);
        let PendingSend { seq, request } = pending;
        debug!("Spawning chat request #{}", seq);
        self.spawn_reporting(
            format!("chat #{seq}"),
            async move {
                let outcome = service.chat(request).await;
                Action::ReplyReceived { seq, outcome }
            },
            move |message| Action::ReplyReceived {
                seq,
                outcome: Err(ApiError::Interrupted(message)),
            },
        );
    }

    fn spawn_acquire(&self, kind: DeviceKind) {
        let backend = Arc::clone(&self.backend);
        self.spawn_reporting(
            format!("open {}", kind.label()),
            async move {
                let result = backend.acquire(kind).await;
                Action::DeviceAcquired { kind, result }
            },
            move |message| Action::DeviceAcquired {
                kind,
                result: Err(DeviceError::Hardware(message)),
            },
        );
    }

    fn spawn_upload(&self, path: PathBuf) {
        let service = Arc::clone(&self.service);
        self.spawn_reporting(
            format!("upload {}", path.display()),
            async move {
                Action::UploadFinished(controller::upload_path(service.as_ref(), &path).await)
            },
            |message| Action::UploadFinished(Err(ApiError::Interrupted(message))),
        );
    }

    fn spawn_recording_upload(&self, upload: PendingUpload) {
        let service = Arc::clone(&self.service);
        self.spawn_reporting(
            format!("upload {}", upload.name),
            async move {
                Action::UploadFinished(service.upload_file(upload.name, upload.bytes).await)
            },
            |message| Action::UploadFinished(Err(ApiError::Interrupted(message))),
        );
    }

    fn spawn_health_check(&self) {
        let service = Arc::clone(&self.service);
        self.spawn_reporting(
            "health check".to_string(),
            async move { Action::HealthChecked(service.health().await) },
            |message| Action::HealthChecked(Err(ApiError::Interrupted(message))),
        );
    }
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let mut ctx = SessionContext::new(open_storage(&config), config.export_dir.clone());
    let mut tui = TuiState::new(&config.base_url, config.max_input_chars, config.toast_seconds);

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();
    let spawner = Spawner {
        service: Arc::new(ChatClient::new(&config.base_url)),
        backend: Arc::new(DirectoryBackend::new(&config.devices_dir)),
        tx,
    };

    controller::start(&mut ctx, &mut tui.view);

    let mut terminal = ratatui::init();
    // Installed over ratatui's hook, which would restore the terminal on
    // task panics that are caught and reported
    std::panic::set_hook(Box::new(|info| error!("{}", info)));
    spawner.spawn_health_check();
    let terminal_mode_guard = TerminalModeGuard::new();
    if let Err(e) = &terminal_mode_guard {
        warn!("Failed to enable terminal modes: {}", e);
    }

    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
        event_loop(&mut terminal, &mut ctx, &mut tui, &spawner, &rx)
    }))
    .unwrap_or_else(|payload| {
        Err(std::io::Error::other(format!(
            "event loop panicked: {}",
            panic_message(payload.as_ref())
        )))
    });

    // Last-resort release; a clean quit has already done this
    ctx.devices.release_all();
    drop(terminal_mode_guard);
    ratatui::restore();
    drop(std::panic::take_hook());
    info!("Confab shut down");
    result
}

fn event_loop(
    terminal: &mut ratatui::DefaultTerminal,
    ctx: &mut SessionContext,
    tui: &mut TuiState,
    spawner: &Spawner,
    rx: &mpsc::Receiver<Action>,
) -> std::io::Result<()> {
    let mut needs_redraw = true; // Force first frame

    loop {
        let now = Instant::now();
        let recording = ctx.devices.get(DeviceKind::Microphone).state() == CaptureState::Active;
        let fresh = tui.view.messages.iter().any(|m| m.is_fresh(now));
        if recording || fresh || tui.view.prune_toasts(now) {
            needs_redraw = true;
        }

        if needs_redraw {
            terminal.draw(|f| ui::draw_ui(f, ctx, tui))?;
            needs_redraw = false;
        }

        let timeout = if recording || fresh || tui.view.composing {
            Duration::from_millis(100)
        } else {
            Duration::from_millis(250)
        };
        let first_event = poll_event_timeout(timeout);
        if first_event.is_some() {
            needs_redraw = true;
        }

        // Process first event + drain ALL pending events before next draw
        for event in first_event
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            if let Some(action) = route_event(event, ctx, tui)
                && dispatch(ctx, tui, spawner, action)
            {
                return Ok(());
            }
        }

        if recording && dispatch(ctx, tui, spawner, Action::Tick) {
            return Ok(());
        }

        // Results from background tasks
        while let Ok(action) = rx.try_recv() {
            debug!("Background action: {:?}", ActionName(&action));
            needs_redraw = true;
            if dispatch(ctx, tui, spawner, action) {
                return Ok(());
            }
        }
    }
}

/// Apply one action and start its effect. Returns true when the app should quit.
///
/// A panic inside `update` is logged and shown as a generic error toast;
/// the session keeps running.
fn dispatch(ctx: &mut SessionContext, tui: &mut TuiState, spawner: &Spawner, action: Action) -> bool {
    let name = format!("{:?}", ActionName(&action));
    match std::panic::catch_unwind(AssertUnwindSafe(|| update(ctx, &mut tui.view, action))) {
        Ok(effect) => spawner.start(effect),
        Err(payload) => {
            error!("Handling {} panicked: {}", name, panic_message(payload.as_ref()));
            tui.view.notify(Toast::error(controller::UNEXPECTED_ERROR));
            false
        }
    }
}

/// Turn one terminal event into at most one core action, handling purely
/// presentational events (focus, scrolling, clipboard) on the spot.
fn route_event(event: TuiEvent, ctx: &SessionContext, tui: &mut TuiState) -> Option<Action> {
    if event == TuiEvent::Quit {
        return Some(Action::Quit);
    }

    if let Some(kind) = ctx.dialogs.current() {
        let session = kind.device().map(|d| ctx.devices.get(d));
        return DialogOverlay::new(&mut tui.dialog, kind, session).handle_event(&event);
    }

    match event {
        TuiEvent::NewConversation => return Some(Action::NewConversation),
        TuiEvent::Export => return Some(Action::ExportActive),
        TuiEvent::DeleteAll => return Some(Action::OpenDialog(DialogKind::ConfirmDeleteAll)),
        TuiEvent::AttachFile => return Some(Action::OpenDialog(DialogKind::Upload)),
        TuiEvent::OpenCamera => return Some(Action::OpenDialog(DialogKind::Camera)),
        TuiEvent::OpenScreen => return Some(Action::OpenDialog(DialogKind::Screen)),
        TuiEvent::OpenMicrophone => return Some(Action::OpenDialog(DialogKind::Microphone)),
        TuiEvent::ClearAttachment => return Some(Action::ClearAttachment),
        TuiEvent::Help => return Some(Action::OpenDialog(DialogKind::Help)),
        TuiEvent::CopyLastReply => {
            copy_last_reply(ctx, &mut tui.view);
            return None;
        }
        TuiEvent::ToggleFocus => {
            tui.sidebar.focused = !tui.sidebar.focused;
            return None;
        }
        TuiEvent::Escape => {
            tui.sidebar.focused = false;
            return None;
        }
        TuiEvent::ScrollUp
        | TuiEvent::ScrollDown
        | TuiEvent::ScrollPageUp
        | TuiEvent::ScrollPageDown => {
            MessageList::new(&mut tui.messages, &tui.view.messages, tui.view.composing, Instant::now())
                .handle_event(&event);
            return None;
        }
        _ => {}
    }

    if tui.sidebar.focused {
        match event {
            TuiEvent::CursorUp | TuiEvent::CursorDown => {
                return Sidebar::new(&mut tui.sidebar, &tui.view.sidebar)
                    .handle_event(&event)
                    .map(|SidebarEvent::Load(id)| Action::LoadConversation(id));
            }
            // Typing goes back to the composer
            TuiEvent::InputChar(_) | TuiEvent::Paste(_) => tui.sidebar.focused = false,
            _ => return None,
        }
    }

    match event {
        // Arrow keys in the composer scroll the conversation
        TuiEvent::CursorUp => {
            MessageList::new(&mut tui.messages, &tui.view.messages, tui.view.composing, Instant::now())
                .handle_event(&TuiEvent::ScrollUp);
            None
        }
        TuiEvent::CursorDown => {
            MessageList::new(&mut tui.messages, &tui.view.messages, tui.view.composing, Instant::now())
                .handle_event(&TuiEvent::ScrollDown);
            None
        }
        _ => match tui.composer.handle_event(&event)? {
            ComposerEvent::Submit(text) => Some(Action::Submit(text)),
            ComposerEvent::ContentChanged => None,
        },
    }
}

fn copy_last_reply(ctx: &SessionContext, view: &mut dyn ChatView) {
    let last = ctx
        .store
        .active()
        .and_then(|c| c.messages.iter().rev().find(|m| m.sender == Sender::Assistant));
    let Some(message) = last else {
        view.notify(Toast::info("No reply to copy yet"));
        return;
    };
    match clipboard::copy_text(&message.content) {
        Ok(()) => view.notify(Toast::success("Copied to clipboard")),
        Err(e) => {
            warn!("Copy to clipboard failed: {}", e);
            view.notify(Toast::error("Failed to copy to clipboard"));
        }
    }
}

/// Short debug label for an action without dumping payloads.
struct ActionName<'a>(&'a Action);

impl std::fmt::Debug for ActionName<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self.0 {
            Action::ReplyReceived { seq, .. } => return write!(f, "ReplyReceived(#{seq})"),
            Action::DeviceAcquired { kind, result } => {
                return write!(f, "DeviceAcquired({}, ok={})", kind.label(), result.is_ok());
            }
            Action::UploadFinished(result) => {
                return write!(f, "UploadFinished(ok={})", result.is_ok());
            }
            Action::HealthChecked(_) => "HealthChecked",
            _ => "Other",
        };
        f.write_str(name)
    }
}
