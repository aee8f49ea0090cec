//! # Actions
//!
//! Everything that can happen in Confab becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! The backend answers? That's `Action::ReplyReceived { seq, outcome }`.
//!
//! The `update()` function applies an action to the session context and
//! returns an `Effect`: the I/O the adapter must start next (a chat
//! request, a device acquisition, an upload). No I/O happens in here.
//!
//! ```text
//! SessionContext + Action  →  update()  →  Effect
//! ```

use std::path::PathBuf;

use log::debug;

use crate::api::{ApiError, ChatReply, HealthResponse};
use crate::core::attachment::UploadedFile;
use crate::core::controller::{self, PendingSend, PendingUpload};
use crate::core::dialog::DialogKind;
use crate::core::state::SessionContext;
use crate::core::view::ChatView;
use crate::devices::{DeviceError, DeviceKind, MediaStream};

#[derive(Debug)]
pub enum Action {
    Submit(String),
    ReplyReceived {
        seq: u64,
        outcome: Result<ChatReply, ApiError>,
    },
    NewConversation,
    LoadConversation(String),
    DeleteAll { confirmed: bool },
    ExportActive,
    AttachFile(PathBuf),
    UploadFinished(Result<UploadedFile, ApiError>),
    ClearAttachment,
    OpenDialog(DialogKind),
    CloseDialog,
    OpenDevice(DeviceKind),
    DeviceAcquired {
        kind: DeviceKind,
        result: Result<Box<dyn MediaStream>, DeviceError>,
    },
    Capture(DeviceKind),
    Retake(DeviceKind),
    TogglePause,
    StopRecording,
    Commit(DeviceKind),
    HealthChecked(Result<HealthResponse, ApiError>),
    /// Periodic tick from the event loop; drains recorded audio.
    Tick,
    Quit,
}

/// I/O the adapter must start after an update.
#[derive(Debug, PartialEq, Eq)]
pub enum Effect {
    None,
    Quit,
    SendChat(PendingSend),
    AcquireDevice(DeviceKind),
    UploadFile(PathBuf),
    UploadRecording(PendingUpload),
}

pub fn update(ctx: &mut SessionContext, view: &mut dyn ChatView, action: Action) -> Effect {
    match action {
        Action::Submit(text) => match controller::begin_send(ctx, view, &text) {
            Some(pending) => Effect::SendChat(pending),
            None => Effect::None,
        },
        Action::ReplyReceived { seq, outcome } => {
            controller::finish_send(ctx, view, seq, outcome);
            Effect::None
        }
        Action::NewConversation => {
            controller::create_conversation(ctx, view);
            Effect::None
        }
        Action::LoadConversation(id) => {
            controller::load_conversation(ctx, view, &id);
            Effect::None
        }
        Action::DeleteAll { confirmed } => {
            ctx.dialogs.close(DialogKind::ConfirmDeleteAll, &mut ctx.devices);
            controller::delete_all(ctx, view, confirmed);
            Effect::None
        }
        Action::ExportActive => {
            controller::export_active(ctx, view);
            Effect::None
        }
        Action::AttachFile(path) => {
            ctx.dialogs.close(DialogKind::Upload, &mut ctx.devices);
            Effect::UploadFile(path)
        }
        Action::UploadFinished(result) => {
            controller::finish_upload(ctx, view, result);
            Effect::None
        }
        Action::ClearAttachment => {
            controller::clear_attachment(ctx);
            Effect::None
        }
        Action::OpenDialog(kind) => match kind.device() {
            Some(device) => update(ctx, view, Action::OpenDevice(device)),
            None => {
                ctx.dialogs.open(kind, &mut ctx.devices);
                Effect::None
            }
        },
        Action::CloseDialog => {
            ctx.dialogs.close_any(&mut ctx.devices);
            Effect::None
        }
        Action::OpenDevice(kind) => {
            if controller::open_device(ctx, view, kind) {
                Effect::AcquireDevice(kind)
            } else {
                Effect::None
            }
        }
        Action::DeviceAcquired { kind, result } => {
            controller::finish_open(ctx, view, kind, result);
            Effect::None
        }
        Action::Capture(kind) => {
            controller::capture_still(ctx, view, kind);
            Effect::None
        }
        Action::Retake(kind) => {
            controller::retake(ctx, view, kind);
            Effect::None
        }
        Action::TogglePause => {
            controller::toggle_pause(ctx, view);
            Effect::None
        }
        Action::StopRecording => {
            controller::stop_recording(ctx, view);
            Effect::None
        }
        Action::Commit(kind) => match controller::begin_commit(ctx, view, kind) {
            Some(upload) => Effect::UploadRecording(upload),
            None => Effect::None,
        },
        Action::HealthChecked(result) => {
            view.notify(controller::health_toast(&result));
            Effect::None
        }
        Action::Tick => {
            let fresh = ctx.devices.get_mut(DeviceKind::Microphone).poll_audio();
            if fresh > 0 {
                debug!("Collected {} audio chunk(s)", fresh);
            }
            Effect::None
        }
        Action::Quit => {
            ctx.dialogs.close_any(&mut ctx.devices);
            ctx.devices.release_all();
            Effect::Quit
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::storage::MemoryStore;
    use crate::devices::{CaptureState, MediaBackend};
    use crate::test_support::{RecordingView, ScriptedBackend};

    fn context() -> SessionContext {
        SessionContext::new(Arc::new(MemoryStore::default()), std::env::temp_dir())
    }

    #[test]
    fn test_submit_spawns_request() {
        let mut ctx = context();
        let mut view = RecordingView::default();
        let effect = update(&mut ctx, &mut view, Action::Submit("Hello".into()));
        match effect {
            Effect::SendChat(pending) => {
                assert_eq!(pending.request.message, "Hello");
                assert_eq!(pending.seq, 1);
            }
            other => panic!("unexpected effect: {other:?}"),
        }
        assert!(ctx.composing);
    }

    #[test]
    fn test_empty_submit_does_nothing() {
        let mut ctx = context();
        let mut view = RecordingView::default();
        assert_eq!(update(&mut ctx, &mut view, Action::Submit(" ".into())), Effect::None);
    }

    #[test]
    fn test_reply_received_appends_assistant_message() {
        let mut ctx = context();
        let mut view = RecordingView::default();
        update(&mut ctx, &mut view, Action::Submit("Hello".into()));
        update(
            &mut ctx,
            &mut view,
            Action::ReplyReceived {
                seq: 1,
                outcome: Ok(ChatReply::Response { response: "Hi there".into() }),
            },
        );
        assert_eq!(ctx.store.active().unwrap().messages.len(), 2);
        assert!(!ctx.composing);
    }

    #[test]
    fn test_open_camera_dialog_requests_acquisition() {
        let mut ctx = context();
        let mut view = RecordingView::default();
        let effect = update(&mut ctx, &mut view, Action::OpenDialog(DialogKind::Camera));
        assert_eq!(effect, Effect::AcquireDevice(DeviceKind::Camera));
        assert_eq!(ctx.dialogs.current(), Some(DialogKind::Camera));
        assert_eq!(ctx.devices.get(DeviceKind::Camera).state(), CaptureState::Acquiring);
    }

    #[tokio::test]
    async fn test_escape_during_acquisition_drops_late_stream() {
        let backend = ScriptedBackend::new();
        let mut ctx = context();
        let mut view = RecordingView::default();
        update(&mut ctx, &mut view, Action::OpenDevice(DeviceKind::Screen));
        update(&mut ctx, &mut view, Action::CloseDialog);

        let result = backend.acquire(DeviceKind::Screen).await;
        update(
            &mut ctx,
            &mut view,
            Action::DeviceAcquired { kind: DeviceKind::Screen, result },
        );
        assert!(!ctx.devices.get(DeviceKind::Screen).holds_stream());
        assert_eq!(backend.probe(DeviceKind::Screen).stops(), 1);
    }

    #[test]
    fn test_delete_all_requires_confirmation() {
        let mut ctx = context();
        let mut view = RecordingView::default();
        update(&mut ctx, &mut view, Action::NewConversation);
        update(&mut ctx, &mut view, Action::OpenDialog(DialogKind::ConfirmDeleteAll));

        update(&mut ctx, &mut view, Action::DeleteAll { confirmed: false });
        assert_eq!(ctx.store.conversations().len(), 1);
        assert_eq!(ctx.dialogs.current(), None);

        update(&mut ctx, &mut view, Action::DeleteAll { confirmed: true });
        assert!(ctx.store.conversations().is_empty());
    }

    #[tokio::test]
    async fn test_quit_releases_every_stream() {
        let backend = ScriptedBackend::new();
        let mut ctx = context();
        let mut view = RecordingView::default();
        update(&mut ctx, &mut view, Action::OpenDevice(DeviceKind::Microphone));
        let result = backend.acquire(DeviceKind::Microphone).await;
        update(
            &mut ctx,
            &mut view,
            Action::DeviceAcquired { kind: DeviceKind::Microphone, result },
        );
        assert!(ctx.devices.any_live());

        assert_eq!(update(&mut ctx, &mut view, Action::Quit), Effect::Quit);
        assert!(!ctx.devices.any_live());
        assert_eq!(backend.probe(DeviceKind::Microphone).stops(), 1);
    }

    #[test]
    fn test_attach_file_closes_prompt() {
        let mut ctx = context();
        let mut view = RecordingView::default();
        update(&mut ctx, &mut view, Action::OpenDialog(DialogKind::Upload));
        let effect = update(&mut ctx, &mut view, Action::AttachFile(PathBuf::from("a.txt")));
        assert_eq!(effect, Effect::UploadFile(PathBuf::from("a.txt")));
        assert_eq!(ctx.dialogs.current(), None);
    }
}
