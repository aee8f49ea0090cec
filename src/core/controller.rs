//! # Chat Session Controller
//!
//! Orchestrates one send: typed text + staged attachment → user message
//! persisted and shown → remote exchange → reply persisted and shown →
//! staging cleared.
//!
//! ```text
//! begin_send ──► PendingSend { seq, request } ──► ChatService::chat ──► finish_send
//!  (steps 1-5, synchronous)                        (background task)     (steps 6-9)
//! ```
//!
//! Every outgoing request carries a sequence number. A reply whose number
//! is not the latest is dropped, so two quick sends can't show replies out
//! of order. All failures end up as toasts; nothing here returns an error.

use std::path::{Path, PathBuf};

use chrono::Local;
use log::{debug, info, warn};

use crate::api::{ApiError, ChatReply, ChatRequest, ChatService, HealthResponse};
use crate::core::attachment::{Attachment, ImageOrigin, MAX_UPLOAD_BYTES, UploadedFile};
use crate::core::conversation::Message;
use crate::core::dialog::DialogKind;
use crate::core::render::display_ops;
use crate::core::state::SessionContext;
use crate::core::transcript::{self, ExportError};
use crate::core::view::{ChatView, Toast};
use crate::devices::{Artifact, CaptureState, DeviceError, DeviceKind, MediaStream};

pub const SEND_FAILED: &str = "Failed to send message. Please try again.";
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred. Please try again.";

/// A chat request that has been shown locally and is waiting on the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub seq: u64,
    pub request: ChatRequest,
}

/// A recording that must go through `/upload` before it can be staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub name: String,
    pub bytes: Vec<u8>,
}

fn show(view: &mut dyn ChatView, message: &Message, animate: bool) {
    for op in display_ops(message, animate) {
        view.apply(op);
    }
}

fn refresh_sidebar(ctx: &SessionContext, view: &mut dyn ChatView) {
    view.refresh_sidebar(ctx.store.conversations(), ctx.store.active_id());
}

// ============================================================================
// Start-up
// ============================================================================

/// Open the most recent conversation, or create one if there are none.
pub fn start(ctx: &mut SessionContext, view: &mut dyn ChatView) {
    let first = ctx.store.conversations().first().map(|c| c.id.clone());
    match first {
        Some(id) => {
            load_conversation(ctx, view, &id);
        }
        None => create_conversation(ctx, view),
    }
    view.notify(Toast::success("Welcome to Confab!"));
}

pub fn health_toast(result: &Result<HealthResponse, ApiError>) -> Toast {
    match result {
        Ok(health) if health.is_healthy() => {
            Toast::info(format!("Connected to {} {}", health.service, health.version))
        }
        Ok(health) => Toast::warning(format!("Backend reports status: {}", health.status)),
        Err(e) => {
            warn!("Health check failed: {}", e);
            Toast::warning("Support backend is unreachable")
        }
    }
}

// ============================================================================
// Conversations
// ============================================================================

pub fn create_conversation(ctx: &mut SessionContext, view: &mut dyn ChatView) {
    let id = ctx.store.create().id.clone();
    info!("Created conversation {}", id);
    view.clear_messages();
    refresh_sidebar(ctx, view);
}

/// Make `id` active and replay its messages. Returns false (nothing
/// changed) when there is no such conversation.
pub fn load_conversation(ctx: &mut SessionContext, view: &mut dyn ChatView, id: &str) -> bool {
    let Some(conversation) = ctx.store.load(id) else {
        warn!("Conversation not found: {}", id);
        return false;
    };
    view.clear_messages();
    for message in &conversation.messages {
        show(view, message, false);
    }
    refresh_sidebar(ctx, view);
    true
}

/// Erase every conversation. Without confirmation nothing happens.
pub fn delete_all(ctx: &mut SessionContext, view: &mut dyn ChatView, confirmed: bool) -> bool {
    if !ctx.store.delete_all(confirmed) {
        return false;
    }
    info!("Deleted all conversations");
    refresh_sidebar(ctx, view);
    view.clear_messages();
    view.notify(Toast::success("All conversations have been deleted"));
    true
}

pub fn export_active(ctx: &SessionContext, view: &mut dyn ChatView) -> Option<PathBuf> {
    match transcript::export_active(&ctx.store, &ctx.export_dir) {
        Ok(path) => {
            view.notify(Toast::success(format!(
                "Conversation exported to {}",
                path.display()
            )));
            Some(path)
        }
        Err(ExportError::NoActiveConversation) => {
            view.notify(Toast::warning("No conversation to export"));
            None
        }
        Err(e) => {
            warn!("Export failed: {}", e);
            view.notify(Toast::error("Failed to export conversation"));
            None
        }
    }
}

// ============================================================================
// Sending
// ============================================================================

/// Steps 1-5 of a send. Returns `None` when there is nothing to send.
pub fn begin_send(
    ctx: &mut SessionContext,
    view: &mut dyn ChatView,
    text: &str,
) -> Option<PendingSend> {
    let text = text.trim();
    if text.is_empty() && ctx.staging.is_empty() {
        return None;
    }

    if ctx.store.active().is_none() {
        create_conversation(ctx, view);
    }

    if !text.is_empty() {
        let message = Message::user(text);
        show(view, &message, true);
        ctx.store.append(message);
        refresh_sidebar(ctx, view);
    }

    ctx.composing = true;
    view.set_composing(true);

    let request = ChatRequest::new(text, ctx.staging.current());
    let seq = ctx.next_request();
    debug!("Request #{} ready (attachment: {})", seq, request.attachment.is_some());
    Some(PendingSend { seq, request })
}

/// Steps 6-9 of a send. Returns false when the reply was stale and dropped.
pub fn finish_send(
    ctx: &mut SessionContext,
    view: &mut dyn ChatView,
    seq: u64,
    outcome: Result<ChatReply, ApiError>,
) -> bool {
    if !ctx.is_latest(seq) {
        info!("Discarding reply to request #{} (superseded)", seq);
        return false;
    }

    ctx.composing = false;
    view.set_composing(false);

    match outcome {
        Ok(ChatReply::Response { response }) if response.is_empty() => {
            debug!("Request #{} answered with an empty reply", seq);
        }
        Ok(ChatReply::Response { response }) => {
            let message = Message::assistant(response);
            show(view, &message, true);
            ctx.store.append(message);
            refresh_sidebar(ctx, view);
        }
        Ok(ChatReply::Error { error }) => {
            warn!("Backend reported error for request #{}: {}", seq, error);
            view.notify(Toast::error(error));
        }
        Err(e) => {
            warn!("Request #{} failed: {}", seq, e);
            view.notify(Toast::error(SEND_FAILED));
        }
    }

    ctx.staging.clear();
    ctx.devices.clear_previews();
    true
}

/// Send and wait for the reply in one call.
pub async fn send(
    ctx: &mut SessionContext,
    view: &mut dyn ChatView,
    service: &dyn ChatService,
    text: &str,
) -> bool {
    let Some(pending) = begin_send(ctx, view, text) else {
        return false;
    };
    let outcome = service.chat(pending.request).await;
    finish_send(ctx, view, pending.seq, outcome)
}

// ============================================================================
// Attachments
// ============================================================================

/// Read a local file for upload, refusing anything over the size limit
/// before touching its contents.
pub async fn read_upload(path: &Path) -> Result<PendingUpload, ApiError> {
    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::FileTooLarge {
            size: metadata.len(),
            limit: MAX_UPLOAD_BYTES,
        });
    }
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(PendingUpload { name, bytes })
}

pub async fn upload_path(service: &dyn ChatService, path: &Path) -> Result<UploadedFile, ApiError> {
    let upload = read_upload(path).await?;
    service.upload_file(upload.name, upload.bytes).await
}

/// Stage a finished upload, or report why it failed.
pub fn finish_upload(
    ctx: &mut SessionContext,
    view: &mut dyn ChatView,
    result: Result<UploadedFile, ApiError>,
) -> bool {
    match result {
        Ok(file) => {
            info!("Staged upload {} as {}", file.original_name, file.filename);
            ctx.staging.stage(Attachment::UploadedFile(file));
            view.notify(Toast::success("File uploaded successfully"));
            true
        }
        Err(e @ ApiError::FileTooLarge { .. }) | Err(e @ ApiError::Backend(_)) => {
            warn!("Upload rejected: {}", e);
            view.notify(Toast::error(e.to_string()));
            false
        }
        Err(e) => {
            warn!("Upload failed: {}", e);
            view.notify(Toast::error("Failed to upload file"));
            false
        }
    }
}

pub async fn attach_file(
    ctx: &mut SessionContext,
    view: &mut dyn ChatView,
    service: &dyn ChatService,
    path: &Path,
) -> bool {
    let result = upload_path(service, path).await;
    finish_upload(ctx, view, result)
}

pub fn clear_attachment(ctx: &mut SessionContext) {
    ctx.staging.clear();
}

// ============================================================================
// Capture devices
// ============================================================================

fn report_device_error(view: &mut dyn ChatView, e: &DeviceError) {
    warn!("Device error: {}", e);
    view.notify(Toast::error(e.user_message()));
}

/// Open the device's dialog and start acquiring. Returns true when the
/// caller must now ask the backend for a stream.
pub fn open_device(ctx: &mut SessionContext, view: &mut dyn ChatView, kind: DeviceKind) -> bool {
    ctx.dialogs.open(DialogKind::for_device(kind), &mut ctx.devices);
    match ctx.devices.get_mut(kind).begin_open() {
        Ok(()) => true,
        Err(e) => {
            report_device_error(view, &e);
            false
        }
    }
}

pub fn finish_open(
    ctx: &mut SessionContext,
    view: &mut dyn ChatView,
    kind: DeviceKind,
    result: Result<Box<dyn MediaStream>, DeviceError>,
) -> bool {
    match ctx.devices.get_mut(kind).complete_open(result) {
        Ok(()) => true,
        Err(e) => {
            report_device_error(view, &e);
            ctx.dialogs.close(DialogKind::for_device(kind), &mut ctx.devices);
            false
        }
    }
}

pub fn capture_still(ctx: &mut SessionContext, view: &mut dyn ChatView, kind: DeviceKind) -> bool {
    match ctx.devices.get_mut(kind).capture() {
        Ok(image) => {
            debug!("Captured {} frame ({} bytes)", kind.label(), image.bytes.len());
            true
        }
        Err(e) => {
            report_device_error(view, &e);
            false
        }
    }
}

pub fn retake(ctx: &mut SessionContext, view: &mut dyn ChatView, kind: DeviceKind) -> bool {
    match ctx.devices.get_mut(kind).retake() {
        Ok(()) => true,
        Err(e) => {
            report_device_error(view, &e);
            false
        }
    }
}

/// Microphone: pause when recording, resume when paused.
pub fn toggle_pause(ctx: &mut SessionContext, view: &mut dyn ChatView) -> bool {
    let session = ctx.devices.get_mut(DeviceKind::Microphone);
    let result = match session.state() {
        CaptureState::Paused => session.resume(),
        _ => session.pause(),
    };
    match result {
        Ok(()) => true,
        Err(e) => {
            report_device_error(view, &e);
            false
        }
    }
}

pub fn stop_recording(ctx: &mut SessionContext, view: &mut dyn ChatView) -> bool {
    match ctx.devices.get_mut(DeviceKind::Microphone).stop() {
        Ok(clip) => {
            info!("Recording finished: {} bytes", clip.bytes.len());
            true
        }
        Err(e) => {
            report_device_error(view, &e);
            false
        }
    }
}

/// Hand the captured artifact over. Images are staged at once and the
/// dialog closes; a recording comes back as a `PendingUpload` for the
/// caller to push through `/upload` and `finish_upload`.
pub fn begin_commit(
    ctx: &mut SessionContext,
    view: &mut dyn ChatView,
    kind: DeviceKind,
) -> Option<PendingUpload> {
    let artifact = match ctx.devices.get_mut(kind).commit() {
        Ok(artifact) => artifact,
        Err(e) => {
            report_device_error(view, &e);
            return None;
        }
    };
    ctx.dialogs.close(DialogKind::for_device(kind), &mut ctx.devices);

    match artifact {
        Artifact::Image(image) => {
            let origin = match kind {
                DeviceKind::Camera => ImageOrigin::Camera,
                _ => ImageOrigin::Screenshot,
            };
            ctx.staging.stage(Attachment::InlineImage {
                data: image.to_data_url(),
                origin,
            });
            let label = match origin {
                ImageOrigin::Camera => "Photo captured successfully",
                ImageOrigin::Screenshot => "Screen captured successfully",
            };
            view.notify(Toast::success(label));
            None
        }
        Artifact::Audio(clip) => {
            let extension = match clip.mime_type.as_str() {
                "audio/webm" => "webm",
                _ => "wav",
            };
            let name = format!(
                "recording-{}.{}",
                Local::now().format("%Y%m%d-%H%M%S"),
                extension
            );
            view.notify(Toast::info("Uploading recording..."));
            Some(PendingUpload {
                name,
                bytes: clip.bytes,
            })
        }
    }
}

pub async fn commit_capture(
    ctx: &mut SessionContext,
    view: &mut dyn ChatView,
    service: &dyn ChatService,
    kind: DeviceKind,
) -> bool {
    match begin_commit(ctx, view, kind) {
        Some(upload) => {
            let result = service.upload_file(upload.name, upload.bytes).await;
            finish_upload(ctx, view, result)
        }
        None => !ctx.staging.is_empty(),
    }
}
