//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::api::{
    ApiError, ChatReply, ChatRequest, ChatService, HealthResponse, ScreenshotUploadResponse,
};
use crate::core::attachment::UploadedFile;
use crate::core::conversation::{Conversation, Sender};
use crate::core::render::DisplayOp;
use crate::core::view::{ChatView, Toast};
use crate::devices::{DeviceError, DeviceKind, MediaBackend, MediaStream, StillImage};

// ============================================================================
// Chat service
// ============================================================================

enum Script {
    Reply(String),
    BackendError(String),
    Fail,
}

/// A chat service that answers every request the same way and records
/// what it was asked.
pub struct ScriptedService {
    script: Script,
    requests: Mutex<Vec<ChatRequest>>,
    uploads: Mutex<Vec<(String, Vec<u8>)>>,
}

impl ScriptedService {
    fn with(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::with(Script::Reply(text.to_string()))
    }

    pub fn backend_error(message: &str) -> Self {
        Self::with(Script::BackendError(message.to_string()))
    }

    /// Every call fails at the transport level.
    pub fn failing() -> Self {
        Self::with(Script::Fail)
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<(String, Vec<u8>)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatService for ScriptedService {
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, ApiError> {
        self.requests.lock().unwrap().push(request);
        match &self.script {
            Script::Reply(text) => Ok(ChatReply::Response { response: text.clone() }),
            Script::BackendError(msg) => Ok(ChatReply::Error { error: msg.clone() }),
            Script::Fail => Err(ApiError::Network("connection refused".to_string())),
        }
    }

    async fn upload_file(
        &self,
        original_name: String,
        bytes: Vec<u8>,
    ) -> Result<UploadedFile, ApiError> {
        if matches!(self.script, Script::Fail) {
            return Err(ApiError::Network("connection refused".to_string()));
        }
        let size = bytes.len() as u64;
        let filename = format!("test_{original_name}");
        self.uploads.lock().unwrap().push((original_name.clone(), bytes));
        Ok(UploadedFile {
            url: format!("/static/uploads/{filename}"),
            filename,
            original_name,
            size,
            file_type: "other".to_string(),
        })
    }

    async fn upload_screenshot(
        &self,
        _data_url: String,
    ) -> Result<ScreenshotUploadResponse, ApiError> {
        Ok(ScreenshotUploadResponse {
            success: true,
            filename: Some("screenshot_test.png".to_string()),
            url: Some("/static/uploads/screenshot_test.png".to_string()),
            error: None,
        })
    }

    async fn health(&self) -> Result<HealthResponse, ApiError> {
        Ok(HealthResponse {
            status: "healthy".to_string(),
            service: "test".to_string(),
            version: "0".to_string(),
        })
    }
}

// ============================================================================
// View
// ============================================================================

/// Records everything the controller asks the view to do.
#[derive(Default)]
pub struct RecordingView {
    pub ops: Vec<DisplayOp>,
    pub clears: usize,
    pub composing_history: Vec<bool>,
    pub toasts: Vec<Toast>,
    pub sidebar: Vec<(String, bool)>,
}

impl RecordingView {
    pub fn last_toast(&self) -> Option<&Toast> {
        self.toasts.last()
    }

    /// Sender of every message rendered since the last clear, in order.
    pub fn rendered_senders(&self) -> Vec<Sender> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DisplayOp::Begin { sender, .. } => Some(*sender),
                _ => None,
            })
            .collect()
    }
}

impl ChatView for RecordingView {
    fn apply(&mut self, op: DisplayOp) {
        self.ops.push(op);
    }

    fn clear_messages(&mut self) {
        self.ops.clear();
        self.clears += 1;
    }

    fn refresh_sidebar(&mut self, conversations: &[Conversation], active_id: Option<&str>) {
        self.sidebar = conversations
            .iter()
            .map(|c| (c.title.clone(), Some(c.id.as_str()) == active_id))
            .collect();
    }

    fn set_composing(&mut self, visible: bool) {
        self.composing_history.push(visible);
    }

    fn notify(&mut self, toast: Toast) {
        self.toasts.push(toast);
    }
}

// ============================================================================
// Media backend
// ============================================================================

/// Counts how many times streams of one kind were stopped.
#[derive(Clone, Default, Debug)]
pub struct StreamProbe(Arc<AtomicUsize>);

impl StreamProbe {
    pub fn stops(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct ScriptedStream {
    kind: DeviceKind,
    probe: StreamProbe,
    fail_frames: bool,
    audio: Vec<Vec<u8>>,
    paused: bool,
}

impl MediaStream for ScriptedStream {
    fn kind(&self) -> DeviceKind {
        self.kind
    }

    fn grab_frame(&mut self) -> Result<StillImage, DeviceError> {
        if self.fail_frames {
            return Err(DeviceError::Hardware("camera unplugged".to_string()));
        }
        Ok(StillImage {
            mime_type: "image/png".to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        })
    }

    /// One chunk per call, in order.
    fn read_audio(&mut self) -> Vec<Vec<u8>> {
        if self.paused || self.audio.is_empty() {
            return Vec::new();
        }
        vec![self.audio.remove(0)]
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    fn stop(&mut self) {
        self.probe.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// A media backend that grants or denies per device and counts stops.
#[derive(Default)]
pub struct ScriptedBackend {
    denied: HashSet<DeviceKind>,
    failing_frames: HashSet<DeviceKind>,
    audio: Vec<Vec<u8>>,
    probes: Mutex<HashMap<DeviceKind, StreamProbe>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny(mut self, kind: DeviceKind) -> Self {
        self.denied.insert(kind);
        self
    }

    pub fn failing_frames(mut self, kind: DeviceKind) -> Self {
        self.failing_frames.insert(kind);
        self
    }

    pub fn with_audio(mut self, chunks: Vec<Vec<u8>>) -> Self {
        self.audio = chunks;
        self
    }

    pub fn probe(&self, kind: DeviceKind) -> StreamProbe {
        self.probes
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .clone()
    }
}

#[async_trait]
impl MediaBackend for ScriptedBackend {
    async fn acquire(&self, kind: DeviceKind) -> Result<Box<dyn MediaStream>, DeviceError> {
        if self.denied.contains(&kind) {
            return Err(DeviceError::PermissionDenied(kind));
        }
        Ok(Box::new(ScriptedStream {
            kind,
            probe: self.probe(kind),
            fail_frames: self.failing_frames.contains(&kind),
            audio: self.audio.clone(),
            paused: false,
        }))
    }
}
