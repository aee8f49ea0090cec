//! File-backed capture devices.
//!
//! Each device is a file in one directory:
//!
//! | Device     | File             |
//! |------------|------------------|
//! | Camera     | `camera.png`     |
//! | Screen     | `screen.png`     |
//! | Microphone | `microphone.wav` |
//!
//! A missing file means the device is not available. The microphone file
//! is played back in fixed-size chunks, one per poll, while not paused.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info};

use super::backend::{DeviceError, DeviceKind, MediaBackend, MediaStream, StillImage};

pub const DEFAULT_CHUNK_BYTES: usize = 16 * 1024;

pub struct DirectoryBackend {
    dir: PathBuf,
    chunk_bytes: usize,
}

impl DirectoryBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            chunk_bytes: DEFAULT_CHUNK_BYTES,
        }
    }

    pub fn with_chunk_bytes(mut self, chunk_bytes: usize) -> Self {
        self.chunk_bytes = chunk_bytes.max(1);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(kind: DeviceKind) -> &'static str {
        match kind {
            DeviceKind::Camera => "camera.png",
            DeviceKind::Screen => "screen.png",
            DeviceKind::Microphone => "microphone.wav",
        }
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("wav") => "audio/wav",
        Some("webm") => "audio/webm",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl MediaBackend for DirectoryBackend {
    async fn acquire(&self, kind: DeviceKind) -> Result<Box<dyn MediaStream>, DeviceError> {
        let path = self.dir.join(Self::file_for(kind));
        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DeviceError::NotFound(kind),
            io::ErrorKind::PermissionDenied => DeviceError::PermissionDenied(kind),
            _ => DeviceError::Hardware(format!("{}: {}", path.display(), e)),
        })?;
        info!("Opened {} from {} ({} bytes)", kind.label(), path.display(), bytes.len());
        Ok(Box::new(FileStream {
            kind,
            mime_type: mime_for(&path),
            bytes,
            cursor: 0,
            chunk_bytes: self.chunk_bytes,
            paused: false,
            stopped: false,
        }))
    }
}

#[derive(Debug)]
struct FileStream {
    kind: DeviceKind,
    mime_type: &'static str,
    bytes: Vec<u8>,
    cursor: usize,
    chunk_bytes: usize,
    paused: bool,
    stopped: bool,
}

impl MediaStream for FileStream {
    fn kind(&self) -> DeviceKind {
        self.kind
    }

    fn grab_frame(&mut self) -> Result<StillImage, DeviceError> {
        if self.stopped {
            return Err(DeviceError::Hardware(format!("{} stream stopped", self.kind.label())));
        }
        if !self.kind.is_video() {
            return Err(DeviceError::Hardware("microphone has no frames".to_string()));
        }
        Ok(StillImage {
            mime_type: self.mime_type.to_string(),
            bytes: self.bytes.clone(),
        })
    }

    fn read_audio(&mut self) -> Vec<Vec<u8>> {
        if self.stopped || self.paused || self.kind.is_video() || self.cursor >= self.bytes.len() {
            return Vec::new();
        }
        let end = (self.cursor + self.chunk_bytes).min(self.bytes.len());
        let chunk = self.bytes[self.cursor..end].to_vec();
        self.cursor = end;
        vec![chunk]
    }

    fn audio_mime_type(&self) -> &str {
        self.mime_type
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    fn stop(&mut self) {
        self.stopped = true;
        debug!("Stopped {} file stream", self.kind.label());
    }
}
