//! # Capture Session
//!
//! Owns at most one live stream for one device and drives it through the
//! state machine. The stream is released exactly once: on close, on commit
//! (camera/screen), on stop (microphone), or when the session is dropped.

use log::{debug, info, warn};

use super::backend::{AudioClip, DeviceError, DeviceKind, MediaBackend, MediaStream, StillImage};
use super::machine::{CaptureEvent, CaptureState, StreamEffect, transition};

/// What a finished capture produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    Image(StillImage),
    Audio(AudioClip),
}

#[derive(Debug)]
pub struct CaptureSession {
    kind: DeviceKind,
    state: CaptureState,
    stream: Option<Box<dyn MediaStream>>,
    artifact: Option<Artifact>,
    chunks: Vec<Vec<u8>>,
}

impl CaptureSession {
    pub fn new(kind: DeviceKind) -> Self {
        Self {
            kind,
            state: CaptureState::Idle,
            stream: None,
            artifact: None,
            chunks: Vec::new(),
        }
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// The held image or recording, while in Captured.
    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    pub fn holds_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Bytes recorded so far (microphone).
    pub fn recorded_bytes(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    fn fire(&mut self, event: CaptureEvent) -> Result<StreamEffect, DeviceError> {
        let t = transition(self.kind, self.state, event)?;
        debug!(
            "{} session: {:?} --{:?}--> {:?}",
            self.kind.label(),
            self.state,
            event,
            t.next
        );
        self.state = t.next;
        if t.effect == StreamEffect::Release {
            self.release();
        }
        Ok(t.effect)
    }

    fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            info!("Released {} stream", self.kind.label());
        }
    }

    /// First half of opening: Idle → Acquiring. The caller then asks the
    /// backend for a stream and hands the result to `complete_open`.
    pub fn begin_open(&mut self) -> Result<(), DeviceError> {
        self.fire(CaptureEvent::Open).map(|_| ())
    }

    /// Second half of opening. A grant that arrives after the session was
    /// closed is stopped immediately rather than attached.
    pub fn complete_open(
        &mut self,
        result: Result<Box<dyn MediaStream>, DeviceError>,
    ) -> Result<(), DeviceError> {
        if self.state != CaptureState::Acquiring {
            if let Ok(mut stream) = result {
                warn!(
                    "{} granted after session left Acquiring; stopping stream",
                    self.kind.label()
                );
                stream.stop();
            }
            return Ok(());
        }
        match result {
            Ok(stream) => {
                self.fire(CaptureEvent::Granted)?;
                self.chunks.clear();
                self.stream = Some(stream);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to acquire {}: {}", self.kind.label(), e);
                self.fire(CaptureEvent::Denied)?;
                Err(e)
            }
        }
    }

    /// Acquire a stream in one step.
    pub async fn open(&mut self, backend: &dyn MediaBackend) -> Result<(), DeviceError> {
        self.begin_open()?;
        let result = backend.acquire(self.kind).await;
        self.complete_open(result)
    }

    /// Microphone: acquire the device and start recording at once.
    pub async fn start_recording(&mut self, backend: &dyn MediaBackend) -> Result<(), DeviceError> {
        if self.kind.is_video() {
            return Err(DeviceError::InvalidTransition {
                kind: self.kind,
                state: self.state,
                event: CaptureEvent::Open,
            });
        }
        self.open(backend).await
    }

    /// Grab one frame from the live preview. A hardware failure closes the
    /// session.
    pub fn capture(&mut self) -> Result<StillImage, DeviceError> {
        transition(self.kind, self.state, CaptureEvent::Capture)?;
        let frame = match self.stream.as_mut() {
            Some(stream) => stream.grab_frame(),
            None => Err(DeviceError::Hardware(format!("{} stream lost", self.kind.label()))),
        };
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                self.close();
                return Err(e);
            }
        };
        self.fire(CaptureEvent::Capture)?;
        self.artifact = Some(Artifact::Image(frame.clone()));
        Ok(frame)
    }

    pub fn pause(&mut self) -> Result<(), DeviceError> {
        self.poll_audio();
        self.fire(CaptureEvent::Pause)?;
        if let Some(stream) = self.stream.as_mut() {
            stream.set_paused(true);
        }
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), DeviceError> {
        self.fire(CaptureEvent::Resume)?;
        if let Some(stream) = self.stream.as_mut() {
            stream.set_paused(false);
        }
        Ok(())
    }

    /// Collect audio produced since the last poll. Returns the number of
    /// new chunks.
    pub fn poll_audio(&mut self) -> usize {
        if self.state != CaptureState::Active || self.kind.is_video() {
            return 0;
        }
        let Some(stream) = self.stream.as_mut() else {
            return 0;
        };
        let fresh = stream.read_audio();
        let count = fresh.len();
        self.chunks.extend(fresh);
        count
    }

    /// Microphone: finish recording. Drains outstanding audio, releases the
    /// device, and holds the clip.
    pub fn stop(&mut self) -> Result<AudioClip, DeviceError> {
        transition(self.kind, self.state, CaptureEvent::Stop)?;
        self.poll_audio();
        let mime = self
            .stream
            .as_ref()
            .map(|s| s.audio_mime_type().to_string())
            .unwrap_or_else(|| "audio/wav".to_string());
        self.fire(CaptureEvent::Stop)?;
        let clip = AudioClip::from_chunks(mime, std::mem::take(&mut self.chunks));
        self.artifact = Some(Artifact::Audio(clip.clone()));
        Ok(clip)
    }

    /// Drop the captured image and return to the live preview.
    pub fn retake(&mut self) -> Result<(), DeviceError> {
        self.fire(CaptureEvent::Retake)?;
        self.artifact = None;
        Ok(())
    }

    /// Hand over the captured artifact. The stream is released.
    pub fn commit(&mut self) -> Result<Artifact, DeviceError> {
        transition(self.kind, self.state, CaptureEvent::Commit)?;
        let artifact = self.artifact.take().ok_or(DeviceError::InvalidTransition {
            kind: self.kind,
            state: self.state,
            event: CaptureEvent::Commit,
        })?;
        self.fire(CaptureEvent::Commit)?;
        Ok(artifact)
    }

    /// Release everything and return to Idle. Safe to call from any state.
    pub fn close(&mut self) {
        // Close is valid from every state.
        let _ = self.fire(CaptureEvent::Close);
        self.artifact = None;
        self.chunks.clear();
    }

    /// After a commit, the dialog closing puts the session back to Idle.
    pub fn reset_sent(&mut self) {
        if self.state == CaptureState::Sent {
            self.close();
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// One session per device kind.
#[derive(Debug)]
pub struct CaptureDevices {
    camera: CaptureSession,
    screen: CaptureSession,
    microphone: CaptureSession,
}

impl Default for CaptureDevices {
    fn default() -> Self {
        Self {
            camera: CaptureSession::new(DeviceKind::Camera),
            screen: CaptureSession::new(DeviceKind::Screen),
            microphone: CaptureSession::new(DeviceKind::Microphone),
        }
    }
}

impl CaptureDevices {
    pub fn get(&self, kind: DeviceKind) -> &CaptureSession {
        match kind {
            DeviceKind::Camera => &self.camera,
            DeviceKind::Screen => &self.screen,
            DeviceKind::Microphone => &self.microphone,
        }
    }

    pub fn get_mut(&mut self, kind: DeviceKind) -> &mut CaptureSession {
        match kind {
            DeviceKind::Camera => &mut self.camera,
            DeviceKind::Screen => &mut self.screen,
            DeviceKind::Microphone => &mut self.microphone,
        }
    }

    /// Close every session. Used on shutdown.
    pub fn release_all(&mut self) {
        self.camera.close();
        self.screen.close();
        self.microphone.close();
    }

    /// Return sessions that already handed over their artifact to Idle.
    pub fn clear_previews(&mut self) {
        self.camera.reset_sent();
        self.screen.reset_sent();
        self.microphone.reset_sent();
    }

    pub fn any_live(&self) -> bool {
        self.camera.holds_stream() || self.screen.holds_stream() || self.microphone.holds_stream()
    }
}
