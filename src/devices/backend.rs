use std::fmt;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::machine::{CaptureEvent, CaptureState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Camera,
    Screen,
    Microphone,
}

impl DeviceKind {
    pub fn label(self) -> &'static str {
        match self {
            DeviceKind::Camera => "camera",
            DeviceKind::Screen => "screen",
            DeviceKind::Microphone => "microphone",
        }
    }

    /// Camera and screen produce still frames; the microphone records.
    pub fn is_video(self) -> bool {
        !matches!(self, DeviceKind::Microphone)
    }
}

/// Device failures. All are recoverable: the session falls back to Idle.
#[derive(Debug)]
pub enum DeviceError {
    /// The user (or OS) refused access.
    PermissionDenied(DeviceKind),
    /// No such device is available.
    NotFound(DeviceKind),
    /// The device failed while in use.
    Hardware(String),
    /// The requested operation is not valid in the session's current state.
    InvalidTransition {
        kind: DeviceKind,
        state: CaptureState,
        event: CaptureEvent,
    },
}

impl DeviceError {
    /// Message suitable for a toast.
    pub fn user_message(&self) -> String {
        match self {
            DeviceError::PermissionDenied(DeviceKind::Camera)
            | DeviceError::NotFound(DeviceKind::Camera) => {
                "Failed to access camera. Please ensure you have granted camera permissions."
                    .to_string()
            }
            DeviceError::PermissionDenied(DeviceKind::Screen)
            | DeviceError::NotFound(DeviceKind::Screen) => "Failed to start screen sharing".to_string(),
            DeviceError::PermissionDenied(DeviceKind::Microphone)
            | DeviceError::NotFound(DeviceKind::Microphone) => {
                "Failed to access microphone".to_string()
            }
            DeviceError::Hardware(msg) => format!("Device error: {msg}"),
            DeviceError::InvalidTransition { kind, state, .. } => {
                format!("The {} can't do that while {:?}", kind.label(), state)
            }
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::PermissionDenied(kind) => write!(f, "{} access denied", kind.label()),
            DeviceError::NotFound(kind) => write!(f, "no {} available", kind.label()),
            DeviceError::Hardware(msg) => write!(f, "device failure: {msg}"),
            DeviceError::InvalidTransition { kind, state, event } => {
                write!(f, "{} session cannot handle {:?} in {:?}", kind.label(), event, state)
            }
        }
    }
}

impl std::error::Error for DeviceError {}

/// An encoded still frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StillImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl StillImage {
    /// `data:<mime>;base64,<payload>` form, as sent to the chat endpoint.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

/// A finished recording: every chunk concatenated in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AudioClip {
    pub fn from_chunks(mime_type: impl Into<String>, chunks: Vec<Vec<u8>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes: chunks.concat(),
        }
    }
}

/// A live device stream. Exclusively owned by one capture session.
pub trait MediaStream: Send + fmt::Debug {
    fn kind(&self) -> DeviceKind;

    /// One frame at the stream's native resolution. Video streams only.
    fn grab_frame(&mut self) -> Result<StillImage, DeviceError>;

    /// Audio chunks produced since the last call. Empty while paused.
    fn read_audio(&mut self) -> Vec<Vec<u8>>;

    /// MIME type of the audio this stream produces.
    fn audio_mime_type(&self) -> &str {
        "audio/wav"
    }

    fn set_paused(&mut self, paused: bool);

    /// Stop every underlying track. Called exactly once per stream.
    fn stop(&mut self);
}

/// Grants access to capture devices.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    async fn acquire(&self, kind: DeviceKind) -> Result<Box<dyn MediaStream>, DeviceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url() {
        let image = StillImage {
            mime_type: "image/png".into(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        };
        assert_eq!(image.to_data_url(), "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn test_clip_concatenates_in_order() {
        let clip = AudioClip::from_chunks("audio/wav", vec![vec![1, 2], vec![], vec![3]]);
        assert_eq!(clip.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_user_messages_name_device() {
        assert!(DeviceError::NotFound(DeviceKind::Camera).user_message().contains("camera"));
        assert!(
            DeviceError::PermissionDenied(DeviceKind::Microphone)
                .user_message()
                .contains("microphone")
        );
    }
}
