//! Capture devices: camera, screen and microphone sessions behind a
//! backend trait, driven by one explicit state machine.

pub mod backend;
pub mod directory;
pub mod machine;
pub mod session;

pub use backend::{AudioClip, DeviceError, DeviceKind, MediaBackend, MediaStream, StillImage};
pub use directory::DirectoryBackend;
pub use machine::{CaptureEvent, CaptureState, StreamEffect, Transition, transition};
pub use session::{Artifact, CaptureDevices, CaptureSession};
