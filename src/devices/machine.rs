//! # Capture State Machine
//!
//! Every capture session (camera, screen, microphone) moves through the
//! same states. `transition` is pure: it returns the next state and what
//! must happen to the device stream, and the session applies it.
//!
//! ```text
//!            Open            Granted
//!   Idle ──────────► Acquiring ──────► Active ◄──── Retake (camera/screen)
//!    ▲                   │ Denied        │  ▲ ╲
//!    └───────────────────┘        Pause  │  │ Resume (microphone)
//!                                        ▼  │   ╲ Capture / Stop
//!                                       Paused ──► Captured ── Commit ──► Sent
//!
//!   Close: any state ──► Idle, releasing the stream
//! ```

use super::backend::{DeviceError, DeviceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    /// Waiting for the backend to grant access.
    Acquiring,
    /// Live preview, or recording for the microphone.
    Active,
    /// Microphone only.
    Paused,
    /// An image or recording is held and awaiting commit or retake.
    Captured,
    /// Committed to staging. Resets to Idle when the dialog closes.
    Sent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureEvent {
    Open,
    Granted,
    Denied,
    Capture,
    Pause,
    Resume,
    Stop,
    Retake,
    Commit,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEffect {
    None,
    /// Ask the backend for a stream.
    Acquire,
    /// Stop and drop the held stream, if any.
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: CaptureState,
    pub effect: StreamEffect,
}

impl Transition {
    fn to(next: CaptureState) -> Self {
        Self { next, effect: StreamEffect::None }
    }

    fn with(next: CaptureState, effect: StreamEffect) -> Self {
        Self { next, effect }
    }
}

pub fn transition(
    kind: DeviceKind,
    state: CaptureState,
    event: CaptureEvent,
) -> Result<Transition, DeviceError> {
    use CaptureEvent as E;
    use CaptureState as S;

    let video = kind.is_video();
    let result = match (state, event) {
        (S::Idle, E::Close) => Transition::to(S::Idle),
        (_, E::Close) => Transition::with(S::Idle, StreamEffect::Release),

        (S::Idle, E::Open) => Transition::with(S::Acquiring, StreamEffect::Acquire),
        (S::Acquiring, E::Granted) => Transition::to(S::Active),
        (S::Acquiring, E::Denied) => Transition::to(S::Idle),

        (S::Active, E::Capture) if video => Transition::to(S::Captured),
        (S::Captured, E::Retake) if video => Transition::to(S::Active),
        (S::Captured, E::Commit) if video => Transition::with(S::Sent, StreamEffect::Release),

        (S::Active, E::Pause) if !video => Transition::to(S::Paused),
        (S::Paused, E::Resume) if !video => Transition::to(S::Active),
        (S::Active | S::Paused, E::Stop) if !video => {
            Transition::with(S::Captured, StreamEffect::Release)
        }
        // The recorder already gave the device back on stop.
        (S::Captured, E::Commit) => Transition::to(S::Sent),

        _ => return Err(DeviceError::InvalidTransition { kind, state, event }),
    };
    Ok(result)
}
