//! # Dialog Manager
//!
//! Tracks the one open modal. Opening a dialog closes whatever was open
//! first, and closing a capture dialog closes its device session so the
//! stream is never left running behind a hidden modal.

use log::debug;

use crate::devices::{CaptureDevices, DeviceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKind {
    Camera,
    Screen,
    Microphone,
    /// File path prompt for uploads.
    Upload,
    ConfirmDeleteAll,
    Help,
}

impl DialogKind {
    /// The capture device behind this dialog, if any.
    pub fn device(self) -> Option<DeviceKind> {
        match self {
            DialogKind::Camera => Some(DeviceKind::Camera),
            DialogKind::Screen => Some(DeviceKind::Screen),
            DialogKind::Microphone => Some(DeviceKind::Microphone),
            _ => None,
        }
    }

    pub fn for_device(kind: DeviceKind) -> Self {
        match kind {
            DeviceKind::Camera => DialogKind::Camera,
            DeviceKind::Screen => DialogKind::Screen,
            DeviceKind::Microphone => DialogKind::Microphone,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DialogKind::Camera => "Camera",
            DialogKind::Screen => "Screen Capture",
            DialogKind::Microphone => "Voice Recording",
            DialogKind::Upload => "Attach File",
            DialogKind::ConfirmDeleteAll => "Clear All Conversations",
            DialogKind::Help => "Keyboard Shortcuts",
        }
    }
}

#[derive(Debug, Default)]
pub struct DialogManager {
    open: Option<DialogKind>,
}

impl DialogManager {
    pub fn current(&self) -> Option<DialogKind> {
        self.open
    }

    pub fn is_open(&self, kind: DialogKind) -> bool {
        self.open == Some(kind)
    }

    /// Open `kind`, closing any other open dialog first.
    pub fn open(&mut self, kind: DialogKind, devices: &mut CaptureDevices) {
        if let Some(previous) = self.open
            && previous != kind
        {
            self.close(previous, devices);
        }
        debug!("Dialog opened: {:?}", kind);
        self.open = Some(kind);
    }

    /// Close `kind` if it is the open dialog. No-op otherwise.
    pub fn close(&mut self, kind: DialogKind, devices: &mut CaptureDevices) {
        if self.open != Some(kind) {
            return;
        }
        self.open = None;
        if let Some(device) = kind.device() {
            devices.get_mut(device).close();
        }
        debug!("Dialog closed: {:?}", kind);
    }

    /// Close whatever is open (Escape).
    pub fn close_any(&mut self, devices: &mut CaptureDevices) {
        if let Some(kind) = self.open {
            self.close(kind, devices);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::CaptureState;
    use crate::test_support::ScriptedBackend;

    #[test]
    fn test_only_one_open() {
        let mut devices = CaptureDevices::default();
        let mut dialogs = DialogManager::default();
        dialogs.open(DialogKind::Help, &mut devices);
        dialogs.open(DialogKind::Upload, &mut devices);
        assert_eq!(dialogs.current(), Some(DialogKind::Upload));
        assert!(!dialogs.is_open(DialogKind::Help));
    }

    #[tokio::test]
    async fn test_switching_dialog_releases_camera() {
        let backend = ScriptedBackend::new();
        let mut devices = CaptureDevices::default();
        let mut dialogs = DialogManager::default();

        dialogs.open(DialogKind::Camera, &mut devices);
        devices.get_mut(DeviceKind::Camera).open(&backend).await.unwrap();
        assert!(devices.get(DeviceKind::Camera).holds_stream());

        dialogs.open(DialogKind::Screen, &mut devices);
        assert_eq!(devices.get(DeviceKind::Camera).state(), CaptureState::Idle);
        assert_eq!(backend.probe(DeviceKind::Camera).stops(), 1);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut devices = CaptureDevices::default();
        let mut dialogs = DialogManager::default();
        dialogs.open(DialogKind::Microphone, &mut devices);
        dialogs.close(DialogKind::Microphone, &mut devices);
        dialogs.close(DialogKind::Microphone, &mut devices);
        dialogs.close_any(&mut devices);
        assert_eq!(dialogs.current(), None);
    }

    #[test]
    fn test_closing_other_kind_is_noop() {
        let mut devices = CaptureDevices::default();
        let mut dialogs = DialogManager::default();
        dialogs.open(DialogKind::Help, &mut devices);
        dialogs.close(DialogKind::Camera, &mut devices);
        assert_eq!(dialogs.current(), Some(DialogKind::Help));
    }

    #[test]
    fn test_device_mapping() {
        for kind in [DeviceKind::Camera, DeviceKind::Screen, DeviceKind::Microphone] {
            assert_eq!(DialogKind::for_device(kind).device(), Some(kind));
        }
        assert_eq!(DialogKind::ConfirmDeleteAll.device(), None);
    }
}
