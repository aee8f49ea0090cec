use arboard::{Clipboard, Error as ClipboardError};
use log::warn;

/// Put `text` on the system clipboard. Headless sessions have no clipboard;
/// that comes back as an error the caller turns into a toast.
pub fn copy_text(text: &str) -> Result<(), ClipboardError> {
    let mut clipboard = Clipboard::new().inspect_err(|e| warn!("Clipboard unavailable: {}", e))?;
    clipboard.set_text(text.to_string())
}
