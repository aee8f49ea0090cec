//! # Attachment Staging
//!
//! A single slot holding the one non-text payload waiting to go out with
//! the next message. Staging replaces whatever was there (last write wins);
//! only the chat controller clears it.

use serde::{Deserialize, Serialize};

/// Largest file accepted for upload (16 MiB, matches the server limit).
pub const MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

/// A file the server has already accepted through the upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Server-side name, used to reference the file in chat requests.
    pub filename: String,
    pub original_name: String,
    pub size: u64,
    /// Server classification ("image", "text", "other").
    pub file_type: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageOrigin {
    Screenshot,
    Camera,
}

impl ImageOrigin {
    pub fn label(self) -> &'static str {
        match self {
            ImageOrigin::Screenshot => "Screenshot",
            ImageOrigin::Camera => "Camera photo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    UploadedFile(UploadedFile),
    /// `data` is a `data:image/...;base64,` URL.
    InlineImage { data: String, origin: ImageOrigin },
}

impl Attachment {
    /// Short label for the preview chip.
    pub fn label(&self) -> String {
        match self {
            Attachment::UploadedFile(file) => file.original_name.clone(),
            Attachment::InlineImage { origin, .. } => origin.label().to_string(),
        }
    }

    /// Size shown next to the label. Inline images are estimated from the
    /// base64 payload after the `data:...,` prefix.
    pub fn display_size(&self) -> String {
        match self {
            Attachment::UploadedFile(file) => format_file_size(file.size),
            Attachment::InlineImage { data, .. } => {
                let payload = data.split_once(',').map_or(data.as_str(), |(_, p)| p);
                format_file_size(estimated_size(payload))
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct AttachmentStaging {
    slot: Option<Attachment>,
}

impl AttachmentStaging {
    pub fn stage(&mut self, attachment: Attachment) {
        if let Some(previous) = self.slot.replace(attachment) {
            log::debug!("Replaced staged attachment: {}", previous.label());
        }
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn current(&self) -> Option<&Attachment> {
        self.slot.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}

/// Approximate decoded size of a base64 payload.
pub fn estimated_size(base64: &str) -> u64 {
    (base64.len() as u64 * 3).div_ceil(4)
}

/// Human-readable size in base-1024 units, e.g. `"0 Bytes"`, `"1.5 KB"`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut exponent = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && exponent < UNITS.len() - 1 {
        value /= 1024.0;
        exponent += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[exponent])
}
