use serde::{Deserialize, Serialize};

use crate::core::attachment::{Attachment, UploadedFile};

use super::service::ApiError;

// ============================================================================
// POST /chat
// ============================================================================

/// Body of `POST /chat`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub attachment: Option<AttachmentPayload>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, attachment: Option<&Attachment>) -> Self {
        Self {
            message: message.into(),
            attachment: attachment.map(AttachmentPayload::from),
        }
    }
}

/// How the staged attachment is described to the chat endpoint.
///
/// ```json
/// {"filename": "3f2a..._error.log", "isScreenshot": false}
/// {"isScreenshot": true, "data": "data:image/png;base64,..."}
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum AttachmentPayload {
    File {
        filename: String,
        #[serde(rename = "isScreenshot")]
        is_screenshot: bool,
    },
    Inline {
        #[serde(rename = "isScreenshot")]
        is_screenshot: bool,
        data: String,
    },
}

impl From<&Attachment> for AttachmentPayload {
    fn from(attachment: &Attachment) -> Self {
        match attachment {
            Attachment::UploadedFile(file) => AttachmentPayload::File {
                filename: file.filename.clone(),
                is_screenshot: false,
            },
            // Camera photos travel the same way as screenshots.
            Attachment::InlineImage { data, .. } => AttachmentPayload::Inline {
                is_screenshot: true,
                data: data.clone(),
            },
        }
    }
}

/// Body of a 2xx `POST /chat` response: either a reply or a backend error.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ChatReply {
    Response { response: String },
    Error { error: String },
}

// ============================================================================
// POST /upload, POST /upload-screenshot
// ============================================================================

/// Body of `POST /upload`. Success and failure share one shape.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    pub filename: Option<String>,
    pub original_filename: Option<String>,
    pub file_type: Option<String>,
    pub url: Option<String>,
    pub error: Option<String>,
}

impl UploadResponse {
    /// Turn a response into the staged-file record. `size` is the number
    /// of bytes sent, which the endpoint does not echo back.
    pub fn into_uploaded(self, original_name: &str, size: u64) -> Result<UploadedFile, ApiError> {
        if let Some(error) = self.error {
            return Err(ApiError::Backend(error));
        }
        match (self.success, self.filename) {
            (true, Some(filename)) => Ok(UploadedFile {
                url: self.url.unwrap_or_default(),
                original_name: self
                    .original_filename
                    .unwrap_or_else(|| original_name.to_string()),
                file_type: self.file_type.unwrap_or_else(|| "other".to_string()),
                filename,
                size,
            }),
            _ => Err(ApiError::Backend("Upload failed".to_string())),
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct ScreenshotUploadRequest {
    pub screenshot: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotUploadResponse {
    #[serde(default)]
    pub success: bool,
    pub filename: Option<String>,
    pub url: Option<String>,
    pub error: Option<String>,
}

// ============================================================================
// GET /health
// ============================================================================

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub version: String,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
