use std::fmt;
use std::io;

use async_trait::async_trait;

use crate::core::attachment::UploadedFile;

use super::types::{ChatReply, ChatRequest, HealthResponse, ScreenshotUploadResponse};

/// Errors from the remote chat backend.
#[derive(Debug)]
pub enum ApiError {
    /// Connection refused, DNS failure, dropped connection.
    Network(String),
    /// The endpoint answered with a non-2xx status.
    Status { status: u16, message: String },
    /// The body could not be parsed.
    Decode(String),
    /// The endpoint answered 2xx with an `error` field.
    Backend(String),
    /// Refused locally before any request was made.
    FileTooLarge { size: u64, limit: u64 },
    /// Reading a local file for upload failed.
    Io(io::Error),
    /// The task carrying the request died before it produced an answer.
    Interrupted(String),
}

impl ApiError {
    /// Transport-level failures, as opposed to errors the backend reported.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_)
                | ApiError::Status { .. }
                | ApiError::Decode(_)
                | ApiError::Interrupted(_)
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "network error: {msg}"),
            ApiError::Status { status, message } => {
                write!(f, "HTTP error! status: {status} {message}")
            }
            ApiError::Decode(msg) => write!(f, "invalid response: {msg}"),
            ApiError::Backend(msg) => write!(f, "{msg}"),
            ApiError::FileTooLarge { .. } => write!(f, "File size must be less than 16MB"),
            ApiError::Io(e) => write!(f, "I/O error: {e}"),
            ApiError::Interrupted(msg) => write!(f, "request interrupted: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<io::Error> for ApiError {
    fn from(e: io::Error) -> Self {
        ApiError::Io(e)
    }
}

/// The remote chat backend.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// One request/response exchange. No retry, no timeout.
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, ApiError>;

    /// Upload a file; the server assigns the name used in later chat requests.
    async fn upload_file(&self, original_name: String, bytes: Vec<u8>)
    -> Result<UploadedFile, ApiError>;

    /// Store a `data:image/...` screenshot server-side.
    async fn upload_screenshot(&self, data_url: String)
    -> Result<ScreenshotUploadResponse, ApiError>;

    async fn health(&self) -> Result<HealthResponse, ApiError>;
}
