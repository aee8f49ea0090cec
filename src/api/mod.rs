pub mod client;
pub mod service;
pub mod types;

pub use client::ChatClient;
pub use service::{ApiError, ChatService};
pub use types::{
    AttachmentPayload, ChatReply, ChatRequest, HealthResponse, ScreenshotUploadResponse,
    UploadResponse,
};
