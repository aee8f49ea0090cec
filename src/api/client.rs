//! reqwest client for the chat backend.

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use crate::core::attachment::{MAX_UPLOAD_BYTES, UploadedFile};

use super::service::{ApiError, ChatService};
use super::types::{
    ChatReply, ChatRequest, HealthResponse, ScreenshotUploadRequest, ScreenshotUploadResponse,
    UploadResponse,
};

pub struct ChatClient {
    base_url: String,
    client: reqwest::Client,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Map non-2xx to `ApiError::Status`, otherwise decode the JSON body.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        warn!("Backend returned {}: {}", status.as_u16(), body);
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: body,
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait]
impl ChatService for ChatClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, ApiError> {
        info!(
            "POST /chat: message_len={}, attachment={}",
            request.message.chars().count(),
            request.attachment.is_some()
        );
        let response = self
            .client
            .post(self.url("/chat"))
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        debug!("/chat status: {}", response.status());
        decode(response).await
    }

    async fn upload_file(
        &self,
        original_name: String,
        bytes: Vec<u8>,
    ) -> Result<UploadedFile, ApiError> {
        let size = bytes.len() as u64;
        if size > MAX_UPLOAD_BYTES {
            return Err(ApiError::FileTooLarge {
                size,
                limit: MAX_UPLOAD_BYTES,
            });
        }
        info!("POST /upload: {} ({} bytes)", original_name, size);
        let form = Form::new().part("file", Part::bytes(bytes).file_name(original_name.clone()));
        let response = self
            .client
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        // Rejections ("File type not allowed") come back as 400 with an
        // error body; surface the message rather than the status.
        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            if let Ok(parsed) = serde_json::from_str::<UploadResponse>(&body)
                && let Some(error) = parsed.error
            {
                return Err(ApiError::Backend(error));
            }
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: body,
            });
        }
        let parsed: UploadResponse = decode(response).await?;
        parsed.into_uploaded(&original_name, size)
    }

    async fn upload_screenshot(
        &self,
        data_url: String,
    ) -> Result<ScreenshotUploadResponse, ApiError> {
        info!("POST /upload-screenshot: {} chars", data_url.len());
        let response = self
            .client
            .post(self.url("/upload-screenshot"))
            .json(&ScreenshotUploadRequest { screenshot: data_url })
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let parsed: ScreenshotUploadResponse = decode(response).await?;
        match parsed.error {
            Some(error) => Err(ApiError::Backend(error)),
            None => Ok(parsed),
        }
    }

    async fn health(&self) -> Result<HealthResponse, ApiError> {
        let response = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ChatClient::new("http://localhost:5000/");
        assert_eq!(client.url("/chat"), "http://localhost:5000/chat");
    }

    #[tokio::test]
    async fn test_oversized_upload_is_refused_locally() {
        // Unroutable: the request must never be attempted.
        let client = ChatClient::new("http://127.0.0.1:9");
        let bytes = vec![0u8; (MAX_UPLOAD_BYTES + 1) as usize];
        let err = client.upload_file("big.bin".into(), bytes).await.unwrap_err();
        assert!(matches!(err, ApiError::FileTooLarge { .. }));
    }
}
