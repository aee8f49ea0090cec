use std::fs;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use confab::api::ChatClient;
use confab::core::controller;
use confab::core::conversation::{Conversation, Sender};
use confab::core::render::DisplayOp;
use confab::core::state::SessionContext;
use confab::core::storage::{FileStore, load_conversations};
use confab::core::view::{ChatView, Toast, ToastLevel};
use confab::devices::{DeviceKind, DirectoryBackend, MediaBackend};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, method, path},
};

/// Keeps what the session showed, in order.
#[derive(Default)]
struct ScreenLog {
    senders: Vec<Sender>,
    composing: bool,
    sidebar_len: usize,
    toasts: Vec<Toast>,
}

impl ChatView for ScreenLog {
    fn apply(&mut self, op: DisplayOp) {
        if let DisplayOp::Begin { sender, .. } = op {
            self.senders.push(sender);
        }
    }

    fn clear_messages(&mut self) {
        self.senders.clear();
    }

    fn refresh_sidebar(&mut self, conversations: &[Conversation], _active_id: Option<&str>) {
        self.sidebar_len = conversations.len();
    }

    fn set_composing(&mut self, visible: bool) {
        self.composing = visible;
    }

    fn notify(&mut self, toast: Toast) {
        self.toasts.push(toast);
    }
}

fn session(dir: &tempfile::TempDir) -> SessionContext {
    let store = FileStore::open(dir.path().join("data")).unwrap();
    SessionContext::new(Arc::new(store), dir.path().join("exports"))
}

async fn mount_reply(server: &MockServer, reply: &str) {
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": reply})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_first_message_creates_conversation() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({"message": "Hello", "attachment": null})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "Hi there"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut ctx = session(&dir);
    let mut view = ScreenLog::default();
    let client = ChatClient::new(mock_server.uri());

    assert!(ctx.store.conversations().is_empty());
    assert!(controller::send(&mut ctx, &mut view, &client, "Hello").await);

    let active = ctx.store.active().unwrap();
    assert_eq!(active.title, "Hello");
    assert_eq!(active.messages.len(), 2);
    assert_eq!(active.messages[1].content, "Hi there");
    assert_eq!(view.senders, vec![Sender::User, Sender::Assistant]);
    assert_eq!(view.sidebar_len, 1);
    assert!(!view.composing);

    // A fresh session over the same directory sees the exchange
    let reopened = session(&dir);
    assert_eq!(reopened.store.conversations().len(), 1);
    assert_eq!(reopened.store.conversations()[0].messages.len(), 2);
}

#[tokio::test]
async fn test_camera_photo_sent_with_empty_text() {
    let dir = tempfile::tempdir().unwrap();
    let devices_dir = dir.path().join("devices");
    fs::create_dir_all(&devices_dir).unwrap();
    let png = b"\x89PNG camera frame".to_vec();
    fs::write(devices_dir.join("camera.png"), &png).unwrap();
    let data = format!("data:image/png;base64,{}", STANDARD.encode(&png));

    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({
            "message": "",
            "attachment": {"isScreenshot": true, "data": data}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "That is a BSOD."})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut ctx = session(&dir);
    let mut view = ScreenLog::default();
    controller::start(&mut ctx, &mut view);
    let backend = DirectoryBackend::new(&devices_dir);
    let client = ChatClient::new(mock_server.uri());

    assert!(controller::open_device(&mut ctx, &mut view, DeviceKind::Camera));
    let stream = backend.acquire(DeviceKind::Camera).await;
    assert!(controller::finish_open(&mut ctx, &mut view, DeviceKind::Camera, stream));
    assert!(controller::capture_still(&mut ctx, &mut view, DeviceKind::Camera));
    assert!(controller::commit_capture(&mut ctx, &mut view, &client, DeviceKind::Camera).await);
    assert!(!ctx.staging.is_empty());
    assert!(ctx.dialogs.current().is_none());

    assert!(controller::send(&mut ctx, &mut view, &client, "").await);

    // No user bubble for empty text, only the reply
    let active = ctx.store.active().unwrap();
    assert_eq!(active.messages.len(), 1);
    assert_eq!(active.messages[0].sender, Sender::Assistant);
    assert!(ctx.staging.is_empty());
}

#[tokio::test]
async fn test_failed_send_still_clears_attachment() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut ctx = session(&dir);
    let mut view = ScreenLog::default();
    let client = ChatClient::new(mock_server.uri());
    ctx.staging.stage(confab::core::attachment::Attachment::InlineImage {
        data: "data:image/png;base64,AAAA".into(),
        origin: confab::core::attachment::ImageOrigin::Screenshot,
    });

    assert!(controller::send(&mut ctx, &mut view, &client, "still broken").await);

    let active = ctx.store.active().unwrap();
    assert_eq!(active.messages.len(), 1);
    assert_eq!(active.messages[0].sender, Sender::User);
    assert!(ctx.staging.is_empty());
    assert!(!view.composing);
    let last = view.toasts.last().unwrap();
    assert_eq!(last.level, ToastLevel::Error);
    assert_eq!(last.message, controller::SEND_FAILED);
}

#[tokio::test]
async fn test_delete_all_requires_confirmation() {
    let mock_server = MockServer::start().await;
    mount_reply(&mock_server, "ok").await;

    let dir = tempfile::tempdir().unwrap();
    let mut ctx = session(&dir);
    let mut view = ScreenLog::default();
    let client = ChatClient::new(mock_server.uri());

    controller::send(&mut ctx, &mut view, &client, "first").await;
    controller::create_conversation(&mut ctx, &mut view);
    controller::send(&mut ctx, &mut view, &client, "second").await;
    controller::create_conversation(&mut ctx, &mut view);
    assert_eq!(ctx.store.conversations().len(), 3);

    assert!(!controller::delete_all(&mut ctx, &mut view, false));
    assert_eq!(ctx.store.conversations().len(), 3);

    assert!(controller::delete_all(&mut ctx, &mut view, true));
    assert!(ctx.store.conversations().is_empty());
    assert!(ctx.store.active().is_none());
    assert_eq!(view.sidebar_len, 0);

    let store = FileStore::open(dir.path().join("data")).unwrap();
    assert!(load_conversations(&store).is_empty());
    let raw = fs::read_to_string(dir.path().join("data").join("conversations.json")).unwrap();
    assert_eq!(raw.trim(), "[]");
}

#[tokio::test]
async fn test_export_writes_transcript() {
    let mock_server = MockServer::start().await;
    mount_reply(&mock_server, "Try turning it off and on again").await;

    let dir = tempfile::tempdir().unwrap();
    let mut ctx = session(&dir);
    let mut view = ScreenLog::default();
    let client = ChatClient::new(mock_server.uri());

    controller::send(&mut ctx, &mut view, &client, "My laptop won't boot").await;
    let path = controller::export_active(&ctx, &mut view).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("Conversation: My laptop won't boot\n"));
    let lines: Vec<&str> = text
        .lines()
        .filter(|l| l.contains("] USER: ") || l.contains("] ASSISTANT: "))
        .collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("USER: My laptop won't boot"));
    assert!(lines[1].ends_with("ASSISTANT: Try turning it off and on again"));
    assert_eq!(view.toasts.last().unwrap().level, ToastLevel::Success);
}

#[tokio::test]
async fn test_export_without_conversation_warns() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = session(&dir);
    let mut view = ScreenLog::default();

    assert!(controller::export_active(&ctx, &mut view).is_none());
    assert_eq!(view.toasts.last().unwrap().level, ToastLevel::Warning);
}
