//! Shared test harness: an in-memory router over temp-dir backed stores.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tokendrop_core::config::AppConfig;
use tokendrop_metadata::TokenStore;
use tokendrop_server::{create_router, AppState};
use tokendrop_storage::BlobStore;
use tower::ServiceExt;

pub struct TestServer {
    pub router: Router,
    pub state: AppState,
    _temp: TempDir,
}

impl TestServer {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(modify: impl FnOnce(&mut AppConfig)) -> Self {
        let temp = TempDir::new().expect("tempdir");
        let storage_path = temp.path().join("storage");
        let metadata_path = temp.path().join("tokens.redb");

        let mut config = AppConfig::for_testing();
        config.storage.path = storage_path.clone();
        config.metadata.path = metadata_path.clone();
        modify(&mut config);

        let tokens = Arc::new(TokenStore::open(&metadata_path).expect("token store"));
        let blobs = Arc::new(BlobStore::new(&storage_path).await.expect("blob store"));
        let state = AppState::new(config, tokens, blobs);
        let router = create_router(state.clone());

        Self {
            router,
            state,
            _temp: temp,
        }
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.state.config.storage.path.clone()
    }

    /// A bare name=value pair matching the configured credentials.
    pub fn session_cookie(&self) -> String {
        let auth = &self.state.config.auth;
        format!("{}={}", auth.user, auth.pass)
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> (StatusCode, Vec<u8>) {
        let mut request = Request::builder().uri(uri).method("GET");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = request.body(Body::empty()).expect("request");
        self.send(request).await
    }

    pub async fn post(&self, uri: &str, content_type: &str, body: Vec<u8>) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .uri(uri)
            .method("POST")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .expect("request");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible");
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes()
            .to_vec();
        (status, body)
    }
}

pub const BOUNDARY: &str = "------------------------testboundary";

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// Standard upload body: `id` field first, then the `file` part.
pub fn upload_body(id: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    push_id_field(&mut body, id);
    push_file_part(&mut body, filename, content);
    push_close(&mut body);
    body
}

/// Malformed ordering: the file part arrives before the id field.
pub fn file_first_body(id: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    push_file_part(&mut body, filename, content);
    push_id_field(&mut body, id);
    push_close(&mut body);
    body
}

fn push_id_field(body: &mut Vec<u8>, id: &str) {
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"id\"\r\n\r\n{id}\r\n"
        )
        .as_bytes(),
    );
}

fn push_file_part(body: &mut Vec<u8>, filename: &str, content: &[u8]) {
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(b"\r\n");
}

fn push_close(body: &mut Vec<u8>) {
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
}

/// Deterministic payload that does not repeat at chunk boundaries.
pub fn patterned_payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
