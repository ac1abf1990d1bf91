//! End-to-end tests against a real server on an ephemeral port.

use std::sync::Arc;

use tempfile::TempDir;
use tokendrop_client::TransferClient;
use tokendrop_core::config::AppConfig;
use tokendrop_metadata::TokenStore;
use tokendrop_server::{create_router, AppState};
use tokendrop_storage::BlobStore;

struct TestDeployment {
    base_url: String,
    state: AppState,
    _temp: TempDir,
}

async fn spawn_server() -> TestDeployment {
    let temp = TempDir::new().expect("tempdir");
    let storage_path = temp.path().join("storage");
    let metadata_path = temp.path().join("tokens.redb");

    let mut config = AppConfig::for_testing();
    config.storage.path = storage_path.clone();
    config.metadata.path = metadata_path.clone();

    let tokens = Arc::new(TokenStore::open(&metadata_path).expect("token store"));
    let blobs = Arc::new(BlobStore::new(&storage_path).await.expect("blob store"));
    let state = AppState::new(config, tokens, blobs);
    let app = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    TestDeployment {
        base_url: format!("http://{addr}"),
        state,
        _temp: temp,
    }
}

async fn logged_in_client(deployment: &TestDeployment) -> TransferClient {
    let client = TransferClient::new(&deployment.base_url).expect("client");
    let auth = &deployment.state.config.auth;
    client.login(&auth.user, &auth.pass).await.expect("login");
    client
}

fn patterned_payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn login_with_bad_credentials_fails() {
    let deployment = spawn_server().await;
    let client = TransferClient::new(&deployment.base_url).unwrap();
    assert!(client.login("user", "wrong").await.is_err());
}

#[tokio::test]
async fn create_and_list_tokens() {
    let deployment = spawn_server().await;
    let client = logged_in_client(&deployment).await;

    let first = client.create().await.unwrap();
    let second = client.create().await.unwrap();
    assert_ne!(first.id, second.id);
    assert!(!first.bound());

    let tokens = client.list().await.unwrap();
    assert_eq!(tokens.len(), 2);
    let ids: Vec<_> = tokens.iter().map(|t| t.id.clone()).collect();
    assert!(ids.contains(&first.id));
    assert!(ids.contains(&second.id));
}

#[tokio::test]
async fn create_without_login_fails() {
    let deployment = spawn_server().await;
    let client = TransferClient::new(&deployment.base_url).unwrap();
    assert!(client.create().await.is_err());
}

#[tokio::test]
async fn single_distinguishes_known_and_unknown() {
    let deployment = spawn_server().await;
    let client = logged_in_client(&deployment).await;

    let token = client.create().await.unwrap();
    let found = client.single(&token.id.to_hex()).await.unwrap();
    assert_eq!(found.expect("known token").id, token.id);

    let missing = client
        .single("ffffffffffffffffffffffffffffffff")
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn upload_download_round_trip_with_progress() {
    let deployment = spawn_server().await;
    let client = logged_in_client(&deployment).await;
    let token = client.create().await.unwrap();
    let id_hex = token.id.to_hex();

    let payload = patterned_payload(10 * 1024 * 1024);
    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::unbounded_channel();

    client
        .upload(&id_hex, "archive.bin", payload.clone(), Some(progress_tx))
        .await
        .unwrap();

    // Every chunk is positive and the reported sizes account for the whole
    // payload. The sender was dropped by the upload, so the channel drains.
    let mut reported = 0usize;
    while let Some(size) = progress_rx.recv().await {
        assert!(size > 0);
        reported += size;
    }
    assert_eq!(reported, payload.len());

    let (name, content) = client.download(&id_hex).await.unwrap();
    assert_eq!(name, "archive.bin");
    assert_eq!(content, payload);

    // The record now carries the bound filename.
    let bound = client.single(&id_hex).await.unwrap().expect("known token");
    assert_eq!(bound.name, "archive.bin");
}

#[tokio::test]
async fn upload_without_progress_sink() {
    let deployment = spawn_server().await;
    let client = logged_in_client(&deployment).await;
    let token = client.create().await.unwrap();

    client
        .upload(&token.id.to_hex(), "plain.txt", b"hello".to_vec(), None)
        .await
        .unwrap();
    let (name, content) = client.download(&token.id.to_hex()).await.unwrap();
    assert_eq!(name, "plain.txt");
    assert_eq!(content, b"hello");
}

#[tokio::test]
async fn upload_survives_slow_progress_consumer() {
    let deployment = spawn_server().await;
    let client = logged_in_client(&deployment).await;
    let token = client.create().await.unwrap();
    let payload = patterned_payload(2 * 1024 * 1024);

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::unbounded_channel();
    let consumer = tokio::spawn(async move {
        let mut total = 0usize;
        while let Some(size) = progress_rx.recv().await {
            // Deliberately slower than the upload produces events.
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            total += size;
        }
        total
    });

    client
        .upload(&token.id.to_hex(), "slow.bin", payload.clone(), Some(progress_tx))
        .await
        .unwrap();
    assert_eq!(consumer.await.unwrap(), payload.len());
}

#[tokio::test]
async fn upload_to_unknown_token_fails() {
    let deployment = spawn_server().await;
    let client = logged_in_client(&deployment).await;

    let err = client
        .upload(
            "00000000000000000000000000000000",
            "f.txt",
            b"data".to_vec(),
            None,
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("rejected"));
}

#[tokio::test]
async fn download_of_unbound_token_fails() {
    let deployment = spawn_server().await;
    let client = logged_in_client(&deployment).await;
    let token = client.create().await.unwrap();
    assert!(client.download(&token.id.to_hex()).await.is_err());
}
