use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::fs;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use werender_upload::models::{CreateFileRequest, FileIdRequest};
use werender_upload::{config, key_manager, signer, transport, upload, UploadError};

const PUBLIC_KEY: &str = "pub-test";
const PRIVATE_KEY: &str = "secret-test";

#[derive(Default)]
struct MockStorage {
    base_url: String,
    chunk_size: u64,
    get_finalized_at: i64,
    fail_chunk: Option<usize>,
    delay_get: Option<Duration>,
    created: Vec<CreateFileRequest>,
    control_calls: Vec<&'static str>,
    chunks: Vec<(usize, Vec<u8>, Option<String>)>,
}

type Shared = Arc<Mutex<MockStorage>>;

/// Check `Authorization: WR <public>:<sig>` against the Date and Host headers
fn verify_signature(headers: &HeaderMap) -> Result<(), StatusCode> {
    let get = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(StatusCode::UNAUTHORIZED)
    };
    let authorization = get(header::AUTHORIZATION)?;
    let date = get(header::DATE)?;
    let host = get(header::HOST)?;

    let expected = signer::signature("POST", &host, &date, PRIVATE_KEY)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if authorization != format!("WR {}:{}", PUBLIC_KEY, expected) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(())
}

async fn create_file(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(req): Json<CreateFileRequest>,
) -> Result<Json<Value>, StatusCode> {
    verify_signature(&headers)?;
    let mut state = state.lock().unwrap();
    state.control_calls.push("create");

    let mut chunks = Vec::new();
    let mut remaining = req.size;
    let mut index = 0;
    while remaining > 0 {
        let size = remaining.min(state.chunk_size);
        chunks.push(json!({ "size": size, "url": format!("{}/chunks/{}", state.base_url, index) }));
        remaining -= size;
        index += 1;
    }
    state.created.push(req);

    Ok(Json(json!({ "id": "f1", "chunks": chunks })))
}

async fn get_file(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(req): Json<FileIdRequest>,
) -> Result<Json<Value>, StatusCode> {
    verify_signature(&headers)?;
    let delay = {
        let mut state = state.lock().unwrap();
        state.control_calls.push("get");
        state.delay_get
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let finalized_at = state.lock().unwrap().get_finalized_at;
    Ok(Json(json!({ "id": req.id, "finalizedAt": finalized_at })))
}

async fn finalize_file(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(req): Json<FileIdRequest>,
) -> Result<Json<Value>, StatusCode> {
    verify_signature(&headers)?;
    state.lock().unwrap().control_calls.push("finalize");
    Ok(Json(json!({ "id": req.id, "path": "/scenes/model.fbx", "finalizedAt": 1_700_000_000 })))
}

async fn put_chunk(
    State(state): State<Shared>,
    Path(index): Path<usize>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> StatusCode {
    let mut state = state.lock().unwrap();
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.chunks.push((index, body.to_vec(), content_type));

    if state.fail_chunk == Some(index) {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

/// Start the mock storage service, returning its base address
async fn spawn_server(state: Shared) -> Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);
    state.lock().unwrap().base_url = base_url.clone();

    let app = Router::new()
        .route("/v1/storage/file/create", post(create_file))
        .route("/v1/storage/file/get", post(get_file))
        .route("/v1/storage/file/finalize", post(finalize_file))
        .route("/chunks/:index", put(put_chunk))
        .with_state(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok(base_url)
}

fn mock_state(chunk_size: u64) -> Shared {
    Arc::new(Mutex::new(MockStorage {
        chunk_size,
        ..Default::default()
    }))
}

fn make_transport(base_url: &str, private_key: &str) -> Result<transport::HttpTransport> {
    let cfg = config::Config::new(base_url, "unused.key");
    let creds = key_manager::Credentials::new(PUBLIC_KEY, private_key);
    Ok(transport::HttpTransport::new(&cfg, creds)?)
}

fn write_model(dir: &TempDir, contents: &[u8]) -> Result<std::path::PathBuf> {
    let path = dir.path().join("model.fbx");
    fs::write(&path, contents)?;
    Ok(path)
}

#[tokio::test]
async fn upload_over_http_end_to_end() -> Result<()> {
    let state = mock_state(5);
    let base_url = spawn_server(state.clone()).await?;
    let tmp = TempDir::new()?;
    let path = write_model(&tmp, b"0123456789")?;

    let transport = make_transport(&base_url, PRIVATE_KEY)?;
    let file = upload::FileUploader::new(&transport)
        .upload(&path, "/scenes")
        .await?;

    assert_eq!(file.id, "f1");
    assert_eq!(file.finalized_at, 1_700_000_000);

    let state = state.lock().unwrap();
    assert_eq!(state.control_calls, vec!["create", "get", "finalize"]);
    assert_eq!(state.created[0].path, "/scenes/model.fbx");
    assert_eq!(state.created[0].content_type, "model/fbx");
    assert_eq!(
        state.created[0].checksum,
        "sha1:87acec17cd9dcd20a716cc2cf67417b71c8a7016"
    );

    let bodies: Vec<(usize, &[u8])> = state
        .chunks
        .iter()
        .map(|(i, body, _)| (*i, body.as_slice()))
        .collect();
    assert_eq!(bodies, vec![(0, &b"01234"[..]), (1, &b"56789"[..])]);
    assert!(state
        .chunks
        .iter()
        .all(|(_, _, ct)| ct.as_deref() == Some("application/octet-stream")));
    Ok(())
}

#[tokio::test]
async fn already_finalized_file_is_not_reuploaded() -> Result<()> {
    let state = mock_state(5);
    state.lock().unwrap().get_finalized_at = 1_690_000_000;
    let base_url = spawn_server(state.clone()).await?;
    let tmp = TempDir::new()?;
    let path = write_model(&tmp, b"0123456789")?;

    let transport = make_transport(&base_url, PRIVATE_KEY)?;
    let file = upload::FileUploader::new(&transport)
        .upload(&path, "/scenes")
        .await?;

    assert_eq!(file.finalized_at, 1_690_000_000);
    let state = state.lock().unwrap();
    assert!(state.chunks.is_empty());
    assert_eq!(state.control_calls, vec!["create", "get"]);
    Ok(())
}

#[tokio::test]
async fn failed_chunk_stops_upload() -> Result<()> {
    let state = mock_state(4);
    state.lock().unwrap().fail_chunk = Some(1);
    let base_url = spawn_server(state.clone()).await?;
    let tmp = TempDir::new()?;
    let path = write_model(&tmp, b"0123456789ab")?;

    let transport = make_transport(&base_url, PRIVATE_KEY)?;
    let err = upload::FileUploader::new(&transport)
        .upload(&path, "/scenes")
        .await
        .unwrap_err();

    match &err {
        UploadError::ChunkUpload { index, reason } => {
            assert_eq!(*index, 1);
            assert!(reason.contains("503"), "reason was {reason}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_retryable());

    let state = state.lock().unwrap();
    let attempted: Vec<usize> = state.chunks.iter().map(|(i, _, _)| *i).collect();
    assert_eq!(attempted, vec![0, 1]);
    assert!(!state.control_calls.contains(&"finalize"));
    Ok(())
}

#[tokio::test]
async fn wrong_private_key_is_rejected() -> Result<()> {
    let state = mock_state(5);
    let base_url = spawn_server(state.clone()).await?;
    let tmp = TempDir::new()?;
    let path = write_model(&tmp, b"0123456789")?;

    let transport = make_transport(&base_url, "not-the-secret")?;
    let err = upload::FileUploader::new(&transport)
        .upload(&path, "/scenes")
        .await
        .unwrap_err();

    match err {
        UploadError::CreateRequest(msg) => assert!(msg.contains("401"), "message was {msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(state.lock().unwrap().control_calls.is_empty());
    Ok(())
}

#[tokio::test]
async fn slow_control_call_times_out() -> Result<()> {
    let state = mock_state(5);
    state.lock().unwrap().delay_get = Some(Duration::from_secs(3));
    let base_url = spawn_server(state.clone()).await?;
    let tmp = TempDir::new()?;
    let path = write_model(&tmp, b"0123456789")?;

    let mut cfg = config::Config::new(&base_url, "unused.key");
    cfg.timeout_secs = 1;
    let transport = transport::HttpTransport::new(
        &cfg,
        key_manager::Credentials::new(PUBLIC_KEY, PRIVATE_KEY),
    )?;

    let err = upload::FileUploader::new(&transport)
        .upload(&path, "/scenes")
        .await
        .unwrap_err();

    match err {
        UploadError::GetRequest(msg) => assert!(msg.contains("timed out"), "message was {msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn credentials_load_from_key_file() -> Result<()> {
    let tmp = TempDir::new()?;
    let key_path = tmp.path().join("werender.key");
    fs::write(&key_path, "pub-abc,priv-def\n")?;

    let creds = key_manager::Credentials::load(&key_path).await?;
    assert_eq!(creds.public_key(), "pub-abc");

    let missing = key_manager::Credentials::load(tmp.path().join("absent.key")).await;
    assert!(matches!(missing, Err(UploadError::Config(_))));
    Ok(())
}

#[test]
fn config_loads_nested_server_address() -> Result<()> {
    let tmp = TempDir::new()?;
    let config_path = tmp.path().join("werender.config");
    let contents = json!({
        "internal": { "server": { "server_address": "https://staging.werender.io/" } },
        "timeout_secs": 15
    });
    fs::write(&config_path, contents.to_string())?;

    let cfg = config::Config::load(&config_path.to_string_lossy())?;
    assert_eq!(cfg.server_address, "https://staging.werender.io/v1");
    assert_eq!(cfg.timeout_secs, 15);
    Ok(())
}

#[test]
fn config_rejects_malformed_json() -> Result<()> {
    let tmp = TempDir::new()?;
    let config_path = tmp.path().join("werender.config");
    fs::write(&config_path, "{ not json")?;

    assert!(config::Config::load(&config_path.to_string_lossy()).is_err());
    Ok(())
}
