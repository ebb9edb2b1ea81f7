#![allow(dead_code)]

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Request, StatusCode},
};
use http_body_util::BodyExt;
use s3_upload_gateway::config::GatewayConfig;
use s3_upload_gateway::services::backend::{StoreConnector, StoreHandle};
use s3_upload_gateway::services::storage::{ObjectStore, object_key};
use s3_upload_gateway::{AppState, create_app};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "---------------------------123456789012345678901234567";

#[derive(Debug, Clone)]
pub struct UploadCall {
    pub local_path: PathBuf,
    pub file_name: String,
    pub directory: String,
    pub overwrite: bool,
    /// Bytes read from `local_path` while the call was in flight
    pub content: Vec<u8>,
}

/// In-memory store that records every call it receives.
pub struct RecordingStore {
    pub uploads: Mutex<Vec<UploadCall>>,
    pub deletes: Mutex<Vec<String>>,
    pub objects: Mutex<HashSet<String>>,
    reference: String,
    upload_error: Option<String>,
    delay: Option<Duration>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            objects: Mutex::new(HashSet::new()),
            reference: "obj-123".to_string(),
            upload_error: None,
            delay: None,
        }
    }

    pub fn failing_uploads(mut self, message: &str) -> Self {
        self.upload_error = Some(message.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_object(self, key: &str) -> Self {
        self.objects.lock().unwrap().insert(key.to_string());
        self
    }

    pub fn upload_calls(&self) -> Vec<UploadCall> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn delete_calls(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn upload_file(
        &self,
        local_path: &Path,
        file_name: &str,
        directory: &str,
        overwrite: bool,
    ) -> Result<String> {
        let content = tokio::fs::read(local_path).await?;
        self.uploads.lock().unwrap().push(UploadCall {
            local_path: local_path.to_path_buf(),
            file_name: file_name.to_string(),
            directory: directory.to_string(),
            overwrite,
            content,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.upload_error {
            bail!("{}", message);
        }

        self.objects
            .lock()
            .unwrap()
            .insert(object_key(directory, file_name));
        Ok(self.reference.clone())
    }

    async fn delete_file(&self, object_name: &str) -> Result<()> {
        self.deletes.lock().unwrap().push(object_name.to_string());
        if !self.objects.lock().unwrap().remove(object_name) {
            bail!("object '{}' does not exist", object_name);
        }
        Ok(())
    }
}

/// Hands out the recording store, or fails when none is configured.
pub struct TestConnector {
    store: Option<Arc<RecordingStore>>,
    pub attempts: AtomicUsize,
}

#[async_trait]
impl StoreConnector for TestConnector {
    async fn connect(&self) -> Result<Arc<dyn ObjectStore>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match &self.store {
            Some(store) => Ok(store.clone()),
            None => Err(anyhow!("S3_BUCKET is not set")),
        }
    }
}

pub struct TestApp {
    pub app: Router,
    pub store: Arc<RecordingStore>,
    pub connector: Arc<TestConnector>,
    pub handle: Arc<StoreHandle>,
    pub staging: TempDir,
    pub web: TempDir,
}

impl TestApp {
    pub fn new(store: RecordingStore) -> Self {
        Self::build(Some(store), |_| {})
    }

    /// App whose object store client can never be constructed.
    pub fn without_backend() -> Self {
        Self::build(None, |_| {})
    }

    pub fn build(store: Option<RecordingStore>, tweak: impl FnOnce(&mut GatewayConfig)) -> Self {
        let staging = tempfile::tempdir().unwrap();
        let web = tempfile::tempdir().unwrap();
        std::fs::write(web.path().join("index.html"), "<h1>Upload to S3</h1>").unwrap();
        std::fs::create_dir(web.path().join("assets")).unwrap();
        std::fs::write(web.path().join("assets/app.js"), "console.log('ok');").unwrap();

        let mut config = GatewayConfig {
            staging_dir: staging.path().to_path_buf(),
            web_root: web.path().to_path_buf(),
            ..GatewayConfig::default()
        };
        tweak(&mut config);

        let has_store = store.is_some();
        let store = Arc::new(store.unwrap_or_else(RecordingStore::new));
        let connector = Arc::new(TestConnector {
            store: has_store.then(|| store.clone()),
            attempts: AtomicUsize::new(0),
        });
        let handle = Arc::new(StoreHandle::new(connector.clone()));
        let app = create_app(AppState::new(config, handle.clone()));

        Self {
            app,
            store,
            connector,
            handle,
            staging,
            web,
        }
    }

    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(self.staging.path()).unwrap().count()
    }

    pub fn connect_attempts(&self) -> usize {
        self.connector.attempts.load(Ordering::SeqCst)
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Bytes) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body)
    }

    /// Posts a multipart form and returns the raw JSON text.
    pub async fn post_form(&self, uri: &str, body: String) -> String {
        let (status, headers, body) = self.send(multipart_request("POST", uri, body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["content-type"], "application/json");
        String::from_utf8(body.to_vec()).unwrap()
    }

    pub async fn post_form_json(&self, uri: &str, body: String) -> Value {
        serde_json::from_str(&self.post_form(uri, body).await).unwrap()
    }
}

pub fn multipart_request(method: &str, uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Same as [`multipart_request`], but the body arrives in `chunk_size`
/// pieces with no declared length, like a client streaming the upload.
pub fn streamed_multipart_request(uri: &str, body: String, chunk_size: usize) -> Request<Body> {
    let chunks: Vec<Bytes> = body
        .into_bytes()
        .chunks(chunk_size)
        .map(Bytes::copy_from_slice)
        .collect();
    let stream = futures::stream::iter(chunks.into_iter().map(Ok::<_, std::io::Error>));

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from_stream(stream))
        .unwrap()
}

pub fn file_part(name: &str, filename: &str, content: &str) -> String {
    format!(
        "--{boundary}\r\n\
        Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
        Content-Type: text/plain\r\n\r\n\
        {content}\r\n",
        boundary = BOUNDARY,
    )
}

pub fn text_part(name: &str, value: &str) -> String {
    format!(
        "--{boundary}\r\n\
        Content-Disposition: form-data; name=\"{name}\"\r\n\r\n\
        {value}\r\n",
        boundary = BOUNDARY,
    )
}

pub fn form(parts: &[String]) -> String {
    format!("{}--{}--\r\n", parts.concat(), BOUNDARY)
}
