//! Shared helpers: an in-process chat-completions endpoint with scripted
//! responses, and a canned model client.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use edgequake_compliance::{
    DocumentImages, ModelClient, ModelError, PageImage, ServiceConfig,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// One recorded request to the mock endpoint.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

/// Scripted endpoint state. Response `n` answers attempt `n`; the last entry
/// repeats once the script runs out.
pub struct MockEndpoint {
    script: Vec<(u16, String)>,
    hits: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockEndpoint {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// A successful chat-completions body.
pub fn completion(content: &str) -> (u16, String) {
    (
        200,
        json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
            .to_string(),
    )
}

/// A non-200 response.
pub fn failure(status: u16) -> (u16, String) {
    (status, json!({ "error": { "message": "upstream busy" } }).to_string())
}

async fn completions(
    State(endpoint): State<Arc<MockEndpoint>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    let n = endpoint.hits.fetch_add(1, Ordering::SeqCst);
    endpoint.requests.lock().unwrap().push(RecordedRequest {
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body,
    });

    let (status, text) = endpoint
        .script
        .get(n)
        .or_else(|| endpoint.script.last())
        .cloned()
        .expect("script must not be empty");
    (StatusCode::from_u16(status).unwrap(), text)
}

/// Route library logs to the test harness; `RUST_LOG=debug` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Start the mock and return its chat-completions URL.
pub async fn spawn_mock(script: Vec<(u16, String)>) -> (String, Arc<MockEndpoint>) {
    init_tracing();
    let endpoint = Arc::new(MockEndpoint {
        script,
        hits: AtomicUsize::new(0),
        requests: Mutex::new(Vec::new()),
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(Arc::clone(&endpoint));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/v1/chat/completions"), endpoint)
}

/// Serve `app` on an ephemeral port and return its base URL.
pub async fn spawn_app(app: Router) -> String {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Config pointed at `url` with a short backoff so tests stay fast.
pub fn config_for(url: &str, backoff_ms: u64) -> ServiceConfig {
    ServiceConfig::builder()
        .api_key("sk-test")
        .base_url(url)
        .model("qwen-vl-max")
        .retry_backoff_ms(backoff_ms)
        .api_timeout_secs(5)
        .build()
        .unwrap()
}

/// Two tiny fake pages.
pub fn two_pages() -> DocumentImages {
    DocumentImages::from_pages(
        "data/model_doc.pdf",
        vec![PageImage::new(1, "UEFHRTE="), PageImage::new(2, "UEFHRTI=")],
    )
}

/// Model client that answers every prompt with the same text.
pub struct FixedModel(pub &'static str);

impl ModelClient for FixedModel {
    async fn complete(&self, _prompt: &str, _images: &[PageImage]) -> Result<String, ModelError> {
        Ok(self.0.to_string())
    }
}
