// Fake range-capable upstream shared by the HTTP tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use axum::extract::{Request, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use parking_lot::Mutex;
use tokio::net::TcpListener;

/// Deterministic content: byte `i` is `i % 256`.
pub fn generate_content(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

pub struct Upstream {
    pub body: Vec<u8>,
    /// Requests still to be answered with 503 before behaving normally.
    pub failures_left: AtomicUsize,
    /// Answer range requests with the full body and status 200.
    pub ignore_range: AtomicBool,
    pub required_token: Option<String>,
    pub head_requests: AtomicUsize,
    pub get_requests: AtomicUsize,
    /// `Range` header of the most recent request, as received.
    pub last_range: Mutex<Option<String>>,
}

impl Upstream {
    pub fn new(len: usize) -> Arc<Self> {
        Self::with_token(len, None)
    }

    pub fn with_token(len: usize, required_token: Option<String>) -> Arc<Self> {
        Arc::new(Self {
            body: generate_content(len),
            failures_left: AtomicUsize::new(0),
            ignore_range: AtomicBool::new(false),
            required_token,
            head_requests: AtomicUsize::new(0),
            get_requests: AtomicUsize::new(0),
            last_range: Mutex::new(None),
        })
    }

    pub fn fail_next(&self, n: usize) {
        self.failures_left.store(n, Ordering::SeqCst);
    }
}

async fn serve_file(State(upstream): State<Arc<Upstream>>, req: Request) -> Response {
    if req.method() == Method::HEAD {
        upstream.head_requests.fetch_add(1, Ordering::SeqCst);
    } else {
        upstream.get_requests.fetch_add(1, Ordering::SeqCst);
    }

    if let Some(token) = &upstream.required_token {
        let presented = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if presented != Some(token.as_str()) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let pending = upstream.failures_left.load(Ordering::SeqCst);
    if pending > 0 {
        upstream.failures_left.store(pending - 1, Ordering::SeqCst);
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    let body = &upstream.body;
    let total = body.len() as u64;

    let range_header = req
        .headers()
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    *upstream.last_range.lock() = range_header.clone();

    if let (Some(range_val), false) = (range_header, upstream.ignore_range.load(Ordering::SeqCst)) {
        // Parse "bytes=START-END"
        if let Some(rest) = range_val.strip_prefix("bytes=") {
            let mut parts = rest.splitn(2, '-');
            let start: u64 = parts.next().unwrap_or("0").parse().unwrap_or(0);
            let end_str = parts.next().unwrap_or("");
            let end: u64 = if end_str.is_empty() {
                total - 1
            } else {
                end_str.parse().unwrap_or(total - 1)
            };
            let end = end.min(total - 1);
            if start > end {
                return StatusCode::RANGE_NOT_SATISFIABLE.into_response();
            }

            let slice = &body[start as usize..=end as usize];
            let content_range = format!("bytes {}-{}/{}", start, end, total);
            return (
                StatusCode::PARTIAL_CONTENT,
                [
                    (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                    (header::CONTENT_RANGE, content_range),
                    (header::CONTENT_LENGTH, slice.len().to_string()),
                    (header::ACCEPT_RANGES, "bytes".to_string()),
                ],
                slice.to_vec(),
            )
                .into_response();
        }
        return (StatusCode::BAD_REQUEST, "bad range").into_response();
    }

    // No range: return full body.
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_LENGTH, total.to_string()),
            (header::ACCEPT_RANGES, "bytes".to_string()),
        ],
        body.clone(),
    )
        .into_response()
}

fn router(upstream: Arc<Upstream>) -> Router {
    Router::new()
        .route("/file", get(serve_file))
        .with_state(upstream)
}

/// Start the upstream on its own thread and runtime, for tests that block.
pub fn start_blocking(upstream: Arc<Upstream>) -> String {
    let (tx, rx) = std::sync::mpsc::channel::<SocketAddr>();
    thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, router(upstream)).await.ok();
        });
    });
    let addr = rx.recv().unwrap();
    format!("http://{}/file", addr)
}

/// Start the upstream on the current runtime.
pub async fn start(upstream: Arc<Upstream>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(upstream)).await.ok();
    });
    format!("http://{}/file", addr)
}
