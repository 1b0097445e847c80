#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-image-data";

/// A stand-in for the generation endpoint that replays scripted replies.
#[derive(Default)]
pub struct FakeEndpoint {
    script: Mutex<VecDeque<(StatusCode, String)>>,
    last: Mutex<Option<(StatusCode, String)>>,
    delay: Mutex<Option<Duration>>,
    hits: AtomicUsize,
    bodies: Mutex<Vec<Value>>,
    content_types: Mutex<Vec<String>>,
}

impl FakeEndpoint {
    pub fn replying(replies: Vec<(StatusCode, &str)>) -> Arc<Self> {
        let endpoint = Self::default();
        *endpoint.script.lock().unwrap() = replies
            .into_iter()
            .map(|(status, body)| (status, body.to_string()))
            .collect();
        Arc::new(endpoint)
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }

    pub fn content_types(&self) -> Vec<String> {
        self.content_types.lock().unwrap().clone()
    }

    fn next_reply(&self) -> (StatusCode, String) {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(reply) => {
                *self.last.lock().unwrap() = Some(reply.clone());
                reply
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or((StatusCode::OK, r#"{"success":true}"#.to_string())),
        }
    }
}

async fn generate(
    State(endpoint): State<Arc<FakeEndpoint>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    endpoint.hits.fetch_add(1, Ordering::SeqCst);
    endpoint.bodies.lock().unwrap().push(body);
    if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
        endpoint
            .content_types
            .lock()
            .unwrap()
            .push(content_type.to_str().unwrap_or("").to_string());
    }

    let delay = *endpoint.delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let (status, body) = endpoint.next_reply();
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

async fn image() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/png")],
        PNG_BYTES.to_vec(),
    )
        .into_response()
}

pub async fn start_server(endpoint: Arc<FakeEndpoint>) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let app = Router::new()
        .route("/generate", post(generate))
        .route("/generated_image.png", get(image))
        .with_state(endpoint);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, handle)
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
