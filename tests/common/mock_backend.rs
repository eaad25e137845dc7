//! Mock backend server for the one-shot, websocket and agent APIs.

#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream;
use futures_util::StreamExt;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// A captured request for assertions.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is not JSON")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A mock response to return.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Body pieces, each written as its own chunk.
    pub chunks: Vec<Vec<u8>>,
    pub delay_ms: u64,
    /// Keep the body open after the last chunk instead of ending it.
    pub hold_open: bool,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self::json(r#"{"ok": true}"#)
    }
}

impl MockResponse {
    pub fn json(body: &str) -> Self {
        Self {
            status: 200,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            chunks: vec![body.as_bytes().to_vec()],
            delay_ms: 0,
            hold_open: false,
        }
    }

    pub fn error(status: u16, message: &str) -> Self {
        let mut resp = Self::json(&format!(r#"{{"detail": "{}"}}"#, message));
        resp.status = status;
        resp
    }

    /// A run result as served by `/api/run`.
    pub fn run_result(stdout: &str, stderr: &str, exit_code: i32, timed_out: bool) -> Self {
        let body = serde_json::json!({
            "ok": exit_code == 0,
            "stdout": stdout,
            "stderr": stderr,
            "exit_code": exit_code,
            "timed_out": timed_out,
        });
        Self::json(&body.to_string())
    }

    /// An event stream made of `(event, data)` frames.
    pub fn sse(frames: &[(&str, &str)]) -> Self {
        let body: String = frames.iter().map(|(e, d)| sse_frame(e, d)).collect();
        Self::sse_raw(&body)
    }

    /// An event stream with a verbatim body.
    pub fn sse_raw(body: &str) -> Self {
        Self {
            status: 200,
            headers: vec![("content-type".to_string(), "text/event-stream".to_string())],
            chunks: vec![body.as_bytes().to_vec()],
            delay_ms: 0,
            hold_open: false,
        }
    }

    /// Split the body into chunks at the given byte offsets.
    pub fn split_at(mut self, offsets: &[usize]) -> Self {
        let body: Vec<u8> = self.chunks.concat();
        let mut chunks = Vec::new();
        let mut start = 0;
        for &offset in offsets {
            chunks.push(body[start..offset].to_vec());
            start = offset;
        }
        chunks.push(body[start..].to_vec());
        self.chunks = chunks;
        self
    }

    pub fn held_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }
}

/// Format one event-stream frame.
pub fn sse_frame(event: &str, data: &str) -> String {
    format!("event: {}\ndata: {}\n\n", event, data)
}

/// What the `/ws` endpoint does once a client connects.
#[derive(Debug, Clone, Default)]
pub struct WsScript {
    /// Binary frames sent right after the upgrade.
    pub greeting: Vec<Vec<u8>>,
    /// Answer each received command with `out: <command>` split over two frames.
    pub echo: bool,
    /// Close the socket after the greeting.
    pub close_after_greeting: bool,
}

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    ws_script: Arc<Mutex<WsScript>>,
    ws_received: Arc<Mutex<Vec<String>>>,
}

/// Mock backend server for testing.
pub struct MockBackend {
    pub addr: SocketAddr,
    state: MockState,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl MockBackend {
    /// Start a new mock backend server.
    pub async fn start() -> Self {
        let state = MockState {
            requests: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(Mutex::new(VecDeque::new())),
            ws_script: Arc::new(Mutex::new(WsScript::default())),
            ws_received: Arc::new(Mutex::new(Vec::new())),
        };

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

        let app = Router::new()
            .route("/ws", get(handle_ws))
            .fallback(handle_request)
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
                .ok();
        });

        // Wait for server to be ready
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr,
            state,
            shutdown: shutdown_tx,
        }
    }

    /// Enqueue a response to be returned for the next HTTP request.
    pub async fn enqueue_response(&self, resp: MockResponse) {
        self.state.responses.lock().await.push_back(resp);
    }

    /// Script the behaviour of the next websocket connection.
    pub async fn set_ws_script(&self, script: WsScript) {
        *self.state.ws_script.lock().await = script;
    }

    /// Get all captured HTTP requests.
    pub async fn captured_requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().await.clone()
    }

    /// Text frames received over the websocket.
    pub async fn ws_received(&self) -> Vec<String> {
        self.state.ws_received.lock().await.clone()
    }

    /// Get the base URL for this mock server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Websocket address of the interactive shell.
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn handle_request(State(state): State<MockState>, req: Request<Body>) -> Response<Body> {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
        .collect();

    let body_bytes = axum::body::to_bytes(req.into_body(), 1024 * 1024)
        .await
        .unwrap_or_default()
        .to_vec();

    state.requests.lock().await.push(CapturedRequest {
        method,
        path,
        query,
        headers,
        body: body_bytes,
    });

    let mock_resp = state
        .responses
        .lock()
        .await
        .pop_front()
        .unwrap_or_default();

    if mock_resp.delay_ms > 0 {
        tokio::time::sleep(tokio::time::Duration::from_millis(mock_resp.delay_ms)).await;
    }

    let mut builder = Response::builder().status(StatusCode::from_u16(mock_resp.status).unwrap());
    for (name, value) in mock_resp.headers {
        builder = builder.header(name, value);
    }

    let chunks = stream::iter(
        mock_resp
            .chunks
            .into_iter()
            .map(|c| Ok::<_, std::io::Error>(Bytes::from(c))),
    );
    let body = if mock_resp.hold_open {
        Body::from_stream(chunks.chain(stream::pending()))
    } else {
        Body::from_stream(chunks)
    };
    builder.body(body).unwrap()
}

async fn handle_ws(State(state): State<MockState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_ws(state, socket))
}

async fn run_ws(state: MockState, mut socket: WebSocket) {
    let script = state.ws_script.lock().await.clone();

    for chunk in script.greeting {
        if socket.send(Message::Binary(chunk.into())).await.is_err() {
            return;
        }
    }

    if script.close_after_greeting {
        let _ = socket.send(Message::Close(None)).await;
        return;
    }

    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else {
            continue;
        };
        let text = text.as_str().to_string();
        state.ws_received.lock().await.push(text.clone());

        if script.echo {
            let reply = format!("out: {}", text);
            let (head, tail) = reply.split_at(reply.len() / 2);
            let _ = socket.send(Message::Text(head.to_string().into())).await;
            let _ = socket.send(Message::Text(tail.to_string().into())).await;
        }
    }
}
