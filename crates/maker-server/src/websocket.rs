//! WebSocket generation endpoint.
//!
//! The client opens `/api/generate`, sends one JSON [`GenerateRequest`] and
//! receives one text frame per progress event:
//!
//! ```text
//! {"type":"start",...} {"type":"file",...}* {"type":"error",...}* {"type":"complete",...}
//! ```
//!
//! A request rejected before generation starts (bad JSON, unknown template,
//! worker count out of range, a project name another live run is using)
//! gets a single `{"type":"error","error":"..."}` frame instead. Closing the socket mid-run does not cancel generation; the
//! remaining events are dropped and the files still land on disk.

use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{
    Sink,
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use maker_adapters::{LocalFilesystem, LogSink};
use maker_core::{
    application::{Agent, EventSink, SinkError},
    domain::ProgressEvent,
};

use crate::state::{AppState, GenerateRequest};

// ── Sink ──────────────────────────────────────────────────────────────────────

/// Sends each event as one JSON text frame.
///
/// Every send is flushed before the next one starts. Once the peer is gone
/// every call returns [`SinkError::Closed`].
pub struct WebSocketSink<S = SplitSink<WebSocket, Message>> {
    tx: Mutex<S>,
}

impl<S> WebSocketSink<S>
where
    S: Sink<Message> + Unpin + Send,
    S::Error: Display,
{
    pub fn new(tx: S) -> Self {
        Self { tx: Mutex::new(tx) }
    }

    async fn send_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), SinkError> {
        let json = serde_json::to_string(value).map_err(|e| SinkError::Delivery(e.to_string()))?;
        self.tx
            .lock()
            .await
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| {
                debug!(error = %e, "websocket send failed");
                SinkError::Closed
            })
    }

    /// Report a request that never reached generation.
    pub async fn send_error(&self, message: &str) -> Result<(), SinkError> {
        self.send_json(&serde_json::json!({ "type": "error", "error": message }))
            .await
    }

    pub async fn close(&self) -> Result<(), SinkError> {
        self.tx
            .lock()
            .await
            .close()
            .await
            .map_err(|_| SinkError::Closed)
    }
}

#[async_trait]
impl<S> EventSink for WebSocketSink<S>
where
    S: Sink<Message> + Unpin + Send,
    S::Error: Display,
{
    async fn emit(&self, event: &ProgressEvent) -> Result<(), SinkError> {
        self.send_json(event).await
    }

    async fn flush(&self) -> Result<(), SinkError> {
        self.tx
            .lock()
            .await
            .flush()
            .await
            .map_err(|_| SinkError::Closed)
    }
}

// ── Handler ───────────────────────────────────────────────────────────────────

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (sender, mut receiver) = socket.split();
    let sink = Arc::new(WebSocketSink::new(sender));
    info!("WebSocket client connected");

    let request = match read_request(&mut receiver).await {
        Some(Ok(request)) => request,
        Some(Err(message)) => {
            let _ = sink.send_error(&message).await;
            let _ = sink.close().await;
            return;
        }
        None => {
            debug!("client left before sending a request");
            return;
        }
    };

    // Keep reading so control frames are answered and a close is noticed.
    let reader = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                debug!("WebSocket client sent close frame");
                break;
            }
        }
    });

    process(&state, request, Arc::clone(&sink)).await;

    reader.abort();
    let _ = sink.close().await;
    info!("WebSocket client disconnected");
}

/// First data frame, parsed. `None` when the client closes first.
async fn read_request(
    receiver: &mut SplitStream<WebSocket>,
) -> Option<Result<GenerateRequest, String>> {
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => return Some(parse_request(text.as_bytes())),
            Ok(Message::Binary(bytes)) => return Some(parse_request(&bytes)),
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => continue,
        }
    }
    None
}

pub fn parse_request(bytes: &[u8]) -> Result<GenerateRequest, String> {
    serde_json::from_slice(bytes).map_err(|e| format!("invalid request: {e}"))
}

/// Run one request to completion, streaming its events into `sink`.
///
/// Failures that happen before the first event are reported as a single
/// error frame. Failures after that are already described by the event
/// stream and are only logged here.
#[instrument(skip_all, fields(template = ?request.template, project = ?request.project_name))]
pub async fn process<S>(state: &AppState, request: GenerateRequest, sink: Arc<WebSocketSink<S>>)
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display,
{
    let config = match state.agent_config(&request) {
        Ok(config) => config,
        Err(e) => {
            let _ = sink.send_error(&e.to_string()).await;
            return;
        }
    };

    let Some(_claim) = state.claim(&config.project_name) else {
        let message = format!("project '{}' is already being generated", config.project_name);
        let _ = sink.send_error(&message).await;
        return;
    };

    let agent = match Agent::new(
        config,
        state.client_for(&request),
        Arc::clone(&state.catalog),
        Arc::new(LocalFilesystem::new()),
        Arc::new(LogSink::wrapping(Arc::clone(&sink) as Arc<dyn EventSink>)),
    ) {
        Ok(agent) => agent,
        Err(e) => {
            let _ = sink.send_error(&e.to_string()).await;
            return;
        }
    };

    agent.start();
    let result = agent.generate_code(&request.prompt).await;
    let started = agent.run().is_some();
    let report = agent.stop().await;

    if report.failure.is_some() {
        info!(
            delivered = report.delivered,
            dropped = report.dropped,
            "client went away mid-run; generation finished anyway"
        );
    }

    match result {
        Ok(summary) => info!(
            run_id = %summary.run_id,
            files = summary.succeeded(),
            elapsed_ms = summary.elapsed_ms,
            "run completed"
        ),
        Err(e) if !started => {
            debug!(error = %e, "request rejected before generation");
            let _ = sink.send_error(&e.to_string()).await;
        }
        Err(e) => warn!(error = %e, "run finished with failures"),
    }
}
