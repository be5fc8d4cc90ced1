//! SSE transport implementation.
//!
//! Clients subscribe with `GET /sse` and receive an `endpoint` event naming
//! the URL to POST requests to. Each request is queued on its session and
//! answered by a per-session worker as a `message` event on the same stream,
//! so responses within one subscription keep request order while separate
//! subscriptions run independently.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{RwLock, mpsc};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::connection::Connection;
use super::protocol::{JsonRpcRequest, parse_request, process_request};
use super::{TransportError, TransportResult, config::SseConfig};
use crate::core::McpServer;

/// Requests a session may queue before posts start waiting.
const REQUEST_QUEUE: usize = 32;

/// Events buffered for a slow subscriber.
const EVENT_QUEUE: usize = 64;

/// SSE transport handler.
pub struct SseTransport {
    config: SseConfig,
}

/// An SSE transport whose listener is bound but not yet serving.
pub struct SseListener {
    config: SseConfig,
    listener: TcpListener,
    local_addr: SocketAddr,
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    server: McpServer,
    sessions: Arc<RwLock<HashMap<Uuid, mpsc::Sender<JsonRpcRequest>>>>,
    tracker: TaskTracker,
    shutdown: CancellationToken,
    sse_path: String,
    message_path: String,
}

impl AppState {
    pub fn new(
        server: McpServer,
        config: &SseConfig,
        tracker: TaskTracker,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            server,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            tracker,
            shutdown,
            sse_path: config.sse_path.clone(),
            message_path: config.message_path.clone(),
        }
    }

    /// Number of open subscriptions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl SseTransport {
    /// Create a new SSE transport with the given config.
    pub fn new(config: SseConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Bind the listener. A failure here is fatal at startup.
    pub async fn bind(self) -> TransportResult<SseListener> {
        let addr = self.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| TransportError::bind(&addr, e))?;

        Ok(SseListener {
            config: self.config,
            listener,
            local_addr,
        })
    }
}

impl SseListener {
    /// Address the listener actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve subscriptions until `shutdown` fires, then drain every session.
    pub async fn serve(
        self,
        server: McpServer,
        shutdown: CancellationToken,
    ) -> TransportResult<()> {
        let tracker = TaskTracker::new();
        let state = AppState::new(server, &self.config, tracker.clone(), shutdown.clone());
        let app = router(state, &self.config);

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!(
            "Ready - listening on {} (JSON-RPC over SSE, CORS {})",
            self.local_addr, cors_status
        );
        info!("  → Subscribe: GET {}", self.config.sse_path);
        info!("  → Messages:  POST {}?session_id=...", self.config.message_path);
        info!("  → Health:    GET /health");

        axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown.cancelled_owned())
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        tracker.close();
        tracker.wait().await;
        info!("SSE transport finished");
        Ok(())
    }
}

/// Build the HTTP router for the SSE surface.
pub fn router(state: AppState, config: &SseConfig) -> Router {
    let mut app = Router::new()
        .route(&config.sse_path, get(handle_subscribe))
        .route(&config.message_path, post(handle_message))
        .route("/health", get(health_check))
        .route("/", get(root_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }
    app
}

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "SSE",
        "endpoints": {
            "sse": state.sse_path,
            "messages": state.message_path,
            "health": "/health"
        },
        "protocol": "JSON-RPC 2.0",
        "tools": state.server.registry().list().collect::<Vec<_>>(),
    }))
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Open a subscription and start its worker.
async fn handle_subscribe(State(state): State<AppState>) -> Response {
    if state.shutdown.is_cancelled() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    let session_id = Uuid::new_v4();
    let (request_tx, request_rx) = mpsc::channel(REQUEST_QUEUE);
    let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE);

    let endpoint = format!("{}?session_id={}", state.message_path, session_id);
    if event_tx
        .try_send(Event::default().event("endpoint").data(endpoint))
        .is_err()
    {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    state.sessions.write().await.insert(session_id, request_tx);
    info!(session = %session_id, "Client subscribed");
    state
        .tracker
        .spawn(session_worker(state.clone(), session_id, request_rx, event_tx));

    let stream = ReceiverStream::new(event_rx).map(Ok::<_, Infallible>);
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(15))
                .text("keep-alive"),
        )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    session_id: Uuid,
}

/// Queue one request on its session.
#[instrument(skip_all, fields(session = %query.session_id))]
async fn handle_message(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Response {
    if state.shutdown.is_cancelled() {
        return (StatusCode::SERVICE_UNAVAILABLE, "Server is shutting down").into_response();
    }

    let request = match parse_request(&body) {
        Ok(request) => request,
        Err(response) => {
            warn!("Rejected request: {:?}", response.error);
            return (StatusCode::BAD_REQUEST, Json(*response)).into_response();
        }
    };

    let Some(sender) = state.sessions.read().await.get(&query.session_id).cloned() else {
        return (StatusCode::NOT_FOUND, "Unknown session").into_response();
    };

    debug!("Queueing request: {}", request.method);
    match sender.send(request).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "Session is closing").into_response(),
    }
}

/// Answer the requests of one subscription, in the order they were posted.
async fn session_worker(
    state: AppState,
    session_id: Uuid,
    mut requests: mpsc::Receiver<JsonRpcRequest>,
    events: mpsc::Sender<Event>,
) {
    let mut conn = Connection::new(session_id.to_string());
    conn.open();

    loop {
        tokio::select! {
            biased;
            request = requests.recv() => match request {
                Some(request) => respond(&state.server, &mut conn, request, &events).await,
                None => break,
            },
            _ = state.shutdown.cancelled() => break,
            _ = events.closed() => {
                debug!(session = %session_id, "Client disconnected");
                break;
            }
        }
    }

    // No new posts reach this session; whatever was already queued is answered.
    state.sessions.write().await.remove(&session_id);
    conn.drain();
    requests.close();
    while let Some(request) = requests.recv().await {
        respond(&state.server, &mut conn, request, &events).await;
    }
    conn.close();
    info!(session = %session_id, "Session closed");
}

async fn respond(
    server: &McpServer,
    conn: &mut Connection,
    request: JsonRpcRequest,
    events: &mpsc::Sender<Event>,
) {
    conn.begin();
    if let Some(response) = process_request(server, request).await {
        match Event::default().event("message").json_data(&response) {
            Ok(event) => {
                if events.send(event).await.is_err() {
                    debug!(connection = %conn.id(), "Response dropped, client is gone");
                }
            }
            Err(e) => warn!("Failed to encode response: {}", e),
        }
    }
    conn.finish();
}
