#![forbid(unsafe_code)]

//! Streamable-HTTP binding: one isolated [`McpServer`] per `mcp-session-id`.
//!
//! Routing for `/mcp`:
//! - header names a live session: delegate to its transport;
//! - no header and the body is `initialize`: open a new transport, which registers itself once
//!   it has assigned an id;
//! - no header on any other POST: 400;
//! - header names no live session: 404;
//! - GET/DELETE without a header: 400.

use crate::{McpServer, SESSION_HEADER, json_rpc_error};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tt_core::EngineSnapshot;
use tt_storage::{DocumentationRenderer, SessionStore};

const SESSION_REQUIRED: &str = "Bad Request: Session ID required for non-initialization requests";
const NO_VALID_SESSION: &str = "Bad Request: No valid session ID provided";
const SESSION_NOT_FOUND: &str = "Session not found";

const SERVER_ERROR: i64 = -32000;
const SESSION_NOT_FOUND_CODE: i64 = -32001;
const INTERNAL_ERROR: i64 = -32603;

const MAX_REAP_PERIOD: Duration = Duration::from_secs(30);
const MIN_REAP_PERIOD: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("failed to bind {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("http server failed")]
    Serve(#[source] std::io::Error),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type InitializedCallback = Box<dyn FnOnce(&str, Arc<HttpTransport>) + Send>;
type CloseCallback = Box<dyn FnOnce(&str) + Send>;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionView {
    session_id: String,
    store_session_id: Option<String>,
    #[serde(flatten)]
    engine: EngineSnapshot,
}

/// Transport handle for one HTTP session.
///
/// The id is assigned on the first successful `initialize`; `on_initialized` fires exactly once
/// at that point and `on_close` fires at most once.
pub(crate) struct HttpTransport {
    server: Mutex<McpServer>,
    session_id: OnceLock<String>,
    last_seen_ms: AtomicI64,
    on_initialized: Mutex<Option<InitializedCallback>>,
    on_close: Mutex<Option<CloseCallback>>,
}

impl HttpTransport {
    fn new(server: McpServer) -> Arc<Self> {
        Arc::new(Self {
            server: Mutex::new(server),
            session_id: OnceLock::new(),
            last_seen_ms: AtomicI64::new(tt_storage::unix_ms_now()),
            on_initialized: Mutex::new(None),
            on_close: Mutex::new(None),
        })
    }

    fn on_initialized(&self, callback: impl FnOnce(&str, Arc<HttpTransport>) + Send + 'static) {
        *lock(&self.on_initialized) = Some(Box::new(callback));
    }

    fn on_close(&self, callback: impl FnOnce(&str) + Send + 'static) {
        *lock(&self.on_close) = Some(Box::new(callback));
    }

    fn session_id(&self) -> Option<&str> {
        self.session_id.get().map(String::as_str)
    }

    fn touch(&self) {
        self.last_seen_ms
            .store(tt_storage::unix_ms_now(), Ordering::Relaxed);
    }

    fn idle_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.last_seen_ms.load(Ordering::Relaxed))
    }

    fn handle(self: &Arc<Self>, request: crate::JsonRpcRequest) -> Option<Value> {
        self.touch();
        let initializing = request.method() == "initialize";
        let resp = lock(&self.server).handle(request);
        if initializing && self.session_id.get().is_none() {
            let id = uuid::Uuid::new_v4().to_string();
            if self.session_id.set(id.clone()).is_ok()
                && let Some(callback) = lock(&self.on_initialized).take()
            {
                callback(&id, Arc::clone(self));
            }
        }
        resp
    }

    fn view(&self) -> SessionView {
        self.touch();
        let server = lock(&self.server);
        SessionView {
            session_id: self.session_id().unwrap_or_default().to_string(),
            store_session_id: server.session_id().map(|id| id.to_string()),
            engine: server.snapshot(),
        }
    }

    fn close(&self) {
        let Some(callback) = lock(&self.on_close).take() else {
            return;
        };
        let id = self.session_id().unwrap_or_default();
        callback(id);
        tracing::info!(session_id = id, "session closed");
    }
}

struct HttpInner {
    store: Arc<SessionStore>,
    renderer: Arc<dyn DocumentationRenderer>,
    sessions: Mutex<HashMap<String, Arc<HttpTransport>>>,
}

/// Shared router state: the session map plus what every new session is built from.
#[derive(Clone)]
pub struct HttpState {
    inner: Arc<HttpInner>,
}

impl HttpState {
    pub fn new(store: Arc<SessionStore>, renderer: Arc<dyn DocumentationRenderer>) -> Self {
        Self {
            inner: Arc::new(HttpInner {
                store,
                renderer,
                sessions: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn active_sessions(&self) -> usize {
        lock(&self.inner.sessions).len()
    }

    fn lookup(&self, id: &str) -> Option<Arc<HttpTransport>> {
        lock(&self.inner.sessions).get(id).cloned()
    }

    fn open_transport(&self) -> Arc<HttpTransport> {
        let server = McpServer::new(
            Arc::clone(&self.inner.store),
            Arc::clone(&self.inner.renderer),
        );
        let transport = HttpTransport::new(server);

        let inner = Arc::downgrade(&self.inner);
        transport.on_initialized(move |id, transport| {
            if let Some(inner) = Weak::upgrade(&inner) {
                lock(&inner.sessions).insert(id.to_string(), transport);
                tracing::info!(session_id = id, "session initialized");
            }
        });
        let inner = Arc::downgrade(&self.inner);
        transport.on_close(move |id| {
            if let Some(inner) = Weak::upgrade(&inner) {
                lock(&inner.sessions).remove(id);
            }
        });
        transport
    }

    /// Closes one session; `false` when the id is not live.
    pub fn close_session(&self, id: &str) -> bool {
        match self.lookup(id) {
            Some(transport) => {
                transport.close();
                true
            }
            None => false,
        }
    }

    /// Closes every live session and empties the map. A session that fails to close is logged
    /// and skipped. Returns how many sessions were live.
    pub fn close_all(&self) -> usize {
        let transports = lock(&self.inner.sessions).drain().collect::<Vec<_>>();
        let count = transports.len();
        for (id, transport) in transports {
            if catch_unwind(AssertUnwindSafe(|| transport.close())).is_err() {
                tracing::warn!(session_id = %id, "failed to close session");
            }
        }
        lock(&self.inner.sessions).clear();
        count
    }

    /// Closes sessions with no traffic for longer than `idle`.
    pub fn close_idle(&self, idle: Duration) -> usize {
        let limit_ms = i64::try_from(idle.as_millis()).unwrap_or(i64::MAX);
        let now_ms = tt_storage::unix_ms_now();
        let stale = lock(&self.inner.sessions)
            .values()
            .filter(|t| t.idle_ms(now_ms) > limit_ms)
            .cloned()
            .collect::<Vec<_>>();
        for transport in &stale {
            tracing::info!(
                session_id = transport.session_id().unwrap_or_default(),
                "closing idle session"
            );
            transport.close();
        }
        stale.len()
    }
}

fn session_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn reply(status: StatusCode, session_id: Option<&str>, body: Option<Value>) -> Response {
    let mut response = match body {
        Some(body) => (status, Json(body)).into_response(),
        None => status.into_response(),
    };
    if let Some(id) = session_id
        && let Ok(value) = HeaderValue::from_str(id)
    {
        response.headers_mut().insert(SESSION_HEADER, value);
    }
    response
}

fn bad_request(message: &str) -> Response {
    reply(
        StatusCode::BAD_REQUEST,
        None,
        Some(json_rpc_error(None, SERVER_ERROR, message)),
    )
}

fn session_not_found() -> Response {
    reply(
        StatusCode::NOT_FOUND,
        None,
        Some(json_rpc_error(
            None,
            SESSION_NOT_FOUND_CODE,
            SESSION_NOT_FOUND,
        )),
    )
}

fn internal_error(err: tokio::task::JoinError) -> Response {
    tracing::error!(error = %err, "session handler failed");
    reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        None,
        Some(json_rpc_error(None, INTERNAL_ERROR, "Internal error")),
    )
}

async fn handle_post(
    State(state): State<HttpState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = match crate::parse_request(&body) {
        Ok(v) => v,
        Err(resp) => return reply(StatusCode::BAD_REQUEST, None, Some(resp)),
    };

    let transport = match session_header(&headers) {
        Some(id) => match state.lookup(id) {
            Some(transport) => transport,
            None => return session_not_found(),
        },
        None if request.method() == "initialize" => state.open_transport(),
        None => return bad_request(SESSION_REQUIRED),
    };

    // Tool calls do blocking store I/O.
    let worker = Arc::clone(&transport);
    let resp = match tokio::task::spawn_blocking(move || worker.handle(request)).await {
        Ok(v) => v,
        Err(err) => return internal_error(err),
    };
    match resp {
        Some(body) => reply(StatusCode::OK, transport.session_id(), Some(body)),
        None => reply(StatusCode::ACCEPTED, transport.session_id(), None),
    }
}

async fn handle_get(State(state): State<HttpState>, headers: HeaderMap) -> Response {
    let Some(id) = session_header(&headers) else {
        return bad_request(NO_VALID_SESSION);
    };
    let Some(transport) = state.lookup(id) else {
        return session_not_found();
    };
    let worker = Arc::clone(&transport);
    let view = match tokio::task::spawn_blocking(move || worker.view()).await {
        Ok(v) => v,
        Err(err) => return internal_error(err),
    };
    match serde_json::to_value(&view) {
        Ok(body) => reply(StatusCode::OK, Some(id), Some(body)),
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize session view");
            reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                Some(id),
                Some(json_rpc_error(None, INTERNAL_ERROR, "Internal error")),
            )
        }
    }
}

async fn handle_delete(State(state): State<HttpState>, headers: HeaderMap) -> Response {
    let Some(id) = session_header(&headers) else {
        return bad_request(NO_VALID_SESSION);
    };
    if !state.close_session(id) {
        return session_not_found();
    }
    reply(
        StatusCode::OK,
        Some(id),
        Some(json!({ "sessionId": id, "closed": true })),
    )
}

async fn handle_health(State(state): State<HttpState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "server": crate::SERVER_NAME,
        "version": crate::SERVER_VERSION,
        "activeSessions": state.active_sessions(),
    }))
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route(
            "/mcp",
            post(handle_post).get(handle_get).delete(handle_delete),
        )
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Periodically closes sessions idle for longer than `idle`.
pub fn spawn_idle_reaper(state: HttpState, idle: Duration) -> JoinHandle<()> {
    let period = idle.clamp(MIN_REAP_PERIOD, MAX_REAP_PERIOD);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let closed = state.close_idle(idle);
            if closed > 0 {
                tracing::info!(closed, remaining = state.active_sessions(), "idle sessions closed");
            }
        }
    })
}

async fn shutdown_signal(state: HttpState) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "cannot listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    let closed = state.close_all();
    tracing::info!(closed, "shutdown: sessions closed, stopping listener");
}

/// Serves until ctrl-c. Sessions are closed before the listener stops.
pub async fn serve_http(
    host: &str,
    port: u16,
    state: HttpState,
    idle_timeout: Option<Duration>,
) -> Result<(), ServeError> {
    let listener = TcpListener::bind((host, port))
        .await
        .map_err(|source| ServeError::Bind {
            addr: format!("{host}:{port}"),
            source,
        })?;
    let local_addr = listener.local_addr().map_err(ServeError::Serve)?;

    let reaper = idle_timeout.map(|idle| {
        tracing::info!(idle_secs = idle.as_secs(), "idle session reaper enabled");
        spawn_idle_reaper(state.clone(), idle)
    });

    tracing::info!(addr = %local_addr, "serving MCP over HTTP");
    let result = axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(shutdown_signal(state))
        .await;
    if let Some(reaper) = reaper {
        reaper.abort();
    }
    result.map_err(ServeError::Serve)
}
