//! Backend HTTP server.
//!
//! Serves the shared location store plus the attendance and notification
//! logs. Locations live in memory; logs are JSON array files in the data
//! directory.
//!
//! | Method | Path | |
//! |---|---|---|
//! | POST | `/bus/update` | `{busNumber, state}` → upsert |
//! | GET | `/bus/status?busNumber=` | state, or 404 "Bus not started" |
//! | GET | `/buses` | every bus and its state |
//! | POST | `/attendance` | append to `attendance.json` |
//! | POST | `/notification` | append to `notifications.json` |
//! | GET | `/health` | `OK` |

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

use super::wire::{
    BusUpdate, MessageBody, StatusQuery, MSG_ATTENDANCE_SAVED, MSG_BUS_NOT_STARTED,
    MSG_BUS_UPDATED, MSG_MISSING_BUS_DATA, MSG_NOTIFICATION_SAVED,
};
use crate::attendance::{AttendanceRecord, AttendanceSink, JsonFileSink, Notification, NotificationSink};
use crate::store::{BusId, InMemoryLocationStore, LocationStore};

/// Default bind address.
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Errors raised while running the backend server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server failed: {0}")]
    Serve(#[from] std::io::Error),
}

/// Shared handler state.
#[derive(Clone)]
pub struct BackendState {
    store: InMemoryLocationStore,
    logs: Arc<JsonFileSink>,
}

impl BackendState {
    pub fn new(store: InMemoryLocationStore, data_dir: &Path) -> Self {
        Self {
            store,
            logs: Arc::new(JsonFileSink::in_dir(data_dir)),
        }
    }

    pub fn store(&self) -> &InMemoryLocationStore {
        &self.store
    }

    pub fn logs(&self) -> &JsonFileSink {
        &self.logs
    }
}

pub fn create_router(state: BackendState) -> Router {
    Router::new()
        .route("/bus/update", post(update_bus))
        .route("/bus/status", get(bus_status))
        .route("/buses", get(list_buses))
        .route("/attendance", post(save_attendance))
        .route("/notification", post(save_notification))
        .route("/health", get(health))
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .with_state(state)
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(MessageBody::new(text))).into_response()
}

async fn update_bus(State(state): State<BackendState>, Json(body): Json<BusUpdate>) -> Response {
    let (Some(bus_number), Some(journey)) = (body.bus_number, body.state) else {
        return message(StatusCode::BAD_REQUEST, MSG_MISSING_BUS_DATA);
    };
    let Ok(bus) = bus_number.parse::<BusId>() else {
        return message(StatusCode::BAD_REQUEST, MSG_MISSING_BUS_DATA);
    };

    match state.store.upsert(&bus, &journey).await {
        Ok(()) => {
            tracing::trace!(bus = %bus, cursor = journey.cursor_index, "Bus update");
            message(StatusCode::OK, MSG_BUS_UPDATED)
        }
        Err(e) => message(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

async fn bus_status(
    State(state): State<BackendState>,
    Query(query): Query<StatusQuery>,
) -> Response {
    let Some(bus) = query.bus_number.and_then(|b| b.parse::<BusId>().ok()) else {
        return message(StatusCode::BAD_REQUEST, MSG_MISSING_BUS_DATA);
    };

    match state.store.get(&bus).await {
        Ok(Some(journey)) => (StatusCode::OK, Json(journey)).into_response(),
        Ok(None) => message(StatusCode::NOT_FOUND, MSG_BUS_NOT_STARTED),
        Err(e) => message(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

async fn list_buses(State(state): State<BackendState>) -> Response {
    match state.store.fleet().await {
        Ok(fleet) => (StatusCode::OK, Json(fleet)).into_response(),
        Err(e) => message(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

async fn save_attendance(
    State(state): State<BackendState>,
    Json(record): Json<AttendanceRecord>,
) -> Response {
    match state.logs.append(&record).await {
        Ok(()) => {
            tracing::info!(
                bus = %record.bus_number,
                stop = record.stop_number,
                present = record.present().count(),
                "Attendance saved"
            );
            message(StatusCode::OK, MSG_ATTENDANCE_SAVED)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to save attendance");
            message(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

async fn save_notification(
    State(state): State<BackendState>,
    Json(notification): Json<Notification>,
) -> Response {
    match state.logs.enqueue(&notification).await {
        Ok(()) => {
            tracing::debug!(
                bus = %notification.bus_number,
                text = %notification.message,
                "Notification saved"
            );
            message(StatusCode::OK, MSG_NOTIFICATION_SAVED)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to save notification");
            message(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

/// Running backend server. Dropping it triggers graceful shutdown.
pub struct BackendServer {
    local_addr: SocketAddr,
    state: BackendState,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<(), ServerError>>>,
}

impl BackendServer {
    /// Bind `addr` (port 0 picks a free port) and start serving.
    pub async fn start(addr: SocketAddr, state: BackendState) -> Result<Self, ServerError> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let app = create_router(state.clone());

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await?;
            Ok::<(), ServerError>(())
        });

        tracing::info!(addr = %local_addr, "Backend server listening");

        Ok(Self {
            local_addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// `http://` base URL for clients on this host.
    pub fn url(&self) -> String {
        let addr = self.local_addr;
        if addr.ip().is_unspecified() {
            format!("http://127.0.0.1:{}", addr.port())
        } else {
            format!("http://{}", addr)
        }
    }

    pub fn state(&self) -> &BackendState {
        &self.state
    }

    /// Wait until the server stops on its own (or fails).
    pub async fn wait(mut self) -> Result<(), ServerError> {
        match self.task.take() {
            Some(task) => task
                .await
                .map_err(|e| ServerError::Serve(std::io::Error::other(e.to_string())))?,
            None => Ok(()),
        }
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn shutdown(mut self) -> Result<(), ServerError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let result = match self.task.take() {
            Some(task) => task
                .await
                .map_err(|e| ServerError::Serve(std::io::Error::other(e.to_string())))?,
            None => Ok(()),
        };
        tracing::info!(addr = %self.local_addr, "Backend server stopped");
        result
    }
}

impl Drop for BackendServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
