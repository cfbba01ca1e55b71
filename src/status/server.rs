//! Status HTTP server with axum router and graceful shutdown.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::error::StatusError;
use crate::config::StatusConfig;
use crate::engine::StateSnapshot;

/// Response for GET /api/status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// When the process started.
    pub started_at: DateTime<Utc>,
    /// Seconds since the process started.
    pub uptime_secs: i64,
    /// Latest state published by the engine.
    #[serde(flatten)]
    pub state: StateSnapshot,
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub snapshot_rx: watch::Receiver<StateSnapshot>,
    pub started_at: DateTime<Utc>,
}

/// GET /api/status - Get the current reconciled counters.
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = state.snapshot_rx.borrow().clone();
    let now = Utc::now();
    Json(StatusResponse {
        started_at: state.started_at,
        uptime_secs: (now - state.started_at).num_seconds(),
        state: snapshot,
    })
}

/// Read-only HTTP view of the engine's state.
pub struct StatusServer {
    config: StatusConfig,
    state: AppState,
}

impl StatusServer {
    /// Create a server reading snapshots from `snapshot_rx`.
    #[must_use]
    pub fn new(snapshot_rx: watch::Receiver<StateSnapshot>) -> Self {
        Self {
            config: StatusConfig::default(),
            state: AppState {
                snapshot_rx,
                started_at: Utc::now(),
            },
        }
    }

    /// Set the server configuration (builder pattern).
    #[must_use]
    pub fn with_config(mut self, config: StatusConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the configured address as a string.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Build the axum router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            .route("/api/status", get(get_status))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.config.cors_permissive {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Bind to the configured address and serve until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or serve.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), StatusError> {
        let address = self.address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| StatusError::BindError {
                address: address.clone(),
                source,
            })?;
        self.serve(listener, cancel).await
    }

    /// Serve on an already bound listener until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if serving fails.
    pub async fn serve(self, listener: TcpListener, cancel: CancellationToken) -> Result<(), StatusError> {
        let app = self.build_router();
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "Starting status server");
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                tracing::info!("Status server shutting down gracefully");
            })
            .await?;
        Ok(())
    }
}
