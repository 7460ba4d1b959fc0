//! HTTP servers
//!
//! The voting front end (one widget per page load) and the bundled REST store.

pub mod sessions;
pub mod store_api;

pub use sessions::{PageSession, SessionRegistry};
pub use store_api::create_store_router;

use crate::auth::PageAddress;
use crate::config::{Config, WidgetConfig};
use crate::store::{self, MemoryStore, ResponseStore, StoreError};
use crate::voting::{render, Video, VotingWidget};
use axum::{
    extract::{Form, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// Server errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Shared state of the voting front end
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ResponseStore>,
    pub widget: WidgetConfig,
    pub public_url: Url,
    pub sessions: Arc<SessionRegistry>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ResponseStore>,
        widget: WidgetConfig,
        public_url: Url,
        sessions: SessionRegistry,
    ) -> Self {
        Self {
            store,
            widget,
            public_url,
            sessions: Arc::new(sessions),
            started_at: Instant::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct VoteForm {
    session: String,
    choice: String,
}

#[derive(Debug, Deserialize)]
struct SessionForm {
    session: String,
}

/// Build the voting front end router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/vote", post(vote))
        .route("/refresh", post(refresh))
        .route("/health", get(health))
        .with_state(state)
}

/// Page load: new session, admin check and tally load run side by side.
async fn index(State(state): State<AppState>, uri: Uri) -> Response {
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let mut page = match PageAddress::from_request(&state.public_url, target) {
        Ok(page) => page,
        Err(e) => {
            tracing::debug!(error = %e, "unparseable page address");
            return (StatusCode::BAD_REQUEST, "invalid page address").into_response();
        }
    };

    let widget = Arc::new(VotingWidget::new(state.store.clone(), state.widget.clone()));
    let (is_admin, ()) = tokio::join!(
        widget.check_admin_access(&mut page),
        widget.refresh_tally()
    );

    let session_id = state.sessions.insert(widget.clone(), page.visible());
    tracing::debug!(session = %session_id, is_admin, "page session started");

    let replace_address = page.was_rewritten().then(|| page.visible());
    render_page(&widget, &session_id, replace_address)
}

async fn vote(State(state): State<AppState>, Form(form): Form<VoteForm>) -> Response {
    let Some(session) = state.sessions.get(&form.session) else {
        return Redirect::to("/").into_response();
    };
    let choice: Video = match form.choice.parse() {
        Ok(choice) => choice,
        Err(e) => return (StatusCode::BAD_REQUEST, e).into_response(),
    };

    session.widget.submit_vote(choice).await;
    render_page(&session.widget, &form.session, Some(session.address))
}

async fn refresh(State(state): State<AppState>, Form(form): Form<SessionForm>) -> Response {
    let Some(session) = state.sessions.get(&form.session) else {
        return Redirect::to("/").into_response();
    };

    session.widget.refresh_tally().await;
    render_page(&session.widget, &form.session, Some(session.address))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSeconds": state.started_at.elapsed().as_secs(),
        "sessions": state.sessions.len(),
    }))
}

fn render_page(widget: &VotingWidget, session_id: &str, replace_address: Option<String>) -> Response {
    let ctx = render::PageContext {
        session_id,
        widget: widget.config(),
        replace_address,
    };
    Html(render::page(&widget.view(), &ctx)).into_response()
}

fn socket_addr(bind: &str, port: u16) -> Result<SocketAddr, ServerError> {
    format!("{}:{}", bind, port)
        .parse::<SocketAddr>()
        .map_err(|e| ServerError::InvalidAddress(format!("{bind}:{port}: {e}")))
}

async fn serve(addr: SocketAddr, app: Router) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    tracing::info!(address = %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

/// Run the voting front end until ctrl-c
pub async fn run_server(config: &Config) -> Result<(), ServerError> {
    let store = store::from_config(&config.store)?;
    let public_url = Url::parse(&config.server.public_url())
        .map_err(|e| ServerError::InvalidAddress(e.to_string()))?;
    let state = AppState::new(
        store,
        config.widget.clone(),
        public_url,
        SessionRegistry::new(
            Duration::from_secs(config.server.session_ttl_seconds),
            config.server.max_sessions,
        ),
    );

    let addr = socket_addr(&config.server.bind, config.server.port)?;
    tracing::info!(
        designated_liar = %config.widget.designated_liar,
        "starting voting server"
    );
    serve(addr, create_router(state)).await
}

/// Run the bundled REST store server until ctrl-c
pub async fn run_store_server(config: &Config, admin_secret: String) -> Result<(), ServerError> {
    let store = Arc::new(MemoryStore::new(admin_secret));
    let addr = socket_addr(&config.store_server.bind, config.store_server.port)?;
    tracing::info!("starting store server");
    serve(addr, create_store_router(store)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        assert_eq!(
            socket_addr("127.0.0.1", 3000).unwrap(),
            "127.0.0.1:3000".parse().unwrap()
        );
        assert!(matches!(
            socket_addr("localhost", 3000),
            Err(ServerError::InvalidAddress(_))
        ));
    }
}
