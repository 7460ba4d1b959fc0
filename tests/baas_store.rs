//! Managed backend adapter against a PostgREST-shaped server on a live socket.

use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use liarvote::auth::PageAddress;
use liarvote::config::WidgetConfig;
use liarvote::store::{BaasStore, ResponseStore, StoreError};
use liarvote::voting::{AuditEvent, ErrorReport, Tally, Video, View, Vote, VotingWidget};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const API_KEY: &str = "anon-key";

#[derive(Clone, Default)]
struct Backend {
    secret: Option<String>,
    responses: Arc<Mutex<Vec<Value>>>,
    audit_log: Arc<Mutex<Vec<Value>>>,
    error_log: Arc<Mutex<Vec<Value>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    let bearer = format!("Bearer {}", API_KEY);
    headers.get("apikey").is_some_and(|v| v == API_KEY)
        && headers.get("authorization").is_some_and(|v| v == bearer.as_str())
}

fn prefers(headers: &HeaderMap, expected: &str) -> bool {
    headers.get("prefer").is_some_and(|v| v == expected)
}

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

async fn admin_access(
    State(backend): State<Backend>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    if !authorized(&headers) {
        return reject(StatusCode::UNAUTHORIZED, "invalid api key");
    }
    if query.as_deref() != Some("select=secret_key&limit=1") {
        return reject(StatusCode::BAD_REQUEST, "unexpected query");
    }
    let rows: Vec<Value> = backend
        .secret
        .iter()
        .map(|secret| json!({ "secret_key": secret }))
        .collect();
    Json(rows).into_response()
}

async fn list_responses(
    State(backend): State<Backend>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    if !authorized(&headers) {
        return reject(StatusCode::UNAUTHORIZED, "invalid api key");
    }
    if query.as_deref() != Some("select=*&order=id.asc") {
        return reject(StatusCode::BAD_REQUEST, "unexpected query");
    }
    let rows = backend.responses.lock().clone();
    Json(rows).into_response()
}

async fn insert_response(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(mut row): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return reject(StatusCode::UNAUTHORIZED, "invalid api key");
    }
    if !prefers(&headers, "return=representation") {
        return reject(StatusCode::BAD_REQUEST, "missing prefer header");
    }
    let mut rows = backend.responses.lock();
    row["id"] = json!(rows.len() as i64 + 1);
    rows.push(row.clone());
    (StatusCode::CREATED, Json(vec![row])).into_response()
}

async fn insert_audit(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(row): Json<Value>,
) -> Response {
    if !authorized(&headers) || !prefers(&headers, "return=minimal") {
        return reject(StatusCode::BAD_REQUEST, "bad insert");
    }
    backend.audit_log.lock().push(row);
    StatusCode::CREATED.into_response()
}

async fn insert_error(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(row): Json<Value>,
) -> Response {
    if !authorized(&headers) || !prefers(&headers, "return=minimal") {
        return reject(StatusCode::BAD_REQUEST, "bad insert");
    }
    backend.error_log.lock().push(row);
    StatusCode::CREATED.into_response()
}

async fn spawn_backend(secret: Option<&str>) -> (Backend, String) {
    let backend = Backend {
        secret: secret.map(str::to_string),
        ..Backend::default()
    };
    let router = Router::new()
        .route("/rest/v1/admin_access", get(admin_access))
        .route(
            "/rest/v1/responses",
            get(list_responses).post(insert_response),
        )
        .route("/rest/v1/audit_log", post(insert_audit))
        .route("/rest/v1/error_log", post(insert_error))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (backend, format!("http://{}", addr))
}

fn client(url: &str, api_key: &str) -> BaasStore {
    BaasStore::new(url, api_key, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn baas_adapter_reads_admin_secret() {
    let (_backend, url) = spawn_backend(Some("s3cret")).await;
    assert_eq!(client(&url, API_KEY).admin_secret().await.unwrap(), "s3cret");
}

#[tokio::test]
async fn baas_adapter_treats_empty_admin_table_as_unavailable() {
    let (_backend, url) = spawn_backend(None).await;
    assert!(matches!(
        client(&url, API_KEY).admin_secret().await,
        Err(StoreError::Unavailable(_))
    ));
}

#[tokio::test]
async fn baas_adapter_rejected_key_surfaces_status() {
    let (_backend, url) = spawn_backend(Some("s3cret")).await;
    match client(&url, "wrong-key").list_votes().await {
        Err(StoreError::Status { status, .. }) => assert_eq!(status, 401),
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn baas_adapter_round_trips_votes_with_numeric_ids() {
    let (backend, url) = spawn_backend(Some("s3cret")).await;
    let store = client(&url, API_KEY);

    let first = store
        .create_vote(Vote::cast(Video::Video2, Video::Video1, chrono::Utc::now()))
        .await
        .unwrap();
    let second = store
        .create_vote(Vote::cast(Video::Video1, Video::Video1, chrono::Utc::now()))
        .await
        .unwrap();
    assert_eq!(first.id(), Some("1"));
    assert_eq!(second.id(), Some("2"));

    let listed = store.list_votes().await.unwrap();
    assert_eq!(listed, vec![first, second]);
    assert_eq!(Tally::from_votes(&listed), Tally { correct: 1, wrong: 1 });

    let stored = backend.responses.lock();
    assert_eq!(stored[0]["selected_liar"], "video2");
    assert_eq!(stored[0]["selected_truth"], "video1");
    assert_eq!(stored[0]["userType"], "voter");
}

#[tokio::test]
async fn baas_adapter_writes_audit_and_error_rows() {
    let (backend, url) = spawn_backend(Some("s3cret")).await;
    let store = client(&url, API_KEY);

    store
        .append_audit_log(AuditEvent::new("admin_access_granted"))
        .await
        .unwrap();
    store
        .record_error(ErrorReport::new("list_votes", "timeout"))
        .await
        .unwrap();

    assert_eq!(backend.audit_log.lock()[0]["action"], "admin_access_granted");
    assert_eq!(backend.error_log.lock()[0]["context"], "list_votes");
}

#[tokio::test]
async fn widget_over_baas_scenario() {
    let (backend, url) = spawn_backend(Some("s3cret")).await;
    let store: Arc<dyn ResponseStore> = Arc::new(client(&url, API_KEY));

    let voter = VotingWidget::new(store.clone(), WidgetConfig::default());
    voter.submit_vote(Video::Video1).await;
    assert_eq!(voter.tally(), Tally { correct: 1, wrong: 0 });
    assert!(voter.responses().is_empty());

    let another = VotingWidget::new(store.clone(), WidgetConfig::default());
    another.submit_vote(Video::Video2).await;

    let admin = VotingWidget::new(store, WidgetConfig::default());
    let mut page = PageAddress::parse("http://localhost:3000/?admin=s3cret").unwrap();
    assert!(admin.check_admin_access(&mut page).await);
    assert_eq!(page.visible(), "/");
    admin.refresh_tally().await;

    match admin.view() {
        View::Admin(view) => {
            assert_eq!(view.tally, Tally { correct: 1, wrong: 1 });
            assert_eq!(view.success_percentage, 50);
            assert_eq!(view.responses.len(), 2);
        }
        other => panic!("expected admin view, got {:?}", other),
    }
    assert_eq!(backend.audit_log.lock().len(), 1);
    assert!(backend.error_log.lock().is_empty());
}
