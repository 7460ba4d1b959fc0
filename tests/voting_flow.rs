//! Front end flow tests
//!
//! Drive the voting router end to end against an in-memory store: page load,
//! admin gate, voting, and refresh.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use liarvote::config::WidgetConfig;
use liarvote::server::{create_router, AppState, SessionRegistry};
use liarvote::store::{MemoryStore, ResponseStore};
use liarvote::voting::{Video, Vote};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const SECRET: &str = "open-sesame";

fn app(store: Arc<MemoryStore>) -> Router {
    let state = AppState::new(
        store,
        WidgetConfig::default(),
        url::Url::parse("http://vote.test").unwrap(),
        SessionRegistry::new(Duration::from_secs(60), 64),
    );
    create_router(state)
}

async fn get(router: &Router, uri: &str) -> (StatusCode, String) {
    let response = router
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn post_form(router: &Router, uri: &str, form: &str) -> axum::response::Response {
    router
        .clone()
        .oneshot(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn session_id(html: &str) -> String {
    let marker = "name=\"session\" value=\"";
    let start = html.find(marker).expect("session field") + marker.len();
    let end = html[start..].find('"').unwrap() + start;
    html[start..end].to_string()
}

async fn seed(store: &MemoryStore, correct: usize, wrong: usize) {
    for _ in 0..correct {
        store
            .create_vote(Vote::cast(Video::Video1, Video::Video1, chrono::Utc::now()))
            .await
            .unwrap();
    }
    for _ in 0..wrong {
        store
            .create_vote(Vote::cast(Video::Video2, Video::Video1, chrono::Utc::now()))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn plain_visit_renders_voter_view() {
    let store = Arc::new(MemoryStore::new(SECRET));
    let router = app(store.clone());

    let (status, html) = get(&router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Select the Liar"));
    assert!(!html.contains("Admin Dashboard"));
    assert!(!html.contains("replaceState"));
    assert_eq!(store.secret_reads(), 0);
}

#[tokio::test]
async fn matching_token_renders_admin_view_and_rewrites_address() {
    let store = Arc::new(MemoryStore::new(SECRET));
    seed(&store, 3, 1).await;
    let router = app(store.clone());

    // First load: the tally may have been fetched before the admin check
    // finished, so rows show up after the next refresh at the latest.
    let (status, html) = get(&router, "/?admin=open-sesame").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Admin Dashboard"));
    assert!(html.contains("Total Votes: 4"));
    assert!(html.contains("Success Rate: 75%"));
    assert!(html.contains("window.history.replaceState(null, \"\", \"/\");"));
    assert!(!html.contains("open-sesame"));

    let session = session_id(&html);
    let response = post_form(&router, "/refresh", &format!("session={}", session)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert_eq!(html.matches("<tr><td>").count(), 4);
    assert_eq!(store.audit_events().len(), 1);
}

#[tokio::test]
async fn other_query_params_survive_the_rewrite() {
    let store = Arc::new(MemoryStore::new(SECRET));
    let router = app(store);

    let (_, html) = get(&router, "/?lang=en&admin=open-sesame").await;
    assert!(html.contains("Admin Dashboard"));
    assert!(html.contains("replaceState(null, \"\", \"/?lang=en\")"));

    let response = post_form(&router, "/refresh", &format!("session={}", session_id(&html))).await;
    let html = body_text(response).await;
    assert!(html.contains("replaceState(null, \"\", \"/?lang=en\")"));
    assert!(!html.contains("open-sesame"));
}

#[tokio::test]
async fn vote_keeps_the_page_address() {
    let store = Arc::new(MemoryStore::new(SECRET));
    let router = app(store);

    let (_, html) = get(&router, "/?lang=en").await;
    let response = post_form(
        &router,
        "/vote",
        &format!("session={}&choice=video1", session_id(&html)),
    )
    .await;
    let html = body_text(response).await;
    assert!(html.contains("Thank you for voting!"));
    assert!(html.contains("replaceState(null, \"\", \"/?lang=en\")"));
}

#[tokio::test]
async fn mismatched_token_renders_voter_view() {
    let store = Arc::new(MemoryStore::new(SECRET));
    seed(&store, 1, 1).await;
    let router = app(store.clone());

    for _ in 0..3 {
        let (status, html) = get(&router, "/?admin=guess").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Select the Liar"));
        assert!(!html.contains("Admin Dashboard"));
        assert!(!html.contains("replaceState"));
        assert!(!html.contains("<td>"));
    }
    assert!(store.audit_events().is_empty());
}

#[tokio::test]
async fn vote_is_recorded_once_per_session() {
    let store = Arc::new(MemoryStore::new(SECRET));
    let router = app(store.clone());

    let (_, html) = get(&router, "/").await;
    let session = session_id(&html);

    let response = post_form(
        &router,
        "/vote",
        &format!("session={}&choice=video2", session),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Thank you for voting!"));
    assert_eq!(html.matches(" disabled>").count(), 2);

    let response = post_form(
        &router,
        "/vote",
        &format!("session={}&choice=video1", session),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let votes = store.votes();
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].selected_liar(), Video::Video2);
    assert_eq!(votes[0].selected_truth(), Video::Video1);
    assert!(!votes[0].is_correct());
    assert_eq!(store.create_calls(), 1);
}

#[tokio::test]
async fn new_page_load_starts_a_new_session() {
    let store = Arc::new(MemoryStore::new(SECRET));
    let router = app(store.clone());

    let (_, first) = get(&router, "/").await;
    let (_, second) = get(&router, "/").await;
    assert_ne!(session_id(&first), session_id(&second));

    post_form(
        &router,
        "/vote",
        &format!("session={}&choice=video1", session_id(&first)),
    )
    .await;
    post_form(
        &router,
        "/vote",
        &format!("session={}&choice=video1", session_id(&second)),
    )
    .await;
    assert_eq!(store.votes().len(), 2);
}

#[tokio::test]
async fn unknown_session_redirects_home() {
    let store = Arc::new(MemoryStore::new(SECRET));
    let router = app(store.clone());

    let response = post_form(&router, "/vote", "session=nope&choice=video1").await;
    assert!(response.status().is_redirection());
    assert_eq!(response.headers()[header::LOCATION], "/");
    assert!(store.votes().is_empty());
}

#[tokio::test]
async fn invalid_choice_is_rejected() {
    let store = Arc::new(MemoryStore::new(SECRET));
    let router = app(store.clone());
    let (_, html) = get(&router, "/").await;

    let response = post_form(
        &router,
        "/vote",
        &format!("session={}&choice=video3", session_id(&html)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(store.votes().is_empty());
}

#[tokio::test]
async fn store_outage_degrades_silently() {
    let store = Arc::new(MemoryStore::new(SECRET));
    store.set_offline(true);
    let router = app(store.clone());

    let (status, html) = get(&router, "/?admin=open-sesame").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("Select the Liar"));

    let response = post_form(
        &router,
        "/vote",
        &format!("session={}&choice=video1", session_id(&html)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Thank you for voting!"));
    assert!(!store.error_reports().is_empty());
}

#[tokio::test]
async fn health_reports_sessions() {
    let store = Arc::new(MemoryStore::new(SECRET));
    let router = app(store);
    get(&router, "/").await;

    let (status, body) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["sessions"], 1);
}
