//! Integration tests for the study tracker HTTP surface.
//!
//! Each test spins up an Axum server on a random port backed by an
//! in-memory libSQL store and a fixed clock, then drives it with reqwest.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::time::timeout;

use study_tracker::clock::FixedClock;
use study_tracker::store::{LibSqlBackend, TopicStore};
use study_tracker::topics::{AppState, topic_routes};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
}

fn days_from_today(n: i64) -> NaiveDate {
    today() + chrono::Duration::days(n)
}

/// Start an Axum server on a random port, return (port, store).
async fn start_server() -> (u16, Arc<dyn TopicStore>) {
    let store: Arc<dyn TopicStore> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
    let app = topic_routes(AppState::new(Arc::clone(&store), Arc::new(FixedClock(today()))));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (port, store)
}

/// Client that surfaces redirects instead of following them.
fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

async fn due_json(port: u16) -> Value {
    reqwest::get(format!("http://127.0.0.1:{port}/api/topics/due"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

// ── Health ───────────────────────────────────────────────────────────

#[tokio::test]
async fn health_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let (port, _store) = start_server().await;

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/health"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "study-tracker");
    })
    .await
    .expect("test timed out");
}

// ── Topic entry ──────────────────────────────────────────────────────

#[tokio::test]
async fn enter_topic_then_due_tomorrow() {
    timeout(TEST_TIMEOUT, async {
        let (port, store) = start_server().await;

        let resp = client()
            .post(format!("http://127.0.0.1:{port}/enter-topic"))
            .form(&[("title", "Smart pointers"), ("description", "Box, Rc, Arc")])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 303);
        assert_eq!(resp.headers()["location"], "/");

        let topics = store.list_all().await.unwrap();
        assert_eq!(topics.len(), 1);
        let topic = store.get(topics[0].id).await.unwrap();
        assert_eq!(topic.title, "Smart pointers");
        assert_eq!(topic.description.as_deref(), Some("Box, Rc, Arc"));
        assert_eq!(topic.date_added, today());
        assert_eq!(topic.next_review_date, Some(days_from_today(1)));

        // Not due today, due tomorrow.
        assert!(due_json(port).await["topics"].as_array().unwrap().is_empty());
        assert_eq!(store.list_due(days_from_today(1)).await.unwrap().len(), 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn enter_topic_blank_title_rejected() {
    timeout(TEST_TIMEOUT, async {
        let (port, store) = start_server().await;

        let resp = client()
            .post(format!("http://127.0.0.1:{port}/enter-topic"))
            .form(&[("title", "   ")])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        assert!(store.list_all().await.unwrap().is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn missing_topic_eight_days_old_is_due_now() {
    timeout(TEST_TIMEOUT, async {
        let (port, _store) = start_server().await;

        let resp = client()
            .post(format!("http://127.0.0.1:{port}/enter-missing-topic"))
            .form(&[("title", "Trait objects"), ("date_added", "2026-10-07")])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 303);

        let due = due_json(port).await;
        let topics = due["topics"].as_array().unwrap();
        assert_eq!(topics.len(), 1);
        assert_eq!(topics[0]["title"], "Trait objects");
        assert_eq!(topics[0]["date_added"], "2026-10-07");
        assert_eq!(topics[0]["next_review_date"], "2026-10-15");
        assert!(due["advisory"].is_null());

        let page = reqwest::get(format!("http://127.0.0.1:{port}/review_topics"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(page.contains("Trait objects"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn missing_topic_malformed_date_is_server_error() {
    timeout(TEST_TIMEOUT, async {
        let (port, store) = start_server().await;

        let resp = client()
            .post(format!("http://127.0.0.1:{port}/enter-missing-topic"))
            .form(&[("title", "Atomics"), ("date_added", "2026-02-30")])
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);
        let body = resp.text().await.unwrap();
        assert!(body.starts_with("Error: "));
        assert!(body.contains("2026-02-30"));
        assert!(store.list_all().await.unwrap().is_empty());
    })
    .await
    .expect("test timed out");
}

// ── Reviews ──────────────────────────────────────────────────────────

#[tokio::test]
async fn review_good_then_again() {
    timeout(TEST_TIMEOUT, async {
        let (port, store) = start_server().await;
        let topic = store
            .create("Lifetimes", None, days_from_today(-4), days_from_today(-1))
            .await
            .unwrap();

        let resp = client()
            .post(format!("http://127.0.0.1:{port}/review/{}/good", topic.id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 303);
        assert_eq!(resp.headers()["location"], "/review_topics");
        assert_eq!(
            store.get(topic.id).await.unwrap().next_review_date,
            Some(days_from_today(3))
        );

        let resp = client()
            .post(format!("http://127.0.0.1:{port}/review/{}/again", topic.id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 303);
        assert_eq!(
            store.get(topic.id).await.unwrap().next_review_date,
            Some(days_from_today(1))
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn review_ten_days_overdue_uses_table() {
    timeout(TEST_TIMEOUT, async {
        let (port, store) = start_server().await;
        let topic = store
            .create("Unsafe Rust", None, days_from_today(-30), days_from_today(-10))
            .await
            .unwrap();

        let resp = client()
            .post(format!(
                "http://127.0.0.1:{port}/api/topics/{}/review/good",
                topic.id
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["id"], topic.id.to_string());
        assert_eq!(body["next_review_date"], "2026-11-14");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn review_unknown_topic_is_404() {
    timeout(TEST_TIMEOUT, async {
        let (port, _store) = start_server().await;

        let resp = client()
            .post(format!(
                "http://127.0.0.1:{port}/review/{}/good",
                uuid::Uuid::new_v4()
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        let resp = client()
            .post(format!("http://127.0.0.1:{port}/review/not-an-id/again"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn review_unknown_action_is_400() {
    timeout(TEST_TIMEOUT, async {
        let (port, store) = start_server().await;
        let topic = store
            .create("Closures", None, today(), days_from_today(1))
            .await
            .unwrap();

        let resp = client()
            .post(format!("http://127.0.0.1:{port}/review/{}/easy", topic.id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        assert_eq!(
            store.get(topic.id).await.unwrap().next_review_date,
            Some(days_from_today(1))
        );
    })
    .await
    .expect("test timed out");
}

// ── Due list ─────────────────────────────────────────────────────────

#[tokio::test]
async fn due_list_is_exactly_topics_on_or_before_today() {
    timeout(TEST_TIMEOUT, async {
        let (port, store) = start_server().await;
        let overdue = store
            .create("Overdue", None, days_from_today(-20), days_from_today(-3))
            .await
            .unwrap();
        let due_today = store
            .create("Due today", None, days_from_today(-2), today())
            .await
            .unwrap();
        store
            .create("Tomorrow", None, today(), days_from_today(1))
            .await
            .unwrap();

        let due = due_json(port).await;
        let ids: Vec<&str> = due["topics"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_str().unwrap())
            .collect();
        assert_eq!(
            ids,
            vec![overdue.id.to_string().as_str(), due_today.id.to_string().as_str()]
        );

        let all: Vec<Value> = reqwest::get(format!("http://127.0.0.1:{port}/api/topics"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn static_pages_render() {
    timeout(TEST_TIMEOUT, async {
        let (port, _store) = start_server().await;

        for path in ["/", "/enter-topic", "/enter-missing-topic", "/classes"] {
            let resp = reqwest::get(format!("http://127.0.0.1:{port}{path}"))
                .await
                .unwrap();
            assert_eq!(resp.status(), 200, "GET {path}");
            let ct = resp.headers()["content-type"].to_str().unwrap().to_string();
            assert!(ct.starts_with("text/html"), "GET {path} content-type {ct}");
        }
    })
    .await
    .expect("test timed out");
}
