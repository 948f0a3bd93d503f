#![allow(clippy::unwrap_used)]
// ListController against a wiremock backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use deskly_core::{
    ClientConfig, CoreError, CrudClient, Entity, ListController, LoadState, NoticeLevel, RecordId,
    SharedToken,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, CrudClient) {
    let server = MockServer::start().await;
    let (client, _) = ClientConfig::parse(&format!("{}/api", server.uri()))
        .unwrap()
        .connect(None)
        .unwrap();
    (server, client)
}

fn blogs(n: usize) -> Vec<Value> {
    (1..=n)
        .map(|i| {
            json!({
                "_id": format!("b{i}"),
                "title": format!("Post {i:02}"),
                "status": if i <= 2 { "published" } else { "draft" },
                "createdAt": format!("2024-01-{i:02}T00:00:00Z"),
            })
        })
        .collect()
}

async fn mount_list(server: &MockServer, endpoint: &str, data: Vec<Value>) {
    let total = data.len();
    Mock::given(method("GET"))
        .and(path(format!("/api{endpoint}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": data,
            "total": total,
            "page": 1,
            "limit": 100
        })))
        .mount(server)
        .await;
}

// ── Loading and views ───────────────────────────────────────────────

#[tokio::test]
async fn test_load_then_page_through_view() {
    let (server, client) = setup().await;
    mount_list(&server, "/blogs", blogs(25)).await;

    let mut ctl = ListController::for_entity(Entity::Blogs);
    assert!(ctl.load(&client).await);
    assert_eq!(ctl.state(), LoadState::Ready);
    assert_eq!(ctl.records().len(), 25);

    ctl.query_mut().set_page_size(10);
    ctl.query_mut().set_page(3);
    let view = ctl.view();
    assert_eq!(view.items.len(), 5);
    assert_eq!(view.pagination.total_pages, 3);
    assert!(!view.pagination.has_next_page);
}

#[tokio::test]
async fn test_status_filter_and_search() {
    let (server, client) = setup().await;
    mount_list(&server, "/blogs", blogs(5)).await;

    let mut ctl = ListController::for_entity(Entity::Blogs);
    ctl.load(&client).await;

    ctl.query_mut().set_filter("status", Some("published".into()));
    assert_eq!(ctl.view().total(), 2);

    ctl.query_mut().set_filter("status", Some("all".into()));
    ctl.query_mut().set_search("");
    assert_eq!(ctl.view().total(), 5);

    ctl.query_mut().set_search("POST 04");
    let view = ctl.view();
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].id().as_str(), "b4");
}

#[tokio::test]
async fn test_default_sort_is_newest_first() {
    let (server, client) = setup().await;
    mount_list(&server, "/blogs", blogs(3)).await;

    let mut ctl = ListController::for_entity(Entity::Blogs);
    ctl.load(&client).await;
    let ids: Vec<_> = ctl.view().items.iter().map(|r| r.id().to_string()).collect();
    assert_eq!(ids, vec!["b3", "b2", "b1"]);
}

#[tokio::test]
async fn test_load_walks_pages_with_fetch_page_size() {
    let (server, client) = setup().await;
    let all = blogs(3);
    for (page, chunk) in all.chunks(2).enumerate() {
        Mock::given(method("GET"))
            .and(path("/api/blogs"))
            .and(query_param("page", (page + 1).to_string()))
            .and(query_param("limit", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": chunk,
                "total": 3,
                "page": page + 1,
                "limit": 2
            })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut ctl = ListController::for_entity(Entity::Blogs).with_fetch_page_size(2);
    ctl.load(&client).await;
    assert_eq!(ctl.records().len(), 3);
}

#[tokio::test]
async fn test_failed_load_degrades_to_empty_ready() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/news"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "message": "database offline",
            "statusCode": 500
        })))
        .mount(&server)
        .await;

    let mut ctl = ListController::for_entity(Entity::News);
    assert!(ctl.load(&client).await);
    assert_eq!(ctl.state(), LoadState::Ready);
    assert!(ctl.view().is_empty());

    let notices = ctl.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert!(notices[0].message.contains("database offline"));
}

#[tokio::test]
async fn test_stale_response_is_discarded() {
    let (server, client) = setup().await;
    mount_list(&server, "/faqs", vec![json!({ "_id": "f1", "question": "q" })]).await;

    let mut ctl = ListController::for_entity(Entity::Faqs);
    let first = ctl.begin_load();
    let second = ctl.begin_load();

    let params = deskly_api::ListParams::default();
    let fresh = client.list_all("/faqs", &params).await;
    assert!(ctl.complete_load(&second, fresh));

    let stale = Ok(Vec::new());
    assert!(!ctl.complete_load(&first, stale));
    assert_eq!(ctl.records().len(), 1);
}

#[tokio::test]
async fn test_cancelled_controller_does_not_apply() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/teams"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "_id": "t1" }]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let mut ctl = ListController::for_entity(Entity::Teams);
    ctl.cancellation_token().cancel();
    assert!(!ctl.load(&client).await);
    assert!(ctl.records().is_empty());
}

// ── Mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_status_update_reflects_locally() {
    let (server, client) = setup().await;
    mount_list(
        &server,
        "/contact",
        vec![json!({ "_id": "42", "name": "Ada", "status": "pending" })],
    )
    .await;
    Mock::given(method("PATCH"))
        .and(path("/api/contact/42/status"))
        .and(body_json(json!({ "status": "replied" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": { "_id": "42", "status": "replied" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut ctl = ListController::for_entity(Entity::ContactRequests);
    ctl.load(&client).await;
    ctl.update_status(&client, &RecordId::new("42"), "replied")
        .await
        .unwrap();

    let local = ctl.get(&RecordId::new("42")).unwrap();
    assert_eq!(local.str_field("status"), Some("replied"));
    assert_eq!(local.str_field("name"), Some("Ada"));

    ctl.query_mut().set_filter("status", Some("replied".into()));
    assert_eq!(ctl.view().total(), 1);
}

#[tokio::test]
async fn test_unknown_status_is_rejected_without_request() {
    let (_server, client) = setup().await;
    let mut ctl = ListController::for_entity(Entity::ContactRequests);

    let err = ctl
        .update_status(&client, &RecordId::new("1"), "published")
        .await
        .unwrap_err();
    assert!(err.field_errors().unwrap().contains_key("status"));
    assert_eq!(ctl.take_notices()[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn test_create_appends_and_update_replaces() {
    let (server, client) = setup().await;
    mount_list(&server, "/faqs", Vec::new()).await;
    Mock::given(method("POST"))
        .and(path("/api/faqs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "_id": "f9", "question": "Why?", "order": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/faqs/f9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "f9", "question": "Why not?", "order": 1
        })))
        .mount(&server)
        .await;

    let mut ctl = ListController::for_entity(Entity::Faqs);
    ctl.load(&client).await;

    let created = ctl
        .create(&client, &json!({ "question": "Why?", "order": 1 }))
        .await
        .unwrap();
    assert_eq!(created.id().as_str(), "f9");
    assert_eq!(ctl.view().total(), 1);

    ctl.update(&client, created.id(), &json!({ "question": "Why not?" }))
        .await
        .unwrap();
    assert_eq!(
        ctl.get(created.id()).unwrap().str_field("question"),
        Some("Why not?")
    );

    let notices = ctl.take_notices();
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|n| n.level == NoticeLevel::Success));
}

#[tokio::test]
async fn test_validation_failure_surfaces_field_errors() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": ["name should not be empty", "price must be a number"],
            "error": "Bad Request",
            "statusCode": 400
        })))
        .mount(&server)
        .await;

    let mut ctl = ListController::for_entity(Entity::Products);
    let err = ctl.create(&client, &json!({})).await.unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed { .. }));
    assert!(ctl.records().is_empty());

    let notice = ctl.take_notices().remove(0);
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.fields.contains_key("name"));
    assert!(notice.fields.contains_key("price"));
}

#[tokio::test]
async fn test_delete_missing_record_is_not_found() {
    let (server, client) = setup().await;
    Mock::given(method("DELETE"))
        .and(path("/api/services/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Service not found",
            "statusCode": 404
        })))
        .mount(&server)
        .await;

    let mut ctl = ListController::for_entity(Entity::Services);
    let err = ctl
        .delete(&client, &RecordId::new("gone"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "service not found: gone");
}

#[tokio::test]
async fn test_bulk_delete_removes_only_deleted_ids() {
    let (server, client) = setup().await;
    mount_list(
        &server,
        "/testimonials",
        vec![json!({ "_id": "a" }), json!({ "_id": "b" }), json!({ "_id": "c" })],
    )
    .await;
    Mock::given(method("DELETE"))
        .and(path("/api/testimonials/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/testimonials/b"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "message": "locked" })))
        .mount(&server)
        .await;

    let mut ctl = ListController::for_entity(Entity::Testimonials);
    ctl.load(&client).await;

    let ids: Vec<RecordId> = ["a", "b", "c"].into_iter().map(RecordId::new).collect();
    let report = ctl.bulk_delete(&client, &ids).await;

    assert_eq!(report.deleted, vec![RecordId::new("a")]);
    assert_eq!(report.skipped, vec![RecordId::new("c")]);
    let remaining: Vec<_> = ctl.records().iter().map(|r| r.id().to_string()).collect();
    assert_eq!(remaining, vec!["b", "c"]);

    let notice = ctl.take_notices().remove(0);
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains("locked"));
}

// ── Session expiry ──────────────────────────────────────────────────

#[tokio::test]
async fn test_session_expiry_during_load_clears_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/blogs"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Invalid or expired token",
            "error": "Unauthorized",
            "statusCode": 401
        })))
        .mount(&server)
        .await;

    let fired = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&fired);
    let config = ClientConfig::parse(&format!("{}/api", server.uri()))
        .unwrap()
        .with_token(SecretString::from("stale".to_owned()));
    let (client, tokens): (CrudClient, SharedToken) = config
        .connect(Some(Arc::new(move || flag.store(true, Ordering::SeqCst))))
        .unwrap();

    let mut ctl = ListController::for_entity(Entity::Blogs);
    ctl.load(&client).await;

    assert!(fired.load(Ordering::SeqCst));
    assert!(!tokens.is_set());
    assert_eq!(ctl.state(), LoadState::Ready);
    assert!(ctl.take_notices()[0].message.contains("Session expired"));
}
