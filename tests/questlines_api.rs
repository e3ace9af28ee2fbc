//! HTTP-level tests for the questline API, the health check and the
//! frontend fallback, run against an in-memory database.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use questlines::{create_router, ServerConfig};
use questlines_core::Database;

struct TestApp {
    server: TestServer,
    _static_dir: TempDir,
}

fn test_app() -> TestApp {
    test_app_with(ServerConfig::default())
}

fn test_app_with(base: ServerConfig) -> TestApp {
    let static_dir = tempfile::tempdir().unwrap();
    std::fs::write(static_dir.path().join("index.html"), "<html>questlines</html>").unwrap();
    std::fs::create_dir(static_dir.path().join("assets")).unwrap();
    std::fs::write(static_dir.path().join("assets").join("app.js"), "console.log(1)").unwrap();

    let config = ServerConfig {
        static_dir: static_dir.path().to_path_buf(),
        ..base
    };
    let db = Database::open_memory().unwrap();
    let server = TestServer::new(create_router(db, &config)).unwrap();

    TestApp {
        server,
        _static_dir: static_dir,
    }
}

fn intro_payload() -> Value {
    json!({
        "name": "Intro",
        "quests": [{
            "id": "q1",
            "title": "Start",
            "objectives": [{"id": "o1", "text": "go", "sortIndex": 0}]
        }],
        "dependencies": []
    })
}

async fn create_intro(app: &TestApp) -> Value {
    let response = app.server.post("/api/questlines").json(&intro_payload()).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()
}

// ---------------------------------------------------------------------------
// Full lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_questline_lifecycle() {
    let app = test_app();

    let created = create_intro(&app).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    assert_eq!(created["created"], created["updated"]);
    assert_eq!(created["quests"][0]["objectives"][0]["text"], "go");

    let response = app
        .server
        .put(&format!("/api/questlines/{id}"))
        .json(&json!({"id": id, "name": "Intro", "quests": [], "dependencies": []}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated = response.json::<Value>();
    assert_eq!(updated["quests"], json!([]));

    let response = app.server.get(&format!("/api/questlines/{id}")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), updated);

    let response = app.server.delete(&format!("/api/questlines/{id}")).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.json::<Value>()["message"],
        "Questline deleted successfully"
    );

    let response = app.server.get(&format!("/api/questlines/{id}")).await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"], "Questline not found");
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_create_rejects_malformed_json() {
    let app = test_app();
    let response = app
        .server
        .post("/api/questlines")
        .bytes("{not json".into())
        .content_type("application/json")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Invalid request payload");
}

#[tokio::test]
async fn test_create_rejects_quest_without_id() {
    let app = test_app();
    let response = app
        .server
        .post("/api/questlines")
        .json(&json!({"name": "x", "quests": [{"id": "", "title": "t"}], "dependencies": []}))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_create_with_dangling_dependency_is_500() {
    let app = test_app();
    let response = app
        .server
        .post("/api/questlines")
        .json(&json!({
            "name": "Dangling",
            "quests": [{"id": "q1", "title": "t"}],
            "dependencies": [{"from": "q1", "to": "nowhere"}]
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let list = app.server.get("/api/questlines").await.json::<Value>();
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_create_ignores_client_id_and_timestamps() {
    let app = test_app();
    let mut payload = intro_payload();
    payload["id"] = json!("mine");
    payload["created"] = json!("2001-01-01T00:00:00Z");

    let response = app.server.post("/api/questlines").json(&payload).await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let created = response.json::<Value>();
    assert_ne!(created["id"], "mine");
    assert_ne!(created["created"], "2001-01-01T00:00:00Z");
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_list_reports_quest_counts() {
    let app = test_app();
    app.server
        .post("/api/questlines")
        .json(&json!({
            "name": "Counted",
            "quests": [
                {"id": "a", "title": "A", "completed": true},
                {"id": "b", "title": "B"},
                {"id": "c", "title": "C"}
            ],
            "dependencies": [{"from": "a", "to": "b"}]
        }))
        .await;

    let response = app.server.get("/api/questlines").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let list = response.json::<Value>();
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["name"], "Counted");
    assert_eq!(list[0]["totalQuests"], 3);
    assert_eq!(list[0]["completedQuests"], 1);
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_update_rejects_id_mismatch() {
    let app = test_app();
    let created = create_intro(&app).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .server
        .put(&format!("/api/questlines/{id}"))
        .json(&json!({"id": "other", "name": "x", "quests": [], "dependencies": []}))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "ID mismatch between URL param and body"
    );
    // Untouched.
    let fetched = app.server.get(&format!("/api/questlines/{id}")).await.json::<Value>();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_update_rejects_body_without_id() {
    let app = test_app();
    let created = create_intro(&app).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .server
        .put(&format!("/api/questlines/{id}"))
        .json(&json!({"name": "x", "quests": [], "dependencies": []}))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "ID mismatch between URL param and body"
    );
}

#[tokio::test]
async fn test_update_rejects_malformed_json() {
    let app = test_app();
    let created = create_intro(&app).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .server
        .put(&format!("/api/questlines/{id}"))
        .bytes("{\"id\": ".into())
        .content_type("application/json")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Invalid request payload");
    let fetched = app.server.get(&format!("/api/questlines/{id}")).await.json::<Value>();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_update_unknown_id_is_404() {
    let app = test_app();
    let response = app
        .server
        .put("/api/questlines/missing")
        .json(&json!({"id": "missing", "name": "x", "quests": [], "dependencies": []}))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_replaces_quests() {
    let app = test_app();
    let created = create_intro(&app).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .server
        .put(&format!("/api/questlines/{id}"))
        .json(&json!({
            "id": id,
            "name": "Renamed",
            "quests": [{"id": "q9", "title": "Only", "position": {"x": 1.5, "y": 2.0}, "color": "blue"}],
            "dependencies": []
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let updated = response.json::<Value>();
    assert_eq!(updated["name"], "Renamed");
    assert_eq!(updated["quests"].as_array().unwrap().len(), 1);
    assert_eq!(updated["quests"][0]["id"], "q9");
    assert_eq!(updated["quests"][0]["position"], json!({"x": 1.5, "y": 2.0}));
    assert_eq!(updated["quests"][0]["color"], "blue");
    assert_eq!(updated["quests"][0]["objectives"], json!([]));
    assert_eq!(updated["created"], created["created"]);
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_delete_unknown_id_succeeds() {
    let app = test_app();
    let response = app.server.delete("/api/questlines/missing").await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_export_json_is_an_attachment() {
    let app = test_app();
    let created = create_intro(&app).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .server
        .get(&format!("/api/questlines/{id}/export"))
        .add_query_param("fmt", "json")
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"Intro.json\"; filename*=UTF-8''Intro.json"
    );
    assert_eq!(response.header("content-type"), "application/json");
    let body = response.text();
    assert!(body.contains("\n  \"id\""));
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), created);
}

#[tokio::test]
async fn test_export_defaults_to_json_and_accepts_format_alias() {
    let app = test_app();
    let created = create_intro(&app).await;
    let id = created["id"].as_str().unwrap();

    let response = app.server.get(&format!("/api/questlines/{id}/export")).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = app
        .server
        .get(&format!("/api/questlines/{id}/export"))
        .add_query_param("format", "json")
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_export_unsupported_format_is_400() {
    let app = test_app();
    let created = create_intro(&app).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .server
        .get(&format!("/api/questlines/{id}/export"))
        .add_query_param("fmt", "xml")
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_export_unknown_id_is_404_even_with_unsupported_format() {
    let app = test_app();
    let response = app
        .server
        .get("/api/questlines/missing/export")
        .add_query_param("fmt", "xml")
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"], "Questline not found");
}

#[tokio::test]
async fn test_export_encodes_non_ascii_file_name() {
    let app = test_app();
    let mut payload = intro_payload();
    payload["name"] = json!("Quête");
    let created = app.server.post("/api/questlines").json(&payload).await.json::<Value>();
    let id = created["id"].as_str().unwrap();

    let response = app.server.get(&format!("/api/questlines/{id}/export")).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"Qu_te.json\"; filename*=UTF-8''Qu%C3%AAte.json"
    );
}

#[tokio::test]
async fn test_export_unknown_id_is_404() {
    let app = test_app();
    let response = app
        .server
        .get("/api/questlines/missing/export")
        .add_query_param("fmt", "json")
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Health and frontend
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_up_reports_database() {
    let app = test_app();
    let response = app.server.get("/api/up").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({"api": true, "db": true}));
}

#[tokio::test]
async fn test_unknown_api_route_is_json_404() {
    let app = test_app();
    let response = app.server.get("/api/nope").await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_wildcard_cors_origin_mirrors_caller() {
    let app = test_app_with(ServerConfig {
        cors_origins: vec!["*".into()],
        ..ServerConfig::default()
    });

    let response = app
        .server
        .get("/api/up")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("http://elsewhere.test"),
        )
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.header("access-control-allow-origin"),
        "http://elsewhere.test"
    );
    assert_eq!(response.header("access-control-allow-credentials"), "true");
}

#[tokio::test]
async fn test_configured_cors_origin_is_the_only_one_allowed() {
    let app = test_app_with(ServerConfig {
        cors_origins: vec!["http://editor.test".into()],
        ..ServerConfig::default()
    });

    let allowed = app
        .server
        .get("/api/up")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("http://editor.test"),
        )
        .await;
    assert_eq!(
        allowed.header("access-control-allow-origin"),
        "http://editor.test"
    );

    let other = app
        .server
        .get("/api/up")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("http://elsewhere.test"),
        )
        .await;
    assert!(other.maybe_header("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_frontend_serves_assets_and_falls_back_to_index() {
    let app = test_app();

    let asset = app.server.get("/assets/app.js").await;
    assert_eq!(asset.status_code(), StatusCode::OK);
    assert_eq!(asset.text(), "console.log(1)");

    let root = app.server.get("/").await;
    assert_eq!(root.status_code(), StatusCode::OK);
    assert_eq!(root.text(), "<html>questlines</html>");

    let client_route = app.server.get("/questlines/some-id/edit").await;
    assert_eq!(client_route.status_code(), StatusCode::OK);
    assert_eq!(client_route.text(), "<html>questlines</html>");
}
