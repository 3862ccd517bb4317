use super::*;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use courseviewer_core::{HiddenExtensions, StorageMode};
use http_body_util::BodyExt;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    _temp: TempDir,
    base: std::path::PathBuf,
    store: Arc<ReadStatusStore>,
    router: Router,
}

fn create_course(root: &Path) {
    let files: &[(&str, &[u8])] = &[
        ("module1/intro.md", b"# Intro"),
        ("module1/lesson.mp4", &[7u8; 100]),
        ("module1/lesson.srt", b"1\n00:00:01,000 --> 00:00:02,000\nhi"),
        ("notes.txt", b"plain notes"),
    ];
    for (name, bytes) in files {
        let path = root.join(name);
        fs::create_dir_all(path.parent().unwrap()).expect("Failed to create parent dir");
        fs::write(path, bytes).expect("Failed to write file");
    }
}

fn test_app() -> TestApp {
    let temp = TempDir::new().unwrap();
    let base = temp.path().join("course");
    fs::create_dir_all(&base).unwrap();
    create_course(&base);

    let web = temp.path().join("web");
    fs::create_dir_all(web.join("static")).unwrap();
    fs::create_dir_all(web.join("templates")).unwrap();
    fs::write(web.join("static/app.css"), "body {}").unwrap();
    fs::write(web.join("templates/index.html"), "<html>local</html>").unwrap();

    let cfg = Arc::new(CoreConfig::new(&base, HiddenExtensions::parse_list(".srt")).unwrap());
    let store = Arc::new(ReadStatusStore::open(&StorageMode::Memory).unwrap());
    let state = AppState::new(cfg, store.clone(), AssetSource::Local(web));

    TestApp {
        _temp: temp,
        base,
        store,
        router: router(state),
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, header::HeaderMap, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_tree_endpoint_hides_extensions() {
    let app = test_app();

    let (status, _, body) = send(&app.router, get("/api/tree")).await;
    assert_eq!(status, StatusCode::OK);

    let tree: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(tree["name"], "course");
    assert_eq!(tree["path"], "course");
    assert_eq!(tree["isDir"], true);

    let module = &tree["children"][0];
    assert_eq!(module["path"], "module1");
    let names: Vec<&str> = module["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["intro.md", "lesson.mp4"]);

    let leaf = &module["children"][0];
    assert_eq!(leaf["path"], "module1/intro.md");
    assert!(leaf.get("children").is_none());
}

#[tokio::test]
async fn test_content_full_file() {
    let app = test_app();

    let (status, headers, body) = send(&app.router, get("/content/notes.txt")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/plain; charset=utf-8");
    assert_eq!(headers[header::CONTENT_LENGTH], "11");
    assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
    assert!(headers.get(header::CONTENT_RANGE).is_none());
    assert_eq!(body, b"plain notes");
}

#[tokio::test]
async fn test_content_range_request() {
    let app = test_app();
    let data: Vec<u8> = (0..100u8).collect();
    fs::write(app.base.join("module1/lesson.mp4"), &data).unwrap();

    let request = Request::builder()
        .uri("/content/module1/lesson.mp4")
        .header(header::RANGE, "bytes=10-")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(headers[header::CONTENT_RANGE], "bytes 10-99/100");
    assert_eq!(headers[header::CONTENT_LENGTH], "90");
    assert_eq!(headers[header::ACCEPT_RANGES], "bytes");
    assert_eq!(body.len(), 90);
    assert_eq!(body, &data[10..100]);
}

#[tokio::test]
async fn test_content_unsatisfiable_range() {
    let app = test_app();

    let request = Request::builder()
        .uri("/content/module1/lesson.mp4")
        .header(header::RANGE, "bytes=0-1,5-6")
        .body(Body::empty())
        .unwrap();
    let (status, headers, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(headers[header::CONTENT_RANGE], "bytes */100");
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_content_not_found_does_not_leak_paths() {
    let app = test_app();

    let (status, _, body) = send(&app.router, get("/content/module1/missing.md")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let text = String::from_utf8(body).unwrap();
    assert_eq!(text, "File not found");
    assert!(!text.contains(app.base.to_str().unwrap()));
}

#[tokio::test]
async fn test_content_traversal_is_rejected() {
    let app = test_app();
    fs::write(app.base.parent().unwrap().join("secret.txt"), "secret").unwrap();

    for uri in [
        "/content/../secret.txt",
        "/content/module1/../../secret.txt",
        "/content/%2e%2e/secret.txt",
        "/content/..%2Fsecret.txt",
    ] {
        let (status, _, body) = send(&app.router, get(uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_ne!(body, b"secret", "{uri}");
    }
}

#[tokio::test]
async fn test_mark_read_and_read_status() {
    let app = test_app();

    let (status, _, body) = send(&app.router, get("/api/read-status")).await;
    assert_eq!(status, StatusCode::OK);
    let empty: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(empty["paths"], serde_json::json!([]));
    assert!(empty["lastRead"].is_null());

    for path in ["module1/intro.md", "notes.txt", "module1/intro.md"] {
        let (status, _, _) = send(&app.router, post(&format!("/api/mark-read/{path}"))).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(app.store.count().unwrap(), 2);

    let (status, _, body) = send(&app.router, get("/api/read-status")).await;
    assert_eq!(status, StatusCode::OK);
    let res: types::ReadStatusRes = serde_json::from_slice(&body).unwrap();
    assert_eq!(res.paths, vec!["module1/intro.md", "notes.txt"]);
    let last = res.last_read.unwrap();
    assert_eq!(last.path, "module1/intro.md");
}

#[tokio::test]
async fn test_mark_read_decodes_and_validates_path() {
    let app = test_app();

    let (status, _, _) = send(&app.router, post("/api/mark-read/module1%2Fintro.md")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.store.list_read_paths().unwrap(), vec!["module1/intro.md"]);

    let (status, _, _) = send(&app.router, post("/api/mark-read/..%2Fescape.md")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.count().unwrap(), 1);
}

#[tokio::test]
async fn test_health_and_openapi() {
    let app = test_app();

    let (status, _, body) = send(&app.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let health: types::HealthRes = serde_json::from_slice(&body).unwrap();
    assert!(health.ok);

    let (status, _, body) = send(&app.router, get("/api-docs/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(doc["paths"].get("/api/tree").is_some());
    assert!(doc["paths"].get("/api/read-status").is_some());
}

#[tokio::test]
async fn test_local_assets() {
    let app = test_app();

    let (status, _, body) = send(&app.router, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"<html>local</html>");

    let (status, headers, body) = send(&app.router, get("/static/app.css")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/css"));
    assert_eq!(body, b"body {}");
}

#[tokio::test]
async fn test_embedded_assets() {
    let temp = TempDir::new().unwrap();
    let cfg = Arc::new(CoreConfig::new(temp.path(), HiddenExtensions::default()).unwrap());
    let store = Arc::new(ReadStatusStore::open(&StorageMode::Memory).unwrap());
    let router = router(AppState::new(cfg, store, AssetSource::Embedded));

    let (status, headers, body) = send(&router, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(String::from_utf8(body).unwrap().contains("sidebar"));

    let (status, headers, _) = send(&router, get("/static/main.js")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .contains("javascript"));

    let (status, _, _) = send(&router, get("/static/../templates/index.html")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
