//! API integration tests
//!
//! Each test starts the real router on an ephemeral port with its own
//! SQLite file in a temporary directory.

use books_server::{
    api,
    config::{AppConfig, Credential},
    repository,
    repository::Repository,
    AppState,
};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

struct TestServer {
    base_url: String,
    client: Client,
    _dir: TempDir,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(AppConfig::default()).await
    }

    async fn spawn_with(mut config: AppConfig) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        config.database.url = format!("sqlite://{}", dir.path().join("books.db").display());

        let pool = repository::connect(&config.database)
            .await
            .expect("Failed to open database");
        let repository = Repository::new(pool);
        repository
            .ensure_schema()
            .await
            .expect("Failed to create schema");

        let app = api::create_router(AppState::new(config, repository));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("No local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            base_url: format!("http://{}", addr),
            client: Client::new(),
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn create(&self, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/books"))
            .basic_auth("admin", Some("password123"))
            .json(&body)
            .send()
            .await
            .expect("Failed to send request")
    }

    async fn create_ok(&self, body: Value) -> Value {
        let response = self.create(body).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().await.expect("Failed to parse response")
    }
}

fn orwell() -> Value {
    json!({
        "title": "1984",
        "author": "George Orwell",
        "published_date": "1949-06-08",
        "number_of_pages": 328
    })
}

fn timestamp(value: &Value) -> DateTime<Utc> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .expect("Not an RFC 3339 timestamp")
}

fn rejected_fields(body: &Value) -> Vec<String> {
    body["details"]
        .as_array()
        .expect("No validation details")
        .iter()
        .map(|d| d["field"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn test_welcome_and_health() {
    let server = TestServer::spawn().await;

    let response = server.client.get(server.url("/")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["message"].as_str().unwrap().contains("Book Management API"));

    let response = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "API is healthy");
}

#[tokio::test]
async fn test_book_lifecycle() {
    let server = TestServer::spawn().await;

    let created = server.create_ok(orwell()).await;
    let id = created["id"].as_i64().expect("No book ID");
    assert_eq!(created["title"], "1984");
    assert_eq!(created["published_date"], "1949-06-08");
    assert_eq!(created["created_at"], created["updated_at"]);

    let fetched: Value = server
        .client
        .get(server.url(&format!("/api/books/{}", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, created);

    let response = server
        .client
        .put(server.url(&format!("/api/books/{}", id)))
        .basic_auth("user", Some("userpass"))
        .json(&json!({ "number_of_pages": 330 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let fetched: Value = server
        .client
        .get(server.url(&format!("/api/books/{}", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["number_of_pages"], 330);
    assert_eq!(fetched["title"], "1984");
    assert_eq!(fetched["author"], "George Orwell");
    assert_eq!(fetched["published_date"], "1949-06-08");
    assert_eq!(fetched["created_at"], created["created_at"]);
    assert!(timestamp(&fetched["updated_at"]) > timestamp(&created["updated_at"]));

    let response = server
        .client
        .delete(server.url(&format!("/api/books/{}", id)))
        .basic_auth("admin", Some("password123"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["message"],
        format!("Book with id {} was successfully deleted", id)
    );

    let response = server
        .client
        .get(server.url(&format!("/api/books/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_created_ids_are_unique() {
    let server = TestServer::spawn().await;

    let first = server.create_ok(orwell()).await;
    let second = server.create_ok(orwell()).await;
    assert_ne!(first["id"], second["id"]);
}

#[tokio::test]
async fn test_delete_twice() {
    let server = TestServer::spawn().await;
    let id = server.create_ok(orwell()).await["id"].as_i64().unwrap();

    let delete = || {
        server
            .client
            .delete(server.url(&format!("/api/books/{}", id)))
            .basic_auth("admin", Some("password123"))
            .send()
    };

    assert_eq!(delete().await.unwrap().status(), StatusCode::OK);
    let response = delete().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], format!("Book with id {} not found", id));
}

#[tokio::test]
async fn test_mutations_require_credentials() {
    let server = TestServer::spawn().await;

    let response = server
        .client
        .post(server.url("/api/books"))
        .json(&orwell())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()["www-authenticate"], "Basic");

    let response = server
        .client
        .put(server.url("/api/books/1"))
        .json(&json!({ "number_of_pages": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = server
        .client
        .delete(server.url("/api/books/1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_and_unknown_user_are_indistinguishable() {
    let server = TestServer::spawn().await;

    let attempt = |username: &'static str, password: &'static str| {
        server
            .client
            .post(server.url("/api/books"))
            .basic_auth(username, Some(password))
            .json(&orwell())
            .send()
    };

    let wrong_password = attempt("admin", "wrong").await.unwrap();
    let unknown_user = attempt("mallory", "password123").await.unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

    let wrong_password: Value = wrong_password.json().await.unwrap();
    let unknown_user: Value = unknown_user.json().await.unwrap();
    assert_eq!(wrong_password, unknown_user);
    assert_eq!(wrong_password["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_create_validation() {
    let server = TestServer::spawn().await;

    for pages in [0, -10] {
        let mut body = orwell();
        body["number_of_pages"] = json!(pages);
        let response = server.create(body).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json().await.unwrap();
        assert_eq!(rejected_fields(&body), vec!["number_of_pages"]);
    }

    let response = server
        .create(json!({
            "title": "",
            "author": "x".repeat(101),
            "published_date": "not-a-date",
            "number_of_pages": 1
        }))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(rejected_fields(&body), vec!["author", "published_date", "title"]);

    let response = server.create(json!({ "title": "Missing fields" })).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let list: Value = server
        .client
        .get(server.url("/api/books"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn test_update_validation_and_not_found() {
    let server = TestServer::spawn().await;
    let created = server.create_ok(orwell()).await;
    let id = created["id"].as_i64().unwrap();

    let put = |id: i64, body: Value| {
        server
            .client
            .put(server.url(&format!("/api/books/{}", id)))
            .basic_auth("admin", Some("password123"))
            .json(&body)
            .send()
    };

    for body in [
        json!({ "number_of_pages": 0 }),
        json!({ "number_of_pages": -1 }),
        json!({ "title": null }),
        json!({ "title": "" }),
    ] {
        let response = put(id, body).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    let unchanged: Value = server
        .client
        .get(server.url(&format!("/api/books/{}", id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(unchanged, created);

    let response = put(id + 1000, json!({ "number_of_pages": 10 })).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pagination() {
    let server = TestServer::spawn().await;
    for n in 0..25 {
        let mut body = orwell();
        body["title"] = json!(format!("Book {}", n));
        server.create_ok(body).await;
    }

    let list = |query: &'static str| {
        server
            .client
            .get(server.url(&format!("/api/books{}", query)))
            .send()
    };

    let response = list("").await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["books"].as_array().unwrap().len(), 10);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 10);
    assert_eq!(body["total"], 25);
    assert_eq!(body["total_pages"], 3);

    let body: Value = list("?page=3&page_size=10").await.unwrap().json().await.unwrap();
    let books = body["books"].as_array().unwrap();
    assert_eq!(books.len(), 5);
    assert_eq!(books[0]["title"], "Book 20");

    let body: Value = list("?page=10&page_size=10").await.unwrap().json().await.unwrap();
    assert!(body["books"].as_array().unwrap().is_empty());
    assert_eq!(body["total"], 25);

    for query in ["?page=0", "?page_size=0", "?page_size=101", "?page=abc"] {
        let response = list(query).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{}", query);
    }
}

#[tokio::test]
async fn test_non_numeric_id_is_rejected() {
    let server = TestServer::spawn().await;

    let response = server
        .client
        .get(server.url("/api/books/abc"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let server = TestServer::spawn().await;

    let response = server
        .client
        .get(server.url("/openapi.json"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert!(body["paths"]["/api/books/{id}"].is_object());
}

#[tokio::test]
async fn test_configured_credentials_replace_defaults() {
    let mut config = AppConfig::default();
    config.auth.credentials = vec![Credential {
        username: "librarian".to_string(),
        password: "shelves".to_string(),
    }];
    let server = TestServer::spawn_with(config).await;

    let post = |username: &'static str, password: &'static str| {
        server
            .client
            .post(server.url("/api/books"))
            .basic_auth(username, Some(password))
            .json(&orwell())
            .send()
    };

    assert_eq!(post("librarian", "shelves").await.unwrap().status(), StatusCode::CREATED);
    assert_eq!(
        post("admin", "password123").await.unwrap().status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_cors_and_compression_layers_are_applied() {
    let server = TestServer::spawn().await;
    for n in 0..30 {
        let mut body = orwell();
        body["title"] = json!(format!("Book {}", n));
        server.create_ok(body).await;
    }

    let response = server
        .client
        .get(server.url("/api/books?page_size=30"))
        .header("Origin", "http://example.com")
        .header("Accept-Encoding", "gzip")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(response.headers()["content-encoding"], "gzip");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_all_succeed() {
    let server = TestServer::spawn().await;
    let shared = server.create_ok(orwell()).await["id"].as_i64().unwrap();
    let mut others = Vec::new();
    for n in 0..10 {
        let mut body = orwell();
        body["title"] = json!(format!("Book {}", n));
        others.push(server.create_ok(body).await["id"].as_i64().unwrap());
    }

    let mut tasks = Vec::new();
    for n in 0..40i64 {
        let client = server.client.clone();
        let id = if n % 2 == 0 { shared } else { others[(n as usize / 2) % others.len()] };
        let url = server.url(&format!("/api/books/{}", id));
        tasks.push(tokio::spawn(async move {
            client
                .put(url)
                .basic_auth("admin", Some("password123"))
                .json(&json!({ "number_of_pages": n + 1 }))
                .send()
                .await
                .map(|response| response.status())
        }));
    }

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), StatusCode::OK);
    }

    let fetched: Value = server
        .client
        .get(server.url(&format!("/api/books/{}", shared)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let pages = fetched["number_of_pages"].as_i64().unwrap();
    assert!(pages % 2 == 1 && (1..=40).contains(&pages));
}
