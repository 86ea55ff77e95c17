//! End-to-end tests against PostgreSQL and the local filesystem.
//!
//! Run with: `cargo test -p videostore-api --test postgres_test`
//! Requires Docker for testcontainers (Postgres). Set `SKIP_POSTGRES_TESTS=1`
//! to skip; tests also skip when the container cannot be started.

mod helpers;

use helpers::fixtures::{mp4_bytes, upload_form};
use helpers::{api_path, build_server, create_test_config};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tempfile::TempDir;
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use videostore_api::setup::database::run_migrations;
use videostore_db::PgFileRepository;
use videostore_storage::LocalStorage;

const HOST: &str = "localhost:8080";

struct PgTestApp {
    server: axum_test::TestServer,
    temp_dir: TempDir,
    _container: ContainerAsync<Postgres>,
}

impl PgTestApp {
    fn storage_dir(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("videos")
    }
}

async fn setup_pg_app() -> Option<PgTestApp> {
    if std::env::var("SKIP_POSTGRES_TESTS").is_ok() {
        eprintln!("SKIP_POSTGRES_TESTS set, skipping");
        return None;
    }

    let container = match Postgres::default().with_tag("15-alpine").start().await {
        Ok(container) => container,
        Err(e) => {
            eprintln!("Failed to start PostgreSQL container, skipping: {e}");
            return None;
        }
    };

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");
    let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to test database");
    run_migrations(&pool).await.expect("Failed to run migrations");

    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let storage_path = temp_dir.path().join("videos");
    let config = create_test_config(&url, &storage_path.to_string_lossy());

    let server = build_server(
        &config,
        Arc::new(PgFileRepository::new(pool)),
        Arc::new(LocalStorage::new(storage_path)),
    );

    Some(PgTestApp {
        server,
        temp_dir,
        _container: container,
    })
}

#[tokio::test]
async fn test_upload_duplicate_delete_roundtrip() {
    let Some(app) = setup_pg_app().await else {
        return;
    };
    let client = &app.server;

    let response = client
        .post(&api_path("/files"))
        .add_header("Host", HOST)
        .multipart(upload_form("sample.mp4", mp4_bytes(2848208), "video/mp4"))
        .await;
    assert_eq!(response.status_code(), 201);
    assert_eq!(
        response.header("location"),
        "localhost:8080/v1/files/sample.mp4"
    );

    let response = client
        .post(&api_path("/files"))
        .add_header("Host", HOST)
        .multipart(upload_form("sample.mp4", mp4_bytes(100), "video/mp4"))
        .await;
    assert_eq!(response.status_code(), 409);
    assert!(app.storage_dir().join("sample.mp4").exists());
    assert_eq!(
        std::fs::metadata(app.storage_dir().join("sample.mp4"))
            .unwrap()
            .len(),
        2848208
    );

    let files: Vec<Value> = client.get(&api_path("/files")).await.json();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["size"], 2848208);

    let response = client.delete(&api_path("/files/sample.mp4")).await;
    assert_eq!(response.status_code(), 204);
    assert!(!app.storage_dir().join("sample.mp4").exists());

    let response = client.delete(&api_path("/files/sample.mp4")).await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_delete_with_missing_file_restores_record() {
    let Some(app) = setup_pg_app().await else {
        return;
    };
    let client = &app.server;

    client
        .post(&api_path("/files"))
        .add_header("Host", HOST)
        .multipart(upload_form("clip.mp4", mp4_bytes(512), "video/mp4"))
        .await;
    let before: Vec<Value> = client.get(&api_path("/files")).await.json();

    std::fs::remove_file(app.storage_dir().join("clip.mp4")).unwrap();

    let response = client.delete(&api_path("/files/clip.mp4")).await;
    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["code"], "STORAGE_DELETE_FAILED");

    // Restored with its original timestamp
    let after: Vec<Value> = client.get(&api_path("/files")).await.json();
    assert_eq!(after, before);
}
