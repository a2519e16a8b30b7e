#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Method, Request, Response};
use axum::Router;
use figment::providers::{Format, Yaml};
use figment::Figment;
use mockito::{Mock, Server, ServerGuard};
use portfolio::config::Settings;
use portfolio::routes::create_router;
use portfolio::startup::build_state;
use portfolio::store::{MemoryBucket, MemorySecretStore, MemoryStorage};

pub const SECRET_PATH: &str = "projects/portfolio/secrets/app-config/versions/latest";
pub const PATIENTS_CSV: &str = "subject_id,gender,age\n1,F,40\n2,M,51\n";

pub struct TestApp {
    pub router: Router,
    pub bucket: Arc<MemoryBucket>,
    _auth: Mock,
    _server: ServerGuard,
}

pub fn test_settings() -> Settings {
    Settings::from_figment(Figment::new().merge(Yaml::string(&format!(
        r#"
secret_path: "{}"
auth:
  timeout_in_ms: 3000
dataset:
  preview_rows: 5
"#,
        SECRET_PATH
    ))))
    .expect("Failed to parse test settings YAML")
}

pub fn secret_payload(auth_url: &str) -> String {
    format!(
        r#"{{"storage_bucket_name": "portfolio-data", "user_auth_api": "{}", "dataset_paths": {{"MIMICIII": "mimic-iii/"}}}}"#,
        auth_url
    )
}

/// Builds the router against in-memory storage and a mock auth API that
/// answers every login with `auth_status` and `auth_body`.
pub async fn build_app(auth_status: usize, auth_body: &str) -> TestApp {
    let mut server = Server::new_async().await;
    let auth = server
        .mock("POST", "/login")
        .with_status(auth_status)
        .with_header("content-type", "application/json")
        .with_body(auth_body)
        .create_async()
        .await;

    let bucket = Arc::new(
        MemoryBucket::new("portfolio-data")
            .with_object("mimic-iii/PATIENTS.csv", PATIENTS_CSV)
            .with_object("mimic-iii/README.md", "# MIMIC-III"),
    );
    let storage = MemoryStorage::new().with_bucket(bucket.clone());
    let secrets = MemorySecretStore::new().with_secret(
        SECRET_PATH,
        secret_payload(&format!("{}/login", server.url())).into_bytes(),
    );

    let state = build_state(&test_settings(), &secrets, &storage)
        .await
        .expect("state should build");

    TestApp {
        router: create_router(state),
        bucket,
        _auth: auth,
        _server: server,
    }
}

pub fn get(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("failed to build request")
}

pub fn post_form(path: &str, form: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder
        .body(Body::from(form.to_string()))
        .expect("failed to build request")
}

/// The `name=value` part of the session cookie set on `response`.
pub fn session_cookie(response: &Response<Body>) -> String {
    let header = response
        .headers()
        .get(SET_COOKIE)
        .expect("response should set a session cookie")
        .to_str()
        .expect("cookie should be ASCII");
    header
        .split(';')
        .next()
        .expect("cookie should have a value")
        .to_string()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}
