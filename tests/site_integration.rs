mod common;

use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use tower::ServiceExt;

use common::{body_text, build_app, get, post_form, session_cookie};

#[tokio::test]
async fn first_visit_starts_a_session_on_the_welcome_page() {
    let app = build_app(200, r#"{"role": "admin"}"#).await;

    let response = app.router.clone().oneshot(get("/", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    assert!(cookie.starts_with("session_id="));
    let body = body_text(response).await;
    assert!(body.contains("<p>Welcome Page</p>"));
    assert!(body.contains("Please login to view all projects and functionality"));
}

#[tokio::test]
async fn returning_session_is_not_issued_a_new_cookie() {
    let app = build_app(200, r#"{"role": "admin"}"#).await;

    let first = app.router.clone().oneshot(get("/", None)).await.unwrap();
    let cookie = session_cookie(&first);

    let second = app
        .router
        .clone()
        .oneshot(get("/", Some(&cookie)))
        .await
        .unwrap();
    assert!(second.headers().get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn patient_data_flow_fetches_once_per_session() {
    let app = build_app(200, r#"{"role": "admin"}"#).await;
    let first = app.router.clone().oneshot(get("/", None)).await.unwrap();
    let cookie = session_cookie(&first);

    let response = app
        .router
        .clone()
        .oneshot(post_form("/view", "view=mimic-iii", Some(&cookie)))
        .await
        .unwrap();
    let body = body_text(response).await;
    assert!(body.contains("Please login to view this project&#39;s data"));
    assert_eq!(app.bucket.list_calls(), 0);

    let response = app
        .router
        .clone()
        .oneshot(post_form(
            "/login",
            "username=eric&password=s3cr3t",
            Some(&cookie),
        ))
        .await
        .unwrap();
    let body = body_text(response).await;
    assert!(body.contains("You are logged in"));
    assert!(body.contains("Role: admin"));
    assert!(body.contains("<h1>MIMIC-III Patient Data</h1>"));
    assert!(body.contains("1 tables loaded"));
    assert!(body.contains("<h2>PATIENTS.csv</h2>"));
    assert!(body.contains("2 rows x 3 columns"));

    let response = app
        .router
        .clone()
        .oneshot(get("/", Some(&cookie)))
        .await
        .unwrap();
    let body = body_text(response).await;
    assert!(body.contains("<h2>PATIENTS.csv</h2>"));
    assert_eq!(app.bucket.list_calls(), 1);
}

#[tokio::test]
async fn failed_login_shows_the_http_error() {
    let app = build_app(500, "").await;

    let response = app
        .router
        .clone()
        .oneshot(post_form("/login", "username=eric&password=wrong", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("HTTP error occurred: 500 - Internal Server Error"));
    assert!(!body.contains("You are logged in"));
}

#[tokio::test]
async fn sessions_do_not_share_login_state() {
    let app = build_app(200, r#"{"role": "admin"}"#).await;

    let logged_in = app
        .router
        .clone()
        .oneshot(post_form("/login", "username=eric&password=s3cr3t", None))
        .await
        .unwrap();
    let cookie = session_cookie(&logged_in);
    assert!(body_text(logged_in).await.contains("You are logged in"));

    let other = app.router.clone().oneshot(get("/", None)).await.unwrap();
    assert_ne!(session_cookie(&other), cookie);
    assert!(!body_text(other).await.contains("You are logged in"));
}

#[tokio::test]
async fn logout_keeps_cached_data_for_the_next_login() {
    let app = build_app(200, r#"{"role": "admin"}"#).await;
    let first = app
        .router
        .clone()
        .oneshot(post_form("/login", "username=eric&password=s3cr3t", None))
        .await
        .unwrap();
    let cookie = session_cookie(&first);

    app.router
        .clone()
        .oneshot(post_form("/view", "view=mimic-iii", Some(&cookie)))
        .await
        .unwrap();
    let response = app
        .router
        .clone()
        .oneshot(post_form("/logout", "", Some(&cookie)))
        .await
        .unwrap();
    assert!(body_text(response)
        .await
        .contains("Please login to view this project&#39;s data"));

    let response = app
        .router
        .clone()
        .oneshot(post_form(
            "/login",
            "username=eric&password=s3cr3t",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert!(body_text(response).await.contains("<h2>PATIENTS.csv</h2>"));
    assert_eq!(app.bucket.list_calls(), 1);
}

#[tokio::test]
async fn unknown_view_is_a_bad_request() {
    let app = build_app(200, r#"{"role": "admin"}"#).await;

    let response = app
        .router
        .clone()
        .oneshot(post_form("/view", "view=admin-panel", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_text(response).await;
    assert!(body.contains("Unknown view 'admin-panel'"));
}

#[tokio::test]
async fn health_check_returns_ok() {
    let app = build_app(200, r#"{"role": "admin"}"#).await;

    let response = app.router.clone().oneshot(get("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");
}
