//! Registration, login and bearer token handling.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use shipdesk_integration_tests::{PASSWORD, TestContext, token_of};

#[tokio::test]
async fn register_login_and_me() {
    let ctx = TestContext::spawn().await;

    let response = ctx
        .post("/api/auth/register", None)
        .json(&json!({ "email": "A@X.com", "password": PASSWORD, "full_name": "Alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["email"], "a@x.com");
    assert_eq!(body["user"]["role"], "shipper");
    assert!(body["user"].get("password_hash").is_none());

    let response = ctx
        .post("/api/auth/login", None)
        .json(&json!({ "email": "a@x.com", "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let token = token_of(response).await;

    let me: Value = ctx
        .get("/api/auth/me", Some(&token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["full_name"], "Alice");
    assert_eq!(me["email"], "a@x.com");
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let ctx = TestContext::spawn().await;
    ctx.register("a@x.com", "Alice").await;

    let response = ctx
        .post("/api/auth/register", None)
        .json(&json!({ "email": "a@x.com", "password": PASSWORD, "full_name": "Again" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn registration_reports_every_bad_field() {
    let ctx = TestContext::spawn().await;

    let response = ctx
        .post("/api/auth/register", None)
        .json(&json!({ "email": "nope", "password": "short" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "validation_failed");
    for field in ["email", "password", "full_name"] {
        assert!(body["fields"][field].is_string(), "no error for {field}");
    }
}

#[tokio::test]
async fn wrong_credentials_are_unauthorized() {
    let ctx = TestContext::spawn().await;
    ctx.register("a@x.com", "Alice").await;

    let mut messages = Vec::new();
    for (email, password) in [("a@x.com", "wrong-pass"), ("nobody@x.com", PASSWORD)] {
        let response = ctx
            .post("/api/auth/login", None)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Value = response.json().await.unwrap();
        messages.push(body["message"].clone());
    }
    assert_eq!(messages[0], messages[1]);
}

#[tokio::test]
async fn me_requires_a_valid_token() {
    let ctx = TestContext::spawn().await;

    let response = ctx.get("/api/auth/me", None).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx
        .get("/api/auth/me", Some("not-a-token"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let ctx = TestContext::spawn().await;

    let response = ctx
        .post("/api/auth/login", None)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn login_is_rate_limited() {
    let ctx = TestContext::spawn_with(|config| config.rate_limit = true).await;

    let mut last = StatusCode::OK;
    for _ in 0..8 {
        last = ctx
            .post("/api/auth/login", None)
            .json(&json!({ "email": "a@x.com", "password": "wrong-pass" }))
            .send()
            .await
            .unwrap()
            .status();
        if last == StatusCode::TOO_MANY_REQUESTS {
            break;
        }
    }
    assert_eq!(last, StatusCode::TOO_MANY_REQUESTS);

    let response = ctx
        .post("/api/auth/login", None)
        .json(&json!({ "email": "a@x.com", "password": "wrong-pass" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "rate_limited");
}

#[tokio::test]
async fn responses_carry_security_headers_and_request_id() {
    let ctx = TestContext::spawn().await;

    let response = ctx
        .get("/health", None)
        .header("x-request-id", "req-123")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["x-request-id"], "req-123");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");

    let ready = ctx.get("/health/ready", None).send().await.unwrap();
    assert_eq!(ready.status(), StatusCode::OK);
}
