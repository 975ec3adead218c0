//! Public content reads and admin-only writes.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use shipdesk_api::db::UserStore;
use shipdesk_core::{Email, UserRole};
use shipdesk_integration_tests::TestContext;

async fn body(response: reqwest::Response) -> Value {
    response.json().await.unwrap()
}

#[tokio::test]
async fn writes_need_an_admin() {
    let ctx = TestContext::spawn().await;
    let shipper = ctx.register("a@x.com", "Alice").await;
    let slide = json!({ "title": "Fast", "image_url": "/img/1.jpg" });

    let response = ctx.post("/api/hero-slides", None).json(&slide).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx
        .post("/api/hero-slides", Some(&shipper))
        .json(&slide)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body(response).await["error"], "forbidden");

    let response = ctx
        .put("/api/site-settings", Some(&shipper))
        .json(&json!({ "company_name": "Shipdesk" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let slides = body(ctx.get("/api/hero-slides", None).send().await.unwrap()).await;
    assert_eq!(slides, json!([]));
}

#[tokio::test]
async fn site_settings_are_null_until_saved() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.user_with_role("admin@x.com", UserRole::Admin).await;

    let settings = body(ctx.get("/api/site-settings", None).send().await.unwrap()).await;
    assert_eq!(settings, Value::Null);

    let response = ctx
        .put("/api/site-settings", Some(&admin))
        .json(&json!({ "company_name": " " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(response).await["fields"]["company_name"], "is required");

    for name in ["Shipdesk", "Shipdesk Logistics"] {
        let response = ctx
            .put("/api/site-settings", Some(&admin))
            .json(&json!({
                "company_name": name,
                "social_links": { "x": "https://x.com/shipdesk" },
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let settings = body(ctx.get("/api/site-settings", None).send().await.unwrap()).await;
    assert_eq!(settings["company_name"], "Shipdesk Logistics");
    assert_eq!(settings["social_links"]["x"], "https://x.com/shipdesk");
}

#[tokio::test]
async fn hero_slides_and_clients() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.user_with_role("admin@x.com", UserRole::Admin).await;

    for (title, order, active) in [("Second", 2, true), ("First", 1, true), ("Hidden", 0, false)] {
        let response = ctx
            .post("/api/hero-slides", Some(&admin))
            .json(&json!({
                "title": title,
                "image_url": "/img/slide.jpg",
                "sort_order": order,
                "is_active": active,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let slides = body(ctx.get("/api/hero-slides", None).send().await.unwrap()).await;
    let titles: Vec<&str> = slides
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["First", "Second"]);

    let response = ctx
        .post("/api/clients", Some(&admin))
        .json(&json!({ "name": "Aramco", "logo_url": "/img/aramco.svg" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let client = body(response).await;
    let id = client["id"].as_str().unwrap();

    let path = format!("/api/clients/{id}");
    let response = ctx.delete(&path, Some(&admin)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = ctx.delete(&path, Some(&admin)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let clients = body(ctx.get("/api/clients", None).send().await.unwrap()).await;
    assert_eq!(clients, json!([]));
}

#[tokio::test]
async fn content_sections_lifecycle() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.user_with_role("admin@x.com", UserRole::Admin).await;

    let response = ctx
        .post("/api/content-sections", Some(&admin))
        .json(&json!({ "slug": "About-Us", "title": "About us", "body_html": "<p>Hi</p>" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let section = body(response).await;
    assert_eq!(section["slug"], "about-us");
    let id = section["id"].as_str().unwrap().to_owned();

    let response = ctx
        .post("/api/content-sections", Some(&admin))
        .json(&json!({ "slug": "about-us", "title": "Again" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx
        .post("/api/content-sections", Some(&admin))
        .json(&json!({ "slug": "no spaces", "title": "Bad" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let found = body(
        ctx.get("/api/content-sections/about-us", None)
            .send()
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(found["body_html"], "<p>Hi</p>");

    let response = ctx
        .put(&format!("/api/content-sections/{id}"), Some(&admin))
        .json(&json!({ "slug": "about-us", "title": "About us", "is_published": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .get("/api/content-sections/about-us", None)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let listed = body(ctx.get("/api/content-sections", None).send().await.unwrap()).await;
    assert_eq!(listed, json!([]));

    let path = format!("/api/content-sections/{id}");
    let response = ctx.delete(&path, Some(&admin)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = ctx.delete(&path, Some(&admin)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .put("/api/content-sections/not-a-uuid", Some(&admin))
        .json(&json!({ "slug": "x", "title": "X" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn demoted_admins_lose_access_immediately() {
    let ctx = TestContext::spawn().await;
    let admin = ctx.user_with_role("admin@x.com", UserRole::Admin).await;
    let settings = json!({ "company_name": "Shipdesk" });

    let response = ctx
        .put("/api/site-settings", Some(&admin))
        .json(&settings)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    ctx.state
        .store()
        .set_user_role(&Email::parse("admin@x.com").unwrap(), UserRole::Shipper)
        .await
        .unwrap();

    let response = ctx
        .put("/api/site-settings", Some(&admin))
        .json(&settings)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let me = body(ctx.get("/api/auth/me", Some(&admin)).send().await.unwrap()).await;
    assert_eq!(me["role"], "shipper");
}
