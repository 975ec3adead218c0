//! Shipdesk API library.
//!
//! This crate provides the REST service as a library so that the binary,
//! the CLI and the integration tests share one router.
//!
//! # Architecture
//!
//! - `routes` - Axum handlers, JSON in and out
//! - `services` - Validation, authorization and the shipment lifecycle
//! - `db` - The [`db::Store`] trait with `PostgreSQL` and in-memory backends
//! - `middleware` - Bearer auth extractors, request ids, rate limits, headers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use middleware::ClientIpKeyExtractor;
use state::AppState;

/// Build the complete application: routes, middleware and state.
///
/// The Sentry layers are added by the binary, which owns the Sentry client.
pub fn router(state: AppState) -> Router {
    let config = state.config();
    let limits = config
        .rate_limit
        .then(|| ClientIpKeyExtractor::new(&config.trusted_proxies));
    let cors = cors_layer(&config.cors_origins);

    routes::routes(limits.as_ref())
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(cors)
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// CORS for the configured origins. No origins means no cross-origin access.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::config::ApiConfig;
    use crate::db::MemoryStore;

    fn app(configure: impl FnOnce(&mut ApiConfig)) -> Router {
        let mut config =
            ApiConfig::with_defaults("postgres://unused", "k3P!x9Qz@2Lm#8Vb$5Nr^1Wt&7Yc*4Hd");
        configure(&mut config);
        router(AppState::new(config, Arc::new(MemoryStore::new())).unwrap())
    }

    #[tokio::test]
    async fn health_carries_request_id_and_headers() {
        let response = app(|_| {})
            .oneshot(
                Request::get("/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-request-id"], "abc-123");
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert_eq!(response.headers()["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn cors_allows_only_configured_origins() {
        let preflight = |origin: &'static str| {
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/carriers")
                .header(header::ORIGIN, origin)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap()
        };
        let app = app(|config| {
            config.cors_origins = vec!["https://shipdesk.example".to_owned()];
        });

        let allowed = app
            .clone()
            .oneshot(preflight("https://shipdesk.example"))
            .await
            .unwrap();
        assert_eq!(
            allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://shipdesk.example"
        );

        let denied = app.oneshot(preflight("https://evil.example")).await.unwrap();
        assert!(
            !denied
                .headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
    }
}
