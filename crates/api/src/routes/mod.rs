//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Readiness (store reachable)
//!
//! # Accounts (register/login rate limited)
//! POST /api/auth/register               - Create a shipper account
//! POST /api/auth/login                  - Exchange credentials for a token
//! GET  /api/auth/me                     - Current user
//!
//! # Shipping (bearer token, owner-scoped)
//! GET  /api/carriers                    - Active carriers (public)
//! POST /api/quotes                      - Price a carrier and options (public)
//! GET  /api/addresses                   - Address book
//! POST /api/addresses                   - Add an address
//! GET  /api/shipments                   - Own shipments, newest first
//! POST /api/shipments                   - Create a shipment
//! GET  /api/shipments/stats             - Dashboard counters
//! GET  /api/shipments/{id}              - One shipment with its events
//! POST /api/shipments/{id}/status       - Status change
//!
//! # Public tracking (rate limited)
//! GET  /api/tracking?number=            - Shipment and events, or null
//!
//! # Content (public reads, admin writes)
//! GET  /api/site-settings               PUT (admin)
//! GET  /api/hero-slides                 POST (admin), DELETE /{id} (admin)
//! GET  /api/clients                     POST (admin), DELETE /{id} (admin)
//! GET  /api/content-sections            POST (admin)
//! GET  /api/content-sections/{slug}     PUT|DELETE /{id} (admin)
//! ```

pub mod addresses;
pub mod auth;
pub mod carriers;
pub mod content;
pub mod health;
pub mod shipments;
pub mod tracking;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::middleware::rate_limit::{
    ClientIpKeyExtractor, RateLimiterLayer, auth_rate_limiter, rate_limited_json,
    tracking_rate_limiter,
};
use crate::state::AppState;

/// Apply a rate limiter to every route of `router`. `None` turns limits off.
fn rate_limited(
    router: Router<AppState>,
    limits: Option<&ClientIpKeyExtractor>,
    limiter: fn(ClientIpKeyExtractor) -> Option<RateLimiterLayer>,
) -> Router<AppState> {
    let Some(key) = limits else {
        return router;
    };
    match limiter(key.clone()) {
        Some(layer) => router
            .route_layer(layer)
            .route_layer(axum::middleware::map_response(rate_limited_json)),
        None => {
            tracing::warn!("Rate limiter configuration rejected, serving without limits");
            router
        }
    }
}

/// Create the account routes router.
pub fn auth_routes(limits: Option<&ClientIpKeyExtractor>) -> Router<AppState> {
    let limited = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    rate_limited(limited, limits, auth_rate_limiter).route("/me", get(auth::me))
}

/// Create the shipment routes router.
pub fn shipment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(shipments::index).post(shipments::create))
        .route("/stats", get(shipments::stats))
        .route("/{id}", get(shipments::show))
        .route("/{id}/status", post(shipments::update_status))
}

/// Create the content routes router.
pub fn content_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/site-settings",
            get(content::site_settings).put(content::update_site_settings),
        )
        .route(
            "/hero-slides",
            get(content::hero_slides).post(content::create_hero_slide),
        )
        .route("/hero-slides/{id}", delete(content::delete_hero_slide))
        .route(
            "/clients",
            get(content::client_logos).post(content::create_client_logo),
        )
        .route("/clients/{id}", delete(content::delete_client_logo))
        .route(
            "/content-sections",
            get(content::content_sections).post(content::create_content_section),
        )
        .route(
            "/content-sections/{key}",
            get(content::content_section)
                .put(content::update_content_section)
                .delete(content::delete_content_section),
        )
}

/// Create all routes for the API. `limits` keys the per-IP rate limits;
/// `None` disables them.
pub fn routes(limits: Option<&ClientIpKeyExtractor>) -> Router<AppState> {
    let tracking = rate_limited(
        Router::new().route("/tracking", get(tracking::lookup)),
        limits,
        tracking_rate_limiter,
    );

    let api = Router::new()
        .nest("/auth", auth_routes(limits))
        .nest("/shipments", shipment_routes())
        .route("/carriers", get(carriers::index))
        .route("/quotes", post(carriers::quote))
        .route("/addresses", get(addresses::index).post(addresses::create))
        .merge(tracking)
        .merge(content_routes());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api)
}
