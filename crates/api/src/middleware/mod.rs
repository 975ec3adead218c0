//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with method, uri, status, latency)
//! 3. Request ID (record on the span, echo in the response)
//! 4. CORS
//! 5. Security headers
//! 6. Rate limiting (auth and tracking routes only)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{AuthUser, RequireAdmin, RequireAuth};
pub use rate_limit::{
    ClientIpKeyExtractor, auth_rate_limiter, rate_limited_json, tracking_rate_limiter,
};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
