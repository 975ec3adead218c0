//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - `auth_rate_limiter`: login and registration (~10/min per IP)
//! - `tracking_rate_limiter`: public tracking lookups (~60/min per IP)
//!
//! The client IP is the TCP peer unless the peer is listed in
//! `SHIPDESK_TRUSTED_PROXIES`.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::ConnectInfo,
    http::{HeaderName, Request, StatusCode},
    response::{IntoResponse, Response},
};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::error::AppError;

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Key extractor for the client address.
///
/// Forwarding headers (`CF-Connecting-IP`, `X-Forwarded-For`, `X-Real-IP`)
/// are only believed when the peer is a trusted proxy; everyone else is
/// keyed on the peer address.
#[derive(Clone, Default)]
pub struct ClientIpKeyExtractor {
    trusted_proxies: Arc<[IpAddr]>,
}

impl ClientIpKeyExtractor {
    #[must_use]
    pub fn new(trusted_proxies: &[IpAddr]) -> Self {
        Self {
            trusted_proxies: trusted_proxies.into(),
        }
    }

    fn trusts(&self, peer: IpAddr) -> bool {
        self.trusted_proxies.contains(&peer)
    }
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)?;
        if !self.trusts(peer) {
            return Ok(peer);
        }

        let headers = req.headers();
        let header_ip = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        };

        Ok(header_ip("cf-connecting-ip")
            .or_else(|| header_ip("x-forwarded-for"))
            .or_else(|| header_ip("x-real-ip"))
            .unwrap_or(peer))
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

fn limiter(
    key: ClientIpKeyExtractor,
    replenish_every_secs: u64,
    burst: u32,
) -> Option<RateLimiterLayer> {
    let config = GovernorConfigBuilder::default()
        .key_extractor(key)
        .per_second(replenish_every_secs)
        .burst_size(burst)
        .finish()?;
    Some(GovernorLayer::new(Arc::new(config)))
}

/// Auth endpoints: one token every 6 seconds, burst of 5.
#[must_use]
pub fn auth_rate_limiter(key: ClientIpKeyExtractor) -> Option<RateLimiterLayer> {
    limiter(key, 6, 5)
}

/// Tracking lookups: one token per second, burst of 30.
#[must_use]
pub fn tracking_rate_limiter(key: ClientIpKeyExtractor) -> Option<RateLimiterLayer> {
    limiter(key, 1, 30)
}

/// Headers the limiter sets that survive the rewrite below.
const RETRY_HEADERS: [&str; 2] = ["retry-after", "x-ratelimit-after"];

/// Turn the limiter's plain-text 429 into the API's JSON error shape.
pub async fn rate_limited_json(response: Response) -> Response {
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return response;
    }

    let mut json = AppError::RateLimited.into_response();
    for name in RETRY_HEADERS {
        if let Some(value) = response.headers().get(name) {
            json.headers_mut()
                .insert(HeaderName::from_static(name), value.clone());
        }
    }
    json
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tower_governor::key_extractor::KeyExtractor;

    const PROXY: [u8; 4] = [10, 0, 0, 2];

    fn request(peer: [u8; 4], headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder().uri("/api/tracking");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let mut req = builder.body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 4000))));
        req
    }

    fn behind_proxy() -> ClientIpKeyExtractor {
        ClientIpKeyExtractor::new(&[IpAddr::from(PROXY)])
    }

    #[test]
    fn untrusted_peers_cannot_choose_their_key() {
        let key = behind_proxy();
        for forwarded in ["198.51.100.4", "198.51.100.5", "203.0.113.9"] {
            let req = request(
                [192, 0, 2, 7],
                &[
                    ("x-forwarded-for", forwarded),
                    ("cf-connecting-ip", forwarded),
                    ("x-real-ip", forwarded),
                ],
            );
            assert_eq!(key.extract(&req).unwrap(), IpAddr::from([192, 0, 2, 7]));
        }

        let req = request(PROXY, &[("x-forwarded-for", "198.51.100.4")]);
        let untrusting = ClientIpKeyExtractor::default();
        assert_eq!(untrusting.extract(&req).unwrap(), IpAddr::from(PROXY));
    }

    #[test]
    fn trusted_proxy_prefers_cloudflare_header() {
        let req = request(
            PROXY,
            &[
                ("x-forwarded-for", "10.0.0.1, 10.0.0.2"),
                ("cf-connecting-ip", "203.0.113.9"),
            ],
        );
        let ip = behind_proxy().extract(&req).unwrap();
        assert_eq!(ip, "203.0.113.9".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn trusted_proxy_first_forwarded_address() {
        let req = request(PROXY, &[("x-forwarded-for", "198.51.100.4, 10.0.0.2")]);
        let ip = behind_proxy().extract(&req).unwrap();
        assert_eq!(ip, "198.51.100.4".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn trusted_proxy_without_usable_header_is_the_key() {
        let req = request(PROXY, &[("x-real-ip", "not-an-ip")]);
        assert_eq!(behind_proxy().extract(&req).unwrap(), IpAddr::from(PROXY));

        let bare = Request::builder().body(()).unwrap();
        assert!(behind_proxy().extract(&bare).is_err());
    }

    #[test]
    fn limiters_build() {
        assert!(auth_rate_limiter(ClientIpKeyExtractor::default()).is_some());
        assert!(tracking_rate_limiter(ClientIpKeyExtractor::default()).is_some());
    }

    #[tokio::test]
    async fn rewrites_only_429s() {
        let ok = rate_limited_json(StatusCode::OK.into_response()).await;
        assert_eq!(ok.status(), StatusCode::OK);

        let mut limited = (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests!").into_response();
        limited
            .headers_mut()
            .insert("retry-after", "6".parse().unwrap());
        let rewritten = rate_limited_json(limited).await;
        assert_eq!(rewritten.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(rewritten.headers()["retry-after"], "6");
        assert_eq!(
            rewritten.headers()["content-type"],
            "application/json"
        );
    }
}
