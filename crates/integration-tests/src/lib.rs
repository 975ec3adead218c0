//! Integration tests for Shipdesk.
//!
//! Each test spawns the real router on `127.0.0.1:0`, backed by a
//! [`MemoryStore`] with fixture carriers, and talks to it over HTTP with
//! `reqwest`. No database or external service is needed:
//!
//! ```bash
//! cargo test -p shipdesk-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth` - Registration, login, bearer tokens
//! - `shipments` - Creation, cost, ownership, status changes
//! - `tracking` - Public lookup
//! - `content` - Public content reads, admin-only writes

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use shipdesk_api::config::ApiConfig;
use shipdesk_api::db::MemoryStore;
use shipdesk_api::models::NewCarrier;
use shipdesk_api::services::{AuthService, Registration};
use shipdesk_api::state::AppState;
use shipdesk_core::{CarrierId, UserRole};

/// Signing secret for test tokens.
pub const TEST_SECRET: &str = "k3P!x9Qz@2Lm#8Vb$5Nr^1Wt&7Yc*4Hd";

/// Password used for every test account.
pub const PASSWORD: &str = "pw123456";

/// Carriers every test server starts with.
///
/// | id | base rate | services | active |
/// |---|---|---|---|
/// | `carrier-1` | 20.00 | standard, express | yes |
/// | `carrier-2` | 15.50 | standard | yes |
/// | `carrier-3` | 32.75 | any | yes |
/// | `retired` | 9.00 | standard | no |
#[must_use]
pub fn fixture_carriers() -> Vec<NewCarrier> {
    let carrier = |id: &str, name: &str, rate: &str, services: &[&str], active: bool| NewCarrier {
        id: CarrierId::parse(id).expect("fixture carrier id"),
        name: name.to_owned(),
        base_rate: Decimal::from_str(rate).expect("fixture base rate"),
        service_types: services.iter().map(|s| (*s).to_owned()).collect(),
        is_active: active,
    };

    vec![
        carrier("carrier-1", "Gulf Express", "20.00", &["standard", "express"], true),
        carrier("carrier-2", "Desert Freight", "15.50", &["standard"], true),
        carrier("carrier-3", "Red Sea Couriers", "32.75", &[], true),
        carrier("retired", "Legacy Post", "9.00", &["standard"], false),
    ]
}

/// A running API server and a client for it.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub state: AppState,
}

impl TestContext {
    /// Spawn a server with rate limiting off.
    pub async fn spawn() -> Self {
        Self::spawn_with(|config| config.rate_limit = false).await
    }

    /// Spawn a server after adjusting the default test configuration.
    pub async fn spawn_with(configure: impl FnOnce(&mut ApiConfig)) -> Self {
        let mut config = ApiConfig::with_defaults("postgres://unused", TEST_SECRET);
        configure(&mut config);

        let store = Arc::new(MemoryStore::with_carriers(fixture_carriers()));
        let state = AppState::new(config, store).expect("valid test configuration");
        let app = shipdesk_api::router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("listener address");
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Test server error");
        });

        Self {
            client: Client::new(),
            base_url: format!("http://{addr}"),
            state,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    #[must_use]
    pub fn get(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        with_token(self.client.get(self.url(path)), token)
    }

    #[must_use]
    pub fn post(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        with_token(self.client.post(self.url(path)), token)
    }

    #[must_use]
    pub fn put(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        with_token(self.client.put(self.url(path)), token)
    }

    #[must_use]
    pub fn delete(&self, path: &str, token: Option<&str>) -> RequestBuilder {
        with_token(self.client.delete(self.url(path)), token)
    }

    /// Register a shipper over HTTP and return their token.
    pub async fn register(&self, email: &str, name: &str) -> String {
        let response = self
            .post("/api/auth/register", None)
            .json(&json!({ "email": email, "password": PASSWORD, "full_name": name }))
            .send()
            .await
            .expect("register request");
        assert_eq!(response.status(), 201, "registration of {email} failed");
        token_of(response).await
    }

    /// Create an account with `role` directly in the store and return a
    /// token for it. Carriers and admins cannot self-register.
    pub async fn user_with_role(&self, email: &str, role: UserRole) -> String {
        let user = AuthService::new(self.state.store())
            .register(
                Registration {
                    email: email.to_owned(),
                    password: PASSWORD.to_owned(),
                    full_name: format!("{role} account"),
                },
                role,
            )
            .await
            .expect("create privileged user");
        self.state.tokens().issue(&user).expect("issue token")
    }

    /// Create a shipment for `token` and return the response body.
    pub async fn create_shipment(&self, token: &str, body: &Value) -> Value {
        let response = self
            .post("/api/shipments", Some(token))
            .json(body)
            .send()
            .await
            .expect("create shipment request");
        assert_eq!(response.status(), 201, "shipment creation failed");
        response.json().await.expect("shipment body")
    }
}

fn with_token(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}

/// The `token` field of a session response.
pub async fn token_of(response: Response) -> String {
    let body: Value = response.json().await.expect("session body");
    body["token"]
        .as_str()
        .expect("token in session body")
        .to_owned()
}

/// An address with every required field.
#[must_use]
pub fn address(name: &str, city: &str) -> Value {
    json!({
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "phone": "+966500000000",
        "street": "1 King Fahd Rd",
        "city": city,
        "state": "Eastern Province",
        "zip": "31411",
        "country": "SA",
    })
}

/// A valid create-shipment body for `carrier-1`, Dammam to Riyadh.
#[must_use]
pub fn shipment_body(insurance: bool, signature_required: bool) -> Value {
    json!({
        "carrier_id": "carrier-1",
        "sender": address("Alice", "Dammam"),
        "recipient": address("Bob", "Riyadh"),
        "package": {
            "weight": 2.5,
            "length": 30,
            "width": 20,
            "height": 10,
            "value": 100,
            "description": "Documents",
            "service_type": "standard",
        },
        "insurance": insurance,
        "signature_required": signature_required,
    })
}
