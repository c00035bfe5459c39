//! # Redirect Flow
//!
//! Checkout via a provider-hosted payment page. The session backend creates
//! the order (`POST /api/create-checkout-session`) and returns the URL the
//! browser should be navigated to; completion is observed out-of-band on the
//! success/cancel landing routes.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shop_core::{CheckoutError, CheckoutResult, CheckoutSession, FlowKind, OrderHandoff, PaymentFlow};
use std::env;
use tracing::{debug, error, info, instrument};

/// Configuration for the checkout-session backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the backend (e.g., "http://127.0.0.1:5526")
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl BackendConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads `CHECKOUT_BACKEND_URL`; defaults to the local dev backend.
    pub fn from_env() -> CheckoutResult<Self> {
        dotenvy::dotenv().ok();

        let base_url = env::var("CHECKOUT_BACKEND_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:5526".to_string());

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(CheckoutError::Configuration(format!(
                "CHECKOUT_BACKEND_URL must be an http(s) URL, got: {}",
                base_url
            )));
        }

        Ok(Self {
            base_url,
            timeout_secs: 30,
        })
    }

    /// Create config with an explicit base URL (for testing)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 30,
        }
    }

    /// Full URL of the session-creation endpoint
    pub fn session_endpoint(&self) -> String {
        format!("{}/api/create-checkout-session", self.base_url)
    }
}

/// Wire shape of one product in the session-creation request body
#[derive(Debug, Serialize)]
struct SessionProduct {
    id: String,
    name: String,
    /// Decimal major-unit price; the backend converts to minor units
    price: f64,
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest {
    products: Vec<SessionProduct>,
}

#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    url: String,
}

/// Redirect-based checkout flow.
///
/// Issues a single request per call; the orchestrator's in-flight guard
/// ensures a double submit never reaches this point twice.
pub struct RedirectFlow {
    config: BackendConfig,
    client: Client,
}

impl RedirectFlow {
    /// Create a new redirect flow against the configured backend
    pub fn new(config: BackendConfig) -> CheckoutResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CheckoutError::Configuration(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> CheckoutResult<Self> {
        Self::new(BackendConfig::from_env()?)
    }

    fn build_request(session: &CheckoutSession) -> CreateSessionRequest {
        CreateSessionRequest {
            products: session
                .line_items
                .iter()
                .map(|item| SessionProduct {
                    id: item.product_id.clone(),
                    name: item.name.clone(),
                    price: item.unit_price.as_decimal(),
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl PaymentFlow for RedirectFlow {
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    async fn create_order(&self, session: &CheckoutSession) -> CheckoutResult<OrderHandoff> {
        let request = Self::build_request(session);
        let endpoint = self.config.session_endpoint();

        debug!(
            "Creating checkout session: {} line items, total={}",
            request.products.len(),
            session.total.display()
        );

        let response = self
            .client
            .post(&endpoint)
            .header("Idempotency-Key", &session.idempotency_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CheckoutError::SessionCreationFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CheckoutError::SessionCreationFailed(e.to_string()))?;

        if !status.is_success() {
            error!("Session backend error: status={}, body={}", status, body);
            return Err(CheckoutError::SessionCreationFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let parsed: CreateSessionResponse = serde_json::from_str(&body).map_err(|e| {
            CheckoutError::SessionCreationFailed(format!("malformed response body: {}", e))
        })?;

        info!("Created checkout session, redirecting to {}", parsed.url);

        Ok(OrderHandoff::Redirect { url: parsed.url })
    }

    fn flow_name(&self) -> &'static str {
        "redirect"
    }

    fn kind(&self) -> FlowKind {
        FlowKind::Redirect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_core::{CartStore, Currency, Product};
    use wiremock::matchers::{body_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_for(items: &[(&str, &str, f64, u32)]) -> CheckoutSession {
        let cart = CartStore::new(Currency::GBP);
        for (id, name, price, qty) in items {
            let product = Product::new(*id, *name, *price);
            for _ in 0..*qty {
                cart.add(&product);
            }
        }
        CheckoutSession::from_snapshot(&cart.snapshot()).unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let session = session_for(&[("1", "Emergency Food Package", 25.0, 2)]);
        let request = RedirectFlow::build_request(&session);

        assert_eq!(request.products.len(), 1);
        assert_eq!(request.products[0].id, "1");
        assert_eq!(request.products[0].price, 25.0);
        assert_eq!(request.products[0].quantity, 2);
    }

    #[test]
    fn test_backend_config_endpoint() {
        let config = BackendConfig::new("http://localhost:5526");
        assert_eq!(
            config.session_endpoint(),
            "http://localhost:5526/api/create-checkout-session"
        );
    }

    #[tokio::test]
    async fn test_create_order_returns_redirect_url() {
        let server = MockServer::start().await;

        let expected_body = serde_json::json!({
            "products": [
                {"id": "1", "name": "Emergency Food Package", "price": 25.0, "quantity": 2},
                {"id": "2", "name": "Medical Supplies Kit", "price": 50.0, "quantity": 1}
            ]
        });

        Mock::given(method("POST"))
            .and(path("/api/create-checkout-session"))
            .and(header_exists("Idempotency-Key"))
            .and(body_json(&expected_body))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": "https://checkout.example.com/pay/cs_123"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let flow = RedirectFlow::new(BackendConfig::new(server.uri())).unwrap();
        let session = session_for(&[
            ("1", "Emergency Food Package", 25.0, 2),
            ("2", "Medical Supplies Kit", 50.0, 1),
        ]);

        let handoff = flow.create_order(&session).await.unwrap();
        match handoff {
            OrderHandoff::Redirect { url } => {
                assert_eq!(url, "https://checkout.example.com/pay/cs_123");
            }
            other => panic!("expected redirect handoff, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_2xx_is_session_creation_failed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/create-checkout-session"))
            .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
            .mount(&server)
            .await;

        let flow = RedirectFlow::new(BackendConfig::new(server.uri())).unwrap();
        let session = session_for(&[("1", "Emergency Food Package", 25.0, 1)]);

        let err = flow.create_order(&session).await.unwrap_err();
        assert!(matches!(err, CheckoutError::SessionCreationFailed(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_malformed_body_is_session_creation_failed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/create-checkout-session"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let flow = RedirectFlow::new(BackendConfig::new(server.uri())).unwrap();
        let session = session_for(&[("1", "Emergency Food Package", 25.0, 1)]);

        let err = flow.create_order(&session).await.unwrap_err();
        assert!(matches!(err, CheckoutError::SessionCreationFailed(_)));
    }
}
