use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{Client, StatusCode};

use super::{AccrualApiError, AccrualOrderStatus, AccrualService, Good, RegisterOrderRequest};
use crate::db_types::OrderNumber;

pub const DEFAULT_ACCRUAL_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the external accrual service.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct AccrualClient {
    base_url: String,
    client: Arc<Client>,
}

impl std::fmt::Debug for AccrualClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccrualClient ({})", self.base_url)
    }
}

impl AccrualClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AccrualApiError> {
        let client =
            Client::builder().timeout(timeout).build().map_err(|e| AccrualApiError::Initialization(e.to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self { base_url, client: Arc::new(client) })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }
}

impl AccrualService for AccrualClient {
    async fn register_order(&self, number: &OrderNumber, goods: &[Good]) -> Result<(), AccrualApiError> {
        let url = self.url("/orders");
        let body = RegisterOrderRequest { order: number.as_str(), goods };
        trace!("💰️ Registering order {number} with accrual service at {url}");
        let response = self.client.post(url).json(&body).send().await?;
        let status = response.status();
        debug!("💰️ Accrual service responded to registration of order {number} with {status}");
        match status {
            StatusCode::ACCEPTED | StatusCode::CONFLICT => Ok(()),
            _ => {
                let message = response.text().await.unwrap_or_default();
                Err(AccrualApiError::UnexpectedStatus { status: status.as_u16(), message })
            },
        }
    }

    async fn fetch_order_status(&self, number: &OrderNumber) -> Result<Option<AccrualOrderStatus>, AccrualApiError> {
        let url = self.url(&format!("/orders/{}", number.as_str()));
        trace!("💰️ Fetching accrual status for order {number} from {url}");
        let response = self.client.get(url).send().await?;
        match response.status() {
            StatusCode::OK => {
                let result = response.json::<AccrualOrderStatus>().await?;
                trace!("💰️ Order {number} has accrual status {}", result.status);
                Ok(Some(result))
            },
            StatusCode::NO_CONTENT => {
                trace!("💰️ Order {number} is not registered with the accrual service");
                Ok(None)
            },
            status => {
                let message = response.text().await.unwrap_or_default();
                Err(AccrualApiError::UnexpectedStatus { status: status.as_u16(), message })
            },
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use wiremock::{
        matchers::{body_partial_json, method, path},
        Mock,
        MockServer,
        ResponseTemplate,
    };

    use super::*;
    use crate::{
        accrual::{random_goods, AccrualStatus},
        db_types::Points,
    };

    async fn client_for(server: &MockServer) -> AccrualClient {
        AccrualClient::new(&server.uri(), Duration::from_secs(2)).expect("Failed to create client")
    }

    async fn register_with_status(status: u16) -> Result<(), AccrualApiError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/orders"))
            .and(body_partial_json(json!({"order": "79927398713"})))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server).await;
        client.register_order(&"79927398713".into(), &random_goods()).await
    }

    #[tokio::test]
    async fn register_accepted() {
        let _ = env_logger::try_init();
        register_with_status(202).await.expect("202 should be a success");
    }

    #[tokio::test]
    async fn register_conflict_is_success() {
        let _ = env_logger::try_init();
        register_with_status(409).await.expect("409 should be a success");
    }

    #[tokio::test]
    async fn register_other_statuses_fail() {
        let _ = env_logger::try_init();
        for status in [200, 400, 429, 500] {
            match register_with_status(status).await {
                Err(AccrualApiError::UnexpectedStatus { status: s, .. }) => assert_eq!(s, status),
                other => panic!("Expected an UnexpectedStatus error for {status}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn fetch_processed_status() {
        let _ = env_logger::try_init();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orders/79927398713"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "order": "79927398713",
                "status": "PROCESSED",
                "accrual": 500
            })))
            .mount(&server)
            .await;
        let client = client_for(&server).await;
        let status = client.fetch_order_status(&"79927398713".into()).await.unwrap().expect("Expected a status");
        assert_eq!(status.status, AccrualStatus::Processed);
        assert_eq!(status.accrual, Some(Points::from_points(500)));
    }

    #[tokio::test]
    async fn fetch_unregistered_order() {
        let _ = env_logger::try_init();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orders/12345678903"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        let client = client_for(&server).await;
        let status = client.fetch_order_status(&"12345678903".into()).await.expect("204 is not an error");
        assert!(status.is_none());
    }

    #[tokio::test]
    async fn fetch_rate_limited() {
        let _ = env_logger::try_init();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orders/12345678903"))
            .respond_with(ResponseTemplate::new(429).set_body_string("No more than 10 requests per minute allowed"))
            .mount(&server)
            .await;
        let client = client_for(&server).await;
        let err = client.fetch_order_status(&"12345678903".into()).await.expect_err("429 is an error");
        assert!(matches!(err, AccrualApiError::UnexpectedStatus { status: 429, .. }), "{err}");
    }

    #[tokio::test]
    async fn fetch_garbage_body() {
        let _ = env_logger::try_init();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/orders/12345678903"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;
        let client = client_for(&server).await;
        let err = client.fetch_order_status(&"12345678903".into()).await.expect_err("Body is not JSON");
        assert!(matches!(err, AccrualApiError::Json(_)), "{err}");
    }

    #[tokio::test]
    async fn request_timeout_is_a_transport_error() {
        let _ = env_logger::try_init();
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;
        let client = AccrualClient::new(&server.uri(), Duration::from_millis(50)).unwrap();
        let err = client.fetch_order_status(&"12345678903".into()).await.expect_err("Request should time out");
        assert!(matches!(err, AccrualApiError::Transport(_)), "{err}");
    }

    #[test]
    fn trailing_slash_is_ignored() {
        let client = AccrualClient::new("http://localhost:8080/", DEFAULT_ACCRUAL_TIMEOUT).unwrap();
        assert_eq!(client.url("/orders"), "http://localhost:8080/api/orders");
    }
}
