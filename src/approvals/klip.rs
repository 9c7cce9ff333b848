use std::time::Duration;

use alloy_primitives::Address;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    approvals::connector::{QrConfirmation, QrRequest, QrSigner},
    config::{Config, DEFAULT_KLIP_BASE_URL},
    errors::InterfaceError,
};

const QR_TARGET_URL: &str = "https://klipwallet.com/?target=/a2a?request_key=";

#[derive(Debug, Serialize)]
struct PrepareRequest<'a> {
    bapp: Bapp<'a>,
    #[serde(rename = "type")]
    kind: &'a str,
    transaction: ContractExecution<'a>,
}

#[derive(Debug, Serialize)]
struct Bapp<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct ContractExecution<'a> {
    to: String,
    value: &'a str,
    abi: &'a str,
    params: &'a str,
}

#[derive(Debug, Deserialize)]
struct PrepareResponse {
    request_key: String,
    #[serde(default)]
    expiration_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ResultResponse {
    status: String,
    #[serde(default)]
    result: Option<ExecutionResult>,
}

#[derive(Debug, Deserialize)]
struct ExecutionResult {
    #[serde(default)]
    tx_hash: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Client for the Klip app-to-app API.
///
/// A request is prepared first, then its result is polled until the user completes or cancels
/// it in the Klip app. Polling stops once the request's expiration time has passed or the API
/// rejects the request key; otherwise it has no deadline of its own.
pub struct KlipClient {
    client: Client,
    base_url: String,
    bapp_name: String,
    poll_interval: Duration,
}

impl KlipClient {
    pub fn new(bapp_name: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_KLIP_BASE_URL.to_string(),
            bapp_name: bapp_name.into(),
            poll_interval: Duration::from_secs(1),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.klip_bapp_name.clone())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn fetch_result(&self, request_key: &str) -> Result<ResultResponse, InterfaceError> {
        let response = self
            .client
            .get(self.url("/v2/a2a/result"))
            .query(&[("request_key", request_key)])
            .send()
            .await?;
        let status = response.status();
        if status.is_client_error() {
            return Err(InterfaceError::InvalidInput(format!(
                "Klip rejected result request for {}: {}",
                request_key, status
            )));
        }
        if !status.is_success() {
            return Err(InterfaceError::RecoverableError(format!(
                "Klip result request returned {}",
                status
            )));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl QrSigner for KlipClient {
    async fn request_contract_interaction(
        &self,
        to: Address,
        abi: &str,
        params: &str,
        value: &str,
    ) -> Result<QrRequest, InterfaceError> {
        let body = PrepareRequest {
            bapp: Bapp { name: &self.bapp_name },
            kind: "execute_contract",
            transaction: ContractExecution { to: to.to_string(), value, abi, params },
        };
        let response = self
            .client
            .post(self.url("/v2/a2a/prepare"))
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InterfaceError::RecoverableError(format!(
                "Klip prepare request returned {}: {}",
                status, body
            )));
        }
        let prepared: PrepareResponse = response.json().await?;
        Ok(QrRequest {
            qr_url: format!("{}{}", QR_TARGET_URL, prepared.request_key),
            request_key: prepared.request_key,
            expires_at: prepared.expiration_time,
        })
    }

    async fn await_confirmation(&self, request: &QrRequest) -> Result<QrConfirmation, InterfaceError> {
        loop {
            if let Some(expires_at) = request.expires_at {
                if chrono::Utc::now().timestamp() > expires_at {
                    return Err(InterfaceError::Timeout(format!(
                        "Klip request {} expired at {}",
                        request.request_key, expires_at
                    )));
                }
            }
            match self.fetch_result(&request.request_key).await {
                Ok(response) => match response.status.as_str() {
                    "completed" => {
                        let result = response.result.unwrap_or(ExecutionResult {
                            tx_hash: None,
                            status: None,
                        });
                        if result.status.as_deref() == Some("fail") {
                            return Err(InterfaceError::RecoverableError(format!(
                                "Transaction of Klip request {} failed",
                                request.request_key
                            )));
                        }
                        return Ok(QrConfirmation { tx_hash: result.tx_hash });
                    }
                    "canceled" => {
                        return Err(InterfaceError::Rejected(format!(
                            "Klip request {} was canceled in the wallet",
                            request.request_key
                        )))
                    }
                    "error" => {
                        return Err(InterfaceError::RecoverableError(format!(
                            "Klip request {} ended with an error",
                            request.request_key
                        )))
                    }
                    status => debug!(status, "Klip request not completed yet"),
                },
                Err(err @ InterfaceError::InvalidInput(_)) => return Err(err),
                Err(err) => debug!(%err, "Polling Klip result failed"),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn client_for(server: &MockServer) -> KlipClient {
        KlipClient::new("swap-interface")
            .with_base_url(server.base_url())
            .with_poll_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_request_contract_interaction() {
        let server = MockServer::start_async().await;
        let token = Address::repeat_byte(0x12);
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v2/a2a/prepare")
                    .json_body(json!({
                        "bapp": {"name": "swap-interface"},
                        "type": "execute_contract",
                        "transaction": {
                            "to": token.to_string(),
                            "value": "0",
                            "abi": "{\"name\":\"approve\"}",
                            "params": "[\"0x1\",\"2\"]"
                        }
                    }));
                then.status(200).json_body(json!({
                    "request_key": "d3b5-11",
                    "status": "prepared",
                    "expiration_time": 1_612_345_678u64
                }));
            })
            .await;

        let request = client_for(&server)
            .request_contract_interaction(token, "{\"name\":\"approve\"}", "[\"0x1\",\"2\"]", "0")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(request.request_key, "d3b5-11");
        assert_eq!(request.qr_url, "https://klipwallet.com/?target=/a2a?request_key=d3b5-11");
        assert_eq!(request.expires_at, Some(1_612_345_678));
    }

    #[tokio::test]
    async fn test_await_confirmation_completed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v2/a2a/result")
                    .query_param("request_key", "k1");
                then.status(200).json_body(json!({
                    "request_key": "k1",
                    "status": "completed",
                    "result": {"tx_hash": "0xfeed", "status": "success"}
                }));
            })
            .await;
        let request = QrRequest { request_key: "k1".to_string(), qr_url: String::new(), expires_at: None };

        let confirmation = client_for(&server)
            .await_confirmation(&request)
            .await
            .unwrap();

        assert_eq!(confirmation.tx_hash.as_deref(), Some("0xfeed"));
    }

    #[tokio::test]
    async fn test_await_confirmation_canceled() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/a2a/result");
                then.status(200)
                    .json_body(json!({"request_key": "k2", "status": "canceled"}));
            })
            .await;
        let request = QrRequest { request_key: "k2".to_string(), qr_url: String::new(), expires_at: None };

        let result = client_for(&server)
            .await_confirmation(&request)
            .await;

        assert!(matches!(result, Err(InterfaceError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_await_confirmation_keeps_polling() {
        let server = MockServer::start_async().await;
        let mut pending = server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/a2a/result");
                then.status(200)
                    .json_body(json!({"request_key": "k3", "status": "requested"}));
            })
            .await;
        let request = QrRequest { request_key: "k3".to_string(), qr_url: String::new(), expires_at: None };
        let client = client_for(&server);

        let polling =
            tokio::time::timeout(Duration::from_millis(100), client.await_confirmation(&request))
                .await;
        assert!(polling.is_err());
        assert!(pending.hits_async().await >= 2);

        pending.delete_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/a2a/result");
                then.status(200).json_body(json!({
                    "request_key": "k3",
                    "status": "completed",
                    "result": {"tx_hash": "0x01", "status": "success"}
                }));
            })
            .await;

        let confirmation = client.await_confirmation(&request).await.unwrap();
        assert_eq!(confirmation.tx_hash.as_deref(), Some("0x01"));
    }

    #[tokio::test]
    async fn test_await_confirmation_unknown_request_key() {
        let server = MockServer::start_async().await;
        let missing = server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/a2a/result");
                then.status(404)
                    .json_body(json!({"code": 404, "err": "request key not found"}));
            })
            .await;
        let request = QrRequest { request_key: "gone".to_string(), qr_url: String::new(), expires_at: None };

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            client_for(&server).await_confirmation(&request),
        )
        .await
        .unwrap();

        assert!(matches!(result, Err(InterfaceError::InvalidInput(_))));
        missing.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_await_confirmation_expired_request() {
        let server = MockServer::start_async().await;
        let pending = server
            .mock_async(|when, then| {
                when.method(GET).path("/v2/a2a/result");
                then.status(200)
                    .json_body(json!({"request_key": "old", "status": "requested"}));
            })
            .await;
        let expired = chrono::Utc::now().timestamp() - 60;
        let request =
            QrRequest { request_key: "old".to_string(), qr_url: String::new(), expires_at: Some(expired) };

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            client_for(&server).await_confirmation(&request),
        )
        .await
        .unwrap();

        assert!(matches!(result, Err(InterfaceError::Timeout(_))));
        pending.assert_hits_async(0).await;
    }
}
