use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::{
    constants::X402_VERSION,
    error::{AppError, Result},
    models::{FacilitatorRequest, PaymentRequirements, SettleResponse, VerifyResponse},
};

/// Verifies and settles payment payloads on the server's behalf.
#[async_trait]
pub trait PaymentFacilitator: Send + Sync {
    async fn verify(
        &self,
        payload: &Value,
        requirements: &PaymentRequirements,
    ) -> Result<VerifyResponse>;

    async fn settle(
        &self,
        payload: &Value,
        requirements: &PaymentRequirements,
    ) -> Result<SettleResponse>;
}

#[derive(Clone, Debug)]
pub struct HttpFacilitator {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpFacilitator {
    pub fn new(base_url: String, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("Facilitator HTTP client init failed: {}", e)))?;
        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), action)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        action: &str,
        payload: &Value,
        requirements: &PaymentRequirements,
    ) -> Result<T> {
        let body = FacilitatorRequest {
            x402_version: X402_VERSION,
            payment_payload: payload,
            payment_requirements: requirements,
        };

        let mut request = self.client.post(self.endpoint(action)).json(&body);
        if let Some(key) = self.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            AppError::ExternalAPI(format!("Facilitator {} request failed: {}", action, e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalAPI(format!(
                "Facilitator {} returned {}: {}",
                action, status, text
            )));
        }

        response.json::<T>().await.map_err(|e| {
            AppError::ExternalAPI(format!("Facilitator {} parse failed: {}", action, e))
        })
    }
}

#[async_trait]
impl PaymentFacilitator for HttpFacilitator {
    async fn verify(
        &self,
        payload: &Value,
        requirements: &PaymentRequirements,
    ) -> Result<VerifyResponse> {
        self.post("verify", payload, requirements).await
    }

    async fn settle(
        &self,
        payload: &Value,
        requirements: &PaymentRequirements,
    ) -> Result<SettleResponse> {
        self.post("settle", payload, requirements).await
    }
}
