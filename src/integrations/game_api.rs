use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::{Client, StatusCode};
use url::Url;

use crate::{
    constants::{PAYMENT_REQUIRED_HEADER, PAYMENT_SIGNATURE_HEADER},
    error::{AppError, Result},
    models::{ImageResponse, PaymentRequired},
    services::selection::Selection,
};

/// Outcome of an `/image` request.
#[derive(Debug)]
pub enum ImageFetch {
    Image(ImageResponse),
    PaymentRequired(PaymentRequired),
}

/// Player-side client for the game server.
#[derive(Clone, Debug)]
pub struct GameApiClient {
    base_url: String,
    client: Client,
}

impl GameApiClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: Client::new(),
        }
    }

    fn image_url(&self, selection: &Selection) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/image", self.base_url.trim_end_matches('/')))
            .map_err(|e| AppError::Internal(format!("Invalid API URL: {}", e)))?;
        url.query_pairs_mut().append_pair("idx", &selection.to_query());
        Ok(url)
    }

    /// Requests an image; `payment` is a pre-signed payment payload header value.
    pub async fn request_image(
        &self,
        selection: &Selection,
        payment: Option<&str>,
    ) -> Result<ImageFetch> {
        let mut request = self
            .client
            .get(self.image_url(selection)?)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(payment) = payment {
            request = request.header(PAYMENT_SIGNATURE_HEADER, payment);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("Image request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::PAYMENT_REQUIRED {
            let header = response
                .headers()
                .get(PAYMENT_REQUIRED_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let challenge = match header {
                Some(encoded) => decode_challenge(&encoded)?,
                None => response.json::<PaymentRequired>().await.map_err(|e| {
                    AppError::ExternalAPI(format!("Unreadable payment challenge: {}", e))
                })?,
            };
            return Ok(ImageFetch::PaymentRequired(challenge));
        }

        if !status.is_success() {
            let body: serde_json::Value = response
                .json()
                .await
                .unwrap_or_else(|_| serde_json::json!({"error": "Unknown error"}));
            let message = body
                .get("error")
                .and_then(|e| e.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP error! status: {}", status));
            return Err(AppError::ExternalAPI(message));
        }

        let image: ImageResponse = response
            .json()
            .await
            .map_err(|_| AppError::ExternalAPI("Invalid response format from server".to_string()))?;
        if image.indices.is_empty() || image.base64.is_empty() {
            return Err(AppError::ExternalAPI(
                "Invalid response format from server".to_string(),
            ));
        }
        Ok(ImageFetch::Image(image))
    }
}

/// Decodes the base64 JSON document carried in the `PAYMENT-REQUIRED` header.
pub fn decode_challenge(encoded: &str) -> Result<PaymentRequired> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| AppError::ExternalAPI(format!("Unreadable payment challenge: {}", e)))?;
    Ok(serde_json::from_slice(&bytes)?)
}
