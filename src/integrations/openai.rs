use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    services::image_generator::ImageGenerator,
};

/// Image generation through the OpenAI Responses API `image_generation` tool.
#[derive(Clone, Debug)]
pub struct OpenAiImageClient {
    api_key: Option<String>,
    base_url: String,
    model: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
    tools: Vec<ImageTool>,
}

#[derive(Debug, Serialize)]
struct ImageTool {
    #[serde(rename = "type")]
    kind: &'static str,
    output_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    result: Option<String>,
}

impl OpenAiImageClient {
    pub fn new(api_key: Option<String>, base_url: String, model: String) -> Self {
        Self {
            api_key,
            base_url,
            model,
            client: Client::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!("{}/responses", self.base_url.trim_end_matches('/'))
    }
}

fn first_image(response: ResponsesResponse) -> Option<String> {
    response
        .output
        .into_iter()
        .filter(|item| item.kind == "image_generation_call")
        .find_map(|item| item.result.filter(|r| !r.is_empty()))
}

#[async_trait]
impl ImageGenerator for OpenAiImageClient {
    async fn generate(&self, prompt: &str) -> Result<Option<String>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::ExternalAPI("OPENAI_API_KEY is not configured".to_string()))?;

        tracing::debug!("Requesting image from {} with model {}", self.endpoint(), self.model);

        let body = ResponsesRequest {
            model: &self.model,
            input: prompt,
            tools: vec![ImageTool {
                kind: "image_generation",
                output_format: "jpeg",
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("Image request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalAPI(format!(
                "Image provider returned {}: {}",
                status, text
            )));
        }

        let parsed: ResponsesResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("Image response parse failed: {}", e)))?;

        Ok(first_image(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_image_picks_generation_call_result() {
        let response: ResponsesResponse = serde_json::from_value(serde_json::json!({
            "output": [
                {"type": "reasoning"},
                {"type": "message", "result": "ignored"},
                {"type": "image_generation_call", "result": "/9j/4AAQ"}
            ]
        }))
        .unwrap();
        assert_eq!(first_image(response), Some("/9j/4AAQ".to_string()));
    }

    #[test]
    fn first_image_is_none_without_result() {
        let response: ResponsesResponse = serde_json::from_value(serde_json::json!({
            "output": [{"type": "image_generation_call", "result": ""}]
        }))
        .unwrap();
        assert_eq!(first_image(response), None);
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let client = OpenAiImageClient::new(None, "https://api.example.com/v1/".into(), "m".into());
        assert_eq!(client.endpoint(), "https://api.example.com/v1/responses");
        assert!(!client.is_configured());
    }

    #[tokio::test]
    async fn generate_without_key_fails_fast() {
        let client = OpenAiImageClient::new(None, "http://127.0.0.1:9".into(), "m".into());
        assert!(matches!(
            client.generate("prompt").await,
            Err(AppError::ExternalAPI(_))
        ));
    }
}
