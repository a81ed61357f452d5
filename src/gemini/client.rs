use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::ask::TextGenerator;
use crate::config::{ApiKey, Config};
use crate::error::{GeminiError, Result};
use crate::gemini::{models::GeminiModel, types::*};

/// Keeps the key out of the URL, which reqwest errors echo back.
const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiClient {
    http_client: Client,
    api_key: ApiKey,
    model: GeminiModel,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(GeminiError::HttpClient)?;

        info!("Gemini client initialized");
        debug!("Model: {}", config.model.as_str());

        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
        })
    }

    pub fn model(&self) -> &GeminiModel {
        &self.model
    }

    /// One `generateContent` call, no retries.
    pub async fn generate_content(&self, prompt: &str) -> Result<GenerationResponse> {
        let request = GenerateContentRequest::user_prompt(prompt);

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url,
            self.model.as_str()
        );

        debug!("Sending request to {}", self.model.as_str());

        let response = self
            .http_client
            .post(&url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&request)
            .send()
            .await
            .map_err(GeminiError::HttpClient)?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await?;
                let resp: GenerateContentResponse = serde_json::from_str(&body)?;

                let usage = resp.usage_metadata.clone().unwrap_or_default();

                debug!(
                    "Tokens - prompt: {}, response: {}, total: {}",
                    usage.prompt_token_count,
                    usage.candidates_token_count,
                    usage.total_token_count
                );

                let text = resp.text()?;

                Ok(GenerationResponse { text, usage })
            }
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                let error_body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| status.to_string());
                Err(GeminiError::AuthError(error_body))
            }
            status => {
                let error_body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                Err(GeminiError::ApiError {
                    status: status.as_u16(),
                    message: error_body,
                })
            }
        }
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<GenerationResponse> {
        self.generate_content(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    const GENERATE_PATH: &str = "/models/gemini-1.5-flash:generateContent";

    fn client_for(base_url: &str, key: &str) -> GeminiClient {
        let mut config = Config::new(ApiKey::new(key));
        config.base_url = base_url.to_string();
        GeminiClient::new(&config).unwrap()
    }

    fn success_body(text: &str) -> String {
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 9, "candidatesTokenCount": 7, "totalTokenCount": 16}
        })
        .to_string()
    }

    #[test]
    fn test_client_creation() {
        let config = Config::new(ApiKey::new("test_key"));
        let client = GeminiClient::new(&config);
        assert!(client.is_ok());
        assert_eq!(client.unwrap().model(), &GeminiModel::Flash15);
    }

    #[tokio::test]
    async fn test_generate_sends_key_model_and_prompt() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", GENERATE_PATH)
            .match_header("x-goog-api-key", "abc123")
            .match_body(Matcher::Json(json!({
                "contents": [{"role": "user", "parts": [{"text": "Say hi"}]}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(success_body("hi"))
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server.url(), "abc123");
        let response = client.generate_content("Say hi").await.unwrap();

        assert_eq!(response.text, "hi");
        assert_eq!(response.usage.total_token_count, 16);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_uses_configured_model() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(success_body("ok"))
            .create_async()
            .await;

        let mut config = Config::new(ApiKey::new("k"));
        config.base_url = server.url();
        config.model = GeminiModel::Flash20;
        let client = GeminiClient::new(&config).unwrap();

        assert_eq!(client.generate_content("x").await.unwrap().text, "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_invalid_key_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", GENERATE_PATH)
            .match_header("x-goog-api-key", "None")
            .with_status(400)
            .with_body(r#"{"error": {"message": "API key not valid"}}"#)
            .create_async()
            .await;

        let client = client_for(&server.url(), "None");
        let err = client.generate_content("x").await.unwrap_err();

        match err {
            GeminiError::ApiError { status, message } => {
                assert_eq!(status, 400);
                assert!(message.contains("API key not valid"));
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_forbidden_maps_to_auth_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", GENERATE_PATH)
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("permission denied")
            .create_async()
            .await;

        let client = client_for(&server.url(), "revoked");
        let err = client.generate_content("x").await.unwrap_err();

        assert!(matches!(err, GeminiError::AuthError(ref body) if body == "permission denied"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", GENERATE_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = client_for(&server.url(), "k");
        let err = client.generate_content("x").await.unwrap_err();

        assert!(matches!(err, GeminiError::JsonParse(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_http_error() {
        let client = client_for("http://127.0.0.1:1", "k");
        let err = client.generate_content("x").await.unwrap_err();

        assert!(matches!(err, GeminiError::HttpClient(_)));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_key() {
        let client = client_for("http://127.0.0.1:1", "sk-secret-abc123");
        let err = client.generate_content("x").await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("127.0.0.1"));
        assert!(!message.contains("sk-secret-abc123"));
        assert!(!format!("{:?}", err).contains("sk-secret-abc123"));
    }

    #[tokio::test]
    async fn test_key_not_sent_in_query() {
        let mut server = mockito::Server::new_async().await;
        // Without match_query the path must match exactly, query included.
        let mock = server
            .mock("POST", GENERATE_PATH)
            .match_header("x-goog-api-key", "abc123")
            .with_status(200)
            .with_body(success_body("ok"))
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server.url(), "abc123");
        client.generate_content("x").await.unwrap();
        mock.assert_async().await;
    }
}
