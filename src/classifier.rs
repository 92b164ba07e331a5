//! Priority classification through a hosted language model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use taskcal_core::{TaskCalError, TaskCalResult};

use crate::config::GeminiConfig;

/// Sends the classification prompt to a model and returns its raw reply.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, prompt: &str) -> TaskCalResult<String>;

    /// Display name, e.g. "gemini-1.5-flash"
    fn name(&self) -> &str;
}

pub struct GeminiClassifier {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClassifier {
    pub fn new(config: &GeminiConfig, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl Classifier for GeminiClassifier {
    async fn classify(&self, prompt: &str) -> TaskCalResult<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        tracing::debug!(model = %self.model, "Sending classification request");

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| TaskCalError::Classification(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TaskCalError::Classification(format!(
                "API error ({}): {}",
                status, body
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| TaskCalError::Classification(format!("Invalid response: {}", e)))?;

        let reply: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .ok_or_else(|| TaskCalError::Classification("Model returned no candidates".into()))?
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect();

        tracing::debug!(bytes = reply.len(), "Received classifier reply");

        Ok(reply)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn classifier(base_url: &str) -> GeminiClassifier {
        let config = GeminiConfig {
            api_key: None,
            model: "gemini-1.5-flash".into(),
            base_url: base_url.into(),
        };
        GeminiClassifier::new(&config, "test-key")
    }

    #[tokio::test]
    async fn returns_concatenated_candidate_text() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-1.5-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(Matcher::PartialJson(serde_json::json!({
                "contents": [{ "parts": [{ "text": "classify these" }] }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"candidates":[{"content":{"parts":[
                    {"text":"High Priority:\n- Email client\n"},
                    {"text":"Low Priority:\n- Clean inbox"}
                ]}}]}"#,
            )
            .create_async()
            .await;

        let reply = classifier(&server.url())
            .classify("classify these")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            reply,
            "High Priority:\n- Email client\nLow Priority:\n- Clean inbox"
        );
    }

    #[tokio::test]
    async fn http_error_is_a_classification_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(403)
            .with_body(r#"{"error":{"message":"API key not valid"}}"#)
            .create_async()
            .await;

        let err = classifier(&server.url()).classify("x").await.unwrap_err();

        assert!(matches!(err, TaskCalError::Classification(ref m) if m.contains("403")));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn empty_candidates_is_a_classification_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_body(r#"{"candidates":[]}"#)
            .create_async()
            .await;

        let err = classifier(&server.url()).classify("x").await.unwrap_err();
        assert!(matches!(err, TaskCalError::Classification(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_classification_error() {
        let err = classifier("http://127.0.0.1:1")
            .classify("x")
            .await
            .unwrap_err();
        assert!(matches!(err, TaskCalError::Classification(_)));
    }

    #[test]
    fn trailing_slash_in_base_url_is_ignored() {
        assert_eq!(
            classifier("http://localhost/").endpoint(),
            "http://localhost/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }
}
