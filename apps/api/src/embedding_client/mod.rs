//! Embedding Client: the single point of entry for semantic skill embeddings.
//!
//! The scorer only sees `EmbeddingProvider`. Two backends ship with the service:
//! - `HashingEmbedder`: local, deterministic, no network (default)
//! - `HttpEmbeddingClient`: any OpenAI-compatible `/embeddings` endpoint

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub mod hashing;

pub use hashing::HashingEmbedder;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("expected {expected} embeddings, got {got}")]
    CountMismatch { expected: usize, got: usize },

    #[error("embedding for '{item}' has {got} dimensions, expected {expected}")]
    DimensionMismatch {
        item: String,
        expected: usize,
        got: usize,
    },

    #[error("embedding for '{0}' is empty")]
    EmptyVector(String),

    #[error("embedding for '{0}' contains a non-finite value")]
    NonFinite(String),
}

/// Maps skill strings to fixed-length vectors, one per input, same order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short backend label for logs and health output.
    fn name(&self) -> &str;

    async fn embed(&self, items: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Client for OpenAI-compatible embedding endpoints.
#[derive(Clone)]
pub struct HttpEmbeddingClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl HttpEmbeddingClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: String,
    ) -> Result<Self, EmbeddingError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key,
            model,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn embed(&self, items: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if items.is_empty() {
            return Ok(vec![]);
        }

        let mut request = self.client.post(&self.endpoint).json(&EmbeddingRequest {
            model: &self.model,
            input: items,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let parsed: EmbeddingResponse = response.json().await?;
        debug!(
            "Embedding call succeeded: {} items, model={}",
            parsed.data.len(),
            self.model
        );

        order_by_index(parsed.data, items.len())
    }
}

/// Pulls `error.message` out of an OpenAI-style error body, else returns the body as-is.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

/// Restores input order from the response's `index` fields.
fn order_by_index(
    mut data: Vec<EmbeddingDatum>,
    expected: usize,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    data.sort_by_key(|d| d.index);
    let in_range = data.iter().enumerate().all(|(i, d)| d.index == i);
    if data.len() != expected || !in_range {
        return Err(EmbeddingError::CountMismatch {
            expected,
            got: data.len(),
        });
    }
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_reordered_by_index() {
        let body = r#"{
            "object": "list",
            "data": [
                {"object": "embedding", "index": 1, "embedding": [0.0, 1.0]},
                {"object": "embedding", "index": 0, "embedding": [1.0, 0.0]}
            ],
            "model": "text-embedding-3-small"
        }"#;
        let parsed: EmbeddingResponse = serde_json::from_str(body).unwrap();
        let vectors = order_by_index(parsed.data, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_short_response_is_count_mismatch() {
        let data = vec![EmbeddingDatum {
            index: 0,
            embedding: vec![1.0],
        }];
        let err = order_by_index(data, 2).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::CountMismatch {
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn test_duplicate_index_is_rejected() {
        let data = vec![
            EmbeddingDatum {
                index: 0,
                embedding: vec![1.0],
            },
            EmbeddingDatum {
                index: 0,
                embedding: vec![2.0],
            },
        ];
        assert!(order_by_index(data, 2).is_err());
    }

    #[test]
    fn test_api_error_message_from_envelope() {
        let body = r#"{"error": {"message": "Invalid API key", "type": "invalid_request_error"}}"#;
        assert_eq!(api_error_message(body), "Invalid API key");
    }

    #[test]
    fn test_api_error_message_falls_back_to_raw_body() {
        assert_eq!(api_error_message("upstream timed out"), "upstream timed out");
        assert_eq!(api_error_message(""), "");
    }

    #[test]
    fn test_endpoint_trailing_slash_is_normalized() {
        let client =
            HttpEmbeddingClient::new("http://localhost:9000/v1/", None, "m".to_string()).unwrap();
        assert_eq!(client.endpoint, "http://localhost:9000/v1/embeddings");
    }

    #[tokio::test]
    async fn test_empty_input_skips_network() {
        // Unroutable endpoint: any request would fail.
        let client = HttpEmbeddingClient::new("http://127.0.0.1:1", None, "m".to_string()).unwrap();
        assert!(client.embed(&[]).await.unwrap().is_empty());
    }
}
