// src/oracle/http.rs

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::oracle::{OracleError, ScoreRequest, ScoreResponse, ScoringOracle, TranscriptionOracle};

/// Client for a remote scoring/transcription service speaking JSON over
/// HTTP. The service contract is `POST {base}/score` and
/// `POST {base}/transcribe` with bearer auth.
pub struct HttpOracle {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpOracle {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn request(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(format!("{}/{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }
}

#[async_trait]
impl ScoringOracle for HttpOracle {
    fn name(&self) -> &str {
        "http"
    }

    async fn score(&self, request: &ScoreRequest) -> Result<ScoreResponse, OracleError> {
        tracing::debug!("Scoring answer via oracle at {}", self.base_url);

        let response = self
            .request("score")
            .json(request)
            .send()
            .await
            .map_err(|e| OracleError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OracleError::BadResponse(format!(
                "status {}",
                response.status()
            )));
        }

        response
            .json::<ScoreResponse>()
            .await
            .map_err(|e| OracleError::BadResponse(e.to_string()))
    }
}

#[derive(serde::Serialize)]
struct TranscribeRequest<'a> {
    audio_ref: &'a str,
}

#[derive(Deserialize)]
struct TranscribeResponse {
    text: String,
}

#[async_trait]
impl TranscriptionOracle for HttpOracle {
    async fn transcribe(&self, audio_ref: &str) -> Result<String, OracleError> {
        let response = self
            .request("transcribe")
            .json(&TranscribeRequest { audio_ref })
            .send()
            .await
            .map_err(|e| OracleError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OracleError::BadResponse(format!(
                "status {}",
                response.status()
            )));
        }

        let body = response
            .json::<TranscribeResponse>()
            .await
            .map_err(|e| OracleError::BadResponse(e.to_string()))?;
        Ok(body.text)
    }
}
