// src/services/relay.rs
//
// Single-hop POST to the PDF backend. No retries; failures are reported to the
// caller as structured JSON.
use std::time::Duration;

use axum::{
    Json,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{error, info, warn};

pub const DEFAULT_TARGET: &str = "http://localhost:4000/api/pdf";
pub const CONNECTION_DETAILS: &str = "Please verify that the backend API server is running and accessible.";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Request to backend API timed out after {0} seconds. The backend server may be overloaded or down.")]
    Timeout(u64),
    #[error("Network error: {source}. The backend server at {target} may be down or unreachable.")]
    Unreachable { target: String, source: reqwest::Error },
    #[error("{message}")]
    Downstream { status: StatusCode, message: String },
    #[error("{0}")]
    Local(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::Timeout(_) | RelayError::Unreachable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::Downstream { status, .. } => *status,
            RelayError::Local(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> Value {
        let message = self.to_string();
        match self {
            RelayError::Timeout(_) | RelayError::Unreachable { .. } => json!({
                "error": "Backend Connection Failed",
                "message": message,
                "details": CONNECTION_DETAILS,
            }),
            RelayError::Downstream { status, .. } => json!({
                "error": "Backend API Error",
                "message": message,
                "status": status.as_u16(),
            }),
            RelayError::Local(_) => json!({
                "error": "Proxy request failed",
                "message": message,
            }),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[derive(Debug, Clone)]
pub struct RequestRelay {
    client: reqwest::Client,
    target: String,
    timeout: Duration,
}

impl RequestRelay {
    pub fn new(target: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, target: target.into(), timeout })
    }

    fn transport_error(&self, e: reqwest::Error) -> RelayError {
        if e.is_timeout() {
            RelayError::Timeout(self.timeout.as_secs())
        } else {
            RelayError::Unreachable { target: self.target.clone(), source: e }
        }
    }

    /// POSTs `body` to the backend and returns its status and JSON reply.
    pub async fn forward(&self, body: &Value) -> Result<(StatusCode, Value), RelayError> {
        info!(target_url = %self.target, "relaying pdf request");

        let response = self
            .client
            .post(&self.target)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "failed to reach backend");
                self.transport_error(e)
            })?;

        let status = response.status();
        info!(status = status.as_u16(), "backend responded");

        if !status.is_success() {
            let is_json = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|ct| ct.contains("application/json"));
            let fallback = format!("Backend API error ({})", status.as_u16());

            let message = if is_json {
                match response.json::<Value>().await {
                    Ok(payload) => downstream_message(&payload).unwrap_or(fallback),
                    Err(e) => {
                        warn!(error = %e, "failed to parse backend error body");
                        fallback
                    }
                }
            } else {
                let text = response.text().await.unwrap_or_default();
                let preview: String = text.chars().take(200).collect();
                warn!(body = %preview, "backend returned non-JSON error");
                format!(
                    "Backend API returned {}: {}. The backend server may be down or unreachable.",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown"),
                )
            };
            return Err(RelayError::Downstream { status, message });
        }

        let data = response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                RelayError::Local(format!("Backend returned an invalid JSON body: {e}"))
            }
        })?;
        Ok((status, data))
    }
}

fn downstream_message(payload: &Value) -> Option<String> {
    ["message", "error"].iter().filter_map(|k| payload.get(*k)).find_map(|m| match m {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::String(_) | Value::Null | Value::Bool(false) => None,
        other => Some(other.to_string()),
    })
}
