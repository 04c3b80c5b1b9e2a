// src/routes/relay.rs
use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use serde_json::Value;

use crate::{services::relay::RelayError, state::SharedState};

pub async fn proxy_pdf_handler(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), RelayError> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| RelayError::Local(format!("Invalid JSON request body: {e}")))?;
    let (status, data) = state.relay.forward(&payload).await?;
    Ok((status, Json(data)))
}
