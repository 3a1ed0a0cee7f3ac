//! API Middleware
//!
//! Access gate and request logging.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};

use crate::error::AppError;

use super::AppState;

// =========================================================================
// Access Gate
// =========================================================================

/// Capability check gating every mutating operation. Keys are held as
/// sha256 hashes; the plaintext never survives construction.
#[derive(Debug, Clone)]
pub struct AccessGate {
    key_hashes: Arc<HashSet<String>>,
}

impl AccessGate {
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key_hashes = keys.into_iter().map(|key| hash_key(key.as_ref())).collect();
        Self {
            key_hashes: Arc::new(key_hashes),
        }
    }

    /// Validate a presented capability token.
    pub fn validate(&self, presented: &str) -> bool {
        self.key_hashes.contains(&hash_key(presented))
    }
}

fn hash_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Extract and validate the API key from the X-API-Key header. The rest of
/// the system trusts this result and performs no further authorization.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let presented = request
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok());

    match presented {
        Some(key) if state.gate.validate(key) => Ok(next.run(request).await),
        _ => Err(AppError::Unauthorized.into_response()),
    }
}

// =========================================================================
// Request logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["x-api-key", "authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let headers = mask_headers_for_logging(request.headers());

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    response
}
