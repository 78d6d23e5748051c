//! Inbound voice-vendor webhooks.
//!
//! Payloads carry an `x-retell-signature` header of the form `v=<unix-ms>,d=<hex>` where the
//! digest is HMAC-SHA256 over the raw body followed by the timestamp, keyed with the vendor
//! API key. [`require_signature`] wraps every webhook route so handlers only ever see
//! verified bodies.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::Sha256;
use tracing::{error, info, warn};

pub const SIGNATURE_HEADER: &str = "x-retell-signature";
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(5 * 60);
const MAX_WEBHOOK_BODY: usize = 1024 * 1024;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header missing")]
    Missing,
    #[error("signature header malformed")]
    Malformed,
    #[error("signature timestamp outside tolerance")]
    Expired,
    #[error("signature does not match payload")]
    Mismatch,
}

/// Verifies vendor signatures against a shared key.
#[derive(Clone)]
pub struct SignatureVerifier {
    key: Vec<u8>,
    tolerance: Duration,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("key", &"<redacted>")
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

impl SignatureVerifier {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Produces a header value for `body` at `now`. Used by tests and local tooling.
    pub fn sign(&self, body: &[u8], now: DateTime<Utc>) -> Result<String, InvalidLength> {
        let timestamp = now.timestamp_millis().to_string();
        let digest = self.mac(body, &timestamp)?.finalize().into_bytes();
        Ok(format!("v={timestamp},d={}", hex::encode(digest)))
    }

    pub fn verify(
        &self,
        body: &[u8],
        header: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let header = header.ok_or(SignatureError::Missing)?;
        let (timestamp, digest) = parse_header(header)?;

        let sent_ms: i64 = timestamp.parse().map_err(|_| SignatureError::Malformed)?;
        let skew = now.timestamp_millis().abs_diff(sent_ms);
        if u128::from(skew) > self.tolerance.as_millis() {
            return Err(SignatureError::Expired);
        }

        let expected = hex::decode(digest).map_err(|_| SignatureError::Malformed)?;
        self.mac(body, timestamp)
            .map_err(|_| SignatureError::Mismatch)?
            .verify_slice(&expected)
            .map_err(|_| SignatureError::Mismatch)
    }

    fn mac(&self, body: &[u8], timestamp: &str) -> Result<HmacSha256, InvalidLength> {
        let mut mac = HmacSha256::new_from_slice(&self.key)?;
        mac.update(body);
        mac.update(timestamp.as_bytes());
        Ok(mac)
    }
}

fn parse_header(header: &str) -> Result<(&str, &str), SignatureError> {
    let mut timestamp = None;
    let mut digest = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("v", value)) => timestamp = Some(value),
            Some(("d", value)) => digest = Some(value),
            _ => {}
        }
    }
    match (timestamp, digest) {
        (Some(timestamp), Some(digest)) if !timestamp.is_empty() && !digest.is_empty() => {
            Ok((timestamp, digest))
        }
        _ => Err(SignatureError::Malformed),
    }
}

/// Axum middleware: buffers the body, verifies it, and hands the original bytes on.
pub async fn require_signature(
    State(verifier): State<Arc<SignatureVerifier>>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_WEBHOOK_BODY).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(error = %err, "webhook body could not be read");
            return unauthorized();
        }
    };

    let header = parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    if let Err(err) = verifier.verify(&bytes, header, Utc::now()) {
        warn!(path = %parts.uri.path(), error = %err, "rejected unsigned webhook");
        return unauthorized();
    }

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "invalid signature" })),
    )
        .into_response()
}

/// Call fields the workflow relies on; everything else the vendor sends is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDetails {
    pub call_id: String,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub from_number: Option<String>,
    #[serde(default)]
    pub to_number: Option<String>,
    #[serde(default)]
    pub start_timestamp: Option<i64>,
    #[serde(default)]
    pub end_timestamp: Option<i64>,
    #[serde(default)]
    pub disconnection_reason: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub call_analysis: Option<Value>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CallEvent {
    CallStarted { call: CallDetails },
    CallEnded { call: CallDetails },
    CallAnalyzed { call: CallDetails },
}

impl CallEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CallEvent::CallStarted { .. } => "call_started",
            CallEvent::CallEnded { .. } => "call_ended",
            CallEvent::CallAnalyzed { .. } => "call_analyzed",
        }
    }

    pub fn call(&self) -> &CallDetails {
        match self {
            CallEvent::CallStarted { call }
            | CallEvent::CallEnded { call }
            | CallEvent::CallAnalyzed { call } => call,
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("call event sink failed: {0}")]
pub struct CallEventSinkError(pub String);

/// Destination for verified call lifecycle events.
pub trait CallEventSink: Send + Sync {
    fn record(&self, event: CallEvent) -> Result<(), CallEventSinkError>;
}

struct WebhookState {
    sink: Arc<dyn CallEventSink>,
}

/// `POST /api/v1/webhooks/retell`, signature-checked before the handler runs.
pub fn retell_webhook_router(
    verifier: Arc<SignatureVerifier>,
    sink: Arc<dyn CallEventSink>,
) -> Router {
    Router::new()
        .route("/api/v1/webhooks/retell", post(call_event_handler))
        .route_layer(middleware::from_fn_with_state(verifier, require_signature))
        .with_state(Arc::new(WebhookState { sink }))
}

async fn call_event_handler(
    State(state): State<Arc<WebhookState>>,
    Json(payload): Json<Value>,
) -> Response {
    let event: CallEvent = match serde_json::from_value(payload) {
        Ok(event) => event,
        Err(err) => {
            // Verified but unrecognised events are still acknowledged.
            info!(error = %err, "ignoring unsupported call event");
            return (StatusCode::OK, Json(json!({ "received": false }))).into_response();
        }
    };

    let name = event.name();
    let call_id = event.call().call_id.clone();
    match state.sink.record(event) {
        Ok(()) => {
            info!(event = name, call_id = %call_id, "call event recorded");
            (
                StatusCode::OK,
                Json(json!({ "received": true, "event": name })),
            )
                .into_response()
        }
        Err(err) => {
            error!(event = name, call_id = %call_id, error = %err, "call event not recorded");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "event could not be recorded" })),
            )
                .into_response()
        }
    }
}
