//! The gateway's tagged-variant error type.
//!
//! The original gateway classified errors by runtime type checks; here each
//! failure mode the proxy pipeline can hit is its own enum variant, matched
//! exhaustively by the error shaper in
//! [`crate::services::proxy::ProxyEngine`] rather than inspected at runtime.

use crate::models::envelope::ApiResponse;
use crate::models::status::GatewayStatus;
use actix_web::{http::StatusCode, HttpResponse};
use serde_json::Value;

/// Errors that can terminate a single proxied request.
///
/// Each variant already knows its own HTTP status and `error.code`; the
/// [`actix_web::error::ResponseError`] impl below is what turns a variant
/// into the wire envelope described in spec §4.5.4.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The gateway is not `Active`; carries the status that rejected the request.
    #[error("gateway not active: {0}")]
    NotActive(GatewayStatus),

    /// The request path did not match any known service prefix.
    #[error("unknown service")]
    ServiceNotFound,

    /// The registry returned zero instances for the requested service type.
    #[error("no instances registered for service {service}")]
    NoInstances { service: String },

    /// The retry budget's total-elapsed-time bound was exceeded.
    #[error("gateway timeout")]
    GatewayTimeout,

    /// The outbound request was sent but no usable response came back
    /// (connection refused, reset, or per-attempt timeout) and the retry
    /// policy declined to retry further.
    #[error("upstream unreachable: {message}")]
    UpstreamUnreachable { message: String },

    /// The outbound request could never be issued (URL build, DNS).
    #[error("request could not be built: {message}")]
    RequestBuildFailed { message: String },

    /// The backend returned an HTTP response carrying an error status.
    #[error("backend error {status}: {message}")]
    Backend {
        status: u16,
        code: String,
        message: String,
        data: Option<Value>,
        /// Backend response headers, already passed through `filterResponse`.
        headers: Vec<(String, String)>,
    },

    /// Anything else: a local programming error that must never crash the
    /// request path.
    #[error("unknown error: {message}")]
    Unknown { message: String },
}

impl GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::NotActive(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::ServiceNotFound => StatusCode::NOT_FOUND,
            GatewayError::NoInstances { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::UpstreamUnreachable { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::RequestBuildFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::Backend { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            GatewayError::Unknown { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> String {
        match self {
            GatewayError::NotActive(status) => status.error_code().to_string(),
            GatewayError::ServiceNotFound => "SERVICE_NO_EXIST".to_string(),
            GatewayError::NoInstances { .. } => "GATEWAY_ERROR".to_string(),
            GatewayError::GatewayTimeout => "GATEWAY_TIMEOUT".to_string(),
            GatewayError::UpstreamUnreachable { .. } => "GATEWAY_ERROR".to_string(),
            GatewayError::RequestBuildFailed { .. } => "GATEWAY_ERROR".to_string(),
            GatewayError::Backend { code, .. } => code.clone(),
            GatewayError::Unknown { .. } => "UNKNOWN_ERROR".to_string(),
        }
    }

    fn message(&self) -> Option<String> {
        match self {
            GatewayError::NotActive(status) => Some(status.message().to_string()),
            GatewayError::ServiceNotFound => None,
            GatewayError::NoInstances { service } => {
                Some(format!("no healthy instances for service {service}"))
            }
            GatewayError::GatewayTimeout => Some("retry budget exhausted".to_string()),
            GatewayError::UpstreamUnreachable { message } => Some(message.clone()),
            GatewayError::RequestBuildFailed { message } => Some(message.clone()),
            GatewayError::Backend { message, .. } => Some(message.clone()),
            GatewayError::Unknown { message } => Some(message.clone()),
        }
    }

    fn data(&self) -> Option<Value> {
        match self {
            GatewayError::Backend { data, .. } => data.clone(),
            _ => None,
        }
    }

    /// Response headers to forward alongside the error envelope (already
    /// filtered). Only backend-originated errors carry any.
    pub fn headers(&self) -> &[(String, String)] {
        match self {
            GatewayError::Backend { headers, .. } => headers,
            _ => &[],
        }
    }

    /// Builds the failure envelope for this error, timestamped at `now_ms`.
    pub fn to_envelope(&self, now_ms: i64) -> ApiResponse {
        let mut envelope = ApiResponse::failure(self.code(), self.message(), now_ms);
        envelope.data = self.data();
        envelope
    }
}

impl actix_web::error::ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        GatewayError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let mut builder = HttpResponse::build(self.status_code());
        for (name, value) in self.headers() {
            builder.insert_header((name.as_str(), value.as_str()));
        }
        builder.json(self.to_envelope(now_ms))
    }
}
