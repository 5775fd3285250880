use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The standard response shape every gateway response conforms to.
///
/// Success envelopes never carry `error`; failure envelopes always carry
/// `error.code`. `timestamp` is epoch milliseconds at the moment the gateway
/// emitted the envelope — on a successful proxy, the backend's own
/// `timestamp` is discarded and replaced with a fresh one.
///
/// # Examples
///
/// ```json
/// {"success": true, "timestamp": 1732550400000, "data": {"message": "ok"}}
/// {"success": false, "timestamp": 1732550400000, "error": {"code": "GATEWAY_TIMEOUT"}}
/// ```
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApiResponse {
    pub success: bool,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

/// The `error` member of a failure envelope.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApiError {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiResponse {
    /// Builds a success envelope carrying `data`, timestamped now.
    pub fn success(data: Value, now_ms: i64) -> Self {
        Self {
            success: true,
            timestamp: now_ms,
            data: Some(data),
            error: None,
        }
    }

    /// Builds a failure envelope with the given error code/message, timestamped now.
    pub fn failure(code: impl Into<String>, message: Option<String>, now_ms: i64) -> Self {
        Self {
            success: false,
            timestamp: now_ms,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message,
            }),
        }
    }
}
