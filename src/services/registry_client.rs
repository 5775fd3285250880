//! Thin HTTP wrapper over the external service registry.
//!
//! Grounded on the teacher's `services::http::RouteHandler` for the
//! request-building/error-shaping style, but this client only ever talks
//! to the registry, not to backends (that's `services::proxy`).

use crate::models::credential::Credential;
use crate::models::envelope::ApiResponse;
use crate::models::instance::Instance;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Failures raised by a registry call.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// `register` was attempted with no `SERVICE_REGISTRATION_KEY` configured.
    /// Fatal: the caller cannot recover without an operator fixing configuration.
    #[error("SERVICE_REGISTRATION_KEY is not set")]
    MissingRegistrationKey,

    /// A transport-level failure talking to the registry. Recoverable: the
    /// caller may retry.
    #[error("registry unreachable: {0}")]
    Unreachable(String),

    /// The registry responded 401: the current credential was revoked.
    Unauthorized,

    /// The registry responded with a non-401 error status.
    #[error("registry returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The registry's response body did not parse as the expected envelope.
    #[error("malformed registry response: {0}")]
    Malformed(String),
}

/// Client for the three registry operations the gateway needs.
///
/// Stateless beyond its HTTP client and base URL: the credential used on
/// `getServices`/`health` is supplied by the caller rather than cached
/// here, since the credential is one of the gateway's shared mutable
/// cells (see concurrency notes in `services::liveness`).
#[derive(Debug, Clone)]
pub struct RegistryClient {
    base_url: String,
    http: reqwest::Client,
    registration_key: Option<String>,
}

impl RegistryClient {
    pub fn new(base_url: String, request_timeout: Duration, registration_key: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(32)
            .build()
            .expect("reqwest client configuration is valid");
        Self {
            base_url,
            http,
            registration_key,
        }
    }

    /// `POST /service {port, serviceType: "api-gateway"}` with
    /// `Authorization: Bearer <key>`. Returns the freshly issued credential.
    pub async fn register(&self, port: u16) -> Result<Credential, RegistryError> {
        let key = self
            .registration_key
            .as_deref()
            .ok_or(RegistryError::MissingRegistrationKey)?;

        let response = self
            .http
            .post(format!("{}/service", self.base_url))
            .bearer_auth(key)
            .json(&json!({ "port": port, "serviceType": "api-gateway" }))
            .send()
            .await
            .map_err(|e| RegistryError::Unreachable(e.to_string()))?;

        self.parse_credential(response).await
    }

    /// `GET /services/{serviceType}` with credential headers. The result is
    /// unwrapped from the envelope's `data` field; an empty list is a
    /// legitimate success.
    pub async fn get_services(
        &self,
        service_type: &str,
        credential: &Credential,
    ) -> Result<Vec<Instance>, RegistryError> {
        let response = self
            .http
            .get(format!("{}/services/{service_type}", self.base_url))
            .header("x-service-id", &credential.service_id)
            .header("x-service-token", &credential.token)
            .send()
            .await
            .map_err(|e| RegistryError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(RegistryError::Unauthorized);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RegistryError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: ApiResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::Malformed(e.to_string()))?;
        match envelope.data {
            Some(data) => serde_json::from_value(data).map_err(|e| RegistryError::Malformed(e.to_string())),
            None => Ok(Vec::new()),
        }
    }

    /// `GET /health` with credential headers. Returns the registry's
    /// reported status.
    pub async fn health(&self, credential: &Credential) -> Result<RegistryHealth, RegistryError> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .header("x-service-id", &credential.service_id)
            .header("x-service-token", &credential.token)
            .send()
            .await
            .map_err(|e| RegistryError::Unreachable(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(RegistryError::Unauthorized);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RegistryError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: ApiResponse = response
            .json()
            .await
            .map_err(|e| RegistryError::Malformed(e.to_string()))?;
        let data = envelope.data.ok_or_else(|| RegistryError::Malformed("missing data".into()))?;
        serde_json::from_value(data).map_err(|e| RegistryError::Malformed(e.to_string()))
    }

    async fn parse_credential(&self, response: reqwest::Response) -> Result<Credential, RegistryError> {
        let status = response.status();
        if status.as_u16() == 401 {
            return Err(RegistryError::Unauthorized);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RegistryError::Status {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json()
            .await
            .map_err(|e| RegistryError::Malformed(e.to_string()))
    }
}

/// The registry's self-reported health, as returned by `GET /health`.
#[derive(serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RegistryHealth {
    pub status: String,
}

impl RegistryHealth {
    pub fn is_up(&self) -> bool {
        self.status.eq_ignore_ascii_case("UP")
    }
}
