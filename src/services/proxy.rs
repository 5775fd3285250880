//! Per-request proxy pipeline: resolve, select, forward with retry, shape
//! the response.
//!
//! Grounded on the teacher's `services::http::RouteHandler`, which owns
//! the same forward/retry/header-filter/error-shaping responsibilities for
//! a statically configured route table; here the target is resolved fresh
//! per request from the registry instead of from static config.

use crate::models::credential::Credential;
use crate::models::envelope::ApiResponse;
use crate::models::error::GatewayError;
use crate::models::status::GatewayStatus;
use crate::services::load_balancer::LoadBalancer;
use crate::services::registry_client::{RegistryClient, RegistryError};
use crate::services::retry::{AttemptOutcome, RetryPolicy};
use crate::utils::headers::{filter_request, filter_response};
use crate::utils::path::build_target_url;
use reqwest::Method;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// A single inbound request as seen by the proxy pipeline, already
/// stripped of anything framework-specific so this module stays testable
/// without an actix-web server.
pub struct ProxyRequest {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// The outcome of a successfully forwarded request: what the caller
/// should set on the HTTP responder.
pub struct ProxyResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: ApiResponse,
}

/// Per-request timeout budgets.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutConfig {
    pub request_timeout: Duration,
    pub total_request_timeout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_millis(5000),
            total_request_timeout: Duration::from_millis(10000),
        }
    }
}

/// Implements spec §4.5: the single `handle` operation that resolves a
/// service name to an instance, forwards the request with retry, and
/// shapes any failure into the wire envelope.
pub struct ProxyEngine {
    registry: RegistryClient,
    load_balancer: Box<dyn LoadBalancer>,
    retry_policy: RetryPolicy,
    timeouts: TimeoutConfig,
    http: reqwest::Client,
    status: Arc<RwLock<GatewayStatus>>,
    credential: Arc<RwLock<Option<Credential>>>,
    backend_scheme: &'static str,
}

impl ProxyEngine {
    pub fn new(
        registry: RegistryClient,
        load_balancer: Box<dyn LoadBalancer>,
        retry_policy: RetryPolicy,
        timeouts: TimeoutConfig,
        status: Arc<RwLock<GatewayStatus>>,
        credential: Arc<RwLock<Option<Credential>>>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeouts.request_timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(32)
            .build()
            .expect("reqwest client configuration is valid");
        Self {
            registry,
            load_balancer,
            retry_policy,
            timeouts,
            http,
            status,
            credential,
            backend_scheme: "https",
        }
    }

    /// Test-only seam: forwards to a plain-HTTP mock backend instead of
    /// HTTPS, since wiremock cannot stand in for a TLS-terminating backend.
    #[cfg(test)]
    fn with_backend_scheme(mut self, scheme: &'static str) -> Self {
        self.backend_scheme = scheme;
        self
    }

    /// Step 1: gate on gateway status.
    fn current_status(&self) -> GatewayStatus {
        *self.status.read().unwrap()
    }

    fn current_credential(&self) -> Option<Credential> {
        self.credential.read().unwrap().clone()
    }

    /// Runs the full pipeline for one inbound request.
    pub async fn handle(
        &self,
        request: ProxyRequest,
        service_name: &str,
        tail_path: &str,
    ) -> Result<ProxyResponse, GatewayError> {
        // 1. Gate on status.
        let status = self.current_status();
        if status != GatewayStatus::Active {
            return Err(GatewayError::NotActive(status));
        }

        // 2. Resolve.
        let credential = self.current_credential();
        let instances = match credential {
            Some(credential) => self
                .registry
                .get_services(service_name, &credential)
                .await
                .map_err(registry_error_to_gateway)?,
            None => {
                // No credential yet means registration has not completed;
                // this is effectively the starting state.
                return Err(GatewayError::NotActive(GatewayStatus::Starting));
            }
        };
        if instances.is_empty() {
            return Err(GatewayError::NoInstances {
                service: service_name.to_string(),
            });
        }

        // 3. Select.
        let target = self.load_balancer.select_instance(service_name, &instances);
        let url = build_target_url(self.backend_scheme, &target.host, target.port, tail_path);

        // 4. Forward with retry.
        let filtered_headers = filter_request(&request.headers);
        let start_time = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            let outcome = self
                .attempt_once(&request.method, &url, &filtered_headers, &request.body)
                .await;

            match outcome {
                Ok(response) => return Ok(response),
                Err(attempt_error) => {
                    if let AttemptError::Terminal(gateway_error) = attempt_error {
                        return Err(gateway_error);
                    }
                    let classification = attempt_error.classify();
                    if !self.retry_policy.should_retry(classification, attempt) {
                        return Err(attempt_error.into_gateway_error());
                    }
                    if start_time.elapsed() >= self.timeouts.total_request_timeout {
                        return Err(GatewayError::GatewayTimeout);
                    }
                    attempt += 1;
                    self.retry_policy.delay(attempt).await;
                }
            }
        }
    }

    async fn attempt_once(
        &self,
        method: &Method,
        url: &str,
        headers: &[(String, String)],
        body: &[u8],
    ) -> Result<ProxyResponse, AttemptError> {
        let mut builder = self.http.request(method.clone(), url);
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !body.is_empty() {
            builder = builder.body(body.to_vec());
        }

        let response = builder.send().await.map_err(|error| {
            if error.is_timeout() {
                AttemptError::Timeout
            } else if error.is_connect() {
                AttemptError::Unreachable(error.to_string())
            } else if error.is_builder() {
                AttemptError::BuildFailed(error.to_string())
            } else {
                AttemptError::Unreachable(error.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let response_headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let filtered_headers = filter_response(&response_headers);

        let bytes = response.bytes().await.map_err(|e| AttemptError::Unreachable(e.to_string()))?;
        let parsed: Option<Value> = serde_json::from_slice(&bytes).ok();

        if (200..300).contains(&status) {
            let data = parsed
                .as_ref()
                .and_then(|v| v.get("data"))
                .cloned()
                .unwrap_or(Value::Null);
            let now_ms = chrono::Utc::now().timestamp_millis();
            return Ok(ProxyResponse {
                status,
                headers: filtered_headers,
                body: ApiResponse::success(data, now_ms),
            });
        }

        Err(AttemptError::Backend {
            status,
            headers: filtered_headers,
            body: parsed,
        })
    }
}

/// Internal classification of a single forward attempt's failure, distinct
/// from [`GatewayError`] because the retry loop needs to classify *before*
/// deciding whether to shape-and-return or retry.
enum AttemptError {
    Timeout,
    Unreachable(String),
    BuildFailed(String),
    Backend {
        status: u16,
        headers: Vec<(String, String)>,
        body: Option<Value>,
    },
    /// A failure the retry loop must never attempt to retry, already final.
    Terminal(GatewayError),
}

impl AttemptError {
    fn classify(&self) -> AttemptOutcome {
        match self {
            AttemptError::Timeout => AttemptOutcome::TransportTimeout,
            AttemptError::Backend { status, .. } => AttemptOutcome::HttpStatus(*status),
            AttemptError::Unreachable(_) | AttemptError::BuildFailed(_) => AttemptOutcome::Other,
            AttemptError::Terminal(_) => AttemptOutcome::Other,
        }
    }

    fn into_gateway_error(self) -> GatewayError {
        match self {
            AttemptError::Timeout => GatewayError::UpstreamUnreachable {
                message: "request timed out".to_string(),
            },
            AttemptError::Unreachable(message) => GatewayError::UpstreamUnreachable { message },
            AttemptError::BuildFailed(message) => GatewayError::RequestBuildFailed { message },
            AttemptError::Backend { status, headers, body } => {
                let (code, message, data) = shape_backend_error(&body);
                GatewayError::Backend {
                    status,
                    code,
                    message,
                    data,
                    headers,
                }
            }
            AttemptError::Terminal(error) => error,
        }
    }
}

/// Classifies a backend's error body per spec §4.5.4: prefer the
/// envelope's `error.code`/`error.message`, fall back to a bare `error`
/// string, fall back to a fixed message.
fn shape_backend_error(body: &Option<Value>) -> (String, String, Option<Value>) {
    let Some(body) = body else {
        return ("SERVICE_ERROR".to_string(), "Unknown error occured".to_string(), None);
    };

    if let Some(error) = body.get("error") {
        if let Some(code) = error.get("code").and_then(Value::as_str) {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| "Unknown error occured".to_string());
            return (code.to_string(), message, body.get("data").cloned());
        }
        if let Some(message) = error.as_str() {
            return (
                "SERVICE_ERROR".to_string(),
                message.to_string(),
                body.get("data").cloned(),
            );
        }
    }

    (
        "SERVICE_ERROR".to_string(),
        "Unknown error occured".to_string(),
        body.get("data").cloned(),
    )
}

fn registry_error_to_gateway(error: RegistryError) -> GatewayError {
    match error {
        RegistryError::Unauthorized => GatewayError::UpstreamUnreachable {
            message: "registry credential revoked".to_string(),
        },
        RegistryError::MissingRegistrationKey => GatewayError::Unknown {
            message: "registry client misconfigured: no registration key".to_string(),
        },
        RegistryError::Unreachable(message) => GatewayError::UpstreamUnreachable { message },
        RegistryError::Status { status, message } => GatewayError::Backend {
            status,
            code: "GATEWAY_ERROR".to_string(),
            message,
            data: None,
            headers: Vec::new(),
        },
        RegistryError::Malformed(message) => GatewayError::Unknown { message },
    }
}
