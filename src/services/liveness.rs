//! Gateway lifecycle FSM: registration, periodic health probing, and
//! re-registration, per spec §4.6.
//!
//! Grounded on the teacher's `services::circuit_breaker` for the shape of
//! a background-task state machine driven by a shared `RwLock` cell and a
//! scheduled timer loop, though the states and transition rules here are
//! specific to this gateway's registration lifecycle rather than a
//! request-path circuit breaker.

use crate::models::credential::Credential;
use crate::models::status::GatewayStatus;
use crate::services::registry_client::{RegistryClient, RegistryError};
use crate::services::retry::RetryPolicy;
use log::{error, info, warn};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::sleep;

/// What to do once the health-probe failure budget is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthCheckFailStrategy {
    TryAgain,
    Shutdown,
}

impl Default for HealthCheckFailStrategy {
    fn default() -> Self {
        HealthCheckFailStrategy::TryAgain
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LivenessConfig {
    pub health_checks_enabled: bool,
    pub health_check_interval: Duration,
    pub health_check_fail_strategy: HealthCheckFailStrategy,
    pub max_probe_retries: u32,
    pub max_reregister_retries: u32,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            health_checks_enabled: true,
            health_check_interval: Duration::from_millis(10_000),
            health_check_fail_strategy: HealthCheckFailStrategy::TryAgain,
            max_probe_retries: 3,
            max_reregister_retries: 3,
        }
    }
}

/// Drives the `GatewayStatus` FSM on a dedicated background task.
///
/// Owns the shared `status` and `credential` cells (the other two of the
/// three shared mutable cells in spec §5 besides the round-robin cursor
/// map, which belongs to `LoadBalancer`). `ProxyEngine` only ever reads
/// these through its own clones of the same `Arc`s.
pub struct LivenessController {
    registry: RegistryClient,
    retry_policy: RetryPolicy,
    config: LivenessConfig,
    port: u16,
    status: Arc<RwLock<GatewayStatus>>,
    credential: Arc<RwLock<Option<Credential>>>,
    shutdown: Arc<Notify>,
}

impl LivenessController {
    pub fn new(
        registry: RegistryClient,
        retry_policy: RetryPolicy,
        config: LivenessConfig,
        port: u16,
        status: Arc<RwLock<GatewayStatus>>,
        credential: Arc<RwLock<Option<Credential>>>,
    ) -> Self {
        Self {
            registry,
            retry_policy,
            config,
            port,
            status,
            credential,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// A handle that can be used to cancel the pending probe timer, so the
    /// process can exit promptly on `SIGTERM`/`SIGINT`.
    pub fn shutdown_handle(&self) -> Arc<Notify> {
        self.shutdown.clone()
    }

    fn set_status(&self, status: GatewayStatus) {
        *self.status.write().unwrap() = status;
    }

    fn status(&self) -> GatewayStatus {
        *self.status.read().unwrap()
    }

    /// Registers with the registry, transitions to `ACTIVE` on success, and
    /// then runs the probe loop until a shutdown signal arrives or the
    /// gateway latches `SHUTTING_DOWN`. Returns once the process should
    /// exit.
    ///
    /// The initial `register` failure is fatal only when the registration
    /// key is missing (the caller is expected to abort the process);
    /// transport failures are retried here with the retry policy's backoff
    /// before giving up, matching the "recoverable" classification in
    /// spec §4.4.
    pub async fn run(&self) -> Result<(), RegistryError> {
        self.register_with_retry().await?;
        self.set_status(GatewayStatus::Active);
        info!("gateway registered, status=ACTIVE");

        if !self.config.health_checks_enabled {
            // No probing configured: sit in ACTIVE until the process is
            // told to shut down by its caller.
            self.shutdown.notified().await;
            return Ok(());
        }

        self.probe_loop().await;
        Ok(())
    }

    async fn register_with_retry(&self) -> Result<(), RegistryError> {
        loop {
            match self.registry.register(self.port).await {
                Ok(credential) => {
                    *self.credential.write().unwrap() = Some(credential);
                    return Ok(());
                }
                Err(RegistryError::MissingRegistrationKey) => return Err(RegistryError::MissingRegistrationKey),
                Err(other) => {
                    warn!("initial registration failed, retrying: {other}");
                    sleep(Duration::from_millis(self.retry_policy.config().base_delay_ms)).await;
                }
            }
        }
    }

    /// The main probe loop: wait `healthCheckInterval`, probe, act on the
    /// outcome, repeat. Exits only when a shutdown is requested or the
    /// status has latched `SHUTTING_DOWN`.
    async fn probe_loop(&self) {
        loop {
            tokio::select! {
                _ = self.shutdown.notified() => {
                    info!("liveness controller cancelled, exiting probe loop");
                    return;
                }
                _ = sleep(self.config.health_check_interval) => {}
            }

            if self.status() == GatewayStatus::ShuttingDown {
                return;
            }

            self.run_one_probe_cycle().await;

            if self.status() == GatewayStatus::ShuttingDown {
                return;
            }
        }
    }

    /// One probe attempt plus whatever follow-up the outcome demands:
    /// success returns to `ACTIVE`; a `DOWN`/error outcome retries the
    /// probe itself up to `max_probe_retries` times; a `401` drives
    /// re-registration.
    async fn run_one_probe_cycle(&self) {
        let Some(credential) = self.credential.read().unwrap().clone() else {
            // Should not happen post-registration, but there is nothing
            // useful to probe with.
            return;
        };

        match self.registry.health(&credential).await {
            Ok(health) if health.is_up() => {
                self.set_status(GatewayStatus::Active);
            }
            Ok(_down) => {
                self.handle_probe_failure().await;
            }
            Err(RegistryError::Unauthorized) => {
                self.handle_credential_revoked().await;
            }
            Err(_transport_or_status) => {
                self.handle_probe_failure().await;
            }
        }
    }

    /// Probe returned DOWN or a non-401 error: retry the probe itself up
    /// to `max_probe_retries` times with backoff before deciding what to
    /// do about the failure budget.
    async fn handle_probe_failure(&self) {
        self.set_status(GatewayStatus::HealthCheckFail);
        warn!("registry health probe failed, status=HEALTH_CHECK_FAIL");

        for attempt in 0..self.config.max_probe_retries {
            self.retry_policy.delay(attempt).await;

            let Some(credential) = self.credential.read().unwrap().clone() else {
                return;
            };
            match self.registry.health(&credential).await {
                Ok(health) if health.is_up() => {
                    self.set_status(GatewayStatus::Active);
                    info!("registry health probe recovered, status=ACTIVE");
                    return;
                }
                Err(RegistryError::Unauthorized) => {
                    self.handle_credential_revoked().await;
                    return;
                }
                _ => continue,
            }
        }

        // Exhausted max_probe_retries still failing.
        match self.config.health_check_fail_strategy {
            HealthCheckFailStrategy::Shutdown => {
                self.latch_shutdown("registry health-check budget exhausted").await;
            }
            HealthCheckFailStrategy::TryAgain => {
                // Stay in HEALTH_CHECK_FAIL; the outer probe_loop will
                // reschedule another attempt after health_check_interval.
            }
        }
    }

    /// Probe returned 401: the credential was revoked. Re-register up to
    /// `max_reregister_retries` times with exponential backoff.
    async fn handle_credential_revoked(&self) {
        self.set_status(GatewayStatus::Reregistering);
        warn!("registry credential revoked, status=REREGISTERING");

        for attempt in 0..self.config.max_reregister_retries {
            match self.registry.register(self.port).await {
                Ok(credential) => {
                    *self.credential.write().unwrap() = Some(credential);
                    self.set_status(GatewayStatus::Active);
                    info!("re-registration succeeded, status=ACTIVE");
                    return;
                }
                Err(RegistryError::MissingRegistrationKey) => {
                    self.latch_shutdown("registration key missing during re-register").await;
                    return;
                }
                Err(error) => {
                    warn!("re-register attempt {attempt} failed: {error}");
                    self.retry_policy.delay(attempt).await;
                }
            }
        }

        self.latch_shutdown("re-registration attempts exhausted").await;
    }

    /// Latches `SHUTTING_DOWN` and fires the termination signal. Per
    /// invariant: the status write happens before the signal is raised.
    async fn latch_shutdown(&self, reason: &str) {
        self.set_status(GatewayStatus::ShuttingDown);
        error!("gateway shutting down: {reason}");
        self.shutdown.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::retry::RetryConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn controller(registry_uri: String, config: LivenessConfig) -> LivenessController {
        let registry = RegistryClient::new(registry_uri, Duration::from_millis(200), Some("key".to_string()));
        let retry_policy = RetryPolicy::new(RetryConfig {
            max_retries: 3,
            base_delay_ms: 1,
            max_delay_ms: 2,
            retryable_statuses: vec![500, 502, 503, 504],
        });
        LivenessController::new(
            registry,
            retry_policy,
            config,
            3001,
            Arc::new(RwLock::new(GatewayStatus::Starting)),
            Arc::new(RwLock::new(None)),
        )
    }

    #[tokio::test]
    async fn registers_and_becomes_active_with_health_checks_disabled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/service"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"serviceId": "s", "token": "t"})))
            .mount(&server)
            .await;

        let controller = controller(
            server.uri(),
            LivenessConfig {
                health_checks_enabled: false,
                ..LivenessConfig::default()
            },
        );
        let shutdown = controller.shutdown_handle();
        let status_handle = controller.status.clone();

        let run = tokio::spawn(async move { controller.run().await });
        // give the registration call a moment to land
        sleep(Duration::from_millis(50)).await;
        assert_eq!(*status_handle.read().unwrap(), GatewayStatus::Active);

        shutdown.notify_waiters();
        let _ = tokio::time::timeout(Duration::from_secs(1), run).await;
    }

    #[tokio::test]
    async fn probe_failure_then_recovery_returns_to_active() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/service"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"serviceId": "s", "token": "t"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true, "timestamp": 1, "data": {"status": "DOWN"}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true, "timestamp": 1, "data": {"status": "UP"}
            })))
            .mount(&server)
            .await;

        let controller = controller(
            server.uri(),
            LivenessConfig {
                health_checks_enabled: true,
                health_check_interval: Duration::from_millis(20),
                max_probe_retries: 3,
                ..LivenessConfig::default()
            },
        );
        let shutdown = controller.shutdown_handle();
        let status_handle = controller.status.clone();

        let run = tokio::spawn(async move { controller.run().await });
        sleep(Duration::from_millis(200)).await;
        assert_eq!(*status_handle.read().unwrap(), GatewayStatus::Active);

        shutdown.notify_waiters();
        let _ = tokio::time::timeout(Duration::from_secs(1), run).await;
    }

    #[tokio::test]
    async fn exhausted_reregistration_latches_shutting_down() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/service"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"serviceId": "s", "token": "t"})))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        // All subsequent registrations (re-registers) fail with 401.
        Mock::given(method("POST"))
            .and(path("/service"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let controller = controller(
            server.uri(),
            LivenessConfig {
                health_checks_enabled: true,
                health_check_interval: Duration::from_millis(10),
                max_reregister_retries: 2,
                ..LivenessConfig::default()
            },
        );
        let shutdown = controller.shutdown_handle();
        let status_handle = controller.status.clone();

        let run = tokio::spawn(async move { controller.run().await });
        let _ = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if *status_handle.read().unwrap() == GatewayStatus::ShuttingDown {
                    break;
                }
                sleep(Duration::from_millis(20)).await;
            }
        })
        .await;
        assert_eq!(*status_handle.read().unwrap(), GatewayStatus::ShuttingDown);

        shutdown.notify_waiters();
        let _ = tokio::time::timeout(Duration::from_secs(1), run).await;
    }
}
